//! cmdtree Core Library
//!
//! This crate provides the engine behind cmdtree: a tree of named commands,
//! each carrying its own flags and lifecycle hooks, and a dispatcher that
//! resolves an argument list to the deepest matching command and runs it.
//!
//! # Key Features
//!
//! - **Command Tree**: Parent/child commands with aliases, paths and sorted listings
//! - **Flag Scoping**: Local and global flags, merged lazily and memoized per command
//! - **Dispatch**: Exact name or alias matching, with flag values skipped along the way
//! - **Lifecycle Hooks**: Nearest global pre/post hooks around each command's own hooks
//! - **Validation**: Positional argument checks and aggregated required-flag errors
//! - **Suggestions**: Near-miss command names for unknown sub-commands
//!
//! # Examples
//!
//! Building a small tree and dispatching to it:
//!
//! ```
//! use cmdtree_core::command::Command;
//! use cmdtree_core::defaults::DefaultFlags;
//! use cmdtree_core::dispatch::execute;
//!
//! let root = Command::with_defaults("app", DefaultFlags::standard());
//! root.global_flags()
//!     .borrow_mut()
//!     .bool_flag("verbose", Some('v'), false, "verbose output")?;
//!
//! let build = Command::new("build [target]");
//! build.add_alias("b");
//! build.set_run(|command: &Command, args: &[String]| {
//!     let verbose = command.flags().borrow().get_bool("verbose")?;
//!     assert!(verbose);
//!     assert_eq!(args, ["release"]);
//!     Ok(())
//! });
//! root.add_child(&[build])?;
//!
//! root.set_args(&["b", "-v", "release"]);
//! execute(&root)?;
//! # Ok::<(), cmdtree_core::error::Error>(())
//! ```

pub mod annotations;
pub mod args;
pub mod command;
pub mod context;
pub mod defaults;
pub mod dispatch;
pub mod error;
pub mod flag;
pub mod lifecycle;
pub mod scope;
pub mod split;
pub mod streams;
pub mod suggest;
