//! cmdtree CLI Library
//!
//! This crate provides `ct`, a runner that turns a YAML command tree into a
//! real command-line interface: nested sub-commands, aliases, scoped flags and
//! templated shell commands, all dispatched by `cmdtree-core`.
//!
//! # Architecture
//!
//! - [`cli_args`]: bootstrap options (`--config`, `--dry-run`) parsed with `clap`
//! - [`file_handling`]: loading and validating the tree definition
//! - [`tree`]: building the [`Command`](cmdtree_core::command::Command) tree and its run hooks
//! - [`interpolation`]: rendering argument templates from flag values
//! - [`execution`]: running the rendered command through the shell
//!
//! # Examples
//!
//! ```bash
//! # Run `deploy api` from ~/.cmdtree/commands.yml
//! ct deploy api --env prod
//!
//! # Aliases and inherited flags work anywhere in the line
//! ct -e prod d api
//!
//! # Show what would run
//! ct --dry-run deploy api
//!
//! # Help for any node
//! ct db --help
//! ```

pub mod cli_args;
pub mod config;
pub mod definitions;
pub mod error;
pub mod execution;
pub mod file_handling;
pub mod interpolation;
pub mod tree;
