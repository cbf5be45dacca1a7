//! The default flag registry handed to a root command.

use std::rc::Rc;

use log::error;

use crate::flag::{FlagSet, SharedFlagSet};

/// Name of the help flag registered by [`DefaultFlags::standard`].
pub const HELP_FLAG: &str = "help";

/// Flags every command in a tree should see, such as `--help`.
///
/// A registry is built by the application and passed to the root through
/// [`Command::with_defaults`](crate::command::Command::with_defaults). The
/// first flag merge anywhere in the tree copies its flags into the root's
/// global set; treat it as read-only once dispatch has started.
#[derive(Debug, Clone)]
pub struct DefaultFlags {
    flags: SharedFlagSet,
}

impl DefaultFlags {
    #[must_use]
    pub fn new() -> Self {
        Self {
            flags: FlagSet::new("defaults").shared(),
        }
    }

    /// Registry holding a boolean `--help`/`-h` flag.
    #[must_use]
    pub fn standard() -> Self {
        let defaults = Self::new();
        let registered =
            defaults
                .flags
                .borrow_mut()
                .bool_flag(HELP_FLAG, Some('h'), false, "help for this command");
        if let Err(e) = registered {
            error!("Unable to register the help flag: {}", e);
        }
        defaults
    }

    pub fn flags(&self) -> SharedFlagSet {
        Rc::clone(&self.flags)
    }
}

impl Default for DefaultFlags {
    fn default() -> Self {
        Self::new()
    }
}
