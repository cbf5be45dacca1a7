//! Reserved annotation keys for flag metadata.
//!
//! Annotations are an opaque side channel on each [`Flag`](crate::flag::Flag):
//! string keys mapping to lists of strings. The keys below are read by the
//! command engine (required flags) and by shell-completion generators.

/// Marks a flag that must be set explicitly; the first value must be `"true"`.
pub const BASH_COMP_ONE_REQUIRED_FLAG: &str = "cmdtree_annotation_bash_completion_one_required_flag";
/// File extensions offered when completing the flag's value.
pub const BASH_COMP_FILENAME_EXT: &str = "cmdtree_annotation_bash_completion_filename_extensions";
/// Name of a custom completion function for the flag's value.
pub const BASH_COMP_CUSTOM: &str = "cmdtree_annotation_bash_completion_custom";
/// Restrict value completion to subdirectories of the given directory.
pub const BASH_COMP_SUBDIRS_IN_DIR: &str = "cmdtree_annotation_bash_completion_subdirs_in_dir";
