//! Configuration path utilities for cmdtree.
//!
//! Paths given on the command line or in the tree definition may use `~`,
//! which is expanded to the user's home directory.

/// Default path for the command tree definition file
pub const DEFAULT_CONFIG_PATH: &str = "~/.cmdtree/commands.yml";

/// Default shell to use for command execution
pub const DEFAULT_SHELL: &str = "/bin/bash";

/// Resolves the tree definition path, falling back to [`DEFAULT_CONFIG_PATH`].
///
/// # Examples
///
/// ```
/// use cmdtree_cli::config::get_config_path;
///
/// assert_eq!(get_config_path(Some("/etc/ct.yml")), "/etc/ct.yml");
/// assert!(get_config_path(None).ends_with(".cmdtree/commands.yml"));
/// ```
pub fn get_config_path(config_path_arg: Option<&str>) -> String {
    let config_path = config_path_arg.unwrap_or(DEFAULT_CONFIG_PATH);
    shellexpand::tilde(config_path).to_string()
}

/// Expands `~` in an optional working directory.
pub fn expand_working_directory(working_directory: Option<&str>) -> Option<String> {
    working_directory.map(|directory| shellexpand::tilde(directory).to_string())
}

/// The user's `$SHELL`, or [`DEFAULT_SHELL`] when unset.
pub fn get_shell() -> String {
    std::env::var("SHELL").unwrap_or_else(|_| DEFAULT_SHELL.to_string())
}
