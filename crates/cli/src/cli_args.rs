//! Bootstrap options for the `ct` binary.
//!
//! Only the options that pick and configure the tree live here. Everything
//! after them is handed to the tree untouched, so `ct deploy --help` reaches
//! the tree's own help flag.

use clap::Parser;

/// Runs shell commands from a command tree defined in YAML.
///
/// # Examples
///
/// ```rust
/// use clap::Parser;
/// use cmdtree_cli::cli_args::Args;
///
/// let args = Args::parse_from(["ct", "-d", "deploy", "--env", "prod"]);
/// assert!(args.dry_run);
/// assert_eq!(args.arguments, ["deploy", "--env", "prod"]);
/// ```
#[derive(Parser, Debug)] // requires `derive` feature
#[command(term_width = 0, disable_help_flag = true)]
pub struct Args {
    /// Path to the command tree definition YAML.
    ///
    /// If not provided, defaults to `~/.cmdtree/commands.yml`.
    #[arg(long = "config", short = 'c')]
    pub config_path: Option<String>,

    /// Print the interpolated command instead of running it.
    #[arg(long, short = 'd', action)]
    pub dry_run: bool,

    /// Sub-commands, flags and arguments for the tree.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub arguments: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_default_values() {
        let args = Args::parse_from(["ct"]);

        assert!(args.config_path.is_none());
        assert!(!args.dry_run);
        assert!(args.arguments.is_empty());
    }

    #[test]
    fn test_args_short_flags() {
        let args = Args::parse_from(["ct", "-c", "/custom/tree.yml", "-d"]);

        assert_eq!(args.config_path, Some("/custom/tree.yml".to_string()));
        assert!(args.dry_run);
    }

    #[test]
    fn test_args_long_flags() {
        let args = Args::parse_from(["ct", "--config", "/custom/tree.yml", "--dry-run"]);

        assert_eq!(args.config_path, Some("/custom/tree.yml".to_string()));
        assert!(args.dry_run);
    }

    #[test]
    fn test_tree_flags_are_forwarded() {
        let args = Args::parse_from(["ct", "db", "migrate", "-d", "--target", "v2"]);

        assert!(!args.dry_run);
        assert_eq!(args.arguments, ["db", "migrate", "-d", "--target", "v2"]);
    }

    #[test]
    fn test_help_is_forwarded() {
        let args = Args::parse_from(["ct", "--help"]);
        assert_eq!(args.arguments, ["--help"]);
    }
}
