use std::process::ExitCode;

use clap::Parser;
use cmdtree_core::dispatch::execute_c;
use crossterm::style::Stylize;
use log::debug;

use cmdtree_cli::cli_args::Args;
use cmdtree_cli::error::{Error, Result};
use cmdtree_cli::tree::{build_tree, RunOptions};
use cmdtree_cli::{config, file_handling};

fn execute() -> Result<()> {
    let args = Args::parse();

    let config_path = config::get_config_path(args.config_path.as_deref());
    debug!("Config path: `{}`", config_path);

    let definition = file_handling::get_command_tree(&config_path)?;
    let options = RunOptions {
        shell: config::get_shell(),
        dry_run: args.dry_run,
    };

    let root = build_tree(&definition, &options)?;
    // Errors are printed below, in colour.
    root.configure(|settings| settings.silence_errors = true);
    root.set_args(&args.arguments);

    let (resolved, result) = execute_c(&root);
    result.map_err(|original| Error::Dispatch {
        path: resolved.path(),
        original,
    })
}

fn print_error(error: &Error) {
    eprintln!("{}", format!("Error: {error}").red());

    if let Error::Dispatch { path, .. } = error {
        if error.wants_usage_hint() {
            eprintln!("Run '{path} --help' for usage.");
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();

    match execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(&e);
            ExitCode::FAILURE
        }
    }
}
