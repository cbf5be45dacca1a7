use std::process::{Command, Stdio};

use indexmap::IndexMap;
use log::info;

use crate::error::{Error, Result};

/// Builds `<shell> -c <line>`, optionally inside `working_directory`.
pub fn shell_command(shell: &str, line: &str, working_directory: Option<&str>) -> Command {
    let mut command = Command::new(shell);
    command.args(["-c", line]);

    if let Some(working_directory) = working_directory {
        command.current_dir(working_directory);
    }

    command
}

/// Executes a command with optional environment variables.
///
/// # Errors
///
/// Returns an error if command execution fails or exits with non-zero status.
pub fn execute_command(
    mut command: Command,
    environment: Option<&IndexMap<String, String>>,
) -> Result<()> {
    let command = command
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    if let Some(environment) = environment {
        info!("Executing with environment variables: {:?}", environment);
        command.envs(environment);
    }

    let subprocess_exit_success = command.spawn()?.wait()?.success();

    if subprocess_exit_success {
        Ok(())
    } else {
        Err(Error::SubProcessExit)
    }
}
