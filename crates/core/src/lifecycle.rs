//! Lifecycle hooks and the executor that runs them.
//!
//! Hooks for a resolved command run in this order:
//!
//! 1. `global_pre_run`, from the command itself or its nearest ancestor defining one
//! 2. `pre_run`, the command's own
//! 3. `run`, required
//! 4. `post_run`, the command's own
//! 5. `global_post_run`, nearest ancestor-or-self, like `global_pre_run`
//!
//! Only one instance of each global hook fires. The first hook error stops
//! the sequence and is returned as is.

use std::rc::Rc;

use log::{debug, info, warn};

use crate::command::Command;
use crate::defaults::HELP_FLAG;
use crate::error::{Error, Result};
use crate::flag::FlagValue;

/// A lifecycle hook: receives the resolved command and its positional arguments.
pub type Hook = Rc<dyn Fn(&Command, &[String]) -> Result<()>>;

/// The five optional hook slots of a command.
#[derive(Default, Clone)]
pub struct Lifecycle {
    pub global_pre_run: Option<Hook>,
    pub pre_run: Option<Hook>,
    pub run: Option<Hook>,
    pub post_run: Option<Hook>,
    pub global_post_run: Option<Hook>,
}

impl Lifecycle {
    /// A command can be executed only when it has a `run` hook.
    #[must_use]
    pub fn is_runnable(&self) -> bool {
        self.run.is_some()
    }
}

/// Runs the full execution sequence for an already-resolved command.
///
/// `arguments` is everything dispatch did not consume: flags as well as
/// positionals. The sequence is deprecation notice, flag parsing, the help
/// flag check, the runnable check, positional validation, required-flag
/// validation, then the hooks.
///
/// # Errors
///
/// Returns flag-parse errors (after the flag-error hook had its say),
/// [`Error::NotExecutable`], argument and required-flag validation errors,
/// or the first hook error.
pub(crate) fn execute(command: &Command, arguments: &[String]) -> Result<()> {
    if let Some(message) = command.deprecated() {
        warn!("Command `{}` is deprecated", command.path());
        command.println(&format!(
            "Command \"{}\" is deprecated, {}",
            command.name(),
            message
        ));
    }

    if let Err(e) = command.parse_flags(arguments) {
        let flag_error_fn = command.flag_error_fn();
        return flag_error_fn(command, e);
    }

    if help_requested(command) {
        debug!("Help requested for `{}`", command.path());
        let help = command.help_fn();
        help(command, arguments);
        return Ok(());
    }

    if !command.is_runnable() {
        return Err(Error::NotExecutable(command.path()));
    }

    let positional = if command.settings().disable_flag_parsing {
        arguments.to_vec()
    } else {
        command.flags().borrow().args().to_vec()
    };

    command.validate_args(&positional)?;
    command.validate_required_flags()?;

    info!("Running `{}` with {:?}", command.path(), positional);
    run_hooks(command, &positional)
}

fn help_requested(command: &Command) -> bool {
    if command.settings().disable_flag_parsing {
        return false;
    }

    let flags = command.flags();
    let flags = flags.borrow();
    flags
        .lookup(HELP_FLAG)
        .is_some_and(|flag| flag.changed() && flag.value() == FlagValue::Bool(true))
}

/// Invokes the hooks of `command` in lifecycle order, stopping at the first error.
///
/// # Errors
///
/// Returns the first error produced by a hook.
pub fn run_hooks(command: &Command, arguments: &[String]) -> Result<()> {
    let lifecycle = command.lifecycle();

    if let Some(hook) = command.nearest_hook(|lifecycle| lifecycle.global_pre_run.clone()) {
        debug!("global_pre_run for `{}`", command.path());
        hook(command, arguments)?;
    }

    if let Some(hook) = &lifecycle.pre_run {
        debug!("pre_run for `{}`", command.path());
        hook(command, arguments)?;
    }

    let run = lifecycle
        .run
        .as_ref()
        .ok_or_else(|| Error::NotExecutable(command.path()))?;
    run(command, arguments)?;

    if let Some(hook) = &lifecycle.post_run {
        debug!("post_run for `{}`", command.path());
        hook(command, arguments)?;
    }

    if let Some(hook) = command.nearest_hook(|lifecycle| lifecycle.global_post_run.clone()) {
        debug!("global_post_run for `{}`", command.path());
        hook(command, arguments)?;
    }

    Ok(())
}
