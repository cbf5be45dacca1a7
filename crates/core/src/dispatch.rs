//! Resolving argv to a command and executing it.
//!
//! Dispatch walks down from the root, one positional token at a time, until
//! no child matches the next token. Matching is exact on the child's name or
//! one of its aliases; the first token left unmatched becomes an argument of
//! the command reached so far.

use log::{debug, info};

use crate::command::Command;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::lifecycle;
use crate::split::{args_minus_first, strip_flags};
use crate::suggest::find_suggestions;

/// Resolves `args` against the tree below `command`.
///
/// Returns the deepest matching command with the arguments left for it, in
/// their original order and with flags untouched.
///
/// # Errors
///
/// Returns [`Error::UnknownCommand`] when the resolved command can't run,
/// has sub-commands and a positional token is left over.
pub fn find(command: &Command, args: &[String]) -> Result<(Command, Vec<String>)> {
    let (resolved, rest) = resolve(command, args);
    check_unknown(&resolved, &rest)?;
    Ok((resolved, rest))
}

fn resolve(command: &Command, args: &[String]) -> (Command, Vec<String>) {
    let mut current = command.clone();
    let mut rest = args.to_vec();

    loop {
        let positional = strip_flags(&rest, &current.flags().borrow());
        let Some(token) = positional.first() else {
            break;
        };

        let Some(child) = current.find_next(token) else {
            break;
        };

        debug!("Matched `{}` to `{}`", token, child.path());
        rest = args_minus_first(&rest, token);
        current = child;
    }

    (current, rest)
}

fn check_unknown(command: &Command, rest: &[String]) -> Result<()> {
    if command.is_runnable() || !command.has_sub_commands() {
        return Ok(());
    }

    let positional = strip_flags(rest, &command.flags().borrow());
    match positional.first() {
        Some(token) => Err(Error::UnknownCommand {
            command: token.clone(),
            path: command.path(),
            suggestions: find_suggestions(command, token),
        }),
        None => Ok(()),
    }
}

/// Clears the `called_as` record of every command in the tree.
fn reset_called_as(root: &Command) {
    let mut pending = vec![root.clone()];
    while let Some(command) = pending.pop() {
        command.node_mut().called_as = Default::default();
        pending.extend(command.children());
    }
}

fn mark_called(command: &Command) {
    let name = command.name();
    let mut node = command.node_mut();
    node.called_as.called = true;
    if node.called_as.name.is_empty() {
        node.called_as.name = name;
    }
}

/// Dispatches the root's arguments and runs the resolved command.
///
/// Arguments come from [`Command::set_args`] on the root, defaulting to the
/// process arguments. Returns the resolved command alongside the outcome.
pub fn execute_c(command: &Command) -> (Command, Result<()>) {
    let root = command.root();
    let args = root
        .node()
        .args
        .clone()
        .unwrap_or_else(|| std::env::args().skip(1).collect());

    reset_called_as(&root);
    let (resolved, rest) = resolve(&root, &args);
    info!("Resolved `{}` with {:?}", resolved.path(), rest);

    // Values and `changed` marks from an earlier run don't carry over.
    resolved.flags().borrow().reset();

    let result = check_unknown(&resolved, &rest).and_then(|()| {
        mark_called(&resolved);
        lifecycle::execute(&resolved, &rest)
    });

    if let Err(e) = &result {
        report(&root, &resolved, e);
    }

    (resolved, result)
}

/// Dispatches and runs, discarding the resolved command.
///
/// # Errors
///
/// Returns the first dispatch, validation or hook error.
pub fn execute(command: &Command) -> Result<()> {
    execute_c(command).1
}

/// Attaches `context` to the root, then behaves like [`execute`].
///
/// # Errors
///
/// See [`execute`].
pub fn execute_context(command: &Command, context: Context) -> Result<()> {
    command.root().set_context(context);
    execute(command)
}

fn report(root: &Command, resolved: &Command, error: &Error) {
    let (root_settings, settings) = (root.settings(), resolved.settings());
    if root_settings.silence_errors || settings.silence_errors {
        return;
    }

    resolved.println_err(&format!("Error: {error}"));
    if !root_settings.silence_usage && !settings.silence_usage {
        resolved.println_err(&format!("Run '{} --help' for usage.", resolved.path()));
    }
}
