//! Positional argument validators.

use std::rc::Rc;

use crate::command::Command;
use crate::error::{Error, Result};

/// Checks the positional arguments a command is about to run with.
pub type ArgsValidator = Rc<dyn Fn(&Command, &[String]) -> Result<()>>;

/// Accepts anything.
#[must_use]
pub fn arbitrary_args() -> ArgsValidator {
    Rc::new(|_: &Command, _: &[String]| Ok(()))
}

/// Rejects any positional argument, reporting it as an unknown command.
#[must_use]
pub fn no_args() -> ArgsValidator {
    Rc::new(|command: &Command, args: &[String]| match args.first() {
        Some(first) => Err(Error::InvalidArgs(format!(
            "unknown command \"{}\" for \"{}\"",
            first,
            command.path()
        ))),
        None => Ok(()),
    })
}

#[must_use]
pub fn minimum_args(count: usize) -> ArgsValidator {
    Rc::new(move |_: &Command, args: &[String]| {
        if args.len() < count {
            return Err(Error::InvalidArgs(format!(
                "requires at least {} arg(s), only received {}",
                count,
                args.len()
            )));
        }
        Ok(())
    })
}

#[must_use]
pub fn maximum_args(count: usize) -> ArgsValidator {
    Rc::new(move |_: &Command, args: &[String]| {
        if args.len() > count {
            return Err(Error::InvalidArgs(format!(
                "accepts at most {} arg(s), received {}",
                count,
                args.len()
            )));
        }
        Ok(())
    })
}

#[must_use]
pub fn exact_args(count: usize) -> ArgsValidator {
    Rc::new(move |_: &Command, args: &[String]| {
        if args.len() != count {
            return Err(Error::InvalidArgs(format!(
                "accepts {} arg(s), received {}",
                count,
                args.len()
            )));
        }
        Ok(())
    })
}

#[must_use]
pub fn range_args(min: usize, max: usize) -> ArgsValidator {
    Rc::new(move |_: &Command, args: &[String]| {
        if args.len() < min || args.len() > max {
            return Err(Error::InvalidArgs(format!(
                "accepts between {} and {} arg(s), received {}",
                min,
                max,
                args.len()
            )));
        }
        Ok(())
    })
}

/// Rejects arguments missing from the command's `valid_args`.
///
/// A command without `valid_args` accepts everything.
#[must_use]
pub fn only_valid_args() -> ArgsValidator {
    Rc::new(|command: &Command, args: &[String]| {
        let valid = command.valid_args();
        if valid.is_empty() {
            return Ok(());
        }

        match args.iter().find(|arg| !valid.contains(arg)) {
            Some(invalid) => Err(Error::InvalidArgs(format!(
                "invalid argument \"{}\" for \"{}\"",
                invalid,
                command.path()
            ))),
            None => Ok(()),
        }
    })
}
