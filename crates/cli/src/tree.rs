//! Turning a [`CommandDefinition`] into a runnable [`Command`] tree.

use cmdtree_core::args::{
    arbitrary_args, exact_args, maximum_args, minimum_args, no_args, only_valid_args, range_args,
    ArgsValidator,
};
use cmdtree_core::annotations::BASH_COMP_ONE_REQUIRED_FLAG;
use cmdtree_core::command::Command;
use cmdtree_core::defaults::DefaultFlags;
use cmdtree_core::flag::SharedFlagSet;
use indexmap::IndexMap;
use itertools::Itertools;
use log::{debug, info};

use crate::config::expand_working_directory;
use crate::definitions::{ArgsDefinition, ArgsKeyword, CommandDefinition, FlagDefinition, FlagKind};
use crate::error::{Error, Result};
use crate::execution::{execute_command, shell_command};
use crate::interpolation::{build_context, get_templates, interpolate_command};

/// How run hooks execute their commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Shell used as `<shell> -c <command>`.
    pub shell: String,
    /// Print the interpolated command instead of running it.
    pub dry_run: bool,
}

/// What a run hook needs from its definition.
#[derive(Debug, Clone)]
struct ShellAction {
    arguments: Vec<String>,
    working_directory: Option<String>,
    environment: Option<IndexMap<String, String>>,
}

/// Builds the whole tree, with the standard default flags on the root.
///
/// # Errors
///
/// Returns an error if a flag can't be defined, e.g. an unparsable default.
pub fn build_tree(definition: &CommandDefinition, options: &RunOptions) -> Result<Command> {
    let root = Command::with_defaults(&definition.usage, DefaultFlags::standard());
    configure_command(&root, definition, options)?;

    let mut pending = vec![(root.clone(), definition)];
    while let Some((parent, definition)) = pending.pop() {
        for child_definition in &definition.commands {
            let child = Command::new(&child_definition.usage);
            configure_command(&child, child_definition, options)?;
            parent.add_child(&[child.clone()])?;
            pending.push((child, child_definition));
        }
    }

    debug!("Built command tree `{}`", root.name());
    Ok(root)
}

fn configure_command(
    command: &Command,
    definition: &CommandDefinition,
    options: &RunOptions,
) -> Result<()> {
    if let Some(short) = &definition.short {
        command.set_short(short);
    }
    if let Some(long) = &definition.long {
        command.set_long(long);
    }
    if let Some(example) = &definition.example {
        command.set_example(example);
    }
    if let Some(deprecated) = &definition.deprecated {
        command.set_deprecated(deprecated);
    }

    command.set_aliases(&definition.aliases.iter().map(String::as_str).collect_vec());
    command.set_suggest_for(&definition.suggest_for.iter().map(String::as_str).collect_vec());
    command.set_valid_args(&definition.valid_args.iter().map(String::as_str).collect_vec());
    command.set_hidden(definition.hidden);

    if let Some(args) = definition.args {
        command.set_args_validator(args_validator(args));
    }

    define_flags(&command.local_flags(), &definition.flags)?;
    define_flags(&command.global_flags(), &definition.global_flags)?;

    if let Some(arguments) = &definition.command {
        let action = ShellAction {
            arguments: arguments.clone(),
            working_directory: definition.working_directory.clone(),
            environment: definition.environment.clone(),
        };
        let options = options.clone();
        command.set_run(move |command: &Command, args: &[String]| {
            run_action(command, args, &action, &options).map_err(cmdtree_core::error::Error::hook)
        });
    }

    Ok(())
}

fn args_validator(definition: ArgsDefinition) -> ArgsValidator {
    match definition {
        ArgsDefinition::Keyword(ArgsKeyword::Any) => arbitrary_args(),
        ArgsDefinition::Keyword(ArgsKeyword::None) => no_args(),
        ArgsDefinition::Keyword(ArgsKeyword::Valid) => only_valid_args(),
        ArgsDefinition::Count(count) => match (count.exact, count.min, count.max) {
            (Some(exact), _, _) => exact_args(exact),
            (None, Some(min), Some(max)) => range_args(min, max),
            (None, Some(min), None) => minimum_args(min),
            (None, None, Some(max)) => maximum_args(max),
            (None, None, None) => arbitrary_args(),
        },
    }
}

fn define_flags(flags: &SharedFlagSet, definitions: &[FlagDefinition]) -> Result<()> {
    let mut flags = flags.borrow_mut();

    for definition in definitions {
        let name = definition.name.as_str();
        let usage = definition.usage.as_deref().unwrap_or_default();
        let default = definition.default.as_deref();
        let invalid = |value: &str| Error::invalid_default(name, &definition.kind.to_string(), value);

        let flag = match definition.kind {
            FlagKind::Bool => {
                let default = match default {
                    Some(value) => value.parse::<bool>().map_err(|_| invalid(value))?,
                    None => false,
                };
                flags.bool_flag(name, definition.shorthand, default, usage)?
            }
            FlagKind::String => {
                flags.string_flag(name, definition.shorthand, default.unwrap_or_default(), usage)?
            }
            FlagKind::Int => {
                let default = match default {
                    Some(value) => value.parse::<i64>().map_err(|_| invalid(value))?,
                    None => 0,
                };
                flags.int_flag(name, definition.shorthand, default, usage)?
            }
            FlagKind::List => {
                let items = default.map_or_else(Vec::new, |value| value.split(',').collect_vec());
                flags.string_list_flag(name, definition.shorthand, &items, usage)?
            }
        };

        if definition.required {
            flag.set_annotation(BASH_COMP_ONE_REQUIRED_FLAG, vec!["true".to_string()]);
        }
        flag.set_hidden(definition.hidden);
        if let Some(message) = &definition.deprecated {
            flag.set_deprecated(message);
        }
    }

    Ok(())
}

fn run_action(
    command: &Command,
    args: &[String],
    action: &ShellAction,
    options: &RunOptions,
) -> Result<()> {
    let templates = get_templates(&action.arguments)?;
    let context = build_context(command, args);
    let line = interpolate_command(&context, &templates)?.join(" ");

    if options.dry_run {
        print_command_and_environment(command, &line, action.environment.as_ref());
        return Ok(());
    }

    info!("Executing `{}` for `{}`", line, command.path());
    let working_directory = expand_working_directory(action.working_directory.as_deref());
    let shell = shell_command(&options.shell, &line, working_directory.as_deref());
    execute_command(shell, action.environment.as_ref())
}

fn print_command_and_environment(
    command: &Command,
    line: &str,
    environment: Option<&IndexMap<String, String>>,
) {
    command.println(&format!("Executing command:\n{line}"));

    if let Some(environment) = environment {
        command.println("With environment:");
        for (key, value) in environment.iter().sorted() {
            command.println(&format!("\t\"{key}\": \"{value}\""));
        }
    }
}
