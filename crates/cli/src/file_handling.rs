//! Reading and validating a command tree definition.

use std::collections::HashSet;
use std::fs::File;

use log::debug;

use crate::definitions::{CommandDefinition, FlagDefinition};
use crate::error::Error::{
    EmptyName, NameWithDash, NameWithSpace, NonUniqueCommandName, NonUniqueFlagName,
    NonUniqueShorthand, NotFoundPlaceholder,
};
use crate::error::{Error, Result};
use crate::interpolation::{get_templates, get_tokens, ARGS_PLACEHOLDER};

fn get_reader(file_description: &str, path: &str) -> Result<File> {
    File::open(path)
        .map_err(|e| Error::io_error(file_description.to_string(), path.to_string(), e))
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(EmptyName);
    }

    if name.contains(' ') {
        return Err(NameWithSpace(name.to_string()));
    }

    if name.starts_with('-') {
        return Err(NameWithDash(name.to_string()));
    }

    Ok(())
}

fn validate_children(path: &str, children: &[CommandDefinition]) -> Result<()> {
    let mut names = HashSet::new();

    for child in children {
        for name in std::iter::once(child.name()).chain(child.aliases.iter().map(String::as_str)) {
            validate_name(name)?;
            if !names.insert(name) {
                return Err(NonUniqueCommandName(path.to_string(), name.to_string()));
            }
        }
    }

    Ok(())
}

/// Checks a node's own flags and returns the names every descendant inherits.
fn validate_flags(
    path: &str,
    command: &CommandDefinition,
    inherited: &HashSet<String>,
) -> Result<HashSet<String>> {
    let mut names = HashSet::new();
    let mut shorthands = HashSet::new();

    for flag in command.flags.iter().chain(command.global_flags.iter()) {
        validate_name(&flag.name)?;

        if !names.insert(flag.name.clone()) {
            return Err(NonUniqueFlagName(path.to_string(), flag.name.clone()));
        }

        if let Some(shorthand) = flag.shorthand {
            if !shorthands.insert(shorthand) {
                return Err(NonUniqueShorthand(path.to_string(), shorthand));
            }
        }
    }

    if let Some(arguments) = &command.command {
        let templates = get_templates(arguments)?;
        for token in get_tokens(&templates) {
            let known = token == ARGS_PLACEHOLDER
                || names.contains(&token)
                || inherited.contains(&token);
            if !known {
                return Err(NotFoundPlaceholder(path.to_string(), token));
            }
        }
    }

    let mut visible = inherited.clone();
    visible.extend(command.global_flags.iter().map(|flag: &FlagDefinition| flag.name.clone()));
    Ok(visible)
}

/// Validates names, flags and placeholders across the whole tree.
///
/// # Errors
///
/// Returns the first invalid or duplicated name, duplicated flag or shorthand,
/// malformed template, or placeholder that names no flag in scope.
pub fn validate_tree(root: &CommandDefinition) -> Result<()> {
    validate_name(root.name())?;

    let mut pending = vec![(root, root.name().to_string(), HashSet::new())];
    while let Some((command, path, inherited)) = pending.pop() {
        let visible = validate_flags(&path, command, &inherited)?;
        validate_children(&path, &command.commands)?;

        for child in &command.commands {
            pending.push((child, format!("{} {}", path, child.name()), visible.clone()));
        }
    }

    Ok(())
}

/// Loads and validates a command tree from a YAML file.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be read
/// - The YAML is malformed or doesn't match the expected structure
/// - Any name, flag or placeholder fails validation
///
/// # Examples
///
/// ```no_run
/// use cmdtree_cli::file_handling::get_command_tree;
///
/// let root = get_command_tree("/home/me/.cmdtree/commands.yml")?;
/// println!("Loaded {}", root);
/// # Ok::<(), cmdtree_cli::error::Error>(())
/// ```
pub fn get_command_tree(config_path: &str) -> Result<CommandDefinition> {
    let config_reader = get_reader("config", config_path)?;

    let root: CommandDefinition = serde_yaml::from_reader(config_reader).map_err(|e| {
        Error::yaml_error(
            "reading".to_string(),
            "config".to_string(),
            config_path.to_string(),
            e,
        )
    })?;

    validate_tree(&root)?;
    debug!("Loaded command tree `{}` from `{}`", root.name(), config_path);

    Ok(root)
}
