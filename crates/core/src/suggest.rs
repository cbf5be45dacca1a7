//! "Did you mean" suggestions for mistyped sub-commands.

use itertools::Itertools;

use crate::command::Command;

/// Names of `command`'s available children that `typed` may have meant.
///
/// A child qualifies when its name is within the command's
/// `suggestions_minimum_distance` (Levenshtein, ignoring case), starts with
/// `typed` (ignoring case), or lists `typed` in its `suggest_for`. Names come
/// back in sorted child order, each at most once.
pub fn suggestions_for(command: &Command, typed: &str) -> Vec<String> {
    let distance = match command.settings().suggestions_minimum_distance {
        0 => 2,
        distance => distance,
    };
    let typed_lower = typed.to_lowercase();

    command
        .sorted_children()
        .iter()
        .filter(|child| child.is_available())
        .filter(|child| {
            let name = child.name().to_lowercase();
            strsim::levenshtein(&typed_lower, &name) <= distance
                || name.starts_with(&typed_lower)
                || child
                    .suggest_for()
                    .iter()
                    .any(|explicit| explicit.eq_ignore_ascii_case(typed))
        })
        .map(Command::name)
        .unique()
        .collect()
}

/// Suggestions for an unknown `typed` token, honouring `disable_suggestions`
/// on the command and on its root.
pub(crate) fn find_suggestions(command: &Command, typed: &str) -> Vec<String> {
    if command.settings().disable_suggestions || command.root().settings().disable_suggestions {
        return Vec::new();
    }
    suggestions_for(command, typed)
}
