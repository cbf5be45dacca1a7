use std::collections::{HashMap, HashSet};

use cmdtree_core::command::Command;
use cmdtree_core::flag::FlagValue;
use leon::Template;

use crate::error::Result;

/// Placeholder holding the positional arguments, joined by spaces.
pub const ARGS_PLACEHOLDER: &str = "args";

pub fn get_templates(command: &[String]) -> Result<Vec<Template<'_>>> {
    let mut templates: Vec<Template> = Vec::new();

    for argument in command {
        templates.push(Template::parse(argument.as_ref())?);
    }

    Ok(templates)
}

/// Find all placeholders in all arguments of a command.
pub fn get_tokens(templates: &[Template]) -> HashSet<String> {
    let mut tokens = HashSet::new();

    for template in templates {
        for key in template.keys() {
            let _ = tokens.insert((*key).to_string());
        }
    }

    tokens
}

/// Values for every flag the resolved command can see, plus [`ARGS_PLACEHOLDER`].
///
/// Lists are joined with commas.
pub fn build_context(command: &Command, args: &[String]) -> HashMap<String, String> {
    let mut context = HashMap::new();

    command.flags().borrow().visit_all(|flag| {
        let value = match flag.value() {
            FlagValue::StringList(values) => values.join(","),
            value => value.to_string(),
        };
        context.insert(flag.name().to_string(), value);
    });

    context.insert(ARGS_PLACEHOLDER.to_string(), args.join(" "));
    context
}

pub fn interpolate_command(
    context: &HashMap<String, String>,
    templates: &[Template],
) -> Result<Vec<String>> {
    let mut interpolated_arguments: Vec<String> = Vec::new();

    for template in templates {
        interpolated_arguments.push(template.render(&context)?);
    }

    Ok(interpolated_arguments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command_with_flags() -> Command {
        let command = Command::new("greet");
        let local = command.local_flags();
        let mut local = local.borrow_mut();
        local.string_flag("name", None, "World", "").unwrap();
        local.int_flag("times", None, 1, "").unwrap();
        local
            .string_list_flag("tags", None, &["a", "b"], "")
            .unwrap();
        drop(local);
        command
    }

    #[test]
    fn test_get_tokens() {
        let command = vec!["echo".to_string(), "Hello {name} x{times}".to_string()];
        let templates = get_templates(&command).unwrap();
        let tokens = get_tokens(&templates);

        assert_eq!(tokens.len(), 2);
        assert!(tokens.contains("name"));
        assert!(tokens.contains("times"));
    }

    #[test]
    fn test_build_context() {
        let command = command_with_flags();
        command.flags().borrow().set("name", "Ferris").unwrap();

        let context = build_context(&command, &["one".to_string(), "two".to_string()]);

        assert_eq!(context["name"], "Ferris");
        assert_eq!(context["times"], "1");
        assert_eq!(context["tags"], "a,b");
        assert_eq!(context[ARGS_PLACEHOLDER], "one two");
    }

    #[test]
    fn test_interpolate_command() {
        let command = command_with_flags();
        let arguments = vec!["echo".to_string(), "Hello {name}: {args}".to_string()];
        let templates = get_templates(&arguments).unwrap();

        let context = build_context(&command, &["again".to_string()]);
        let rendered = interpolate_command(&context, &templates).unwrap();

        assert_eq!(rendered, vec!["echo", "Hello World: again"]);
    }

    #[test]
    fn test_unknown_placeholder_fails_to_render() {
        let arguments = vec!["echo {missing}".to_string()];
        let templates = get_templates(&arguments).unwrap();
        assert!(interpolate_command(&HashMap::new(), &templates).is_err());
    }

    #[test]
    fn test_invalid_template() {
        let arguments = vec!["echo {unclosed".to_string()];
        assert!(get_templates(&arguments).is_err());
    }
}
