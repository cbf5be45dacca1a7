//! Integration tests for cmdtree-cli
//!
//! These tests write tree definitions to disk, load them the way `ct` does and
//! dispatch through the resulting command tree.

use std::io::Write;

use cmdtree_cli::{
    error::Error,
    file_handling::get_command_tree,
    tree::{build_tree, RunOptions},
};
use cmdtree_core::{dispatch::execute_c, streams::SharedBuffer};
use tempfile::{NamedTempFile, TempDir};

fn write_config(yaml: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    file
}

fn dry_run() -> RunOptions {
    RunOptions {
        shell: "/bin/sh".to_string(),
        dry_run: true,
    }
}

const TOOLBOX: &str = r#"
use: tb
short: Team toolbox
global_flags:
  - { name: env, shorthand: e, default: dev, usage: target environment }
commands:
  - use: logs <service>
    short: Tail service logs
    aliases: [l]
    args: { exact: 1 }
    flags:
      - { name: lines, shorthand: n, kind: int, default: "100" }
      - { name: follow, shorthand: f, kind: bool }
    command: ["kubectl", "logs", "{args}", "--tail={lines}", "--follow={follow}", "-n", "{env}"]
  - use: cache
    short: Cache maintenance
    commands:
      - use: flush
        deprecated: use `cache purge`
        command: ["redis-cli", "FLUSHALL"]
      - use: purge
        flags:
          - { name: keys, kind: list, required: true }
        command: ["purge", "{keys}"]
"#;

/// Load a definition from disk and dry-run a nested command by alias
#[test]
fn test_load_and_dry_run() {
    let config = write_config(TOOLBOX);
    let definition = get_command_tree(config.path().to_str().unwrap()).unwrap();
    let root = build_tree(&definition, &dry_run()).unwrap();

    let output = SharedBuffer::new();
    root.set_output(output.clone());
    root.set_args(&["l", "web", "-fn", "20", "--env=prod"]);

    let (resolved, result) = execute_c(&root);

    result.unwrap();
    assert_eq!(resolved.path(), "tb logs");
    assert_eq!(resolved.called_as(), "l");
    assert_eq!(
        output.contents(),
        "Executing command:\nkubectl logs web --tail=20 --follow=true -n prod\n"
    );
}

/// List flags repeat and required flags are enforced
#[test]
fn test_list_and_required_flags() {
    let config = write_config(TOOLBOX);
    let definition = get_command_tree(config.path().to_str().unwrap()).unwrap();
    let root = build_tree(&definition, &dry_run()).unwrap();
    let output = SharedBuffer::new();
    root.set_output(output.clone());
    root.set_error_output(SharedBuffer::new());

    root.set_args(&["cache", "purge"]);
    let (_, result) = execute_c(&root);
    assert_eq!(
        result.unwrap_err().to_string(),
        r#"required flag(s) "keys" not set"#
    );

    root.set_args(&["cache", "purge", "--keys", "a,b", "--keys", "c"]);
    let (_, result) = execute_c(&root);
    result.unwrap();
    assert_eq!(output.contents(), "Executing command:\npurge a,b,c\n");
}

/// Deprecated commands announce themselves before running
#[test]
fn test_deprecated_command_still_runs() {
    let config = write_config(TOOLBOX);
    let definition = get_command_tree(config.path().to_str().unwrap()).unwrap();
    let root = build_tree(&definition, &dry_run()).unwrap();
    let output = SharedBuffer::new();
    root.set_output(output.clone());
    root.set_args(&["cache", "flush"]);

    let (_, result) = execute_c(&root);

    result.unwrap();
    assert_eq!(
        output.contents(),
        "Command \"flush\" is deprecated, use `cache purge`\nExecuting command:\nredis-cli FLUSHALL\n"
    );
}

/// Mistyped group members get suggestions
#[test]
fn test_unknown_sub_command_suggestions() {
    let config = write_config(TOOLBOX);
    let definition = get_command_tree(config.path().to_str().unwrap()).unwrap();
    let root = build_tree(&definition, &dry_run()).unwrap();
    root.set_error_output(SharedBuffer::new());
    root.set_args(&["cache", "purg"]);

    let (resolved, result) = execute_c(&root);

    assert_eq!(resolved.path(), "tb cache");
    let message = result.unwrap_err().to_string();
    assert!(message.starts_with("unknown command \"purg\" for \"tb cache\""));
    assert!(message.contains("\tpurge\n"));
    assert!(!message.contains("flush"));
}

/// The help flag prints the use line instead of running
#[test]
fn test_help_flag() {
    let config = write_config(TOOLBOX);
    let definition = get_command_tree(config.path().to_str().unwrap()).unwrap();
    let root = build_tree(&definition, &dry_run()).unwrap();
    let output = SharedBuffer::new();
    root.set_output(output.clone());
    root.set_args(&["logs", "--help"]);

    let (_, result) = execute_c(&root);

    result.unwrap();
    assert_eq!(
        output.contents(),
        "tb logs <service> [flags]\n\nTail service logs\n"
    );
}

/// Without dry run the shell command runs in the configured directory
#[test]
fn test_real_execution() {
    let directory = TempDir::new().unwrap();
    let marker = directory.path().join("marker.txt");
    let yaml = format!(
        r#"
use: app
commands:
  - use: touch <file>
    args: {{ exact: 1 }}
    working_directory: "{}"
    environment:
      CT_MARKER_CONTENT: hello
    command: ["printf", "%s", "\"$CT_MARKER_CONTENT\"", ">", "{{args}}"]
"#,
        directory.path().display()
    );
    let config = write_config(&yaml);
    let definition = get_command_tree(config.path().to_str().unwrap()).unwrap();
    let options = RunOptions {
        shell: "/bin/sh".to_string(),
        dry_run: false,
    };
    let root = build_tree(&definition, &options).unwrap();
    root.set_args(&["touch", "marker.txt"]);

    let (_, result) = execute_c(&root);

    result.unwrap();
    assert_eq!(std::fs::read_to_string(marker).unwrap(), "hello");
}

/// A failing shell command surfaces as an error
#[test]
fn test_failing_command() {
    let config = write_config(
        r#"
use: app
command: ["exit", "7"]
"#,
    );
    let definition = get_command_tree(config.path().to_str().unwrap()).unwrap();
    let options = RunOptions {
        shell: "/bin/sh".to_string(),
        dry_run: false,
    };
    let root = build_tree(&definition, &options).unwrap();
    root.set_error_output(SharedBuffer::new());
    root.set_args::<&str>(&[]);

    let (_, result) = execute_c(&root);

    assert_eq!(
        result.unwrap_err().to_string(),
        "The sub process exited with a non-success code."
    );
}

/// Broken definitions are rejected at load time
#[test]
fn test_invalid_definitions() {
    let config = write_config("use: app\ncommands: [{use: a}, {use: a}]\n");
    assert!(matches!(
        get_command_tree(config.path().to_str().unwrap()),
        Err(Error::NonUniqueCommandName(..))
    ));

    let config = write_config("use: app\ncommands: not-a-list\n");
    assert!(matches!(
        get_command_tree(config.path().to_str().unwrap()),
        Err(Error::Yaml { .. })
    ));

    let config = write_config("use: app\ncommand: [\"echo\", \"{nope}\"]\n");
    assert!(matches!(
        get_command_tree(config.path().to_str().unwrap()),
        Err(Error::NotFoundPlaceholder(..))
    ));
}
