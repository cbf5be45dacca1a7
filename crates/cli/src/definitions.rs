//! The YAML shape of a command tree definition.
//!
//! ```yaml
//! use: ops
//! short: Operations toolbox
//! global_flags:
//!   - name: env
//!     shorthand: e
//!     default: staging
//! commands:
//!   - use: deploy <service>
//!     aliases: [d]
//!     args: { exact: 1 }
//!     flags:
//!       - name: replicas
//!         kind: int
//!         default: "2"
//!     command: ["./deploy.sh", "{args}", "--env={env}", "--replicas={replicas}"]
//! ```

use std::fmt::{Display, Formatter};

use indexmap::IndexMap;
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlagKind {
    Bool,
    #[default]
    String,
    Int,
    List,
}

impl Display for FlagKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(match self {
            FlagKind::Bool => "bool",
            FlagKind::String => "string",
            FlagKind::Int => "int",
            FlagKind::List => "list",
        })
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct FlagDefinition {
    pub name: String,
    pub shorthand: Option<char>,
    #[serde(default)]
    pub kind: FlagKind,
    pub default: Option<String>,
    pub usage: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub hidden: bool,
    pub deprecated: Option<String>,
}

impl Display for FlagDefinition {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "--{}", self.name)?;

        if let Some(shorthand) = self.shorthand {
            write!(formatter, "/-{shorthand}")?;
        }

        Ok(())
    }
}

/// Keyword rules for positional arguments.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ArgsKeyword {
    Any,
    None,
    /// Only the command's `valid_args`.
    Valid,
}

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ArgsCount {
    pub exact: Option<usize>,
    pub min: Option<usize>,
    pub max: Option<usize>,
}

/// Either `any`, `none`, `valid`, or a count such as `{ min: 1, max: 3 }`.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(untagged)]
pub enum ArgsDefinition {
    Keyword(ArgsKeyword),
    Count(ArgsCount),
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct CommandDefinition {
    #[serde(rename = "use")]
    pub usage: String,
    pub short: Option<String>,
    pub long: Option<String>,
    pub example: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub suggest_for: Vec<String>,
    pub deprecated: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub flags: Vec<FlagDefinition>,
    #[serde(default)]
    pub global_flags: Vec<FlagDefinition>,
    /// Argument templates run through the shell; a command without one only groups others.
    pub command: Option<Vec<String>>,
    pub working_directory: Option<String>,
    pub environment: Option<IndexMap<String, String>>,
    pub args: Option<ArgsDefinition>,
    #[serde(default)]
    pub valid_args: Vec<String>,
    #[serde(default)]
    pub commands: Vec<CommandDefinition>,
}

impl CommandDefinition {
    /// The first word of `use`.
    pub fn name(&self) -> &str {
        cmdtree_core::command::derive_name(&self.usage)
    }
}

impl Display for CommandDefinition {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.short {
            Some(short) => write!(formatter, "{} ({})", self.name(), short),
            None => formatter.write_str(self.name()),
        }
    }
}
