use itertools::Itertools;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error returned from lifecycle hooks.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Command `{}` can't be a child of itself", .0)]
    SelfParent(String),

    #[error("unknown flag: --{}", .0)]
    UnknownFlag(String),

    #[error("unknown shorthand flag: '{}' in -{}", .0, .1)]
    UnknownShorthand(char, String),

    #[error("flag needs an argument: {}", .0)]
    FlagNeedsValue(String),

    #[error("invalid argument \"{}\" for \"{}\" flag: {}", .value, .flag, .reason)]
    InvalidFlagValue {
        flag: String,
        value: String,
        reason: String,
    },

    #[error("bad flag syntax: {}", .0)]
    BadFlagSyntax(String),

    #[error("flag redefined: {}", .0)]
    FlagRedefined(String),

    #[error("unable to redefine '{}' shorthand: already used by `{}`", .0, .1)]
    ShorthandRedefined(char, String),

    #[error("trying to get {} value of flag `{}` of type {}", .expected, .flag, .actual)]
    FlagType {
        flag: String,
        expected: String,
        actual: String,
    },

    #[error("flag `{}` is not defined", .0)]
    UndefinedFlag(String),

    #[error("required flag(s) {} not set", quote_names(.0))]
    RequiredFlagsMissing(Vec<String>),

    #[error("Command `{}` can't adopt its own ancestor `{}`", .0, .1)]
    CyclicChild(String, String),

    #[error("Command `{}` is not executable", .0)]
    NotExecutable(String),

    #[error("unknown command \"{}\" for \"{}\"{}", .command, .path, format_suggestions(.suggestions))]
    UnknownCommand {
        command: String,
        path: String,
        suggestions: Vec<String>,
    },

    #[error("{}", .0)]
    InvalidArgs(String),

    #[error("{}", .0)]
    Hook(BoxedError),

    #[error("IO error: {}", .0)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wraps anything error-like as a hook failure.
    ///
    /// ```
    /// use cmdtree_core::error::Error;
    ///
    /// let err = Error::hook("deploy target is locked");
    /// assert_eq!(err.to_string(), "deploy target is locked");
    /// ```
    pub fn hook<E: Into<BoxedError>>(error: E) -> Self {
        Self::Hook(error.into())
    }

    pub fn invalid_flag_value(flag: &str, value: &str, reason: impl ToString) -> Self {
        Self::InvalidFlagValue {
            flag: flag.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether the error came out of flag-value parsing.
    #[must_use]
    pub fn is_flag_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownFlag(_)
                | Self::BadFlagSyntax(_)
                | Self::UnknownShorthand(..)
                | Self::FlagNeedsValue(_)
                | Self::InvalidFlagValue { .. }
        )
    }
}

fn quote_names(names: &[String]) -> String {
    names.iter().map(|name| format!("\"{name}\"")).join(", ")
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        return String::new();
    }

    let lines = suggestions
        .iter()
        .map(|suggestion| format!("\t{suggestion}"))
        .join("\n");
    format!("\n\nDid you mean this?\n{lines}\n")
}
