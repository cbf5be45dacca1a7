//! Flag definitions and the flag-value parser.
//!
//! A [`FlagSet`] is an insertion-ordered collection of [`Flag`]s keyed by
//! (normalized) name, with a secondary shorthand index. Flags are shared
//! through `Rc`, so the same flag can live in several sets at once: a flag
//! merged from an ancestor's global set into a descendant's full set is one
//! object, and parsing through either set updates both.
//!
//! Accepted syntax:
//!
//! - `--name`, `--name=value`, `--name value`
//! - `-x`, `-x value`, `-xvalue`, `-x=value`, clustered booleans `-abc`
//! - `--` ends flag parsing; everything after it is positional

use std::cell::{Cell, RefCell};
use std::fmt::{Debug, Display, Formatter};
use std::rc::Rc;

use indexmap::IndexMap;
use itertools::Itertools;
use log::{debug, warn};

use crate::annotations::BASH_COMP_ONE_REQUIRED_FLAG;
use crate::error::Error::{
    BadFlagSyntax, FlagNeedsValue, FlagRedefined, FlagType, ShorthandRedefined, UndefinedFlag,
    UnknownFlag, UnknownShorthand,
};
use crate::error::{Error, Result};

/// Maps a flag name to its canonical form, e.g. `dry_run` to `dry-run`.
pub type NormalizeFn = Rc<dyn Fn(&str) -> String>;

/// Text sink that collects parse warnings (deprecated flags and the like).
pub type ErrorSink = Rc<RefCell<String>>;

/// A flag set shared between a command's collections and the caller.
pub type SharedFlagSet = Rc<RefCell<FlagSet>>;

/// Typed value held by a flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagValue {
    Bool(bool),
    String(String),
    Int(i64),
    StringList(Vec<String>),
}

impl FlagValue {
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            FlagValue::Bool(_) => "bool",
            FlagValue::String(_) => "string",
            FlagValue::Int(_) => "int",
            FlagValue::StringList(_) => "stringList",
        }
    }

    /// Converts `raw` into this value's type and stores it.
    ///
    /// Lists replace their defaults on the first assignment and append on
    /// every later one.
    fn assign(&mut self, raw: &str, first_assignment: bool) -> std::result::Result<(), String> {
        match self {
            FlagValue::Bool(value) => *value = parse_bool(raw)?,
            FlagValue::String(value) => *value = raw.to_string(),
            FlagValue::Int(value) => *value = raw.parse::<i64>().map_err(|e| e.to_string())?,
            FlagValue::StringList(values) => {
                let items = raw.split(',').map(str::to_string);
                if first_assignment {
                    *values = items.collect();
                } else {
                    values.extend(items);
                }
            }
        }

        Ok(())
    }
}

impl Display for FlagValue {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FlagValue::Bool(value) => write!(formatter, "{value}"),
            FlagValue::String(value) => formatter.write_str(value),
            FlagValue::Int(value) => write!(formatter, "{value}"),
            FlagValue::StringList(values) => write!(formatter, "[{}]", values.join(",")),
        }
    }
}

fn parse_bool(raw: &str) -> std::result::Result<bool, String> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        _ => Err("expected a boolean".to_string()),
    }
}

/// A single flag definition plus its parse state.
pub struct Flag {
    name: String,
    shorthand: Option<char>,
    usage: String,
    default: String,
    initial: FlagValue,
    no_opt_default: Option<String>,
    value: RefCell<FlagValue>,
    changed: Cell<bool>,
    hidden: Cell<bool>,
    deprecated: RefCell<Option<String>>,
    annotations: RefCell<IndexMap<String, Vec<String>>>,
}

impl Flag {
    /// Creates a flag holding `value` as its default.
    ///
    /// Boolean flags get a no-value default of `"true"`, so `--verbose` on
    /// its own never consumes the next token.
    #[must_use]
    pub fn new(name: &str, value: FlagValue, usage: &str) -> Self {
        let no_opt_default = matches!(value, FlagValue::Bool(_)).then(|| "true".to_string());
        Self {
            name: name.to_string(),
            shorthand: None,
            usage: usage.to_string(),
            default: value.to_string(),
            initial: value.clone(),
            no_opt_default,
            value: RefCell::new(value),
            changed: Cell::new(false),
            hidden: Cell::new(false),
            deprecated: RefCell::new(None),
            annotations: RefCell::new(IndexMap::new()),
        }
    }

    #[must_use]
    pub fn with_shorthand(mut self, shorthand: char) -> Self {
        self.shorthand = Some(shorthand);
        self
    }

    /// Value used when the flag appears without one (`--color` vs `--color=never`).
    #[must_use]
    pub fn with_no_opt_default(mut self, value: &str) -> Self {
        self.no_opt_default = Some(value.to_string());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shorthand(&self) -> Option<char> {
        self.shorthand
    }

    pub fn usage(&self) -> &str {
        &self.usage
    }

    /// The default value rendered as text.
    pub fn default_value(&self) -> &str {
        &self.default
    }

    pub fn no_opt_default(&self) -> Option<&str> {
        self.no_opt_default.as_deref()
    }

    pub fn has_no_opt_default(&self) -> bool {
        self.no_opt_default.is_some()
    }

    pub fn value(&self) -> FlagValue {
        self.value.borrow().clone()
    }

    /// Whether the value was set from the command line or through [`FlagSet::set`].
    pub fn changed(&self) -> bool {
        self.changed.get()
    }

    pub fn hidden(&self) -> bool {
        self.hidden.get()
    }

    pub fn set_hidden(&self, hidden: bool) {
        self.hidden.set(hidden);
    }

    pub fn deprecated(&self) -> Option<String> {
        self.deprecated.borrow().clone()
    }

    pub fn set_deprecated(&self, message: &str) {
        *self.deprecated.borrow_mut() = Some(message.to_string());
    }

    pub fn annotation(&self, key: &str) -> Option<Vec<String>> {
        self.annotations.borrow().get(key).cloned()
    }

    pub fn set_annotation(&self, key: &str, values: Vec<String>) {
        self.annotations.borrow_mut().insert(key.to_string(), values);
    }

    /// Whether the flag carries the one-required annotation set to `true`.
    pub fn is_required(&self) -> bool {
        self.annotations
            .borrow()
            .get(BASH_COMP_ONE_REQUIRED_FLAG)
            .and_then(|values| values.first())
            .is_some_and(|value| value == "true")
    }

    /// Restores the default value and clears [`Flag::changed`].
    pub fn reset(&self) {
        *self.value.borrow_mut() = self.initial.clone();
        self.changed.set(false);
    }

    fn assign(&self, raw: &str) -> Result<()> {
        self.value
            .borrow_mut()
            .assign(raw, !self.changed.get())
            .map_err(|reason| Error::invalid_flag_value(&self.name, raw, reason))?;
        self.changed.set(true);
        Ok(())
    }
}

impl Debug for Flag {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Flag")
            .field("name", &self.name)
            .field("shorthand", &self.shorthand)
            .field("value", &self.value.borrow())
            .field("changed", &self.changed.get())
            .finish_non_exhaustive()
    }
}

/// Parse errors that may be tolerated instead of failing the parse.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ParseErrorsAllowlist {
    /// Skip flags that are not defined instead of failing.
    pub unknown_flags: bool,
}

/// An ordered collection of flags and the result of the last parse.
pub struct FlagSet {
    name: String,
    formal: IndexMap<String, Rc<Flag>>,
    shorthands: IndexMap<char, Rc<Flag>>,
    args: Vec<String>,
    args_len_at_dash: Option<usize>,
    parsed: bool,
    normalize: Option<NormalizeFn>,
    output: Option<ErrorSink>,
    allowlist: ParseErrorsAllowlist,
}

impl FlagSet {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            formal: IndexMap::new(),
            shorthands: IndexMap::new(),
            args: Vec::new(),
            args_len_at_dash: None,
            parsed: false,
            normalize: None,
            output: None,
            allowlist: ParseErrorsAllowlist::default(),
        }
    }

    /// Wraps the set for sharing between command scopes.
    #[must_use]
    pub fn shared(self) -> SharedFlagSet {
        Rc::new(RefCell::new(self))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.formal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formal.is_empty()
    }

    pub fn set_output(&mut self, output: ErrorSink) {
        self.output = Some(output);
    }

    pub fn set_allowlist(&mut self, allowlist: ParseErrorsAllowlist) {
        self.allowlist = allowlist;
    }

    /// Installs a name normalizer and re-keys the flags already defined.
    pub fn set_normalize(&mut self, normalize: NormalizeFn) {
        let flags: Vec<Rc<Flag>> = self.formal.values().cloned().collect();
        self.formal = flags
            .into_iter()
            .map(|flag| (normalize(flag.name()), flag))
            .collect();
        self.normalize = Some(normalize);
    }

    fn key(&self, name: &str) -> String {
        match &self.normalize {
            Some(normalize) => normalize(name),
            None => name.to_string(),
        }
    }

    /// Adds a flag definition.
    ///
    /// # Errors
    ///
    /// Returns an error if the name or the shorthand is already taken in this set.
    pub fn add_flag(&mut self, flag: Flag) -> Result<Rc<Flag>> {
        let flag = Rc::new(flag);
        self.insert(Rc::clone(&flag))?;
        Ok(flag)
    }

    fn insert(&mut self, flag: Rc<Flag>) -> Result<()> {
        let key = self.key(flag.name());
        if self.formal.contains_key(&key) {
            return Err(FlagRedefined(format!("{}: {}", self.name, flag.name())));
        }

        if let Some(shorthand) = flag.shorthand() {
            if let Some(existing) = self.shorthands.get(&shorthand) {
                return Err(ShorthandRedefined(shorthand, existing.name().to_string()));
            }
            self.shorthands.insert(shorthand, Rc::clone(&flag));
        }

        self.formal.insert(key, flag);
        Ok(())
    }

    /// Defines a boolean flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the name or shorthand is already defined.
    pub fn bool_flag(
        &mut self,
        name: &str,
        shorthand: Option<char>,
        default: bool,
        usage: &str,
    ) -> Result<Rc<Flag>> {
        self.add_typed(name, shorthand, FlagValue::Bool(default), usage)
    }

    /// Defines a string flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the name or shorthand is already defined.
    pub fn string_flag(
        &mut self,
        name: &str,
        shorthand: Option<char>,
        default: &str,
        usage: &str,
    ) -> Result<Rc<Flag>> {
        self.add_typed(name, shorthand, FlagValue::String(default.to_string()), usage)
    }

    /// Defines an integer flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the name or shorthand is already defined.
    pub fn int_flag(
        &mut self,
        name: &str,
        shorthand: Option<char>,
        default: i64,
        usage: &str,
    ) -> Result<Rc<Flag>> {
        self.add_typed(name, shorthand, FlagValue::Int(default), usage)
    }

    /// Defines a comma-separated, repeatable list flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the name or shorthand is already defined.
    pub fn string_list_flag(
        &mut self,
        name: &str,
        shorthand: Option<char>,
        default: &[&str],
        usage: &str,
    ) -> Result<Rc<Flag>> {
        let default = default.iter().map(ToString::to_string).collect();
        self.add_typed(name, shorthand, FlagValue::StringList(default), usage)
    }

    fn add_typed(
        &mut self,
        name: &str,
        shorthand: Option<char>,
        value: FlagValue,
        usage: &str,
    ) -> Result<Rc<Flag>> {
        let mut flag = Flag::new(name, value, usage);
        if let Some(shorthand) = shorthand {
            flag = flag.with_shorthand(shorthand);
        }
        self.add_flag(flag)
    }

    /// Adds every flag of `other` whose name is not yet present here.
    ///
    /// Flags already in this set win; a merged flag whose shorthand is taken
    /// keeps its long form only.
    pub fn add_flag_set(&mut self, other: &FlagSet) {
        for flag in other.formal.values() {
            let key = self.key(flag.name());
            if self.formal.contains_key(&key) {
                continue;
            }

            if let Some(shorthand) = flag.shorthand() {
                if self.shorthands.contains_key(&shorthand) {
                    debug!(
                        "Shorthand `-{}` of `--{}` already taken in `{}`",
                        shorthand,
                        flag.name(),
                        self.name
                    );
                } else {
                    self.shorthands.insert(shorthand, Rc::clone(flag));
                }
            }

            self.formal.insert(key, Rc::clone(flag));
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Rc<Flag>> {
        self.formal.get(&self.key(name)).cloned()
    }

    pub fn short_lookup(&self, shorthand: char) -> Option<Rc<Flag>> {
        self.shorthands.get(&shorthand).cloned()
    }

    /// Flag names in ascending order.
    pub fn names(&self) -> Vec<String> {
        self.formal
            .values()
            .map(|flag| flag.name().to_string())
            .sorted()
            .collect()
    }

    /// Invokes `visit` on every flag, ordered by name.
    pub fn visit_all<F: FnMut(&Flag)>(&self, mut visit: F) {
        for flag in self
            .formal
            .values()
            .sorted_by(|left, right| left.name().cmp(right.name()))
        {
            visit(flag);
        }
    }

    /// Whether any flag in the set is not hidden.
    pub fn has_available_flags(&self) -> bool {
        self.formal.values().any(|flag| !flag.hidden())
    }

    /// Assigns a value as if it had been given on the command line.
    ///
    /// # Errors
    ///
    /// Returns an error if the flag is not defined or the value does not
    /// convert to the flag's type.
    pub fn set(&self, name: &str, value: &str) -> Result<()> {
        let flag = self
            .lookup(name)
            .ok_or_else(|| UndefinedFlag(name.to_string()))?;
        self.assign(&flag, value)
    }

    /// Sets an annotation on a defined flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the flag is not defined.
    pub fn set_annotation(&self, name: &str, key: &str, values: Vec<String>) -> Result<()> {
        let flag = self
            .lookup(name)
            .ok_or_else(|| UndefinedFlag(name.to_string()))?;
        flag.set_annotation(key, values);
        Ok(())
    }

    /// Marks a flag as required for the command it is parsed for.
    ///
    /// # Errors
    ///
    /// Returns an error if the flag is not defined.
    pub fn mark_required(&self, name: &str) -> Result<()> {
        self.set_annotation(name, BASH_COMP_ONE_REQUIRED_FLAG, vec!["true".to_string()])
    }

    /// Marks a flag as deprecated; it keeps working but prints `message`.
    ///
    /// # Errors
    ///
    /// Returns an error if the flag is not defined.
    pub fn mark_deprecated(&self, name: &str, message: &str) -> Result<()> {
        let flag = self
            .lookup(name)
            .ok_or_else(|| UndefinedFlag(name.to_string()))?;
        flag.set_deprecated(message);
        Ok(())
    }

    /// Hides a flag from the available-flag queries.
    ///
    /// # Errors
    ///
    /// Returns an error if the flag is not defined.
    pub fn mark_hidden(&self, name: &str) -> Result<()> {
        let flag = self
            .lookup(name)
            .ok_or_else(|| UndefinedFlag(name.to_string()))?;
        flag.set_hidden(true);
        Ok(())
    }

    pub fn get_bool(&self, name: &str) -> Result<bool> {
        match self.typed_value(name)? {
            FlagValue::Bool(value) => Ok(value),
            other => Err(type_error(name, "bool", &other)),
        }
    }

    pub fn get_string(&self, name: &str) -> Result<String> {
        match self.typed_value(name)? {
            FlagValue::String(value) => Ok(value),
            other => Err(type_error(name, "string", &other)),
        }
    }

    pub fn get_int(&self, name: &str) -> Result<i64> {
        match self.typed_value(name)? {
            FlagValue::Int(value) => Ok(value),
            other => Err(type_error(name, "int", &other)),
        }
    }

    pub fn get_string_list(&self, name: &str) -> Result<Vec<String>> {
        match self.typed_value(name)? {
            FlagValue::StringList(values) => Ok(values),
            other => Err(type_error(name, "stringList", &other)),
        }
    }

    fn typed_value(&self, name: &str) -> Result<FlagValue> {
        self.lookup(name)
            .map(|flag| flag.value())
            .ok_or_else(|| UndefinedFlag(name.to_string()))
    }

    /// Resets every flag to its default, as before any parse.
    pub fn reset(&self) {
        for flag in self.formal.values() {
            flag.reset();
        }
    }

    pub fn parsed(&self) -> bool {
        self.parsed
    }

    /// Positional arguments left by the last parse, including those after `--`.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Number of positional arguments seen before `--`, if `--` was present.
    pub fn args_len_at_dash(&self) -> Option<usize> {
        self.args_len_at_dash
    }

    /// Parses `arguments`, assigning flag values and collecting positionals.
    ///
    /// # Errors
    ///
    /// Returns the first unknown flag, missing value or unconvertible value.
    pub fn parse<S: AsRef<str>>(&mut self, arguments: &[S]) -> Result<()> {
        self.parsed = true;
        self.args.clear();
        self.args_len_at_dash = None;

        let arguments: Vec<&str> = arguments.iter().map(AsRef::as_ref).collect();
        let mut index = 0;

        while index < arguments.len() {
            let token = arguments[index];
            index += 1;

            if token.len() < 2 || !token.starts_with('-') {
                self.args.push(token.to_string());
                continue;
            }

            if token == "--" {
                self.args_len_at_dash = Some(self.args.len());
                self.args
                    .extend(arguments[index..].iter().map(ToString::to_string));
                break;
            }

            index = match token.strip_prefix("--") {
                Some(long) => self.parse_long(long, &arguments, index)?,
                None => self.parse_short(&token[1..], &arguments, index)?,
            };
        }

        Ok(())
    }

    fn parse_long(&self, body: &str, arguments: &[&str], index: usize) -> Result<usize> {
        let (name, inline) = match body.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (body, None),
        };

        if name.is_empty() || name.starts_with('-') {
            return Err(BadFlagSyntax(format!("--{body}")));
        }

        let Some(flag) = self.lookup(name) else {
            if self.allowlist.unknown_flags {
                debug!("Ignoring unknown flag `--{}`", name);
                return Ok(skip_unknown_value(inline.is_some(), arguments, index));
            }
            return Err(UnknownFlag(name.to_string()));
        };

        if let Some(value) = inline {
            self.assign(&flag, value)?;
            return Ok(index);
        }

        if let Some(value) = flag.no_opt_default() {
            self.assign(&flag, value)?;
            return Ok(index);
        }

        match arguments.get(index) {
            Some(value) => {
                self.assign(&flag, value)?;
                Ok(index + 1)
            }
            None => Err(FlagNeedsValue(name.to_string())),
        }
    }

    fn parse_short(&self, shorthands: &str, arguments: &[&str], index: usize) -> Result<usize> {
        for (position, shorthand) in shorthands.char_indices() {
            let rest = &shorthands[position + shorthand.len_utf8()..];

            let Some(flag) = self.short_lookup(shorthand) else {
                if self.allowlist.unknown_flags {
                    debug!("Ignoring unknown shorthand `-{}`", shorthand);
                    let inline = !rest.is_empty();
                    return Ok(skip_unknown_value(inline, arguments, index));
                }
                return Err(UnknownShorthand(shorthand, shorthands.to_string()));
            };

            if let Some(value) = rest.strip_prefix('=') {
                self.assign(&flag, value)?;
                return Ok(index);
            }

            if let Some(value) = flag.no_opt_default() {
                self.assign(&flag, value)?;
                continue;
            }

            if !rest.is_empty() {
                self.assign(&flag, rest)?;
                return Ok(index);
            }

            return match arguments.get(index) {
                Some(value) => {
                    self.assign(&flag, value)?;
                    Ok(index + 1)
                }
                None => Err(FlagNeedsValue(shorthand.to_string())),
            };
        }

        Ok(index)
    }

    fn assign(&self, flag: &Flag, value: &str) -> Result<()> {
        flag.assign(value)?;

        if let Some(message) = flag.deprecated() {
            warn!("Flag `--{}` is deprecated", flag.name());
            self.write_warning(&format!(
                "Flag --{} has been deprecated, {}\n",
                flag.name(),
                message
            ));
        }

        Ok(())
    }

    fn write_warning(&self, text: &str) {
        if let Some(output) = &self.output {
            output.borrow_mut().push_str(text);
        }
    }
}

fn type_error(name: &str, expected: &str, actual: &FlagValue) -> Error {
    FlagType {
        flag: name.to_string(),
        expected: expected.to_string(),
        actual: actual.type_name().to_string(),
    }
}

/// An unknown `--flag value` drops its value too, unless the value looks like a flag.
fn skip_unknown_value(has_inline_value: bool, arguments: &[&str], index: usize) -> usize {
    match arguments.get(index) {
        Some(next) if !has_inline_value && !next.starts_with('-') => index + 1,
        _ => index,
    }
}

impl Debug for FlagSet {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("FlagSet")
            .field("name", &self.name)
            .field("flags", &self.formal.keys().collect::<Vec<_>>())
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}
