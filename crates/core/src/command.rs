//! The command tree.
//!
//! A [`Command`] is a cheap, cloneable handle to one node of the tree. Parents
//! own their children; children hold a weak back-reference to their parent.
//! Trees are built during configuration and live for the whole invocation.
//!
//! # Examples
//!
//! ```
//! use cmdtree_core::command::Command;
//!
//! let root = Command::new("app");
//! let build = Command::new("build [target]");
//! build.add_alias("b");
//! root.add_child(&[build.clone()])?;
//!
//! assert_eq!(build.name(), "build");
//! assert_eq!(build.path(), "app build");
//! # Ok::<(), cmdtree_core::error::Error>(())
//! ```

use std::cell::{Ref, RefCell, RefMut};
use std::fmt::{Debug, Formatter};
use std::io::Write;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use log::debug;

use crate::args::ArgsValidator;
use crate::context::Context;
use crate::defaults::DefaultFlags;
use crate::error::Error::{CyclicChild, RequiredFlagsMissing, SelfParent};
use crate::error::{Error, Result};
use crate::flag::{NormalizeFn, ParseErrorsAllowlist, SharedFlagSet};
use crate::lifecycle::{Hook, Lifecycle};
use crate::scope::FlagScope;
use crate::streams::{self, SharedReader, SharedWriter, Streams};

/// Called with a flag-parse error; returning `Ok(())` suppresses it.
pub type FlagErrorFn = Rc<dyn Fn(&Command, Error) -> Result<()>>;

/// Called when the help flag is set on the resolved command.
pub type HelpFn = Rc<dyn Fn(&Command, &[String])>;

/// Derives a command name from its use line: the text before the first space.
///
/// ```
/// use cmdtree_core::command::derive_name;
///
/// assert_eq!(derive_name("add [-F file | -D dir]... profile"), "add");
/// assert_eq!(derive_name("status"), "status");
/// ```
#[must_use]
pub fn derive_name(usage: &str) -> &str {
    usage.split_once(' ').map_or(usage, |(name, _)| name)
}

/// The token a command was reached with during the current dispatch.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CalledAs {
    pub name: String,
    pub called: bool,
}

/// Longest `use`, path and name among a command's direct children, for padding.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MaxLengths {
    pub usage: usize,
    pub path: usize,
    pub name: usize,
}

impl MaxLengths {
    fn update(&mut self, usage: usize, path: usize, name: usize) {
        self.usage = self.usage.max(usage);
        self.path = self.path.max(path);
        self.name = self.name.max(name);
    }
}

/// Behaviour switches for a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Don't print returned errors.
    pub silence_errors: bool,
    /// Don't print the usage hint after an error.
    pub silence_usage: bool,
    /// Pass every argument, flags included, straight to the hooks.
    pub disable_flag_parsing: bool,
    /// Don't offer near-match suggestions for unknown commands.
    pub disable_suggestions: bool,
    /// Maximum Levenshtein distance for a suggestion; must be > 0.
    pub suggestions_minimum_distance: usize,
    /// Don't append ` [flags]` to the use line.
    pub disable_flags_in_use_line: bool,
    pub parse_errors_allowlist: ParseErrorsAllowlist,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            silence_errors: false,
            silence_usage: false,
            disable_flag_parsing: false,
            disable_suggestions: false,
            suggestions_minimum_distance: 2,
            disable_flags_in_use_line: false,
            parse_errors_allowlist: ParseErrorsAllowlist::default(),
        }
    }
}

#[derive(Default)]
pub(crate) struct Node {
    usage: String,
    aliases: Vec<String>,
    suggest_for: Vec<String>,
    short: String,
    long: String,
    example: String,
    deprecated: Option<String>,
    hidden: bool,
    annotations: IndexMap<String, String>,
    valid_args: Vec<String>,
    args_validator: Option<ArgsValidator>,
    children: Vec<Command>,
    children_sorted: bool,
    parent: Option<Weak<RefCell<Node>>>,
    pub(crate) called_as: CalledAs,
    max_lengths: MaxLengths,
    scope: FlagScope,
    lifecycle: Lifecycle,
    defaults: Option<DefaultFlags>,
    pub(crate) args: Option<Vec<String>>,
    context: Option<Context>,
    streams: Streams,
    flag_error_fn: Option<FlagErrorFn>,
    help_fn: Option<HelpFn>,
    settings: Settings,
}

#[derive(Clone)]
pub struct Command(Rc<RefCell<Node>>);

impl Command {
    /// Creates a detached command from its use line.
    ///
    /// The use line is advisory text for help output; by convention `[ ]`
    /// marks optional arguments, `...` repetition, `|` alternatives and
    /// `{ }` a required choice. Only the first word matters to dispatch.
    #[must_use]
    pub fn new(usage: &str) -> Self {
        let node = Node {
            usage: usage.to_string(),
            children_sorted: true,
            ..Node::default()
        };
        Self(Rc::new(RefCell::new(node)))
    }

    /// Creates a root command that will expose `defaults` to the whole tree.
    #[must_use]
    pub fn with_defaults(usage: &str, defaults: DefaultFlags) -> Self {
        let command = Self::new(usage);
        command.node_mut().defaults = Some(defaults);
        command
    }

    pub(crate) fn node(&self) -> Ref<'_, Node> {
        self.0.borrow()
    }

    pub(crate) fn node_mut(&self) -> RefMut<'_, Node> {
        self.0.borrow_mut()
    }

    pub fn ptr_eq(&self, other: &Command) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn usage(&self) -> String {
        self.node().usage.clone()
    }

    pub fn set_usage(&self, usage: &str) {
        self.node_mut().usage = usage.to_string();
    }

    /// The first word of the use line.
    pub fn name(&self) -> String {
        derive_name(&self.node().usage).to_string()
    }

    pub fn aliases(&self) -> Vec<String> {
        self.node().aliases.clone()
    }

    pub fn add_alias(&self, alias: &str) {
        self.node_mut().aliases.push(alias.to_string());
    }

    pub fn set_aliases(&self, aliases: &[&str]) {
        self.node_mut().aliases = aliases.iter().map(ToString::to_string).collect();
    }

    pub fn has_alias(&self, candidate: &str) -> bool {
        self.node().aliases.iter().any(|alias| alias == candidate)
    }

    /// `name,alias1,alias2`
    pub fn name_and_aliases(&self) -> String {
        let mut names = vec![self.name()];
        names.extend(self.aliases());
        names.join(",")
    }

    pub fn suggest_for(&self) -> Vec<String> {
        self.node().suggest_for.clone()
    }

    /// Names this command should be suggested for, without accepting them.
    pub fn set_suggest_for(&self, names: &[&str]) {
        self.node_mut().suggest_for = names.iter().map(ToString::to_string).collect();
    }

    pub fn short(&self) -> String {
        self.node().short.clone()
    }

    pub fn set_short(&self, short: &str) {
        self.node_mut().short = short.to_string();
    }

    pub fn long(&self) -> String {
        self.node().long.clone()
    }

    pub fn set_long(&self, long: &str) {
        self.node_mut().long = long.to_string();
    }

    pub fn example(&self) -> String {
        self.node().example.clone()
    }

    pub fn set_example(&self, example: &str) {
        self.node_mut().example = example.to_string();
    }

    pub fn deprecated(&self) -> Option<String> {
        self.node().deprecated.clone()
    }

    /// Marks the command deprecated; it still runs but prints `message` first.
    pub fn set_deprecated(&self, message: &str) {
        self.node_mut().deprecated = Some(message.to_string());
    }

    pub fn hidden(&self) -> bool {
        self.node().hidden
    }

    pub fn set_hidden(&self, hidden: bool) {
        self.node_mut().hidden = hidden;
    }

    pub fn annotation(&self, key: &str) -> Option<String> {
        self.node().annotations.get(key).cloned()
    }

    pub fn set_annotation(&self, key: &str, value: &str) {
        self.node_mut()
            .annotations
            .insert(key.to_string(), value.to_string());
    }

    pub fn valid_args(&self) -> Vec<String> {
        self.node().valid_args.clone()
    }

    pub fn set_valid_args(&self, valid: &[&str]) {
        self.node_mut().valid_args = valid.iter().map(ToString::to_string).collect();
    }

    pub fn set_args_validator(&self, validator: ArgsValidator) {
        self.node_mut().args_validator = Some(validator);
    }

    /// Runs the positional-argument validator, if one is set.
    ///
    /// # Errors
    ///
    /// Returns whatever the validator rejects the arguments with.
    pub fn validate_args(&self, args: &[String]) -> Result<()> {
        let validator = self.node().args_validator.clone();
        match validator {
            Some(validator) => validator(self, args),
            None => Ok(()),
        }
    }

    pub fn settings(&self) -> Settings {
        self.node().settings
    }

    /// Adjusts the command's settings in place.
    ///
    /// ```
    /// use cmdtree_core::command::Command;
    ///
    /// let root = Command::new("app");
    /// root.configure(|settings| settings.silence_usage = true);
    /// assert!(root.settings().silence_usage);
    /// ```
    pub fn configure<F: FnOnce(&mut Settings)>(&self, configure: F) {
        configure(&mut self.node_mut().settings);
    }

    pub fn set_args<S: AsRef<str>>(&self, args: &[S]) {
        self.node_mut().args = Some(args.iter().map(|arg| arg.as_ref().to_string()).collect());
    }

    /// The token used to reach this command in the current dispatch, or an
    /// empty string if it was not reached.
    pub fn called_as(&self) -> String {
        let node = self.node();
        if node.called_as.called {
            node.called_as.name.clone()
        } else {
            String::new()
        }
    }

    pub fn called_as_record(&self) -> CalledAs {
        self.node().called_as.clone()
    }

    pub fn max_lengths(&self) -> MaxLengths {
        self.node().max_lengths
    }

    pub fn parent(&self) -> Option<Command> {
        self.node()
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(Command)
    }

    pub fn has_parent(&self) -> bool {
        self.parent().is_some()
    }

    /// Ancestors ordered nearest first; empty for a root.
    pub fn ancestors(&self) -> Vec<Command> {
        let mut ancestors = Vec::new();
        let mut current = self.parent();
        while let Some(command) = current {
            current = command.parent();
            ancestors.push(command);
        }
        ancestors
    }

    /// Invokes `visit` on each ancestor, nearest first. A root has none.
    pub fn visit_ancestors<F: FnMut(&Command)>(&self, mut visit: F) {
        for ancestor in self.ancestors() {
            visit(&ancestor);
        }
    }

    pub fn root(&self) -> Command {
        self.ancestors().pop().unwrap_or_else(|| self.clone())
    }

    /// Space-joined names from the root down to this command.
    pub fn path(&self) -> String {
        let mut names: Vec<String> = self
            .ancestors()
            .iter()
            .map(Command::name)
            .collect();
        names.reverse();
        names.push(self.name());
        names.join(" ")
    }

    /// The parent's path followed by this command's use line.
    ///
    /// Note that this reads the merged flag set, which freezes it.
    pub fn use_line(&self) -> String {
        let mut line = match self.parent() {
            Some(parent) => format!("{} {}", parent.path(), self.usage()),
            None => self.usage(),
        };

        if self.settings().disable_flags_in_use_line {
            return line;
        }

        if self.has_available_flags() && !line.contains("[flags]") {
            line.push_str(" [flags]");
        }

        line
    }

    /// Attaches children to this command.
    ///
    /// Each child gets this command as its parent (overwriting any earlier
    /// parent, whose child list is left as is) and inherits the flag-name
    /// normalizer if one is set here.
    ///
    /// # Errors
    ///
    /// Fails without touching the tree if a child is this command itself,
    /// one of its ancestors, or already has this command below it.
    pub fn add_child(&self, children: &[Command]) -> Result<()> {
        let ancestors = self.ancestors();
        for child in children {
            if child.ptr_eq(self) {
                return Err(SelfParent(self.name()));
            }

            if ancestors.iter().any(|ancestor| ancestor.ptr_eq(child)) || child.reaches(self) {
                return Err(CyclicChild(self.name(), child.name()));
            }
        }

        let normalize = self.node().scope.normalize();
        for child in children {
            child.node_mut().parent = Some(Rc::downgrade(&self.0));
            if let Some(normalize) = &normalize {
                child.set_global_normalization(Rc::clone(normalize));
            }

            let (usage, path, name) = (child.usage().len(), child.path().len(), child.name().len());

            let mut node = self.node_mut();
            node.max_lengths.update(usage, path, name);
            node.children.push(child.clone());
            node.children_sorted = false;
        }

        debug!("Added {} child command(s) to `{}`", children.len(), self.name());
        Ok(())
    }

    /// Whether `target` is reachable through child edges, stale ones included.
    fn reaches(&self, target: &Command) -> bool {
        let mut pending = self.children();
        while let Some(command) = pending.pop() {
            if command.ptr_eq(target) {
                return true;
            }
            pending.extend(command.children());
        }
        false
    }

    /// Detaches the given children, matched by identity.
    pub fn remove_child(&self, children: &[Command]) {
        let removed: Vec<Command> = {
            let mut node = self.node_mut();
            let (removed, kept) = std::mem::take(&mut node.children)
                .into_iter()
                .partition(|existing| children.iter().any(|child| child.ptr_eq(existing)));
            node.children = kept;
            removed
        };

        for child in &removed {
            child.node_mut().parent = None;
        }

        self.recompute_max_lengths();
    }

    /// Detaches every child and forgets the memoized flag merge.
    pub fn reset_children(&self) {
        let children = std::mem::take(&mut self.node_mut().children);
        for child in &children {
            child.node_mut().parent = None;
        }

        let mut node = self.node_mut();
        node.max_lengths = MaxLengths::default();
        node.children_sorted = true;
        node.scope.clear_merge();
    }

    fn recompute_max_lengths(&self) {
        let children = self.node().children.clone();
        let mut lengths = MaxLengths::default();
        for child in &children {
            lengths.update(child.usage().len(), child.path().len(), child.name().len());
        }
        self.node_mut().max_lengths = lengths;
    }

    pub fn has_sub_commands(&self) -> bool {
        !self.node().children.is_empty()
    }

    /// Whether the child order is currently sorted (adding or removing a
    /// child clears this until the next [`Command::sorted_children`]).
    pub fn children_sorted(&self) -> bool {
        self.node().children_sorted
    }

    /// Children ordered by name; the sort is stable and redone only after
    /// the children changed.
    pub fn sorted_children(&self) -> Vec<Command> {
        let mut node = self.node_mut();
        if !node.children_sorted {
            node.children.sort_by_key(Command::name);
            node.children_sorted = true;
        }
        node.children.clone()
    }

    /// Children in their current order, without sorting.
    pub fn children(&self) -> Vec<Command> {
        self.node().children.clone()
    }

    /// Finds the direct child named or aliased `token` and records the call.
    pub(crate) fn find_next(&self, token: &str) -> Option<Command> {
        let child = self
            .children()
            .into_iter()
            .find(|child| child.name() == token || child.has_alias(token))?;
        child.node_mut().called_as.name = token.to_string();
        Some(child)
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.node().lifecycle.clone()
    }

    pub fn is_runnable(&self) -> bool {
        self.node().lifecycle.is_runnable()
    }

    /// Whether the command should be offered to users: not hidden, not
    /// deprecated, and either runnable or leading to something that is.
    pub fn is_available(&self) -> bool {
        if self.hidden() || self.deprecated().is_some() {
            return false;
        }

        self.is_runnable() || self.children().iter().any(Command::is_available)
    }

    pub fn set_global_pre_run<F>(&self, hook: F)
    where
        F: Fn(&Command, &[String]) -> Result<()> + 'static,
    {
        self.node_mut().lifecycle.global_pre_run = Some(Rc::new(hook));
    }

    pub fn set_pre_run<F>(&self, hook: F)
    where
        F: Fn(&Command, &[String]) -> Result<()> + 'static,
    {
        self.node_mut().lifecycle.pre_run = Some(Rc::new(hook));
    }

    pub fn set_run<F>(&self, hook: F)
    where
        F: Fn(&Command, &[String]) -> Result<()> + 'static,
    {
        self.node_mut().lifecycle.run = Some(Rc::new(hook));
    }

    pub fn set_post_run<F>(&self, hook: F)
    where
        F: Fn(&Command, &[String]) -> Result<()> + 'static,
    {
        self.node_mut().lifecycle.post_run = Some(Rc::new(hook));
    }

    pub fn set_global_post_run<F>(&self, hook: F)
    where
        F: Fn(&Command, &[String]) -> Result<()> + 'static,
    {
        self.node_mut().lifecycle.global_post_run = Some(Rc::new(hook));
    }

    /// The first hook `select` yields on this command or, failing that, on
    /// the nearest ancestor.
    pub(crate) fn nearest_hook<F>(&self, select: F) -> Option<Hook>
    where
        F: Fn(&Lifecycle) -> Option<Hook>,
    {
        if let Some(hook) = select(&self.node().lifecycle) {
            return Some(hook);
        }
        self.ancestors()
            .iter()
            .find_map(|ancestor| select(&ancestor.node().lifecycle))
    }

    pub fn set_flag_error_fn<F>(&self, handler: F)
    where
        F: Fn(&Command, Error) -> Result<()> + 'static,
    {
        self.node_mut().flag_error_fn = Some(Rc::new(handler));
    }

    /// The nearest flag-error handler, defaulting to passing the error through.
    pub fn flag_error_fn(&self) -> FlagErrorFn {
        if let Some(handler) = self.node().flag_error_fn.clone() {
            return handler;
        }
        self.ancestors()
            .iter()
            .find_map(|ancestor| ancestor.node().flag_error_fn.clone())
            .unwrap_or_else(pass_flag_error)
    }

    pub fn set_help_fn<F>(&self, help: F)
    where
        F: Fn(&Command, &[String]) + 'static,
    {
        self.node_mut().help_fn = Some(Rc::new(help));
    }

    /// The nearest help handler; the default prints the use line and descriptions.
    pub fn help_fn(&self) -> HelpFn {
        if let Some(help) = self.node().help_fn.clone() {
            return help;
        }
        self.ancestors()
            .iter()
            .find_map(|ancestor| ancestor.node().help_fn.clone())
            .unwrap_or_else(default_help_fn)
    }

    pub fn set_context(&self, context: Context) {
        self.node_mut().context = Some(context);
    }

    /// This command's context or the nearest ancestor's.
    pub fn context(&self) -> Option<Context> {
        if let Some(context) = self.node().context.clone() {
            return Some(context);
        }
        self.ancestors()
            .iter()
            .find_map(|ancestor| ancestor.node().context.clone())
    }

    pub fn is_global_normalization_enabled(&self) -> bool {
        self.node().scope.normalize().is_some()
    }

    pub fn global_normalization(&self) -> Option<NormalizeFn> {
        self.node().scope.normalize()
    }

    /// Sets the flag-name normalizer for this command and every descendant.
    /// Children added afterwards receive it as well.
    pub fn set_global_normalization(&self, normalize: NormalizeFn) {
        let mut pending = vec![self.clone()];
        while let Some(command) = pending.pop() {
            command.node_mut().scope.set_normalize(Rc::clone(&normalize));
            pending.extend(command.children());
        }
    }

    /// Flags for this command only.
    pub fn local_flags(&self) -> SharedFlagSet {
        let name = self.name();
        self.node_mut().scope.local(&name)
    }

    /// Persistent flags defined here and inherited by every descendant.
    pub fn global_flags(&self) -> SharedFlagSet {
        let name = self.name();
        self.node_mut().scope.global(&name)
    }

    /// Union of every ancestor's global flags, nearer ancestors winning on
    /// name collisions. Computed once, then memoized.
    ///
    /// The first computation also copies the root's default flags into the
    /// root's global set.
    pub fn inherited_flags(&self) -> SharedFlagSet {
        if let Some(inherited) = self.node().scope.inherited() {
            return inherited;
        }

        self.root().merge_default_flags();

        let name = self.name();
        let inherited = self.node_mut().scope.new_set(&name);
        for ancestor in self.ancestors() {
            let global = ancestor.global_flags();
            inherited.borrow_mut().add_flag_set(&global.borrow());
        }

        self.node_mut()
            .scope
            .store_inherited(Rc::clone(&inherited));
        inherited
    }

    /// The full flag set argv is parsed against: local, then global, then
    /// inherited, the earlier definition winning on a name collision.
    ///
    /// The merge runs on first access and is memoized. Flags added to this
    /// command or an ancestor afterwards are not picked up, and every call
    /// returns the same shared set.
    pub fn flags(&self) -> SharedFlagSet {
        if let Some(full) = self.node().scope.full() {
            return full;
        }

        let inherited = self.inherited_flags();
        let local = self.local_flags();
        let global = self.global_flags();

        let name = self.name();
        let full = self.node_mut().scope.new_set(&name);
        {
            let mut merged = full.borrow_mut();
            merged.add_flag_set(&local.borrow());
            merged.add_flag_set(&global.borrow());
            merged.add_flag_set(&inherited.borrow());
        }
        debug!(
            "Merged {} flag(s) for `{}`",
            full.borrow().len(),
            self.path()
        );

        self.node_mut().scope.store_full(Rc::clone(&full));
        full
    }

    /// Whether the flag merge for this command already happened.
    pub fn flags_merged(&self) -> bool {
        self.node().scope.is_merged()
    }

    pub fn has_available_flags(&self) -> bool {
        self.flags().borrow().has_available_flags()
    }

    fn merge_default_flags(&self) {
        let Some(defaults) = self.node().defaults.clone() else {
            return;
        };

        let global = self.global_flags();
        global.borrow_mut().add_flag_set(&defaults.flags().borrow());
    }

    /// Parses `args` against the merged flag set.
    ///
    /// Deprecation warnings produced while parsing are written to the error
    /// stream when the parse succeeds.
    ///
    /// # Errors
    ///
    /// Returns the flag-value parser's error.
    pub fn parse_flags(&self, args: &[String]) -> Result<()> {
        let settings = self.settings();
        if settings.disable_flag_parsing {
            return Ok(());
        }

        let sink = self.node_mut().scope.error_sink();
        let before = sink.borrow().len();

        let flags = self.flags();
        let result = {
            let mut flags = flags.borrow_mut();
            flags.set_allowlist(settings.parse_errors_allowlist);
            flags.parse(args)
        };

        let warnings = sink.borrow()[before..].to_string();
        if !warnings.is_empty() && result.is_ok() {
            self.print_err(&warnings);
        }

        result
    }

    /// Checks that every flag annotated as required was set.
    ///
    /// # Errors
    ///
    /// Returns one [`Error::RequiredFlagsMissing`] naming every missing flag.
    pub fn validate_required_flags(&self) -> Result<()> {
        if self.settings().disable_flag_parsing {
            return Ok(());
        }

        let mut missing = Vec::new();
        self.flags().borrow().visit_all(|flag| {
            if flag.is_required() && !flag.changed() {
                missing.push(flag.name().to_string());
            }
        });

        if missing.is_empty() {
            Ok(())
        } else {
            Err(RequiredFlagsMissing(missing))
        }
    }

    pub fn set_input<R: std::io::Read + 'static>(&self, input: R) {
        self.node_mut().streams.input = Some(Rc::new(RefCell::new(input)));
    }

    pub fn set_output<W: Write + 'static>(&self, output: W) {
        self.node_mut().streams.output = Some(Rc::new(RefCell::new(output)));
    }

    pub fn set_error_output<W: Write + 'static>(&self, error: W) {
        self.node_mut().streams.error = Some(Rc::new(RefCell::new(error)));
    }

    fn nearest_stream<T, F>(&self, select: F) -> Option<T>
    where
        F: Fn(&Streams) -> Option<T>,
    {
        if let Some(stream) = select(&self.node().streams) {
            return Some(stream);
        }
        self.ancestors()
            .iter()
            .find_map(|ancestor| select(&ancestor.node().streams))
    }

    pub fn input(&self) -> SharedReader {
        self.nearest_stream(|streams| streams.input.clone())
            .unwrap_or_else(streams::stdin)
    }

    pub fn output(&self) -> SharedWriter {
        self.nearest_stream(|streams| streams.output.clone())
            .unwrap_or_else(streams::stdout)
    }

    pub fn error_output(&self) -> SharedWriter {
        self.nearest_stream(|streams| streams.error.clone())
            .unwrap_or_else(streams::stderr)
    }

    pub fn print(&self, text: &str) {
        let _ = self.output().borrow_mut().write_all(text.as_bytes());
    }

    pub fn println(&self, text: &str) {
        let _ = writeln!(self.output().borrow_mut(), "{text}");
    }

    pub fn print_err(&self, text: &str) {
        let _ = self.error_output().borrow_mut().write_all(text.as_bytes());
    }

    pub fn println_err(&self, text: &str) {
        let _ = writeln!(self.error_output().borrow_mut(), "{text}");
    }
}

fn pass_flag_error() -> FlagErrorFn {
    Rc::new(|_: &Command, e: Error| Err(e))
}

fn default_help_fn() -> HelpFn {
    Rc::new(default_help)
}

fn default_help(command: &Command, _: &[String]) {
    command.println(&command.use_line());

    let description = match (command.short(), command.long()) {
        (_, long) if !long.is_empty() => long,
        (short, _) => short,
    };
    if !description.is_empty() {
        command.println("");
        command.println(&description);
    }
}

impl PartialEq for Command {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Command {}

impl Debug for Command {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Command")
            .field("path", &self.path())
            .field("aliases", &self.aliases())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streams::SharedBuffer;

    fn tree() -> (Command, Command, Command) {
        let root = Command::new("app");
        let remote = Command::new("remote");
        let add = Command::new("add <name> <url>");
        root.add_child(&[remote.clone()]).unwrap();
        remote.add_child(&[add.clone()]).unwrap();
        (root, remote, add)
    }

    #[test]
    fn test_derive_name() {
        assert_eq!(derive_name("build [target]"), "build");
        assert_eq!(derive_name("build"), "build");
        assert_eq!(derive_name(""), "");
        assert_eq!(derive_name(" leading"), "");
        assert_eq!(derive_name("a  b"), "a");
    }

    #[test]
    fn test_name_follows_usage() {
        let command = Command::new("serve [port]");
        assert_eq!(command.name(), "serve");
        command.set_usage("listen");
        assert_eq!(command.name(), "listen");
    }

    #[test]
    fn test_add_self_is_rejected_without_mutation() {
        let root = Command::new("app");
        let other = Command::new("other");

        let err = root.add_child(&[other.clone(), root.clone()]).unwrap_err();

        assert!(matches!(err, SelfParent(name) if name == "app"));
        assert!(root.children().is_empty());
        assert!(!root.has_parent());
        assert!(!other.has_parent());
    }

    #[test]
    fn test_add_ancestor_is_rejected() {
        let (root, _, add) = tree();
        assert!(matches!(
            add.add_child(&[root.clone()]),
            Err(CyclicChild(..))
        ));
        assert!(!root.has_parent());
    }

    #[test]
    fn test_stale_edge_cannot_close_a_loop() {
        let (first, second, shared) = (Command::new("a"), Command::new("c"), Command::new("b"));
        first.add_child(&[shared.clone()]).unwrap();
        second.add_child(&[shared.clone()]).unwrap();

        assert!(matches!(
            shared.add_child(&[first.clone()]),
            Err(CyclicChild(..))
        ));
        assert!(shared.children().is_empty());
        assert!(!first.has_parent());
        assert!(!first.is_available());
    }

    #[test]
    fn test_traversals() {
        let (root, remote, add) = tree();

        assert_eq!(add.path(), "app remote add");
        assert_eq!(add.root(), root);
        assert_eq!(root.root(), root);
        assert_eq!(add.ancestors(), vec![remote.clone(), root.clone()]);

        let mut visited = Vec::new();
        add.visit_ancestors(|ancestor| visited.push(ancestor.name()));
        assert_eq!(visited, vec!["remote", "app"]);

        let mut visited_from_root = 0;
        root.visit_ancestors(|_| visited_from_root += 1);
        assert_eq!(visited_from_root, 0);
    }

    #[test]
    fn test_sorted_children_is_stable_and_lazy() {
        let root = Command::new("app");
        let zeta = Command::new("zeta");
        let alpha_first = Command::new("alpha one");
        let alpha_second = Command::new("alpha two");
        let upper = Command::new("Beta");

        root.add_child(&[zeta.clone(), alpha_first.clone()]).unwrap();
        assert!(!root.children_sorted());

        root.add_child(&[upper.clone(), alpha_second.clone()]).unwrap();
        let sorted = root.sorted_children();
        assert!(root.children_sorted());
        assert_eq!(sorted, vec![upper, alpha_first, alpha_second, zeta]);

        root.add_child(&[Command::new("middle")]).unwrap();
        assert!(!root.children_sorted());
        let names: Vec<String> = root.sorted_children().iter().map(Command::name).collect();
        assert_eq!(names, vec!["Beta", "alpha", "alpha", "middle", "zeta"]);
    }

    #[test]
    fn test_remove_child_clears_parent_and_lengths() {
        let root = Command::new("app");
        let short = Command::new("ls");
        let long = Command::new("install-everything [pkg]");
        root.add_child(&[short.clone(), long.clone()]).unwrap();

        assert_eq!(
            root.max_lengths(),
            MaxLengths {
                usage: "install-everything [pkg]".len(),
                path: "app install-everything".len(),
                name: "install-everything".len(),
            }
        );

        root.remove_child(&[long.clone()]);

        assert!(!long.has_parent());
        assert_eq!(root.children(), vec![short]);
        assert_eq!(
            root.max_lengths(),
            MaxLengths {
                usage: 2,
                path: "app ls".len(),
                name: 2,
            }
        );
    }

    #[test]
    fn test_reparenting_leaves_stale_edge() {
        let first = Command::new("first");
        let second = Command::new("second");
        let child = Command::new("child");

        first.add_child(&[child.clone()]).unwrap();
        second.add_child(&[child.clone()]).unwrap();

        assert_eq!(child.parent(), Some(second.clone()));
        assert_eq!(child.path(), "second child");
        assert_eq!(first.children(), vec![child]);
    }

    #[test]
    fn test_reset_children() {
        let (root, remote, _) = tree();
        let _ = remote.flags();
        assert!(remote.flags_merged());

        remote.reset_children();

        assert!(!remote.has_sub_commands());
        assert!(!remote.flags_merged());
        assert_eq!(remote.max_lengths(), MaxLengths::default());
        assert_eq!(root.children(), vec![remote]);
    }

    #[test]
    fn test_aliases() {
        let command = Command::new("remove");
        command.set_aliases(&["rm", "del"]);
        assert!(command.has_alias("rm"));
        assert!(!command.has_alias("remove"));
        assert_eq!(command.name_and_aliases(), "remove,rm,del");
    }

    #[test]
    fn test_full_merge_precedence() {
        let (root, remote, add) = tree();
        root.global_flags()
            .borrow_mut()
            .string_flag("output", Some('o'), "root", "")
            .unwrap();
        remote
            .global_flags()
            .borrow_mut()
            .string_flag("output", None, "remote", "")
            .unwrap();
        add.local_flags()
            .borrow_mut()
            .bool_flag("force", Some('f'), false, "")
            .unwrap();

        let flags = add.flags();
        let flags = flags.borrow();
        assert_eq!(flags.names(), vec!["force", "output"]);
        assert_eq!(flags.get_string("output").unwrap(), "remote");
    }

    #[test]
    fn test_own_definition_beats_inherited() {
        let (root, _, add) = tree();
        root.global_flags()
            .borrow_mut()
            .int_flag("level", None, 1, "")
            .unwrap();
        add.local_flags()
            .borrow_mut()
            .int_flag("level", None, 9, "")
            .unwrap();

        assert_eq!(add.flags().borrow().get_int("level").unwrap(), 9);
    }

    #[test]
    fn test_merge_is_memoized() {
        let (root, _, add) = tree();
        root.global_flags()
            .borrow_mut()
            .bool_flag("verbose", None, false, "")
            .unwrap();

        let first = add.flags();
        let first_names = first.borrow().names();

        root.global_flags()
            .borrow_mut()
            .bool_flag("late", None, false, "")
            .unwrap();

        let second = add.flags();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(second.borrow().names(), first_names);
        assert!(second.borrow().lookup("late").is_none());
    }

    #[test]
    fn test_defaults_reach_every_command() {
        let root = Command::with_defaults("app", DefaultFlags::standard());
        let child = Command::new("child");
        root.add_child(&[child.clone()]).unwrap();

        assert!(child.flags().borrow().lookup("help").is_some());
        assert!(root.global_flags().borrow().lookup("help").is_some());
        assert!(root.flags().borrow().lookup("help").is_some());
    }

    #[test]
    fn test_normalization_propagates_on_add() {
        let root = Command::new("app");
        root.set_global_normalization(Rc::new(|name: &str| name.replace('_', "-")));

        let child = Command::new("child");
        let grandchild = Command::new("grandchild");
        child.add_child(&[grandchild.clone()]).unwrap();
        root.add_child(&[child.clone()]).unwrap();

        assert!(child.is_global_normalization_enabled());
        assert!(grandchild.is_global_normalization_enabled());

        child
            .local_flags()
            .borrow_mut()
            .bool_flag("dry_run", None, false, "")
            .unwrap();
        assert!(child.local_flags().borrow().lookup("dry-run").is_some());
    }

    #[test]
    fn test_required_flags_aggregated() {
        let command = Command::new("register");
        {
            let local = command.local_flags();
            let mut local = local.borrow_mut();
            local.string_flag("name", None, "", "").unwrap();
            local.int_flag("age", None, 0, "").unwrap();
            local.string_flag("email", None, "", "").unwrap();
            local.mark_required("name").unwrap();
            local.mark_required("age").unwrap();
            local.mark_required("email").unwrap();
        }

        command.flags().borrow().set("age", "42").unwrap();

        let err = command.validate_required_flags().unwrap_err();
        assert!(matches!(err, RequiredFlagsMissing(ref names) if names == &["email", "name"]));
        assert_eq!(err.to_string(), r#"required flag(s) "email", "name" not set"#);
    }

    #[test]
    fn test_required_flags_skipped_without_parsing() {
        let command = Command::new("raw");
        command
            .local_flags()
            .borrow_mut()
            .string_flag("name", None, "", "")
            .unwrap();
        command.local_flags().borrow().mark_required("name").unwrap();
        command.configure(|settings| settings.disable_flag_parsing = true);

        assert!(command.validate_required_flags().is_ok());
    }

    #[test]
    fn test_parse_flags_reports_deprecations() {
        let command = Command::new("app");
        let errors = SharedBuffer::new();
        command.set_error_output(errors.clone());
        command
            .local_flags()
            .borrow_mut()
            .bool_flag("legacy", None, false, "")
            .unwrap();
        command
            .local_flags()
            .borrow()
            .mark_deprecated("legacy", "it does nothing")
            .unwrap();

        command.parse_flags(&["--legacy".to_string()]).unwrap();
        assert_eq!(
            errors.contents(),
            "Flag --legacy has been deprecated, it does nothing\n"
        );
    }

    #[test]
    fn test_streams_are_inherited() {
        let (root, _, add) = tree();
        let output = SharedBuffer::new();
        root.set_output(output.clone());

        add.println("from the leaf");
        assert_eq!(output.contents(), "from the leaf\n");
    }

    #[test]
    fn test_use_line() {
        let (_root, remote, add) = tree();
        assert_eq!(add.use_line(), "app remote add <name> <url>");

        remote
            .local_flags()
            .borrow_mut()
            .bool_flag("verbose", None, false, "")
            .unwrap();
        assert_eq!(remote.use_line(), "app remote [flags]");
    }

    #[test]
    fn test_is_available() {
        let (root, remote, add) = tree();
        assert!(!root.is_available());

        add.set_run(|_: &Command, _: &[String]| Ok(()));
        assert!(root.is_available());

        remote.set_hidden(true);
        assert!(!root.is_available());
    }

    #[test]
    fn test_context_is_inherited() {
        let (root, _, add) = tree();
        assert!(add.context().is_none());

        let context = Context::new();
        root.set_context(context.clone());
        context.cancel();
        assert!(add.context().unwrap().is_cancelled());
    }
}
