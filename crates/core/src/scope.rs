//! Per-command flag collections.
//!
//! Every command owns one [`FlagScope`] holding four collections:
//!
//! - **local**: flags for this command only
//! - **global**: persistent flags, visible to this command and all descendants
//! - **inherited**: the union of every ancestor's global flags
//! - **full**: local ∪ global ∪ inherited, the set argv is parsed against
//!
//! Local and global sets are created on first access. Inherited and full are
//! computed once by [`Command::flags`](crate::command::Command::flags) and then
//! memoized: flags registered on an ancestor after a descendant's merge are
//! not seen by that descendant. Callers that hold on to the merged set keep
//! observing the same object.

use std::cell::RefCell;
use std::rc::Rc;

use crate::flag::{ErrorSink, FlagSet, NormalizeFn, SharedFlagSet};

#[derive(Default)]
pub struct FlagScope {
    local: Option<SharedFlagSet>,
    global: Option<SharedFlagSet>,
    inherited: Option<SharedFlagSet>,
    full: Option<SharedFlagSet>,
    error_sink: Option<ErrorSink>,
    normalize: Option<NormalizeFn>,
}

impl FlagScope {
    /// The warning sink shared by all of this scope's collections.
    pub fn error_sink(&mut self) -> ErrorSink {
        Rc::clone(
            self.error_sink
                .get_or_insert_with(|| Rc::new(RefCell::new(String::new()))),
        )
    }

    /// Creates an empty set wired to this scope's sink and normalizer.
    pub fn new_set(&mut self, name: &str) -> SharedFlagSet {
        let mut set = FlagSet::new(name);
        set.set_output(self.error_sink());
        if let Some(normalize) = &self.normalize {
            set.set_normalize(Rc::clone(normalize));
        }
        set.shared()
    }

    pub fn local(&mut self, name: &str) -> SharedFlagSet {
        if let Some(local) = &self.local {
            return Rc::clone(local);
        }

        let local = self.new_set(name);
        self.local = Some(Rc::clone(&local));
        local
    }

    pub fn global(&mut self, name: &str) -> SharedFlagSet {
        if let Some(global) = &self.global {
            return Rc::clone(global);
        }

        let global = self.new_set(name);
        self.global = Some(Rc::clone(&global));
        global
    }

    pub fn inherited(&self) -> Option<SharedFlagSet> {
        self.inherited.clone()
    }

    pub fn full(&self) -> Option<SharedFlagSet> {
        self.full.clone()
    }

    pub fn store_inherited(&mut self, inherited: SharedFlagSet) {
        self.inherited = Some(inherited);
    }

    pub fn store_full(&mut self, full: SharedFlagSet) {
        self.full = Some(full);
    }

    pub fn is_merged(&self) -> bool {
        self.full.is_some()
    }

    /// Drops the memoized inherited and full sets so the next access re-merges.
    pub fn clear_merge(&mut self) {
        self.inherited = None;
        self.full = None;
    }

    pub fn normalize(&self) -> Option<NormalizeFn> {
        self.normalize.clone()
    }

    /// Installs the normalizer on this scope and every set it already created.
    pub fn set_normalize(&mut self, normalize: NormalizeFn) {
        for set in [&self.local, &self.global, &self.inherited, &self.full]
            .into_iter()
            .flatten()
        {
            set.borrow_mut().set_normalize(Rc::clone(&normalize));
        }
        self.normalize = Some(normalize);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collections_are_created_once() {
        let mut scope = FlagScope::default();
        let first = scope.local("app");
        let second = scope.local("app");
        assert!(Rc::ptr_eq(&first, &second));

        let global = scope.global("app");
        assert!(!Rc::ptr_eq(&first, &global));
        assert!(Rc::ptr_eq(&global, &scope.global("app")));
    }

    #[test]
    fn test_sink_is_shared_across_collections() {
        let mut scope = FlagScope::default();
        let local = scope.local("app");
        local
            .borrow_mut()
            .bool_flag("old", None, false, "")
            .unwrap();
        local.borrow().mark_deprecated("old", "gone").unwrap();
        local.borrow_mut().parse(&["--old"]).unwrap();

        assert!(scope.error_sink().borrow().contains("--old has been deprecated"));
    }

    #[test]
    fn test_merge_state() {
        let mut scope = FlagScope::default();
        assert!(!scope.is_merged());

        let full = scope.new_set("app");
        scope.store_full(full);
        assert!(scope.is_merged());

        scope.clear_merge();
        assert!(!scope.is_merged());
        assert!(scope.inherited().is_none());
    }

    #[test]
    fn test_normalize_reaches_existing_and_new_sets() {
        let mut scope = FlagScope::default();
        let local = scope.local("app");
        local
            .borrow_mut()
            .bool_flag("dry_run", None, false, "")
            .unwrap();

        scope.set_normalize(Rc::new(|name: &str| name.replace('_', "-")));
        assert!(local.borrow().lookup("dry-run").is_some());

        let global = scope.global("app");
        global
            .borrow_mut()
            .bool_flag("keep_going", None, false, "")
            .unwrap();
        assert!(global.borrow().lookup("keep-going").is_some());
    }
}
