//! The call graph store: caller -> set of project-local callees.
//!
//! The [`CallGraph`] accumulates edges from every translation unit of a run.
//! Callees outside the project root are filtered at insertion, so every stored
//! edge points at a project-local function.
//!
//! # Examples
//!
//! ```
//! use calltree::{CallGraph, SymbolRecord};
//!
//! let mut graph = CallGraph::new("/proj");
//! let foo = SymbolRecord::new("foo", "/proj/a.c", 1, 6);
//!
//! // In-project callee: recorded
//! assert!(graph.add(foo.clone(), SymbolRecord::new("bar", "/proj/b.c", 3, 6)));
//! // Library callee: silently skipped
//! assert!(!graph.add(foo.clone(), SymbolRecord::new("puts", "/usr/include/stdio.h", 661, 12)));
//!
//! assert_eq!(graph.callees_of(&foo).len(), 1);
//! assert_eq!(graph.export().len(), 1);
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::scope::ProjectScope;
use crate::SymbolRecord;

/// Callees of one caller: a set that remembers first-seen order.
#[derive(Debug, Default, Clone)]
struct CalleeSet {
    order: Vec<SymbolRecord>,
    seen: HashSet<SymbolRecord>,
}

impl CalleeSet {
    fn insert(&mut self, callee: SymbolRecord) -> bool {
        if self.seen.contains(&callee) {
            return false;
        }
        self.seen.insert(callee.clone());
        self.order.push(callee);
        true
    }
}

/// Caller -> callee edges for one project.
#[derive(Debug, Clone)]
pub struct CallGraph {
    scope: ProjectScope,
    /// Callers in first-insertion order
    callers: Vec<SymbolRecord>,
    /// Caller -> index into `callers` and `edges`
    index: HashMap<SymbolRecord, usize>,
    edges: Vec<CalleeSet>,
}

impl CallGraph {
    /// Create an empty graph bound to a project root.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self::with_scope(ProjectScope::new(root))
    }

    pub fn with_scope(scope: ProjectScope) -> Self {
        Self {
            scope,
            callers: Vec::new(),
            index: HashMap::new(),
            edges: Vec::new(),
        }
    }

    pub fn scope(&self) -> &ProjectScope {
        &self.scope
    }

    pub fn root(&self) -> &Path {
        self.scope.root()
    }

    /// Record `caller -> callee` if the callee is defined inside the project.
    ///
    /// Out-of-project callees are expected (library calls) and are dropped
    /// without error. Returns true when a new edge was stored.
    pub fn add(&mut self, caller: SymbolRecord, callee: SymbolRecord) -> bool {
        if !self.scope.is_in_project(&callee.file) {
            return false;
        }

        let slot = match self.index.get(&caller) {
            Some(&slot) => slot,
            None => {
                let slot = self.callers.len();
                self.index.insert(caller.clone(), slot);
                self.callers.push(caller);
                self.edges.push(CalleeSet::default());
                slot
            }
        };
        self.edges[slot].insert(callee)
    }

    /// All callers, in the order they were first seen.
    pub fn callers(&self) -> impl Iterator<Item = &SymbolRecord> {
        self.callers.iter()
    }

    /// Callees of `caller` in first-seen order; empty for an unknown caller.
    pub fn callees_of(&self, caller: &SymbolRecord) -> &[SymbolRecord] {
        match self.index.get(caller) {
            Some(&slot) => &self.edges[slot].order,
            None => &[],
        }
    }

    /// Iterate `(caller, callees)` pairs in caller insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&SymbolRecord, &[SymbolRecord])> {
        self.callers
            .iter()
            .zip(self.edges.iter())
            .map(|(caller, set)| (caller, set.order.as_slice()))
    }

    /// Number of callers.
    pub fn len(&self) -> usize {
        self.callers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callers.is_empty()
    }

    /// Total number of distinct caller -> callee edges.
    pub fn edge_count(&self) -> usize {
        self.edges.iter().map(|set| set.order.len()).sum()
    }

    /// Deduplicated, merged view of the graph, ready for serialization.
    pub fn export(&self) -> Vec<CallerEntry> {
        merge_entries(self.iter())
    }

    /// The `{"calltree": [...]}` document.
    pub fn to_document(&self) -> ExportedCallTree {
        ExportedCallTree {
            calltree: self.export(),
        }
    }
}

/// One caller with its callees, flattened for JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerEntry {
    #[serde(flatten)]
    pub caller: SymbolRecord,
    pub callees: Vec<SymbolRecord>,
}

/// Root JSON document: `{"calltree": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedCallTree {
    pub calltree: Vec<CallerEntry>,
}

/// Collapse `(caller, callees)` pairs whose callers are structurally identical.
///
/// The first occurrence of a caller fixes its position; callee lists are
/// unioned, keeping first-seen order.
pub fn merge_entries<'a, I, C>(pairs: I) -> Vec<CallerEntry>
where
    I: IntoIterator<Item = (&'a SymbolRecord, C)>,
    C: IntoIterator<Item = &'a SymbolRecord>,
{
    let mut entries: Vec<CallerEntry> = Vec::new();
    let mut slots: HashMap<&'a SymbolRecord, usize> = HashMap::new();
    let mut seen: Vec<HashSet<&'a SymbolRecord>> = Vec::new();

    for (caller, callees) in pairs {
        let slot = *slots.entry(caller).or_insert_with(|| {
            entries.push(CallerEntry {
                caller: caller.clone(),
                callees: Vec::new(),
            });
            seen.push(HashSet::new());
            entries.len() - 1
        });

        for callee in callees {
            if seen[slot].insert(callee) {
                entries[slot].callees.push(callee.clone());
            }
        }
    }

    entries
}
