//! Tree-walking call-graph builder.
//!
//! Walks one translation unit depth-first, pre-order. The innermost enclosing
//! function is threaded down as a by-value parameter, so entering a function
//! definition changes the caller for that subtree only.

use crate::callgraph::CallGraph;
use crate::config::FileScopePolicy;
use crate::syntax::{NodeKind, SyntaxNode, TranslationUnit};
use crate::SymbolRecord;

/// The caller in effect at a node.
#[derive(Debug, Clone, Copy)]
enum Caller<'t> {
    /// No enclosing function yet: the translation unit root.
    Unit,
    Function(&'t SymbolRecord),
}

/// Counters for one `build` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub functions: usize,
    pub calls: usize,
    pub unresolved: usize,
    pub recorded: usize,
}

pub struct CallGraphBuilder<'g> {
    graph: &'g mut CallGraph,
    file_scope: FileScopePolicy,
}

impl<'g> CallGraphBuilder<'g> {
    pub fn new(graph: &'g mut CallGraph, file_scope: FileScopePolicy) -> Self {
        Self { graph, file_scope }
    }

    /// Walk one translation unit and add its edges to the graph.
    pub fn build(&mut self, unit: &TranslationUnit) -> BuildStats {
        let unit_caller = SymbolRecord::file_scope(&unit.path);
        let mut stats = BuildStats::default();
        self.visit(&unit.root, Caller::Unit, &unit_caller, &mut stats);
        tracing::debug!(
            "{}: {} functions, {} calls ({} unresolved), {} edges recorded",
            unit.path.display(),
            stats.functions,
            stats.calls,
            stats.unresolved,
            stats.recorded
        );
        stats
    }

    fn visit<'t>(
        &mut self,
        node: &'t SyntaxNode,
        caller: Caller<'t>,
        unit_caller: &SymbolRecord,
        stats: &mut BuildStats,
    ) {
        let mut caller = caller;

        match (node.kind, node.symbol.as_ref()) {
            (kind, Some(function)) if kind.is_function_like() => {
                stats.functions += 1;
                caller = Caller::Function(function);
            }
            (NodeKind::CallExpression, target) => {
                stats.calls += 1;
                match target {
                    Some(callee) => self.record(caller, callee, unit_caller, stats),
                    None => stats.unresolved += 1,
                }
            }
            _ => {}
        }

        for child in &node.children {
            self.visit(child, caller, unit_caller, stats);
        }
    }

    fn record(
        &mut self,
        caller: Caller<'_>,
        callee: &SymbolRecord,
        unit_caller: &SymbolRecord,
        stats: &mut BuildStats,
    ) {
        if !self.graph.scope().is_in_project(&callee.file) {
            return;
        }

        let caller = match (caller, self.file_scope) {
            (Caller::Function(function), _) => function.clone(),
            (Caller::Unit, FileScopePolicy::Attribute) => unit_caller.clone(),
            (Caller::Unit, FileScopePolicy::Drop) => {
                tracing::trace!("dropping file-scope call to {}", callee.name);
                return;
            }
        };

        if self.graph.add(caller, callee.clone()) {
            stats.recorded += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(name: &str, file: &str, line: u32) -> SymbolRecord {
        SymbolRecord::new(name, file, line, 5)
    }

    fn unit(children: Vec<SyntaxNode>) -> TranslationUnit {
        TranslationUnit::new("/proj/a.c", SyntaxNode::translation_unit(children))
    }

    fn build(unit: &TranslationUnit, policy: FileScopePolicy) -> CallGraph {
        let mut graph = CallGraph::new("/proj");
        CallGraphBuilder::new(&mut graph, policy).build(unit);
        graph
    }

    fn names(graph: &CallGraph, caller: &SymbolRecord) -> Vec<String> {
        graph
            .callees_of(caller)
            .iter()
            .map(|c| c.name.clone())
            .collect()
    }

    #[test]
    fn records_only_in_project_callees() {
        let foo = sym("foo", "/proj/a.c", 3);
        let tu = unit(vec![SyntaxNode::function(
            foo.clone(),
            vec![SyntaxNode::other(vec![
                SyntaxNode::call(Some(sym("bar", "/proj/b.c", 1)), vec![]),
                SyntaxNode::call(Some(sym("libc_fn", "/usr/include/stdio.h", 40)), vec![]),
            ])],
        )]);

        let graph = build(&tu, FileScopePolicy::Attribute);
        assert_eq!(graph.len(), 1);
        assert_eq!(names(&graph, &foo), vec!["bar"]);
    }

    #[test]
    fn unresolved_calls_are_skipped() {
        let foo = sym("foo", "/proj/a.c", 3);
        let tu = unit(vec![SyntaxNode::function(
            foo.clone(),
            vec![SyntaxNode::call(None, vec![])],
        )]);

        let mut graph = CallGraph::new("/proj");
        let stats = CallGraphBuilder::new(&mut graph, FileScopePolicy::Attribute).build(&tu);
        assert!(graph.is_empty());
        assert_eq!(stats.calls, 1);
        assert_eq!(stats.unresolved, 1);
    }

    #[test]
    fn caller_context_does_not_leak_to_siblings() {
        let first = sym("first", "/proj/a.c", 1);
        let second = sym("second", "/proj/a.c", 10);
        let tu = unit(vec![
            SyntaxNode::function(
                first.clone(),
                vec![SyntaxNode::call(Some(sym("x", "/proj/x.c", 1)), vec![])],
            ),
            SyntaxNode::function(
                second.clone(),
                vec![SyntaxNode::call(Some(sym("y", "/proj/y.c", 1)), vec![])],
            ),
        ]);

        let graph = build(&tu, FileScopePolicy::Attribute);
        assert_eq!(names(&graph, &first), vec!["x"]);
        assert_eq!(names(&graph, &second), vec!["y"]);
    }

    #[test]
    fn nested_calls_belong_to_enclosing_function() {
        // outer(inner()) : both calls are attributed to `f`
        let f = sym("f", "/proj/a.c", 1);
        let tu = unit(vec![SyntaxNode::function(
            f.clone(),
            vec![SyntaxNode::other(vec![SyntaxNode::call(
                Some(sym("outer", "/proj/b.c", 1)),
                vec![SyntaxNode::other(vec![SyntaxNode::call(
                    Some(sym("inner", "/proj/b.c", 8)),
                    vec![],
                )])],
            )])],
        )]);

        let graph = build(&tu, FileScopePolicy::Attribute);
        assert_eq!(names(&graph, &f), vec!["outer", "inner"]);
    }

    #[test]
    fn file_scope_calls_follow_policy() {
        let tu = unit(vec![SyntaxNode::other(vec![SyntaxNode::call(
            Some(sym("probe", "/proj/b.c", 2)),
            vec![],
        )])]);

        let graph = build(&tu, FileScopePolicy::Attribute);
        let callers: Vec<_> = graph.callers().collect();
        assert_eq!(callers.len(), 1);
        assert!(callers[0].is_file_scope());
        assert_eq!(callers[0].name, "a.c");

        let graph = build(&tu, FileScopePolicy::Drop);
        assert!(graph.is_empty());
    }

    #[test]
    fn function_without_calls_adds_nothing() {
        let tu = unit(vec![SyntaxNode::function(sym("main", "/proj/main.c", 1), vec![])]);
        let graph = build(&tu, FileScopePolicy::Attribute);
        assert!(graph.export().is_empty());
    }

    #[test]
    fn building_twice_is_idempotent() {
        let foo = sym("foo", "/proj/a.c", 3);
        let tu = unit(vec![SyntaxNode::function(
            foo,
            vec![
                SyntaxNode::call(Some(sym("bar", "/proj/b.c", 1)), vec![]),
                SyntaxNode::call(Some(sym("baz", "/proj/b.c", 9)), vec![]),
                SyntaxNode::call(Some(sym("bar", "/proj/b.c", 1)), vec![]),
            ],
        )]);

        let once = build(&tu, FileScopePolicy::Attribute);

        let mut twice = CallGraph::new("/proj");
        let mut builder = CallGraphBuilder::new(&mut twice, FileScopePolicy::Attribute);
        builder.build(&tu);
        builder.build(&tu);

        assert_eq!(once.export(), twice.export());
    }
}
