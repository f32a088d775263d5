//! Normalized syntax tree handed from the front-end to the call-graph builder.
//!
//! Every node has the same shape: a kind, an optional symbol and children.
//! For a function definition the symbol is the function itself; for a call
//! expression it is the resolved target, absent when resolution failed.

use std::path::{Path, PathBuf};

use crate::SymbolRecord;

/// The node kinds the builder distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    TranslationUnit,
    FunctionDefinition,
    CallExpression,
    Other,
}

impl NodeKind {
    /// Function-like definitions open a new caller context.
    pub fn is_function_like(self) -> bool {
        matches!(self, NodeKind::FunctionDefinition)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    pub kind: NodeKind,
    pub symbol: Option<SymbolRecord>,
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            symbol: None,
            children: Vec::new(),
        }
    }

    pub fn translation_unit(children: Vec<SyntaxNode>) -> Self {
        Self::new(NodeKind::TranslationUnit).with_children(children)
    }

    pub fn function(symbol: SymbolRecord, children: Vec<SyntaxNode>) -> Self {
        Self::new(NodeKind::FunctionDefinition)
            .with_symbol(Some(symbol))
            .with_children(children)
    }

    pub fn call(target: Option<SymbolRecord>, children: Vec<SyntaxNode>) -> Self {
        Self::new(NodeKind::CallExpression)
            .with_symbol(target)
            .with_children(children)
    }

    pub fn other(children: Vec<SyntaxNode>) -> Self {
        Self::new(NodeKind::Other).with_children(children)
    }

    pub fn with_symbol(mut self, symbol: Option<SymbolRecord>) -> Self {
        self.symbol = symbol;
        self
    }

    pub fn with_children(mut self, children: Vec<SyntaxNode>) -> Self {
        self.children = children;
        self
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(SyntaxNode::size).sum::<usize>()
    }
}

/// Diagnostic severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Note,
    Warning,
    Error,
    Fatal,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Note => write!(f, "NOTE"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// A problem reported by the front-end for a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub file: PathBuf,
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        file: impl Into<PathBuf>,
        line: u32,
        column: u32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            file: file.into(),
            line,
            column,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity >= Severity::Error
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {}:{} {}",
            self.severity,
            self.file.display(),
            self.line,
            self.message
        )
    }
}

/// One parsed source file plus the headers it pulled in.
#[derive(Debug, Clone)]
pub struct TranslationUnit {
    pub path: PathBuf,
    pub root: SyntaxNode,
    pub diagnostics: Vec<Diagnostic>,
}

impl TranslationUnit {
    pub fn new(path: impl Into<PathBuf>, root: SyntaxNode) -> Self {
        Self {
            path: path.into(),
            root,
            diagnostics: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Diagnostics at error severity or above.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    /// A unit with any error diagnostic must not be fed to the builder.
    pub fn is_usable(&self) -> bool {
        self.errors().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ordering() {
        assert!(Severity::Note < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error < Severity::Fatal);
    }

    #[test]
    fn warnings_keep_unit_usable() {
        let mut unit = TranslationUnit::new("/proj/a.c", SyntaxNode::translation_unit(vec![]));
        unit.diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "/proj/a.c",
            1,
            1,
            "'stdio.h' file not found",
        ));
        assert!(unit.is_usable());

        unit.diagnostics
            .push(Diagnostic::new(Severity::Error, "/proj/a.c", 4, 2, "syntax error"));
        assert!(!unit.is_usable());
        assert_eq!(unit.errors().count(), 1);
    }

    #[test]
    fn diagnostic_display() {
        let diag = Diagnostic::new(Severity::Error, "/proj/a.c", 12, 3, "missing ';'");
        assert_eq!(diag.to_string(), "[ERROR] /proj/a.c:12 missing ';'");
    }

    #[test]
    fn subtree_size() {
        let tree = SyntaxNode::translation_unit(vec![
            SyntaxNode::function(
                SymbolRecord::new("f", "/p/a.c", 1, 6),
                vec![SyntaxNode::call(None, vec![])],
            ),
            SyntaxNode::other(vec![]),
        ]);
        assert_eq!(tree.size(), 4);
        assert!(NodeKind::FunctionDefinition.is_function_like());
        assert!(!NodeKind::CallExpression.is_function_like());
    }
}
