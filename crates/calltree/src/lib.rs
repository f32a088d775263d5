//! calltree: static call-graph extraction for C projects
//!
//! This crate provides the building blocks for mapping who-calls-whom in a C source tree:
//! - C parsing with tree-sitter, lowered into a normalized syntax tree with resolved call targets
//! - A project scope filter so only project-local callees are recorded
//! - A call graph store with merge-by-identity export
//! - Text, JSON and vis.js renderers

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod analyze;
pub mod builder;
pub mod callgraph;
pub mod config;
pub mod export;
pub mod languages;
pub mod parse;
pub mod project;
pub mod scope;
pub mod syntax;

// Re-export main types
pub use analyze::{analyze, Analysis, SkippedFile};
pub use builder::{BuildStats, CallGraphBuilder};
pub use callgraph::{CallGraph, CallerEntry, ExportedCallTree};
pub use config::{Config, FileScopePolicy};
pub use export::OutputFormat;
pub use scope::ProjectScope;
pub use syntax::{Diagnostic, NodeKind, Severity, SyntaxNode, TranslationUnit};

/// One function-like entity: a definition, or the declaration a call resolved to.
///
/// Identity is structural: two records are the same function iff name, file,
/// line and column all match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolRecord {
    pub name: String,
    pub file: PathBuf,
    pub line: u32,   // 1-indexed, 0 for the file-scope placeholder
    pub column: u32, // 1-indexed, 0 for the file-scope placeholder
}

impl SymbolRecord {
    pub fn new(name: impl Into<String>, file: impl Into<PathBuf>, line: u32, column: u32) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
            line,
            column,
        }
    }

    /// The synthetic caller used for calls that sit outside every function body.
    ///
    /// Named after the translation unit's file, positioned at 0:0 so it can never
    /// collide with a real definition.
    pub fn file_scope(unit: &Path) -> Self {
        let name = unit
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| unit.display().to_string());
        Self::new(name, unit, 0, 0)
    }

    pub fn is_file_scope(&self) -> bool {
        self.line == 0 && self.column == 0
    }
}

impl std::fmt::Display for SymbolRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}:{}:{}",
            self.name,
            self.file.display(),
            self.line,
            self.column
        )
    }
}

/// Errors that can occur while analyzing a project
#[derive(Debug, thiserror::Error)]
pub enum CallTreeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Project directory not found: {path}")]
    ProjectNotFound { path: PathBuf },

    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("Failed to walk project directory: {0}")]
    Walk(#[from] ignore::Error),

    #[error("Failed to serialize call tree: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CallTreeError>;
