//! End-to-end analysis of one project directory.
//!
//! 1. Discover `.c` files and include directories
//! 2. Index the project's external function definitions (for linking prototypes)
//! 3. Parse every file into a translation unit (in parallel when enabled)
//! 4. Walk each usable unit into the call graph, strictly in discovery order
//!
//! Parsing is the only parallel step; every edge is added on the calling
//! thread, so the [`CallGraph`] needs no synchronization.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::builder::CallGraphBuilder;
use crate::callgraph::CallGraph;
use crate::config::Config;
use crate::languages::c::{CFrontend, IncludeResolver, ProjectDefinitions, SourceFile};
use crate::project::ProjectLayout;
use crate::scope::ProjectScope;
use crate::syntax::{Diagnostic, TranslationUnit};
use crate::{CallTreeError, Result};

/// A source file left out of the graph because the front-end rejected it.
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: PathBuf,
    /// The error-or-worse diagnostics that made the unit unusable
    pub errors: Vec<Diagnostic>,
}

/// The populated graph plus bookkeeping about the run.
#[derive(Debug)]
pub struct Analysis {
    pub graph: CallGraph,
    /// Units walked into the graph
    pub parsed_files: Vec<PathBuf>,
    pub skipped: Vec<SkippedFile>,
}

/// Analyze the C project rooted at `root`.
pub fn analyze(root: &Path, config: &Config) -> Result<Analysis> {
    let root = root.canonicalize().map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => CallTreeError::ProjectNotFound {
            path: root.to_path_buf(),
        },
        _ => CallTreeError::Io(e),
    })?;

    let layout = ProjectLayout::discover(&root, config)?;
    let scope = ProjectScope::new(&root);
    let definitions = index_definitions(layout.source_files(), config.parallel);
    tracing::debug!("Indexed {} external definitions", definitions.len());

    let units = parse_units(&layout, &scope, &definitions, config);

    let mut graph = CallGraph::with_scope(scope.clone());
    let mut parsed_files = Vec::new();
    let mut skipped = Vec::new();
    {
        let mut builder = CallGraphBuilder::new(&mut graph, config.file_scope_calls);
        for unit in units {
            for diag in unit.diagnostics.iter().filter(|d| !d.is_error()) {
                tracing::debug!("{}", diag);
            }
            if !unit.is_usable() {
                let errors: Vec<Diagnostic> = unit.errors().cloned().collect();
                for diag in &errors {
                    tracing::error!("{}", diag);
                }
                skipped.push(SkippedFile {
                    path: unit.path,
                    errors,
                });
                continue;
            }
            builder.build(&unit);
            parsed_files.push(unit.path);
        }
    }

    tracing::info!(
        "Analyzed {} files ({} skipped): {} callers, {} edges",
        parsed_files.len(),
        skipped.len(),
        graph.len(),
        graph.edge_count()
    );

    Ok(Analysis {
        graph,
        parsed_files,
        skipped,
    })
}

/// External definitions of every source file; unreadable files contribute nothing.
fn index_definitions(files: &[PathBuf], parallel: bool) -> ProjectDefinitions {
    let extract = |file: &PathBuf| match SourceFile::read(file) {
        Ok(Some(parsed)) => parsed.functions,
        Ok(None) => Vec::new(),
        Err(e) => {
            tracing::debug!("Cannot read {}: {}", file.display(), e);
            Vec::new()
        }
    };

    let per_file: Vec<_> = if parallel {
        files.par_iter().map(extract).collect()
    } else {
        files.iter().map(extract).collect()
    };

    let mut definitions = ProjectDefinitions::new();
    for functions in &per_file {
        definitions.extend(functions);
    }
    definitions
}

/// Parse every source file, preserving discovery order.
fn parse_units(
    layout: &ProjectLayout,
    scope: &ProjectScope,
    definitions: &ProjectDefinitions,
    config: &Config,
) -> Vec<TranslationUnit> {
    let includes = IncludeResolver::new(
        layout.include_dirs().to_vec(),
        config.system_include_dirs.clone(),
    );
    let new_frontend =
        || CFrontend::new(scope, definitions, includes.clone(), config.max_recursion_depth);

    if config.parallel {
        layout
            .source_files()
            .par_iter()
            .map_init(new_frontend, |frontend, file| frontend.parse_unit(file))
            .collect()
    } else {
        let mut frontend = new_frontend();
        layout
            .source_files()
            .iter()
            .map(|file| frontend.parse_unit(file))
            .collect()
    }
}
