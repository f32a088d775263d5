//! C front-end: tree-sitter parsing and lowering into [`SyntaxNode`]s.
//!
//! [`CFrontend::parse_unit`] assembles one translation unit: the main file,
//! the function declarations of every header it includes (for resolution),
//! and the function bodies of project headers (so `static inline` helpers are
//! walked too). System headers only contribute declarations.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::resolver::{
    FunctionDecl, IncludeDirective, IncludeKind, IncludeResolver, ProjectDefinitions, Scope,
};
use crate::parse::{has_child_with_text, node_position, node_text, node_to_record};
use crate::scope::ProjectScope;
use crate::syntax::{Diagnostic, NodeKind, Severity, SyntaxNode, TranslationUnit};

// Thread-local parser reuse - avoids creating a new parser per file
thread_local! {
    static C_PARSER: RefCell<tree_sitter::Parser> = RefCell::new({
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_c::LANGUAGE.into())
            .expect("tree-sitter-c grammar incompatible with tree-sitter version");
        parser
    });
}

/// A parsed C file (source or header) with its file-scope declarations.
pub struct SourceFile {
    pub path: PathBuf,
    pub source: String,
    pub tree: tree_sitter::Tree,
    pub includes: Vec<IncludeDirective>,
    pub functions: Vec<FunctionDecl>,
}

impl std::fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceFile")
            .field("path", &self.path)
            .field("includes", &self.includes)
            .field("functions", &self.functions)
            .finish_non_exhaustive()
    }
}

impl SourceFile {
    /// Parse `source` as C. Returns `None` only if tree-sitter gives up entirely.
    pub fn parse(path: &Path, source: String) -> Option<Self> {
        let tree = C_PARSER.with(|parser| parser.borrow_mut().parse(&source, None))?;

        let mut includes = Vec::new();
        let mut functions = Vec::new();
        collect_file_scope(
            &tree.root_node(),
            source.as_bytes(),
            path,
            &mut includes,
            &mut functions,
        );

        Some(Self {
            path: path.to_path_buf(),
            source,
            tree,
            includes,
            functions,
        })
    }

    /// Read and parse a file from disk.
    pub fn read(path: &Path) -> std::io::Result<Option<Self>> {
        let source = std::fs::read_to_string(path)?;
        Ok(Self::parse(path, source))
    }

    /// Every ERROR and MISSING node, as error diagnostics.
    pub fn syntax_errors(&self) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        let root = self.tree.root_node();
        if root.has_error() {
            collect_syntax_errors(&root, &self.path, &mut out);
        }
        out
    }
}

/// Gather includes and function declarations outside function bodies.
fn collect_file_scope(
    node: &tree_sitter::Node,
    source: &[u8],
    file: &Path,
    includes: &mut Vec<IncludeDirective>,
    functions: &mut Vec<FunctionDecl>,
) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "preproc_include" => {
                if let Some(include) = include_directive(&child, source) {
                    includes.push(include);
                }
            }

            "function_definition" => {
                let name = child
                    .child_by_field_name("declarator")
                    .and_then(|d| function_name_node(&d));
                if let Some(name_node) = name {
                    if let Some(name) = node_text(&name_node, source) {
                        functions.push(FunctionDecl {
                            record: node_to_record(file, name, &name_node),
                            is_definition: true,
                            is_static: is_static(&child, source),
                        });
                    }
                }
            }

            "declaration" => {
                if has_child_with_text(&child, "storage_class_specifier", "typedef", source) {
                    continue;
                }
                let is_static = is_static(&child, source);
                let mut decl_cursor = child.walk();
                for declarator in child.children_by_field_name("declarator", &mut decl_cursor) {
                    // `int x = 1, f(void);` wraps initialized declarators
                    let declarator = match declarator.kind() {
                        "init_declarator" => match declarator.child_by_field_name("declarator") {
                            Some(inner) => inner,
                            None => continue,
                        },
                        _ => declarator,
                    };
                    if let Some(name_node) = function_name_node(&declarator) {
                        if let Some(name) = node_text(&name_node, source) {
                            functions.push(FunctionDecl {
                                record: node_to_record(file, name, &name_node),
                                is_definition: false,
                                is_static,
                            });
                        }
                    }
                }
            }

            // Conditional blocks and recovered regions still hold file-scope declarations
            "preproc_if" | "preproc_ifdef" | "preproc_else" | "preproc_elif"
            | "preproc_elifdef" | "linkage_specification" | "declaration_list" | "ERROR" => {
                collect_file_scope(&child, source, file, includes, functions);
            }

            _ => {}
        }
    }
}

fn is_static(node: &tree_sitter::Node, source: &[u8]) -> bool {
    has_child_with_text(node, "storage_class_specifier", "static", source)
}

/// Parse `#include "x.h"` / `#include <x.h>`; macro includes are ignored.
fn include_directive(node: &tree_sitter::Node, source: &[u8]) -> Option<IncludeDirective> {
    let path = node.child_by_field_name("path")?;
    let text = node_text(&path, source)?;
    let (kind, target) = match path.kind() {
        "string_literal" => (IncludeKind::Quoted, text.trim_matches('"')),
        "system_lib_string" => (
            IncludeKind::System,
            text.trim_start_matches('<').trim_end_matches('>'),
        ),
        _ => return None,
    };
    let (line, column) = node_position(node);
    Some(IncludeDirective {
        target: target.to_string(),
        kind,
        line,
        column,
    })
}

/// The identifier a function declarator declares.
///
/// `char *f(void)` and `int (f)(void)` name `f`, and `int (*get(void))(int)`
/// names `get`; `int (*fp)(void)` is a function pointer variable and names nothing.
fn function_name_node<'a>(declarator: &tree_sitter::Node<'a>) -> Option<tree_sitter::Node<'a>> {
    match declarator.kind() {
        "function_declarator" => {
            let inner = declarator.child_by_field_name("declarator")?;
            plain_identifier(&inner).or_else(|| returned_function_name(&inner))
        }
        "pointer_declarator" => {
            let inner = declarator.child_by_field_name("declarator")?;
            function_name_node(&inner)
        }
        "parenthesized_declarator" | "attributed_declarator" => {
            let mut cursor = declarator.walk();
            let found = declarator
                .named_children(&mut cursor)
                .find_map(|child| function_name_node(&child));
            found
        }
        _ => None,
    }
}

/// A function returning a function pointer: its own declarator is nested
/// inside the pointer declarator of the return type.
fn returned_function_name<'a>(node: &tree_sitter::Node<'a>) -> Option<tree_sitter::Node<'a>> {
    match node.kind() {
        "function_declarator" => function_name_node(node),
        "pointer_declarator" => {
            let inner = node.child_by_field_name("declarator")?;
            returned_function_name(&inner)
        }
        "parenthesized_declarator" | "attributed_declarator" => {
            let mut cursor = node.walk();
            let found = node
                .named_children(&mut cursor)
                .find_map(|child| returned_function_name(&child));
            found
        }
        _ => None,
    }
}

fn plain_identifier<'a>(node: &tree_sitter::Node<'a>) -> Option<tree_sitter::Node<'a>> {
    match node.kind() {
        "identifier" => Some(*node),
        "parenthesized_declarator" => {
            let mut cursor = node.walk();
            let found = node
                .named_children(&mut cursor)
                .find_map(|child| plain_identifier(&child));
            found
        }
        _ => None,
    }
}

/// The name called by a call expression, when the callee is a plain identifier.
///
/// `(f)(x)` calls `f`; `obj->fn(x)`, `(*fp)(x)` and `table[i](x)` are not resolvable.
fn callee_name<'s>(function: &tree_sitter::Node, source: &'s [u8]) -> Option<&'s str> {
    match function.kind() {
        "identifier" => node_text(function, source),
        "parenthesized_expression" => {
            let inner = function.named_child(0)?;
            if function.named_child_count() == 1 {
                callee_name(&inner, source)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn collect_syntax_errors(node: &tree_sitter::Node, file: &Path, out: &mut Vec<Diagnostic>) {
    if node.is_error() {
        let (line, column) = node_position(node);
        out.push(Diagnostic::new(Severity::Error, file, line, column, "syntax error"));
        return;
    }
    if node.is_missing() {
        let (line, column) = node_position(node);
        out.push(Diagnostic::new(
            Severity::Error,
            file,
            line,
            column,
            format!("missing '{}'", node.kind()),
        ));
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error() {
            collect_syntax_errors(&child, file, out);
        }
    }
}

/// Lowers tree-sitter trees into [`SyntaxNode`]s, resolving calls through a [`Scope`].
struct Lowering<'s, 'a> {
    file: &'s SourceFile,
    scope: &'s Scope<'a>,
    max_depth: usize,
    truncated: bool,
}

impl Lowering<'_, '_> {
    fn lower(&mut self, node: &tree_sitter::Node, depth: usize) -> SyntaxNode {
        let source = self.file.source.as_bytes();
        let mut lowered = match node.kind() {
            "translation_unit" => SyntaxNode::new(NodeKind::TranslationUnit),
            "function_definition" => {
                let symbol = node
                    .child_by_field_name("declarator")
                    .and_then(|d| function_name_node(&d))
                    .and_then(|name_node| {
                        node_text(&name_node, source)
                            .map(|name| node_to_record(&self.file.path, name, &name_node))
                    });
                match symbol {
                    Some(symbol) => SyntaxNode::new(NodeKind::FunctionDefinition)
                        .with_symbol(Some(symbol)),
                    None => SyntaxNode::new(NodeKind::Other),
                }
            }
            "call_expression" => {
                let target = node
                    .child_by_field_name("function")
                    .and_then(|f| callee_name(&f, source))
                    .and_then(|name| self.scope.resolve(name));
                SyntaxNode::new(NodeKind::CallExpression).with_symbol(target)
            }
            _ => SyntaxNode::new(NodeKind::Other),
        };

        if depth >= self.max_depth {
            if node.named_child_count() > 0 {
                self.truncated = true;
            }
            return lowered;
        }

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            // Leaves (identifiers, literals) can't contain calls
            if child.named_child_count() == 0 {
                continue;
            }
            lowered.children.push(self.lower(&child, depth + 1));
        }
        lowered
    }
}

/// Per-thread C front-end with a header cache.
pub struct CFrontend<'a> {
    project: &'a ProjectScope,
    definitions: &'a ProjectDefinitions,
    includes: IncludeResolver,
    max_depth: usize,
    headers: HashMap<PathBuf, Option<Rc<SourceFile>>>,
}

impl<'a> CFrontend<'a> {
    pub fn new(
        project: &'a ProjectScope,
        definitions: &'a ProjectDefinitions,
        includes: IncludeResolver,
        max_depth: usize,
    ) -> Self {
        Self {
            project,
            definitions,
            includes,
            max_depth,
            headers: HashMap::new(),
        }
    }

    /// Read and parse one source file into a translation unit.
    ///
    /// Unreadable files come back as an unusable unit carrying a fatal diagnostic.
    pub fn parse_unit(&mut self, path: &Path) -> TranslationUnit {
        match std::fs::read_to_string(path) {
            Ok(source) => self.parse_source(path, source),
            Err(e) => {
                let mut unit = TranslationUnit::new(path, SyntaxNode::translation_unit(vec![]));
                unit.diagnostics.push(Diagnostic::new(
                    Severity::Fatal,
                    path,
                    0,
                    0,
                    format!("cannot read file: {}", e),
                ));
                unit
            }
        }
    }

    /// Parse in-memory source text as the translation unit `path`.
    pub fn parse_source(&mut self, path: &Path, source: String) -> TranslationUnit {
        let Some(main) = SourceFile::parse(path, source) else {
            tracing::warn!("Failed to parse file: {:?}", path);
            let mut unit = TranslationUnit::new(path, SyntaxNode::translation_unit(vec![]));
            unit.diagnostics.push(Diagnostic::new(
                Severity::Fatal,
                path,
                0,
                0,
                "parser produced no tree",
            ));
            return unit;
        };

        let mut diagnostics = main.syntax_errors();
        let mut scope = Scope::new(self.project, self.definitions);
        let mut project_headers = Vec::new();
        let mut visited = HashSet::new();
        visited.insert(main.path.clone());

        self.load_includes(
            &main,
            true,
            &mut visited,
            &mut scope,
            &mut project_headers,
            &mut diagnostics,
        );
        scope.declare_all(&main.functions);

        let mut root = self.lower_file(&main, &scope, &mut diagnostics);
        for header in &project_headers {
            let mut lowered = self.lower_file(header, &scope, &mut diagnostics);
            lowered.kind = NodeKind::Other;
            root.children.push(lowered);
        }

        tracing::trace!(
            "{}: {} visible functions, {} project headers",
            path.display(),
            scope.len(),
            project_headers.len()
        );

        TranslationUnit {
            path: path.to_path_buf(),
            root,
            diagnostics,
        }
    }

    fn lower_file(
        &self,
        file: &SourceFile,
        scope: &Scope<'_>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> SyntaxNode {
        let mut lowering = Lowering {
            file,
            scope,
            max_depth: self.max_depth,
            truncated: false,
        };
        let root = lowering.lower(&file.tree.root_node(), 0);
        if lowering.truncated {
            diagnostics.push(Diagnostic::new(
                Severity::Warning,
                &file.path,
                0,
                0,
                format!(
                    "syntax tree deeper than {} levels, nested calls were not examined",
                    self.max_depth
                ),
            ));
        }
        root
    }

    /// Pull in the headers included by `file`, depth-first in inclusion order.
    ///
    /// Only the main file and project headers report diagnostics; system
    /// headers are mined for declarations and nothing else.
    fn load_includes(
        &mut self,
        file: &SourceFile,
        report: bool,
        visited: &mut HashSet<PathBuf>,
        scope: &mut Scope<'a>,
        project_headers: &mut Vec<Rc<SourceFile>>,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        for include in &file.includes {
            let Some(path) = self.includes.resolve(include, &file.path) else {
                if report {
                    let severity = match include.kind {
                        IncludeKind::Quoted => Severity::Error,
                        IncludeKind::System => Severity::Warning,
                    };
                    diagnostics.push(Diagnostic::new(
                        severity,
                        &file.path,
                        include.line,
                        include.column,
                        format!("'{}' file not found", include.target),
                    ));
                }
                continue;
            };

            if !visited.insert(path.clone()) {
                continue;
            }
            let Some(header) = self.header(&path) else {
                continue;
            };

            let local = self.project.is_in_project(&header.path);
            if local {
                diagnostics.extend(header.syntax_errors());
                project_headers.push(Rc::clone(&header));
            }
            self.load_includes(
                &header,
                local,
                visited,
                scope,
                project_headers,
                diagnostics,
            );
            scope.declare_all(&header.functions);
        }
    }

    /// Parse a header once per front-end; unreadable headers are remembered as `None`.
    fn header(&mut self, path: &Path) -> Option<Rc<SourceFile>> {
        if let Some(cached) = self.headers.get(path) {
            return cached.clone();
        }
        let parsed = match SourceFile::read(path) {
            Ok(parsed) => parsed.map(Rc::new),
            Err(e) => {
                tracing::debug!("Cannot read header {}: {}", path.display(), e);
                None
            }
        };
        self.headers.insert(path.to_path_buf(), parsed.clone());
        parsed
    }
}
