//! Name resolution for C calls.
//!
//! C has a flat namespace, so a call target is found by name among the
//! function declarations visible in the translation unit: those of the file
//! itself and of every header it (transitively) includes. Resolution order:
//! 1. A definition visible in the unit (same file, or an inline header function)
//! 2. The first visible declaration; a project prototype is linked to the
//!    project's unique external definition of that name
//! 3. No declaration at all (implicit declaration): the unique project definition
//!
//! Anything else stays unresolved.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::scope::{normalize, ProjectScope};
use crate::SymbolRecord;

/// A function declared or defined at file scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDecl {
    pub record: SymbolRecord,
    pub is_definition: bool,
    /// `static` = internal linkage (file-private)
    pub is_static: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeKind {
    /// `#include "file.h"`
    Quoted,
    /// `#include <file.h>`
    System,
}

/// One `#include` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeDirective {
    pub target: String,
    pub kind: IncludeKind,
    pub line: u32,
    pub column: u32,
}

/// Maps include directives to header files on disk.
#[derive(Debug, Clone, Default)]
pub struct IncludeResolver {
    /// Project directories, searched for both include forms
    search_dirs: Vec<PathBuf>,
    /// Searched last, for both include forms
    system_dirs: Vec<PathBuf>,
}

impl IncludeResolver {
    pub fn new(search_dirs: Vec<PathBuf>, system_dirs: Vec<PathBuf>) -> Self {
        Self {
            search_dirs,
            system_dirs,
        }
    }

    /// Locate the header named by `include`, as seen from `from_file`.
    ///
    /// Quoted includes look next to the including file first; a quoted
    /// include not found in the project is retried against the system dirs,
    /// as a C compiler does.
    pub fn resolve(&self, include: &IncludeDirective, from_file: &Path) -> Option<PathBuf> {
        let target = Path::new(&include.target);
        if target.is_absolute() {
            return target.is_file().then(|| normalize(target));
        }

        let local = match include.kind {
            IncludeKind::Quoted => from_file.parent(),
            IncludeKind::System => None,
        };

        local
            .into_iter()
            .chain(self.search_dirs.iter().map(PathBuf::as_path))
            .chain(self.system_dirs.iter().map(PathBuf::as_path))
            .map(|dir| dir.join(target))
            .find(|candidate| candidate.is_file())
            .map(|found| normalize(&found))
    }
}

/// External (non-`static`) function definitions across all project sources.
#[derive(Debug, Clone, Default)]
pub struct ProjectDefinitions {
    by_name: HashMap<String, Vec<SymbolRecord>>,
}

impl ProjectDefinitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the linkable definitions among `functions`.
    pub fn extend<'a>(&mut self, functions: impl IntoIterator<Item = &'a FunctionDecl>) {
        for decl in functions {
            if decl.is_definition && !decl.is_static {
                let defs = self.by_name.entry(decl.record.name.clone()).or_default();
                if !defs.contains(&decl.record) {
                    defs.push(decl.record.clone());
                }
            }
        }
    }

    /// The definition of `name`, if exactly one exists.
    ///
    /// Duplicate external definitions can't be linked unambiguously.
    pub fn unique(&self, name: &str) -> Option<&SymbolRecord> {
        match self.by_name.get(name).map(Vec::as_slice) {
            Some([only]) => Some(only),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.by_name.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Function declarations visible in one translation unit, in visibility order.
#[derive(Debug)]
pub struct Scope<'a> {
    visible: HashMap<String, Vec<FunctionDecl>>,
    project: &'a ProjectScope,
    definitions: &'a ProjectDefinitions,
}

impl<'a> Scope<'a> {
    pub fn new(project: &'a ProjectScope, definitions: &'a ProjectDefinitions) -> Self {
        Self {
            visible: HashMap::new(),
            project,
            definitions,
        }
    }

    pub fn declare(&mut self, decl: FunctionDecl) {
        let decls = self.visible.entry(decl.record.name.clone()).or_default();
        if !decls.contains(&decl) {
            decls.push(decl);
        }
    }

    pub fn declare_all<'d>(&mut self, decls: impl IntoIterator<Item = &'d FunctionDecl>) {
        for decl in decls {
            self.declare(decl.clone());
        }
    }

    /// Resolve a called name to the symbol it binds to.
    pub fn resolve(&self, name: &str) -> Option<SymbolRecord> {
        let Some(decls) = self.visible.get(name) else {
            return self.definitions.unique(name).cloned();
        };

        if let Some(def) = decls.iter().find(|d| d.is_definition) {
            return Some(def.record.clone());
        }

        let decl = decls.first()?;
        if !decl.is_static && self.project.is_in_project(&decl.record.file) {
            if let Some(def) = self.definitions.unique(name) {
                return Some(def.clone());
            }
        }
        Some(decl.record.clone())
    }

    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn decl(name: &str, file: &str, line: u32, is_definition: bool) -> FunctionDecl {
        FunctionDecl {
            record: SymbolRecord::new(name, file, line, 5),
            is_definition,
            is_static: false,
        }
    }

    fn quoted(target: &str) -> IncludeDirective {
        IncludeDirective {
            target: target.to_string(),
            kind: IncludeKind::Quoted,
            line: 1,
            column: 1,
        }
    }

    #[test]
    fn prefers_visible_definition() {
        let project = ProjectScope::new("/proj");
        let definitions = ProjectDefinitions::new();
        let mut scope = Scope::new(&project, &definitions);
        scope.declare(decl("helper", "/proj/a.h", 2, false));
        scope.declare(decl("helper", "/proj/a.c", 10, true));

        let resolved = scope.resolve("helper").unwrap();
        assert_eq!(resolved.file, PathBuf::from("/proj/a.c"));
        assert_eq!(resolved.line, 10);
    }

    #[test]
    fn project_prototype_links_to_unique_definition() {
        let project = ProjectScope::new("/proj");
        let mut definitions = ProjectDefinitions::new();
        definitions.extend(&[decl("bar", "/proj/b.c", 3, true)]);

        let mut scope = Scope::new(&project, &definitions);
        scope.declare(decl("bar", "/proj/b.h", 1, false));

        assert_eq!(
            scope.resolve("bar"),
            Some(SymbolRecord::new("bar", "/proj/b.c", 3, 5))
        );
    }

    #[test]
    fn ambiguous_definitions_keep_the_prototype() {
        let project = ProjectScope::new("/proj");
        let mut definitions = ProjectDefinitions::new();
        definitions.extend(&[
            decl("init", "/proj/x/init.c", 1, true),
            decl("init", "/proj/y/init.c", 1, true),
        ]);
        assert!(definitions.unique("init").is_none());

        let mut scope = Scope::new(&project, &definitions);
        scope.declare(decl("init", "/proj/init.h", 4, false));
        assert_eq!(scope.resolve("init").unwrap().file, PathBuf::from("/proj/init.h"));
    }

    #[test]
    fn system_prototype_is_not_linked() {
        let project = ProjectScope::new("/proj");
        let mut definitions = ProjectDefinitions::new();
        // A project function that happens to share a libc name
        definitions.extend(&[decl("puts", "/proj/compat.c", 1, true)]);

        let mut scope = Scope::new(&project, &definitions);
        scope.declare(decl("puts", "/usr/include/stdio.h", 661, false));

        assert_eq!(
            scope.resolve("puts").unwrap().file,
            PathBuf::from("/usr/include/stdio.h")
        );
    }

    #[test]
    fn undeclared_name_falls_back_to_project_definition() {
        let project = ProjectScope::new("/proj");
        let mut definitions = ProjectDefinitions::new();
        definitions.extend(&[decl("legacy", "/proj/old.c", 7, true)]);
        let scope = Scope::new(&project, &definitions);

        assert_eq!(scope.resolve("legacy").unwrap().line, 7);
        assert_eq!(scope.resolve("nowhere"), None);
    }

    #[test]
    fn static_definitions_are_not_linkable() {
        let mut definitions = ProjectDefinitions::new();
        definitions.extend(&[FunctionDecl {
            record: SymbolRecord::new("local", "/proj/a.c", 1, 13),
            is_definition: true,
            is_static: true,
        }]);
        assert!(definitions.is_empty());
        assert!(definitions.unique("local").is_none());
    }

    #[test]
    fn quoted_include_prefers_including_directory() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        std::fs::create_dir_all(root.join("src")).unwrap();
        std::fs::create_dir_all(root.join("include")).unwrap();
        std::fs::write(root.join("src/util.h"), "").unwrap();
        std::fs::write(root.join("include/util.h"), "").unwrap();
        std::fs::write(root.join("include/only.h"), "").unwrap();

        let resolver = IncludeResolver::new(vec![root.join("include")], vec![]);
        let from = root.join("src/main.c");

        assert_eq!(
            resolver.resolve(&quoted("util.h"), &from),
            Some(normalize(&root.join("src/util.h")))
        );
        assert_eq!(
            resolver.resolve(&quoted("only.h"), &from),
            Some(normalize(&root.join("include/only.h")))
        );
        assert_eq!(resolver.resolve(&quoted("missing.h"), &from), None);
    }

    #[test]
    fn quoted_include_falls_back_to_system_dirs() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        std::fs::create_dir_all(root.join("sys")).unwrap();
        std::fs::create_dir_all(root.join("proj")).unwrap();
        std::fs::write(root.join("sys/stdio.h"), "").unwrap();
        std::fs::write(root.join("sys/config.h"), "").unwrap();
        std::fs::write(root.join("proj/config.h"), "").unwrap();

        let resolver = IncludeResolver::new(vec![root.join("proj")], vec![root.join("sys")]);
        let from = root.join("proj/a.c");

        assert_eq!(
            resolver.resolve(&quoted("stdio.h"), &from),
            Some(normalize(&root.join("sys/stdio.h")))
        );
        // The project copy still wins when both exist
        assert_eq!(
            resolver.resolve(&quoted("config.h"), &from),
            Some(normalize(&root.join("proj/config.h")))
        );
    }

    #[test]
    fn system_include_searches_system_dirs_last() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        std::fs::create_dir_all(root.join("sys")).unwrap();
        std::fs::create_dir_all(root.join("src")).unwrap();
        std::fs::write(root.join("sys/stdio.h"), "").unwrap();
        // Next to the including file, but <...> must not look there
        std::fs::write(root.join("src/stdio.h"), "").unwrap();

        let resolver = IncludeResolver::new(vec![], vec![root.join("sys")]);
        let include = IncludeDirective {
            target: "stdio.h".to_string(),
            kind: IncludeKind::System,
            line: 1,
            column: 1,
        };
        assert_eq!(
            resolver.resolve(&include, &root.join("src/main.c")),
            Some(normalize(&root.join("sys/stdio.h")))
        );
    }

    #[test]
    fn parent_relative_include_is_normalized() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        std::fs::create_dir_all(root.join("src")).unwrap();
        std::fs::create_dir_all(root.join("inc")).unwrap();
        std::fs::write(root.join("inc/api.h"), "").unwrap();

        let resolver = IncludeResolver::default();
        assert_eq!(
            resolver.resolve(&quoted("../inc/api.h"), &root.join("src/main.c")),
            Some(normalize(&root.join("inc/api.h")))
        );
    }
}
