//! C language support: tree-sitter front-end and call target resolution.

pub mod parser;
pub mod resolver;

pub use parser::{CFrontend, SourceFile};
pub use resolver::{
    FunctionDecl, IncludeDirective, IncludeKind, IncludeResolver, ProjectDefinitions, Scope,
};
