//! Language front-ends.
//!
//! Each front-end turns source files into [`TranslationUnit`](crate::TranslationUnit)s
//! whose call expressions are already resolved. Only C is supported.

pub mod c;

/// File extensions of translation units fed to the builder.
pub const SOURCE_EXTENSIONS: &[&str] = &["c"];

/// Whether a path names a translation unit source file.
pub fn is_source_file(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}
