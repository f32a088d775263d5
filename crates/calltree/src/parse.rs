//! Shared tree-sitter helpers.
//!
//! Positions are converted to the 1-indexed line/column convention used by
//! [`SymbolRecord`] and [`Diagnostic`](crate::Diagnostic).

use std::path::Path;

use crate::SymbolRecord;

/// 1-indexed (line, column) of a node's start.
pub fn node_position(node: &tree_sitter::Node) -> (u32, u32) {
    let start = node.start_position();
    ((start.row + 1) as u32, (start.column + 1) as u32)
}

/// Build a symbol record named `name`, located at `node`.
pub fn node_to_record(file: &Path, name: &str, node: &tree_sitter::Node) -> SymbolRecord {
    let (line, column) = node_position(node);
    SymbolRecord::new(name, file, line, column)
}

/// Source text of a node, or `None` if it isn't valid UTF-8.
pub fn node_text<'s>(node: &tree_sitter::Node, source: &'s [u8]) -> Option<&'s str> {
    node.utf8_text(source).ok()
}

/// Check whether any direct child is the keyword/specifier `text` of kind `kind`,
/// e.g. a `storage_class_specifier` reading `static`.
pub fn has_child_with_text(
    node: &tree_sitter::Node,
    kind: &str,
    text: &str,
    source: &[u8],
) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|child| child.kind() == kind && node_text(&child, source) == Some(text));
    found
}
