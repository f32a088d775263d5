//! Renderers for a populated [`CallGraph`].
//!
//! | format | destination |
//! |--------|-------------|
//! | text   | stdout (returned as a string) |
//! | json   | `calltree.json` in the project root |
//! | visjs  | `calltree_visjs.json` in the project root |
//! | html   | `calltree.html` in the project root |

use std::path::{Path, PathBuf};

use crate::callgraph::CallGraph;
use crate::Result;

pub mod html;
pub mod json;
pub mod text;
pub mod visjs;

pub use visjs::{VisEdge, VisGraph, VisNode};

/// The renderer selected for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    VisJs,
    Html,
}

impl OutputFormat {
    /// File written into the project root; `None` for terminal output.
    pub fn file_name(self) -> Option<&'static str> {
        match self {
            OutputFormat::Text => None,
            OutputFormat::Json => Some("calltree.json"),
            OutputFormat::VisJs => Some("calltree_visjs.json"),
            OutputFormat::Html => Some("calltree.html"),
        }
    }

    /// Human-readable name used in "saved at" messages.
    pub fn describe(self) -> &'static str {
        match self {
            OutputFormat::Text => "Text calltree",
            OutputFormat::Json => "JSON calltree",
            OutputFormat::VisJs => "Vis.js data",
            OutputFormat::Html => "HTML calltree",
        }
    }
}

/// Render the graph in the requested format.
pub fn render(graph: &CallGraph, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(text::render(graph)),
        OutputFormat::Json => json::render(graph),
        OutputFormat::VisJs => visjs::render(graph),
        OutputFormat::Html => html::render(graph),
    }
}

/// Render and write the output file into `dir`, returning its path.
///
/// Text output has no file; it is written to `dir/calltree.txt` only if asked
/// for explicitly through this function.
pub fn save(graph: &CallGraph, format: OutputFormat, dir: &Path) -> Result<PathBuf> {
    let path = dir.join(format.file_name().unwrap_or("calltree.txt"));
    let contents = render(graph, format)?;
    std::fs::write(&path, contents)?;
    tracing::info!("Wrote {}", path.display());
    Ok(path)
}
