//! Indented terminal rendering.
//!
//! ```text
//! foo /proj/a.c:4:5
//!     |
//!     |______ bar /proj/b.c:2:5
//!
//! ```

use crate::callgraph::CallGraph;

const BRANCH: &str = "\t|";
const LEAF: &str = "\t|______ ";

/// One block per merged caller, separated by blank lines.
pub fn render(graph: &CallGraph) -> String {
    let mut out = String::new();
    for entry in graph.export() {
        out.push_str(&format!("{}\n", entry.caller));
        for callee in &entry.callees {
            out.push_str(BRANCH);
            out.push('\n');
            out.push_str(&format!("{}{}\n", LEAF, callee));
        }
        out.push('\n');
    }
    out
}
