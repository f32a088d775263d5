//! `calltree.json`: the merged call tree as `{"calltree": [...]}`.

use crate::callgraph::CallGraph;
use crate::Result;

/// Pretty-printed JSON document.
pub fn render(graph: &CallGraph) -> Result<String> {
    Ok(serde_json::to_string_pretty(&graph.to_document())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExportedCallTree, SymbolRecord};

    #[test]
    fn empty_graph_is_empty_calltree() {
        let json = render(&CallGraph::new("/proj")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value, serde_json::json!({"calltree": []}));
    }

    #[test]
    fn document_reads_back() {
        let mut graph = CallGraph::new("/proj");
        let main = SymbolRecord::new("main", "/proj/main.c", 3, 5);
        graph.add(main.clone(), SymbolRecord::new("init", "/proj/init.c", 1, 6));
        graph.add(main.clone(), SymbolRecord::new("run", "/proj/run.c", 8, 6));

        let parsed: ExportedCallTree = serde_json::from_str(&render(&graph).unwrap()).unwrap();
        assert_eq!(parsed, graph.to_document());
        assert_eq!(parsed.calltree[0].caller, main);
        assert_eq!(parsed.calltree[0].callees.len(), 2);
    }
}
