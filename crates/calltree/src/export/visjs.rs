//! `calltree_visjs.json`: nodes and edges for a vis-network graph.
//!
//! Files sharing a stem (`util.c`, `util.h`) collapse into one module node.
//! Every function hangs off its module through a grey containment edge; calls
//! are red curved edges.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::callgraph::CallGraph;
use crate::{Result, SymbolRecord};

const MODULE_BACKGROUND: &str = "#f8f9fa";
const FUNCTION_BACKGROUND: &str = "#e6f3ff";
const BORDER: &str = "#4a90e2";
const CONTAINS_EDGE: &str = "#888888";
const CALL_EDGE: &str = "#ff4444";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisGraph {
    pub nodes: Vec<VisNode>,
    pub edges: Vec<VisEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisNode {
    pub id: String,
    pub label: String,
    /// `module` or `function`
    pub group: String,
    pub shape: String,
    pub color: NodeColor,
    pub font: Font,
    pub size: u32,
    /// Module id of a function node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeColor {
    pub background: String,
    pub border: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Font {
    pub size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisEdge {
    pub from: String,
    pub to: String,
    pub arrows: String,
    pub color: EdgeColor,
    pub smooth: Smooth,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeColor {
    pub color: String,
}

/// vis-network accepts either a flag or a curve description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Smooth {
    Enabled(bool),
    Curve {
        #[serde(rename = "type")]
        kind: String,
        roundness: f32,
    },
}

impl VisGraph {
    /// Lay out the merged call tree as module and function nodes.
    pub fn from_graph(graph: &CallGraph) -> Self {
        let mut builder = VisBuilder::new(graph);
        for entry in graph.export() {
            let caller = builder.function(&entry.caller);
            for callee in &entry.callees {
                let callee = builder.function(callee);
                builder.graph.edges.push(VisEdge {
                    from: caller.clone(),
                    to: callee,
                    arrows: "to".to_string(),
                    color: EdgeColor {
                        color: CALL_EDGE.to_string(),
                    },
                    smooth: Smooth::Curve {
                        kind: "curvedCW".to_string(),
                        roundness: 0.5,
                    },
                    width: Some(2),
                });
            }
        }
        builder.graph
    }
}

struct VisBuilder<'g> {
    source: &'g CallGraph,
    graph: VisGraph,
    /// stem -> module id
    modules: HashMap<String, String>,
    /// (file, name) -> function node id
    functions: HashMap<(PathBuf, String), String>,
    /// Every function id handed out so far
    taken: HashSet<String>,
}

impl<'g> VisBuilder<'g> {
    fn new(source: &'g CallGraph) -> Self {
        Self {
            source,
            graph: VisGraph::default(),
            modules: HashMap::new(),
            functions: HashMap::new(),
            taken: HashSet::new(),
        }
    }

    /// Module node id for `file`, adding the node on first sight.
    fn module(&mut self, file: &Path) -> String {
        let stem = file_stem(file);
        if let Some(id) = self.modules.get(&stem) {
            return id.clone();
        }

        let id = format!("module_{}", stem);
        let shown = self.source.scope().relative(file).unwrap_or(file);
        self.graph.nodes.push(VisNode {
            id: id.clone(),
            label: format!("Module: {}\n({})", stem, shown.display()),
            group: "module".to_string(),
            shape: "box".to_string(),
            color: NodeColor {
                background: MODULE_BACKGROUND.to_string(),
                border: BORDER.to_string(),
            },
            font: Font {
                size: 14,
                color: Some("#333".to_string()),
            },
            size: 50,
            parent: None,
        });
        self.modules.insert(stem, id.clone());
        id
    }

    /// Function node id for `symbol`, adding the node and its containment edge once.
    fn function(&mut self, symbol: &SymbolRecord) -> String {
        let key = (symbol.file.clone(), symbol.name.clone());
        if let Some(id) = self.functions.get(&key) {
            return id.clone();
        }

        // Sanitizing can map distinct paths (`a_b.c`, `a/b.c`) to one id
        let base = function_id(symbol);
        let mut id = base.clone();
        let mut suffix = 2;
        while self.taken.contains(&id) {
            id = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        self.taken.insert(id.clone());
        self.functions.insert(key, id.clone());

        let module = self.module(&symbol.file);
        self.graph.nodes.push(VisNode {
            id: id.clone(),
            label: symbol.name.clone(),
            group: "function".to_string(),
            shape: "box".to_string(),
            color: NodeColor {
                background: FUNCTION_BACKGROUND.to_string(),
                border: BORDER.to_string(),
            },
            font: Font {
                size: 12,
                color: None,
            },
            size: 30,
            parent: Some(module.clone()),
        });
        self.graph.edges.push(VisEdge {
            from: module,
            to: id.clone(),
            arrows: "to".to_string(),
            color: EdgeColor {
                color: CONTAINS_EDGE.to_string(),
            },
            smooth: Smooth::Enabled(true),
            width: None,
        });
        id
    }
}

/// File name up to its first `.`: `util.c` and `util.h` share `util`.
fn file_stem(file: &Path) -> String {
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.split_once('.') {
        Some((stem, _)) => stem.to_string(),
        None => name,
    }
}

/// `func_<file with separators and dots replaced>_<name>`, unique per file.
fn function_id(symbol: &SymbolRecord) -> String {
    let file: String = symbol
        .file
        .to_string_lossy()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("func_{}_{}", file, symbol.name)
}

/// Serialized payload, pretty-printed.
pub fn render(graph: &CallGraph) -> Result<String> {
    Ok(serde_json::to_string_pretty(&VisGraph::from_graph(graph))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CallGraph {
        let mut graph = CallGraph::new("/proj");
        let main = SymbolRecord::new("main", "/proj/main.c", 3, 5);
        let util = SymbolRecord::new("util", "/proj/util.c", 1, 5);
        let helper = SymbolRecord::new("helper", "/proj/util.h", 2, 19);
        graph.add(main.clone(), util.clone());
        graph.add(main, helper.clone());
        graph.add(util, helper);
        graph
    }

    fn ids<'a>(vis: &'a VisGraph, group: &str) -> Vec<&'a str> {
        vis.nodes
            .iter()
            .filter(|n| n.group == group)
            .map(|n| n.id.as_str())
            .collect()
    }

    #[test]
    fn modules_collapse_by_stem() {
        let vis = VisGraph::from_graph(&sample());
        assert_eq!(ids(&vis, "module"), vec!["module_main", "module_util"]);

        let util_module = vis.nodes.iter().find(|n| n.id == "module_util").unwrap();
        assert_eq!(util_module.label, "Module: util\n(util.c)");
    }

    #[test]
    fn functions_are_unique_and_parented() {
        let vis = VisGraph::from_graph(&sample());
        let functions = ids(&vis, "function");
        assert_eq!(functions.len(), 3);
        assert!(functions.contains(&"func__proj_util_h_helper"));

        for node in vis.nodes.iter().filter(|n| n.group == "function") {
            let parent = node.parent.as_deref().unwrap();
            assert!(vis.nodes.iter().any(|m| m.id == parent));
        }
    }

    #[test]
    fn one_containment_edge_per_function_and_one_edge_per_call() {
        let vis = VisGraph::from_graph(&sample());
        let containment = vis
            .edges
            .iter()
            .filter(|e| e.smooth == Smooth::Enabled(true))
            .count();
        let calls = vis.edges.iter().filter(|e| e.width == Some(2)).count();
        assert_eq!(containment, 3);
        assert_eq!(calls, 3);
    }

    #[test]
    fn serializes_vis_network_shape() {
        let mut graph = CallGraph::new("/proj");
        graph.add(
            SymbolRecord::new("foo", "/proj/a.c", 1, 5),
            SymbolRecord::new("bar", "/proj/b.c", 1, 5),
        );
        let value: serde_json::Value = serde_json::from_str(&render(&graph).unwrap()).unwrap();

        let call = value["edges"]
            .as_array()
            .unwrap()
            .iter()
            .find(|e| e["width"] == 2)
            .unwrap();
        assert_eq!(call["from"], "func__proj_a_c_foo");
        assert_eq!(call["to"], "func__proj_b_c_bar");
        assert_eq!(call["smooth"]["type"], "curvedCW");
        assert_eq!(value["nodes"][0]["id"], "module_a");
        assert!(value["nodes"][0].get("parent").is_none());
    }

    #[test]
    fn colliding_sanitized_paths_get_distinct_ids() {
        let mut graph = CallGraph::new("/proj");
        let main = SymbolRecord::new("main", "/proj/main.c", 1, 5);
        graph.add(main.clone(), SymbolRecord::new("f", "/proj/a_b.c", 1, 5));
        graph.add(main, SymbolRecord::new("f", "/proj/a/b.c", 1, 5));

        let vis = VisGraph::from_graph(&graph);
        let functions = ids(&vis, "function");
        assert_eq!(
            functions,
            vec!["func__proj_main_c_main", "func__proj_a_b_c_f", "func__proj_a_b_c_f_2"]
        );

        let call_targets: Vec<_> = vis
            .edges
            .iter()
            .filter(|e| e.width == Some(2))
            .map(|e| e.to.as_str())
            .collect();
        assert_eq!(call_targets, vec!["func__proj_a_b_c_f", "func__proj_a_b_c_f_2"]);
    }

    #[test]
    fn empty_graph_has_no_nodes() {
        let vis = VisGraph::from_graph(&CallGraph::new("/proj"));
        assert!(vis.nodes.is_empty());
        assert!(vis.edges.is_empty());
    }
}
