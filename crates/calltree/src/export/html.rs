//! `calltree.html`: a standalone vis-network page with the payload inlined.

use crate::callgraph::CallGraph;
use crate::export::visjs::VisGraph;
use crate::Result;

const TEMPLATE: &str = include_str!("calltree.html");
const PLACEHOLDER: &str = "JSON_DATA_TO_REPLACE";

pub fn render(graph: &CallGraph) -> Result<String> {
    let payload = serde_json::to_string(&VisGraph::from_graph(graph))?;
    // A literal `</script>` inside a string would close the inline script
    let payload = payload.replace("</", "<\\/");
    Ok(TEMPLATE.replace(PLACEHOLDER, &payload))
}
