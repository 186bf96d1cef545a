//! Protocol graph: resource nodes plus one node per step, with edges recording
//! which node last wrote each deck slot.
//!
//! Construction walks the steps in order and keeps a `slot -> last writer`
//! map. Every read of a slot adds an edge from its current writer before the
//! writer is updated. Tip racks are read but never become a writer.

pub mod dag;

use crate::labware::ResourceNode;
use crate::model::StepRecord;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceTemplate {
    CreateResource,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GraphNode {
    Resource {
        template: ResourceTemplate,
        #[serde(flatten)]
        resource: ResourceNode,
    },
    Step {
        id: String,
        #[serde(flatten)]
        record: StepRecord,
    },
}

impl GraphNode {
    pub fn id(&self) -> &str {
        match self {
            GraphNode::Resource { resource, .. } => &resource.id,
            GraphNode::Step { id, .. } => id,
        }
    }

    pub fn is_resource(&self) -> bool {
        matches!(self, GraphNode::Resource { .. })
    }
}

/// `target` consumes what `source` produced at the named ports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub source_port: String,
    pub target_port: String,
}

#[derive(Debug, Clone, Default)]
pub struct ProtocolGraph {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    index: BTreeMap<String, usize>,
}

/// Node-link document: `{directed, multigraph, graph, nodes, edges}`.
#[derive(Debug, Serialize)]
pub struct NodeLink<'a> {
    pub directed: bool,
    pub multigraph: bool,
    pub graph: serde_json::Map<String, serde_json::Value>,
    pub nodes: &'a [GraphNode],
    pub edges: &'a [GraphEdge],
}

impl ProtocolGraph {
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn edges_into<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges.iter().filter(move |e| e.target == id)
    }

    pub fn edges_from<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges.iter().filter(move |e| e.source == id)
    }

    pub fn add_resource(&mut self, resource: ResourceNode) {
        self.push_node(GraphNode::Resource {
            template: ResourceTemplate::CreateResource,
            resource,
        });
    }

    pub fn add_step(&mut self, id: String, record: StepRecord) {
        self.push_node(GraphNode::Step { id, record });
    }

    pub fn add_edge(&mut self, edge: GraphEdge) {
        self.edges.push(edge);
    }

    fn push_node(&mut self, node: GraphNode) {
        self.index.insert(node.id().to_string(), self.nodes.len());
        self.nodes.push(node);
    }

    pub fn to_node_link(&self) -> NodeLink<'_> {
        NodeLink {
            directed: true,
            multigraph: false,
            graph: serde_json::Map::new(),
            nodes: &self.nodes,
            edges: &self.edges,
        }
    }
}

/// Slot bookkeeping used while the graph is being built.
struct SlotWriters {
    last: BTreeMap<u32, String>,
    resources: BTreeSet<String>,
}

impl SlotWriters {
    /// Edge from the slot's writer to `reader`; `None` if unknown or self.
    fn read(&self, slot: u32, reader: &str, port: &str) -> Option<GraphEdge> {
        let writer = self.last.get(&slot)?;
        if writer == reader {
            return None;
        }
        let source_port = if self.resources.contains(writer) {
            "labware".to_string()
        } else {
            format!("{}_out", port)
        };
        Some(GraphEdge {
            source: writer.clone(),
            target: reader.to_string(),
            source_port,
            target_port: port.to_string(),
        })
    }

    fn write(&mut self, slot: u32, writer: &str) {
        self.last.insert(slot, writer.to_string());
    }
}

fn distinct_slots(slots: impl Iterator<Item = u32>) -> Vec<u32> {
    let mut seen = BTreeSet::new();
    slots.filter(|s| seen.insert(*s)).collect()
}

/// Slot of the heater-shaker module, found by name among the resources.
fn heater_shaker_slot(resources: &[ResourceNode]) -> Option<u32> {
    resources
        .iter()
        .find(|r| {
            let class = r.class_name.to_ascii_lowercase();
            let id = r.id.to_ascii_lowercase();
            class.contains("heater") || id.contains("heater")
        })
        .map(|r| r.slot_on_deck)
}

pub fn build_protocol_graph(resources: &[ResourceNode], steps: &[StepRecord]) -> ProtocolGraph {
    let mut graph = ProtocolGraph::default();
    let mut writers = SlotWriters {
        last: BTreeMap::new(),
        resources: BTreeSet::new(),
    };

    for r in resources {
        if let Some(prev) = writers.last.get(&r.slot_on_deck) {
            debug!(slot = r.slot_on_deck, replaced = %prev, by = %r.id, "several resources on one slot");
        }
        writers.write(r.slot_on_deck, &r.id);
        writers.resources.insert(r.id.clone());
        graph.add_resource(r.clone());
    }

    let hs_slot = heater_shaker_slot(resources);

    for (i, step) in steps.iter().enumerate() {
        let id = format!("step_{}", i + 1);
        let mut edges = Vec::new();

        match step.transfer() {
            Some(t) => {
                let ports = [
                    ("sources", distinct_slots(t.sources.iter().map(|c| c.slot)), true),
                    ("targets", distinct_slots(t.targets.iter().map(|c| c.slot)), true),
                    ("tip_racks", distinct_slots(t.tip_racks.iter().map(|c| c.slot)), false),
                ];
                for (port, slots, writes) in ports {
                    for slot in slots {
                        edges.extend(writers.read(slot, &id, port));
                        if writes {
                            writers.write(slot, &id);
                        }
                    }
                }
            }
            None => {
                if let Some(slot) = hs_slot {
                    if let Some(mut e) = writers.read(slot, &id, "plate") {
                        e.source_port = "plate".to_string();
                        edges.push(e);
                    }
                    writers.write(slot, &id);
                }
            }
        }

        graph.add_step(id, step.clone());
        for e in edges {
            graph.add_edge(e);
        }
    }

    info!(
        nodes = graph.nodes().len(),
        edges = graph.edges().len(),
        "built protocol graph"
    );
    graph
}
