//! Acyclicity check and ordering for a built protocol graph.
//!
//! The builder only adds edges from earlier nodes to the node being created,
//! so the graph is acyclic by construction; this verifies it after the fact.

use crate::Result;
use crate::graph::ProtocolGraph;
use anyhow::{Context, bail};
use std::collections::BTreeMap;

#[derive(Copy, Clone, PartialEq, Eq)]
enum Mark {
    Temp,
    Perm,
}

impl ProtocolGraph {
    /// Node ids with no incoming edges, in node order.
    pub fn roots(&self) -> Vec<String> {
        self.nodes()
            .iter()
            .map(|n| n.id().to_string())
            .filter(|id| self.edges_into(id).next().is_none())
            .collect()
    }

    /// Node ids in an order where every edge points forward.
    pub fn topological_order(&self) -> Result<Vec<String>> {
        let mut children: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for e in self.edges() {
            children
                .entry(e.source.as_str())
                .or_default()
                .push(e.target.as_str());
        }

        fn dfs<'a>(
            v: &'a str,
            children: &BTreeMap<&'a str, Vec<&'a str>>,
            marks: &mut BTreeMap<&'a str, Mark>,
            stack: &mut Vec<&'a str>,
            post: &mut Vec<String>,
        ) -> Result<()> {
            match marks.get(v) {
                Some(Mark::Perm) => return Ok(()),
                Some(Mark::Temp) => {
                    // v is on the current path => cycle
                    stack.push(v);
                    bail!("cycle detected in protocol graph: {}", stack.join(" -> "));
                }
                None => {}
            }

            marks.insert(v, Mark::Temp);
            stack.push(v);
            if let Some(kids) = children.get(v) {
                for k in kids {
                    dfs(*k, children, marks, stack, post)?;
                }
            }
            stack.pop();
            marks.insert(v, Mark::Perm);
            post.push(v.to_string());
            Ok(())
        }

        let mut marks = BTreeMap::new();
        let mut stack = Vec::new();
        let mut post = Vec::with_capacity(self.nodes().len());
        for node in self.nodes() {
            stack.clear();
            dfs(node.id(), &children, &mut marks, &mut stack, &mut post)
                .with_context(|| format!("cycle check failed starting at {}", node.id()))?;
        }

        post.reverse();
        Ok(post)
    }
}
