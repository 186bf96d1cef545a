//! Output rendering: JSON documents for steps and graph, text for phases.

use crate::Result;
use crate::graph::ProtocolGraph;
use crate::log::{Phase, tokenize};
use crate::model::StepRecord;
use std::fmt::Write;

/// Pretty JSON array of step records.
pub fn render_steps_json(steps: &[StepRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(steps)?)
}

/// Pretty node-link JSON for the protocol graph.
pub fn render_graph_json(graph: &ProtocolGraph) -> Result<String> {
    Ok(serde_json::to_string_pretty(&graph.to_node_link())?)
}

/// Numbered phase listing, optionally with each line's preposition tokens.
pub fn render_phases(phases: &[Phase], with_tokens: bool) -> Result<String> {
    let mut out = String::new();
    for (i, phase) in phases.iter().enumerate() {
        writeln!(out, "Phase {}", i + 1)?;
        for line in phase.lines() {
            for part in line.physical_lines() {
                let indent = if part.is_indented_substep { "      " } else { "  " };
                writeln!(out, "{}{}", indent, part.raw)?;
            }
            if with_tokens {
                let parsed = tokenize(line);
                writeln!(out, "    tokens: {}", parsed.tokens.join(" | "))?;
            }
        }
    }
    Ok(out)
}
