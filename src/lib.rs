//! Recover a structured liquid-handling protocol from a robot execution log.
//!
//! Pipeline, each stage consuming the previous one:
//! 1) `log::normalize`  raw text -> instruction lines
//! 2) `log::tokenize`   instruction line -> preposition tokens
//! 3) `log::segment`    lines -> phases (tip cycles / module cycles)
//! 4) `extract`         phase -> StepRecord
//! 5) `merge`           adjacent fragments -> logical operations
//! 6) `graph`           records + labware -> resource-flow DAG

pub mod config;
pub mod extract;
pub mod graph;
pub mod labware;
pub mod log;
pub mod merge;
pub mod model;
pub mod render;

pub use config::{MergePolicy, PipelineConfig};
pub use extract::Extractor;
pub use graph::{ProtocolGraph, build_protocol_graph};
pub use labware::{LabwareDocument, ResourceNode};
pub use model::StepRecord;

pub type Result<T> = anyhow::Result<T>;

/// Run stages 1-5 over a full log text and return the merged step records.
pub fn parse_protocol_log(text: &str, config: &PipelineConfig) -> Result<Vec<StepRecord>> {
    let normalizer = log::Normalizer::with_extra_prefixes(&config.extra_excluded_prefixes);
    let lines = normalizer.normalize(text);
    let phases = log::segment(&lines);

    let extractor = Extractor::new()?;
    let records: Vec<StepRecord> = phases.iter().map(|p| extractor.extract(p)).collect();

    Ok(merge::merge_phases(records, config.merge_policy))
}
