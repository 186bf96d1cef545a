//! Field extraction: one phase in, one `StepRecord` out.
//!
//! Phases mentioning the heater-shaker go to the heater-shaker branch, all
//! others to the liquid-transfer branch. Nothing here fails on unmatched text.

pub mod heater_shaker;
pub mod patterns;
pub mod transfer;

pub use patterns::{Action, Patterns};
pub use transfer::is_full_row;

use crate::Result;
use crate::log::Phase;
use crate::model::StepRecord;

#[derive(Debug, Clone)]
pub struct Extractor {
    patterns: Patterns,
}

impl Extractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            patterns: Patterns::new()?,
        })
    }

    pub fn extract(&self, phase: &Phase) -> StepRecord {
        if phase.is_heater_shaker() {
            heater_shaker::extract_heater_shaker(&self.patterns, phase)
        } else {
            transfer::extract_transfer(&self.patterns, phase)
        }
    }
}
