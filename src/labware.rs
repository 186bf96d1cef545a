//! Labware descriptor document and the resource nodes built from it.
//!
//! JSON shape:
//! {
//!   "labware": [
//!     { "name": "reservoir", "slot": "1", "type": "agilent_1_reservoir_290ml" },
//!     { "name": "pcr_plate", "slot": 3,   "type": "biorad_96_wellplate_200ul_pcr" }
//!   ]
//! }
//!
//! `slot` may be a number or a numeric string. Other keys are ignored.

use crate::Result;
use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct LabwareDocument {
    #[serde(default)]
    pub labware: Vec<RawLabware>,
}

/// Labware entry as it appears in the descriptor.
#[derive(Debug, Clone, Deserialize)]
pub struct RawLabware {
    pub name: String,
    pub slot: SlotSpec,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SlotSpec {
    Number(u32),
    Text(String),
}

impl SlotSpec {
    fn resolve(&self) -> Result<u32> {
        match self {
            SlotSpec::Number(n) => Ok(*n),
            SlotSpec::Text(s) => s
                .trim()
                .parse()
                .with_context(|| format!("slot is not an integer: {:?}", s)),
        }
    }
}

/// One physical labware item on the deck.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceNode {
    pub id: String,
    pub parent: String,
    pub slot_on_deck: u32,
    pub class_name: String,
    pub liquid_type: Vec<String>,
    pub liquid_volume: Vec<f64>,
    pub liquid_input_wells: Vec<String>,
}

impl ResourceNode {
    pub fn on_deck(id: impl Into<String>, slot: u32, class_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent: "deck".to_string(),
            slot_on_deck: slot,
            class_name: class_name.into(),
            liquid_type: Vec::new(),
            liquid_volume: Vec::new(),
            liquid_input_wells: Vec::new(),
        }
    }
}

impl LabwareDocument {
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("parse labware descriptor")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read labware file {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("bad labware file {}", path.display()))
    }

    /// Resolve slots and check names are unique, keeping document order.
    pub fn validate_and_build(&self) -> Result<Vec<ResourceNode>> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::with_capacity(self.labware.len());

        for raw in &self.labware {
            if raw.name.is_empty() {
                bail!("labware entry without a name");
            }
            if is_step_id(&raw.name) {
                bail!("labware name collides with a step node id: {}", raw.name);
            }
            if !seen.insert(raw.name.as_str()) {
                bail!("duplicate labware name in descriptor: {}", raw.name);
            }
            let slot = raw
                .slot
                .resolve()
                .with_context(|| format!("labware {}", raw.name))?;
            out.push(ResourceNode::on_deck(raw.name.clone(), slot, raw.kind.clone()));
        }

        Ok(out)
    }
}

/// Graph step nodes are named `step_<n>`.
fn is_step_id(name: &str) -> bool {
    name.strip_prefix("step_")
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}
