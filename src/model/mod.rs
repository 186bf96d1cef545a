//! Step records: the structured result of extracting one phase.
//!
//! JSON shape (one element of the output array):
//! {
//!   "template": "transfer",
//!   "sources": [{ "well": "A1", "labware": "Reservoir", "slot": 1 }],
//!   "targets": [{ "well": "A1", "labware": "Plate", "slot": 3 }],
//!   "tip_racks": [{ "well": "A1", "type": "Rack", "slot": 6 }],
//!   "asp_vols": 21.5,                // scalar until merged, then a list
//!   "asp_flow_rates": [92.86],
//!   ...
//! }
//!
//! Module-tagged variants flatten the shared transfer fields and add their
//! own flags next to them.

use serde::{Deserialize, Serialize};

/// A well inside a labware item on a deck slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerRef {
    pub well: String,
    pub labware: String,
    pub slot: u32,
}

/// The tip rack a tip was picked up from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TipRackRef {
    pub well: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub slot: u32,
}

/// Volumes stay scalar for a single phase and become a list once merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Volumes {
    Single(f64),
    Many(Vec<f64>),
}

impl Default for Volumes {
    fn default() -> Self {
        Volumes::Many(Vec::new())
    }
}

impl Volumes {
    pub fn into_vec(self) -> Vec<f64> {
        match self {
            Volumes::Single(v) => vec![v],
            Volumes::Many(v) => v,
        }
    }

    /// Append another record's volumes, coercing `self` to a list first.
    pub fn extend(&mut self, other: Volumes) {
        let mut all = std::mem::take(self).into_vec();
        all.extend(other.into_vec());
        *self = Volumes::Many(all);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MixStage {
    #[default]
    None,
    Before,
    After,
    Both,
}

impl MixStage {
    /// Fold one more mixing observation into the stage seen so far.
    pub fn observe(self, seen: MixStage) -> MixStage {
        match (self, seen) {
            (MixStage::None, s) => s,
            (s, MixStage::None) => s,
            (a, b) if a == b => a,
            _ => MixStage::Both,
        }
    }
}

/// Fields shared by every liquid-transfer template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferParams {
    pub sources: Vec<ContainerRef>,
    pub targets: Vec<ContainerRef>,
    pub tip_racks: Vec<TipRackRef>,
    pub asp_vols: Volumes,
    pub disp_vols: Volumes,
    /// One entry per extracted phase; `None` when no rate was logged.
    pub asp_flow_rates: Vec<Option<f64>>,
    pub dis_flow_rates: Vec<Option<f64>>,
    pub touch_tip: bool,
    pub blow_out_air_volume: Vec<f64>,
    pub is_96_well: bool,
    pub mix_stage: MixStage,
    pub mix_times: Vec<u32>,
    pub mix_vol: Option<f64>,
    pub mix_rate: Option<f64>,
    /// Seconds, truncated toward zero.
    pub delays: Vec<u32>,
}

impl Default for TransferParams {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            targets: Vec::new(),
            tip_racks: Vec::new(),
            asp_vols: Volumes::default(),
            disp_vols: Volumes::default(),
            asp_flow_rates: Vec::new(),
            dis_flow_rates: Vec::new(),
            touch_tip: false,
            blow_out_air_volume: vec![0.0],
            is_96_well: false,
            mix_stage: MixStage::None,
            mix_times: Vec::new(),
            mix_vol: None,
            mix_rate: None,
            delays: Vec::new(),
        }
    }
}

impl TransferParams {
    pub fn is_complete(&self) -> bool {
        !self.sources.is_empty() && !self.targets.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeaterShakerParams {
    pub target_temperature: Option<f64>,
    pub wait_for_temp: bool,
    pub shake_speed: Option<f64>,
    pub duration_minutes: Option<u32>,
    pub deactivate_heater: bool,
    pub deactivate_shaker: bool,
}

/// One extracted operation, tagged by its template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "template", rename_all = "snake_case")]
pub enum StepRecord {
    Transfer(TransferParams),
    TransferWithTemperature {
        #[serde(flatten)]
        transfer: TransferParams,
        temperature_target: f64,
        temperature_deactivate: bool,
    },
    TransferWithMagnetic {
        #[serde(flatten)]
        transfer: TransferParams,
        magnetic_engage: bool,
        magnetic_delay_minutes: Option<u32>,
        magnetic_disengage: bool,
    },
    HeaterShaker(HeaterShakerParams),
}

/// Template discriminant, used in merge keys and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Template {
    Transfer,
    TransferWithTemperature,
    TransferWithMagnetic,
    HeaterShaker,
}

impl Template {
    pub fn as_str(&self) -> &'static str {
        match self {
            Template::Transfer => "transfer",
            Template::TransferWithTemperature => "transfer_with_temperature",
            Template::TransferWithMagnetic => "transfer_with_magnetic",
            Template::HeaterShaker => "heater_shaker",
        }
    }
}

impl std::fmt::Display for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StepRecord {
    pub fn template(&self) -> Template {
        match self {
            StepRecord::Transfer(_) => Template::Transfer,
            StepRecord::TransferWithTemperature { .. } => Template::TransferWithTemperature,
            StepRecord::TransferWithMagnetic { .. } => Template::TransferWithMagnetic,
            StepRecord::HeaterShaker(_) => Template::HeaterShaker,
        }
    }

    pub fn transfer(&self) -> Option<&TransferParams> {
        match self {
            StepRecord::Transfer(t)
            | StepRecord::TransferWithTemperature { transfer: t, .. }
            | StepRecord::TransferWithMagnetic { transfer: t, .. } => Some(t),
            StepRecord::HeaterShaker(_) => None,
        }
    }

    pub fn transfer_mut(&mut self) -> Option<&mut TransferParams> {
        match self {
            StepRecord::Transfer(t)
            | StepRecord::TransferWithTemperature { transfer: t, .. }
            | StepRecord::TransferWithMagnetic { transfer: t, .. } => Some(t),
            StepRecord::HeaterShaker(_) => None,
        }
    }

    /// True when the template carries module flags next to the transfer.
    pub fn is_module_tagged(&self) -> bool {
        !matches!(self, StepRecord::Transfer(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn mix_stage_folds_to_both() {
        assert_eq!(MixStage::None.observe(MixStage::Before), MixStage::Before);
        assert_eq!(MixStage::Before.observe(MixStage::Before), MixStage::Before);
        assert_eq!(MixStage::Before.observe(MixStage::After), MixStage::Both);
        assert_eq!(MixStage::After.observe(MixStage::None), MixStage::After);
    }

    #[test]
    fn volumes_extend_coerces_scalar() {
        let mut v = Volumes::Single(10.0);
        v.extend(Volumes::Single(20.0));
        assert_eq!(v, Volumes::Many(vec![10.0, 20.0]));
    }

    #[test]
    fn serializes_template_tag_and_flattened_fields() {
        let rec = StepRecord::TransferWithTemperature {
            transfer: TransferParams::default(),
            temperature_target: 4.0,
            temperature_deactivate: true,
        };
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["template"], "transfer_with_temperature");
        assert_eq!(json["temperature_target"], 4.0);
        assert_eq!(json["blow_out_air_volume"], serde_json::json!([0.0]));
        assert_eq!(json["mix_stage"], "none");
        assert_eq!(json["asp_vols"], serde_json::json!([]));
    }

    #[test]
    fn heater_shaker_round_trips_through_json() {
        let rec = StepRecord::HeaterShaker(HeaterShakerParams {
            target_temperature: Some(37.0),
            wait_for_temp: true,
            shake_speed: Some(200.0),
            duration_minutes: Some(60),
            deactivate_heater: true,
            deactivate_shaker: false,
        });
        let text = serde_json::to_string(&rec).unwrap();
        let back: StepRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(back, rec);
        assert_eq!(back.template(), Template::HeaterShaker);
    }
}
