//! Phase merging.
//!
//! The driver logs one tip cycle per channel even for a single multichannel
//! operation. Adjacent records with an identical `MergeKey` are folded into the
//! first of them; merging is strictly adjacent and never reorders records.

use crate::config::MergePolicy;
use crate::model::{MixStage, StepRecord, Template, TransferParams};
use tracing::debug;

/// Spatial and modal context two fragments must share to be merged.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeKey {
    pub template: Template,
    pub source_slot: u32,
    pub target_slot: u32,
    pub mix_stage: MixStage,
    pub is_96_well: bool,
    pub touch_tip: bool,
    pub blow_out_air_volume: f64,
}

/// `None` for records that can never merge (heater-shaker, incomplete transfers).
pub fn merge_key(record: &StepRecord) -> Option<MergeKey> {
    let t = record.transfer()?;
    Some(MergeKey {
        template: record.template(),
        source_slot: t.sources.first()?.slot,
        target_slot: t.targets.first()?.slot,
        mix_stage: t.mix_stage,
        is_96_well: t.is_96_well,
        touch_tip: t.touch_tip,
        blow_out_air_volume: t.blow_out_air_volume.first().copied().unwrap_or(0.0),
    })
}

/// Append `other`'s list-valued fields to `into`, in order.
pub fn extend_transfer(into: &mut TransferParams, other: TransferParams) {
    into.asp_vols.extend(other.asp_vols);
    into.disp_vols.extend(other.disp_vols);
    into.sources.extend(other.sources);
    into.targets.extend(other.targets);
    into.tip_racks.extend(other.tip_racks);
    into.asp_flow_rates.extend(other.asp_flow_rates);
    into.dis_flow_rates.extend(other.dis_flow_rates);
    into.blow_out_air_volume.extend(other.blow_out_air_volume);
    into.delays.extend(other.delays);
}

pub fn merge_phases(records: Vec<StepRecord>, policy: MergePolicy) -> Vec<StepRecord> {
    let total = records.len();
    let mut out: Vec<StepRecord> = Vec::with_capacity(total);
    let mut last_key: Option<MergeKey> = None;
    let mut dropped = 0usize;

    for mut record in records {
        let Some(key) = merge_key(&record) else {
            if policy == MergePolicy::DropIncomplete && !record.is_module_tagged() {
                dropped += 1;
                continue;
            }
            out.push(record);
            last_key = None;
            continue;
        };

        if last_key.as_ref() == Some(&key) {
            if let (Some(head), Some(fragment)) = (
                out.last_mut().and_then(StepRecord::transfer_mut),
                record.transfer_mut(),
            ) {
                extend_transfer(head, std::mem::take(fragment));
                continue;
            }
        }

        out.push(record);
        last_key = Some(key);
    }

    debug!(
        records = total,
        merged = out.len(),
        dropped,
        ?policy,
        "merged phases"
    );
    out
}
