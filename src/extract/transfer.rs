use crate::extract::patterns::{Action, Patterns};
use crate::log::{LogLine, Phase};
use crate::model::{MixStage, StepRecord, TransferParams, Volumes};
use std::collections::BTreeSet;
use tracing::warn;

/// Line indices that drive mix-stage classification.
#[derive(Debug, Default)]
struct Landmarks {
    aspirate: Option<usize>,
    dispense: Option<usize>,
    mixing: Vec<usize>,
}

/// Module commands found next to liquid lines in the same phase.
#[derive(Debug, Default)]
struct ModuleFlags {
    temperature_target: Option<f64>,
    temperature_deactivate: bool,
    magnetic_engage: bool,
    magnetic_delay_minutes: Option<u32>,
    magnetic_disengage: bool,
}

/// Extract a liquid-transfer phase into one of the transfer templates.
pub fn extract_transfer(patterns: &Patterns, phase: &Phase) -> StepRecord {
    let lines: Vec<(usize, &LogLine)> = phase
        .lines()
        .iter()
        .enumerate()
        .filter(|(_, l)| !l.is_indented_substep)
        .collect();

    // Pass 1: landmarks and tip rack.
    let mut marks = Landmarks::default();
    let mut params = TransferParams::default();
    for &(i, line) in &lines {
        let head = line.head();
        if is_aspirate(head) {
            marks.aspirate.get_or_insert(i);
        }
        if is_dispense(head) {
            marks.dispense.get_or_insert(i);
        }
        if head.starts_with("Mixing") {
            marks.mixing.push(i);
        }
        if let Some(tip) = patterns.tip_rack(&line.raw) {
            params.tip_racks = vec![tip];
        }
    }
    params.mix_stage = classify_mix_stage(&marks);

    // Pass 2: values.
    let mut asp_vols = Vec::new();
    let mut disp_vols = Vec::new();
    let mut flags = ModuleFlags::default();
    for &(_, line) in &lines {
        let raw = line.raw.as_str();
        let head = line.head();

        if raw.contains("Touching tip") {
            params.touch_tip = true;
        }

        if is_aspirate(head) {
            asp_vols.extend(patterns.volume(raw, Action::Aspirating));
            params.sources.extend(patterns.container(raw, Action::Aspirating));
            params.asp_flow_rates.push(patterns.rate(raw));
        } else if is_dispense(head) {
            disp_vols.extend(patterns.volume(raw, Action::Dispensing));
            params.targets.extend(patterns.container(raw, Action::Dispensing));
            params.dis_flow_rates.push(patterns.rate(raw));
        } else if head.starts_with("Transferring") {
            let leading = patterns.transferring_volume(head);
            asp_vols.extend(patterns.volume(raw, Action::Aspirating).or(leading));
            disp_vols.extend(patterns.volume(raw, Action::Dispensing).or(leading));

            let spelled = patterns.transfer_head(head);
            let source = patterns
                .container(raw, Action::Aspirating)
                .or_else(|| spelled.as_ref().map(|(s, _)| s.clone()));
            let target = patterns
                .container(raw, Action::Dispensing)
                .or_else(|| spelled.map(|(_, t)| t));
            params.sources.extend(source);
            params.targets.extend(target);

            params
                .asp_flow_rates
                .push(patterns.action_rate(raw, Action::Aspirating));
            params
                .dis_flow_rates
                .push(patterns.action_rate(raw, Action::Dispensing));
        } else if head.starts_with("Setting Temperature Module temperature") {
            flags.temperature_target = patterns.to_value(head);
        } else if head.starts_with("Deactivating Temperature Module") {
            flags.temperature_deactivate = true;
        } else if head.starts_with("Engaging Magnetic Module") {
            flags.magnetic_engage = true;
        } else if head.starts_with("Disengaging Magnetic Module") {
            flags.magnetic_disengage = true;
        } else if head.starts_with("Delaying") && flags.magnetic_engage && !flags.magnetic_disengage
        {
            flags.magnetic_delay_minutes = patterns.delay_minutes(head);
        } else if head.starts_with("Air gap") {
            params.blow_out_air_volume =
                vec![patterns.volume(raw, Action::Aspirating).unwrap_or(0.0)];
        } else if head.starts_with("Mixing") {
            if let Some((times, volume)) = patterns.mix(head) {
                params.mix_times = vec![times];
                params.mix_vol = Some(volume);
                // The rate sits on the folded aspirate detail, not the head.
                params.mix_rate = patterns.rate(raw);
            }
        } else if head.starts_with("Delaying") {
            params.delays.extend(patterns.delay_seconds(head));
        }
    }

    params.asp_vols = collect_volumes(asp_vols);
    params.disp_vols = collect_volumes(disp_vols);
    params.is_96_well = is_96_well(&params);

    resolve_template(params, flags)
}

fn is_aspirate(head: &str) -> bool {
    head.starts_with("Aspirating") && head.contains("from")
}

fn is_dispense(head: &str) -> bool {
    head.starts_with("Dispensing") && head.contains("into")
}

fn classify_mix_stage(marks: &Landmarks) -> MixStage {
    marks.mixing.iter().fold(MixStage::None, |stage, &idx| {
        if marks.aspirate.is_some_and(|a| idx < a) {
            stage.observe(MixStage::Before)
        } else if marks.dispense.is_some_and(|d| idx > d) {
            stage.observe(MixStage::After)
        } else {
            stage
        }
    })
}

fn collect_volumes(mut vols: Vec<f64>) -> Volumes {
    if vols.len() == 1 {
        Volumes::Single(vols.remove(0))
    } else {
        Volumes::Many(vols)
    }
}

/// Magnetic flags win over a temperature target.
fn resolve_template(params: TransferParams, flags: ModuleFlags) -> StepRecord {
    let record = if flags.magnetic_engage || flags.magnetic_disengage {
        StepRecord::TransferWithMagnetic {
            transfer: params,
            magnetic_engage: flags.magnetic_engage,
            magnetic_delay_minutes: flags.magnetic_delay_minutes,
            magnetic_disengage: flags.magnetic_disengage,
        }
    } else if let Some(target) = flags.temperature_target {
        StepRecord::TransferWithTemperature {
            transfer: params,
            temperature_target: target,
            temperature_deactivate: flags.temperature_deactivate,
        }
    } else {
        StepRecord::Transfer(params)
    };

    if let StepRecord::Transfer(t) = &record {
        if !t.is_complete() {
            warn!(
                sources = t.sources.len(),
                targets = t.targets.len(),
                "transfer phase without both sources and targets"
            );
        }
    }
    record
}

fn is_96_well(params: &TransferParams) -> bool {
    let sources: Vec<&str> = params.sources.iter().map(|c| c.well.as_str()).collect();
    let targets: Vec<&str> = params.targets.iter().map(|c| c.well.as_str()).collect();
    is_full_row(&sources) && is_full_row(&targets)
}

/// True iff the wells cover one complete row: same row letter, columns 1-12.
pub fn is_full_row(wells: &[&str]) -> bool {
    if wells.len() < 12 {
        return false;
    }
    let mut row = None;
    let mut columns = BTreeSet::new();
    for well in wells {
        let mut chars = well.chars();
        let Some(letter) = chars.next() else {
            return false;
        };
        if *row.get_or_insert(letter) != letter {
            return false;
        }
        match chars.as_str().parse::<u32>() {
            Ok(col) => {
                columns.insert(col);
            }
            Err(_) => return false,
        }
    }
    columns.len() == 12 && columns.iter().copied().eq(1..=12)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ContainerRef;
    use pretty_assertions::assert_eq;

    fn phase(raw: &[&str]) -> Phase {
        Phase::from_lines(raw.iter().map(|r| LogLine::new(*r)).collect()).unwrap()
    }

    fn extract(raw: &[&str]) -> StepRecord {
        extract_transfer(&Patterns::new().unwrap(), &phase(raw))
    }

    fn row(letter: char, cols: std::ops::RangeInclusive<u32>) -> Vec<String> {
        cols.map(|c| format!("{}{}", letter, c)).collect()
    }

    fn refs(v: &[String]) -> Vec<&str> {
        v.iter().map(String::as_str).collect()
    }

    #[test]
    fn full_row_detection() {
        assert!(is_full_row(&refs(&row('A', 1..=12))));
        assert!(!is_full_row(&refs(&row('A', 1..=11))));

        let mut mixed = row('A', 1..=11);
        mixed.push("B12".into());
        assert!(!is_full_row(&refs(&mixed)));

        let mut dup = row('A', 1..=12);
        dup.push("A3".into());
        assert!(is_full_row(&refs(&dup)));
    }

    #[test]
    fn separate_aspirate_and_dispense_lines() {
        let rec = extract(&[
            "Picking up tip from A1 of Rack on 6",
            "Aspirating 50.0 uL from A1 of Reservoir on 1 at 46.43 uL/sec",
            "Dispensing 50.0 uL into B2 of Plate on 3 at 92.86 uL/sec",
            "Dropping tip into A1 of Trash on 12",
        ]);
        let StepRecord::Transfer(t) = rec else {
            panic!("expected plain transfer");
        };
        assert_eq!(t.asp_vols, Volumes::Single(50.0));
        assert_eq!(t.disp_vols, Volumes::Single(50.0));
        assert_eq!(t.asp_flow_rates, vec![Some(46.43)]);
        assert_eq!(t.dis_flow_rates, vec![Some(92.86)]);
        assert_eq!(
            t.targets,
            vec![ContainerRef {
                well: "B2".into(),
                labware: "Plate".into(),
                slot: 3
            }]
        );
        assert_eq!(t.tip_racks[0].slot, 6);
        assert_eq!(t.tip_racks[0].kind, "Rack");
    }

    #[test]
    fn transferring_head_alone_falls_back_to_spelled_containers() {
        let rec = extract(&["Transferring 12.0 from A1 of Tube Rack on 4 to D6 of Plate on 5"]);
        let t = rec.transfer().unwrap();
        assert_eq!(t.asp_vols, Volumes::Single(12.0));
        assert_eq!(t.disp_vols, Volumes::Single(12.0));
        assert_eq!(t.sources[0].slot, 4);
        assert_eq!(t.targets[0].well, "D6");
        assert_eq!(t.asp_flow_rates, vec![None]);
    }

    #[test]
    fn mix_stage_before_after_and_both() {
        let before = extract(&[
            "Mixing 3 times with a volume of 20.0 ul",
            "Aspirating 5.0 uL from A1 of P on 1 at 1.0 uL/sec",
            "Dispensing 5.0 uL into A1 of Q on 2 at 1.0 uL/sec",
        ]);
        assert_eq!(before.transfer().unwrap().mix_stage, MixStage::Before);
        assert_eq!(before.transfer().unwrap().mix_times, vec![3]);
        assert_eq!(before.transfer().unwrap().mix_vol, Some(20.0));

        let after = extract(&[
            "Aspirating 5.0 uL from A1 of P on 1 at 1.0 uL/sec",
            "Dispensing 5.0 uL into A1 of Q on 2 at 1.0 uL/sec",
            "Mixing 2 times with a volume of 10.0 ul",
        ]);
        assert_eq!(after.transfer().unwrap().mix_stage, MixStage::After);

        let both = extract(&[
            "Mixing 3 times with a volume of 20.0 ul",
            "Aspirating 5.0 uL from A1 of P on 1 at 1.0 uL/sec",
            "Dispensing 5.0 uL into A1 of Q on 2 at 1.0 uL/sec",
            "Mixing 2 times with a volume of 10.0 ul",
        ]);
        assert_eq!(both.transfer().unwrap().mix_stage, MixStage::Both);
        // A combined transfer line is not an aspirate or dispense landmark.
        let around_transfer = extract(&[
            "Picking up tip from A1 of Rack on 6",
            "Transferring 5.0 from A1 of P on 1 to A1 of Q on 2\n        Aspirating 5.0 uL from A1 of P on 1 at 1.0 uL/sec\n        Dispensing 5.0 uL into A1 of Q on 2 at 1.0 uL/sec",
            "Mixing 2 times with a volume of 10.0 ul",
            "Dropping tip into A1 of Trash on 12",
        ]);
        assert_eq!(around_transfer.transfer().unwrap().mix_stage, MixStage::None);
    }

    #[test]
    fn mix_rate_comes_from_folded_details() {
        let rec = extract(&[
            "Mixing 3 times with a volume of 50.0 ul\n        Aspirating 50.0 uL from A1 of P on 1 at 137.35 uL/sec\n        Dispensing 50.0 uL into A1 of P on 1 at 137.35 uL/sec",
            "Aspirating 5.0 uL from A1 of P on 1 at 1.0 uL/sec",
            "Dispensing 5.0 uL into A1 of Q on 2 at 1.0 uL/sec",
        ]);
        let t = rec.transfer().unwrap();
        assert_eq!(t.mix_times, vec![3]);
        assert_eq!(t.mix_vol, Some(50.0));
        assert_eq!(t.mix_rate, Some(137.35));
        assert_eq!(t.mix_stage, MixStage::Before);
        assert_eq!(t.asp_vols, Volumes::Single(5.0));
    }

    #[test]
    fn air_gap_touch_tip_and_delay() {
        let rec = extract(&[
            "Aspirating 5.0 uL from A1 of P on 1 at 1.0 uL/sec",
            "Air gap\n        Aspirating 10.0 uL from A1 of P on 1 at 1.0 uL/sec",
            "Dispensing 5.0 uL into A1 of Q on 2 at 1.0 uL/sec",
            "Touching tip",
            "Delaying for 0 minutes and 2.7 seconds",
        ]);
        let t = rec.transfer().unwrap();
        assert_eq!(t.blow_out_air_volume, vec![10.0]);
        assert!(t.touch_tip);
        assert_eq!(t.delays, vec![2]);
    }

    #[test]
    fn magnetic_beats_temperature() {
        let rec = extract(&[
            "Setting Temperature Module temperature to 4.0 °C (rounded off to nearest integer)",
            "Engaging Magnetic Module",
            "Aspirating 5.0 uL from A1 of P on 1 at 1.0 uL/sec",
            "Dispensing 5.0 uL into A1 of Q on 2 at 1.0 uL/sec",
        ]);
        assert!(matches!(rec, StepRecord::TransferWithMagnetic { .. }));
    }

    #[test]
    fn magnetic_delay_is_not_a_generic_delay() {
        let rec = extract(&[
            "Engaging Magnetic Module",
            "Delaying for 5 minutes and 0.0 seconds",
            "Disengaging Magnetic Module",
            "Delaying for 0 minutes and 3.0 seconds",
        ]);
        let StepRecord::TransferWithMagnetic {
            transfer,
            magnetic_engage,
            magnetic_delay_minutes,
            magnetic_disengage,
        } = rec
        else {
            panic!("expected magnetic transfer");
        };
        assert!(magnetic_engage && magnetic_disengage);
        assert_eq!(magnetic_delay_minutes, Some(5));
        assert_eq!(transfer.delays, vec![3]);
        assert!(!transfer.is_complete());
    }

    #[test]
    fn temperature_template() {
        let rec = extract(&[
            "Setting Temperature Module temperature to 4.0 °C (rounded off to nearest integer)",
            "Picking up tip from A1 of Rack on 6",
            "Transferring 21.5 from A1 of Reservoir on 1 to A1 of Plate on 3\n        Aspirating 21.5 uL from A1 of Reservoir on 1 at 92.86 uL/sec\n        Dispensing 21.5 uL into A1 of Plate on 3 at 92.86 uL/sec",
            "Deactivating Temperature Module",
        ]);
        let StepRecord::TransferWithTemperature {
            transfer,
            temperature_target,
            temperature_deactivate,
        } = rec
        else {
            panic!("expected temperature transfer");
        };
        assert_eq!(temperature_target, 4.0);
        assert!(temperature_deactivate);
        assert_eq!(transfer.sources[0].labware, "Reservoir");
    }

    #[test]
    fn unmatched_text_degrades_to_defaults() {
        let rec = extract(&["Homing the robot", "Something unexpected"]);
        assert_eq!(rec, StepRecord::Transfer(TransferParams::default()));
    }

    #[test]
    fn full_row_transfer_is_96_well() {
        let mut lines = Vec::new();
        for c in 1..=12 {
            lines.push(format!("Aspirating 5.0 uL from A{c} of P on 1 at 1.0 uL/sec"));
            lines.push(format!("Dispensing 5.0 uL into A{c} of Q on 2 at 1.0 uL/sec"));
        }
        let rec = extract(&refs(&lines));
        let t = rec.transfer().unwrap();
        assert!(t.is_96_well);
        assert_eq!(t.asp_vols, Volumes::Many(vec![5.0; 12]));
    }
}
