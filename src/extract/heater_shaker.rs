use crate::extract::patterns::Patterns;
use crate::log::Phase;
use crate::model::{HeaterShakerParams, StepRecord};

/// Single pass over a heater-shaker block.
pub fn extract_heater_shaker(patterns: &Patterns, phase: &Phase) -> StepRecord {
    let mut hs = HeaterShakerParams::default();

    for line in phase.lines() {
        let head = line.head();
        if head.starts_with("Setting Target Temperature of Heater-Shaker") {
            hs.target_temperature = patterns.to_value(head);
        } else if head.starts_with("Waiting for Heater-Shaker") {
            hs.wait_for_temp = true;
        } else if head.starts_with("Setting Heater-Shaker to Shake at") {
            hs.shake_speed = patterns.shake_speed(head);
        } else if head.starts_with("Delaying") {
            hs.duration_minutes = patterns.delay_minutes(head);
        } else if head.starts_with("Deactivating Heater") {
            hs.deactivate_heater = true;
        } else if head.starts_with("Deactivating Shaker") {
            hs.deactivate_shaker = true;
        }
    }

    StepRecord::HeaterShaker(hs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::LogLine;
    use pretty_assertions::assert_eq;

    #[test]
    fn full_heater_shaker_block() {
        let phase = Phase::from_lines(
            [
                "Setting Target Temperature of Heater-Shaker to 37 °C",
                "Waiting for Heater-Shaker to reach target temperature",
                "Setting Heater-Shaker to Shake at 200 RPM and waiting until reached",
                "Delaying for 60 minutes and 0.0 seconds",
                "Deactivating Heater",
                "Deactivating Shaker",
            ]
            .iter()
            .map(|r| LogLine::new(*r))
            .collect(),
        )
        .unwrap();

        let rec = extract_heater_shaker(&Patterns::new().unwrap(), &phase);
        assert_eq!(
            rec,
            StepRecord::HeaterShaker(HeaterShakerParams {
                target_temperature: Some(37.0),
                wait_for_temp: true,
                shake_speed: Some(200.0),
                duration_minutes: Some(60),
                deactivate_heater: true,
                deactivate_shaker: true,
            })
        );
    }

    #[test]
    fn missing_lines_leave_defaults() {
        let phase =
            Phase::from_lines(vec![LogLine::new("Waiting for Heater-Shaker to reach target")])
                .unwrap();
        let StepRecord::HeaterShaker(hs) = extract_heater_shaker(&Patterns::new().unwrap(), &phase)
        else {
            panic!("expected heater-shaker record");
        };
        assert!(hs.wait_for_temp);
        assert_eq!(hs.target_temperature, None);
        assert_eq!(hs.shake_speed, None);
    }
}
