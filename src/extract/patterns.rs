//! Compiled text patterns for field extraction.
//!
//! The log is not a formal grammar, so every helper here returns `Option` and a
//! miss simply leaves the field at its default.

use crate::Result;
use crate::model::{ContainerRef, TipRackRef};
use regex::{Captures, Regex};

// Volume / rate keywords: first number after the keyword.
const ASPIRATING_VOLUME_RE: &str = r"Aspirating ([\d.]+)";
const DISPENSING_VOLUME_RE: &str = r"Dispensing ([\d.]+)";
const TRANSFERRING_VOLUME_RE: &str = r"Transferring ([\d.]+)";
const AT_VALUE_RE: &str = r"\bat ([\d.]+)";
const TO_VALUE_RE: &str = r"\bto ([\d.]+)";

// Capture: well, labware, slot (the trailing rate only anchors the match).
const ASPIRATE_FROM_RE: &str =
    r"Aspirating [\d.]+ uL .*?from ([A-P]\d+) of (.*?) on (\d+).*?at ([\d.]+) uL/sec";
const ASPIRATE_INTO_RE: &str =
    r"Aspirating [\d.]+ uL .*?into ([A-P]\d+) of (.*?) on (\d+).*?at ([\d.]+) uL/sec";
const DISPENSE_FROM_RE: &str =
    r"Dispensing [\d.]+ uL .*?from ([A-P]\d+) of (.*?) on (\d+).*?at ([\d.]+) uL/sec";
const DISPENSE_INTO_RE: &str =
    r"Dispensing [\d.]+ uL .*?into ([A-P]\d+) of (.*?) on (\d+).*?at ([\d.]+) uL/sec";

const ASPIRATE_RATE_RE: &str = r"Aspirating.*?\bat ([\d.]+)";
const DISPENSE_RATE_RE: &str = r"Dispensing.*?\bat ([\d.]+)";

// "Transferring V from W of L on S to W of L on S" (head line only).
const TRANSFER_HEAD_RE: &str =
    r"^Transferring [\d.]+ from ([A-P]\d+) of (.*?) on (\d+) to ([A-P]\d+) of (.*?) on (\d+)";

const TIP_PICKUP_RE: &str = r"Picking up tip from ([A-P]\d+) of (.*?) on (\d+)";
const MIX_RE: &str = r"Mixing (\d+) times.*?(\d+\.?\d*)";
const DELAY_SECONDS_RE: &str = r"Delaying for \d+ minutes and ([\d.]+)";
const DELAY_MINUTES_RE: &str = r"Delaying for (\d+) minutes";
const SHAKE_SPEED_RE: &str = r"Shake at ([\d.]+) RPM";

/// Which liquid action a container pattern is anchored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Aspirating,
    Dispensing,
}

#[derive(Debug, Clone)]
pub struct Patterns {
    aspirating_volume: Regex,
    dispensing_volume: Regex,
    transferring_volume: Regex,
    at_value: Regex,
    to_value: Regex,
    aspirate_from: Regex,
    aspirate_into: Regex,
    dispense_from: Regex,
    dispense_into: Regex,
    aspirate_rate: Regex,
    dispense_rate: Regex,
    transfer_head: Regex,
    tip_pickup: Regex,
    mix: Regex,
    delay_seconds: Regex,
    delay_minutes: Regex,
    shake_speed: Regex,
}

impl Patterns {
    pub fn new() -> Result<Self> {
        Ok(Self {
            aspirating_volume: Regex::new(ASPIRATING_VOLUME_RE)?,
            dispensing_volume: Regex::new(DISPENSING_VOLUME_RE)?,
            transferring_volume: Regex::new(TRANSFERRING_VOLUME_RE)?,
            at_value: Regex::new(AT_VALUE_RE)?,
            to_value: Regex::new(TO_VALUE_RE)?,
            aspirate_from: Regex::new(ASPIRATE_FROM_RE)?,
            aspirate_into: Regex::new(ASPIRATE_INTO_RE)?,
            dispense_from: Regex::new(DISPENSE_FROM_RE)?,
            dispense_into: Regex::new(DISPENSE_INTO_RE)?,
            aspirate_rate: Regex::new(ASPIRATE_RATE_RE)?,
            dispense_rate: Regex::new(DISPENSE_RATE_RE)?,
            transfer_head: Regex::new(TRANSFER_HEAD_RE)?,
            tip_pickup: Regex::new(TIP_PICKUP_RE)?,
            mix: Regex::new(MIX_RE)?,
            delay_seconds: Regex::new(DELAY_SECONDS_RE)?,
            delay_minutes: Regex::new(DELAY_MINUTES_RE)?,
            shake_speed: Regex::new(SHAKE_SPEED_RE)?,
        })
    }

    /// Volume logged right after the action keyword.
    pub fn volume(&self, text: &str, action: Action) -> Option<f64> {
        let re = match action {
            Action::Aspirating => &self.aspirating_volume,
            Action::Dispensing => &self.dispensing_volume,
        };
        float_group(re, text, 1)
    }

    pub fn transferring_volume(&self, text: &str) -> Option<f64> {
        float_group(&self.transferring_volume, text, 1)
    }

    /// First "at N" in the text; used for flow and mix rates.
    pub fn rate(&self, text: &str) -> Option<f64> {
        float_group(&self.at_value, text, 1)
    }

    /// First "to N" in the text; used for module temperatures.
    pub fn to_value(&self, text: &str) -> Option<f64> {
        float_group(&self.to_value, text, 1)
    }

    /// Rate after the given action inside a combined transfer line.
    pub fn action_rate(&self, text: &str, action: Action) -> Option<f64> {
        let re = match action {
            Action::Aspirating => &self.aspirate_rate,
            Action::Dispensing => &self.dispense_rate,
        };
        float_group(re, text, 1)
    }

    /// Container touched by an action, trying the `from` form then `into`.
    pub fn container(&self, text: &str, action: Action) -> Option<ContainerRef> {
        let (from, into) = match action {
            Action::Aspirating => (&self.aspirate_from, &self.aspirate_into),
            Action::Dispensing => (&self.dispense_from, &self.dispense_into),
        };
        let caps = from.captures(text).or_else(|| into.captures(text))?;
        container_at(&caps, 1)
    }

    /// Source and target spelled out on a "Transferring" head line.
    pub fn transfer_head(&self, head: &str) -> Option<(ContainerRef, ContainerRef)> {
        let caps = self.transfer_head.captures(head)?;
        Some((container_at(&caps, 1)?, container_at(&caps, 4)?))
    }

    /// Last tip pick-up in the text.
    pub fn tip_rack(&self, text: &str) -> Option<TipRackRef> {
        let caps = self.tip_pickup.captures_iter(text).last()?;
        Some(TipRackRef {
            well: caps.get(1)?.as_str().to_string(),
            kind: caps.get(2)?.as_str().trim().to_string(),
            slot: caps.get(3)?.as_str().parse().ok()?,
        })
    }

    /// (times, volume) from a "Mixing N times ... V" line.
    pub fn mix(&self, text: &str) -> Option<(u32, f64)> {
        let caps = self.mix.captures(text)?;
        let times = caps.get(1)?.as_str().parse().ok()?;
        let volume = caps.get(2)?.as_str().parse().ok()?;
        Some((times, volume))
    }

    /// Seconds part of a delay, truncated toward zero.
    pub fn delay_seconds(&self, text: &str) -> Option<u32> {
        float_group(&self.delay_seconds, text, 1).map(|s| s.trunc() as u32)
    }

    pub fn delay_minutes(&self, text: &str) -> Option<u32> {
        self.delay_minutes
            .captures(text)?
            .get(1)?
            .as_str()
            .parse()
            .ok()
    }

    pub fn shake_speed(&self, text: &str) -> Option<f64> {
        float_group(&self.shake_speed, text, 1)
    }
}

fn float_group(re: &Regex, text: &str, group: usize) -> Option<f64> {
    re.captures(text)?.get(group)?.as_str().parse().ok()
}

/// Read (well, labware, slot) starting at capture group `first`.
fn container_at(caps: &Captures<'_>, first: usize) -> Option<ContainerRef> {
    Some(ContainerRef {
        well: caps.get(first)?.as_str().to_string(),
        labware: caps.get(first + 1)?.as_str().trim().to_string(),
        slot: caps.get(first + 2)?.as_str().parse().ok()?,
    })
}
