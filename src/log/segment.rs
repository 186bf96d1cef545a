//! Phase segmentation.
//!
//! The robot logs one pick-up / aspirate / dispense / drop cycle per physical
//! tip, and module operations as standalone blocks. The segmenter is a small
//! state machine over normalized lines:
//!
//! | state            | line                          | action                 | next             |
//! |------------------|-------------------------------|------------------------|------------------|
//! | any              | module start, phase non-empty | close phase            | `Idle`           |
//! | `Idle`           | cycle start                   | -                      | `InLiquidCycle`  |
//! | `InLiquidCycle`  | cycle start                   | close phase            | `InLiquidCycle`  |
//! | any              | cycle start, heater-shaker    | close phase            | `InLiquidCycle`  |
//! | any              | anything else                 | -                      | unchanged        |
//!
//! Every line is appended to the current phase after the transition.

use crate::log::line::{HEATER_SHAKER_MARKER, LogLine, Phase};
use tracing::debug;

const PICK_UP_TIP: &str = "Picking up tip";
const STAGE_MOVE: &str = "Moving to";
const TRANSFERRING: &str = "Transferring";
const ASPIRATING: &str = "Aspirating";

/// Lines that always open a module cycle.
const MODULE_START: &[&str] = &[
    "Setting Temperature Module temperature",
    "Engaging Magnetic Module",
    "Setting Target Temperature of Heater-Shaker",
];

/// Opens a module cycle unless the current phase is already a heater-shaker block.
const SHAKE_START: &str = "Setting Heater-Shaker to Shake";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SegmentState {
    /// No tip cycle has started in the current phase.
    #[default]
    Idle,
    InLiquidCycle,
}

#[derive(Debug, Default)]
pub struct Segmenter {
    state: SegmentState,
    current: Vec<LogLine>,
    last_line: String,
    phases: Vec<Phase>,
}

impl Segmenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SegmentState {
        self.state
    }

    pub fn push(&mut self, line: &LogLine) {
        let raw = line.raw.as_str();

        if self.is_module_start(raw) && !self.current.is_empty() {
            self.close_phase();
            self.state = SegmentState::Idle;
        }

        if starts_tip_cycle(raw, &self.last_line) {
            // A heater-shaker block never absorbs a following tip cycle.
            if self.state == SegmentState::InLiquidCycle || self.current_is_heater_shaker() {
                self.close_phase();
            }
            self.state = SegmentState::InLiquidCycle;
        }

        self.current.push(line.clone());
        self.last_line = line.raw.clone();
    }

    pub fn finish(mut self) -> Vec<Phase> {
        self.close_phase();
        debug!(phases = self.phases.len(), "segmented log");
        self.phases
    }

    fn is_module_start(&self, raw: &str) -> bool {
        if MODULE_START.iter().any(|p| raw.contains(p)) {
            return true;
        }
        raw.contains(SHAKE_START) && !self.current_is_heater_shaker()
    }

    fn current_is_heater_shaker(&self) -> bool {
        self.current
            .iter()
            .any(|l| l.raw.contains(HEATER_SHAKER_MARKER))
    }

    fn close_phase(&mut self) {
        if let Some(phase) = Phase::from_lines(std::mem::take(&mut self.current)) {
            self.phases.push(phase);
        }
    }
}

/// A new tip cycle starts on a tip pick-up, on a stage move not directly after
/// a pick-up, or on an aspirate that does not follow a pick-up, move or transfer.
fn starts_tip_cycle(raw: &str, last: &str) -> bool {
    let bare_aspirate = raw.starts_with(ASPIRATING)
        && !last.contains(PICK_UP_TIP)
        && !last.contains(STAGE_MOVE)
        && !last.contains(TRANSFERRING);

    bare_aspirate
        || raw.contains(PICK_UP_TIP)
        || (raw.contains(STAGE_MOVE) && !last.contains(PICK_UP_TIP))
}

/// Cut normalized lines into phases.
pub fn segment(lines: &[LogLine]) -> Vec<Phase> {
    let mut seg = Segmenter::new();
    for line in lines {
        seg.push(line);
    }
    seg.finish()
}
