/// Indentation the robot uses for detail lines under an instruction.
pub const SUBSTEP_INDENT: &str = "        ";

/// Substring that routes a phase to the heater-shaker extractor.
pub const HEATER_SHAKER_MARKER: &str = "Heater-Shaker";

/// One normalized instruction.
///
/// `raw` keeps folded substeps joined by a newline plus `SUBSTEP_INDENT`, so a
/// "Transferring" line still carries its "Aspirating"/"Dispensing" details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub raw: String,
    pub is_indented_substep: bool,
}

impl LogLine {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            is_indented_substep: false,
        }
    }

    pub fn substep(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            is_indented_substep: true,
        }
    }

    /// The instruction itself, without folded substeps.
    pub fn head(&self) -> &str {
        self.raw.lines().next().unwrap_or("")
    }

    /// Split a folded unit back into one line per physical log line.
    pub fn physical_lines(&self) -> Vec<LogLine> {
        self.raw
            .lines()
            .enumerate()
            .map(|(i, l)| LogLine {
                raw: l.trim().to_string(),
                is_indented_substep: self.is_indented_substep || i > 0,
            })
            .collect()
    }
}

/// A contiguous, non-empty run of lines describing one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phase {
    lines: Vec<LogLine>,
}

impl Phase {
    /// `None` for an empty line list; phases are never zero-length.
    pub fn from_lines(lines: Vec<LogLine>) -> Option<Self> {
        if lines.is_empty() {
            None
        } else {
            Some(Self { lines })
        }
    }

    pub fn lines(&self) -> &[LogLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn is_heater_shaker(&self) -> bool {
        self.lines
            .iter()
            .any(|l| l.raw.contains(HEATER_SHAKER_MARKER))
    }
}
