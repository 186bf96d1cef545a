use crate::log::line::{LogLine, SUBSTEP_INDENT};
use tracing::debug;

/// Line prefixes that never carry a protocol instruction.
pub const EXCLUDED_PREFIXES: &[&str] = &[
    "/Users",
    "Congratulations!",
    "Caught exception:",
    "Deck calibration",
    "WARNING",
    "Protocol complete",
    "Seal and shake",
    "Pausing robot operation",
    "TRANSFERRING",
    "Centrifuge",
];

/// Turns raw log text into an ordered list of instruction lines.
///
/// Indented detail lines (eight spaces or a tab) are folded into the line
/// above them. Banners, headers, dividers and filesystem paths are dropped.
/// Anything else is kept verbatim.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    extra_prefixes: Vec<String>,
}

/// A head line plus the indented lines folded under it.
struct Unit<'a> {
    head: &'a str,
    substeps: Vec<&'a str>,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extend the built-in exclusion set; the built-ins always apply.
    pub fn with_extra_prefixes(prefixes: &[String]) -> Self {
        Self {
            extra_prefixes: prefixes.iter().filter(|p| !p.is_empty()).cloned().collect(),
        }
    }

    pub fn normalize(&self, text: &str) -> Vec<LogLine> {
        let units = fold_substeps(text);
        let total = units.len();

        let out: Vec<LogLine> = units
            .into_iter()
            .filter_map(|u| self.keep(u))
            .collect();

        debug!(units = total, kept = out.len(), "normalized log");
        out
    }

    fn keep(&self, unit: Unit<'_>) -> Option<LogLine> {
        let mut parts: Vec<&str> = std::iter::once(unit.head)
            .chain(unit.substeps)
            .map(str::trim)
            .collect();
        // A blank head promotes its first detail line.
        if parts[0].is_empty() {
            parts.remove(0);
        }
        let head = *parts.first()?;
        if head.is_empty() {
            return None;
        }

        if head.starts_with("~~") || self.is_excluded(head) {
            return None;
        }
        // Section dividers and headers; checked across the whole folded unit.
        if parts.iter().any(|p| p.contains("--")) {
            return None;
        }
        if parts.last().is_some_and(|p| p.ends_with(':')) {
            return None;
        }

        Some(LogLine::new(parts.join(&format!("\n{}", SUBSTEP_INDENT))))
    }

    fn is_excluded(&self, head: &str) -> bool {
        EXCLUDED_PREFIXES.iter().any(|p| head.starts_with(p))
            || self.extra_prefixes.iter().any(|p| head.starts_with(p.as_str()))
    }
}

fn is_continuation(line: &str) -> bool {
    line.starts_with(SUBSTEP_INDENT) || line.starts_with('\t')
}

fn fold_substeps(text: &str) -> Vec<Unit<'_>> {
    let mut units: Vec<Unit<'_>> = Vec::new();
    for line in text.lines() {
        if is_continuation(line) {
            match units.last_mut() {
                Some(u) => u.substeps.push(line),
                None => units.push(Unit {
                    head: "",
                    substeps: vec![line],
                }),
            }
        } else {
            units.push(Unit {
                head: line,
                substeps: Vec::new(),
            });
        }
    }
    units
}
