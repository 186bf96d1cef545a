use crate::log::line::LogLine;

/// Delimiters applied in order; each split is independent of the others.
pub const PREPOSITIONS: &[&str] = &[" from ", " to ", " on ", " of ", " into "];

/// An instruction line together with its preposition-split tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub raw: String,
    pub tokens: Vec<String>,
}

/// Split a line on `PREPOSITIONS`, keeping left-to-right token order.
///
/// Informational only; extraction matches patterns on the raw text.
pub fn tokenize(line: &LogLine) -> ParsedLine {
    let mut tokens: Vec<&str> = vec![line.raw.as_str()];
    for prep in PREPOSITIONS {
        tokens = tokens.into_iter().flat_map(|t| t.split(prep)).collect();
    }

    ParsedLine {
        raw: line.raw.clone(),
        tokens: tokens
            .into_iter()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
    }
}
