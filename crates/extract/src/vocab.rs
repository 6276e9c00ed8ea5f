//! Matching vocabularies for the formula extractors.
//!
//! Everything here is built from configuration so the heuristics can be tuned
//! per domain without touching the extractors.

use regex::Regex;

use crate::error::VocabError;

pub const DEFAULT_ARROW_MARKERS: &[&str] = &[r"\rightarrow", r"\to", r"\leftrightarrow"];

/// Property symbols in match priority order.
pub const DEFAULT_PROPERTY_SYMBOLS: &[&str] = &[
    "M_n", "M_w", "M_w/M_n", "T_g", "T_m", "T_c", "G'", "G''", "E'", "E''", r"\eta", "D", "k",
];

/// A single letter, or a letter with an underscore subscript.
pub const DEFAULT_VARIABLE_PATTERN: &str = r"[A-Za-z]_\w+|[A-Za-z]";

fn literal_union<S: AsRef<str>>(what: &'static str, literals: &[S]) -> Result<Regex, VocabError> {
    if literals.is_empty() {
        return Err(VocabError::Empty(what));
    }
    let union = literals
        .iter()
        .map(|l| regex::escape(l.as_ref()))
        .collect::<Vec<_>>()
        .join("|");
    Ok(Regex::new(&union)?)
}

/// Reaction arrow markers.
#[derive(Debug, Clone)]
pub struct ArrowMarkers {
    pattern: Regex,
}

impl ArrowMarkers {
    pub fn new<S: AsRef<str>>(markers: &[S]) -> Result<Self, VocabError> {
        Ok(Self {
            pattern: literal_union("arrow marker", markers)?,
        })
    }

    pub fn is_match(&self, latex: &str) -> bool {
        self.pattern.is_match(latex)
    }

    /// Text before the first arrow and between the first and second arrow.
    pub fn split_sides<'a>(&self, latex: &'a str) -> Option<(&'a str, &'a str)> {
        let mut parts = self.pattern.splitn(latex, 3);
        let lhs = parts.next()?;
        let rhs = parts.next()?;
        Some((lhs, rhs))
    }
}

impl Default for ArrowMarkers {
    fn default() -> Self {
        Self {
            pattern: literal_union("arrow marker", DEFAULT_ARROW_MARKERS)
                .expect("default arrow markers are valid"),
        }
    }
}

/// Recognized material-property symbols.
#[derive(Debug, Clone)]
pub struct PropertySymbols {
    pattern: Regex,
}

impl PropertySymbols {
    pub fn new<S: AsRef<str>>(symbols: &[S]) -> Result<Self, VocabError> {
        Ok(Self {
            pattern: literal_union("property symbol", symbols)?,
        })
    }

    /// Leftmost symbol occurrence; earlier vocabulary entries win ties.
    pub fn first_in<'a>(&self, text: &'a str) -> Option<&'a str> {
        self.pattern.find(text).map(|m| m.as_str())
    }
}

impl Default for PropertySymbols {
    fn default() -> Self {
        Self {
            pattern: literal_union("property symbol", DEFAULT_PROPERTY_SYMBOLS)
                .expect("default property symbols are valid"),
        }
    }
}

/// Candidate variable symbols on the right-hand side of an equation.
#[derive(Debug, Clone)]
pub struct VariablePattern {
    pattern: Regex,
}

impl VariablePattern {
    pub fn new(pattern: &str) -> Result<Self, VocabError> {
        if pattern.is_empty() {
            return Err(VocabError::Empty("variable pattern"));
        }
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn find_all<'a>(&self, text: &'a str) -> impl Iterator<Item = &'a str> {
        self.pattern.find_iter(text).map(|m| m.as_str())
    }
}

impl Default for VariablePattern {
    fn default() -> Self {
        Self {
            pattern: Regex::new(DEFAULT_VARIABLE_PATTERN).expect("default variable pattern is valid"),
        }
    }
}
