use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Character offsets `[start, end)` into the owning chunk's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChemicalEntity {
    pub id: String,
    pub text: String,
    pub canonical_id: Option<String>,
    pub entity_type: String, // "monomer", "polymer", "composite", "additive", ...
    pub span: Span,
    pub context_id: String,
    pub page: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormulaKind {
    Reaction,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaEntity {
    pub id: String,
    pub latex: String,
    pub context_id: String,
    pub page: usize,
    #[serde(rename = "type")]
    pub kind: FormulaKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionRelation {
    pub id: String,
    pub reactants: Vec<String>, // ChemicalEntity ids, deduplicated
    pub products: Vec<String>,
    pub conditions: BTreeMap<String, serde_json::Value>,
    pub formula_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyFunction {
    pub id: String,
    pub formula_id: String,
    pub target_property: String,
    pub variables: BTreeSet<String>,
    pub context_id: String,
}
