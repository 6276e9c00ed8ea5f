use ingest::{formula_body, new_id};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use crate::schema::{FormulaEntity, PropertyFunction};
use crate::vocab::{PropertySymbols, VariablePattern};

static EQUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^(.*?)\s*=\s*(.*)$").expect("static regex"));

/// Detects formulas of the form `property = f(variables)`.
#[derive(Debug, Clone, Default)]
pub struct FunctionExtractor {
    properties: PropertySymbols,
    variables: VariablePattern,
}

impl FunctionExtractor {
    pub fn new(properties: PropertySymbols, variables: VariablePattern) -> Self {
        Self {
            properties,
            variables,
        }
    }

    pub fn extract(&self, formula: &FormulaEntity) -> Option<PropertyFunction> {
        let body = formula_body(&formula.latex);
        let caps = EQUATION.captures(body)?;
        let (lhs, rhs) = (caps.get(1)?.as_str(), caps.get(2)?.as_str());

        let target = self.properties.first_in(lhs)?;
        let variables: BTreeSet<String> = self.variables.find_all(rhs).map(str::to_string).collect();
        if variables.is_empty() {
            return None;
        }

        Some(PropertyFunction {
            id: new_id(),
            formula_id: formula.id.clone(),
            target_property: target.to_string(),
            variables,
            context_id: formula.context_id.clone(),
        })
    }
}
