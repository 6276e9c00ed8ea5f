use ingest::new_id;
use std::collections::BTreeMap;

use crate::schema::{ChemicalEntity, FormulaEntity, ReactionRelation};
use crate::vocab::ArrowMarkers;

/// Pairs reaction formulas with the chemicals mentioned in the same chunk.
#[derive(Debug, Clone, Default)]
pub struct ReactionExtractor {
    arrows: ArrowMarkers,
}

fn push_unique(ids: &mut Vec<String>, id: &str) {
    if !ids.iter().any(|existing| existing == id) {
        ids.push(id.to_string());
    }
}

impl ReactionExtractor {
    pub fn new(arrows: ArrowMarkers) -> Self {
        Self { arrows }
    }

    pub fn is_reaction(&self, latex: &str) -> bool {
        self.arrows.is_match(latex)
    }

    /// A chemical counts as a reactant when its surface text occurs left of
    /// the first arrow and as a product when it occurs between the first and
    /// second arrow. It can be both.
    pub fn extract(
        &self,
        formula: &FormulaEntity,
        candidates: &[ChemicalEntity],
    ) -> Option<ReactionRelation> {
        let (lhs, rhs) = self.arrows.split_sides(&formula.latex)?;

        let mut reactants = Vec::new();
        let mut products = Vec::new();
        for entity in candidates
            .iter()
            .filter(|e| e.context_id == formula.context_id && !e.text.is_empty())
        {
            if lhs.contains(entity.text.as_str()) {
                push_unique(&mut reactants, &entity.id);
            }
            if rhs.contains(entity.text.as_str()) {
                push_unique(&mut products, &entity.id);
            }
        }

        if reactants.is_empty() && products.is_empty() {
            return None;
        }

        tracing::debug!(
            formula_id = %formula.id,
            reactants = reactants.len(),
            products = products.len(),
            "Extracted reaction"
        );

        Some(ReactionRelation {
            id: new_id(),
            reactants,
            products,
            conditions: BTreeMap::new(),
            formula_id: Some(formula.id.clone()),
        })
    }
}
