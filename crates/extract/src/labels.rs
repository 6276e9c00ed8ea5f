use std::str::FromStr;

use crate::error::VocabError;

/// Default chemical tag scheme, indexed by label id.
pub const CHEM_LABELS: &[&str] = &[
    "O",
    "B-MONOMER",
    "I-MONOMER",
    "B-POLYMER",
    "I-POLYMER",
    "B-COMPOSITE",
    "I-COMPOSITE",
    "B-ADDITIVE",
    "I-ADDITIVE",
];

static OUTSIDE: Label = Label::Outside;

/// One BIO tag. Entity types keep the tagger's spelling.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Label {
    Outside,
    Begin(String),
    Inside(String),
}

impl FromStr for Label {
    type Err = VocabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "O" {
            return Ok(Self::Outside);
        }
        match s.split_once('-') {
            Some(("B", etype)) if !etype.is_empty() => Ok(Self::Begin(etype.to_string())),
            Some(("I", etype)) if !etype.is_empty() => Ok(Self::Inside(etype.to_string())),
            _ => Err(VocabError::InvalidLabel(s.to_string())),
        }
    }
}

/// Maps tagger label ids to labels. Ids outside the set read as `O`.
#[derive(Debug, Clone)]
pub struct LabelSet {
    labels: Vec<Label>,
}

impl LabelSet {
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, VocabError> {
        let labels = names
            .iter()
            .map(|n| n.as_ref().parse())
            .collect::<Result<Vec<Label>, _>>()?;
        Ok(Self { labels })
    }

    pub fn chemical() -> Self {
        Self {
            labels: CHEM_LABELS
                .iter()
                .filter_map(|n| n.parse().ok())
                .collect(),
        }
    }

    pub fn get(&self, id: u32) -> &Label {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.labels.get(i))
            .unwrap_or(&OUTSIDE)
    }

    pub fn id_of(&self, label: &Label) -> Option<u32> {
        self.labels
            .iter()
            .position(|l| l == label)
            .and_then(|i| u32::try_from(i).ok())
    }

    /// Id to emit for untagged tokens. Falls back to an id past the end of
    /// the set, which reads as `O` as well.
    pub fn outside_id(&self) -> u32 {
        self.id_of(&Label::Outside)
            .unwrap_or_else(|| u32::try_from(self.labels.len()).unwrap_or(u32::MAX))
    }

    /// Begin/inside ids for an entity type, matched case-insensitively.
    pub fn bio_ids(&self, entity_type: &str) -> Option<(u32, u32)> {
        let find = |inside: bool| {
            self.labels.iter().position(|l| match l {
                Label::Begin(t) if !inside => t.eq_ignore_ascii_case(entity_type),
                Label::Inside(t) if inside => t.eq_ignore_ascii_case(entity_type),
                _ => false,
            })
        };
        let begin = u32::try_from(find(false)?).ok()?;
        let inside = u32::try_from(find(true)?).ok()?;
        Some((begin, inside))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl Default for LabelSet {
    fn default() -> Self {
        Self::chemical()
    }
}
