use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::TaggerError;
use crate::labels::LabelSet;

/// Token-level predictions for one text: a label id and a char-offset pair
/// per token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedText {
    pub labels: Vec<u32>,
    pub offsets: Vec<(usize, usize)>,
}

impl TaggedText {
    pub fn new(labels: Vec<u32>, offsets: Vec<(usize, usize)>) -> Result<Self, TaggerError> {
        if labels.len() != offsets.len() {
            return Err(TaggerError::LengthMismatch {
                labels: labels.len(),
                offsets: offsets.len(),
            });
        }
        Ok(Self { labels, offsets })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Entity-tag inference over a chunk of text.
#[async_trait]
pub trait TokenTagger: Send + Sync {
    async fn tag(&self, text: &str) -> Result<TaggedText, TaggerError>;
}

/// Word tokens of `text` with char offsets; whitespace is dropped.
pub fn word_tokens(text: &str) -> Vec<(&str, usize, usize)> {
    let mut tokens = Vec::new();
    let mut char_pos = 0;
    for segment in text.split_word_bounds() {
        let len = segment.chars().count();
        if !segment.trim().is_empty() {
            tokens.push((segment, char_pos, char_pos + len));
        }
        char_pos += len;
    }
    tokens
}

/// Dictionary tagger: marks the longest known term at each position.
///
/// Terms are matched case-insensitively token by token, so multi-word names
/// such as "methyl methacrylate" tag as `B-` followed by `I-` labels.
pub struct GazetteerTagger {
    /// Maps lowercased term tokens -> (begin id, inside id)
    terms: HashMap<Vec<String>, (u32, u32)>,
    max_term_len: usize,
    outside: u32,
}

impl GazetteerTagger {
    pub fn new<I, T, E>(lexicon: I, labels: &LabelSet) -> Result<Self, TaggerError>
    where
        I: IntoIterator<Item = (T, E)>,
        T: AsRef<str>,
        E: AsRef<str>,
    {
        let mut terms = HashMap::new();
        let mut max_term_len = 0;

        for (term, entity_type) in lexicon {
            let ids = labels.bio_ids(entity_type.as_ref()).ok_or_else(|| {
                TaggerError::Lexicon(format!(
                    "entity type {:?} for term {:?} is not in the label set",
                    entity_type.as_ref(),
                    term.as_ref()
                ))
            })?;

            let key: Vec<String> = word_tokens(term.as_ref())
                .into_iter()
                .map(|(t, _, _)| t.to_lowercase())
                .collect();
            if key.is_empty() {
                continue;
            }
            max_term_len = max_term_len.max(key.len());
            terms.insert(key, ids);
        }

        Ok(Self {
            terms,
            max_term_len,
            outside: labels.outside_id(),
        })
    }

    /// Load a JSON object of `{"term": "ENTITY_TYPE"}`.
    pub fn from_json_file(path: &Path, labels: &LabelSet) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read lexicon: {:?}", path))?;
        let lexicon: HashMap<String, String> = serde_json::from_str(&content)
            .context(format!("Failed to parse lexicon: {:?}", path))?;
        Ok(Self::new(lexicon, labels)?)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn tag_text(&self, text: &str) -> TaggedText {
        let tokens = word_tokens(text);
        let lowered: Vec<String> = tokens.iter().map(|(t, _, _)| t.to_lowercase()).collect();

        let mut labels = Vec::with_capacity(tokens.len());
        let mut i = 0;
        while i < tokens.len() {
            let longest = self.max_term_len.min(tokens.len() - i);
            let matched = (1..=longest)
                .rev()
                .find_map(|n| self.terms.get(&lowered[i..i + n]).map(|ids| (n, *ids)));

            match matched {
                Some((n, (begin, inside))) => {
                    labels.push(begin);
                    labels.extend(std::iter::repeat_n(inside, n - 1));
                    i += n;
                }
                None => {
                    labels.push(self.outside);
                    i += 1;
                }
            }
        }

        TaggedText {
            labels,
            offsets: tokens.iter().map(|(_, s, e)| (*s, *e)).collect(),
        }
    }
}

#[async_trait]
impl TokenTagger for GazetteerTagger {
    async fn tag(&self, text: &str) -> Result<TaggedText, TaggerError> {
        Ok(self.tag_text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagger() -> GazetteerTagger {
        GazetteerTagger::new(
            [
                ("styrene", "MONOMER"),
                ("methyl methacrylate", "MONOMER"),
                ("polystyrene", "POLYMER"),
                ("methyl", "ADDITIVE"),
            ],
            &LabelSet::chemical(),
        )
        .unwrap()
    }

    #[test]
    fn test_word_tokens_use_char_offsets() {
        let tokens = word_tokens("α-styrene,  PS");
        assert_eq!(
            tokens,
            vec![("α", 0, 1), ("-", 1, 2), ("styrene", 2, 9), (",", 9, 10), ("PS", 12, 14)]
        );
    }

    #[test]
    fn test_longest_match_wins() {
        let tagged = tagger().tag_text("Methyl methacrylate and styrene");

        assert_eq!(tagged.labels, vec![1, 2, 0, 1]);
        assert_eq!(tagged.offsets, vec![(0, 6), (7, 19), (20, 23), (24, 31)]);
    }

    #[test]
    fn test_shorter_term_when_long_one_breaks() {
        let tagged = tagger().tag_text("methyl groups");
        assert_eq!(tagged.labels, vec![7, 0]);
    }

    #[test]
    fn test_unknown_entity_type_is_rejected() {
        let result = GazetteerTagger::new([("thf", "SOLVENT")], &LabelSet::chemical());
        assert!(matches!(result, Err(TaggerError::Lexicon(_))));
    }

    #[test]
    fn test_length_mismatch() {
        assert!(TaggedText::new(vec![0, 1], vec![(0, 1)]).is_err());
        assert_eq!(TaggedText::new(vec![0], vec![(0, 1)]).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_tagger_trait() {
        let tagged = tagger().tag("polystyrene").await.unwrap();
        assert_eq!(tagged.labels, vec![3]);
    }
}
