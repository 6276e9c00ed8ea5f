use anyhow::{Context, Result};
use dashmap::DashMap;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

static TRAILING_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?;:]+$").expect("static regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));

/// Result of resolving a chemical surface form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub text: String,
    pub canonical_id: Option<String>,
}

impl Normalized {
    pub fn unresolved(text: &str) -> Self {
        Self {
            text: text.to_string(),
            canonical_id: None,
        }
    }
}

/// Resolves surface forms to canonical structure identifiers.
///
/// Resolution failures are not errors: they come back with no
/// `canonical_id`.
pub trait NameNormalizer: Send + Sync {
    fn normalize(&self, surface: &str) -> Normalized;
}

/// Lookup key: lowercase, trailing punctuation trimmed, whitespace collapsed.
pub fn lookup_key(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let trimmed = TRAILING_PUNCT.replace(&lowered, "");
    WHITESPACE.replace_all(trimmed.trim(), " ").into_owned()
}

/// Dictionary-backed normalizer: known names map to canonical ids.
#[derive(Debug, Default, Clone)]
pub struct LookupNormalizer {
    /// Maps lookup key -> canonical id
    canonical: HashMap<String, String>,
}

impl LookupNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let canonical = entries
            .into_iter()
            .map(|(name, id)| (lookup_key(name.as_ref()), id.into()))
            .filter(|(key, _)| !key.is_empty())
            .collect();
        Self { canonical }
    }

    /// Load a JSON object of `{"surface name": "canonical id"}`.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read dictionary: {:?}", path))?;
        let entries: HashMap<String, String> = serde_json::from_str(&content)
            .context(format!("Failed to parse dictionary: {:?}", path))?;
        Ok(Self::from_entries(entries))
    }

    pub fn len(&self) -> usize {
        self.canonical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }
}

impl NameNormalizer for LookupNormalizer {
    fn normalize(&self, surface: &str) -> Normalized {
        Normalized {
            text: surface.to_string(),
            canonical_id: self.canonical.get(&lookup_key(surface)).cloned(),
        }
    }
}

/// Memoizes another normalizer so repeated surface forms skip the lookup.
pub struct CachingNormalizer<N> {
    inner: N,
    cache: DashMap<String, Option<String>>,
    max_entries: usize,
}

impl<N: NameNormalizer> CachingNormalizer<N> {
    pub fn new(inner: N, max_entries: usize) -> Self {
        Self {
            inner,
            cache: DashMap::new(),
            max_entries,
        }
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    fn insert(&self, surface: &str, canonical_id: Option<String>) {
        if self.max_entries == 0 {
            return;
        }
        if self.cache.len() >= self.max_entries {
            // Simple eviction: clear 25% when full
            let to_remove: Vec<_> = self
                .cache
                .iter()
                .take((self.max_entries / 4).max(1))
                .map(|r| r.key().clone())
                .collect();
            for key in to_remove {
                self.cache.remove(&key);
            }
        }
        self.cache.insert(surface.to_string(), canonical_id);
    }
}

impl<N: NameNormalizer> NameNormalizer for CachingNormalizer<N> {
    fn normalize(&self, surface: &str) -> Normalized {
        if let Some(hit) = self.cache.get(surface) {
            return Normalized {
                text: surface.to_string(),
                canonical_id: hit.value().clone(),
            };
        }

        let normalized = self.inner.normalize(surface);
        self.insert(surface, normalized.canonical_id.clone());
        normalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_lookup_key() {
        assert_eq!(lookup_key("  Styrene. "), "styrene");
        assert_eq!(lookup_key("Methyl   Methacrylate"), "methyl methacrylate");
        assert_eq!(lookup_key("1,3-Butadiene"), "1,3-butadiene");
    }

    #[test]
    fn test_lookup_normalizer() {
        let normalizer = LookupNormalizer::from_entries([("Styrene", "C=Cc1ccccc1")]);

        let hit = normalizer.normalize("STYRENE");
        assert_eq!(hit.text, "STYRENE");
        assert_eq!(hit.canonical_id.as_deref(), Some("C=Cc1ccccc1"));

        let miss = normalizer.normalize("unobtainium");
        assert_eq!(miss, Normalized::unresolved("unobtainium"));
    }

    struct Counting {
        calls: AtomicUsize,
    }

    impl NameNormalizer for Counting {
        fn normalize(&self, surface: &str) -> Normalized {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Normalized {
                text: surface.to_string(),
                canonical_id: Some(surface.to_uppercase()),
            }
        }
    }

    #[test]
    fn test_cache_short_circuits() {
        let cache = CachingNormalizer::new(
            Counting {
                calls: AtomicUsize::new(0),
            },
            100,
        );

        let first = cache.normalize("pmma");
        let second = cache.normalize("pmma");

        assert_eq!(first, second);
        assert_eq!(cache.inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.cached(), 1);
    }

    #[test]
    fn test_cache_eviction_bounds_size() {
        let cache = CachingNormalizer::new(LookupNormalizer::new(), 4);
        for i in 0..20 {
            cache.normalize(&format!("name-{i}"));
        }
        assert!(cache.cached() <= 4);
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dict.json");
        std::fs::write(&path, r#"{"Polystyrene": "PS-001"}"#).unwrap();

        let normalizer = LookupNormalizer::from_json_file(&path).unwrap();
        assert_eq!(
            normalizer.normalize("polystyrene").canonical_id.as_deref(),
            Some("PS-001")
        );
    }
}
