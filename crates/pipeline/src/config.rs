use extract::vocab::{DEFAULT_ARROW_MARKERS, DEFAULT_PROPERTY_SYMBOLS, DEFAULT_VARIABLE_PATTERN};
use extract::{
    ArrowMarkers, CHEM_LABELS, CachingNormalizer, FunctionExtractor, GazetteerTagger, HttpTagger,
    LabelSet, LookupNormalizer, NameNormalizer, PropertySymbols, ReactionExtractor, RetryPolicy,
    TokenTagger, VariablePattern,
};
use ingest::{ChunkerConfig, TextFormulaCleaner};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::error::ConfigError;

/// Immutable pipeline settings, built once and handed to each component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub chunk: ChunkerConfig,
    pub layout: LayoutConfig,
    pub ocr: OcrConfig,
    pub ner: NerConfig,
    pub normalizer: NormalizerConfig,
    pub vocab: VocabConfig,
    pub batch: BatchConfig,
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub min_block_confidence: f32,
    pub remove_page_footer: bool,
}

/// Settings of the upstream OCR/math recognizer. Carried for provenance only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub language: String,
    pub math_model: String,
    pub dpi: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NerConfig {
    /// BIO labels indexed by tagger label id
    pub labels: Vec<String>,
    pub threshold: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    pub model: String,
    pub device: String,
    pub batch_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lexicon_path: Option<PathBuf>,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dictionary_path: Option<PathBuf>,
    pub cache: bool,
    pub max_entries: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabConfig {
    pub arrow_markers: Vec<String>,
    pub property_symbols: Vec<String>,
    pub variable_pattern: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub concurrency: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            min_block_confidence: 0.5,
            remove_page_footer: true,
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            math_model: "latex-ocr".to_string(),
            dpi: 300,
        }
    }
}

impl Default for NerConfig {
    fn default() -> Self {
        Self {
            labels: CHEM_LABELS.iter().map(|l| l.to_string()).collect(),
            threshold: 0.5,
            endpoint: None,
            model: "chem-ner".to_string(),
            device: "cpu".to_string(),
            batch_size: 16,
            lexicon_path: None,
            request_timeout_secs: 60,
        }
    }
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            dictionary_path: None,
            cache: true,
            max_entries: 10_000,
        }
    }
}

impl Default for VocabConfig {
    fn default() -> Self {
        Self {
            arrow_markers: DEFAULT_ARROW_MARKERS.iter().map(|s| s.to_string()).collect(),
            property_symbols: DEFAULT_PROPERTY_SYMBOLS.iter().map(|s| s.to_string()).collect(),
            variable_pattern: DEFAULT_VARIABLE_PATTERN.to_string(),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { concurrency: 4 }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 1000,
            max_backoff_ms: 10000,
        }
    }
}

fn check_unit(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field, value })
    }
}

impl PipelineConfig {
    /// Parse and validate a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk.max_tokens == 0 {
            return Err(ConfigError::ZeroTokenBudget);
        }
        if self.batch.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        check_unit("ner.threshold", self.ner.threshold)?;
        check_unit("layout.min_block_confidence", self.layout.min_block_confidence)?;

        self.label_set()?;
        self.reaction_extractor()?;
        self.function_extractor()?;
        Ok(())
    }

    pub fn cleaner(&self) -> TextFormulaCleaner {
        TextFormulaCleaner::new(self.layout.remove_page_footer)
    }

    pub fn label_set(&self) -> Result<LabelSet, ConfigError> {
        Ok(LabelSet::from_names(&self.ner.labels)?)
    }

    pub fn reaction_extractor(&self) -> Result<ReactionExtractor, ConfigError> {
        Ok(ReactionExtractor::new(ArrowMarkers::new(
            &self.vocab.arrow_markers,
        )?))
    }

    pub fn function_extractor(&self) -> Result<FunctionExtractor, ConfigError> {
        Ok(FunctionExtractor::new(
            PropertySymbols::new(&self.vocab.property_symbols)?,
            VariablePattern::new(&self.vocab.variable_pattern)?,
        ))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry.max_retries,
            self.retry.initial_backoff_ms,
            self.retry.max_backoff_ms,
        )
    }

    /// Remote tagger when an endpoint is set, otherwise the lexicon tagger.
    pub fn tagger(&self) -> Result<Arc<dyn TokenTagger>, ConfigError> {
        let labels = self.label_set()?;

        if let Some(endpoint) = &self.ner.endpoint {
            let tagger = HttpTagger::with_timeout(
                endpoint.as_str(),
                self.ner.model.as_str(),
                Duration::from_secs(self.ner.request_timeout_secs),
            )?
            .with_threshold(self.ner.threshold, labels.outside_id())
            .with_retry(self.retry_policy());
            tracing::info!(endpoint = %endpoint, model = %self.ner.model, "Using remote tagger");
            return Ok(Arc::new(tagger));
        }

        let tagger = match &self.ner.lexicon_path {
            Some(path) => GazetteerTagger::from_json_file(path, &labels).map_err(|e| {
                ConfigError::Resource {
                    what: "lexicon",
                    message: format!("{e:#}"),
                }
            })?,
            None => {
                tracing::warn!("No tagger endpoint or lexicon configured, no chemicals will be tagged");
                GazetteerTagger::new(std::iter::empty::<(&str, &str)>(), &labels)?
            }
        };
        tracing::info!(terms = tagger.len(), "Using lexicon tagger");
        Ok(Arc::new(tagger))
    }

    pub fn normalizer(&self) -> Result<Arc<dyn NameNormalizer>, ConfigError> {
        let lookup = match &self.normalizer.dictionary_path {
            Some(path) => {
                LookupNormalizer::from_json_file(path).map_err(|e| ConfigError::Resource {
                    what: "dictionary",
                    message: format!("{e:#}"),
                })?
            }
            None => LookupNormalizer::new(),
        };
        tracing::debug!(entries = lookup.len(), "Loaded normalization dictionary");

        if self.normalizer.cache {
            Ok(Arc::new(CachingNormalizer::new(
                lookup,
                self.normalizer.max_entries,
            )))
        } else {
            Ok(Arc::new(lookup))
        }
    }
}
