pub mod decoder;
pub mod error;
pub mod function;
pub mod http;
pub mod labels;
pub mod ner;
pub mod normalizer;
pub mod reaction;
pub mod retry;
pub mod schema;
pub mod tagger;
pub mod vocab;

pub use decoder::EntityDecoder;
pub use error::{TaggerError, VocabError};
pub use function::FunctionExtractor;
pub use http::HttpTagger;
pub use labels::{CHEM_LABELS, Label, LabelSet};
pub use ner::ChemicalRecognizer;
pub use normalizer::{CachingNormalizer, LookupNormalizer, NameNormalizer, Normalized};
pub use reaction::ReactionExtractor;
pub use retry::RetryPolicy;
pub use schema::{
    ChemicalEntity, FormulaEntity, FormulaKind, PropertyFunction, ReactionRelation, Span,
};
pub use tagger::{GazetteerTagger, TaggedText, TokenTagger};
pub use vocab::{ArrowMarkers, PropertySymbols, VariablePattern};
