//! Statistical name generation library.
//!
//! This crate provides a character-level Markov name generator including:
//! - Character models blending 0 to `max_prefix_len` characters of context
//! - Positional model sets, one model per character position of a word
//! - Word assembly with a minimum-length retry policy
//! - Corpus I/O, model export and a binary model cache

/// Tunable parameters of the models.
pub mod config;

/// Error type shared by the whole crate.
pub mod error;

/// Character models, positional model sets and generation requests.
pub mod model;

/// I/O utilities (corpus files, exports, path helpers).
pub mod io;

pub use config::{ModelConfig, ModelParams};
pub use error::{Error, Result};
pub use io::CorpusEntry;
pub use model::alphabet::Symbol;
pub use model::char_model::{CharacterModel, ExportRow};
pub use model::model_set::PositionalModelSet;
pub use model::request::{Gender, GenerationRequest, ModelKind, ModelSelector};
