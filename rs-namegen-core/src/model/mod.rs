//! Top-level module for the name generation models.
//!
//! - Symbols and their alphabet indices (`alphabet`)
//! - Per-context symbol counts (`FrequencyTable`)
//! - Blended character model (`CharacterModel`)
//! - One model per character position (`PositionalModels`)
//! - The complete generator (`PositionalModelSet`)
//! - Generation parameters (`GenerationRequest`)

/// The 27-symbol alphabet: end marker plus `a..=z`.
pub mod alphabet;

/// Fixed-size symbol counts.
pub mod frequency_table;

/// Character model with prefix-weighted blending and weighted sampling.
pub mod char_model;

/// Array of character models indexed by position in the word.
pub mod positional;

/// Masculine, feminine and global models, word assembly and retry policy.
pub mod model_set;

/// Generation request surface: sub-model, maximum length and seed.
pub mod request;
