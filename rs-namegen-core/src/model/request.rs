use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use super::alphabet::is_valid_word;
use crate::error::{Error, Result};

/// Which half of the corpus a positional model was trained on.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
	Masculine,
	Feminine,
}

impl fmt::Display for Gender {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Gender::Masculine => write!(f, "masculine"),
			Gender::Feminine => write!(f, "feminine"),
		}
	}
}

impl FromStr for Gender {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		match s.trim().to_lowercase().as_str() {
			"m" | "masc" | "masculine" => Ok(Gender::Masculine),
			"f" | "fem" | "feminine" => Ok(Gender::Feminine),
			other => Err(Error::InvalidRequest(format!("unknown gender '{other}'"))),
		}
	}
}

/// Sub-model used to generate a word.
///
/// # Variants
/// - `Masculine` / `Feminine`: positional models of one half of the corpus.
/// - `Any`: masculine or feminine, with even odds.
/// - `Global`: the position-independent model trained on every word.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
	Masculine,
	Feminine,
	#[default]
	Any,
	Global,
}

impl FromStr for ModelKind {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		match s.trim().to_lowercase().as_str() {
			"any" => Ok(ModelKind::Any),
			"global" | "non-positional" => Ok(ModelKind::Global),
			other => match other.parse::<Gender>() {
				Ok(Gender::Masculine) => Ok(ModelKind::Masculine),
				Ok(Gender::Feminine) => Ok(ModelKind::Feminine),
				Err(_) => Err(Error::InvalidRequest(format!(
					"model kind must be 'masculine', 'feminine', 'any' or 'global', got '{other}'"
				))),
			},
		}
	}
}

/// Designates one `CharacterModel` of a set, for export.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelSelector {
	Global,
	Positional(Gender, usize),
}

impl fmt::Display for ModelSelector {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ModelSelector::Global => write!(f, "global"),
			ModelSelector::Positional(gender, index) => write!(f, "{gender}:{index}"),
		}
	}
}

impl FromStr for ModelSelector {
	type Err = Error;

	/// Parses `global`, `masculine:<index>` or `feminine:<index>`.
	fn from_str(s: &str) -> Result<Self> {
		let s = s.trim();
		if s.eq_ignore_ascii_case("global") {
			return Ok(ModelSelector::Global);
		}
		let Some((gender, index)) = s.split_once(':') else {
			return Err(Error::InvalidRequest(format!(
				"model must be 'global', 'masculine:<index>' or 'feminine:<index>', got '{s}'"
			)));
		};
		let index = index
			.trim()
			.parse::<usize>()
			.map_err(|_| Error::InvalidRequest(format!("position must be an integer, got '{index}'")))?;
		Ok(ModelSelector::Positional(gender.parse()?, index))
	}
}

/// Parameters of a single word generation.
///
/// # Invariants
/// - A seed is only meaningful for `ModelKind::Global`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct GenerationRequest {
	/// Sub-model to generate from.
	pub kind: ModelKind,

	/// Upper bound on the word length, capped by the configured `max_len`.
	pub max_length: Option<usize>,

	/// Beginning of the word, for non-positional generation.
	#[serde(default, deserialize_with = "deserialize_seed")]
	seed: Option<String>,
}

/// Applies the rules of `GenerationRequest::with_seed` to deserialized seeds.
fn deserialize_seed<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
	D: Deserializer<'de>,
{
	let seed = Option::<String>::deserialize(deserializer)?;
	Ok(seed.filter(|seed| !seed.is_empty()).map(|seed| seed.to_lowercase()))
}

impl GenerationRequest {
	pub fn new(kind: ModelKind) -> Self {
		Self { kind, max_length: None, seed: None }
	}

	pub fn with_max_length(mut self, max_length: usize) -> Self {
		self.max_length = Some(max_length);
		self
	}

	/// Sets the seed; an empty string clears it.
	pub fn with_seed(mut self, seed: impl Into<String>) -> Self {
		let seed = seed.into();
		self.seed = if seed.is_empty() { None } else { Some(seed.to_lowercase()) };
		self
	}

	pub fn seed(&self) -> Option<&str> {
		self.seed.as_deref()
	}

	/// Checks the request against a set built with `max_len` positions.
	///
	/// Returns the effective maximum length of the generated word.
	///
	/// # Errors
	/// Returns `InvalidRequest` if the length leaves no room for a word longer
	/// than 2 characters, or if the seed is misplaced, not alphabetic or too long.
	pub(crate) fn validate(&self, max_len: usize) -> Result<usize> {
		let max_length = self.max_length.map_or(max_len, |length| length.min(max_len));
		if max_length < 3 {
			return Err(Error::InvalidRequest(format!("max length must be >= 3, got {max_length}")));
		}

		if let Some(seed) = &self.seed {
			if self.kind != ModelKind::Global {
				return Err(Error::InvalidRequest("a seed requires the global model".to_owned()));
			}
			if !is_valid_word(seed) {
				return Err(Error::InvalidRequest(format!("seed '{seed}' must only contain letters")));
			}
			if seed.chars().count() >= max_length {
				return Err(Error::InvalidRequest(format!(
					"seed '{seed}' must be shorter than the max length ({max_length})"
				)));
			}
		}

		Ok(max_length)
	}
}
