use std::fs;
use std::path::Path;

use log::{debug, info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::alphabet::{Symbol, normalize};
use super::char_model::{CharacterModel, ExportRow};
use super::positional::PositionalModels;
use super::request::{Gender, GenerationRequest, ModelKind, ModelSelector};
use crate::config::ModelConfig;
use crate::error::{Error, Result};
use crate::io::{CorpusEntry, build_output_path, read_corpus};

/// The complete name generator: positional models for each half of the
/// corpus plus one position-independent model trained on every word.
///
/// # Responsibilities
/// - Train all models from a corpus of (masculine, feminine) pairs
/// - Assemble words from the positional or global models
/// - Reject words of 2 characters or less and retry, up to `max_attempts`
/// - Cache trained models next to their corpus file
///
/// # Invariants
/// - Both positional sets hold exactly `config.max_len` models
/// - Every model of the set shares `config.params`
/// - Generation never mutates the models
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PositionalModelSet {
	config: ModelConfig,
	masculine: PositionalModels,
	feminine: PositionalModels,
	global: CharacterModel,
}

impl PositionalModelSet {
	/// Creates a set of untrained models.
	///
	/// # Errors
	/// Returns `InvalidConfig` if the configuration does not validate.
	pub fn new(config: ModelConfig) -> Result<Self> {
		config.validate()?;
		Ok(Self {
			config,
			masculine: PositionalModels::new(config.params, config.max_len)?,
			feminine: PositionalModels::new(config.params, config.max_len)?,
			global: CharacterModel::new(config.params)?,
		})
	}

	/// Loads the set trained on `corpus_path`, from its binary cache when possible.
	///
	/// - The cache lives next to the corpus with a `.bin` extension.
	/// - It is used only if it was built with the same configuration and is
	///   strictly newer than the corpus; otherwise the corpus is read, the models are
	///   trained and the cache is rewritten.
	/// - Uses `postcard` for the cache encoding.
	pub fn load<P: AsRef<Path>>(corpus_path: P, config: ModelConfig) -> Result<Self> {
		config.validate()?;
		let cache_path = build_output_path(&corpus_path, "bin")?;

		if Self::is_cache_fresh(&cache_path, corpus_path.as_ref()) {
			let bytes = fs::read(&cache_path)?;
			match postcard::from_bytes::<Self>(&bytes) {
				Ok(set) if set.config == config => {
					debug!("Loaded models from cache {}", cache_path.display());
					return Ok(set);
				}
				Ok(_) => debug!("Cache {} was built with another configuration", cache_path.display()),
				Err(e) => warn!("Ignoring unreadable cache {}: {e}", cache_path.display()),
			}
		}

		let set = Self::from_corpus_file(&corpus_path, config)?;
		let bytes = postcard::to_stdvec(&set)?;
		fs::write(&cache_path, bytes)?;
		debug!("Wrote model cache {}", cache_path.display());

		Ok(set)
	}

	/// True if `cache_path` exists and was written after the corpus last changed.
	///
	/// Equal timestamps do not count: with coarse file times the corpus may
	/// have been rewritten within the same tick as the cache.
	fn is_cache_fresh(cache_path: &Path, corpus_path: &Path) -> bool {
		let modified = |path: &Path| fs::metadata(path).and_then(|meta| meta.modified()).ok();
		match (modified(cache_path), modified(corpus_path)) {
			(Some(cache), Some(corpus)) => cache > corpus,
			(Some(_), None) => true,
			_ => false,
		}
	}

	/// Reads a corpus CSV and trains a new set from it, without any cache.
	pub fn from_corpus_file<P: AsRef<Path>>(corpus_path: P, config: ModelConfig) -> Result<Self> {
		let corpus = read_corpus(&corpus_path)?;
		let mut set = Self::new(config)?;
		set.setup(corpus)?;
		info!("Trained models from {}", corpus_path.as_ref().display());
		Ok(set)
	}

	pub fn config(&self) -> &ModelConfig {
		&self.config
	}

	/// The position-independent model.
	pub fn global(&self) -> &CharacterModel {
		&self.global
	}

	/// The positional models of one half of the corpus.
	pub fn positional(&self, gender: Gender) -> &PositionalModels {
		match gender {
			Gender::Masculine => &self.masculine,
			Gender::Feminine => &self.feminine,
		}
	}

	fn positional_mut(&mut self, gender: Gender) -> &mut PositionalModels {
		match gender {
			Gender::Masculine => &mut self.masculine,
			Gender::Feminine => &mut self.feminine,
		}
	}

	/// Trains every model from the corpus.
	///
	/// Each non-empty word feeds the positional models of its gender and the
	/// global model. Empty fields are skipped. Counts add to previous training.
	///
	/// # Errors
	/// Returns `InvalidCharacter` on the first word that is not alphabetic.
	/// The whole corpus is checked first, so on error no model has changed.
	pub fn setup<I>(&mut self, corpus: I) -> Result<()>
	where
		I: IntoIterator<Item = CorpusEntry>,
	{
		let words: Vec<(Gender, String)> = corpus
			.into_iter()
			.flat_map(|entry| [(Gender::Masculine, entry.masculine), (Gender::Feminine, entry.feminine)])
			.filter(|(_, word)| !word.is_empty())
			.collect();
		for (_, word) in &words {
			normalize(word)?;
		}

		for (gender, word) in &words {
			self.positional_mut(*gender).train(word)?;
			self.global.add_word(word)?;
		}
		debug!("Trained on {} words", words.len());
		Ok(())
	}

	/// Runs `attempt` until it returns a word longer than 2 characters.
	///
	/// Each attempt starts from scratch. Gives up after `max_attempts`.
	fn retry<F>(&self, mut attempt: F) -> Result<String>
	where
		F: FnMut() -> Result<String>,
	{
		for _ in 0..self.config.max_attempts {
			let word = attempt()?;
			if word.chars().count() > 2 {
				return Ok(word);
			}
		}
		warn!("No word longer than 2 characters after {} attempts", self.config.max_attempts);
		Err(Error::RetriesExhausted(self.config.max_attempts))
	}

	fn positional_word<R: Rng + ?Sized>(&self, gender: Gender, max_length: usize, rng: &mut R) -> Result<String> {
		let models = self.positional(gender);
		self.retry(|| models.generate(max_length, rng))
	}

	fn global_word<R: Rng + ?Sized>(&self, seed: &str, max_length: usize, rng: &mut R) -> Result<String> {
		self.retry(|| {
			let mut word = seed.to_owned();
			while word.chars().count() < max_length {
				match self.global.sample(&word, rng)? {
					Symbol::Letter(c) => word.push(c),
					Symbol::End => break,
				}
			}
			Ok(word)
		})
	}

	/// Generates one word as described by `request`.
	///
	/// # Errors
	/// - `InvalidRequest` if the request does not validate
	/// - `EmptyModel` if a queried model was never trained
	/// - `RetriesExhausted` if every attempt gave a word of 2 characters or less
	pub fn generate<R: Rng + ?Sized>(&self, request: &GenerationRequest, rng: &mut R) -> Result<String> {
		let max_length = request.validate(self.config.max_len)?;
		match request.kind {
			ModelKind::Masculine => self.positional_word(Gender::Masculine, max_length, rng),
			ModelKind::Feminine => self.positional_word(Gender::Feminine, max_length, rng),
			ModelKind::Any => {
				let gender = if rng.random_bool(0.5) { Gender::Masculine } else { Gender::Feminine };
				self.positional_word(gender, max_length, rng)
			}
			ModelKind::Global => self.global_word(request.seed().unwrap_or_default(), max_length, rng),
		}
	}

	/// Generates a masculine name, position by position.
	pub fn generate_masculine<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<String> {
		self.generate(&GenerationRequest::new(ModelKind::Masculine), rng)
	}

	/// Generates a feminine name, position by position.
	pub fn generate_feminine<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<String> {
		self.generate(&GenerationRequest::new(ModelKind::Feminine), rng)
	}

	/// Generates a masculine or feminine name with even odds.
	pub fn generate_any<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<String> {
		self.generate(&GenerationRequest::new(ModelKind::Any), rng)
	}

	/// Generates a name from the global model, irrespective of positions,
	/// optionally starting with `seed`.
	pub fn generate_non_positional<R: Rng + ?Sized>(&self, seed: Option<&str>, rng: &mut R) -> Result<String> {
		let mut request = GenerationRequest::new(ModelKind::Global);
		if let Some(seed) = seed {
			request = request.with_seed(seed);
		}
		self.generate(&request, rng)
	}

	/// The model designated by `selector`, if it exists.
	pub fn model(&self, selector: ModelSelector) -> Option<&CharacterModel> {
		match selector {
			ModelSelector::Global => Some(&self.global),
			ModelSelector::Positional(gender, index) => self.positional(gender).get(index),
		}
	}

	/// Exports the tables of one model.
	///
	/// # Errors
	/// Returns `InvalidRequest` if the position is out of range.
	pub fn export(&self, selector: ModelSelector) -> Result<Vec<ExportRow>> {
		self.model(selector)
			.map(CharacterModel::export)
			.ok_or_else(|| Error::InvalidRequest(format!("no model at {selector}")))
	}

	/// Merges another set built with the same configuration into this one.
	///
	/// # Errors
	/// Returns `ParamsMismatch` if the configurations differ.
	pub fn merge(&mut self, other: &Self) -> Result<()> {
		if self.config.params != other.config.params || self.config.max_len != other.config.max_len {
			return Err(Error::ParamsMismatch);
		}
		self.masculine.merge(&other.masculine)?;
		self.feminine.merge(&other.feminine)?;
		self.global.merge(&other.global)
	}
}
