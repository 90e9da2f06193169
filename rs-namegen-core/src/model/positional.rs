use rand::Rng;
use serde::{Deserialize, Serialize};

use super::alphabet::Symbol;
use super::char_model::CharacterModel;
use crate::config::ModelParams;
use crate::error::Result;

/// One `CharacterModel` per character position of a word.
///
/// Model `i` only learns the character found at index `i` of each word
/// (or its end marker), and is only queried for that index.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PositionalModels {
	models: Vec<CharacterModel>,
}

impl PositionalModels {
	/// Creates `max_len` empty models.
	pub fn new(params: ModelParams, max_len: usize) -> Result<Self> {
		let models = (0..max_len).map(|_| CharacterModel::new(params)).collect::<Result<Vec<_>>>()?;
		Ok(Self { models })
	}

	pub fn len(&self) -> usize {
		self.models.len()
	}

	pub fn is_empty(&self) -> bool {
		self.models.iter().all(CharacterModel::is_empty)
	}

	/// The model of position `index`, if within range.
	pub fn get(&self, index: usize) -> Option<&CharacterModel> {
		self.models.get(index)
	}

	/// Feeds every position of `word` to its model.
	///
	/// Positions past the end marker, or past the number of models, are skipped.
	pub fn train(&mut self, word: &str) -> Result<()> {
		for (index, model) in self.models.iter_mut().enumerate() {
			model.add_word_positional(word, index)?;
		}
		Ok(())
	}

	/// Builds one word, querying at step `i` the model of position `i` with the
	/// word generated so far as context.
	///
	/// Stops on the end marker or when the word reaches `max_length`. The
	/// result may be short; the caller decides whether to retry.
	pub fn generate<R: Rng + ?Sized>(&self, max_length: usize, rng: &mut R) -> Result<String> {
		let max_length = max_length.min(self.models.len());
		let mut word = String::new();

		for model in &self.models[..max_length] {
			match model.sample(&word, rng)? {
				Symbol::Letter(c) => word.push(c),
				Symbol::End => break,
			}
		}

		Ok(word)
	}

	/// Merges another set of positional models, position by position.
	pub fn merge(&mut self, other: &Self) -> Result<()> {
		for (model, other_model) in self.models.iter_mut().zip(&other.models) {
			model.merge(other_model)?;
		}
		Ok(())
	}
}
