use std::collections::HashMap;

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::alphabet::{ALPHABET_SIZE, END_MARKER, FILLER, Symbol, index_of, normalize, symbol_at};
use super::frequency_table::FrequencyTable;
use crate::config::ModelParams;
use crate::error::{Error, Result};

/// One row of an exported model: `count` occurrences of `character` after `prefix`.
///
/// The unconditional table is exported with an empty prefix.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ExportRow {
	pub prefix: String,
	pub character: char,
	pub count: u32,
}

/// Character-level Markov model blending several context lengths.
///
/// The model stores how often each symbol was observed with no context
/// (`letters_raw`) and after every prefix of 1 to `max_prefix_len` characters
/// (`prefixes`). When sampling, the counts of the prefixes matching the end of
/// the context are added on top of the unconditional counts, each prefix length
/// weighted `len_prefix_mult` bits more than the next shorter one.
///
/// # Responsibilities
/// - Accumulate symbol counts from words, globally or for one position
/// - Blend the matching prefix tables and draw the next symbol
/// - Merge with a model built with the same parameters
/// - Export its tables for inspection and rebuild from such an export
///
/// # Invariants
/// - Every prefix key is 1 to `max_prefix_len` characters long
/// - Parameters never change once the model exists
/// - Sampling never writes to the tables
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CharacterModel {
	params: ModelParams,

	/// Counts of each symbol, regardless of what precedes it
	letters_raw: FrequencyTable,

	/// Counts of each symbol following a given prefix.
	/// Example: { "^" => {a: 3, b: 1}, "an" => {n: 2, $: 1} }
	prefixes: HashMap<String, FrequencyTable>,
}

impl CharacterModel {
	/// Creates an empty model.
	///
	/// # Errors
	/// Returns `InvalidConfig` if the parameters overflow the weight range.
	pub fn new(params: ModelParams) -> Result<Self> {
		params.validate()?;
		Ok(Self {
			params,
			letters_raw: FrequencyTable::new(),
			prefixes: HashMap::new(),
		})
	}

	pub fn params(&self) -> &ModelParams {
		&self.params
	}

	/// The table of counts observed without any context.
	pub fn unconditional(&self) -> &FrequencyTable {
		&self.letters_raw
	}

	/// The table of counts observed after `prefix`, if any.
	pub fn prefix_table(&self, prefix: &str) -> Option<&FrequencyTable> {
		self.prefixes.get(prefix)
	}

	/// Number of symbols observed during training.
	pub fn total_observations(&self) -> u64 {
		self.letters_raw.total()
	}

	/// True if nothing was learned yet.
	pub fn is_empty(&self) -> bool {
		self.letters_raw.is_empty()
	}

	/// Pads a word as `^^word$` (one filler per prefix character).
	fn prepare_word(&self, word: &str) -> Result<Vec<char>> {
		let letters = normalize(word)?;
		let mut padded = Vec::with_capacity(self.params.max_prefix_len + letters.len() + 1);
		padded.extend(std::iter::repeat_n(FILLER, self.params.max_prefix_len));
		padded.extend(letters);
		padded.push(END_MARKER);
		Ok(padded)
	}

	/// Records the symbol at `position` of a padded word, globally and after
	/// each of its prefixes. `position` is past the filler.
	fn observe(&mut self, padded: &[char], position: usize) {
		let Some(index) = index_of(padded[position]) else {
			return;
		};
		self.letters_raw.increment(index);

		for prefix_len in 1..=self.params.max_prefix_len {
			let prefix: String = padded[position - prefix_len..position].iter().collect();
			self.prefixes.entry(prefix).or_default().increment(index);
		}
	}

	/// Adds every character of `word`, and its end marker, to the model.
	///
	/// # Errors
	/// Returns `InvalidCharacter` if the word holds anything but ascii letters.
	/// Nothing is recorded in that case.
	pub fn add_word(&mut self, word: &str) -> Result<()> {
		let padded = self.prepare_word(word)?;
		for position in self.params.max_prefix_len..padded.len() {
			self.observe(&padded, position);
		}
		Ok(())
	}

	/// Adds only the character found at `index` in `word`.
	///
	/// `index == word length` records the end marker; larger indices are ignored.
	///
	/// # Errors
	/// Returns `InvalidCharacter` if the word holds anything but ascii letters.
	pub fn add_word_positional(&mut self, word: &str, index: usize) -> Result<()> {
		if index > word.chars().count() {
			return Ok(());
		}
		let padded = self.prepare_word(word)?;
		self.observe(&padded, self.params.max_prefix_len + index);
		Ok(())
	}

	/// Adds every word of `words`. Previously learned counts are kept.
	pub fn import_words<I, S>(&mut self, words: I) -> Result<()>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		for word in words {
			self.add_word(word.as_ref())?;
		}
		Ok(())
	}

	/// Adds the character at `index` of every word of `words`.
	pub fn import_words_positional<I, S>(&mut self, words: I, index: usize) -> Result<()>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		for word in words {
			self.add_word_positional(word.as_ref(), index)?;
		}
		Ok(())
	}

	/// Computes the weight of every symbol for the character following `context`.
	///
	/// Starts from the unconditional counts, then for each prefix length from
	/// `max_prefix_len` down to 1 adds the counts of the matching prefix table,
	/// multiplied by `base_prefix_mult << (len_prefix_mult * (length - 1))`.
	pub fn blended_weights(&self, context: &str) -> [u128; ALPHABET_SIZE] {
		let max_prefix_len = self.params.max_prefix_len;
		let mut blended = (*self.letters_raw.counts()).map(u128::from);

		let padded: Vec<char> = std::iter::repeat_n(FILLER, max_prefix_len)
			.chain(context.chars().map(|c| c.to_ascii_lowercase()))
			.collect();
		let window = &padded[padded.len() - max_prefix_len..];

		let mut weight = self.params.top_weight().unwrap_or_default() as u128;
		for prefix_len in (1..=max_prefix_len).rev() {
			weight = weight.checked_shr(self.params.len_prefix_mult).unwrap_or(0);
			let prefix: String = window[max_prefix_len - prefix_len..].iter().collect();
			let Some(table) = self.prefixes.get(&prefix) else {
				continue;
			};
			for (slot, count) in blended.iter_mut().zip(table.counts()) {
				*slot += *count as u128 * weight;
			}
		}

		blended
	}

	/// Draws the symbol following `context`.
	///
	/// Inverse-CDF sampling over the blended weights, in alphabet order:
	/// a value is drawn in `[1, total]` and each weight is subtracted from it
	/// until it is no longer positive.
	///
	/// # Errors
	/// Returns `EmptyModel` if the model was never trained.
	pub fn sample<R: Rng + ?Sized>(&self, context: &str, rng: &mut R) -> Result<Symbol> {
		let blended = self.blended_weights(context);
		let total: u128 = blended.iter().sum();
		if total == 0 {
			return Err(Error::EmptyModel);
		}

		let mut draw = rng.random_range(1..=total);
		for (index, weight) in blended.iter().enumerate() {
			if draw <= *weight {
				return Ok(symbol_at(index));
			}
			draw -= weight;
		}

		// draw never exceeds total
		Err(Error::EmptyModel)
	}

	/// Merges another model into this one by summing every count.
	///
	/// # Errors
	/// Returns `ParamsMismatch` if the two models were built differently.
	pub fn merge(&mut self, other: &Self) -> Result<()> {
		if self.params != other.params {
			return Err(Error::ParamsMismatch);
		}

		self.letters_raw.merge(&other.letters_raw);
		for (prefix, table) in &other.prefixes {
			if let Some(existing) = self.prefixes.get_mut(prefix) {
				existing.merge(table);
			} else {
				self.prefixes.insert(prefix.clone(), table.clone());
			}
		}

		Ok(())
	}

	/// Flattens the tables into `(prefix, character, count)` rows.
	///
	/// Unconditional rows come first, then prefix rows sorted by prefix.
	/// Zero counts are omitted.
	pub fn export(&self) -> Vec<ExportRow> {
		let mut rows: Vec<ExportRow> = self
			.letters_raw
			.iter_nonzero()
			.map(|(symbol, count)| ExportRow { prefix: String::new(), character: symbol.as_char(), count })
			.collect();

		let mut prefixes: Vec<&String> = self.prefixes.keys().collect();
		prefixes.sort();
		for prefix in prefixes {
			rows.extend(self.prefixes[prefix].iter_nonzero().map(|(symbol, count)| ExportRow {
				prefix: prefix.clone(),
				character: symbol.as_char(),
				count,
			}));
		}

		rows
	}

	/// Rebuilds a model from exported rows.
	///
	/// # Errors
	/// - `InvalidConfig` if the parameters are invalid
	/// - `InvalidExport` if a prefix is too long or a character is unknown
	pub fn from_export<I>(params: ModelParams, rows: I) -> Result<Self>
	where
		I: IntoIterator<Item = ExportRow>,
	{
		let mut model = Self::new(params)?;

		for row in rows {
			let index = index_of(row.character)
				.ok_or_else(|| Error::InvalidExport(format!("unknown character {:?}", row.character)))?;

			if row.prefix.is_empty() {
				model.letters_raw.add(index, row.count);
				continue;
			}

			if row.prefix.chars().count() > params.max_prefix_len {
				return Err(Error::InvalidExport(format!(
					"prefix {:?} longer than {} characters",
					row.prefix, params.max_prefix_len
				)));
			}
			if !row.prefix.chars().all(|c| c == FILLER || c.is_ascii_lowercase()) {
				return Err(Error::InvalidExport(format!("invalid prefix {:?}", row.prefix)));
			}
			model.prefixes.entry(row.prefix).or_default().add(index, row.count);
		}

		debug!(
			"Imported model with {} observations and {} prefixes",
			model.total_observations(),
			model.prefixes.len()
		);
		Ok(model)
	}
}
