use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// 26 lowercase letters plus the end-of-word marker.
pub const ALPHABET_SIZE: usize = 26 + 1;

/// Character standing for the end of a word, alphabet index 0.
pub const END_MARKER: char = '$';

/// Context filler placed before a word so that its first characters have a
/// full-length prefix. It is never predicted.
pub const FILLER: char = '^';

/// A symbol the models can predict.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Symbol {
	Letter(char),
	End,
}

impl Symbol {
	/// Character used for this symbol in exported tables.
	pub fn as_char(&self) -> char {
		match self {
			Symbol::Letter(c) => *c,
			Symbol::End => END_MARKER,
		}
	}
}

/// Returns the alphabet index of `c`, after lowercasing.
///
/// `$` maps to 0, `a..=z` to `1..=26`. Anything else is `None`.
pub fn index_of(c: char) -> Option<usize> {
	let c = c.to_ascii_lowercase();
	match c {
		END_MARKER => Some(0),
		'a'..='z' => Some((c as u8 - b'a') as usize + 1),
		_ => None,
	}
}

/// Returns the symbol stored at alphabet index `index`.
///
/// # Panics
/// Panics if `index >= ALPHABET_SIZE`.
pub fn symbol_at(index: usize) -> Symbol {
	assert!(index < ALPHABET_SIZE, "alphabet index out of range: {index}");
	if index == 0 {
		Symbol::End
	} else {
		Symbol::Letter((b'a' + (index - 1) as u8) as char)
	}
}

/// True if `word` is non-empty and only made of ascii letters.
pub fn is_valid_word(word: &str) -> bool {
	!word.is_empty() && word.chars().all(|c| c.is_ascii_alphabetic())
}

/// Lowercases `word` and checks every character belongs to `a..=z`.
///
/// # Errors
/// Returns `InvalidCharacter` with the first offending character.
pub(crate) fn normalize(word: &str) -> Result<Vec<char>> {
	word.chars()
		.map(|c| {
			if c.is_ascii_alphabetic() {
				Ok(c.to_ascii_lowercase())
			} else {
				Err(Error::InvalidCharacter(c))
			}
		})
		.collect()
}
