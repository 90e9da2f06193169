use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default number of context characters considered when sampling.
pub const DEFAULT_MAX_PREFIX_LEN: usize = 2;
/// Default shift, in bits, between the weights of two consecutive prefix lengths.
pub const DEFAULT_LEN_PREFIX_MULT: u32 = 4;
/// Default weight of a length-1 prefix observation.
pub const DEFAULT_BASE_PREFIX_MULT: u64 = u16::MAX as u64;
/// Default number of positional models, also the default maximum word length.
pub const DEFAULT_MAX_LEN: usize = 15;
/// Default number of generation attempts before giving up on short words.
pub const DEFAULT_MAX_ATTEMPTS: usize = 1000;

/// Blending parameters of a `CharacterModel`.
///
/// They are fixed when the model is built: lookups and weights depend on them,
/// so a trained model never exposes a way to change them.
///
/// # Invariants
/// - `base_prefix_mult << (len_prefix_mult * max_prefix_len)` fits in 64 bits
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModelParams {
	/// Longest context (in characters) used to condition the next character.
	pub max_prefix_len: usize,

	/// How many bits a prefix one character longer is shifted left by.
	pub len_prefix_mult: u32,

	/// Base weight applied to the shortest prefix.
	pub base_prefix_mult: u64,
}

impl Default for ModelParams {
	fn default() -> Self {
		Self {
			max_prefix_len: DEFAULT_MAX_PREFIX_LEN,
			len_prefix_mult: DEFAULT_LEN_PREFIX_MULT,
			base_prefix_mult: DEFAULT_BASE_PREFIX_MULT,
		}
	}
}

impl ModelParams {
	pub fn with_max_prefix_len(mut self, max_prefix_len: usize) -> Self {
		self.max_prefix_len = max_prefix_len;
		self
	}

	pub fn with_len_prefix_mult(mut self, len_prefix_mult: u32) -> Self {
		self.len_prefix_mult = len_prefix_mult;
		self
	}

	pub fn with_base_prefix_mult(mut self, base_prefix_mult: u64) -> Self {
		self.base_prefix_mult = base_prefix_mult;
		self
	}

	/// Weight of the longest prefix, before the first shift of the blending loop.
	///
	/// Returns `None` when it does not fit in 64 bits.
	pub fn top_weight(&self) -> Option<u64> {
		let shift = (self.len_prefix_mult as usize).checked_mul(self.max_prefix_len)?;
		if shift >= 64 {
			return if self.base_prefix_mult == 0 { Some(0) } else { None };
		}
		let weight = (self.base_prefix_mult as u128) << shift;
		u64::try_from(weight).ok()
	}

	/// Checks that the weights of every prefix length are representable.
	///
	/// # Errors
	/// Returns `InvalidConfig` if the top weight overflows 64 bits.
	pub fn validate(&self) -> Result<()> {
		if self.top_weight().is_none() {
			return Err(Error::InvalidConfig(format!(
				"base_prefix_mult ({}) << (len_prefix_mult ({}) * max_prefix_len ({})) overflows 64 bits",
				self.base_prefix_mult, self.len_prefix_mult, self.max_prefix_len
			)));
		}
		Ok(())
	}
}

/// Full configuration of a `PositionalModelSet`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModelConfig {
	/// Parameters shared by every character model of the set.
	pub params: ModelParams,

	/// Number of positional models, and the longest word that can be generated.
	pub max_len: usize,

	/// Attempts allowed to produce a word longer than 2 characters.
	pub max_attempts: usize,
}

impl Default for ModelConfig {
	fn default() -> Self {
		Self {
			params: ModelParams::default(),
			max_len: DEFAULT_MAX_LEN,
			max_attempts: DEFAULT_MAX_ATTEMPTS,
		}
	}
}

impl ModelConfig {
	pub fn with_params(mut self, params: ModelParams) -> Self {
		self.params = params;
		self
	}

	pub fn with_max_len(mut self, max_len: usize) -> Self {
		self.max_len = max_len;
		self
	}

	pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
		self.max_attempts = max_attempts;
		self
	}

	/// # Errors
	/// Returns `InvalidConfig` if the parameters overflow, if `max_len` leaves no
	/// room for a word longer than 2 characters, or if no attempt is allowed.
	pub fn validate(&self) -> Result<()> {
		self.params.validate()?;
		if self.max_len < 3 {
			return Err(Error::InvalidConfig(format!("max_len must be >= 3, got {}", self.max_len)));
		}
		if self.max_attempts == 0 {
			return Err(Error::InvalidConfig("max_attempts must be >= 1".to_owned()));
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_are_valid() {
		let config = ModelConfig::default();
		assert_eq!(config.params.max_prefix_len, 2);
		assert_eq!(config.params.len_prefix_mult, 4);
		assert_eq!(config.params.base_prefix_mult, 65535);
		assert_eq!(config.max_len, 15);
		assert!(config.validate().is_ok());
		assert_eq!(config.params.top_weight(), Some(65535 << 8));
	}

	#[test]
	fn overflowing_weights_are_rejected() {
		let params = ModelParams::default().with_len_prefix_mult(32).with_max_prefix_len(2);
		assert!(matches!(params.validate(), Err(Error::InvalidConfig(_))));

		let params = ModelParams::default().with_len_prefix_mult(8).with_max_prefix_len(6);
		assert!(params.validate().is_ok());
	}

	#[test]
	fn zero_prefix_len_is_valid() {
		let params = ModelParams::default().with_max_prefix_len(0);
		assert_eq!(params.top_weight(), Some(65535));
		assert!(params.validate().is_ok());
	}

	#[test]
	fn short_max_len_is_rejected() {
		let config = ModelConfig::default().with_max_len(2);
		assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
		let config = ModelConfig::default().with_max_attempts(0);
		assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
	}
}
