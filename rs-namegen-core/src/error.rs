use thiserror::Error;

/// Result type alias for name generation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the models, the generation surface and the I/O layer.
#[derive(Error, Debug)]
pub enum Error {
	/// A model with no observation at all was asked for a character.
	#[error("model has no training data")]
	EmptyModel,

	/// A word contained a character outside `a..=z` after lowercasing.
	#[error("invalid character {0:?}, only ascii letters are accepted")]
	InvalidCharacter(char),

	/// Tunable parameters out of their valid range.
	#[error("invalid configuration: {0}")]
	InvalidConfig(String),

	/// Generation request that cannot be satisfied.
	#[error("invalid request: {0}")]
	InvalidRequest(String),

	/// Two models built with different parameters cannot be combined.
	#[error("model parameters mismatch")]
	ParamsMismatch,

	/// Every attempt produced a word of two characters or less.
	#[error("no word longer than 2 characters after {0} attempts")]
	RetriesExhausted(usize),

	/// Malformed row in an exported model table.
	#[error("invalid export row: {0}")]
	InvalidExport(String),

	#[error("io error: {0}")]
	Io(#[from] std::io::Error),

	/// Binary model cache could not be encoded or decoded.
	#[error("cache error: {0}")]
	Cache(#[from] postcard::Error),
}
