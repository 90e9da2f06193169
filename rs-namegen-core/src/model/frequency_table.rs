use serde::{Deserialize, Serialize};

use super::alphabet::{ALPHABET_SIZE, Symbol, symbol_at};

/// Occurrence counts of every alphabet symbol in a given context.
///
/// Counts only grow: training increments them, sampling reads a copy.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FrequencyTable {
	counts: [u32; ALPHABET_SIZE],
}

impl Default for FrequencyTable {
	fn default() -> Self {
		Self { counts: [0; ALPHABET_SIZE] }
	}
}

impl FrequencyTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// Records one occurrence of the symbol at `index`.
	pub fn increment(&mut self, index: usize) {
		self.add(index, 1);
	}

	/// Records `count` occurrences of the symbol at `index`.
	pub fn add(&mut self, index: usize, count: u32) {
		self.counts[index] = self.counts[index].saturating_add(count);
	}

	pub fn get(&self, index: usize) -> u32 {
		self.counts[index]
	}

	/// Sum of all counts.
	pub fn total(&self) -> u64 {
		self.counts.iter().map(|&c| c as u64).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.counts.iter().all(|&c| c == 0)
	}

	/// Raw counts indexed by alphabet rank.
	pub fn counts(&self) -> &[u32; ALPHABET_SIZE] {
		&self.counts
	}

	/// Non-zero entries in alphabet order.
	pub fn iter_nonzero(&self) -> impl Iterator<Item = (Symbol, u32)> + '_ {
		self.counts
			.iter()
			.enumerate()
			.filter(|(_, count)| **count > 0)
			.map(|(index, count)| (symbol_at(index), *count))
	}

	/// Adds every count of `other` to this table.
	pub fn merge(&mut self, other: &Self) {
		for (index, count) in other.counts.iter().enumerate() {
			self.add(index, *count);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn counts_accumulate() {
		let mut table = FrequencyTable::new();
		assert!(table.is_empty());
		table.increment(1);
		table.increment(1);
		table.add(0, 3);
		assert_eq!(table.get(1), 2);
		assert_eq!(table.total(), 5);
		let entries: Vec<_> = table.iter_nonzero().collect();
		assert_eq!(entries, vec![(Symbol::End, 3), (Symbol::Letter('a'), 2)]);
	}

	#[test]
	fn merge_sums_counts() {
		let mut left = FrequencyTable::new();
		left.add(5, 2);
		let mut right = FrequencyTable::new();
		right.add(5, 1);
		right.add(26, 4);
		left.merge(&right);
		assert_eq!(left.get(5), 3);
		assert_eq!(left.get(26), 4);
		assert_eq!(left.total(), 7);
	}
}
