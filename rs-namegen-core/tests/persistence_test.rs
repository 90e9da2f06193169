//! Corpus files, exports and the binary cache on disk.

use std::fs;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rs_namegen_core::io::{preprocess_raw, read_corpus, read_export, write_export};
use rs_namegen_core::{CharacterModel, Gender, ModelConfig, ModelParams, ModelSelector, PositionalModelSet};
use tempfile::tempdir;

const RAW: &str = "gender,name
m,Louis
f,Marie
f,Jeanne
m,Jean-Paul
m,Pierre
f,Camille
x,Alex
";

#[test]
fn test_preprocess_then_read_corpus() {
	let dir = tempdir().unwrap();
	let raw = dir.path().join("raw.csv");
	let corpus = dir.path().join("processed.csv");
	fs::write(&raw, RAW).unwrap();

	let (masculine, feminine) = preprocess_raw(&raw, &corpus).unwrap();
	assert_eq!((masculine, feminine), (2, 3));
	assert_eq!(
		fs::read_to_string(&corpus).unwrap(),
		"masculine,feminine\nLouis,Marie\nPierre,Jeanne\n,Camille\n"
	);

	let entries = read_corpus(&corpus).unwrap();
	assert_eq!(entries.len(), 3);
	assert_eq!(entries[0].masculine, "louis");
	assert_eq!(entries[2].masculine, "");
	assert_eq!(entries[2].feminine, "camille");
}

#[test]
fn test_cache_is_written_and_reused() {
	let dir = tempdir().unwrap();
	let raw = dir.path().join("raw.csv");
	let corpus = dir.path().join("names.csv");
	fs::write(&raw, RAW).unwrap();
	preprocess_raw(&raw, &corpus).unwrap();

	let config = ModelConfig::default();
	let trained = PositionalModelSet::load(&corpus, config).unwrap();
	let cache = dir.path().join("names.bin");
	assert!(cache.exists());

	let cached = PositionalModelSet::load(&corpus, config).unwrap();
	assert_eq!(cached, trained);

	// another configuration retrains instead of reusing the cache
	let other = ModelConfig::default().with_params(ModelParams::default().with_max_prefix_len(3));
	let retrained = PositionalModelSet::load(&corpus, other).unwrap();
	assert_eq!(retrained.config(), &other);
	assert_eq!(PositionalModelSet::from_corpus_file(&corpus, other).unwrap(), retrained);
}

#[test]
fn test_export_file_round_trip() {
	let dir = tempdir().unwrap();
	let raw = dir.path().join("raw.csv");
	let corpus = dir.path().join("names.csv");
	fs::write(&raw, RAW).unwrap();
	preprocess_raw(&raw, &corpus).unwrap();
	let set = PositionalModelSet::from_corpus_file(&corpus, ModelConfig::default()).unwrap();

	for selector in [ModelSelector::Global, ModelSelector::Positional(Gender::Feminine, 2)] {
		let rows = set.export(selector).unwrap();
		let target = dir.path().join("export");
		let written = write_export(target.to_str().unwrap(), &rows).unwrap();
		assert_eq!(written, dir.path().join("export.csv"));

		let imported = CharacterModel::from_export(set.config().params, read_export(&written).unwrap()).unwrap();
		let original = set.model(selector).unwrap();
		assert_eq!(&imported, original);

		let mut left = StdRng::seed_from_u64(5);
		let mut right = StdRng::seed_from_u64(5);
		for _ in 0..50 {
			assert_eq!(original.sample("ma", &mut left).unwrap(), imported.sample("ma", &mut right).unwrap());
		}
	}
}
