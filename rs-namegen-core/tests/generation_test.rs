//! End-to-end tests: corpus text in, generated names out.

use std::collections::HashMap;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rs_namegen_core::io::parse_corpus;
use rs_namegen_core::{
	CharacterModel, Error, GenerationRequest, ModelConfig, ModelKind, ModelParams, PositionalModelSet, Symbol,
};

const CORPUS: &str = "masculine,feminine
louis,marie
pierre,jeanne
jacques,margot
antoine,camille
nicolas,juliette
julien,
,charlotte
thomas,emma";

fn trained_set(config: ModelConfig) -> PositionalModelSet {
	let lines: Vec<&str> = CORPUS.lines().collect();
	let mut set = PositionalModelSet::new(config).unwrap();
	set.setup(parse_corpus(&lines)).unwrap();
	set
}

#[test]
fn test_positional_words_stay_in_bounds() {
	let set = trained_set(ModelConfig::default());
	let mut rng = StdRng::seed_from_u64(2024);

	for _ in 0..500 {
		let word = set.generate_any(&mut rng).unwrap();
		assert!(word.len() > 2 && word.len() <= 15, "{word}");
	}
}

#[test]
fn test_small_max_len_truncates() {
	let set = trained_set(ModelConfig::default().with_max_len(5));
	let mut rng = StdRng::seed_from_u64(1);

	for _ in 0..200 {
		let word = set.generate_feminine(&mut rng).unwrap();
		assert!((3..=5).contains(&word.len()), "{word}");
		let word = set.generate_non_positional(None, &mut rng).unwrap();
		assert!((3..=5).contains(&word.len()), "{word}");
	}
}

#[test]
fn test_same_seed_same_words() {
	let set = trained_set(ModelConfig::default());
	let request = GenerationRequest::new(ModelKind::Global).with_seed("ma");

	let mut left = StdRng::seed_from_u64(77);
	let mut right = StdRng::seed_from_u64(77);
	for _ in 0..20 {
		assert_eq!(set.generate(&request, &mut left).unwrap(), set.generate(&request, &mut right).unwrap());
	}
}

#[test]
fn test_first_letter_follows_corpus() {
	let set = trained_set(ModelConfig::default());
	let mut rng = StdRng::seed_from_u64(3);

	// masculine names only start with l, p, j, a, n, t
	for _ in 0..300 {
		let word = set.generate_masculine(&mut rng).unwrap();
		assert!("lpjant".contains(&word[..1]), "{word}");
	}
}

#[test]
fn test_sampling_matches_counts() {
	// Without any prefix, frequencies follow the unconditional counts
	let params = ModelParams::default().with_max_prefix_len(0);
	let mut model = CharacterModel::new(params).unwrap();
	model.import_words_positional(["aa", "ab", "ab", "ab"], 1).unwrap();

	let mut rng = StdRng::seed_from_u64(10);
	let mut counts: HashMap<Symbol, usize> = HashMap::new();
	let samples = 20_000;
	for _ in 0..samples {
		*counts.entry(model.sample("", &mut rng).unwrap()).or_default() += 1;
	}

	let b = counts[&Symbol::Letter('b')] as f64 / samples as f64;
	assert!((b - 0.75).abs() < 0.02, "b frequency {b}");
	assert_eq!(counts.len(), 2);
}

#[test]
fn test_empty_corpus_cannot_generate() {
	let lines = ["masculine,feminine"];
	let mut set = PositionalModelSet::new(ModelConfig::default()).unwrap();
	set.setup(parse_corpus(&lines)).unwrap();
	let mut rng = StdRng::seed_from_u64(0);

	assert!(matches!(set.generate_masculine(&mut rng), Err(Error::EmptyModel)));
	assert!(matches!(set.generate_non_positional(None, &mut rng), Err(Error::EmptyModel)));
}

#[test]
fn test_invalid_request_is_rejected() {
	let set = trained_set(ModelConfig::default());
	let mut rng = StdRng::seed_from_u64(0);

	let request = GenerationRequest::new(ModelKind::Masculine).with_max_length(2);
	assert!(matches!(set.generate(&request, &mut rng), Err(Error::InvalidRequest(_))));
	let request = GenerationRequest::new(ModelKind::Feminine).with_seed("ma");
	assert!(matches!(set.generate(&request, &mut rng), Err(Error::InvalidRequest(_))));
}
