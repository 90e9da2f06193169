use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;

use rs_namegen_core::config::{
	DEFAULT_BASE_PREFIX_MULT, DEFAULT_LEN_PREFIX_MULT, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_LEN, DEFAULT_MAX_PREFIX_LEN,
};
use rs_namegen_core::io::{preprocess_raw, write_export};
use rs_namegen_core::{GenerationRequest, ModelConfig, ModelKind, ModelParams, ModelSelector, PositionalModelSet};

#[derive(Parser, Debug)]
#[command(name = "rs-namegen")]
#[command(about = "Generates names from a corpus with positional Markov character models")]
struct Cli {
	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Generate names
	Generate(GenerateArgs),
	/// Write the tables of one model to a CSV file
	Export(ExportArgs),
	/// Split a raw `gender,name` file into a `masculine,feminine` corpus
	Preprocess(PreprocessArgs),
}

/// Corpus and model parameters, shared by the subcommands that train.
#[derive(Args, Debug)]
struct ModelArgs {
	/// Corpus file with `masculine,feminine` columns
	#[arg(long, default_value = "./data/processed.csv")]
	corpus: PathBuf,

	/// Maximum length of prefixes considered during generation.
	/// Higher values stick closer to existing names
	#[arg(short = 'l', long, default_value_t = DEFAULT_MAX_PREFIX_LEN)]
	max_prefix_len: usize,

	/// Prefix-length exponent: each extra prefix character multiplies its weight by 2^e
	#[arg(short = 'e', long, default_value_t = DEFAULT_LEN_PREFIX_MULT)]
	len_prefix_mult: u32,

	/// Base prefix multiplier. Lower values give more random names
	#[arg(short = 'b', long, default_value_t = DEFAULT_BASE_PREFIX_MULT)]
	base_prefix_mult: u64,

	/// Number of positional models, the longest name that can be generated
	#[arg(long, default_value_t = DEFAULT_MAX_LEN)]
	max_len: usize,

	/// Attempts allowed to get a name longer than 2 characters
	#[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
	max_attempts: usize,

	/// Always train from the corpus, ignoring and not writing the binary cache
	#[arg(long)]
	no_cache: bool,
}

impl ModelArgs {
	fn config(&self) -> ModelConfig {
		let params = ModelParams::default()
			.with_max_prefix_len(self.max_prefix_len)
			.with_len_prefix_mult(self.len_prefix_mult)
			.with_base_prefix_mult(self.base_prefix_mult);
		ModelConfig::default()
			.with_params(params)
			.with_max_len(self.max_len)
			.with_max_attempts(self.max_attempts)
	}

	fn load(&self) -> rs_namegen_core::Result<PositionalModelSet> {
		if self.no_cache {
			PositionalModelSet::from_corpus_file(&self.corpus, self.config())
		} else {
			PositionalModelSet::load(&self.corpus, self.config())
		}
	}
}

#[derive(Args, Debug)]
struct GenerateArgs {
	#[command(flatten)]
	model: ModelArgs,

	/// Generate masculine names
	#[arg(short, long)]
	masculine: bool,

	/// Generate feminine names. With -m, twice the count is generated.
	/// With neither, every name has its gender chosen 50/50
	#[arg(short, long)]
	feminine: bool,

	/// Generate names irrespective of character positions, from every word
	#[arg(short, long, conflicts_with_all = ["masculine", "feminine"])]
	global: bool,

	/// Beginning of every generated name (global generation only)
	#[arg(long, requires = "global")]
	seed: Option<String>,

	/// Number of names to generate
	#[arg(short, long, default_value_t = 1)]
	count: usize,

	/// Maximum length of the generated names
	#[arg(long)]
	max_length: Option<usize>,

	/// Seed of the random generator, for reproducible output
	#[arg(long)]
	rng_seed: Option<u64>,
}

#[derive(Args, Debug)]
struct ExportArgs {
	#[command(flatten)]
	model: ModelArgs,

	/// Model to export: `global`, `masculine:<index>` or `feminine:<index>`
	#[arg(long, default_value = "global")]
	select: ModelSelector,

	/// Output file. A directory gets `CharGen_data.csv`, a missing `.csv` is added
	#[arg(long, default_value = "")]
	out: String,
}

#[derive(Args, Debug)]
struct PreprocessArgs {
	/// Raw file with `gender,name` rows
	#[arg(long, default_value = "./data/raw.csv")]
	raw: PathBuf,

	/// Corpus file to write
	#[arg(long, default_value = "./data/processed.csv")]
	out: PathBuf,
}

fn generate(args: &GenerateArgs) -> Result<(), Box<dyn std::error::Error>> {
	let set = args.model.load()?;
	let mut rng = match args.rng_seed {
		Some(seed) => StdRng::seed_from_u64(seed),
		None => StdRng::from_os_rng(),
	};

	let mut kinds = Vec::new();
	if args.global {
		kinds.push(ModelKind::Global);
	}
	if args.masculine {
		kinds.push(ModelKind::Masculine);
	}
	if args.feminine {
		kinds.push(ModelKind::Feminine);
	}
	if kinds.is_empty() {
		kinds.push(ModelKind::Any);
	}

	for kind in kinds {
		let mut request = GenerationRequest::new(kind);
		if let Some(max_length) = args.max_length {
			request = request.with_max_length(max_length);
		}
		if let Some(seed) = &args.seed {
			request = request.with_seed(seed.as_str());
		}

		let names = (0..args.count)
			.map(|_| set.generate(&request, &mut rng))
			.collect::<Result<Vec<_>, _>>()?;
		println!("{}", names.join(" "));
	}

	Ok(())
}

fn export(args: &ExportArgs) -> Result<(), Box<dyn std::error::Error>> {
	let set = args.model.load()?;
	let rows = set.export(args.select)?;
	let path = write_export(&args.out, &rows)?;
	info!("Exported {} rows of the {} model to {}", rows.len(), args.select, path.display());
	Ok(())
}

fn preprocess(args: &PreprocessArgs) -> Result<(), Box<dyn std::error::Error>> {
	let (masculine, feminine) = preprocess_raw(&args.raw, &args.out)?;
	info!(
		"Wrote {masculine} masculine and {feminine} feminine names to {}",
		args.out.display()
	);
	Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let cli = Cli::parse();
	match &cli.command {
		Command::Generate(args) => generate(args),
		Command::Export(args) => export(args),
		Command::Preprocess(args) => preprocess(args),
	}
}
