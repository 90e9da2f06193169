use std::path::PathBuf;
use std::sync::Mutex;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, put, web};
use clap::Parser;
use log::{info, warn};
use serde::Deserialize;

use rs_namegen_core::io::{format_export, get_filename, list_files, normalize_folder};
use rs_namegen_core::{GenerationRequest, ModelConfig, ModelKind, ModelParams, ModelSelector, PositionalModelSet};

/// Most names a single `/v1/generate` call may return.
const MAX_COUNT: usize = 100;

#[derive(Parser, Debug)]
#[command(name = "rs-namegen-server")]
#[command(about = "HTTP API serving generated names")]
struct ServerArgs {
	#[arg(long, default_value = "127.0.0.1")]
	host: String,

	#[arg(long, default_value_t = 5000)]
	port: u16,

	/// Folder holding the corpus files
	#[arg(long, default_value = "./data")]
	data_dir: String,

	/// Corpus loaded at startup (file name without `.csv`)
	#[arg(long)]
	corpus: Option<String>,

	#[arg(short = 'l', long, default_value_t = rs_namegen_core::config::DEFAULT_MAX_PREFIX_LEN)]
	max_prefix_len: usize,

	#[arg(short = 'e', long, default_value_t = rs_namegen_core::config::DEFAULT_LEN_PREFIX_MULT)]
	len_prefix_mult: u32,

	#[arg(short = 'b', long, default_value_t = rs_namegen_core::config::DEFAULT_BASE_PREFIX_MULT)]
	base_prefix_mult: u64,

	#[arg(long, default_value_t = rs_namegen_core::config::DEFAULT_MAX_LEN)]
	max_len: usize,

	/// Attempts allowed to get a name longer than 2 characters
	#[arg(long, default_value_t = rs_namegen_core::config::DEFAULT_MAX_ATTEMPTS)]
	max_attempts: usize,
}

impl ServerArgs {
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
}

/// Struct representing query parameters for the `/v1/generate` endpoint
#[derive(Deserialize)]
struct GenerateParams {
	kind: Option<String>,
	max_length: Option<usize>,
	seed: Option<String>,
	count: Option<usize>,
}

impl GenerateParams {
	/// Builds the generation request and the number of names asked for.
	fn request(&self) -> Result<(GenerationRequest, usize), String> {
		let kind = match &self.kind {
			None => ModelKind::Any,
			Some(s) => s.parse::<ModelKind>().map_err(|e| e.to_string())?,
		};

		let mut request = GenerationRequest::new(kind);
		if let Some(max_length) = self.max_length {
			request = request.with_max_length(max_length);
		}
		if let Some(seed) = &self.seed {
			request = request.with_seed(seed.as_str());
		}

		let count = self.count.unwrap_or(1);
		if count == 0 || count > MAX_COUNT {
			return Err(format!("count must be between 1 and {MAX_COUNT}"));
		}
		Ok((request, count))
	}
}

#[derive(Deserialize)]
struct CorpusQuery {
	name: Option<String>,
}

#[derive(Deserialize)]
struct ExportQuery {
	model: Option<String>,
}

struct SharedData {
	data_dir: PathBuf,
	config: ModelConfig,
	corpus: Option<String>,
	model: PositionalModelSet,
}

impl SharedData {
	/// Trains (or loads from cache) the corpus `<data_dir>/<name>.csv`.
	fn load_corpus(&mut self, name: &str) -> rs_namegen_core::Result<()> {
		let path = self.data_dir.join(format!("{name}.csv"));
		self.model = PositionalModelSet::load(&path, self.config)?;
		self.corpus = Some(get_filename(&path)?);
		info!("Loaded corpus {}", path.display());
		Ok(())
	}
}

/// HTTP GET endpoint `/v1/generate`
///
/// Generates `count` names, one per line, with the loaded models.
#[get("/v1/generate")]
async fn get_generated(data: web::Data<Mutex<SharedData>>, query: web::Query<GenerateParams>) -> impl Responder {
	let (request, count) = match query.request() {
		Ok(r) => r,
		Err(e) => return HttpResponse::BadRequest().body(e),
	};

	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let mut rng = rand::rng();
	let mut names = Vec::with_capacity(count);
	for _ in 0..count {
		match shared_data.model.generate(&request, &mut rng) {
			Ok(name) => names.push(name),
			Err(e @ rs_namegen_core::Error::InvalidRequest(_)) => return HttpResponse::BadRequest().body(e.to_string()),
			Err(e) => return HttpResponse::InternalServerError().body(e.to_string()),
		}
	}

	HttpResponse::Ok().body(names.join("\n"))
}

#[get("/v1/corpora")]
async fn get_corpora(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let data_dir = match data.lock() {
		Ok(m) => m.data_dir.clone(),
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	match list_files(&data_dir, "csv") {
		Ok(files) => HttpResponse::Ok().body(files.join("\n").replace(".csv", "")),
		Err(_) => HttpResponse::InternalServerError().body("Failed to list corpora"),
	}
}

#[get("/v1/loaded_corpus")]
async fn get_loaded_corpus(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	HttpResponse::Ok().body(shared_data.corpus.clone().unwrap_or_default())
}

#[put("/v1/load_corpus")]
async fn put_corpus(data: web::Data<Mutex<SharedData>>, query: web::Query<CorpusQuery>) -> impl Responder {
	let name = match &query.name {
		Some(s) if !s.trim().is_empty() => s.trim(),
		_ => return HttpResponse::BadRequest().body("Missing or empty corpus name"),
	};
	if name.contains(['/', '\\']) || name.contains("..") {
		return HttpResponse::BadRequest().body("Invalid corpus name");
	}

	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	match shared_data.load_corpus(name) {
		Ok(_) => HttpResponse::Ok().body("Corpus loaded successfully"),
		Err(e) => HttpResponse::InternalServerError().body(format!("Failed to load corpus: {e}")),
	}
}

#[get("/v1/config")]
async fn get_config(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	match data.lock() {
		Ok(m) => HttpResponse::Ok().json(m.config),
		Err(_) => HttpResponse::InternalServerError().body("Model lock failed"),
	}
}

/// HTTP GET endpoint `/v1/export`
///
/// Returns the `prefix,char,count` table of one model as CSV.
#[get("/v1/export")]
async fn get_export(data: web::Data<Mutex<SharedData>>, query: web::Query<ExportQuery>) -> impl Responder {
	let selector = match query.model.as_deref().unwrap_or("global").parse::<ModelSelector>() {
		Ok(s) => s,
		Err(e) => return HttpResponse::BadRequest().body(e.to_string()),
	};

	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	match shared_data.model.export(selector) {
		Ok(rows) => HttpResponse::Ok().content_type("text/csv").body(format_export(&rows)),
		Err(e) => HttpResponse::BadRequest().body(e.to_string()),
	}
}

/// Main entry point for the server.
///
/// Loads the startup corpus if one is given, wraps the models in a `Mutex`
/// and starts an Actix-web HTTP server.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
	let args = ServerArgs::parse();

	let config = args.config();
	let model = PositionalModelSet::new(config).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
	let mut shared_data = SharedData {
		data_dir: normalize_folder(&args.data_dir),
		config,
		corpus: None,
		model,
	};
	if let Some(name) = &args.corpus {
		if let Err(e) = shared_data.load_corpus(name) {
			warn!("Failed to load corpus {name}: {e}");
		}
	}
	let shared_model = web::Data::new(Mutex::new(shared_data));

	info!("Listening on {}:{}", args.host, args.port);
	HttpServer::new(move || {
		App::new()
			.wrap(Logger::default())
			.wrap(Cors::permissive())
			.app_data(shared_model.clone())
			.service(get_generated)
			.service(get_corpora)
			.service(get_loaded_corpus)
			.service(put_corpus)
			.service(get_config)
			.service(get_export)
	})
		.bind((args.host.as_str(), args.port))?
		.run()
		.await
}

#[cfg(test)]
mod tests {
	use super::*;
	use actix_web::{http::StatusCode, test};
	use rs_namegen_core::CorpusEntry;

	fn shared() -> web::Data<Mutex<SharedData>> {
		let config = ModelConfig::default();
		let mut model = PositionalModelSet::new(config).unwrap();
		model
			.setup(vec![
				CorpusEntry { masculine: "louis".into(), feminine: "marie".into() },
				CorpusEntry { masculine: "pierre".into(), feminine: "jeanne".into() },
			])
			.unwrap();
		web::Data::new(Mutex::new(SharedData {
			data_dir: PathBuf::from("./data"),
			config,
			corpus: Some("test".into()),
			model,
		}))
	}

	#[::core::prelude::v1::test]
	fn model_flags_parse() {
		let args = ServerArgs::parse_from(["rs-namegen-server", "-l", "3", "--max-len", "12", "--max-attempts", "50"]);
		let config = args.config();
		assert_eq!(config.params.max_prefix_len, 3);
		assert_eq!(config.max_len, 12);
		assert_eq!(config.max_attempts, 50);

		let defaults = ServerArgs::parse_from(["rs-namegen-server"]).config();
		assert_eq!(defaults, ModelConfig::default());
	}

	#[actix_web::test]
	async fn generate_returns_count_names() {
		let app = test::init_service(App::new().app_data(shared()).service(get_generated)).await;
		let req = test::TestRequest::get().uri("/v1/generate?kind=feminine&count=3").to_request();
		let body = test::call_and_read_body(&app, req).await;
		let text = std::str::from_utf8(&body).unwrap();
		assert_eq!(text.lines().count(), 3);
		assert!(text.lines().all(|name| name.len() > 2));
	}

	#[actix_web::test]
	async fn bad_parameters_are_rejected() {
		let app = test::init_service(App::new().app_data(shared()).service(get_generated).service(get_export)).await;
		for uri in [
			"/v1/generate?kind=unknown",
			"/v1/generate?count=0",
			"/v1/generate?kind=masculine&seed=ma",
			"/v1/export?model=masculine:99",
		] {
			let req = test::TestRequest::get().uri(uri).to_request();
			let resp = test::call_service(&app, req).await;
			assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
		}
	}

	#[actix_web::test]
	async fn export_returns_csv() {
		let app = test::init_service(App::new().app_data(shared()).service(get_export)).await;
		let req = test::TestRequest::get().uri("/v1/export?model=masculine:0").to_request();
		let body = test::call_and_read_body(&app, req).await;
		let text = std::str::from_utf8(&body).unwrap();
		assert!(text.starts_with("prefix,char,count\n"));
		assert!(text.contains(",l,1"));
		assert!(text.contains(",p,1"));
	}

	#[actix_web::test]
	async fn load_rejects_path_names() {
		let app = test::init_service(App::new().app_data(shared()).service(put_corpus)).await;
		let req = test::TestRequest::put().uri("/v1/load_corpus?name=../secret").to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
	}
}
