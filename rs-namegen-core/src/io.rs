use std::fmt::Write as _;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::{env, fs, io};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::alphabet::is_valid_word;
use crate::model::char_model::ExportRow;

/// Header line of a corpus file.
pub const CORPUS_HEADER: &str = "masculine,feminine";

/// Header line of an exported model.
pub const EXPORT_HEADER: &str = "prefix,char,count";

/// File name used when an export path names no file.
pub const DEFAULT_EXPORT_FILE: &str = "CharGen_data.csv";

/// One row of a corpus: a masculine and a feminine word, either possibly empty.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct CorpusEntry {
	pub masculine: String,
	pub feminine: String,
}

/// Reads a text file and returns all its lines as a `Vec<String>`.
///
/// - Reads the entire file into memory
/// - Splits on `\n` / `\r\n`
pub fn read_file<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
	let mut contents = String::new();
	File::open(filename)?.read_to_string(&mut contents)?;
	Ok(contents.lines().map(str::to_owned).collect())
}

/// Builds an output path based on an input path and a new extension.
///
/// Example:
/// `data/processed.csv` + `"bin"` → `data/processed.bin`
pub fn build_output_path<P: AsRef<Path>>(
	input_path: P,
	output_extension: &str,
) -> io::Result<PathBuf> {
	let input_path = input_path.as_ref();

	let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
	let file_stem = input_path
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Input path has no filename"))?;

	let mut output = PathBuf::from(parent);
	output.push(file_stem);
	output.set_extension(output_extension);

	Ok(output)
}

/// Extracts the base filename without extension.
///
/// Examples:
/// - `"./data/processed.csv"` → `"processed"`
/// - `"processed.csv"` → `"processed"`
pub fn get_filename<P: AsRef<Path>>(input_path: P) -> io::Result<String> {
	let stem = input_path
		.as_ref()
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Path has no filename"))?;

	Ok(stem.to_string_lossy().to_string())
}

/// Normalize a folder path.
///
/// - `"."` or `"./"` resolves to the current working directory
/// - Other paths are returned as-is (not canonicalized)
pub fn normalize_folder(input: &str) -> PathBuf {
	if input == "." || input == "./" {
		env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
	} else {
		PathBuf::from(input)
	}
}

/// Lists all files with a given extension in a directory.
///
/// Returns file names only (no paths), sorted.
pub fn list_files<P: AsRef<Path>>(dir: P, extension: &str) -> io::Result<Vec<String>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let path = entry?.path();
		if path.is_file() && path.extension() == Some(std::ffi::OsStr::new(extension)) {
			if let Some(name) = path.file_name() {
				files.push(name.to_string_lossy().to_string());
			}
		}
	}

	files.sort();
	Ok(files)
}

/// Lowercases a corpus field, blanking it if it is not purely alphabetic.
fn clean_field(field: &str, line_number: usize) -> String {
	let field = field.trim();
	if field.is_empty() {
		return String::new();
	}
	if !is_valid_word(field) {
		warn!("Line {line_number}: dropping non-alphabetic word '{field}'");
		return String::new();
	}
	field.to_lowercase()
}

/// Parses corpus lines (header included) into entries.
///
/// - The first line is the header and is skipped
/// - Blank lines and lines without a comma are skipped
/// - Non-alphabetic fields are dropped, the other field of the row is kept
pub fn parse_corpus<S: AsRef<str>>(lines: &[S]) -> Vec<CorpusEntry> {
	lines
		.iter()
		.enumerate()
		.skip(1)
		.filter_map(|(number, line)| {
			let line = line.as_ref().trim();
			if line.is_empty() {
				return None;
			}
			let Some((masculine, feminine)) = line.split_once(',') else {
				warn!("Line {}: missing comma separator", number + 1);
				return None;
			};
			Some(CorpusEntry {
				masculine: clean_field(masculine, number + 1),
				feminine: clean_field(feminine, number + 1),
			})
		})
		.filter(|entry| !entry.masculine.is_empty() || !entry.feminine.is_empty())
		.collect()
}

/// Reads a `masculine,feminine` corpus file.
pub fn read_corpus<P: AsRef<Path>>(path: P) -> Result<Vec<CorpusEntry>> {
	let lines = read_file(path)?;
	Ok(parse_corpus(&lines))
}

/// Splits raw `gender,name` lines (header included) into masculine and
/// feminine names.
///
/// Lines shorter than 3 characters, unknown genders and non-alphabetic names
/// are ignored. Names keep their original case.
pub fn split_by_gender<S: AsRef<str>>(lines: &[S]) -> (Vec<String>, Vec<String>) {
	let mut masculine = Vec::new();
	let mut feminine = Vec::new();

	for line in lines.iter().skip(1) {
		let line = line.as_ref().trim();
		if line.len() < 3 {
			continue;
		}
		let Some((gender, name)) = line.split_once(',') else {
			continue;
		};
		let name = name.trim();
		if !is_valid_word(name) {
			continue;
		}
		match gender.trim() {
			"m" | "M" => masculine.push(name.to_owned()),
			"f" | "F" => feminine.push(name.to_owned()),
			_ => (),
		}
	}

	(masculine, feminine)
}

/// Formats two name lists as a corpus, pairing them row by row.
///
/// The shorter list leaves its column empty on the last rows.
pub fn format_corpus<S: AsRef<str>>(masculine: &[S], feminine: &[S]) -> String {
	let mut output = String::from(CORPUS_HEADER);
	output.push('\n');
	for row in 0..masculine.len().max(feminine.len()) {
		let masc = masculine.get(row).map_or("", |s| s.as_ref());
		let fem = feminine.get(row).map_or("", |s| s.as_ref());
		let _ = writeln!(output, "{masc},{fem}");
	}
	output
}

/// Converts a raw `gender,name` file into a `masculine,feminine` corpus file.
///
/// Returns the number of masculine and feminine names written.
pub fn preprocess_raw<PR, PC>(raw_path: PR, corpus_path: PC) -> Result<(usize, usize)>
where
	PR: AsRef<Path>,
	PC: AsRef<Path>,
{
	let lines = read_file(raw_path)?;
	let (masculine, feminine) = split_by_gender(&lines);
	fs::write(corpus_path, format_corpus(&masculine, &feminine))?;
	Ok((masculine.len(), feminine.len()))
}

/// Resolves where an export is written.
///
/// - An empty path gives `CharGen_data.csv`
/// - A path ending with a separator gets `CharGen_data.csv` appended
/// - Any other path missing the `.csv` extension gets it appended
pub fn resolve_export_path(path: &str) -> PathBuf {
	if path.is_empty() {
		PathBuf::from(DEFAULT_EXPORT_FILE)
	} else if path.ends_with('/') || path.ends_with('\\') {
		PathBuf::from(format!("{path}{DEFAULT_EXPORT_FILE}"))
	} else if path.ends_with(".csv") {
		PathBuf::from(path)
	} else {
		PathBuf::from(format!("{path}.csv"))
	}
}

/// Formats export rows as `prefix,char,count` CSV text.
pub fn format_export(rows: &[ExportRow]) -> String {
	let mut output = String::from(EXPORT_HEADER);
	output.push('\n');
	for row in rows {
		let _ = writeln!(output, "{},{},{}", row.prefix, row.character, row.count);
	}
	output
}

/// Parses `prefix,char,count` lines (header included).
///
/// # Errors
/// Returns `InvalidExport` on the first malformed line.
pub fn parse_export<S: AsRef<str>>(lines: &[S]) -> Result<Vec<ExportRow>> {
	let mut rows = Vec::new();
	for (number, line) in lines.iter().enumerate().skip(1) {
		let line = line.as_ref().trim_end();
		if line.is_empty() {
			continue;
		}
		let fields: Vec<&str> = line.splitn(3, ',').collect();
		let [prefix, character, count] = fields.as_slice() else {
			return Err(Error::InvalidExport(format!("line {}: expected 3 fields", number + 1)));
		};
		let mut chars = character.chars();
		let (Some(character), None) = (chars.next(), chars.next()) else {
			return Err(Error::InvalidExport(format!("line {}: expected a single character", number + 1)));
		};
		let count = count
			.trim()
			.parse::<u32>()
			.map_err(|_| Error::InvalidExport(format!("line {}: invalid count '{count}'", number + 1)))?;
		rows.push(ExportRow { prefix: (*prefix).to_owned(), character, count });
	}
	Ok(rows)
}

/// Writes export rows to `path`, resolved with `resolve_export_path`.
///
/// Returns the path actually written.
pub fn write_export(path: &str, rows: &[ExportRow]) -> Result<PathBuf> {
	let path = resolve_export_path(path);
	fs::write(&path, format_export(rows))?;
	Ok(path)
}

/// Reads an exported model file.
pub fn read_export<P: AsRef<Path>>(path: P) -> Result<Vec<ExportRow>> {
	let lines = read_file(path)?;
	parse_export(&lines)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn corpus_lines_are_cleaned() {
		let lines = [
			"masculine,feminine",
			"Louis,Marie",
			"jean,",
			",louise",
			"",
			"no separator",
			"jean-paul,anne",
			"x1,y2",
		];
		let corpus = parse_corpus(&lines);
		assert_eq!(
			corpus,
			vec![
				CorpusEntry { masculine: "louis".into(), feminine: "marie".into() },
				CorpusEntry { masculine: "jean".into(), feminine: String::new() },
				CorpusEntry { masculine: String::new(), feminine: "louise".into() },
				CorpusEntry { masculine: String::new(), feminine: "anne".into() },
			]
		);
	}

	#[test]
	fn raw_lines_split_by_gender() {
		let lines = ["gender,name", "m,Louis", "f,Marie", "f,Anne-Sophie", "x,Alex", "m", "F,Zoe"];
		let (masculine, feminine) = split_by_gender(&lines);
		assert_eq!(masculine, vec!["Louis"]);
		assert_eq!(feminine, vec!["Marie", "Zoe"]);
	}

	#[test]
	fn corpus_pairs_columns() {
		let text = format_corpus(&["louis"], &["marie", "zoe"]);
		assert_eq!(text, "masculine,feminine\nlouis,marie\n,zoe\n");
		let lines: Vec<&str> = text.lines().collect();
		assert_eq!(parse_corpus(&lines).len(), 2);
	}

	#[test]
	fn export_paths_follow_naming_rule() {
		assert_eq!(resolve_export_path(""), PathBuf::from("CharGen_data.csv"));
		assert_eq!(resolve_export_path("out/"), PathBuf::from("out/CharGen_data.csv"));
		assert_eq!(resolve_export_path("out/model"), PathBuf::from("out/model.csv"));
		assert_eq!(resolve_export_path("model.csv"), PathBuf::from("model.csv"));
	}

	#[test]
	fn export_text_round_trips() {
		let rows = vec![
			ExportRow { prefix: String::new(), character: '$', count: 2 },
			ExportRow { prefix: "^a".into(), character: 'n', count: 7 },
		];
		let text = format_export(&rows);
		assert_eq!(text, "prefix,char,count\n,$,2\n^a,n,7\n");
		let lines: Vec<&str> = text.lines().collect();
		assert_eq!(parse_export(&lines).unwrap(), rows);
	}

	#[test]
	fn malformed_export_lines_fail() {
		assert!(parse_export(&["prefix,char,count", "a,b"]).is_err());
		assert!(parse_export(&["prefix,char,count", "a,bc,1"]).is_err());
		assert!(parse_export(&["prefix,char,count", "a,b,-1"]).is_err());
	}

	#[test]
	fn build_output_path_swaps_extension() {
		let path = build_output_path("data/processed.csv", "bin").unwrap();
		assert_eq!(path, PathBuf::from("data/processed.bin"));
		assert_eq!(get_filename("./data/processed.csv").unwrap(), "processed");
	}
}
