use clap::{Arg, ArgMatches, Command};
use opencc_jieba_engine::dictionary_lib::Dictionary;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::process::ExitCode;

const BLUE: &str = "\x1B[1;34m"; // Bold Blue
const RESET: &str = "\x1B[0m"; // Reset color

fn cli() -> Command {
    Command::new("Dictionary Generator")
        .arg(
            Arg::new("dicts")
                .short('d')
                .long("dicts")
                .value_name("dir")
                .default_value("dicts")
                .help("Directory holding the 16 OpenCC text tables"),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_name("format")
                .value_parser(["zstd", "json"])
                .default_value("zstd")
                .help("Dictionary format: [zstd|json]"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("filename")
                .help("Write generated dictionary to <filename>. If not specified, a default filename is used."),
        )
        .about(format!(
            "{BLUE}Dict Generator: builds the precompiled opencc-jieba dictionary artifact{RESET}"
        ))
}

fn main() -> ExitCode {
    match run(&cli().get_matches()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let dict_dir = Path::new(
        matches
            .get_one::<String>("dicts")
            .map(String::as_str)
            .unwrap_or("dicts"),
    );
    if !dict_dir.is_dir() {
        return Err(format!("dictionary directory not found: {}", dict_dir.display()).into());
    }

    let dict_format = matches
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("zstd");
    let default_output = match dict_format {
        "json" => "dictionary.json",
        _ => "dictionary.json.zst",
    };
    let output_file = matches
        .get_one::<String>("output")
        .map(String::as_str)
        .unwrap_or(default_output);

    let dictionary = Dictionary::from_dir(dict_dir)?;
    match dict_format {
        "json" => {
            let file = BufWriter::new(File::create(output_file)?);
            serde_json::to_writer_pretty(file, &dictionary)?;
            eprintln!("{BLUE}Dictionary saved in JSON format at: {output_file}{RESET}");
        }
        _ => {
            dictionary.save_compressed(output_file)?;
            eprintln!("{BLUE}Dictionary saved in ZSTD format at: {output_file}{RESET}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencc_jieba_engine::dictionary_lib::DictKind;

    const TABLES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../dicts");

    #[test]
    fn writes_loadable_zstd_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("dictionary.json.zst");
        let matches = cli()
            .try_get_matches_from(["dict-generate", "-d", TABLES, "-o", output.to_str().unwrap()])
            .unwrap();
        run(&matches).unwrap();

        let loaded = Dictionary::load_compressed(&output).unwrap();
        assert_eq!(loaded.get(DictKind::StCharacters).get("龙"), Some("龍"));
        assert_eq!(loaded.get(DictKind::StCharacters).get("济"), Some("濟"));
        let embedded = Dictionary::new().unwrap();
        for kind in DictKind::ALL {
            assert_eq!(loaded.get(kind).map, embedded.get(kind).map, "{kind:?}");
        }
    }

    #[test]
    fn writes_json_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("dictionary.json");
        let matches = cli()
            .try_get_matches_from(["dict-generate", "-d", TABLES, "-f", "json", "-o", output.to_str().unwrap()])
            .unwrap();
        run(&matches).unwrap();
        let json: serde_json::Value =
            serde_json::from_reader(File::open(&output).unwrap()).unwrap();
        assert!(json.get("st_phrases").is_some());
    }

    #[test]
    fn missing_directory_fails() {
        let matches = cli()
            .try_get_matches_from(["dict-generate", "-d", "/no/such/dicts"])
            .unwrap();
        assert!(run(&matches).is_err());
    }
}
