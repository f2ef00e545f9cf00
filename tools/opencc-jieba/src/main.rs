mod office;

use std::fs::File;
use std::io::{self, BufWriter, IsTerminal, Read, Write};
use std::path::Path;
use std::process::ExitCode;

use clap::{Arg, ArgAction, ArgMatches, Command};
use encoding_rs::Encoding;
use encoding_rs_io::DecodeReaderBytesBuilder;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use opencc_jieba_engine::{EngineConfig, OpenccConfig, OpenccHandle};

use crate::office::{OfficeFormat, OfficeJob};

const BLUE: &str = "\x1B[1;34m";
const RESET: &str = "\x1B[0m";

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let matches = cli().get_matches();
    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn io_args() -> [Arg; 2] {
    [
        Arg::new("input")
            .short('i')
            .long("input")
            .value_name("file")
            .help("Read original text from <file>."),
        Arg::new("output")
            .short('o')
            .long("output")
            .value_name("file")
            .help("Write result to <file>."),
    ]
}

fn cli() -> Command {
    let config_names = OpenccConfig::ALL.map(OpenccConfig::as_str);
    Command::new("opencc-jieba")
        .about(format!(
            "{BLUE}OpenCC Jieba: Chinese conversion, segmentation and keyword extraction{RESET}"
        ))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("in_enc")
                .long("in-enc")
                .value_name("encoding")
                .default_value("UTF-8")
                .global(true)
                .help("Encoding for input"),
        )
        .arg(
            Arg::new("out_enc")
                .long("out-enc")
                .value_name("encoding")
                .default_value("UTF-8")
                .global(true)
                .help("Encoding for output"),
        )
        .arg(
            Arg::new("engine_config")
                .long("engine-config")
                .value_name("json")
                .global(true)
                .help("Engine settings file (dictionary paths, thresholds)"),
        )
        .subcommand(
            Command::new("convert")
                .about("Convert Chinese text")
                .args(io_args())
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .value_name("conversion")
                        .value_parser(config_names)
                        .required(true)
                        .help("Conversion configuration"),
                )
                .arg(
                    Arg::new("punct")
                        .short('p')
                        .long("punct")
                        .action(ArgAction::SetTrue)
                        .help("Also convert punctuation"),
                ),
        )
        .subcommand(
            Command::new("segment")
                .about("Segment text into words")
                .args(io_args())
                .arg(
                    Arg::new("delimiter")
                        .short('d')
                        .long("delimiter")
                        .default_value("/")
                        .help("Token delimiter"),
                )
                .arg(
                    Arg::new("no_hmm")
                        .long("no-hmm")
                        .action(ArgAction::SetTrue)
                        .help("Disable HMM for unknown words"),
                ),
        )
        .subcommand(
            Command::new("keywords")
                .about("Extract keywords")
                .args(io_args())
                .arg(
                    Arg::new("top_k")
                        .short('k')
                        .long("top-k")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("10")
                        .help("Number of keywords"),
                )
                .arg(
                    Arg::new("method")
                        .short('m')
                        .long("method")
                        .value_parser(["textrank", "tfidf"])
                        .default_value("textrank")
                        .help("Extraction method"),
                )
                .arg(
                    Arg::new("weights")
                        .short('w')
                        .long("weights")
                        .action(ArgAction::SetTrue)
                        .help("Print weights next to keywords"),
                ),
        )
        .subcommand(
            Command::new("office")
                .about("Convert an Office document or EPUB (docx, xlsx, pptx, odt, ods, odp, epub)")
                .arg(
                    Arg::new("input")
                        .short('i')
                        .long("input")
                        .value_name("file")
                        .required(true)
                        .help("Document to convert"),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("file")
                        .help("Converted document [default: <name>_converted.<ext>]"),
                )
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .value_name("conversion")
                        .value_parser(config_names)
                        .required(true)
                        .help("Conversion configuration"),
                )
                .arg(
                    Arg::new("punct")
                        .short('p')
                        .long("punct")
                        .action(ArgAction::SetTrue)
                        .help("Also convert punctuation"),
                )
                .arg(
                    Arg::new("format")
                        .short('f')
                        .long("format")
                        .value_parser(OfficeFormat::NAMES)
                        .help("Document format [default: from the input extension]"),
                )
                .arg(
                    Arg::new("keep_font")
                        .long("keep-font")
                        .action(ArgAction::SetTrue)
                        .help("Leave font names unconverted"),
                ),
        )
        .subcommand(
            Command::new("check")
                .about("Detect script: 1 Traditional, 2 Simplified, 0 mixed/undetermined")
                .args(io_args()),
        )
}

fn run(matches: &ArgMatches) -> CliResult<()> {
    let handle = match matches.get_one::<String>("engine_config") {
        Some(path) => OpenccHandle::with_config(&EngineConfig::from_json_file(path)?)?,
        None => OpenccHandle::create()?,
    };

    let (name, sub) = matches
        .subcommand()
        .ok_or("a subcommand is required")?;
    if name == "office" {
        return run_office(&handle, sub);
    }
    let in_enc = arg(sub, "in_enc")?;
    let out_enc = arg(sub, "out_enc")?;
    let input_file = sub.get_one::<String>("input").map(String::as_str);
    let input = read_input(input_file, in_enc)?;
    debug!(command = name, bytes = input.len());

    let output = match name {
        "convert" => {
            let config = arg(sub, "config")?;
            handle.convert(&input, config, sub.get_flag("punct"))?
        }
        "segment" => {
            let delimiter = arg(sub, "delimiter")?;
            let mut joined = handle.segment_and_join(&input, !sub.get_flag("no_hmm"), delimiter)?;
            joined.push('\n');
            joined
        }
        "keywords" => {
            let top_k = sub.get_one::<usize>("top_k").copied().unwrap_or(10);
            let method = arg(sub, "method")?;
            let mut lines = String::new();
            if sub.get_flag("weights") {
                for k in handle.extract_keywords_weighted(&input, top_k, method)? {
                    lines.push_str(&format!("{}\t{:.6}\n", k.keyword, k.weight));
                }
            } else {
                for k in handle.extract_keywords(&input, top_k, method)? {
                    lines.push_str(&k);
                    lines.push('\n');
                }
            }
            lines
        }
        "check" => format!("{}\n", handle.check_script(&input)?),
        other => return Err(format!("unknown command: {other}").into()),
    };

    write_output(sub.get_one::<String>("output").map(String::as_str), out_enc, &output)?;

    if let Some(input_file) = input_file {
        if name == "convert" {
            eprintln!(
                "{BLUE}Conversion completed ({}): {input_file} -> {}{RESET}",
                arg(sub, "config")?,
                sub.get_one::<String>("output").map_or("stdout", String::as_str)
            );
        }
    }
    Ok(())
}

fn run_office(handle: &OpenccHandle, sub: &ArgMatches) -> CliResult<()> {
    let input = Path::new(arg(sub, "input")?);
    let format = match sub.get_one::<String>("format") {
        Some(name) => OfficeFormat::from_name(name),
        None => OfficeFormat::from_path(input),
    }
    .ok_or_else(|| format!("{}: unsupported document format", input.display()))?;
    let output = match sub.get_one::<String>("output") {
        Some(path) => Path::new(path).to_path_buf(),
        None => office::default_output_path(input),
    };
    let job = OfficeJob {
        format,
        config: arg(sub, "config")?,
        punctuation: sub.get_flag("punct"),
        keep_font: sub.get_flag("keep_font"),
    };

    let converted = office::convert_file(handle, input, &output, &job)?;
    eprintln!(
        "{BLUE}Conversion completed ({}, {converted} parts): {} -> {}{RESET}",
        job.config,
        input.display(),
        output.display()
    );
    Ok(())
}

fn arg<'a>(matches: &'a ArgMatches, id: &str) -> CliResult<&'a str> {
    matches
        .get_one::<String>(id)
        .map(String::as_str)
        .ok_or_else(|| format!("missing argument: {id}").into())
}

fn read_input(input_file: Option<&str>, in_enc: &str) -> CliResult<String> {
    let mut bytes = Vec::new();
    match input_file {
        Some(file_name) => {
            File::open(file_name)
                .map_err(|e| format!("{file_name}: {e}"))?
                .read_to_end(&mut bytes)?;
        }
        None => {
            if io::stdin().is_terminal() {
                eprintln!("{BLUE}Input text, <ctrl-z> or <ctrl-d> to submit:{RESET}");
            }
            io::stdin().read_to_end(&mut bytes)?;
        }
    }
    decode(&bytes, in_enc)
}

fn decode(bytes: &[u8], in_enc: &str) -> CliResult<String> {
    let text = if in_enc.eq_ignore_ascii_case("UTF-8") {
        String::from_utf8_lossy(bytes).into_owned()
    } else {
        let encoding = Encoding::for_label(in_enc.as_bytes())
            .ok_or_else(|| format!("Unsupported input encoding: {in_enc}"))?;
        let mut decoder = DecodeReaderBytesBuilder::new()
            .encoding(Some(encoding))
            .build(bytes);
        let mut text = String::new();
        decoder.read_to_string(&mut text)?;
        text
    };
    Ok(match text.strip_prefix('\u{FEFF}') {
        Some(rest) => rest.to_owned(),
        None => text,
    })
}

fn encode(text: &str, out_enc: &str) -> CliResult<Vec<u8>> {
    if out_enc.eq_ignore_ascii_case("UTF-8") {
        return Ok(text.as_bytes().to_vec());
    }
    let encoding = Encoding::for_label(out_enc.as_bytes())
        .ok_or_else(|| format!("Unsupported output encoding: {out_enc}"))?;
    Ok(encoding.encode(text).0.into_owned())
}

fn write_output(output_file: Option<&str>, out_enc: &str, text: &str) -> CliResult<()> {
    let output: Box<dyn Write> = match output_file {
        Some(file_name) => Box::new(File::create(file_name).map_err(|e| format!("{file_name}: {e}"))?),
        None => Box::new(io::stdout()),
    };
    let mut output_buf = BufWriter::new(output);
    output_buf.write_all(&encode(text, out_enc)?)?;
    output_buf.flush()?;
    Ok(())
}
