use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use opencc_jieba_engine::OpenccHandle;

use crate::CliResult;

static DOCX_FONT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(w:(?:eastAsia|ascii|hAnsi|cs)=")(.*?)(")"#).expect("font regex"));
static XLSX_FONT: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(val=")(.*?)(")"#).expect("font regex"));
static PPTX_FONT: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(typeface=")(.*?)(")"#).expect("font regex"));
static ODF_FONT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"((?:style:font-name(?:-asian|-complex)?|svg:font-family|style:name)=['"])([^'"]+)(['"])"#,
    )
    .expect("font regex")
});
static EPUB_FONT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(font-family\s*:\s*)([^;"']+)"#).expect("font regex"));

/// Zip-based document formats whose text parts can be converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfficeFormat {
    Docx,
    Xlsx,
    Pptx,
    Odt,
    Ods,
    Odp,
    Epub,
}

impl OfficeFormat {
    pub const NAMES: [&'static str; 7] = ["docx", "xlsx", "pptx", "odt", "ods", "odp", "epub"];

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name.to_ascii_lowercase().as_str() {
            "docx" => OfficeFormat::Docx,
            "xlsx" => OfficeFormat::Xlsx,
            "pptx" => OfficeFormat::Pptx,
            "odt" => OfficeFormat::Odt,
            "ods" => OfficeFormat::Ods,
            "odp" => OfficeFormat::Odp,
            "epub" => OfficeFormat::Epub,
            _ => return None,
        })
    }

    /// Format named by the file extension of `path`.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_name)
    }

    /// Whether the archive entry `name` holds convertible text.
    fn is_text_part(self, name: &str) -> bool {
        match self {
            OfficeFormat::Docx => {
                name == "word/document.xml"
                    || name == "word/footnotes.xml"
                    || name == "word/endnotes.xml"
                    || ((name.starts_with("word/header") || name.starts_with("word/footer"))
                        && name.ends_with(".xml"))
            }
            OfficeFormat::Xlsx => name == "xl/sharedStrings.xml",
            OfficeFormat::Pptx => {
                (name.starts_with("ppt/slides/slide") || name.starts_with("ppt/notesSlides/notesSlide"))
                    && name.ends_with(".xml")
            }
            OfficeFormat::Odt | OfficeFormat::Ods | OfficeFormat::Odp => name == "content.xml",
            OfficeFormat::Epub => {
                let lower = name.to_ascii_lowercase();
                [".xhtml", ".html", ".htm", ".opf", ".ncx"]
                    .iter()
                    .any(|ext| lower.ends_with(ext))
            }
        }
    }

    fn font_pattern(self) -> &'static Regex {
        match self {
            OfficeFormat::Docx => &DOCX_FONT,
            OfficeFormat::Xlsx => &XLSX_FONT,
            OfficeFormat::Pptx => &PPTX_FONT,
            OfficeFormat::Odt | OfficeFormat::Ods | OfficeFormat::Odp => &ODF_FONT,
            OfficeFormat::Epub => &EPUB_FONT,
        }
    }
}

/// Settings for one document conversion.
pub struct OfficeJob<'a> {
    pub format: OfficeFormat,
    pub config: &'a str,
    pub punctuation: bool,
    /// Leave font names untouched.
    pub keep_font: bool,
}

/// `<stem>_converted.<ext>` next to `input`.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
    let name = match input.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}_converted.{ext}"),
        None => format!("{stem}_converted"),
    };
    input.with_file_name(name)
}

/// Converts the document at `input` and writes it to `output`.
///
/// Returns the number of text parts converted.
pub fn convert_file(handle: &OpenccHandle, input: &Path, output: &Path, job: &OfficeJob) -> CliResult<usize> {
    let bytes = fs::read(input).map_err(|e| format!("{}: {e}", input.display()))?;
    let (archive, converted) = convert_archive(handle, &bytes, job)?;
    fs::write(output, archive).map_err(|e| format!("{}: {e}", output.display()))?;
    Ok(converted)
}

/// Rewrites a zip container with its text parts converted.
///
/// Entries keep their order, except that `mimetype` is written first and
/// stored uncompressed as ODF and EPUB readers require. Entries whose path
/// escapes the archive root are dropped.
pub fn convert_archive(handle: &OpenccHandle, bytes: &[u8], job: &OfficeJob) -> CliResult<(Vec<u8>, usize)> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut entries: Vec<(String, bool, Vec<u8>)> = Vec::with_capacity(archive.len());
    let mut converted = 0;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if file.enclosed_name().is_none() {
            debug!(name = file.name(), "skipping unsafe entry");
            continue;
        }
        let name = file.name().replace('\\', "/");
        if file.is_dir() {
            entries.push((name, true, Vec::new()));
            continue;
        }
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        if job.format.is_text_part(&name) {
            let xml = String::from_utf8(data).map_err(|e| format!("{name}: {e}"))?;
            data = convert_xml(handle, &xml, job)?.into_bytes();
            converted += 1;
        }
        entries.push((name, false, data));
    }
    if let Some(pos) = entries.iter().position(|(name, _, _)| name == "mimetype") {
        let mimetype = entries.remove(pos);
        entries.insert(0, mimetype);
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, is_dir, data) in entries {
        let method = if name == "mimetype" {
            CompressionMethod::Stored
        } else {
            CompressionMethod::Deflated
        };
        let options = SimpleFileOptions::default().compression_method(method);
        if is_dir {
            writer.add_directory(name, options)?;
        } else {
            writer.start_file(name, options)?;
            writer.write_all(&data)?;
        }
    }
    debug!(format = ?job.format, converted, "document rewritten");
    Ok((writer.finish()?.into_inner(), converted))
}

fn convert_xml(handle: &OpenccHandle, xml: &str, job: &OfficeJob) -> CliResult<String> {
    if !job.keep_font {
        return Ok(handle.convert(xml, job.config, job.punctuation)?);
    }
    let (masked, fonts) = mask_fonts(xml, job.format.font_pattern());
    let mut converted = handle.convert(&masked, job.config, job.punctuation)?;
    for (i, font) in fonts.iter().enumerate() {
        converted = converted.replace(&font_marker(i), font);
    }
    Ok(converted)
}

fn font_marker(index: usize) -> String {
    format!("__F_O_N_T_{index}__")
}

// Swaps every font name for an ASCII marker the converters pass through.
fn mask_fonts(xml: &str, pattern: &Regex) -> (String, Vec<String>) {
    let mut fonts = Vec::new();
    let masked = pattern.replace_all(xml, |caps: &Captures| {
        let marker = font_marker(fonts.len());
        fonts.push(caps[2].to_string());
        format!("{}{marker}{}", &caps[1], caps.get(3).map_or("", |m| m.as_str()))
    });
    (masked.into_owned(), fonts)
}
