mod dict_map;

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

pub use crate::dictionary_lib::dict_map::DictMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span};
use zstd::stream::read::Decoder;
use zstd::Encoder;

use crate::error::{OpenccError, Result};

pub const SCHEMA_VERSION: u16 = 2;

// Built from the tables under `dicts/` by `dict-generate`.
const DICTIONARY_ZSTD: &[u8] = include_bytes!("dicts/dictionary.json.zst");

/// Identifies one of the OpenCC tables held by a [`Dictionary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DictKind {
    StCharacters,
    StPhrases,
    TsCharacters,
    TsPhrases,
    TwPhrases,
    TwPhrasesRev,
    TwVariants,
    TwVariantsRev,
    TwVariantsRevPhrases,
    HkVariants,
    HkVariantsRev,
    HkVariantsRevPhrases,
    JpsCharacters,
    JpsPhrases,
    JpVariants,
    JpVariantsRev,
}

impl DictKind {
    pub const ALL: [DictKind; 16] = [
        DictKind::StCharacters,
        DictKind::StPhrases,
        DictKind::TsCharacters,
        DictKind::TsPhrases,
        DictKind::TwPhrases,
        DictKind::TwPhrasesRev,
        DictKind::TwVariants,
        DictKind::TwVariantsRev,
        DictKind::TwVariantsRevPhrases,
        DictKind::HkVariants,
        DictKind::HkVariantsRev,
        DictKind::HkVariantsRevPhrases,
        DictKind::JpsCharacters,
        DictKind::JpsPhrases,
        DictKind::JpVariants,
        DictKind::JpVariantsRev,
    ];

    /// OpenCC table name, also the file stem under a `dicts/` directory.
    pub fn table_name(self) -> &'static str {
        match self {
            DictKind::StCharacters => "STCharacters",
            DictKind::StPhrases => "STPhrases",
            DictKind::TsCharacters => "TSCharacters",
            DictKind::TsPhrases => "TSPhrases",
            DictKind::TwPhrases => "TWPhrases",
            DictKind::TwPhrasesRev => "TWPhrasesRev",
            DictKind::TwVariants => "TWVariants",
            DictKind::TwVariantsRev => "TWVariantsRev",
            DictKind::TwVariantsRevPhrases => "TWVariantsRevPhrases",
            DictKind::HkVariants => "HKVariants",
            DictKind::HkVariantsRev => "HKVariantsRev",
            DictKind::HkVariantsRevPhrases => "HKVariantsRevPhrases",
            DictKind::JpsCharacters => "JPShinjitaiCharacters",
            DictKind::JpsPhrases => "JPShinjitaiPhrases",
            DictKind::JpVariants => "JPVariants",
            DictKind::JpVariantsRev => "JPVariantsRev",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.txt", self.table_name())
    }
}

/// Represents a collection of various Chinese character and phrase mappings
/// used for conversion between Simplified, Traditional, Taiwanese, Hong Kong,
/// and Japanese variants.
///
/// Immutable once loaded; engines share it behind an `Arc`.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Dictionary {
    pub schema_version: u16,
    /// Simplified to Traditional character mappings.
    pub st_characters: DictMap,
    /// Simplified to Traditional phrase mappings.
    pub st_phrases: DictMap,
    /// Traditional to Simplified character mappings.
    pub ts_characters: DictMap,
    /// Traditional to Simplified phrase mappings.
    pub ts_phrases: DictMap,
    /// Taiwanese phrase mappings.
    pub tw_phrases: DictMap,
    /// Reverse Taiwanese phrase mappings.
    pub tw_phrases_rev: DictMap,
    /// Taiwanese variant mappings.
    pub tw_variants: DictMap,
    /// Reverse Taiwanese variant mappings.
    pub tw_variants_rev: DictMap,
    /// Reverse Taiwanese variant phrase mappings.
    pub tw_variants_rev_phrases: DictMap,
    /// Hong Kong variant mappings.
    pub hk_variants: DictMap,
    /// Reverse Hong Kong variant mappings.
    pub hk_variants_rev: DictMap,
    /// Reverse Hong Kong variant phrase mappings.
    pub hk_variants_rev_phrases: DictMap,
    /// Japanese Shinjitai character mappings.
    pub jps_characters: DictMap,
    /// Japanese Shinjitai phrase mappings.
    pub jps_phrases: DictMap,
    /// Japanese variant mappings.
    pub jp_variants: DictMap,
    /// Reverse Japanese variant mappings.
    pub jp_variants_rev: DictMap,
}

impl Dictionary {
    /// Loads the precompiled tables embedded in the binary.
    ///
    /// # Errors
    /// Returns [`OpenccError::DictionaryLoad`] if the embedded artifact fails
    /// to decompress or carries another schema version.
    pub fn new() -> Result<Self> {
        let _span = debug_span!("dictionary_builtin").entered();
        let dictionary = Self::from_compressed_bytes(DICTIONARY_ZSTD)?;
        debug!(st_phrases = dictionary.st_phrases.len(), "embedded dictionary");
        Ok(dictionary)
    }

    /// Loads all 16 tables from `<dir>/<TableName>.txt`.
    ///
    /// Every table is required; a missing or malformed file fails the whole load.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let _span = debug_span!("dictionary_from_dir", dir = %dir.display()).entered();
        Self::build(|kind| {
            let path = dir.join(kind.file_name());
            let file = File::open(&path).map_err(|e| {
                OpenccError::load(kind.table_name(), format!("{}: {e}", path.display()))
            })?;
            DictMap::load_from_reader(kind.table_name(), BufReader::new(file))
        })
    }

    /// Loads the text tables from the conventional `dicts/` directory.
    ///
    /// Intended for regenerating the precompiled artifact from a source checkout.
    pub fn from_dicts() -> Result<Self> {
        Self::from_dir("dicts")
    }

    fn build<F>(mut load: F) -> Result<Self>
    where
        F: FnMut(DictKind) -> Result<DictMap>,
    {
        let mut dictionary = Dictionary {
            schema_version: SCHEMA_VERSION,
            ..Dictionary::default()
        };
        for kind in DictKind::ALL {
            let map = load(kind)?;
            debug!(table = kind.table_name(), entries = map.len());
            *dictionary.get_mut(kind) = map;
        }
        Ok(dictionary)
    }

    pub fn get(&self, kind: DictKind) -> &DictMap {
        match kind {
            DictKind::StCharacters => &self.st_characters,
            DictKind::StPhrases => &self.st_phrases,
            DictKind::TsCharacters => &self.ts_characters,
            DictKind::TsPhrases => &self.ts_phrases,
            DictKind::TwPhrases => &self.tw_phrases,
            DictKind::TwPhrasesRev => &self.tw_phrases_rev,
            DictKind::TwVariants => &self.tw_variants,
            DictKind::TwVariantsRev => &self.tw_variants_rev,
            DictKind::TwVariantsRevPhrases => &self.tw_variants_rev_phrases,
            DictKind::HkVariants => &self.hk_variants,
            DictKind::HkVariantsRev => &self.hk_variants_rev,
            DictKind::HkVariantsRevPhrases => &self.hk_variants_rev_phrases,
            DictKind::JpsCharacters => &self.jps_characters,
            DictKind::JpsPhrases => &self.jps_phrases,
            DictKind::JpVariants => &self.jp_variants,
            DictKind::JpVariantsRev => &self.jp_variants_rev,
        }
    }

    fn get_mut(&mut self, kind: DictKind) -> &mut DictMap {
        match kind {
            DictKind::StCharacters => &mut self.st_characters,
            DictKind::StPhrases => &mut self.st_phrases,
            DictKind::TsCharacters => &mut self.ts_characters,
            DictKind::TsPhrases => &mut self.ts_phrases,
            DictKind::TwPhrases => &mut self.tw_phrases,
            DictKind::TwPhrasesRev => &mut self.tw_phrases_rev,
            DictKind::TwVariants => &mut self.tw_variants,
            DictKind::TwVariantsRev => &mut self.tw_variants_rev,
            DictKind::TwVariantsRevPhrases => &mut self.tw_variants_rev_phrases,
            DictKind::HkVariants => &mut self.hk_variants,
            DictKind::HkVariantsRev => &mut self.hk_variants_rev,
            DictKind::HkVariantsRevPhrases => &mut self.hk_variants_rev_phrases,
            DictKind::JpsCharacters => &mut self.jps_characters,
            DictKind::JpsPhrases => &mut self.jps_phrases,
            DictKind::JpVariants => &mut self.jp_variants,
            DictKind::JpVariantsRev => &mut self.jp_variants_rev,
        }
    }

    /// Loads a precompiled zstd-compressed JSON artifact from disk.
    pub fn load_compressed<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| OpenccError::load("dictionary artifact", format!("{}: {e}", path.display())))?;
        Self::from_compressed_reader(BufReader::new(file))
    }

    /// Decodes a zstd-compressed JSON artifact held in memory.
    pub fn from_compressed_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_compressed_reader(bytes)
    }

    fn from_compressed_reader<R: Read>(reader: R) -> Result<Self> {
        let mut decoder = Decoder::new(reader)
            .map_err(|e| OpenccError::load("dictionary artifact", e.to_string()))?;
        let mut json_data = String::new();
        decoder
            .read_to_string(&mut json_data)
            .map_err(|e| OpenccError::load("dictionary artifact", e.to_string()))?;

        let dict: Dictionary = serde_json::from_str(&json_data).map_err(|e| {
            OpenccError::load(
                "dictionary artifact",
                format!("missing fields or wrong schema: {e}"),
            )
        })?;

        if dict.schema_version != SCHEMA_VERSION {
            return Err(OpenccError::load(
                "dictionary artifact",
                format!(
                    "unsupported schema_version {} (expected {SCHEMA_VERSION})",
                    dict.schema_version
                ),
            ));
        }
        Ok(dict)
    }

    /// Saves the dictionary as zstd-compressed JSON (level 19).
    pub fn save_compressed<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        let mut encoder = Encoder::new(writer, 19)?;
        serde_json::to_writer(&mut encoder, self)?;
        encoder.finish()?.flush()?;
        Ok(())
    }

    /// Serializes the dictionary to a plain JSON file.
    pub fn serialize_to_json<P: AsRef<Path>>(&self, filename: P) -> Result<()> {
        let json_string = serde_json::to_string(&self)?;
        let mut file = File::create(filename)?;
        file.write_all(json_string.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn builtin_tables_load() {
        let dict = Dictionary::new().unwrap();
        assert_eq!(dict.schema_version, SCHEMA_VERSION);
        for kind in DictKind::ALL {
            assert!(!dict.get(kind).is_empty(), "{} is empty", kind.table_name());
        }
        assert_eq!(dict.st_characters.get("黄"), Some("黃"));
        assert_eq!(dict.st_characters.get("济"), Some("濟"));
        assert_eq!(dict.ts_characters.get("黃"), Some("黄"));
        assert!(dict.st_phrases.len() > 40_000);
        assert_eq!(dict.st_phrases.max_len, 16);
    }

    #[test]
    fn embedded_artifact_matches_text_tables() {
        let from_text = Dictionary::from_dir(concat!(env!("CARGO_MANIFEST_DIR"), "/dicts")).unwrap();
        let embedded = Dictionary::new().unwrap();
        for kind in DictKind::ALL {
            let (a, b) = (from_text.get(kind), embedded.get(kind));
            assert_eq!(a.len(), b.len(), "{}", kind.table_name());
            assert_eq!(a.key_len_mask, b.key_len_mask, "{}", kind.table_name());
            assert_eq!(a.map, b.map, "{}", kind.table_name());
        }
    }

    #[test]
    fn missing_table_fails_whole_load() {
        let dir = tempfile::tempdir().unwrap();
        for kind in DictKind::ALL.iter().skip(1) {
            fs::write(dir.path().join(kind.file_name()), "一\t一\n").unwrap();
        }
        match Dictionary::from_dir(dir.path()) {
            Err(OpenccError::DictionaryLoad { table, .. }) => assert_eq!(table, "STCharacters"),
            other => panic!("expected load error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn loads_tables_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        for kind in DictKind::ALL {
            fs::write(dir.path().join(kind.file_name()), "测\t測\n").unwrap();
        }
        let dict = Dictionary::from_dir(dir.path()).unwrap();
        assert_eq!(dict.get(DictKind::HkVariants).get("测"), Some("測"));
    }

    #[test]
    fn compressed_artifact_survives_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dictionary.json.zst");
        let dict = Dictionary::new().unwrap();
        dict.save_compressed(&path).unwrap();

        let loaded = Dictionary::load_compressed(&path).unwrap();
        assert_eq!(loaded.st_phrases.len(), dict.st_phrases.len());
        assert_eq!(loaded.st_phrases.max_len, dict.st_phrases.max_len);
    }

    #[test]
    fn rejects_wrong_schema_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.json.zst");
        let dict = Dictionary {
            schema_version: 1,
            ..Dictionary::default()
        };
        dict.save_compressed(&path).unwrap();
        assert!(matches!(
            Dictionary::load_compressed(&path),
            Err(OpenccError::DictionaryLoad { .. })
        ));
    }
}
