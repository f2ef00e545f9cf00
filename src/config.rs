use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{OpenccError, Result};

/// Engine construction settings.
///
/// Every field has a default, so `{}` is a valid configuration that uses the
/// tables and word lists embedded in the binary.
///
/// ```json
/// {
///   "dict_dir": "dicts",
///   "user_dicts": ["my_words.txt"],
///   "parallel_threshold": 4096,
///   "keywords": { "textrank_span": 4, "stop_words": ["公司"] }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Directory holding the 16 OpenCC text tables.
    pub dict_dir: Option<PathBuf>,
    /// Precompiled zstd JSON dictionary; wins over `dict_dir`.
    pub dictionary_artifact: Option<PathBuf>,
    /// Main `word freq [tag]` dictionary replacing the embedded one.
    pub jieba_dict: Option<PathBuf>,
    /// Extra word dictionaries merged in order after the main one.
    pub user_dicts: Vec<PathBuf>,
    /// `word idf` table replacing the embedded TF-IDF table.
    pub idf_path: Option<PathBuf>,
    /// Inputs of at least this many bytes are processed chunk-parallel.
    pub parallel_threshold: usize,
    pub script: ScriptDetectConfig,
    pub keywords: KeywordConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            dict_dir: None,
            dictionary_artifact: None,
            jieba_dict: None,
            user_dicts: Vec::new(),
            idf_path: None,
            parallel_threshold: 1000,
            script: ScriptDetectConfig::default(),
            keywords: KeywordConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let config: EngineConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let s = &self.script;
        if s.sample_limit == 0 {
            return Err(OpenccError::Config("script.sample_limit must be positive".into()));
        }
        if !(0.5..1.0).contains(&s.majority_ratio) {
            return Err(OpenccError::Config(format!(
                "script.majority_ratio must be in [0.5, 1.0), got {}",
                s.majority_ratio
            )));
        }
        let k = &self.keywords;
        if k.textrank_span < 2 {
            return Err(OpenccError::Config("keywords.textrank_span must be at least 2".into()));
        }
        if k.min_keyword_length == 0 {
            return Err(OpenccError::Config("keywords.min_keyword_length must be positive".into()));
        }
        Ok(())
    }
}

/// Script detection sampling rules.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScriptDetectConfig {
    /// Maximum number of non-ignored chars inspected.
    pub sample_limit: usize,
    /// Fewer script-specific chars than this yields `Neither`.
    pub min_samples: usize,
    /// A script wins when its share of script-specific chars exceeds this.
    pub majority_ratio: f64,
}

impl Default for ScriptDetectConfig {
    fn default() -> Self {
        ScriptDetectConfig {
            sample_limit: 200,
            min_samples: 1,
            majority_ratio: 0.5,
        }
    }
}

/// Keyword extraction filters shared by TextRank and TF-IDF.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeywordConfig {
    /// TextRank co-occurrence window in tokens.
    pub textrank_span: usize,
    /// Shorter words, in chars, are never keywords.
    pub min_keyword_length: usize,
    /// Segment with the HMM before ranking.
    pub use_hmm: bool,
    /// Extra stop words, matched case-insensitively.
    pub stop_words: Vec<String>,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        KeywordConfig {
            textrank_span: 5,
            min_keyword_length: 2,
            use_hmm: false,
            stop_words: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_all_defaults() {
        let config = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(config.parallel_threshold, 1000);
        assert_eq!(config.script.sample_limit, 200);
        assert_eq!(config.keywords.textrank_span, 5);
        assert!(!config.keywords.use_hmm);
        assert!(config.dict_dir.is_none());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config =
            EngineConfig::from_json_str(r#"{"keywords": {"textrank_span": 3}, "user_dicts": ["a.txt"]}"#)
                .unwrap();
        assert_eq!(config.keywords.textrank_span, 3);
        assert_eq!(config.keywords.min_keyword_length, 2);
        assert_eq!(config.user_dicts, vec![PathBuf::from("a.txt")]);
    }

    #[test]
    fn rejects_unknown_fields_and_bad_values() {
        assert!(matches!(
            EngineConfig::from_json_str(r#"{"dict_path": "x"}"#),
            Err(OpenccError::Json(_))
        ));
        assert!(matches!(
            EngineConfig::from_json_str(r#"{"keywords": {"textrank_span": 1}}"#),
            Err(OpenccError::Config(_))
        ));
        assert!(matches!(
            EngineConfig::from_json_str(r#"{"hmm_model": "hmm.txt"}"#),
            Err(OpenccError::Json(_))
        ));
        assert!(matches!(
            EngineConfig::from_json_str(r#"{"script": {"majority_ratio": 0.2}}"#),
            Err(OpenccError::Config(_))
        ));
    }

    #[test]
    fn reads_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{"parallel_threshold": 10}"#).unwrap();
        assert_eq!(EngineConfig::from_json_file(&path).unwrap().parallel_threshold, 10);
    }
}
