//! # opencc-jieba-engine
//!
//! Chinese script conversion, word segmentation and keyword extraction in one
//! engine. Conversion runs the OpenCC dictionary tables through a
//! longest-match pipeline; segmentation and keyword extraction are done by
//! `jieba-rs` over a word list that covers both scripts.
//!
//! ## Features
//!
//! - Simplified ↔ Traditional Chinese conversion (including Taiwan, Hong Kong, Japanese variants)
//! - Multi-pass dictionary rounds, each feeding the next
//! - Word segmentation with optional HMM for unknown words
//! - Keyword extraction using TF-IDF or TextRank
//! - Optional punctuation conversion (e.g., 「」 ↔ “”)
//! - Script detection (Simplified / Traditional / mixed)
//!
//! ## Example
//!
//! ```rust
//! use opencc_jieba_engine::OpenCC;
//!
//! let opencc = OpenCC::new().unwrap();
//! let s = opencc.s2t("“春眠不觉晓，处处闻啼鸟。”", true);
//! assert_eq!(s, "「春眠不覺曉，處處聞啼鳥。」");
//! ```
//!
//! The [`handle`] module wraps an engine in the boundary contract used by
//! the C ABI and the command line tool.
use once_cell::sync::Lazy;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, debug_span};

pub mod config;
pub mod dictionary_lib;
pub mod error;
pub mod handle;
pub mod jieba_lib;
mod opencc_config;
pub mod zho_script;

pub use crate::config::{EngineConfig, KeywordConfig, ScriptDetectConfig};
use crate::dictionary_lib::{DictMap, Dictionary};
pub use crate::error::{OpenccError, Result};
pub use crate::handle::{KeywordMethod, OpenccHandle};
pub use crate::jieba_lib::{Jieba, Keyword, KeywordExtract, KeywordExtractConfig, TextRank, TfIdf};
pub use crate::opencc_config::{ConversionPlan, OpenccConfig, PunctuationStyle};
pub use crate::zho_script::{ScriptDetector, ZhoScript};

static DELIMITER_SET: Lazy<HashSet<char>> = Lazy::new(|| {
    " \t\n\r!\"#$%&'()*+,-./:;<=>?@[\\]^_{}|~＝、。“”‘’『』「」﹁﹂—－（）《》〈〉？！…／＼︒︑︔︓︿﹀︹︺︙︐［﹇］﹈︕︖︰︳︴︽︾︵︶｛︷｝︸﹃﹄【︻】︼　～．，；："
        .chars()
        .collect()
});

// Punctuation tables, probed with the same longest-match routine as the dictionaries
static S2T_PUNCT: Lazy<DictMap> =
    Lazy::new(|| punctuation_table(&[('“', '「'), ('”', '」'), ('‘', '『'), ('’', '』')]));
static T2S_PUNCT: Lazy<DictMap> =
    Lazy::new(|| punctuation_table(&[('「', '“'), ('」', '”'), ('『', '‘'), ('』', '’')]));

fn punctuation_table(pairs: &[(char, char)]) -> DictMap {
    let mut table = DictMap::default();
    for &(from, to) in pairs {
        table.insert_with_len(from.to_string(), vec![to.to_string()], 1);
    }
    table
}

pub(crate) fn is_delimiter(ch: char) -> bool {
    DELIMITER_SET.contains(&ch)
}

/// The main struct for performing Chinese text conversion and segmentation.
///
/// `OpenCC` combines a [`Jieba`] segmenter with OpenCC-style dictionaries,
/// allowing conversion between Simplified, Traditional, Taiwanese, Hong Kong,
/// and Japanese variants of Chinese. It also supports keyword extraction and
/// script detection.
///
/// All state is read-only after construction, so one engine can serve any
/// number of threads; the dictionaries and segmenter are shared behind
/// `Arc`s and can be reused by other engines through [`OpenCC::from_parts`].
///
/// # Example
///
/// ```rust
/// use opencc_jieba_engine::OpenCC;
///
/// let opencc = OpenCC::new().unwrap();
/// let result = opencc.convert("黄河入海流", "s2t", false).unwrap();
/// assert_eq!(result, "黃河入海流");
/// ```
pub struct OpenCC {
    /// The word segmenter.
    pub jieba: Arc<Jieba>,
    dictionary: Arc<Dictionary>,
    detector: ScriptDetector,
    textrank: TextRank,
    tfidf: TfIdf,
    keyword_config: KeywordExtractConfig,
    parallel_threshold: usize,
}

impl OpenCC {
    /// Creates an engine over the dictionaries and word lists embedded in the
    /// binary.
    ///
    /// # Errors
    ///
    /// [`OpenccError::DictionaryLoad`] if an embedded table fails to parse.
    pub fn new() -> Result<Self> {
        Self::with_config(&EngineConfig::default())
    }

    /// Creates an engine from explicit settings.
    ///
    /// Construction either fully succeeds or returns the first load error;
    /// no partially initialized engine is ever returned.
    pub fn with_config(config: &EngineConfig) -> Result<Self> {
        let _span = debug_span!("opencc_init").entered();
        config.validate()?;

        let dictionary = match (&config.dictionary_artifact, &config.dict_dir) {
            (Some(artifact), _) => Dictionary::load_compressed(artifact)?,
            (None, Some(dir)) => Dictionary::from_dir(dir)?,
            (None, None) => Dictionary::new()?,
        };

        let mut jieba = match &config.jieba_dict {
            Some(path) => jieba_lib::jieba_from_reader("jieba dict", open_table("jieba dict", path)?)?,
            None => jieba_lib::builtin_jieba()?,
        };
        for user_dict in &config.user_dicts {
            jieba_lib::load_user_dict(&mut jieba, "user dict", open_table("user dict", user_dict)?)?;
        }

        let tfidf = match &config.idf_path {
            Some(path) => jieba_lib::load_idf(open_table("idf", path)?, KeywordExtractConfig::default())?,
            None => TfIdf::default(),
        };

        Self::from_parts(Arc::new(dictionary), Arc::new(jieba), tfidf, config)
    }

    /// Assembles an engine from already loaded parts.
    ///
    /// The keyword filters of `config` replace the ones `tfidf` was built with.
    pub fn from_parts(
        dictionary: Arc<Dictionary>,
        jieba: Arc<Jieba>,
        mut tfidf: TfIdf,
        config: &EngineConfig,
    ) -> Result<Self> {
        let keyword_config = jieba_lib::keyword_config(&config.keywords)?;
        *tfidf.config_mut() = keyword_config.clone();
        let detector = ScriptDetector::from_dictionary(&dictionary, config.script);
        debug!(
            parallel_threshold = config.parallel_threshold,
            textrank_span = config.keywords.textrank_span,
            "engine ready"
        );
        Ok(OpenCC {
            jieba,
            dictionary,
            detector,
            textrank: TextRank::new(config.keywords.textrank_span, keyword_config.clone()),
            tfidf,
            keyword_config,
            parallel_threshold: config.parallel_threshold,
        })
    }

    pub fn dictionary(&self) -> &Arc<Dictionary> {
        &self.dictionary
    }

    #[inline]
    fn use_parallel(&self, input: &str) -> bool {
        input.len() >= self.parallel_threshold
    }

    /// Splits text into byte ranges at delimiter characters.
    ///
    /// - If `inclusive` is true, the delimiter is included at the end of each range.
    /// - If `inclusive` is false, each delimiter becomes its own range.
    ///
    /// ```
    /// let opencc = opencc_jieba_engine::OpenCC::new().unwrap();
    /// let text = "你好，世界！Rust";
    /// let ranges = opencc.split_string_ranges(text, true);
    /// assert_eq!(&text[ranges[0].clone()], "你好，");
    /// assert_eq!(&text[ranges[1].clone()], "世界！");
    /// assert_eq!(&text[ranges[2].clone()], "Rust");
    /// ```
    pub fn split_string_ranges(&self, text: &str, inclusive: bool) -> Vec<Range<usize>> {
        let mut ranges = Vec::new();
        let mut start = 0;

        for (ch_start, ch) in text.char_indices() {
            if !is_delimiter(ch) {
                continue;
            }
            let ch_end = ch_start + ch.len_utf8();
            if inclusive {
                ranges.push(start..ch_end);
            } else {
                if start < ch_start {
                    ranges.push(start..ch_start);
                }
                ranges.push(ch_start..ch_end);
            }
            start = ch_end;
        }

        if start < text.len() {
            ranges.push(start..text.len());
        }
        ranges
    }

    // One dictionary round over every delimiter-bounded range. Ranges are
    // converted independently, so output does not depend on parallelism.
    fn convert_round(&self, input: &str, dicts: &[&DictMap]) -> String {
        let ranges = self.split_string_ranges(input, true);
        let process_range = |range: Range<usize>| convert_by_longest_match(&input[range], dicts);

        if self.use_parallel(input) {
            ranges.into_par_iter().map(process_range).collect()
        } else {
            ranges.into_iter().map(process_range).collect()
        }
    }

    /// Runs the fixed plan of `config` over `input`.
    ///
    /// The punctuation pass only runs when `punctuation` is set and the
    /// configuration has one; Traditional-to-Traditional and Japanese plans
    /// ignore the flag.
    pub fn convert_with_config(
        &self,
        input: &str,
        config: OpenccConfig,
        punctuation: bool,
    ) -> String {
        if input.is_empty() {
            return String::new();
        }
        let _span =
            debug_span!("convert", config = config.as_str(), bytes = input.len()).entered();
        let plan = config.plan();

        let mut output = input.to_owned();
        for round in plan.rounds {
            let dicts: Vec<&DictMap> = round.iter().map(|&kind| self.dictionary.get(kind)).collect();
            output = self.convert_round(&output, &dicts);
        }

        if punctuation {
            let table: Option<&DictMap> = match plan.punctuation {
                Some(PunctuationStyle::SimplifiedToTraditional) => Some(&*S2T_PUNCT),
                Some(PunctuationStyle::TraditionalToSimplified) => Some(&*T2S_PUNCT),
                None => None,
            };
            if let Some(table) = table {
                output = self.convert_round(&output, &[table]);
            }
        }
        output
    }

    /// Converts Chinese text by configuration name.
    ///
    /// # Errors
    ///
    /// [`OpenccError::UnknownConfig`] if `config` is not one of the 16
    /// case-sensitive names (`s2t`, `t2s`, `s2tw`, ... `jp2t`).
    ///
    /// # Example
    /// ```
    /// let opencc = opencc_jieba_engine::OpenCC::new().unwrap();
    /// assert_eq!(opencc.convert("龙马精神", "s2t", false).unwrap(), "龍馬精神");
    /// assert!(opencc.convert("龙马精神", "S2T", false).is_err());
    /// ```
    pub fn convert(&self, input: &str, config: &str, punctuation: bool) -> Result<String> {
        let config: OpenccConfig = config.parse()?;
        Ok(self.convert_with_config(input, config, punctuation))
    }

    /// Simplified Chinese to Traditional Chinese.
    pub fn s2t(&self, input: &str, punctuation: bool) -> String {
        self.convert_with_config(input, OpenccConfig::S2t, punctuation)
    }

    /// Traditional Chinese to Simplified Chinese.
    ///
    /// ```
    /// let opencc = opencc_jieba_engine::OpenCC::new().unwrap();
    /// let s = opencc.t2s("「春眠不覺曉，處處聞啼鳥。」", true);
    /// assert_eq!(s, "“春眠不觉晓，处处闻啼鸟。”");
    /// ```
    pub fn t2s(&self, input: &str, punctuation: bool) -> String {
        self.convert_with_config(input, OpenccConfig::T2s, punctuation)
    }

    /// Simplified Chinese to Traditional Chinese (Taiwan standard).
    pub fn s2tw(&self, input: &str, punctuation: bool) -> String {
        self.convert_with_config(input, OpenccConfig::S2tw, punctuation)
    }

    /// Taiwan Traditional to Simplified Chinese.
    pub fn tw2s(&self, input: &str, punctuation: bool) -> String {
        self.convert_with_config(input, OpenccConfig::Tw2s, punctuation)
    }

    /// Simplified Chinese to Taiwan Traditional, including Taiwan idioms.
    pub fn s2twp(&self, input: &str, punctuation: bool) -> String {
        self.convert_with_config(input, OpenccConfig::S2twp, punctuation)
    }

    /// Taiwan Traditional to Simplified Chinese, reversing Taiwan idioms.
    pub fn tw2sp(&self, input: &str, punctuation: bool) -> String {
        self.convert_with_config(input, OpenccConfig::Tw2sp, punctuation)
    }

    /// Simplified Chinese to Traditional Chinese (Hong Kong standard).
    pub fn s2hk(&self, input: &str, punctuation: bool) -> String {
        self.convert_with_config(input, OpenccConfig::S2hk, punctuation)
    }

    /// Hong Kong Traditional to Simplified Chinese.
    pub fn hk2s(&self, input: &str, punctuation: bool) -> String {
        self.convert_with_config(input, OpenccConfig::Hk2s, punctuation)
    }

    pub fn t2tw(&self, input: &str) -> String {
        self.convert_with_config(input, OpenccConfig::T2tw, false)
    }

    pub fn t2twp(&self, input: &str) -> String {
        self.convert_with_config(input, OpenccConfig::T2twp, false)
    }

    pub fn tw2t(&self, input: &str) -> String {
        self.convert_with_config(input, OpenccConfig::Tw2t, false)
    }

    pub fn tw2tp(&self, input: &str) -> String {
        self.convert_with_config(input, OpenccConfig::Tw2tp, false)
    }

    pub fn t2hk(&self, input: &str) -> String {
        self.convert_with_config(input, OpenccConfig::T2hk, false)
    }

    pub fn hk2t(&self, input: &str) -> String {
        self.convert_with_config(input, OpenccConfig::Hk2t, false)
    }

    /// Traditional Chinese to Japanese Shinjitai.
    pub fn t2jp(&self, input: &str) -> String {
        self.convert_with_config(input, OpenccConfig::T2jp, false)
    }

    /// Japanese Shinjitai to Traditional Chinese.
    pub fn jp2t(&self, input: &str) -> String {
        self.convert_with_config(input, OpenccConfig::Jp2t, false)
    }

    /// Segments input text into words.
    ///
    /// The returned tokens always concatenate back to `input`.
    ///
    /// # Example
    /// ```
    /// let opencc = opencc_jieba_engine::OpenCC::new().unwrap();
    /// let tokens = opencc.jieba_cut("南京市长江大桥", true);
    /// assert_eq!(tokens, vec!["南京市", "长江大桥"]);
    /// ```
    pub fn jieba_cut(&self, input: &str, hmm: bool) -> Vec<String> {
        let _span = debug_span!("segment", bytes = input.len(), hmm).entered();
        let ranges = self.split_string_ranges(input, true);

        let process_range = |range: Range<usize>| {
            self.jieba
                .cut(&input[range], hmm)
                .into_iter()
                .map(str::to_owned)
                .collect::<Vec<String>>()
        };

        if self.use_parallel(input) {
            ranges
                .into_par_iter()
                .flat_map_iter(process_range)
                .collect()
        } else {
            ranges.into_iter().flat_map(process_range).collect()
        }
    }

    /// Segments input text and joins the tokens with `delimiter`.
    ///
    /// ```
    /// let opencc = opencc_jieba_engine::OpenCC::new().unwrap();
    /// assert_eq!(opencc.jieba_cut_and_join("南京市长江大桥", true, "/"), "南京市/长江大桥");
    /// ```
    pub fn jieba_cut_and_join(&self, input: &str, hmm: bool, delimiter: &str) -> String {
        join_strings(&self.jieba_cut(input, hmm), delimiter)
    }

    /// Detects the script of `input` by majority of script-specific chars.
    pub fn zho_script(&self, input: &str) -> ZhoScript {
        self.detector.classify(input)
    }

    /// Checks whether the input is Traditional or Simplified Chinese.
    ///
    /// Returns `1` for Traditional, `2` for Simplified and `0` for mixed or
    /// undetermined text.
    ///
    /// ```
    /// let opencc = opencc_jieba_engine::OpenCC::new().unwrap();
    /// assert_eq!(opencc.zho_check("“春眠不觉晓，处处闻啼鸟。”"), 2);
    /// assert_eq!(opencc.zho_check("「春眠不覺曉，處處聞啼鳥。」"), 1);
    /// assert_eq!(opencc.zho_check("Hello World!"), 0);
    /// ```
    pub fn zho_check(&self, input: &str) -> i32 {
        self.zho_script(input).code()
    }

    /// Extracts keywords with the given method, highest weight first.
    ///
    /// Words of equal weight come in the order they first appear in `input`,
    /// so repeated calls return identical lists. TextRank weights are scaled
    /// so the top keyword scores 1.0.
    pub fn extract_keywords(&self, input: &str, top_k: usize, method: KeywordMethod) -> Vec<Keyword> {
        let _span = debug_span!("keywords", method = method.as_str(), top_k).entered();
        // Remove newline characters from the input
        let cleaned_input = input.replace(['\n', '\r'], "");
        let keywords = match method {
            KeywordMethod::TextRank => {
                let mut keywords = jieba_lib::rank_keywords(
                    &self.textrank,
                    &self.jieba,
                    &cleaned_input,
                    top_k,
                    &self.keyword_config,
                );
                jieba_lib::normalize(&mut keywords);
                keywords
            }
            KeywordMethod::TfIdf => jieba_lib::rank_keywords(
                &self.tfidf,
                &self.jieba,
                &cleaned_input,
                top_k,
                &self.keyword_config,
            ),
        };
        debug!(found = keywords.len());
        keywords
    }

    /// Extracts the top `top_k` keywords with TextRank.
    pub fn keyword_extract_textrank(&self, input: &str, top_k: usize) -> Vec<String> {
        self.keyword_weight_textrank(input, top_k)
            .into_iter()
            .map(|k| k.keyword)
            .collect()
    }

    /// Returns weighted keywords using the TextRank algorithm.
    pub fn keyword_weight_textrank(&self, input: &str, top_k: usize) -> Vec<Keyword> {
        self.extract_keywords(input, top_k, KeywordMethod::TextRank)
    }

    /// Extracts the top `top_k` keywords with TF-IDF.
    pub fn keyword_extract_tfidf(&self, input: &str, top_k: usize) -> Vec<String> {
        self.keyword_weight_tfidf(input, top_k)
            .into_iter()
            .map(|k| k.keyword)
            .collect()
    }

    /// Returns weighted keywords using TF-IDF.
    pub fn keyword_weight_tfidf(&self, input: &str, top_k: usize) -> Vec<Keyword> {
        self.extract_keywords(input, top_k, KeywordMethod::TfIdf)
    }
}

fn open_table(table: &str, path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| OpenccError::load(table, format!("{}: {e}", path.display())))
}

// Forward longest match: at each char take the longest key any table in the
// group matches, otherwise copy the char through.
fn convert_by_longest_match(text: &str, dicts: &[&DictMap]) -> String {
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_count = offsets.len() - 1;
    let mut output = String::with_capacity(text.len() + (text.len() >> 1));

    let mut i = 0;
    while i < char_count {
        match DictMap::longest_match_among(dicts, text, &offsets, i) {
            Some((len, targets)) => {
                output.push_str(&targets[0]);
                i += len;
            }
            None => {
                output.push_str(&text[offsets[i]..offsets[i + 1]]);
                i += 1;
            }
        }
    }
    output
}

/// Joins tokens with `delimiter`.
///
/// ```
/// use opencc_jieba_engine::join_strings;
///
/// let tokens = ["白日", "依山", "尽", "，", "黄河", "入海流"];
/// assert_eq!(join_strings(&tokens, "; "), "白日; 依山; 尽; ，; 黄河; 入海流");
/// ```
pub fn join_strings<S: AsRef<str>>(tokens: &[S], delimiter: &str) -> String {
    let mut joined = String::new();
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 {
            joined.push_str(delimiter);
        }
        joined.push_str(token.as_ref());
    }
    joined
}

/// Returns the largest byte length not exceeding `max_byte_count` that ends
/// on a UTF-8 character boundary of `sv`.
///
/// ```
/// use opencc_jieba_engine::find_max_utf8_length;
/// let s = "你好abc";
/// let max_len = find_max_utf8_length(s, 7);
/// assert_eq!(&s[..max_len], "你好a");
/// ```
pub fn find_max_utf8_length(sv: &str, max_byte_count: usize) -> usize {
    if sv.len() <= max_byte_count {
        return sv.len();
    }
    let mut byte_count = max_byte_count;
    while byte_count > 0 && !sv.is_char_boundary(byte_count) {
        byte_count -= 1;
    }
    byte_count
}
