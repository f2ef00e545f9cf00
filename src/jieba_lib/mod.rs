//! Word segmentation and keyword extraction on top of `jieba-rs`.
//!
//! The segmenter is loaded from a merged Simplified/Traditional word list
//! embedded in the binary. Unknown runs go through the trained B/M/E/S
//! HMM that ships with `jieba-rs`.

mod keywords;

use std::io::{BufRead, Cursor, Read};

use tracing::{debug, debug_span};
use zstd::stream::read::Decoder;

pub use jieba_rs::{Jieba, Keyword, KeywordExtract, KeywordExtractConfig, TextRank, TfIdf};
pub use keywords::{keyword_config, load_idf, rank_keywords, STOP_WORDS};
pub(crate) use keywords::normalize;

use crate::error::{OpenccError, Result};

const DICT_HANS_HANT_ZSTD: &[u8] = include_bytes!("../dictionary_lib/dicts/dict_hans_hant.txt.zst");

/// Frequencies above this are clamped when a user dictionary is merged, so
/// the running total of the segmenter cannot overflow.
pub const MAX_WORD_FREQ: usize = u32::MAX as usize;

/// Segmenter over the embedded word list.
pub fn builtin_jieba() -> Result<Jieba> {
    let _span = debug_span!("jieba_builtin").entered();
    let mut decoder = Decoder::new(Cursor::new(DICT_HANS_HANT_ZSTD))
        .map_err(|e| OpenccError::load("jieba dict", e.to_string()))?;
    let mut dict = String::new();
    decoder
        .read_to_string(&mut dict)
        .map_err(|e| OpenccError::load("jieba dict", e.to_string()))?;
    Jieba::with_dict(&mut dict.as_bytes()).map_err(|e| OpenccError::load("jieba dict", e.to_string()))
}

/// Segmenter over a main `word [freq] [tag]` dictionary.
pub fn jieba_from_reader<R: BufRead>(table: &str, reader: R) -> Result<Jieba> {
    let mut jieba = Jieba::empty();
    load_user_dict(&mut jieba, table, reader)?;
    Ok(jieba)
}

/// Merges a `word [freq] [tag]` dictionary into `jieba`.
///
/// Lines are checked before anything is merged: a frequency that is not a
/// number fails the whole table, one that is too large is clamped to
/// [`MAX_WORD_FREQ`]. Words already present take the new frequency.
pub fn load_user_dict<R: BufRead>(jieba: &mut Jieba, table: &str, reader: R) -> Result<()> {
    let mut sanitized = String::new();
    let mut words = 0usize;
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| OpenccError::load(table, e.to_string()))?;
        let mut parts = line.trim_start_matches('\u{FEFF}').split_whitespace();
        let Some(word) = parts.next() else { continue };
        sanitized.push_str(word);
        if let Some(freq) = parts.next() {
            let freq = parse_freq(freq).ok_or_else(|| {
                OpenccError::load(table, format!("line {}: bad frequency `{freq}`", index + 1))
            })?;
            sanitized.push(' ');
            sanitized.push_str(&freq.to_string());
        }
        if let Some(tag) = parts.next() {
            sanitized.push(' ');
            sanitized.push_str(tag);
        }
        sanitized.push('\n');
        words += 1;
    }
    jieba
        .load_dict(&mut sanitized.as_bytes())
        .map_err(|e| OpenccError::load(table, e.to_string()))?;
    debug!(table, words, "merged word list");
    Ok(())
}

fn parse_freq(freq: &str) -> Option<usize> {
    if freq.is_empty() || !freq.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(freq.parse::<usize>().unwrap_or(MAX_WORD_FREQ).min(MAX_WORD_FREQ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_word_list_covers_both_scripts() {
        let jieba = builtin_jieba().unwrap();
        assert!(jieba.has_word("清华大学"));
        assert!(jieba.has_word("長江大橋"));
        assert_eq!(jieba.cut("南京市长江大桥", false), vec!["南京市", "长江大桥"]);
    }

    #[test]
    fn hmm_joins_unknown_words() {
        let jieba = builtin_jieba().unwrap();
        let text = "我来到北京清华大学，他来到了网易杭研大厦";
        assert_eq!(
            jieba.cut(text, true),
            vec!["我", "来到", "北京", "清华大学", "，", "他", "来到", "了", "网易", "杭研", "大厦"]
        );
        assert!(jieba.cut(text, false).contains(&"杭"));
        assert_eq!(
            jieba.cut("白日依山尽，黄河入海流", true),
            vec!["白日", "依山", "尽", "，", "黄河", "入海流"]
        );
    }

    #[test]
    fn whitespace_and_symbols_are_separate_tokens() {
        let jieba = Jieba::empty();
        assert_eq!(jieba.cut("a b\r\n!", false), vec!["a", " ", "b", "\r\n", "!"]);
        assert_eq!(jieba.cut("abc123", false), vec!["abc123"]);
    }

    #[test]
    fn user_dict_changes_segmentation() {
        let mut jieba = jieba_from_reader("main", "入 10\n海 10\n流 10\n".as_bytes()).unwrap();
        assert_eq!(jieba.cut("入海流", false), vec!["入", "海", "流"]);

        load_user_dict(&mut jieba, "user", "入海 1000 n\n".as_bytes()).unwrap();
        assert_eq!(jieba.cut("入海流", false), vec!["入海", "流"]);
    }

    #[test]
    fn huge_frequency_is_clamped() {
        let mut jieba = builtin_jieba().unwrap();
        let dict = "杭研 18446744073709551615\n网易杭研 99999999999999999999999\n";
        load_user_dict(&mut jieba, "user", dict.as_bytes()).unwrap();
        assert!(jieba.has_word("网易杭研"));
        assert_eq!(jieba.cut("网易杭研大厦", false)[0], "网易杭研");

        assert_eq!(parse_freq("18446744073709551615"), Some(MAX_WORD_FREQ));
        assert_eq!(parse_freq("42"), Some(42));
        assert_eq!(parse_freq("-1"), None);
    }

    #[test]
    fn bad_frequency_fails_load() {
        let mut jieba = Jieba::empty();
        match load_user_dict(&mut jieba, "user", "黄河 10\n长江 lots\n".as_bytes()) {
            Err(OpenccError::DictionaryLoad { table, reason }) => {
                assert_eq!(table, "user");
                assert!(reason.contains("line 2"));
            }
            other => panic!("expected load error, got {:?}", other.map(|_| ())),
        }
        assert!(!jieba.has_word("黄河"));
    }
}
