use std::collections::HashSet;

use crate::config::ScriptDetectConfig;
use crate::dictionary_lib::{DictMap, Dictionary};
use crate::is_delimiter;

/// Result of script detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZhoScript {
    Simplified,
    Traditional,
    /// Both scripts present with neither holding the majority.
    Mixed,
    /// No script-specific Chinese characters found.
    Neither,
}

impl ZhoScript {
    /// Numeric code used by `zho_check` and the C ABI:
    /// `1` Traditional, `2` Simplified, `0` mixed or undetermined.
    pub fn code(self) -> i32 {
        match self {
            ZhoScript::Traditional => 1,
            ZhoScript::Simplified => 2,
            ZhoScript::Mixed | ZhoScript::Neither => 0,
        }
    }
}

/// Classifies text by counting characters that exist in only one script.
///
/// The two character sets come from the single-character conversion tables:
/// a char that `STCharacters` changes is Simplified-only, a char that
/// `TSCharacters` changes is Traditional-only, and chars claimed by both are
/// dropped from both sets.
#[derive(Debug, Clone)]
pub struct ScriptDetector {
    simplified_only: HashSet<char>,
    traditional_only: HashSet<char>,
    config: ScriptDetectConfig,
}

impl ScriptDetector {
    pub fn from_dictionary(dictionary: &Dictionary, config: ScriptDetectConfig) -> Self {
        let mut simplified_only = changed_chars(&dictionary.st_characters);
        let mut traditional_only = changed_chars(&dictionary.ts_characters);
        let shared: Vec<char> = simplified_only
            .intersection(&traditional_only)
            .copied()
            .collect();
        for ch in shared {
            simplified_only.remove(&ch);
            traditional_only.remove(&ch);
        }
        ScriptDetector {
            simplified_only,
            traditional_only,
            config,
        }
    }

    /// Single pass over at most `sample_limit` non-ignored characters.
    /// ASCII, whitespace and punctuation are ignored.
    pub fn classify(&self, text: &str) -> ZhoScript {
        let mut simplified = 0usize;
        let mut traditional = 0usize;
        for ch in text
            .chars()
            .filter(|&ch| !is_ignored(ch))
            .take(self.config.sample_limit)
        {
            if self.simplified_only.contains(&ch) {
                simplified += 1;
            } else if self.traditional_only.contains(&ch) {
                traditional += 1;
            }
        }

        let total = simplified + traditional;
        if total == 0 || total < self.config.min_samples {
            return ZhoScript::Neither;
        }
        let ratio = self.config.majority_ratio;
        if simplified as f64 / total as f64 > ratio {
            ZhoScript::Simplified
        } else if traditional as f64 / total as f64 > ratio {
            ZhoScript::Traditional
        } else {
            ZhoScript::Mixed
        }
    }
}

fn changed_chars(table: &DictMap) -> HashSet<char> {
    table
        .map
        .iter()
        .filter_map(|(key, targets)| {
            let mut chars = key.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) if targets.first().is_some_and(|t| t != key) => Some(ch),
                _ => None,
            }
        })
        .collect()
}

fn is_ignored(ch: char) -> bool {
    ch.is_ascii() || ch.is_whitespace() || is_delimiter(ch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> ScriptDetector {
        let dictionary = Dictionary::new().unwrap();
        ScriptDetector::from_dictionary(&dictionary, ScriptDetectConfig::default())
    }

    #[test]
    fn classifies_single_script_text() {
        let d = detector();
        assert_eq!(d.classify("黄河入海流"), ZhoScript::Simplified);
        assert_eq!(d.classify("黃河入海流"), ZhoScript::Traditional);
        assert_eq!(d.classify("“春眠不觉晓，处处闻啼鸟。”"), ZhoScript::Simplified);
        assert_eq!(d.classify("「春眠不覺曉，處處聞啼鳥。」"), ZhoScript::Traditional);
    }

    #[test]
    fn neutral_inputs_are_neither() {
        let d = detector();
        assert_eq!(d.classify(""), ZhoScript::Neither);
        assert_eq!(d.classify("Hello World! 123"), ZhoScript::Neither);
        assert_eq!(d.classify("入海"), ZhoScript::Neither);
        assert_eq!(d.classify("，。！"), ZhoScript::Neither);
    }

    #[test]
    fn even_split_is_mixed() {
        let d = detector();
        assert_eq!(d.classify("黄黃"), ZhoScript::Mixed);
        assert_eq!(d.classify("黄龙黃"), ZhoScript::Simplified);
    }

    #[test]
    fn sampling_stops_at_limit() {
        let dictionary = Dictionary::new().unwrap();
        let config = ScriptDetectConfig {
            sample_limit: 2,
            ..ScriptDetectConfig::default()
        };
        let d = ScriptDetector::from_dictionary(&dictionary, config);
        // only 黄 and 河 are inspected
        assert_eq!(d.classify("黄河黃黃黃"), ZhoScript::Simplified);
    }

    #[test]
    fn codes_follow_check_contract() {
        assert_eq!(ZhoScript::Traditional.code(), 1);
        assert_eq!(ZhoScript::Simplified.code(), 2);
        assert_eq!(ZhoScript::Mixed.code(), 0);
        assert_eq!(ZhoScript::Neither.code(), 0);
    }
}
