use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::io::BufRead;

use crate::error::{OpenccError, Result};

/// A single OpenCC-style mapping table with precomputed key-length metadata.
///
/// Each source key maps to one or more targets; the first target is the
/// preferred one and is what conversion emits. `key_len_mask` (bits 0–63 for
/// lengths 1..=64) and `long_lengths` (> 64) let longest-match probing skip
/// lengths that cannot hit.
///
/// # Example (JSON)
///
/// ```json
/// {
///   "map": { "漢字": ["汉字"] },
///   "min_len": 2,
///   "max_len": 2,
///   "key_len_mask": 2,
///   "long_lengths": []
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DictMap {
    /// Source phrase → target phrases (first target preferred).
    #[serde(default)]
    pub map: HashMap<String, Vec<String>>,

    /// Shortest key length in Unicode scalars.
    #[serde(default)]
    pub min_len: u16,

    /// Longest key length in Unicode scalars.
    #[serde(default)]
    pub max_len: u16,

    /// Bit *n-1* is set when a key of length *n* exists (n ≤ 64).
    #[serde(default)]
    pub key_len_mask: u64,

    /// Key lengths greater than 64, if any.
    #[serde(default)]
    pub long_lengths: HashSet<u16>,
}

impl DictMap {
    /// Inserts `key → targets` and updates length statistics incrementally.
    ///
    /// ```
    /// use opencc_jieba_engine::dictionary_lib::DictMap;
    ///
    /// let mut d = DictMap::default();
    /// d.insert_with_len("漢字".into(), vec!["汉字".into()], 2);
    /// assert!(d.has_key_len(2));
    /// assert_eq!(d.get("漢字"), Some("汉字"));
    /// ```
    #[inline]
    pub fn insert_with_len(&mut self, key: String, targets: Vec<String>, len_chars: u16) {
        if len_chars != 0 {
            if len_chars <= 64 {
                self.key_len_mask |= 1u64 << (len_chars - 1);
            } else {
                self.long_lengths.insert(len_chars);
            }
            if self.min_len == 0 || len_chars < self.min_len {
                self.min_len = len_chars;
            }
            if len_chars > self.max_len {
                self.max_len = len_chars;
            }
        }
        self.map.insert(key, targets);
    }

    /// Preferred target for `from`, if the key exists.
    #[inline(always)]
    pub fn get(&self, from: &str) -> Option<&str> {
        self.map
            .get(from)
            .and_then(|targets| targets.first())
            .map(String::as_str)
    }

    /// All targets for `from`, in table order.
    #[inline]
    pub fn get_all(&self, from: &str) -> Option<&[String]> {
        self.map.get(from).map(Vec::as_slice)
    }

    #[inline(always)]
    pub fn has_key_len(&self, n: u16) -> bool {
        if n == 0 {
            return false;
        }
        if n <= 64 {
            (self.key_len_mask & (1u64 << (n - 1))) != 0
        } else {
            self.long_lengths.contains(&n)
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Longest key that is a prefix of the text starting at char index `start`.
    ///
    /// `offsets` holds the byte offset of every char in `text` followed by
    /// `text.len()`. Returns the matched length in chars and the targets, or
    /// `None` when nothing matches (callers pass the char through unchanged).
    pub fn longest_match<'a>(
        &'a self,
        text: &str,
        offsets: &[usize],
        start: usize,
    ) -> Option<(usize, &'a [String])> {
        Self::longest_match_among(&[self], text, offsets, start)
    }

    /// Longest match over an ordered group of tables.
    ///
    /// Length wins first; among keys of equal length the earlier table wins.
    pub fn longest_match_among<'a>(
        dicts: &[&'a DictMap],
        text: &str,
        offsets: &[usize],
        start: usize,
    ) -> Option<(usize, &'a [String])> {
        let char_count = offsets.len().saturating_sub(1);
        if start >= char_count {
            return None;
        }
        let remaining = char_count - start;
        let max_len = dicts.iter().map(|d| d.max_len as usize).max().unwrap_or(0);
        let upper = max_len.min(remaining);

        for len in (1..=upper).rev() {
            let key = &text[offsets[start]..offsets[start + len]];
            for dict in dicts {
                if !dict.has_key_len(len as u16) {
                    continue;
                }
                if let Some(targets) = dict.map.get(key) {
                    if !targets.is_empty() {
                        return Some((len, targets.as_slice()));
                    }
                }
            }
        }
        None
    }

    /// Parses an OpenCC text table: one `source<TAB>target [target...]` per line.
    ///
    /// Blank lines are skipped. Any other line that does not split into a
    /// source plus at least one target fails the whole table.
    pub fn load_from_str(table: &str, content: &str) -> Result<DictMap> {
        let mut dict = DictMap::default();
        for (index, line) in content.lines().enumerate() {
            dict.insert_line(table, index + 1, line)?;
        }
        Ok(dict)
    }

    /// Same as [`DictMap::load_from_str`], reading line by line.
    pub fn load_from_reader<R: BufRead>(table: &str, reader: R) -> Result<DictMap> {
        let mut dict = DictMap::default();
        for (index, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| OpenccError::load(table, e.to_string()))?;
            dict.insert_line(table, index + 1, &line)?;
        }
        Ok(dict)
    }

    fn insert_line(&mut self, table: &str, line_no: usize, line: &str) -> Result<()> {
        let line = line.trim_start_matches('\u{FEFF}');
        if line.trim().is_empty() {
            return Ok(());
        }
        let mut parts = line.split_whitespace();
        let key = match parts.next() {
            Some(key) => key,
            None => return Ok(()),
        };
        let targets: Vec<String> = parts.map(str::to_owned).collect();
        if targets.is_empty() {
            return Err(OpenccError::load(
                table,
                format!("line {line_no}: expected a source followed by one or more targets"),
            ));
        }
        let len_chars = key.chars().count() as u16;
        self.insert_with_len(key.to_owned(), targets, len_chars);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offsets(text: &str) -> Vec<usize> {
        text.char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect()
    }

    #[test]
    fn tracks_key_length_stats() {
        let d = DictMap::load_from_str("t", "自然\t自然\n自然律\t自然律\n云\t雲 云\n").unwrap();
        assert_eq!(d.min_len, 1);
        assert_eq!(d.max_len, 3);
        assert!(d.has_key_len(1) && d.has_key_len(2) && d.has_key_len(3));
        assert!(!d.has_key_len(4));
        assert_eq!(d.get_all("云").unwrap(), ["雲", "云"]);
    }

    #[test]
    fn prefers_longest_key() {
        let d = DictMap::load_from_str("t", "自然\tA\n自然律\tB\n").unwrap();
        let text = "自然律是";
        let (len, targets) = d.longest_match(text, &offsets(text), 0).unwrap();
        assert_eq!(len, 3);
        assert_eq!(targets[0], "B");
        assert!(d.longest_match(text, &offsets(text), 3).is_none());
    }

    #[test]
    fn equal_length_goes_to_earlier_table() {
        let first = DictMap::load_from_str("a", "干\t乾\n").unwrap();
        let second = DictMap::load_from_str("b", "干\t幹\n").unwrap();
        let text = "干";
        let (_, targets) =
            DictMap::longest_match_among(&[&first, &second], text, &offsets(text), 0).unwrap();
        assert_eq!(targets[0], "乾");
    }

    #[test]
    fn rejects_line_without_target() {
        let err = DictMap::load_from_str("STPhrases", "好\t好\n坏行\n").unwrap_err();
        match err {
            OpenccError::DictionaryLoad { table, reason } => {
                assert_eq!(table, "STPhrases");
                assert!(reason.contains("line 2"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn skips_blank_lines() {
        let d = DictMap::load_from_str("t", "\n  \n发\t發 髮\n").unwrap();
        assert_eq!(d.len(), 1);
    }
}
