use std::collections::{BTreeSet, HashMap};
use std::io::BufRead;

use jieba_rs::{Jieba, Keyword, KeywordExtract, KeywordExtractConfig, TfIdf, DEFAULT_STOP_WORDS};
use once_cell::sync::Lazy;

use crate::config::KeywordConfig;
use crate::error::{OpenccError, Result};

/// Chinese function words never returned as keywords, in both scripts.
/// They are added to the English stop words of `jieba-rs`.
pub static STOP_WORDS: Lazy<BTreeSet<String>> = Lazy::new(|| {
    [
        // Simplified
        "我们", "你们", "他们", "她们", "它们", "这个", "那个", "这些", "那些", "一个", "一些",
        "已经", "因为", "所以", "但是", "如果", "可以", "没有", "什么", "怎么", "自己", "以及",
        "并且", "而且", "或者", "还是", "就是", "不是", "这样", "那样", "这里", "那里", "现在",
        "时候",
        // Traditional
        "這個", "那個", "這些", "那些", "一個", "一些", "已經", "因爲", "因為", "沒有", "什麼",
        "怎麼", "並且", "還是", "這樣", "那樣", "這裏", "這裡", "那裏", "那裡", "現在", "時候",
        "我們", "你們", "他們",
    ]
    .into_iter()
    .map(str::to_owned)
    .collect()
});

/// Extraction settings shared by TextRank and TF-IDF.
pub fn keyword_config(config: &KeywordConfig) -> Result<KeywordExtractConfig> {
    let mut stop_words: BTreeSet<String> = DEFAULT_STOP_WORDS.clone();
    stop_words.extend(STOP_WORDS.iter().cloned());
    stop_words.extend(config.stop_words.iter().map(|w| w.to_lowercase()));

    KeywordExtractConfig::builder()
        .set_stop_words(stop_words)
        .min_keyword_length(config.min_keyword_length)
        .use_hmm(config.use_hmm)
        .build()
        .map_err(|e| OpenccError::Config(e.to_string()))
}

/// Reads a `word idf` table into a TF-IDF extractor.
///
/// The table must hold at least one valid entry; words missing from it are
/// scored with the median IDF.
pub fn load_idf<R: BufRead>(mut reader: R, config: KeywordExtractConfig) -> Result<TfIdf> {
    let mut content = String::new();
    reader
        .read_to_string(&mut content)
        .map_err(|e| OpenccError::load("idf", e.to_string()))?;
    let has_entry = content.lines().any(|line| {
        let mut parts = line.split_whitespace();
        parts.next().is_some() && parts.next().is_some_and(|idf| idf.parse::<f64>().is_ok())
    });
    if !has_entry {
        return Err(OpenccError::load("idf", "no `word idf` entries"));
    }

    let mut tfidf = TfIdf::new(None::<&mut std::io::Empty>, config);
    tfidf
        .load_dict(&mut content.as_bytes())
        .map_err(|e| OpenccError::load("idf", e.to_string()))?;
    Ok(tfidf)
}

/// Runs `extractor` over every candidate of `sentence` and returns the best
/// `top_k`, highest weight first.
///
/// Equal weights keep the order in which the words first appear in the
/// segmented sentence, and tokens the config filters out (too short, stop
/// words, no letters or digits) are never returned.
pub fn rank_keywords<E: KeywordExtract>(
    extractor: &E,
    jieba: &Jieba,
    sentence: &str,
    top_k: usize,
    config: &KeywordExtractConfig,
) -> Vec<Keyword> {
    if top_k == 0 || sentence.is_empty() {
        return Vec::new();
    }
    let tokens = jieba.cut(sentence, config.use_hmm());
    let mut first_seen: HashMap<&str, usize> = HashMap::new();
    for (i, token) in tokens.iter().enumerate() {
        first_seen.entry(*token).or_insert(i);
    }

    // asking for as many keywords as there are tokens returns every candidate
    let mut ranked: Vec<Keyword> = extractor
        .extract_keywords(jieba, sentence, tokens.len(), Vec::new())
        .into_iter()
        .filter(|k| is_candidate(&k.keyword, config))
        .collect();
    ranked.sort_by(|a, b| {
        b.weight
            .total_cmp(&a.weight)
            .then_with(|| position(&first_seen, a).cmp(&position(&first_seen, b)))
    });
    ranked.truncate(top_k);
    ranked
}

/// Scales weights so the best keyword scores 1.0.
pub(crate) fn normalize(keywords: &mut [Keyword]) {
    let max = keywords.iter().map(|k| k.weight).fold(0.0, f64::max);
    if max > 0.0 {
        for keyword in keywords {
            keyword.weight /= max;
        }
    }
}

fn position(first_seen: &HashMap<&str, usize>, keyword: &Keyword) -> usize {
    first_seen
        .get(keyword.keyword.as_str())
        .copied()
        .unwrap_or(usize::MAX)
}

fn is_candidate(word: &str, config: &KeywordExtractConfig) -> bool {
    word.chars().count() >= config.min_keyword_length()
        && word.chars().any(char::is_alphanumeric)
        && !config.stop_words().contains(&word.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<(&'static str, f64)>);

    impl KeywordExtract for Fixed {
        fn extract_keywords(&self, _: &Jieba, _: &str, top_k: usize, _: Vec<String>) -> Vec<Keyword> {
            self.0
                .iter()
                .take(top_k)
                .map(|&(keyword, weight)| Keyword {
                    keyword: keyword.to_string(),
                    weight,
                })
                .collect()
        }
    }

    fn words(keywords: &[Keyword]) -> Vec<&str> {
        keywords.iter().map(|k| k.keyword.as_str()).collect()
    }

    #[test]
    fn filters_short_and_stop_words() {
        let config = keyword_config(&KeywordConfig::default()).unwrap();
        assert!(!is_candidate("的", &config));
        assert!(!is_candidate("我们", &config));
        assert!(!is_candidate("我們", &config));
        assert!(!is_candidate("The", &config));
        assert!(!is_candidate("，。", &config));
        assert!(is_candidate("黄河", &config));
        assert!(is_candidate("rust", &config));
    }

    #[test]
    fn extra_stop_words_are_honored() {
        let config = keyword_config(&KeywordConfig {
            stop_words: vec!["黄河".to_string(), "Rust".to_string()],
            ..KeywordConfig::default()
        })
        .unwrap();
        assert!(!is_candidate("黄河", &config));
        assert!(!is_candidate("RUST", &config));
    }

    #[test]
    fn ties_keep_first_occurrence() {
        let jieba = Jieba::with_dict(&mut "黄河 10\n长江 10\n大桥 10\n".as_bytes()).unwrap();
        let config = keyword_config(&KeywordConfig::default()).unwrap();
        // extractor reports ties in code point order
        let extractor = Fixed(vec![("大桥", 1.0), ("长江", 1.0), ("黄河", 2.0), ("，", 3.0)]);

        let ranked = rank_keywords(&extractor, &jieba, "长江，黄河，大桥", 10, &config);
        assert_eq!(words(&ranked), ["黄河", "长江", "大桥"]);
        let ranked = rank_keywords(&extractor, &jieba, "大桥，长江，黄河", 10, &config);
        assert_eq!(words(&ranked), ["黄河", "大桥", "长江"]);

        assert!(rank_keywords(&extractor, &jieba, "长江", 0, &config).is_empty());
        assert_eq!(rank_keywords(&extractor, &jieba, "长江，黄河，大桥", 1, &config).len(), 1);
    }

    #[test]
    fn normalizes_to_best_weight() {
        let mut keywords = vec![
            Keyword { keyword: "黄河".into(), weight: 4.0 },
            Keyword { keyword: "长江".into(), weight: 1.0 },
        ];
        normalize(&mut keywords);
        assert_eq!(keywords[0].weight, 1.0);
        assert_eq!(keywords[1].weight, 0.25);
    }

    #[test]
    fn idf_table_needs_entries() {
        let config = keyword_config(&KeywordConfig::default()).unwrap();
        assert!(load_idf("黄河 5.0\n".as_bytes(), config.clone()).is_ok());
        assert!(matches!(
            load_idf("\n# nothing\n".as_bytes(), config),
            Err(OpenccError::DictionaryLoad { .. })
        ));
    }
}
