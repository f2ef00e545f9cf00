//! Boundary contract shared by the C ABI and the command line tool.
//!
//! An [`OpenccHandle`] owns at most one engine. Once destroyed (or if
//! construction failed) every operation reports
//! [`OpenccError::InstanceUnavailable`] instead of touching freed state.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::{OpenccError, Result};
use crate::jieba_lib::Keyword;
use crate::OpenCC;

/// Keyword extraction algorithm selected by name at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordMethod {
    TextRank,
    TfIdf,
}

impl KeywordMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            KeywordMethod::TextRank => "textrank",
            KeywordMethod::TfIdf => "tfidf",
        }
    }
}

impl FromStr for KeywordMethod {
    type Err = OpenccError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "textrank" => Ok(KeywordMethod::TextRank),
            "tfidf" => Ok(KeywordMethod::TfIdf),
            other => Err(OpenccError::UnknownKeywordMethod(other.to_owned())),
        }
    }
}

impl fmt::Display for KeywordMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owning wrapper around a shared engine.
#[derive(Default)]
pub struct OpenccHandle {
    engine: Option<Arc<OpenCC>>,
}

impl OpenccHandle {
    /// Builds an engine over the embedded data.
    pub fn create() -> Result<Self> {
        Self::with_config(&EngineConfig::default())
    }

    pub fn with_config(config: &EngineConfig) -> Result<Self> {
        let engine = OpenCC::with_config(config)?;
        Ok(Self::from_engine(Arc::new(engine)))
    }

    pub fn from_engine(engine: Arc<OpenCC>) -> Self {
        OpenccHandle {
            engine: Some(engine),
        }
    }

    /// Releases the engine. Calling it again is a no-op.
    pub fn destroy(&mut self) {
        if self.engine.take().is_some() {
            debug!("engine released");
        }
    }

    pub fn is_available(&self) -> bool {
        self.engine.is_some()
    }

    fn engine(&self) -> Result<&OpenCC> {
        match &self.engine {
            Some(engine) => Ok(engine),
            None => {
                warn!("operation on unavailable engine");
                Err(OpenccError::InstanceUnavailable)
            }
        }
    }

    /// Converts `input` with the named configuration.
    pub fn convert(&self, input: &str, config: &str, punctuation: bool) -> Result<String> {
        self.engine()?.convert(input, config, punctuation)
    }

    /// `1` Traditional, `2` Simplified, `0` mixed or undetermined.
    pub fn check_script(&self, input: &str) -> Result<i32> {
        Ok(self.engine()?.zho_check(input))
    }

    pub fn segment(&self, input: &str, hmm: bool) -> Result<Vec<String>> {
        Ok(self.engine()?.jieba_cut(input, hmm))
    }

    pub fn segment_and_join(&self, input: &str, hmm: bool, delimiter: &str) -> Result<String> {
        Ok(self.engine()?.jieba_cut_and_join(input, hmm, delimiter))
    }

    /// Keywords only, highest weight first.
    pub fn extract_keywords(&self, input: &str, top_k: usize, method: &str) -> Result<Vec<String>> {
        Ok(self
            .extract_keywords_weighted(input, top_k, method)?
            .into_iter()
            .map(|k| k.keyword)
            .collect())
    }

    pub fn extract_keywords_weighted(
        &self,
        input: &str,
        top_k: usize,
        method: &str,
    ) -> Result<Vec<Keyword>> {
        let engine = self.engine()?;
        let method: KeywordMethod = method.parse()?;
        Ok(engine.extract_keywords(input, top_k, method))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_names_are_exact() {
        assert_eq!("textrank".parse::<KeywordMethod>().unwrap(), KeywordMethod::TextRank);
        assert_eq!("tfidf".parse::<KeywordMethod>().unwrap(), KeywordMethod::TfIdf);
        assert!(matches!(
            "TextRank".parse::<KeywordMethod>(),
            Err(OpenccError::UnknownKeywordMethod(_))
        ));
        assert_eq!(KeywordMethod::TfIdf.to_string(), "tfidf");
    }

    #[test]
    fn operations_fail_after_destroy() {
        let mut handle = OpenccHandle::create().unwrap();
        assert_eq!(handle.convert("龙马", "s2t", false).unwrap(), "龍馬");
        handle.destroy();
        handle.destroy();
        assert!(!handle.is_available());
        assert!(matches!(
            handle.convert("龙马", "s2t", false),
            Err(OpenccError::InstanceUnavailable)
        ));
        assert!(matches!(handle.check_script("龙马"), Err(OpenccError::InstanceUnavailable)));
        assert!(matches!(handle.segment("龙马", true), Err(OpenccError::InstanceUnavailable)));
        assert!(matches!(
            handle.extract_keywords("龙马", 3, "bogus"),
            Err(OpenccError::InstanceUnavailable)
        ));
    }

    #[test]
    fn default_handle_is_unavailable() {
        let handle = OpenccHandle::default();
        assert!(!handle.is_available());
        assert!(handle.segment_and_join("", false, " ").is_err());
    }

    #[test]
    fn reports_unknown_names() {
        let handle = OpenccHandle::create().unwrap();
        assert!(matches!(
            handle.convert("龙马", "zz", false),
            Err(OpenccError::UnknownConfig(_))
        ));
        assert!(matches!(
            handle.extract_keywords("龙马", 3, "bm25"),
            Err(OpenccError::UnknownKeywordMethod(_))
        ));
    }

    #[test]
    fn shared_engine_serves_many_handles() {
        let engine = Arc::new(OpenCC::new().unwrap());
        let a = OpenccHandle::from_engine(Arc::clone(&engine));
        let mut b = OpenccHandle::from_engine(engine);
        b.destroy();
        assert_eq!(a.check_script("黄河").unwrap(), 2);
        assert_eq!(
            a.segment_and_join("南京市长江大桥", false, "/").unwrap(),
            "南京市/长江大桥"
        );
    }
}
