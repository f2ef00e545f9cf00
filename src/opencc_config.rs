use std::fmt;
use std::str::FromStr;

use crate::dictionary_lib::DictKind;
use crate::error::OpenccError;

/// OpenCC conversion configuration (strongly-typed).
///
/// Each variant names a fixed, ordered plan of dictionary rounds plus an
/// optional punctuation pass. Plans are defined here once and never change
/// at runtime.
///
/// # ABI / FFI
///
/// `OpenccConfig` is `#[repr(u32)]`, so each variant has a stable numeric value
/// suitable for C FFI. When accepting configs from FFI, **do not** `transmute`;
/// use [`OpenccConfig::from_ffi`].
///
/// # String parsing
///
/// Names are parsed with `FromStr` / `TryFrom<&str>`. Parsing is
/// **case-sensitive**: `"s2t"` is valid, `"S2T"` is not. Adapters that want to
/// be lenient should normalize before calling into the engine.
///
/// | Id | Name    | Description                               | Punctuation flag used? |
/// |---:|---------|-------------------------------------------|------------------------|
/// | 1  | `s2t`   | Simplified → Traditional                  | ✅                     |
/// | 2  | `s2tw`  | Simplified → Traditional (Taiwan)         | ✅                     |
/// | 3  | `s2twp` | Simplified → Taiwan (with phrases)        | ✅                     |
/// | 4  | `s2hk`  | Simplified → Hong Kong                    | ✅                     |
/// | 5  | `t2s`   | Traditional → Simplified                  | ✅                     |
/// | 6  | `t2tw`  | Traditional → Taiwan                      | ❌ (ignored)           |
/// | 7  | `t2twp` | Traditional → Taiwan (with phrases)       | ❌ (ignored)           |
/// | 8  | `t2hk`  | Traditional → Hong Kong                   | ❌ (ignored)           |
/// | 9  | `tw2s`  | Taiwan → Simplified                       | ✅                     |
/// | 10 | `tw2sp` | Taiwan → Simplified (with phrases)        | ✅                     |
/// | 11 | `tw2t`  | Taiwan → Traditional                      | ❌ (ignored)           |
/// | 12 | `tw2tp` | Taiwan → Traditional (with phrases)       | ❌ (ignored)           |
/// | 13 | `hk2s`  | Hong Kong → Simplified                    | ✅                     |
/// | 14 | `hk2t`  | Hong Kong → Traditional                   | ❌ (ignored)           |
/// | 15 | `jp2t`  | Japanese Shinjitai → Traditional          | ❌ (ignored)           |
/// | 16 | `t2jp`  | Traditional → Japanese Shinjitai          | ❌ (ignored)           |
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpenccConfig {
    /// Simplified Chinese → Traditional Chinese.
    S2t = 1,
    /// Simplified Chinese → Traditional Chinese (Taiwan standard).
    S2tw = 2,
    /// Simplified Chinese → Traditional Chinese (Taiwan, with phrases).
    S2twp = 3,
    /// Simplified Chinese → Traditional Chinese (Hong Kong standard).
    S2hk = 4,
    /// Traditional Chinese → Simplified Chinese.
    T2s = 5,
    /// Traditional Chinese → Taiwanese variant.
    T2tw = 6,
    /// Traditional Chinese → Taiwanese variant (with phrases).
    T2twp = 7,
    /// Traditional Chinese → Hong Kong variant.
    T2hk = 8,
    /// Taiwanese variant → Simplified Chinese.
    Tw2s = 9,
    /// Taiwanese variant → Simplified Chinese (with phrases).
    Tw2sp = 10,
    /// Taiwanese variant → Traditional Chinese.
    Tw2t = 11,
    /// Taiwanese variant → Traditional Chinese (with phrases).
    Tw2tp = 12,
    /// Hong Kong variant → Simplified Chinese.
    Hk2s = 13,
    /// Hong Kong variant → Traditional Chinese.
    Hk2t = 14,
    /// Japanese Kanji → Traditional Chinese.
    Jp2t = 15,
    /// Traditional Chinese → Japanese Kanji.
    T2jp = 16,
}

/// Direction of the optional punctuation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PunctuationStyle {
    /// `“ ” ‘ ’` → `「 」 『 』`
    SimplifiedToTraditional,
    /// `「 」 『 』` → `“ ” ‘ ’`
    TraditionalToSimplified,
}

/// The fixed pipeline behind a configuration.
///
/// `rounds` run strictly in order; each round's output feeds the next. Within
/// a round, tables are probed together by longest match, earlier tables
/// winning ties.
#[derive(Debug, Clone, Copy)]
pub struct ConversionPlan {
    pub rounds: &'static [&'static [DictKind]],
    /// `None` means the punctuation flag is ignored for this configuration.
    pub punctuation: Option<PunctuationStyle>,
}

use DictKind::*;

const ST: &[DictKind] = &[StPhrases, StCharacters];
const TS: &[DictKind] = &[TsPhrases, TsCharacters];
const TW_REV: &[DictKind] = &[TwVariantsRev, TwVariantsRevPhrases];
const HK_REV: &[DictKind] = &[HkVariantsRevPhrases, HkVariantsRev];

impl OpenccConfig {
    pub const ALL: [OpenccConfig; 16] = [
        OpenccConfig::S2t,
        OpenccConfig::T2s,
        OpenccConfig::S2tw,
        OpenccConfig::Tw2s,
        OpenccConfig::S2twp,
        OpenccConfig::Tw2sp,
        OpenccConfig::S2hk,
        OpenccConfig::Hk2s,
        OpenccConfig::T2tw,
        OpenccConfig::Tw2t,
        OpenccConfig::T2twp,
        OpenccConfig::Tw2tp,
        OpenccConfig::T2hk,
        OpenccConfig::Hk2t,
        OpenccConfig::T2jp,
        OpenccConfig::Jp2t,
    ];

    /// Converts an FFI numeric config value into [`OpenccConfig`].
    ///
    /// ```rust
    /// use opencc_jieba_engine::OpenccConfig;
    ///
    /// assert_eq!(OpenccConfig::from_ffi(1), Some(OpenccConfig::S2t));
    /// assert_eq!(OpenccConfig::from_ffi(999), None);
    /// ```
    #[inline]
    pub fn from_ffi(v: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|cfg| *cfg as u32 == v)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::S2t => "s2t",
            Self::S2tw => "s2tw",
            Self::S2twp => "s2twp",
            Self::S2hk => "s2hk",
            Self::T2s => "t2s",
            Self::T2tw => "t2tw",
            Self::T2twp => "t2twp",
            Self::T2hk => "t2hk",
            Self::Tw2s => "tw2s",
            Self::Tw2sp => "tw2sp",
            Self::Tw2t => "tw2t",
            Self::Tw2tp => "tw2tp",
            Self::Hk2s => "hk2s",
            Self::Hk2t => "hk2t",
            Self::Jp2t => "jp2t",
            Self::T2jp => "t2jp",
        }
    }

    pub fn plan(self) -> ConversionPlan {
        use PunctuationStyle::*;
        let (rounds, punctuation): (&'static [&'static [DictKind]], _) = match self {
            Self::S2t => (&[ST], Some(SimplifiedToTraditional)),
            Self::S2tw => (&[ST, &[TwVariants]], Some(SimplifiedToTraditional)),
            Self::S2twp => (
                &[ST, &[TwPhrases], &[TwVariants]],
                Some(SimplifiedToTraditional),
            ),
            Self::S2hk => (&[ST, &[HkVariants]], Some(SimplifiedToTraditional)),
            Self::T2s => (&[TS], Some(TraditionalToSimplified)),
            Self::Tw2s => (&[TW_REV, TS], Some(TraditionalToSimplified)),
            Self::Tw2sp => (
                &[TW_REV, &[TwPhrasesRev], TS],
                Some(TraditionalToSimplified),
            ),
            Self::Hk2s => (&[HK_REV, TS], Some(TraditionalToSimplified)),
            Self::T2tw => (&[&[TwVariants]], None),
            Self::T2twp => (&[&[TwPhrases], &[TwVariants]], None),
            Self::Tw2t => (&[TW_REV], None),
            Self::Tw2tp => (&[TW_REV, &[TwPhrasesRev]], None),
            Self::T2hk => (&[&[HkVariants]], None),
            Self::Hk2t => (&[HK_REV], None),
            Self::T2jp => (&[&[JpVariants]], None),
            Self::Jp2t => (&[&[JpsPhrases, JpsCharacters, JpVariantsRev]], None),
        };
        ConversionPlan {
            rounds,
            punctuation,
        }
    }
}

impl FromStr for OpenccConfig {
    type Err = OpenccError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|cfg| cfg.as_str() == s)
            .ok_or_else(|| OpenccError::UnknownConfig(s.to_owned()))
    }
}

impl TryFrom<&str> for OpenccConfig {
    type Error = OpenccError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for OpenccConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
