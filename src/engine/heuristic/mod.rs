//! Local, rule-based detector for hostile English and Arabic text.
//!
//! Stages run in order and the first hit wins: direct-address patterns,
//! exact keywords, then fuzzy matching of English tokens.

mod arabic;
mod lexicon;

use std::{fmt, sync::LazyLock};

use regex::Regex;

pub use arabic::{dearabizi, normalize as normalize_arabic};
pub use lexicon::{ARABIC_KEYWORDS, ENGLISH_KEYWORDS, Lexicon};

use crate::config::HarmConfig;

/// Minimum similarity for a token to count as a misspelled keyword.
pub const FUZZY_THRESHOLD: f64 = 0.82;

/// "you are / you're / ur ..." followed by up to four words.
static ENGLISH_DIRECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:you|u|ur|you're|youre)\s+(?:(?:are|r)\s+)?(?:(?:so|such\s+an?|a|an|really|very)\s+)?((?:[a-z\-]{2,}\s*){1,4})",
    )
    .expect("valid english direct-address regex")
});

/// Arabic direct address, written against normalized text.
static ARABIC_DIRECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        // انت ... <insult>
        r"(?:^|\s)انت\s+[^.!?]*\b(?:غبي|تافه|كلب|قذر|زباله|حقير|قبيح|كسول|سيئ|سيء|اسوء|اسوا|سخيف)\b",
        // <name> + aggressive imperative
        r"|^[\x{0621}-\x{064A}]{2,}\s+(?:خلص|رد|انقلع|برا|بره)\b",
        // رد ع / رد علي <name>
        r"|\bرد\s+(?:ع|علي)\s+[\x{0621}-\x{064A}]{2,}",
    ))
    .expect("valid arabic direct-address regex")
});

static ENGLISH_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z]{3,}").expect("valid token regex"));

/// Why the heuristic flagged a text.
#[derive(Debug, Clone, PartialEq)]
pub enum HeuristicSignal {
    /// "you are <insult>" style address.
    EnglishDirectAddress {
        /// The insult that followed the address.
        insult: String,
    },
    /// Arabic direct address or aggressive imperative.
    ArabicDirectAddress {
        /// The matched span of normalized text.
        matched: String,
    },
    /// An English keyword or phrase.
    EnglishKeyword(String),
    /// An Arabic keyword in normalized text.
    ArabicKeyword(String),
    /// An English token close to a keyword.
    Fuzzy {
        /// The token found in the text.
        token: String,
        /// The keyword it resembles.
        keyword: String,
        /// Normalized similarity between the two, in `0.0..=1.0`.
        similarity: f64,
    },
}

impl fmt::Display for HeuristicSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeuristicSignal::EnglishDirectAddress { insult } => write!(f, "direct address ({insult})"),
            HeuristicSignal::ArabicDirectAddress { matched } => write!(f, "direct address ({matched})"),
            HeuristicSignal::EnglishKeyword(k) | HeuristicSignal::ArabicKeyword(k) => {
                write!(f, "keyword ({k})")
            }
            HeuristicSignal::Fuzzy { token, keyword, similarity } => {
                write!(f, "fuzzy ({token} ~ {keyword}, {similarity:.2})")
            }
        }
    }
}

/// Rule-based harmful-content detector.
#[derive(Debug, Clone)]
pub struct HeuristicDetector {
    lexicon: Lexicon,
    arabic_enabled: bool,
}

impl HeuristicDetector {
    /// Builds the detector from the monitor configuration.
    pub fn new(config: &HarmConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            lexicon: Lexicon::new(&config.extra_keywords)?,
            arabic_enabled: config.arabic_dialect,
        })
    }

    /// Whether any stage flags `text`.
    pub fn is_harmful(&self, text: &str) -> bool {
        self.detect(text).is_some()
    }

    /// Runs every stage and returns the first signal found.
    pub fn detect(&self, text: &str) -> Option<HeuristicSignal> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let lower = text.to_lowercase();
        let arabic = self.arabic_enabled.then(|| normalize_arabic(&dearabizi(text)));

        if let Some(signal) = self.english_direct_address(&lower) {
            return Some(signal);
        }
        if let Some(m) = arabic.as_deref().and_then(|t| ARABIC_DIRECT.find(t)) {
            return Some(HeuristicSignal::ArabicDirectAddress { matched: m.as_str().trim().to_string() });
        }

        if let Some(keyword) = self.lexicon.find_english(&lower) {
            return Some(HeuristicSignal::EnglishKeyword(keyword.to_string()));
        }
        if let Some(keyword) = arabic.as_deref().and_then(|t| self.lexicon.find_arabic(t)) {
            return Some(HeuristicSignal::ArabicKeyword(keyword.to_string()));
        }

        ENGLISH_TOKEN.find_iter(&lower).find_map(|token| {
            self.closest_keyword(token.as_str()).map(|(keyword, similarity)| HeuristicSignal::Fuzzy {
                token: token.as_str().to_string(),
                keyword: keyword.to_string(),
                similarity,
            })
        })
    }

    fn english_direct_address(&self, lower: &str) -> Option<HeuristicSignal> {
        ENGLISH_DIRECT.captures_iter(lower).find_map(|caps| {
            caps.get(1)?.as_str().split_whitespace().find_map(|word| {
                let word = word.trim_matches('-');
                let is_insult = self.lexicon.english_words().iter().any(|k| k == word)
                    || self.closest_keyword(word).is_some();
                is_insult.then(|| HeuristicSignal::EnglishDirectAddress { insult: word.to_string() })
            })
        })
    }

    fn closest_keyword(&self, token: &str) -> Option<(&str, f64)> {
        self.lexicon
            .english_words()
            .iter()
            .map(|k| (k.as_str(), strsim::normalized_levenshtein(token, k)))
            .filter(|(_, similarity)| *similarity >= FUZZY_THRESHOLD)
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> HeuristicDetector {
        HeuristicDetector::new(&HarmConfig::default()).unwrap()
    }

    #[test]
    fn test_english_direct_address() {
        let signal = detector().detect("you are so stupid").unwrap();
        assert_eq!(signal, HeuristicSignal::EnglishDirectAddress { insult: "stupid".into() });

        let signal = detector().detect("honestly ur such a clown lol").unwrap();
        assert_eq!(signal, HeuristicSignal::EnglishDirectAddress { insult: "clown".into() });
    }

    #[test]
    fn test_direct_address_requires_an_insult() {
        assert!(!detector().is_harmful("you are welcome"));
        assert!(!detector().is_harmful("you're right, thanks"));
    }

    #[test]
    fn test_arabic_direct_address() {
        assert!(matches!(
            detector().detect("انت غبي"),
            Some(HeuristicSignal::ArabicDirectAddress { .. })
        ));
        assert!(matches!(
            detector().detect("إنت والله تافه"),
            Some(HeuristicSignal::ArabicDirectAddress { .. })
        ));
        assert!(matches!(
            detector().detect("رد على احمد"),
            Some(HeuristicSignal::ArabicDirectAddress { .. })
        ));
        assert!(matches!(
            detector().detect("محمد خلص"),
            Some(HeuristicSignal::ArabicDirectAddress { .. })
        ));
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            detector().detect("this is garbage"),
            Some(HeuristicSignal::EnglishKeyword("garbage".into()))
        );
        assert_eq!(
            detector().detect("شو هالحكي يا كلب"),
            Some(HeuristicSignal::ArabicKeyword("كلب".into()))
        );
        assert!(detector().is_harmful("just SHUT UP"));
    }

    #[test]
    fn test_arabic_variants_are_normalized() {
        assert!(detector().is_harmful("يا أحمــــق"));
        assert!(detector().is_harmful("زبالة"));
    }

    #[test]
    fn test_fuzzy_catches_misspellings() {
        match detector().detect("that was stubid") {
            Some(HeuristicSignal::Fuzzy { keyword, similarity, .. }) => {
                assert_eq!(keyword, "stupid");
                assert!(similarity >= FUZZY_THRESHOLD);
            }
            other => panic!("expected fuzzy hit, got {other:?}"),
        }
    }

    #[test]
    fn test_benign_text_passes() {
        let detector = detector();
        for text in ["good morning everyone", "my father bought a badge", "صباح الخير", "", "   "] {
            assert!(!detector.is_harmful(text), "flagged: {text}");
        }
    }

    #[test]
    fn test_arabic_stage_can_be_disabled() {
        let config = HarmConfig { arabic_dialect: false, ..HarmConfig::default() };
        let detector = HeuristicDetector::new(&config).unwrap();
        assert!(!detector.is_harmful("انت غبي"));
        assert!(detector.is_harmful("you idiot"));
    }

    #[test]
    fn test_extra_keywords_are_used() {
        let mut config = HarmConfig::default();
        config.extra_keywords.en.push("bozo".into());
        let detector = HeuristicDetector::new(&config).unwrap();
        assert!(detector.is_harmful("what a bozo"));
    }
}
