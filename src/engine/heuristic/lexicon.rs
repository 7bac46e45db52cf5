//! Built-in insult lexicons and their compiled form.

use regex::Regex;

use super::arabic;
use crate::config::ExtraKeywords;

/// English insults and hostile phrases.
pub const ENGLISH_KEYWORDS: &[&str] = &[
    "idiot",
    "stupid",
    "moron",
    "dumb",
    "useless",
    "trash",
    "garbage",
    "loser",
    "disgusting",
    "worthless",
    "shut up",
    "kill yourself",
    "wtf",
    "fat",
    "ugly",
    "clown",
    "jerk",
    "bad",
    "worst",
    "pathetic",
];

/// Arabic insults, including common dialect imperatives.
pub const ARABIC_KEYWORDS: &[&str] = &[
    "اخرس", "اسكت", "كلب", "زباله", "زبالة", "قذر", "تفو", "تافه", "غبي", "حقير", "احمق", "أحمق",
    "كسول", "قبيح", "سيء", "سيئ", "اسوء", "أسوأ", "سخيف", "حيوان", "انقلع", "برا", "بره", "اختفي",
    "ولك",
];

/// Keyword sets ready for matching.
#[derive(Debug, Clone)]
pub struct Lexicon {
    english_pattern: Regex,
    english_words: Vec<String>,
    arabic: Vec<String>,
}

impl Lexicon {
    /// Compiles the built-in lexicons extended with `extra`.
    pub fn new(extra: &ExtraKeywords) -> Result<Self, regex::Error> {
        let mut english: Vec<String> = ENGLISH_KEYWORDS
            .iter()
            .map(|k| k.to_string())
            .chain(extra.en.iter().map(|k| k.trim().to_lowercase()))
            .filter(|k| !k.is_empty())
            .collect();
        english.sort();
        english.dedup();

        let alternatives = english
            .iter()
            .map(|k| {
                k.split_whitespace().map(regex::escape).collect::<Vec<_>>().join(r"\s+")
            })
            .collect::<Vec<_>>()
            .join("|");
        let english_pattern = Regex::new(&format!(r"(?i)(?:^|[^\w])(?:{alternatives})(?:$|[^\w])"))?;

        let english_words =
            english.iter().filter(|k| !k.contains(char::is_whitespace)).cloned().collect();

        let mut arabic: Vec<String> = ARABIC_KEYWORDS
            .iter()
            .copied()
            .chain(extra.ar.iter().map(String::as_str))
            .map(|k| arabic::normalize(k.trim()))
            .filter(|k| !k.is_empty())
            .collect();
        arabic.sort();
        arabic.dedup();

        Ok(Self { english_pattern, english_words, arabic })
    }

    /// The first English keyword or phrase found in `text` as a whole word.
    pub fn find_english<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.english_pattern.find(text).map(|m| {
            m.as_str().trim_matches(|c: char| !c.is_alphanumeric() && c != '\'' && c != '-')
        })
    }

    /// The first Arabic keyword contained in already-normalized text.
    pub fn find_arabic(&self, normalized: &str) -> Option<&str> {
        self.arabic.iter().find(|k| normalized.contains(k.as_str())).map(String::as_str)
    }

    /// Single-word English keywords, the candidates for fuzzy matching.
    pub fn english_words(&self) -> &[String] {
        &self.english_words
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexicon() -> Lexicon {
        Lexicon::new(&ExtraKeywords::default()).unwrap()
    }

    #[test]
    fn test_english_matches_whole_words_only() {
        let lexicon = lexicon();
        assert_eq!(lexicon.find_english("that was BAD."), Some("BAD"));
        assert_eq!(lexicon.find_english("my father has a badge"), None);
        assert_eq!(lexicon.find_english("please shut   up now"), Some("shut   up"));
    }

    #[test]
    fn test_arabic_lexicon_is_normalized() {
        let lexicon = lexicon();
        assert_eq!(lexicon.find_arabic(&arabic::normalize("يا أحمق")), Some("احمق"));
        assert_eq!(lexicon.find_arabic(&arabic::normalize("هذا أسوأ شيء")), Some("اسوا"));
        assert_eq!(lexicon.find_arabic("مرحبا"), None);
    }

    #[test]
    fn test_extra_keywords_extend_builtins() {
        let extra = ExtraKeywords { en: vec!["Noob".into(), "touch grass".into()], ar: vec!["نذل".into()] };
        let lexicon = Lexicon::new(&extra).unwrap();
        assert_eq!(lexicon.find_english("total noob"), Some("noob"));
        assert_eq!(lexicon.find_english("go touch grass"), Some("touch grass"));
        assert!(lexicon.find_english("you idiot").is_some());
        assert_eq!(lexicon.find_arabic("انت نذل"), Some("نذل"));
        assert!(lexicon.english_words().contains(&"noob".to_string()));
        assert!(!lexicon.english_words().iter().any(|w| w == "touch grass"));
    }

    #[test]
    fn test_extra_keywords_are_escaped() {
        let extra = ExtraKeywords { en: vec!["a+b".into()], ar: vec![] };
        let lexicon = Lexicon::new(&extra).unwrap();
        assert_eq!(lexicon.find_english("x a+b y"), Some("a+b"));
    }
}
