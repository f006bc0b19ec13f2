// analysis/lexicon.rs — Language-specific word lists for boundary detection and caption grouping

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    French,
}

impl Language {
    /// Map a recognizer language code ("fr", "fr-FR", "french") to a supported language.
    /// Unknown codes use English.
    pub fn from_code(code: &str) -> Self {
        let lower = code.trim().to_lowercase();
        if lower.starts_with("fr") {
            Language::French
        } else {
            Language::English
        }
    }
}

const EN_QUESTION: &[&str] = &["who", "what", "when", "where", "why", "how", "which"];
const FR_QUESTION: &[&str] = &[
    "qui", "que", "quoi", "quand", "où", "pourquoi", "comment", "quel", "quelle", "quels",
    "quelles", "est-ce",
];

const EN_TRANSITION: &[&str] = &[
    "however", "but", "so", "therefore", "meanwhile", "anyway", "now", "actually", "basically",
    "honestly", "look", "listen", "okay", "well",
];
const FR_TRANSITION: &[&str] = &[
    "cependant", "mais", "donc", "alors", "pourtant", "ensuite", "bref", "enfin", "bon", "écoutez",
    "voilà", "franchement",
];

const EN_CONJUNCTION: &[&str] = &["and", "or", "but", "if", "when", "because", "so"];
const FR_CONJUNCTION: &[&str] = &["et", "ou", "mais", "si", "quand", "parce", "car", "donc"];

const EN_SHORT: &[&str] = &[
    "a", "an", "the", "i", "you", "he", "she", "it", "we", "they", "to", "of", "in", "on", "at",
    "is", "am", "are", "my", "your", "i'm", "it's", "don't", "can't", "that's", "you're", "we're",
];
const FR_SHORT: &[&str] = &[
    "le", "la", "les", "l'", "un", "une", "des", "de", "du", "d'", "je", "j'", "tu", "il", "elle",
    "on", "nous", "vous", "ils", "elles", "ce", "c'", "c'est", "ça", "qu'", "n'", "ne", "me", "m'",
    "te", "t'", "se", "s'", "à", "au", "en", "y",
];

/// Word lists for one language
#[derive(Debug, Clone, Copy)]
pub struct Lexicon {
    pub language: Language,
    question: &'static [&'static str],
    transition: &'static [&'static str],
    conjunction: &'static [&'static str],
    short: &'static [&'static str],
}

impl Lexicon {
    pub fn for_language(language: Language) -> Self {
        match language {
            Language::English => Self {
                language,
                question: EN_QUESTION,
                transition: EN_TRANSITION,
                conjunction: EN_CONJUNCTION,
                short: EN_SHORT,
            },
            Language::French => Self {
                language,
                question: FR_QUESTION,
                transition: FR_TRANSITION,
                conjunction: FR_CONJUNCTION,
                short: FR_SHORT,
            },
        }
    }

    pub fn for_code(code: &str) -> Self {
        Self::for_language(Language::from_code(code))
    }

    pub fn is_question_word(&self, word: &str) -> bool {
        contains(self.question, word)
    }

    pub fn is_transition_word(&self, word: &str) -> bool {
        contains(self.transition, word)
    }

    pub fn is_conjunction(&self, word: &str) -> bool {
        contains(self.conjunction, word)
    }

    pub fn is_short_word(&self, word: &str) -> bool {
        contains(self.short, word)
    }
}

fn contains(list: &[&str], word: &str) -> bool {
    let normalized = normalize_word(word);
    !normalized.is_empty() && list.contains(&normalized.as_str())
}

/// Lowercase and strip surrounding punctuation, keeping inner apostrophes and hyphens
/// ("It's," -> "it's", "«Pourquoi" -> "pourquoi"). Curly apostrophes become straight ones.
pub fn normalize_word(word: &str) -> String {
    word.trim()
        .replace('\u{2019}', "'")
        .trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
        .trim_start_matches('\'')
        .to_lowercase()
}

/// First whitespace-separated token of `text`
pub fn first_word(text: &str) -> Option<&str> {
    text.split_whitespace().next()
}

/// Last whitespace-separated token of `text`
pub fn last_word(text: &str) -> Option<&str> {
    text.split_whitespace().last()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_codes() {
        assert_eq!(Language::from_code("fr"), Language::French);
        assert_eq!(Language::from_code("FR-ca"), Language::French);
        assert_eq!(Language::from_code("en"), Language::English);
        assert_eq!(Language::from_code("unknown"), Language::English);
    }

    #[test]
    fn normalization_keeps_contractions() {
        assert_eq!(normalize_word("It's,"), "it's");
        assert_eq!(normalize_word("«Pourquoi"), "pourquoi");
        assert_eq!(normalize_word("l\u{2019}"), "l'");
        assert_eq!(normalize_word("..."), "");
    }

    #[test]
    fn lookups_are_case_and_punctuation_insensitive() {
        let en = Lexicon::for_code("en");
        assert!(en.is_question_word("Why"));
        assert!(en.is_transition_word("However,"));
        assert!(en.is_conjunction("but"));
        assert!(en.is_short_word("The"));
        assert!(!en.is_short_word("elephant"));

        let fr = Lexicon::for_code("fr");
        assert!(fr.is_question_word("Comment"));
        assert!(fr.is_transition_word("Donc,"));
        assert!(fr.is_conjunction("mais"));
        assert!(fr.is_short_word("c'est"));
    }
}
