// captions/grouper.rs — Grouping timed words into short caption bursts

use super::WordGroup;
use crate::analysis::lexicon::{Language, Lexicon};
use crate::config::CaptionConfig;
use crate::transcript::Word;

pub struct WordGrouper {
    max_words: usize,
    short_word_gap: f64,
    join_gap: f64,
    max_chars: usize,
    lexicon: Lexicon,
}

impl WordGrouper {
    /// `max_words` of 0 is treated as 1
    pub fn new(max_words: usize, language: Language) -> Self {
        Self::from_config(&CaptionConfig::default(), max_words, language)
    }

    pub fn from_config(config: &CaptionConfig, max_words: usize, language: Language) -> Self {
        Self {
            max_words: max_words.max(1),
            short_word_gap: config.short_word_gap,
            join_gap: config.join_gap,
            max_chars: config.max_chars,
            lexicon: Lexicon::for_language(language),
        }
    }

    /// Greedy single pass. The next word joins the current group when either
    /// the current word is a short function word followed closely, or the words
    /// run together and the joined text stays under the character budget.
    /// Groups never exceed `max_words`.
    pub fn group(&self, words: &[Word]) -> Vec<WordGroup> {
        let mut groups = Vec::new();
        let Some((first, rest)) = words.split_first() else {
            return groups;
        };

        let mut current: Vec<&Word> = vec![first];
        let mut current_chars = first.text.chars().count();

        for next in rest {
            // current is never empty inside the loop
            let word = current[current.len() - 1];
            let gap = next.start - word.end;
            let room = current.len() < self.max_words;
            let joined_chars = current_chars + 1 + next.text.chars().count();

            let attach_short = self.lexicon.is_short_word(&word.text) && gap < self.short_word_gap && room;
            let run_together = room && gap < self.join_gap && joined_chars < self.max_chars;

            if attach_short || run_together {
                current.push(next);
                current_chars = joined_chars;
            } else {
                groups.push(close(&current));
                current = vec![next];
                current_chars = next.text.chars().count();
            }
        }
        groups.push(close(&current));

        groups
    }
}

fn close(words: &[&Word]) -> WordGroup {
    let text = words
        .iter()
        .map(|w| w.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    WordGroup {
        text,
        start: words.first().map(|w| w.start).unwrap_or_default(),
        end: words.last().map(|w| w.end).unwrap_or_default(),
        word_count: words.len(),
    }
}

/// Group with the default timing and character budgets
pub fn group_words(words: &[Word], max_words: usize, language: Language) -> Vec<WordGroup> {
    WordGrouper::new(max_words, language).group(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(timed: &[(&str, f64, f64)]) -> Vec<Word> {
        timed.iter()
            .map(|&(text, start, end)| Word::new(text, start, end))
            .collect()
    }

    #[test]
    fn empty_input() {
        assert!(group_words(&[], 3, Language::English).is_empty());
    }

    #[test]
    fn short_words_attach_forward() {
        let ws = words(&[
            ("the", 0.0, 0.1),
            ("elephant", 0.35, 0.9),
            ("walked", 1.5, 1.9),
        ]);
        let groups = group_words(&ws, 2, Language::English);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].text, "the elephant");
        assert_eq!((groups[0].start, groups[0].end), (0.0, 0.9));
        assert_eq!(groups[1].text, "walked");
    }

    #[test]
    fn fast_speech_joins_within_budget() {
        let ws = words(&[
            ("quick", 0.0, 0.2),
            ("brown", 0.25, 0.4),
            ("foxes", 0.45, 0.6),
            ("jumped", 0.65, 0.9),
        ]);
        let groups = group_words(&ws, 3, Language::English);
        let texts: Vec<&str> = groups.iter().map(|g| g.text.as_str()).collect();
        assert_eq!(texts, vec!["quick brown foxes", "jumped"]);
    }

    #[test]
    fn character_budget_splits_long_words() {
        let ws = words(&[
            ("extraordinarily", 0.0, 0.5),
            ("uncharacteristic", 0.55, 1.0),
        ]);
        let groups = group_words(&ws, 4, Language::English);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn slow_speech_stays_single() {
        let ws = words(&[("Hello", 0.0, 0.4), ("world", 1.0, 1.4)]);
        assert_eq!(group_words(&ws, 3, Language::English).len(), 2);
    }

    #[test]
    fn zero_max_words_means_one() {
        let ws = words(&[("a", 0.0, 0.1), ("b", 0.1, 0.2)]);
        let groups = group_words(&ws, 0, Language::English);
        assert!(groups.iter().all(|g| g.word_count == 1));
    }

    #[test]
    fn french_function_words() {
        let ws = words(&[("c'est", 0.0, 0.2), ("incroyable", 0.45, 1.0)]);
        let groups = group_words(&ws, 2, Language::French);
        assert_eq!(groups[0].text, "c'est incroyable");
    }

    #[test]
    fn coverage_and_limits() {
        let vocabulary = ["I", "think", "the", "answer", "is", "obviously", "no", "a", "wow"];
        let ws: Vec<Word> = (0..200)
            .map(|i| {
                let start = i as f64 * 0.27 + (i % 7) as f64 * 0.01;
                Word::new(vocabulary[i % vocabulary.len()], start, start + 0.2)
            })
            .collect();

        for max_words in 1..=5 {
            let groups = group_words(&ws, max_words, Language::English);
            assert!(groups.iter().all(|g| g.word_count <= max_words && g.word_count > 0));

            let rebuilt: Vec<&str> = groups.iter().flat_map(|g| g.text.split(' ')).collect();
            let original: Vec<&str> = ws.iter().map(|w| w.text.as_str()).collect();
            assert_eq!(rebuilt, original);

            for pair in groups.windows(2) {
                assert!(pair[0].end <= pair[1].start);
            }
        }
    }
}
