// analysis/parser.rs — Lenient extraction of score and rationale from free-form model output

use super::lexicon::Language;
use super::prompt::missing_reason;
use super::types::{truncate_chars, ChunkScore, MAX_REASON_CHARS};
use regex::Regex;
use std::sync::OnceLock;

pub const DEFAULT_SCORE: f64 = 5.0;

fn overall_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(?i)overall\s*score\s*\**\s*(?:[:=]|-\s)?\s*\**\s*(-?\d+(?:[.,]\d+)?)",
            r"(?i)score\s*global\s*\**\s*(?:[:=]|-\s)?\s*\**\s*(-?\d+(?:[.,]\d+)?)",
            r"(?i)overall\s*[:=]\s*(-?\d+(?:[.,]\d+)?)",
            r"(?im)^\W*score\s*[:=]\s*(-?\d+(?:[.,]\d+)?)",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    })
}

fn sub_score_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:humou?r|[ée]motion|surprise|quotability|citabilit[ée])\s*\**\s*[:=]\s*\**\s*(\d+(?:[.,]\d+)?)",
        )
        .ok()
    })
    .as_ref()
}

fn number_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+(?:[.,]\d+)?").ok()).as_ref()
}

fn reason_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(?:reason|raison)\s*\**\s*[:=]\s*\**\s*(.*)").ok())
        .as_ref()
}

fn to_number(raw: &str) -> Option<f64> {
    raw.replace(',', ".").parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Overall score from a response, trying in order: an explicit overall label,
/// the mean of any sub-scores, the first number within 0..=10, then `DEFAULT_SCORE`.
/// The result is always within `[0, 10]`.
pub fn extract_score(response: &str) -> f64 {
    let labelled = overall_patterns().iter().find_map(|re| {
        re.captures(response)
            .and_then(|caps| caps.get(1))
            .and_then(|m| to_number(m.as_str()))
    });

    let score = labelled
        .or_else(|| {
            let subs: Vec<f64> = sub_score_regex()?
                .captures_iter(response)
                .filter_map(|caps| caps.get(1).and_then(|m| to_number(m.as_str())))
                .collect();
            if subs.is_empty() {
                None
            } else {
                Some(subs.iter().sum::<f64>() / subs.len() as f64)
            }
        })
        .or_else(|| {
            number_regex()?
                .find_iter(response)
                .filter_map(|m| to_number(m.as_str()))
                .find(|n| (0.0..=10.0).contains(n))
        })
        .unwrap_or(DEFAULT_SCORE);

    score.clamp(0.0, 10.0)
}

/// First line after the reason label, at most `MAX_REASON_CHARS` characters
pub fn extract_reason(response: &str) -> Option<String> {
    let caps = reason_regex()?.captures(response)?;
    let line = caps.get(1)?.as_str().lines().next()?.trim().trim_matches('*').trim();
    if line.is_empty() {
        return None;
    }
    Some(truncate_chars(line, MAX_REASON_CHARS, ""))
}

pub fn parse_response(response: &str, language: Language) -> ChunkScore {
    ChunkScore {
        score: extract_score(response),
        reason: extract_reason(response).unwrap_or_else(|| missing_reason(language).to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_response() {
        let response = "Humor: 6\nEmotion: 7\nSurprise: 5\nQuotability: 8\nOverall Score: 7.5\nReason: Strong punchline that people will quote.";
        let parsed = parse_response(response, Language::English);
        assert_eq!(parsed.score, 7.5);
        assert_eq!(parsed.reason, "Strong punchline that people will quote.");
    }

    #[test]
    fn markdown_and_french_labels() {
        let response = "**Score global :** 8,5\n**Raison :** Une chute inattendue.";
        let parsed = parse_response(response, Language::French);
        assert_eq!(parsed.score, 8.5);
        assert_eq!(parsed.reason, "Une chute inattendue.");
    }

    #[test]
    fn averages_sub_scores_without_overall() {
        let response = "Humor: 4\nÉmotion: 6\nSurprise: 8\nQuotability: 6";
        assert_eq!(extract_score(response), 6.0);
    }

    #[test]
    fn first_number_in_range() {
        assert_eq!(extract_score("I'd give this 42 points... no, a 7 out of 10"), 7.0);
    }

    #[test]
    fn no_numbers_gives_default() {
        let parsed = parse_response("This is great content!", Language::English);
        assert_eq!(parsed.score, DEFAULT_SCORE);
        assert_eq!(parsed.reason, "No specific reason provided");
    }

    #[test]
    fn negative_overall_clamps_to_zero() {
        assert_eq!(extract_score("Overall Score: -3\nReason: dull"), 0.0);
        assert_eq!(extract_score("Score global : -2,5"), 0.0);
        assert_eq!(extract_score("Overall Score - 7"), 7.0);
    }

    #[test]
    fn overall_is_clamped() {
        assert_eq!(extract_score("Overall Score: 15"), 10.0);
    }

    #[test]
    fn score_always_within_bounds() {
        let responses = [
            "",
            "Overall Score: 99999",
            "Overall Score: 0",
            "Humor: 11\nEmotion: 30",
            "-3",
            "score: 1e309",
            "Reason: nothing here",
            "9999999999999999999999",
            "🙂 Overall Score: 6.2 🙂",
        ];
        for response in responses {
            let score = extract_score(response);
            assert!((0.0..=10.0).contains(&score), "{:?} -> {}", response, score);
        }
    }

    #[test]
    fn reason_is_single_line_and_bounded() {
        let long = format!("Reason: {}\nsecond line", "x".repeat(400));
        let reason = extract_reason(&long).unwrap();
        assert_eq!(reason.chars().count(), MAX_REASON_CHARS);
        assert!(!reason.contains('\n'));
        assert!(extract_reason("Reason:   ").is_none());
    }
}
