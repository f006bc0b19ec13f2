// analysis/refiner.rs — Sentence-aware boundary refinement of scored moments

use super::lexicon::{first_word, last_word, Lexicon};
use super::types::{RefinedMoment, ScoredMoment};
use crate::config::RefinementConfig;
use crate::transcript::{Segment, Transcript};

/// Terminal punctuation may be followed by closing quotes or brackets
fn ends_with_terminal(text: &str) -> bool {
    text.trim_end()
        .trim_end_matches(['"', '\'', ')', ']', '»', '”', '’'])
        .ends_with(['.', '!', '?', '…'])
}

fn starts_uppercase(text: &str) -> bool {
    text.trim_start()
        .chars()
        .find(|c| c.is_alphanumeric())
        .is_some_and(char::is_uppercase)
}

/// Moves moment boundaries onto sentence starts/ends near the scored window and
/// enforces clip-length bounds. Pure: same input, same output.
pub struct BoundaryRefiner {
    config: RefinementConfig,
    lexicon: Lexicon,
}

impl BoundaryRefiner {
    pub fn new(config: RefinementConfig, lexicon: Lexicon) -> Self {
        Self { config, lexicon }
    }

    pub fn refine(&self, moments: &[ScoredMoment], transcript: &Transcript) -> Vec<RefinedMoment> {
        moments
            .iter()
            .map(|moment| self.refine_one(moment, transcript))
            .collect()
    }

    pub fn refine_one(&self, moment: &ScoredMoment, transcript: &Transcript) -> RefinedMoment {
        let segments = &transcript.segments;
        if segments.is_empty() {
            return RefinedMoment::new(moment, moment.start, moment.end, String::new());
        }

        let margin = self.config.search_margin;
        let (mut start, mut end) = (moment.start, moment.end);

        match transcript.segment_window(moment.start - margin, moment.end + margin) {
            Some((first, last)) => {
                start = self.find_start(segments, first, last, moment.start, moment.end);
                end = self.find_end(segments, first, last, start, moment.end);
            }
            None => tracing::debug!(
                "Refiner: no segments near {:.1}s-{:.1}s, keeping range",
                moment.start,
                moment.end
            ),
        }

        let (start, end) = self.enforce_length(start.max(0.0), end.min(transcript.duration), transcript.duration);

        let context = transcript
            .segments_in_range(start, end)
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        if start != moment.start || end != moment.end {
            tracing::debug!(
                "Refiner: {:.2}-{:.2}s -> {:.2}-{:.2}s",
                moment.start,
                moment.end,
                start,
                end
            );
        }

        RefinedMoment::new(moment, start, end, context)
    }

    /// A segment opens a sentence when it starts uppercase after terminal
    /// punctuation, or opens with a question or transition word. The first
    /// segment of the transcript always does.
    pub fn is_sentence_start(&self, segments: &[Segment], idx: usize) -> bool {
        let Some(segment) = segments.get(idx) else {
            return false;
        };
        if idx == 0 {
            return true;
        }

        let text = segment.text.as_str();
        if starts_uppercase(text) && ends_with_terminal(&segments[idx - 1].text) {
            return true;
        }

        first_word(text).is_some_and(|w| {
            self.lexicon.is_question_word(w) || self.lexicon.is_transition_word(w)
        })
    }

    /// A segment closes a sentence when it ends in terminal punctuation, or the
    /// next segment starts uppercase after a pause. Never when it ends on a
    /// conjunction. The last segment of the transcript closes unless vetoed.
    pub fn is_sentence_end(&self, segments: &[Segment], idx: usize) -> bool {
        let Some(segment) = segments.get(idx) else {
            return false;
        };
        let text = segment.text.as_str();

        if last_word(text).is_some_and(|w| self.lexicon.is_conjunction(w)) {
            return false;
        }
        if ends_with_terminal(text) {
            return true;
        }

        match segments.get(idx + 1) {
            Some(next) => {
                starts_uppercase(&next.text) && next.start - segment.end > self.config.sentence_pause
            }
            None => true,
        }
    }

    /// Scan backward from the segment holding `start` (located within the
    /// search window `first..=last`), giving up once a candidate lies more than
    /// `max_boundary_shift` earlier.
    fn find_start(&self, segments: &[Segment], first: usize, last: usize, start: f64, end: f64) -> f64 {
        let anchor = (first..=last)
            .rev()
            .find(|&i| segments[i].start <= start)
            .unwrap_or(first);

        let mut cursor = anchor;
        loop {
            let candidate = segments[cursor].start;
            if start - candidate > self.config.max_boundary_shift {
                return start;
            }
            if candidate < end && self.is_sentence_start(segments, cursor) {
                return candidate;
            }
            if cursor == 0 {
                return start;
            }
            cursor -= 1;
        }
    }

    /// Scan forward from the segment holding `end` (located within the search
    /// window `first..=last`), giving up once a candidate lies more than
    /// `max_boundary_shift` later.
    fn find_end(&self, segments: &[Segment], first: usize, last: usize, start: f64, end: f64) -> f64 {
        let anchor = (first..=last)
            .rev()
            .find(|&i| segments[i].start < end)
            .unwrap_or(first);

        let mut cursor = anchor;
        loop {
            let candidate = segments[cursor].end;
            if candidate - end > self.config.max_boundary_shift {
                return end;
            }
            if candidate > start && self.is_sentence_end(segments, cursor) {
                return candidate;
            }
            if cursor + 1 == segments.len() {
                return end;
            }
            cursor += 1;
        }
    }

    /// Pad or trim symmetrically to the clip-length bounds, shifting the
    /// window back inside `[0, total]` when padding runs off either edge.
    fn enforce_length(&self, start: f64, end: f64, total: f64) -> (f64, f64) {
        let min = self.config.min_clip_length;
        let max = self.config.max_clip_length;

        if total <= min {
            return (0.0, total);
        }

        let (start, end) = if end > start { (start, end) } else { (start.min(total), start.min(total)) };
        let duration = end - start;

        if duration < min {
            let padded_start = (start - (min - duration) / 2.0).clamp(0.0, total - min);
            (padded_start, padded_start + min)
        } else if duration > max {
            let trimmed_start = start + (duration - max) / 2.0;
            (trimmed_start, trimmed_start + max)
        } else {
            (start, end)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::lexicon::Language;

    const EPS: f64 = 1e-9;

    fn transcript(spans: &[(f64, f64, &str)]) -> Transcript {
        let segments = spans
            .iter()
            .map(|&(start, end, text)| Segment::new(start, end, text))
            .collect();
        Transcript::new("en", segments).unwrap()
    }

    fn moment(start: f64, end: f64) -> ScoredMoment {
        ScoredMoment {
            start,
            end,
            duration: end - start,
            score: 8.0,
            reason: "good".to_string(),
            preview_text: String::new(),
        }
    }

    fn refiner() -> BoundaryRefiner {
        BoundaryRefiner::new(RefinementConfig::default(), Lexicon::for_language(Language::English))
    }

    fn assert_invariants(refined: &RefinedMoment, total: f64) {
        let config = RefinementConfig::default();
        assert!(refined.start >= 0.0, "{:?}", refined);
        assert!(refined.start < refined.end, "{:?}", refined);
        assert!(refined.end <= total + EPS, "{:?}", refined);
        assert!(refined.duration >= config.min_clip_length - EPS, "{:?}", refined);
        assert!(refined.duration <= config.max_clip_length + EPS, "{:?}", refined);
    }

    /// Ten 6-second sentences, each properly punctuated
    fn punctuated() -> Transcript {
        let spans: Vec<(f64, f64, String)> = (0..10)
            .map(|i| {
                let start = i as f64 * 6.0;
                (start, start + 5.5, format!("Sentence number {} ends here.", i))
            })
            .collect();
        let borrowed: Vec<(f64, f64, &str)> = spans.iter().map(|(s, e, t)| (*s, *e, t.as_str())).collect();
        transcript(&borrowed)
    }

    #[test]
    fn aligned_moment_is_unchanged() {
        let t = punctuated();
        let refined = refiner().refine_one(&moment(12.0, 35.5), &t);
        assert_eq!((refined.start, refined.end), (12.0, 35.5));
        assert_eq!((refined.original_start, refined.original_end), (12.0, 35.5));
        assert!(refined.context.starts_with("Sentence number 2"));
        assert!(refined.context.ends_with("number 5 ends here."));
    }

    #[test]
    fn snaps_to_enclosing_sentences() {
        let t = punctuated();
        let refined = refiner().refine_one(&moment(14.0, 33.0), &t);
        assert_eq!((refined.start, refined.end), (12.0, 35.5));
        assert_eq!((refined.original_start, refined.original_end), (14.0, 33.0));
    }

    #[test]
    fn question_and_transition_words_open_sentences() {
        let t = transcript(&[
            (0.0, 5.0, "we were talking about"),
            (5.0, 10.0, "the budget and"),
            (10.0, 15.0, "so the plan changed"),
            (15.0, 30.0, "completely after that."),
        ]);
        let refined = refiner().refine_one(&moment(12.0, 30.0), &t);
        assert_eq!(refined.start, 10.0);

        let t = transcript(&[
            (0.0, 5.0, "blah blah"),
            (5.0, 10.0, "why did nobody notice"),
            (10.0, 30.0, "it went on for years."),
        ]);
        let refined = refiner().refine_one(&moment(8.0, 30.0), &t);
        assert_eq!(refined.start, 5.0);
    }

    #[test]
    fn never_ends_on_a_conjunction() {
        let t = transcript(&[
            (0.0, 10.0, "This is the setup."),
            (10.0, 20.0, "we tried everything but"),
            (23.0, 26.0, "It still failed."),
            (26.0, 60.0, "later on we moved."),
        ]);
        let refined = refiner().refine_one(&moment(0.0, 18.0), &t);
        assert_ne!(refined.end, 20.0);
        assert_eq!(refined.end, 26.0);
    }

    #[test]
    fn pause_before_capital_ends_sentence() {
        let t = transcript(&[
            (0.0, 10.0, "Okay here we go"),
            (10.0, 20.0, "with no punctuation at all"),
            (21.0, 40.0, "Then a new thought"),
        ]);
        let refined = refiner().refine_one(&moment(0.0, 17.0), &t);
        assert_eq!(refined.end, 20.0);
    }

    #[test]
    fn backward_search_stops_at_horizon() {
        let t = transcript(&[
            (0.0, 14.0, "Here is a complete opening sentence that runs long"),
            (14.0, 15.0, "with more"),
            (15.0, 30.0, "and more and more words"),
            (30.0, 45.0, "until the end."),
        ]);
        let refined = refiner().refine_one(&moment(15.0, 45.0), &t);
        assert_eq!(refined.start, 15.0);
        assert_invariants(&refined, t.duration);
    }

    #[test]
    fn forward_search_stops_at_horizon() {
        let t = transcript(&[
            (0.0, 20.0, "It begins here"),
            (20.0, 40.0, "and keeps going without a stop."),
            (40.0, 41.0, "Short."),
        ]);
        let refined = refiner().refine_one(&moment(0.0, 25.0), &t);
        assert_eq!(refined.end, 25.0);
    }

    #[test]
    fn short_moment_is_padded_symmetrically() {
        let t = punctuated();
        let refined = refiner().refine_one(&moment(24.0, 29.5), &t);
        assert!((refined.duration - 15.0).abs() < EPS);
        assert!((refined.start - 19.25).abs() < EPS);
        assert_invariants(&refined, t.duration);
    }

    #[test]
    fn padding_shifts_inside_transcript() {
        let t = punctuated();
        let refined = refiner().refine_one(&moment(0.0, 5.5), &t);
        assert_eq!(refined.start, 0.0);
        assert!((refined.end - 15.0).abs() < EPS);

        let refined = refiner().refine_one(&moment(54.0, 59.5), &t);
        assert!((refined.end - 59.5).abs() < EPS);
        assert!((refined.start - 44.5).abs() < EPS);
    }

    #[test]
    fn long_moment_is_trimmed_symmetrically() {
        let t = transcript(&[(0.0, 100.0, "One enormous sentence.")]);
        let refined = refiner().refine_one(&moment(0.0, 100.0), &t);
        assert_eq!((refined.start, refined.end), (20.0, 80.0));
        assert_eq!(refined.context, "One enormous sentence.");
    }

    #[test]
    fn single_segment_transcript() {
        let t = transcript(&[(0.0, 30.0, "only one")]);
        let refined = refiner().refine_one(&moment(5.0, 25.0), &t);
        assert_eq!((refined.start, refined.end), (0.0, 30.0));
    }

    #[test]
    fn moment_far_from_speech_keeps_range() {
        let t = transcript(&[(0.0, 2.0, "Hi."), (100.0, 102.0, "Bye.")]);
        let refined = refiner().refine_one(&moment(40.0, 60.0), &t);
        assert_eq!((refined.start, refined.end), (40.0, 60.0));
    }

    #[test]
    fn out_of_range_moment_is_clamped() {
        let t = punctuated();
        let refined = refiner().refine_one(&moment(-3.0, 80.0), &t);
        assert_invariants(&refined, t.duration);
    }

    #[test]
    fn invariants_hold_across_many_windows() {
        let spans: Vec<(f64, f64, String)> = (0..60)
            .map(|i| {
                let start = i as f64 * 3.1;
                let text = match i % 5 {
                    0 => "So what happened next".to_string(),
                    1 => "was honestly wild and".to_string(),
                    2 => "Nobody expected it!".to_string(),
                    3 => "then again".to_string(),
                    _ => "Why would they?".to_string(),
                };
                (start, start + 2.4 + (i % 3) as f64 * 0.3, text)
            })
            .collect();
        let borrowed: Vec<(f64, f64, &str)> = spans.iter().map(|(s, e, t)| (*s, *e, t.as_str())).collect();
        let t = transcript(&borrowed);
        let r = refiner();

        let mut start = 0.0;
        while start < t.duration {
            for length in [3.0, 16.0, 45.0, 75.0] {
                let refined = r.refine_one(&moment(start, (start + length).min(t.duration)), &t);
                assert_invariants(&refined, t.duration);
            }
            start += 7.3;
        }
    }

    #[test]
    fn french_lexicon_vetoes_conjunction() {
        let fr = BoundaryRefiner::new(RefinementConfig::default(), Lexicon::for_language(Language::French));
        let t = transcript(&[(0.0, 10.0, "On hésitait mais"), (12.0, 20.0, "Voilà.")]);
        assert!(!fr.is_sentence_end(&t.segments, 0));
        assert!(fr.is_sentence_end(&t.segments, 1));
        assert!(fr.is_sentence_start(&t.segments, 1));
    }
}
