// analysis/selector.rs — Ranking scored chunks into candidate moments

use super::lexicon::Language;
use super::prompt::fallback_reason;
use super::types::{Chunk, ChunkScore, ScoredMoment};
use crate::config::AnalysisConfig;

/// Lowest score kept: one point under the viral threshold, never below 3.0
pub fn score_floor(threshold: f64) -> f64 {
    (threshold - 1.0).max(3.0)
}

/// Rank chunks by score, descending. Chunks under `score_floor` are dropped;
/// when none remain, the first `fallback_count` chunks in time order are
/// returned with `fallback_score` and a fixed rationale.
pub fn select_moments(
    chunks: &[Chunk],
    scores: &[ChunkScore],
    config: &AnalysisConfig,
    language: Language,
) -> Vec<ScoredMoment> {
    let floor = score_floor(config.viral_threshold);

    let mut moments: Vec<ScoredMoment> = chunks
        .iter()
        .zip(scores)
        .filter(|(_, s)| s.score >= floor)
        .map(|(chunk, s)| ScoredMoment::from_chunk(chunk, s.score, s.reason.clone()))
        .collect();

    if moments.is_empty() {
        if !chunks.is_empty() {
            tracing::info!(
                "Selector: no chunk reached {:.1}, falling back to the first {}",
                floor,
                config.fallback_count
            );
        }
        return chunks
            .iter()
            .take(config.fallback_count)
            .map(|chunk| {
                ScoredMoment::from_chunk(chunk, config.fallback_score, fallback_reason(language))
            })
            .collect();
    }

    // stable: equal scores keep time order
    moments.sort_by(|a, b| b.score.total_cmp(&a.score));
    tracing::info!("Selector: {} of {} chunks kept (floor {:.1})", moments.len(), chunks.len(), floor);
    moments
}

/// Keep the `max_clips` best moments
pub fn take_top(mut moments: Vec<ScoredMoment>, max_clips: usize) -> Vec<ScoredMoment> {
    moments.truncate(max_clips);
    moments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks(n: usize) -> Vec<Chunk> {
        (0..n)
            .map(|i| Chunk {
                start: i as f64 * 45.0,
                end: i as f64 * 45.0 + 44.0,
                text: format!("chunk {}", i),
                source_segments: vec![i],
            })
            .collect()
    }

    fn scores(values: &[f64]) -> Vec<ChunkScore> {
        values
            .iter()
            .map(|&score| ChunkScore {
                score,
                reason: format!("r{}", score),
            })
            .collect()
    }

    #[test]
    fn floor_is_lenient_but_bounded() {
        assert_eq!(score_floor(6.0), 5.0);
        assert_eq!(score_floor(3.5), 3.0);
        assert_eq!(score_floor(0.0), 3.0);
    }

    #[test]
    fn keeps_lenience_band_sorted_descending() {
        let config = AnalysisConfig::default();
        let selected = select_moments(&chunks(5), &scores(&[4.9, 5.0, 9.0, 2.0, 7.0]), &config, Language::English);

        let ranked: Vec<f64> = selected.iter().map(|m| m.score).collect();
        assert_eq!(ranked, vec![9.0, 7.0, 5.0]);
        assert_eq!(selected[0].start, 90.0);
        assert_eq!(selected[0].reason, "r9");
    }

    #[test]
    fn ties_keep_time_order() {
        let config = AnalysisConfig::default();
        let selected = select_moments(&chunks(3), &scores(&[7.0, 8.0, 7.0]), &config, Language::English);
        let starts: Vec<f64> = selected.iter().map(|m| m.start).collect();
        assert_eq!(starts, vec![45.0, 0.0, 90.0]);
    }

    #[test]
    fn low_scores_fall_back_to_first_chunks() {
        let config = AnalysisConfig::default();
        let selected = select_moments(&chunks(6), &scores(&[2.0; 6]), &config, Language::English);

        assert_eq!(selected.len(), 3);
        for (i, moment) in selected.iter().enumerate() {
            assert_eq!(moment.start, i as f64 * 45.0);
            assert_eq!(moment.score, 5.0);
            assert_eq!(moment.reason, "Selected as top content");
        }

        let french = select_moments(&chunks(2), &scores(&[1.0, 1.0]), &config, Language::French);
        assert_eq!(french.len(), 2);
        assert_eq!(french[0].reason, "Sélectionné comme meilleur contenu");
    }

    #[test]
    fn fallback_count_is_configurable() {
        let config = AnalysisConfig {
            fallback_count: 1,
            ..AnalysisConfig::default()
        };
        assert_eq!(select_moments(&chunks(4), &scores(&[0.0; 4]), &config, Language::English).len(), 1);
    }

    #[test]
    fn empty_input_stays_empty() {
        assert!(select_moments(&[], &[], &AnalysisConfig::default(), Language::English).is_empty());
    }

    #[test]
    fn take_top_truncates() {
        let config = AnalysisConfig::default();
        let selected = select_moments(&chunks(8), &scores(&[9.0; 8]), &config, Language::English);
        assert_eq!(take_top(selected, 5).len(), 5);
    }
}
