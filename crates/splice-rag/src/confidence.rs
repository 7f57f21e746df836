//! Confidence scoring for synthesized answers
//!
//! Pure heuristics over the final cited evidence: citation coverage (40%),
//! source diversity (40%), and a fixed baseline for having any evidence at
//! all (20%), with a small penalty when the synthesizer noted limitations.

use tracing::info;

use splice_core::{Citation, SynthesisResponse};

const EXPECTED_MIN_CITATIONS: usize = 4;
const EXPECTED_SUBTOPICS: f64 = 3.0;
const MAX_EXPECTED_SOURCES: usize = 5;
const NO_EVIDENCE_FLOOR: f64 = 0.1;

/// Count unique source files across citations
pub fn count_distinct_sources(citations: &[Citation]) -> usize {
    let mut files: Vec<&str> = citations
        .iter()
        .map(|c| c.file.as_str())
        .filter(|f| !f.is_empty())
        .collect();
    files.sort_unstable();
    files.dedup();
    files.len()
}

/// Coverage score in [0, 1]: rewards meeting the expected minimum citation
/// count (70%) and a balanced subtopic spread (30%)
pub fn coverage_score(n_citations: usize, n_subtopics: usize) -> f64 {
    if n_citations == 0 {
        return 0.0;
    }

    let citation_score = (n_citations as f64 / EXPECTED_MIN_CITATIONS as f64).min(1.0);
    let balance_score = (n_subtopics as f64 / EXPECTED_SUBTOPICS).min(1.0);

    citation_score * 0.7 + balance_score * 0.3
}

/// Diversity score in [0, 1]: logarithmic in the distinct source count, so
/// early additional sources matter more than later ones
pub fn diversity_score(n_distinct_sources: usize) -> f64 {
    if n_distinct_sources == 0 {
        return 0.0;
    }

    let scaled = ((n_distinct_sources + 1) as f64).ln() / ((MAX_EXPECTED_SOURCES + 1) as f64).ln();
    scaled.min(1.0)
}

/// Calculate the overall confidence score for a synthesized answer.
///
/// Empty citations return the fixed 0.1 floor regardless of other inputs.
/// The result is clamped to [0, 1] and multiplied by 0.9 when the response
/// carries a limitations note.
pub fn calculate_confidence(response: &SynthesisResponse, citations_flat: &[Citation]) -> f64 {
    let n_citations = citations_flat.len();
    let n_subtopics = response.subtopics.len();
    let n_sources = count_distinct_sources(citations_flat);

    if n_citations == 0 {
        return NO_EVIDENCE_FLOOR;
    }

    let coverage = coverage_score(n_citations, n_subtopics);
    let diversity = diversity_score(n_sources);

    let mut confidence = coverage * 0.4 + diversity * 0.4 + 0.2;

    if response.limitations.is_some() {
        confidence *= 0.9;
    }

    let confidence = confidence.clamp(0.0, 1.0);

    info!(
        confidence,
        citations = n_citations,
        sources = n_sources,
        subtopics = n_subtopics,
        "confidence computed"
    );

    confidence
}

/// Map a numeric confidence score to a three-level label
pub fn confidence_label(score: f64) -> &'static str {
    if score < 0.4 {
        "Low"
    } else if score < 0.7 {
        "Medium"
    } else {
        "High"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn citation(chunk_id: &str, file: &str) -> Citation {
        Citation {
            chunk_id: chunk_id.to_string(),
            file: file.to_string(),
            page: 1,
            excerpt: None,
        }
    }

    fn subtopic(title: &str) -> splice_core::Subtopic {
        splice_core::Subtopic {
            title: title.to_string(),
            bullets: vec!["a point".to_string()],
            citations: Vec::new(),
        }
    }

    fn response(n_subtopics: usize, limitations: Option<&str>) -> SynthesisResponse {
        SynthesisResponse {
            summary: "summary".to_string(),
            subtopics: (0..n_subtopics).map(|i| subtopic(&format!("t{}", i))).collect(),
            limitations: limitations.map(str::to_string),
        }
    }

    #[test]
    fn empty_citations_return_floor() {
        let score = calculate_confidence(&response(0, None), &[]);
        assert_eq!(score, 0.1);
        // Floor applies regardless of subtopics or limitations
        let score = calculate_confidence(&response(4, Some("gaps")), &[]);
        assert_eq!(score, 0.1);
    }

    #[test]
    fn confidence_is_always_bounded() {
        let citations: Vec<Citation> = (0..20)
            .map(|i| citation(&format!("c{}", i), &format!("file{}.txt", i)))
            .collect();
        for n_subtopics in 0..6 {
            for limitations in [None, Some("gaps")] {
                let score = calculate_confidence(&response(n_subtopics, limitations), &citations);
                assert!((0.0..=1.0).contains(&score));
            }
        }
    }

    #[test]
    fn mid_range_scenario_is_reproducible() {
        // 4 citations across 2 distinct files, 2 subtopics
        let citations = vec![
            citation("a_p1_c0", "a.txt"),
            citation("a_p1_c1", "a.txt"),
            citation("b_p1_c0", "b.txt"),
            citation("b_p2_c0", "b.txt"),
        ];
        let first = calculate_confidence(&response(2, None), &citations);
        let second = calculate_confidence(&response(2, None), &citations);

        assert_eq!(first, second);
        assert!(first > 0.4 && first < 0.9, "got {}", first);
    }

    #[test]
    fn limitations_apply_penalty() {
        let citations = vec![
            citation("a_p1_c0", "a.txt"),
            citation("b_p1_c0", "b.txt"),
        ];
        let plain = calculate_confidence(&response(2, None), &citations);
        let limited = calculate_confidence(&response(2, Some("incomplete")), &citations);
        assert!((limited - plain * 0.9).abs() < 1e-9);
    }

    #[test]
    fn distinct_sources_ignores_duplicates_and_empties() {
        let citations = vec![
            citation("c0", "a.txt"),
            citation("c1", "a.txt"),
            citation("c2", "b.txt"),
            citation("c3", ""),
        ];
        assert_eq!(count_distinct_sources(&citations), 2);
    }

    #[test]
    fn diversity_is_logarithmic_and_capped() {
        assert_eq!(diversity_score(0), 0.0);
        assert!(diversity_score(1) < diversity_score(2));
        // Marginal gain shrinks as sources accumulate
        let first_gain = diversity_score(2) - diversity_score(1);
        let later_gain = diversity_score(4) - diversity_score(3);
        assert!(first_gain > later_gain);
        assert_eq!(diversity_score(5), 1.0);
        assert_eq!(diversity_score(50), 1.0);
    }

    #[test]
    fn coverage_weights_citations_over_subtopics() {
        assert_eq!(coverage_score(0, 3), 0.0);
        assert!((coverage_score(4, 3) - 1.0).abs() < 1e-9);
        assert!((coverage_score(2, 0) - 0.35).abs() < 1e-9);
    }

    #[test]
    fn label_thresholds() {
        assert_eq!(confidence_label(0.0), "Low");
        assert_eq!(confidence_label(0.39), "Low");
        assert_eq!(confidence_label(0.4), "Medium");
        assert_eq!(confidence_label(0.69), "Medium");
        assert_eq!(confidence_label(0.7), "High");
        assert_eq!(confidence_label(1.0), "High");
    }
}
