//! Citation flattening

use std::collections::HashSet;

use splice_core::{Citation, SynthesisResponse};

/// Flatten all subtopic citations into a single list, deduplicated by
/// chunk id in first-seen order. Excerpts are dropped; the flat list is
/// used for source counting and confidence, not display.
pub fn flatten_citations(response: &SynthesisResponse) -> Vec<Citation> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut citations_flat = Vec::new();

    for subtopic in &response.subtopics {
        for citation in &subtopic.citations {
            if !citation.chunk_id.is_empty() && seen.insert(citation.chunk_id.as_str()) {
                citations_flat.push(Citation {
                    chunk_id: citation.chunk_id.clone(),
                    file: citation.file.clone(),
                    page: citation.page,
                    excerpt: None,
                });
            }
        }
    }

    citations_flat
}

#[cfg(test)]
mod tests {
    use super::*;
    use splice_core::Subtopic;

    fn citation(chunk_id: &str) -> Citation {
        Citation {
            chunk_id: chunk_id.to_string(),
            file: "doc.txt".to_string(),
            page: 1,
            excerpt: Some("an excerpt".to_string()),
        }
    }

    #[test]
    fn dedupes_by_chunk_id_in_first_seen_order() {
        let response = SynthesisResponse {
            summary: String::new(),
            subtopics: vec![
                Subtopic {
                    title: "one".to_string(),
                    bullets: Vec::new(),
                    citations: vec![citation("a"), citation("b")],
                },
                Subtopic {
                    title: "two".to_string(),
                    bullets: Vec::new(),
                    citations: vec![citation("b"), citation("c"), citation("a")],
                },
            ],
            limitations: None,
        };

        let flat = flatten_citations(&response);
        let ids: Vec<&str> = flat.iter().map(|c| c.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(flat.iter().all(|c| c.excerpt.is_none()));
    }

    #[test]
    fn empty_response_yields_no_citations() {
        let response = SynthesisResponse {
            summary: "nothing".to_string(),
            subtopics: Vec::new(),
            limitations: None,
        };
        assert!(flatten_citations(&response).is_empty());
    }
}
