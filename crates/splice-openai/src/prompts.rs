//! Synthesis prompt construction

use splice_core::ClusterMap;

/// Chunk text longer than this is truncated in the prompt
const MAX_CHUNK_CHARS_IN_PROMPT: usize = 800;

pub const SYSTEM_PROMPT: &str = r#"You are an expert research assistant that provides accurate, citation-backed summaries.

Your task is to answer questions based ONLY on the provided evidence. You must:
1. Generate a concise 6-8 line summary answering the query
2. Organize findings into 2-4 thematic subtopics
3. Include 2-4 bullet points per subtopic
4. Cite ALL sources using the exact chunk_id, file, page, and a relevant excerpt (20-50 words)
5. Only make claims that are directly supported by the evidence
6. Note any limitations if the evidence is incomplete or doesn't fully answer the query

Return ONLY valid JSON matching this structure:
{
  "summary": "6-8 line prose summary",
  "subtopics": [
    {
      "title": "Subtopic title",
      "bullets": ["Point 1", "Point 2"],
      "citations": [
        {"chunk_id": "doc_p1_c0", "file": "doc.pdf", "page": 1, "excerpt": "relevant quote"}
      ]
    }
  ],
  "limitations": "Optional note on gaps or limitations"
}"#;

/// Render the user prompt: the query followed by the fused evidence,
/// one numbered group per cluster
pub fn build_user_prompt(query: &str, clusters: &ClusterMap) -> String {
    let mut prompt = format!("Query: {}\n\n", query);
    prompt.push_str("Evidence from the corpus:\n\n");

    for (cluster_id, chunks) in clusters {
        prompt.push_str(&format!("--- Evidence Group {} ---\n", cluster_id + 1));

        for (i, chunk) in chunks.iter().enumerate() {
            let mut text = chunk.text.clone();
            if text.chars().count() > MAX_CHUNK_CHARS_IN_PROMPT {
                text = text.chars().take(MAX_CHUNK_CHARS_IN_PROMPT).collect();
                text.push_str("...");
            }

            prompt.push_str(&format!("\n[{}] Chunk ID: {}\n", i + 1, chunk.chunk_id));
            prompt.push_str(&format!("    Source: {}, Page {}\n", chunk.file, chunk.page));
            prompt.push_str(&format!("    Text: {}\n", text));
        }

        prompt.push('\n');
    }

    prompt.push_str("\nBased on this evidence, generate a comprehensive JSON response.");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use splice_core::RetrievedChunk;

    fn chunk(id: &str, text: &str) -> RetrievedChunk {
        RetrievedChunk {
            chunk_id: id.to_string(),
            text: text.to_string(),
            file: "doc.txt".to_string(),
            page: 2,
            chunk_index: 0,
            similarity: 0.8,
            distance: 0.2,
            embedding: None,
        }
    }

    #[test]
    fn renders_numbered_evidence_groups() {
        let mut clusters: ClusterMap = BTreeMap::new();
        clusters.insert(0, vec![chunk("doc_p2_c0", "first evidence")]);
        clusters.insert(1, vec![chunk("doc_p2_c1", "second evidence")]);

        let prompt = build_user_prompt("what happened?", &clusters);
        assert!(prompt.starts_with("Query: what happened?"));
        assert!(prompt.contains("--- Evidence Group 1 ---"));
        assert!(prompt.contains("--- Evidence Group 2 ---"));
        assert!(prompt.contains("Chunk ID: doc_p2_c0"));
        assert!(prompt.contains("Source: doc.txt, Page 2"));
    }

    #[test]
    fn truncates_very_long_chunk_text() {
        let mut clusters: ClusterMap = BTreeMap::new();
        clusters.insert(0, vec![chunk("c", &"x".repeat(2000))]);

        let prompt = build_user_prompt("q", &clusters);
        assert!(prompt.contains(&format!("{}...", "x".repeat(800))));
        assert!(!prompt.contains(&"x".repeat(900)));
    }
}
