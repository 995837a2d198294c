// src/rank/prompt.rs
//! Prompt assembly for the ranking call: a fixed rubric instruction and a
//! delimiter-separated item payload.

use crate::collect::types::ScrapedItem;

/// Delimiter between items in the user payload.
pub const ITEM_DELIMITER: &str = "---";

pub fn scoring_rubric() -> &'static str {
    "You are an expert evaluator of technology content, focused on AI and \
frontier tech. Assess each article's importance, innovation and technical \
value, and identify near-duplicate coverage.\n\
\n\
Scoring rubric (100 points total):\n\
\n\
1. Innovation and frontier-ness (35 points)\n\
   - Degree of technical novelty or breakthrough\n\
   - Relevance to the latest research and development\n\
   - Feasibility and practical value of the approach\n\
\n\
2. Technical depth (25 points)\n\
   - Depth of explanation of the underlying principles\n\
   - Completeness of implementation detail\n\
   - Accuracy of terminology\n\
\n\
3. Industry impact (20 points)\n\
   - Potential effect on the AI/tech industry\n\
   - Commercial value and market potential\n\
   - Breadth of application scenarios\n\
\n\
4. Timeliness and competitive context (20 points)\n\
   - News value and recency\n\
   - Comparison against competing products or approaches\n\
   - Insight into market dynamics\n\
\n\
Near-duplicate handling:\n\
   - Identify articles covering the same topic, technique or event\n\
   - Keep only the highest-scoring article of each such group\n\
   - Omit the other near-duplicates from the output entirely\n\
\n\
Return the result in exactly this format, one article per line:\n\
Article ID: score\n\
Article ID: score\n\
\n\
Rules:\n\
1. Scores range 0-100 with one decimal of precision\n\
2. One article per line, nothing but the ID and the score\n\
3. Spread scores out; avoid clustering them together\n\
4. Weight technical depth higher for deeply technical articles\n\
5. For a near-duplicate group, return only its highest-scoring member"
}

pub fn item_payload(items: &[ScrapedItem]) -> String {
    let mut out = String::new();
    for item in items {
        out.push_str("Article ID: ");
        out.push_str(&item.id);
        out.push_str("\nTitle: ");
        out.push_str(&item.title);
        out.push_str("\nPublished: ");
        out.push_str(&item.publish_date);
        out.push_str("\nContent:\n");
        out.push_str(&item.content);
        out.push('\n');
        out.push_str(ITEM_DELIMITER);
        out.push('\n');
    }
    out
}
