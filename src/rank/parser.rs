// src/rank/parser.rs
//! Parses free-text scoring output into (id, score) pairs.
//!
//! The provider is instructed to emit one `id: score` pair per line, but
//! real completions drift: label prefixes, full- or half-width colons,
//! stray whitespace. One malformed line fails the whole batch; callers
//! fall back to the pre-ranking order.

use once_cell::sync::OnceCell;
use regex::Regex;

use super::RankResult;

#[derive(Debug, thiserror::Error)]
#[error("invalid ranking line: {line:?}")]
pub struct ParseError {
    pub line: String,
}

/// Leading "Article ID"-style label, optionally followed by a colon.
fn label_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(?:article\s*id|文章ID)[:：]?\s*").unwrap())
}

fn line_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"^([^\s:：]+)[\s:：]+([0-9]+(?:\.[0-9]+)?)$").unwrap())
}

/// Output preserves line order. Duplicate ids are possible here; the merge
/// step resolves them last-write-wins.
pub fn parse_rank_output(raw: &str) -> Result<Vec<RankResult>, ParseError> {
    let mut results = Vec::new();
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let cleaned = label_re().replace(line, "");
        let caps = line_re()
            .captures(cleaned.trim())
            .ok_or_else(|| ParseError {
                line: line.to_string(),
            })?;
        let score: f64 = caps[2].parse().map_err(|_| ParseError {
            line: line.to_string(),
        })?;
        results.push(RankResult {
            id: caps[1].to_string(),
            score,
        });
    }
    Ok(results)
}
