//! Parsing helpers for oracle responses
//!
//! Model replies often wrap the payload in extra prose, quotes, or code
//! fences; these functions extract the useful part and nothing else.

use crate::error::{Error, Result};
use crate::insights::InsightDraft;

/// Clean a category-name reply: first non-empty line, stripped of quotes,
/// code fences, and trailing punctuation.
pub fn clean_category_reply(response: &str) -> String {
    response
        .lines()
        .map(|line| {
            line.trim()
                .trim_start_matches("```")
                .trim_matches(|c| c == '"' || c == '\'' || c == '`')
                .trim_end_matches('.')
                .trim()
        })
        .find(|line| !line.is_empty())
        .unwrap_or("")
        .to_string()
}

/// Parse insight drafts from an oracle reply expected to contain a JSON array
pub fn parse_insight_drafts(response: &str) -> Result<Vec<InsightDraft>> {
    let response = response.trim();

    // Find the array even when the model adds text around it
    let start = response.find('[');
    let end = response.rfind(']');

    match (start, end) {
        (Some(s), Some(e)) if s < e => {
            let json_str = &response[s..=e];
            serde_json::from_str(json_str).map_err(|e| {
                Error::OracleMalformed(format!(
                    "Invalid insight JSON: {} | Raw: {}",
                    e,
                    preview(json_str)
                ))
            })
        }
        _ => Err(Error::OracleMalformed(format!(
            "No JSON array found in oracle response | Raw: {}",
            preview(response)
        ))),
    }
}

/// Truncate long replies for error messages without splitting a character
fn preview(s: &str) -> String {
    const MAX_BYTES: usize = 200;
    if s.len() <= MAX_BYTES {
        return s.to_string();
    }
    let mut end = MAX_BYTES;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}
