//! Helpers for presenting results to people.

use serde::Serialize;
use strum::Display;

/// Abbreviates an address to its first 6 and last 4 characters. Anything shorter than 10 characters is not a
/// meaningful address and renders as an empty string.
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() < 10 {
        return String::new();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

/// Truncates `text` to at most `max` characters followed by an ellipsis.
pub fn clamp_text(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => format!("{}…", &text[..end]),
        None => text.to_owned(),
    }
}

/// A coarse rating of a total score out of 50.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ScoreTier {
    Weak,
    Fair,
    Strong,
    Excellent,
}

impl ScoreTier {
    pub fn from_total(total: i64) -> Self {
        match total {
            42.. => ScoreTier::Excellent,
            35..=41 => ScoreTier::Strong,
            25..=34 => ScoreTier::Fair,
            _ => ScoreTier::Weak,
        }
    }

    /// Rates a single criterion out of 10 on the same scale as a total.
    pub fn from_criterion(score: u8) -> Self {
        Self::from_total(i64::from(score) * 5)
    }
}
