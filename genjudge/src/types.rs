use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

use crate::{error::RequestError, normalize};

/// The kind of content being judged. The contract evaluates each kind against a different brief.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Mode {
    #[strum(
        to_string = "genlayer",
        serialize = "genlayer project",
        serialize = "genlayer_project",
        serialize = "dapp",
        serialize = "project"
    )]
    Genlayer,
    #[strum(
        to_string = "startup",
        serialize = "startup pitch",
        serialize = "startup_pitch",
        serialize = "pitch"
    )]
    Startup,
    #[strum(to_string = "article", serialize = "blog", serialize = "essay", serialize = "post")]
    Article,
    #[strum(to_string = "meme", serialize = "meme idea", serialize = "meme_idea", serialize = "joke")]
    Meme,
    #[default]
    #[strum(to_string = "general")]
    General,
}

impl Mode {
    /// Parses a mode the way the contract does: surrounding whitespace is ignored, a few aliases are accepted and
    /// anything unrecognised is [Mode::General].
    pub fn parse_lenient(s: &str) -> Mode {
        s.trim().parse().unwrap_or_default()
    }
}

/// A single request to judge some content. Fields are trimmed on construction and cannot change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JudgeRequest {
    mode: Mode,
    title: String,
    url: String,
    content: String,
}

impl JudgeRequest {
    pub const MIN_CONTENT_CHARS: usize = 50;
    pub const MAX_CONTENT_CHARS: usize = 4000;

    pub fn new(
        mode: Mode,
        title: impl AsRef<str>,
        url: impl AsRef<str>,
        content: impl AsRef<str>,
    ) -> Result<Self, RequestError> {
        let content = content.as_ref().trim();
        let len = content.chars().count();
        if len == 0 {
            return Err(RequestError::EmptyContent);
        }
        if len < Self::MIN_CONTENT_CHARS {
            return Err(RequestError::ContentTooShort {
                len,
                min: Self::MIN_CONTENT_CHARS,
            });
        }
        if len > Self::MAX_CONTENT_CHARS {
            return Err(RequestError::ContentTooLong {
                len,
                max: Self::MAX_CONTENT_CHARS,
            });
        }

        Ok(JudgeRequest {
            mode,
            title: title.as_ref().trim().to_owned(),
            url: url.as_ref().trim().to_owned(),
            content: content.to_owned(),
        })
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// The ordered string arguments of the `judge_content` contract method.
    pub fn contract_args(&self) -> [String; 4] {
        [
            self.mode.to_string(),
            self.title.clone(),
            self.url.clone(),
            self.content.clone(),
        ]
    }
}

/// Per-criterion scores, each between 0 and 10.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub originality: u8,
    pub clarity: u8,
    pub value: u8,
    pub execution: u8,
    pub virality: u8,
}

impl ScoreBreakdown {
    pub const MAX: u8 = 10;

    /// Reads the breakdown out of a raw `scores` mapping. Missing criteria read as 0 and out-of-range values are
    /// clamped.
    pub fn from_scores(scores: &Map<String, Value>) -> Self {
        let criterion = |name: &str| {
            normalize::integer(scores.get(name)).clamp(0, i64::from(Self::MAX)) as u8
        };
        ScoreBreakdown {
            originality: criterion("originality"),
            clarity: criterion("clarity"),
            value: criterion("value"),
            execution: criterion("execution"),
            virality: criterion("virality"),
        }
    }

    pub fn sum(&self) -> u32 {
        [
            self.originality,
            self.clarity,
            self.value,
            self.execution,
            self.virality,
        ]
        .iter()
        .map(|s| u32::from(*s))
        .sum()
    }
}

/// The verdict for a submission, as read back from the contract after the judging transaction was accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeResult {
    pub mode: String,
    pub title: String,
    pub url: String,
    /// Overall score as reported by the contract. This is intended to be in `0..=50`, but it is passed through
    /// unchanged and is not checked against `scores`.
    pub total: i64,
    /// The raw per-criterion mapping. Use [JudgeResult::breakdown] for typed access.
    pub scores: Map<String, Value>,
    pub feedback: String,
    pub improvements: Vec<String>,
    pub tags: Vec<String>,
    /// Whether the submission scored high enough to be added to the public gallery.
    pub saved: bool,
    /// Whether the contract had to fall back to its deterministic scorer. See [crate::debug::DebugReader].
    pub fallback: bool,
}

impl JudgeResult {
    pub fn breakdown(&self) -> ScoreBreakdown {
        ScoreBreakdown::from_scores(&self.scores)
    }
}

/// A public gallery entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryEntry {
    pub mode: String,
    pub title: String,
    pub url: String,
    pub total: i64,
    pub author: String,
    pub feedback: String,
    pub tags: Vec<String>,
}

/// Diagnostics left behind by the last judging call of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugInfo {
    /// Which consensus primitive the contract used.
    pub eq: String,
    pub error: String,
    /// A prefix of the raw model output.
    pub raw: String,
}

impl Default for DebugInfo {
    fn default() -> Self {
        DebugInfo {
            eq: String::new(),
            error: "no debug".to_owned(),
            raw: String::new(),
        }
    }
}

/// Where a submission currently is. `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SubmissionStage {
    #[default]
    Idle,
    Submitting,
    AwaitingFinality,
    ReadingResult,
    Done,
    Failed,
}

impl SubmissionStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmissionStage::Done | SubmissionStage::Failed)
    }
}
