use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Submission / Reviewer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commitment {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// A unit of work awaiting approval. Only the fields this tool reads are
/// modelled; the rest of the row is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    #[serde(default)]
    pub submission_status: Option<String>,
    #[serde(default)]
    pub commitment: Option<Commitment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reviewer {
    pub id: String,
}

/// Fixed parameters for the approval operation.
#[derive(Debug, Clone, Serialize)]
pub struct ApprovalParams<'a> {
    pub p_submission_id: &'a str,
    pub p_quality_rating: u8,
    pub p_reviewer_id: &'a str,
    pub p_reviewer_notes: &'a str,
    pub p_bonus_tip_cents: u32,
}

pub const APPROVAL_QUALITY_RATING: u8 = 4;
pub const APPROVAL_NOTES: &str = "Automated test approval";
pub const APPROVAL_BONUS_CENTS: u32 = 0;

impl<'a> ApprovalParams<'a> {
    pub fn new(submission_id: &'a str, reviewer_id: &'a str) -> Self {
        Self {
            p_submission_id: submission_id,
            p_quality_rating: APPROVAL_QUALITY_RATING,
            p_reviewer_id: reviewer_id,
            p_reviewer_notes: APPROVAL_NOTES,
            p_bonus_tip_cents: APPROVAL_BONUS_CENTS,
        }
    }
}

// ---------------------------------------------------------------------------
// InvokeResult
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvokeResult {
    Success,
    Failure(String),
}

// ---------------------------------------------------------------------------
// Fix
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fix {
    /// Id of the rule that produced this fix.
    pub rule: String,
    pub description: String,
    pub file_name: String,
    pub sql: String,
}

/// Result of handing a fix to the applier. There is no automatic path today,
/// so only one variant exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyStatus {
    NotApplied,
}

impl ApplyStatus {
    pub fn is_applied(self) -> bool {
        match self {
            ApplyStatus::NotApplied => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Attempt / RunOutcome / RunReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    /// 1-indexed.
    pub index: u32,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Succeeded,
    NoSubmission,
    NoReviewer,
    Unfixable,
    Exhausted,
}

impl RunOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, RunOutcome::Succeeded)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunOutcome::Succeeded => "succeeded",
            RunOutcome::NoSubmission => "no_submission",
            RunOutcome::NoReviewer => "no_reviewer",
            RunOutcome::Unfixable => "unfixable",
            RunOutcome::Exhausted => "exhausted",
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub outcome: RunOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewer_id: Option<String>,
    pub attempts: Vec<Attempt>,
    /// Descriptions of the fixes surfaced during the run, in order.
    pub fixes: Vec<String>,
}

impl RunReport {
    pub fn invocations(&self) -> usize {
        self.attempts.len()
    }
}

/// Short form of an id for console output: first 8 characters.
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((i, _)) => &id[..i],
        None => id,
    }
}
