use std::path::PathBuf;

/// Progress notifications emitted during a run, in order. Rendering is left
/// to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealEvent {
    Starting { base_url: String },
    FetchingData,
    FoundSubmission { id: String },
    NoSubmission,
    FoundReviewer { id: String },
    NoReviewer { name: String },
    AttemptStarted { index: u32, max: u32 },
    Invoking { submission_id: String },
    Approved,
    Rejected { diagnostic: String },
    Analyzing,
    Detected { signature: String },
    ScriptWritten { path: PathBuf },
    ScriptWriteFailed { path: PathBuf, error: String },
    /// The fix was rendered but must be run by hand against `project_ref`.
    ManualApplyRequired { project_ref: String, sql: String },
    FixRecorded { description: String },
    Retrying { delay_ms: u64 },
    NoAutomaticFix,
    Succeeded { fixes: Vec<String> },
    Exhausted { max: u32 },
}
