use heal_core::event::HealEvent;
use heal_core::types::short_id;

const RULE_WIDTH: usize = 60;

/// Console lines for a progress event.
pub fn format_event(event: &HealEvent) -> Vec<String> {
    match event {
        HealEvent::Starting { base_url } => vec![
            "🚀 Starting automated test-and-heal system...".into(),
            format!("🔗 Supabase URL: {base_url}"),
        ],
        HealEvent::FetchingData => vec!["📊 Fetching test data...".into()],
        HealEvent::FoundSubmission { id } => {
            vec![format!("✓ Found submission: {}...", short_id(id))]
        }
        HealEvent::NoSubmission => {
            vec!["⚠️ No pending submissions found. Create one first!".into()]
        }
        HealEvent::FoundReviewer { id } => vec![format!("✓ Found reviewer: {}...", short_id(id))],
        HealEvent::NoReviewer { name } => vec![format!("❌ Could not find reviewer ({name})")],
        HealEvent::AttemptStarted { index, max } => vec![format!("🔄 Attempt {index}/{max}")],
        HealEvent::Invoking { submission_id } => vec![format!(
            "🧪 Testing approval for submission {}...",
            short_id(submission_id)
        )],
        HealEvent::Approved => vec!["✅ Approval successful!".into()],
        HealEvent::Rejected { diagnostic } => vec![format!("❌ Approval failed: {diagnostic}")],
        HealEvent::Analyzing => vec!["🔧 Analyzing error and applying fix...".into()],
        HealEvent::Detected { signature } => vec![format!("🔍 Detected: {signature}")],
        HealEvent::ScriptWritten { path } => {
            vec![format!("📝 Applying fix via SQL file: {}", path.display())]
        }
        HealEvent::ScriptWriteFailed { path, error } => vec![format!(
            "❌ Failed to write SQL file {}: {error}",
            path.display()
        )],
        HealEvent::ManualApplyRequired { project_ref, sql } => {
            let rule = "=".repeat(RULE_WIDTH);
            vec![
                format!(
                    "⚠️ Note: Direct database connection to project '{project_ref}' requires password. Apply manually."
                ),
                "📋 SQL to apply:".into(),
                rule.clone(),
                sql.trim_end().to_string(),
                rule,
            ]
        }
        HealEvent::FixRecorded { description } => vec![format!("✅ Fix applied: {description}")],
        HealEvent::Retrying { delay_ms } => {
            vec![format!("⏳ Retrying in {:.1}s...", *delay_ms as f64 / 1000.0)]
        }
        HealEvent::NoAutomaticFix => vec![
            "⚠️ No automatic fix available for this error".into(),
            "📋 Manual intervention required".into(),
        ],
        HealEvent::Succeeded { fixes } => {
            let mut lines = vec!["🎉 Approval flow working!".to_string()];
            if !fixes.is_empty() {
                lines.push("📝 Fixes applied during this session:".into());
                lines.extend(fixes.iter().map(|f| format!("  - {f}")));
            }
            lines
        }
        HealEvent::Exhausted { max } => vec![format!("❌ Failed after {max} attempts")],
    }
}
