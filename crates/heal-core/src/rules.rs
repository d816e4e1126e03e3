use crate::classifier::{EvalContext, Rule};
use crate::types::Fix;

// ---------------------------------------------------------------------------
// Fix artifacts
// ---------------------------------------------------------------------------

const WIDEN_DECIMALS_SQL: &str = "\
-- Fix DECIMAL precision
ALTER TABLE user_profiles
ALTER COLUMN average_quality_rating TYPE DECIMAL(5,2);

ALTER TABLE user_profiles
ALTER COLUMN consistency_score TYPE DECIMAL(5,2);
";

const ADD_REP_COLUMNS_SQL: &str = "\
ALTER TABLE user_profiles
ADD COLUMN IF NOT EXISTS rep_title TEXT DEFAULT 'Entry Earner',
ADD COLUMN IF NOT EXISTS rep_tier TEXT DEFAULT '1E',
ADD COLUMN IF NOT EXISTS total_commitments INTEGER DEFAULT 0,
ADD COLUMN IF NOT EXISTS completed_commitments INTEGER DEFAULT 0,
ADD COLUMN IF NOT EXISTS failed_commitments INTEGER DEFAULT 0,
ADD COLUMN IF NOT EXISTS average_quality_rating DECIMAL(5,2) DEFAULT 0.00,
ADD COLUMN IF NOT EXISTS consistency_score DECIMAL(5,2) DEFAULT 0.00,
ADD COLUMN IF NOT EXISTS last_rep_update TIMESTAMP WITH TIME ZONE DEFAULT NOW();
";

/// Column whose absence identifies a profiles table without rep tracking.
pub const TRACKING_COLUMN: &str = "average_quality_rating";

// ---------------------------------------------------------------------------
// Conditions
// ---------------------------------------------------------------------------

fn is_decimal_overflow(msg: &str) -> bool {
    msg.contains("numeric field overflow") || msg.contains("precision 3, scale 2")
}

fn is_missing_rep_columns(msg: &str) -> bool {
    msg.contains("does not exist") && msg.contains(TRACKING_COLUMN)
}

fn is_trigger_column_mismatch(msg: &str) -> bool {
    msg.contains("submission_status") || msg.contains("NEW.status")
}

// ---------------------------------------------------------------------------
// Remedies
// ---------------------------------------------------------------------------

fn widen_decimals(_ctx: &EvalContext) -> Option<Fix> {
    Some(Fix {
        rule: "decimal_overflow".into(),
        description: "Changed average_quality_rating to DECIMAL(5,2)".into(),
        file_name: "fix_decimal_precision.sql".into(),
        sql: WIDEN_DECIMALS_SQL.into(),
    })
}

fn add_rep_columns(_ctx: &EvalContext) -> Option<Fix> {
    Some(Fix {
        rule: "missing_rep_columns".into(),
        description: "Added Rep tracking columns".into(),
        file_name: "add_rep_columns.sql".into(),
        sql: ADD_REP_COLUMNS_SQL.into(),
    })
}

/// The trigger rewrite is maintained outside this tool; no file, no fix.
fn load_trigger_fix(ctx: &EvalContext) -> Option<Fix> {
    let path = &ctx.config.trigger_fix_path;
    let sql = match std::fs::read_to_string(path) {
        Ok(sql) => sql,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "trigger fix script unavailable");
            return None;
        }
    };
    Some(Fix {
        rule: "trigger_column_mismatch".into(),
        description: "Updated trigger function".into(),
        file_name: "fix_trigger_function.sql".into(),
        sql,
    })
}

// ---------------------------------------------------------------------------
// Rule table
// ---------------------------------------------------------------------------

/// Known failure signatures, in evaluation order.
pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule {
            id: "decimal_overflow",
            detected: "DECIMAL overflow in average_quality_rating",
            condition: is_decimal_overflow,
            remedy: widen_decimals,
        },
        Rule {
            id: "missing_rep_columns",
            detected: "Missing Rep tracking columns",
            condition: is_missing_rep_columns,
            remedy: add_rep_columns,
        },
        Rule {
            id: "trigger_column_mismatch",
            detected: "Wrong column name in trigger function",
            condition: is_trigger_column_mismatch,
            remedy: load_trigger_fix,
        },
    ]
}
