//! Finds the submission and reviewer a run operates on.
//!
//! Both lookups are soft: any transport, status, or parse failure is logged
//! and reported as "none found".

use crate::error::Result;
use crate::store::Store;
use crate::types::{Reviewer, Submission};
use serde::de::DeserializeOwned;

pub const SUBMISSIONS_TABLE: &str = "commitment_submissions";
pub const PROFILES_TABLE: &str = "user_profiles";
pub const PENDING_STATUS: &str = "pending_approval";

pub fn find_pending_submission(store: &dyn Store) -> Option<Submission> {
    let status = format!("eq.{PENDING_STATUS}");
    let query = [
        ("submission_status", status.as_str()),
        ("select", "*,commitment:commitments(*)"),
        ("limit", "1"),
    ];
    soften(first_row(store, SUBMISSIONS_TABLE, &query), "pending submission")
}

pub fn find_reviewer(store: &dyn Store, name: &str) -> Option<Reviewer> {
    let name_filter = format!("eq.{name}");
    let query = [("name", name_filter.as_str()), ("select", "id")];
    soften(first_row(store, PROFILES_TABLE, &query), "reviewer")
}

fn first_row<T: DeserializeOwned>(
    store: &dyn Store,
    table: &str,
    query: &[(&str, &str)],
) -> Result<Option<T>> {
    let rows = store.select(table, query)?;
    match rows.into_iter().next() {
        Some(row) => Ok(Some(serde_json::from_value(row)?)),
        None => Ok(None),
    }
}

fn soften<T>(result: Result<Option<T>>, what: &str) -> Option<T> {
    result.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to look up {what}");
        None
    })
}
