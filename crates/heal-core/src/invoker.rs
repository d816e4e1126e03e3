use crate::store::{RpcReply, Store};
use crate::types::{ApprovalParams, InvokeResult};

pub const APPROVE_OPERATION: &str = "approve_submission";

/// Call the approval operation once. Transport and serialization errors are
/// folded into [`InvokeResult::Failure`]; nothing is propagated.
pub fn invoke_approval(store: &dyn Store, submission_id: &str, reviewer_id: &str) -> InvokeResult {
    let params = match serde_json::to_value(ApprovalParams::new(submission_id, reviewer_id)) {
        Ok(v) => v,
        Err(e) => return InvokeResult::Failure(e.to_string()),
    };

    match store.rpc(APPROVE_OPERATION, &params) {
        Ok(RpcReply::Ok(_)) => InvokeResult::Success,
        Ok(RpcReply::Rejected { status, message }) => {
            tracing::debug!(status, %message, "approval rejected");
            InvokeResult::Failure(message)
        }
        Err(e) => {
            tracing::warn!(error = %e, "approval request failed");
            InvokeResult::Failure(e.to_string())
        }
    }
}
