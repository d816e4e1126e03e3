//! The test-and-heal retry loop.
//!
//! A run locates one pending submission and one reviewer, then alternates
//! between invoking the approval operation and classifying its failure:
//!
//! ```text
//! Locating -> Attempting -> Succeeded
//!                 |
//!                 +-> (attempts left) Classifying -> Attempting
//!                 |                        +-> Unfixable
//!                 +-> (none left) Exhausted
//! ```
//!
//! A matched fix is rendered and recorded in the report before the next
//! attempt, even though the applier never executes it.

use crate::applier::ScriptApplier;
use crate::classifier::{Classification, Classifier, EvalContext};
use crate::config::Config;
use crate::event::HealEvent;
use crate::invoker::invoke_approval;
use crate::locator::{find_pending_submission, find_reviewer};
use crate::rules::default_rules;
use crate::store::Store;
use crate::types::{Attempt, InvokeResult, RunOutcome, RunReport};
use chrono::Utc;

pub struct Healer<'a> {
    config: &'a Config,
    store: &'a dyn Store,
    classifier: Classifier,
    applier: ScriptApplier,
}

impl<'a> Healer<'a> {
    pub fn new(config: &'a Config, store: &'a dyn Store) -> Self {
        Self {
            config,
            store,
            classifier: Classifier::new(default_rules()),
            applier: ScriptApplier::new(&config.fix_dir, config.project_ref()),
        }
    }

    pub fn run(&self, emit: &mut dyn FnMut(&HealEvent)) -> RunReport {
        let mut report = RunReport {
            outcome: RunOutcome::NoSubmission,
            submission_id: None,
            reviewer_id: None,
            attempts: Vec::new(),
            fixes: Vec::new(),
        };

        emit(&HealEvent::Starting {
            base_url: self.config.base_url.clone(),
        });
        emit(&HealEvent::FetchingData);

        let Some(submission) = find_pending_submission(self.store) else {
            emit(&HealEvent::NoSubmission);
            return report;
        };
        emit(&HealEvent::FoundSubmission {
            id: submission.id.clone(),
        });
        report.submission_id = Some(submission.id.clone());

        let Some(reviewer) = find_reviewer(self.store, &self.config.reviewer_name) else {
            emit(&HealEvent::NoReviewer {
                name: self.config.reviewer_name.clone(),
            });
            report.outcome = RunOutcome::NoReviewer;
            return report;
        };
        emit(&HealEvent::FoundReviewer {
            id: reviewer.id.clone(),
        });
        report.reviewer_id = Some(reviewer.id.clone());

        let max = self.config.max_attempts;
        for index in 1..=max {
            emit(&HealEvent::AttemptStarted { index, max });
            emit(&HealEvent::Invoking {
                submission_id: submission.id.clone(),
            });

            let started_at = Utc::now();
            let diagnostic = match invoke_approval(self.store, &submission.id, &reviewer.id) {
                InvokeResult::Success => {
                    report.attempts.push(Attempt {
                        index,
                        succeeded: true,
                        diagnostic: None,
                        started_at,
                    });
                    emit(&HealEvent::Approved);
                    emit(&HealEvent::Succeeded {
                        fixes: report.fixes.clone(),
                    });
                    report.outcome = RunOutcome::Succeeded;
                    return report;
                }
                InvokeResult::Failure(diagnostic) => diagnostic,
            };

            emit(&HealEvent::Rejected {
                diagnostic: diagnostic.clone(),
            });
            report.attempts.push(Attempt {
                index,
                succeeded: false,
                diagnostic: Some(diagnostic.clone()),
                started_at,
            });

            if index == max {
                break;
            }

            emit(&HealEvent::Analyzing);
            let ctx = EvalContext {
                diagnostic: &diagnostic,
                config: self.config,
            };
            let (detected, fix) = match self.classifier.classify(&ctx) {
                Classification::Fix { detected, fix } => (detected, fix),
                Classification::NoFix { detected } => {
                    emit(&HealEvent::Detected {
                        signature: detected.to_string(),
                    });
                    emit(&HealEvent::NoAutomaticFix);
                    report.outcome = RunOutcome::Unfixable;
                    return report;
                }
                Classification::Unrecognized => {
                    emit(&HealEvent::NoAutomaticFix);
                    report.outcome = RunOutcome::Unfixable;
                    return report;
                }
            };

            emit(&HealEvent::Detected {
                signature: detected.to_string(),
            });
            let status = self.applier.apply(&fix, emit);
            tracing::debug!(rule = %fix.rule, ?status, "fix surfaced");

            // Recorded even when the script was only rendered.
            report.fixes.push(fix.description.clone());
            emit(&HealEvent::FixRecorded {
                description: fix.description,
            });

            let delay = self.config.retry_delay;
            emit(&HealEvent::Retrying {
                delay_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            });
            if !delay.is_zero() {
                std::thread::sleep(delay);
            }
        }

        emit(&HealEvent::Exhausted { max });
        report.outcome = RunOutcome::Exhausted;
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{HealError, Result};
    use crate::locator::{PROFILES_TABLE, SUBMISSIONS_TABLE};
    use crate::store::RpcReply;
    use serde_json::{json, Value};
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::time::Duration;
    use tempfile::TempDir;

    /// In-memory store: fixed table contents and a queue of approval replies.
    /// Once the queue is drained every further call repeats the last reply.
    struct FakeStore {
        submissions: Vec<Value>,
        profiles: Vec<Value>,
        replies: RefCell<VecDeque<RpcReply>>,
        last: RefCell<Option<RpcReply>>,
        invocations: RefCell<Vec<Value>>,
    }

    impl FakeStore {
        fn new() -> Self {
            Self {
                submissions: vec![json!({
                    "id": "0f8fad5b-d9cb-469f-a165-70867728950e",
                    "submission_status": "pending_approval",
                    "commitment": {"id": "c-1", "title": "Feed the cat"}
                })],
                profiles: vec![json!({"id": "7c9e6679-7425-40de-944b-e07fc1f90ae7"})],
                replies: RefCell::new(VecDeque::new()),
                last: RefCell::new(None),
                invocations: RefCell::new(Vec::new()),
            }
        }

        fn without_submissions(mut self) -> Self {
            self.submissions.clear();
            self
        }

        fn without_reviewer(mut self) -> Self {
            self.profiles.clear();
            self
        }

        fn reply(self, reply: RpcReply) -> Self {
            self.replies.borrow_mut().push_back(reply);
            self
        }

        fn fail(self, message: &str) -> Self {
            self.reply(RpcReply::Rejected {
                status: 400,
                message: message.to_string(),
            })
        }

        fn succeed(self) -> Self {
            self.reply(RpcReply::Ok(Value::Null))
        }

        fn invocation_count(&self) -> usize {
            self.invocations.borrow().len()
        }
    }

    impl Store for FakeStore {
        fn select(&self, table: &str, _query: &[(&str, &str)]) -> Result<Vec<Value>> {
            match table {
                SUBMISSIONS_TABLE => Ok(self.submissions.clone()),
                PROFILES_TABLE => Ok(self.profiles.clone()),
                other => Err(HealError::Status {
                    status: 404,
                    body: format!("no table {other}"),
                }),
            }
        }

        fn rpc(&self, _operation: &str, params: &Value) -> Result<RpcReply> {
            self.invocations.borrow_mut().push(params.clone());
            let next = self.replies.borrow_mut().pop_front();
            let reply = match next {
                Some(r) => {
                    *self.last.borrow_mut() = Some(r.clone());
                    r
                }
                None => self
                    .last
                    .borrow()
                    .clone()
                    .unwrap_or(RpcReply::Ok(Value::Null)),
            };
            Ok(reply)
        }
    }

    struct Harness {
        _dir: TempDir,
        config: Config,
    }

    fn harness(max_attempts: u32) -> Harness {
        let dir = TempDir::new().unwrap();
        let config = Config::new(Some("https://abcd.supabase.co"), Some("k"))
            .unwrap()
            .with_max_attempts(max_attempts)
            .with_retry_delay(Duration::ZERO)
            .with_fix_dir(dir.path())
            .with_trigger_fix_path(dir.path().join("missing.sql"));
        Harness { _dir: dir, config }
    }

    fn run(config: &Config, store: &FakeStore) -> (RunReport, Vec<HealEvent>) {
        let mut events = Vec::new();
        let report = Healer::new(config, store).run(&mut |e| events.push(e.clone()));
        (report, events)
    }

    #[test]
    fn no_pending_submission_aborts_without_invoking() {
        let h = harness(3);
        let store = FakeStore::new().without_submissions().succeed();
        let (report, events) = run(&h.config, &store);

        assert_eq!(report.outcome, RunOutcome::NoSubmission);
        assert_eq!(store.invocation_count(), 0);
        assert!(report.attempts.is_empty());
        assert!(events.contains(&HealEvent::NoSubmission));
    }

    #[test]
    fn missing_reviewer_aborts_without_invoking() {
        let h = harness(3);
        let store = FakeStore::new().without_reviewer().succeed();
        let (report, _) = run(&h.config, &store);

        assert_eq!(report.outcome, RunOutcome::NoReviewer);
        assert_eq!(store.invocation_count(), 0);
        assert!(report.submission_id.is_some());
    }

    #[test]
    fn first_attempt_success() {
        let h = harness(3);
        let store = FakeStore::new().succeed();
        let (report, events) = run(&h.config, &store);

        assert_eq!(report.outcome, RunOutcome::Succeeded);
        assert!(report.fixes.is_empty());
        assert_eq!(store.invocation_count(), 1);
        assert_eq!(report.invocations(), 1);
        assert!(report.attempts[0].succeeded);
        assert_eq!(
            events.last(),
            Some(&HealEvent::Succeeded { fixes: vec![] })
        );
    }

    #[test]
    fn overflow_then_success_records_one_fix() {
        let h = harness(3);
        let store = FakeStore::new().fail("numeric field overflow").succeed();
        let (report, events) = run(&h.config, &store);

        assert_eq!(report.outcome, RunOutcome::Succeeded);
        assert_eq!(store.invocation_count(), 2);
        assert_eq!(
            report.fixes,
            vec!["Changed average_quality_rating to DECIMAL(5,2)".to_string()]
        );
        assert_eq!(
            report.attempts[0].diagnostic.as_deref(),
            Some("numeric field overflow")
        );
        assert!(h.config.fix_dir.join("fix_decimal_precision.sql").exists());
        assert!(events
            .iter()
            .any(|e| matches!(e, HealEvent::ManualApplyRequired { project_ref, .. } if project_ref == "abcd")));
    }

    #[test]
    fn unrecognized_failure_stops_after_one_attempt() {
        let h = harness(3);
        let store = FakeStore::new().fail("permission denied for function approve_submission");
        let (report, events) = run(&h.config, &store);

        assert_eq!(report.outcome, RunOutcome::Unfixable);
        assert_eq!(store.invocation_count(), 1);
        assert!(report.fixes.is_empty());
        assert!(events.contains(&HealEvent::NoAutomaticFix));
    }

    #[test]
    fn matched_rule_without_script_is_unfixable() {
        let h = harness(3);
        let store = FakeStore::new().fail(r#"record "new" has no field "submission_status""#);
        let (report, events) = run(&h.config, &store);

        assert_eq!(report.outcome, RunOutcome::Unfixable);
        assert_eq!(store.invocation_count(), 1);
        assert!(events.contains(&HealEvent::Detected {
            signature: "Wrong column name in trigger function".into()
        }));
    }

    #[test]
    fn repeating_signature_exhausts_attempts() {
        let h = harness(3);
        let store = FakeStore::new().fail("numeric field overflow");
        let (report, events) = run(&h.config, &store);

        assert_eq!(report.outcome, RunOutcome::Exhausted);
        assert_eq!(store.invocation_count(), 3);
        assert_eq!(report.attempts.len(), 3);
        // One fix per retry boundary, not one per attempt.
        assert_eq!(report.fixes.len(), 2);
        assert_eq!(events.last(), Some(&HealEvent::Exhausted { max: 3 }));
    }

    #[test]
    fn never_exceeds_max_attempts() {
        for max in 0..=5 {
            let h = harness(max);
            let store = FakeStore::new().fail("precision 3, scale 2");
            let (report, _) = run(&h.config, &store);

            assert_eq!(store.invocation_count(), max as usize);
            assert_eq!(report.outcome, RunOutcome::Exhausted);
            assert_eq!(report.fixes.len(), (max as usize).saturating_sub(1));
        }
    }

    #[test]
    fn same_submission_and_reviewer_used_for_every_attempt() {
        let h = harness(3);
        let store = FakeStore::new().fail("numeric field overflow");
        let (report, _) = run(&h.config, &store);

        let invocations = store.invocations.borrow();
        assert_eq!(invocations.len(), 3);
        for params in invocations.iter() {
            assert_eq!(
                params["p_submission_id"].as_str(),
                report.submission_id.as_deref()
            );
            assert_eq!(
                params["p_reviewer_id"].as_str(),
                report.reviewer_id.as_deref()
            );
        }
    }

    #[test]
    fn attempt_indices_are_one_based_and_increasing() {
        let h = harness(3);
        let store = FakeStore::new()
            .fail("numeric field overflow")
            .fail(r#"column "average_quality_rating" does not exist"#)
            .succeed();
        let (report, _) = run(&h.config, &store);

        let indices: Vec<u32> = report.attempts.iter().map(|a| a.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert_eq!(
            report.fixes,
            vec![
                "Changed average_quality_rating to DECIMAL(5,2)".to_string(),
                "Added Rep tracking columns".to_string(),
            ]
        );
    }
}
