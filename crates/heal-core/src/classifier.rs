use crate::config::Config;
use crate::types::Fix;

// ---------------------------------------------------------------------------
// EvalContext
// ---------------------------------------------------------------------------

pub struct EvalContext<'a> {
    pub diagnostic: &'a str,
    pub config: &'a Config,
}

// ---------------------------------------------------------------------------
// Classification (output)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// A rule matched and produced a corrective artifact.
    Fix { detected: &'static str, fix: Fix },
    /// A rule matched but its remedy is unavailable. Later rules are not
    /// consulted.
    NoFix { detected: &'static str },
    /// No rule matched.
    Unrecognized,
}

impl Classification {
    pub fn into_fix(self) -> Option<Fix> {
        match self {
            Classification::Fix { fix, .. } => Some(fix),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Rule
// ---------------------------------------------------------------------------

/// A fn-pointer rule: a substring predicate over the diagnostic paired with
/// the remedy it selects.
pub struct Rule {
    pub id: &'static str,
    /// Human-readable name of the failure signature.
    pub detected: &'static str,
    pub condition: fn(&str) -> bool,
    pub remedy: fn(&EvalContext) -> Option<Fix>,
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Ordered rule table. The first rule whose condition holds decides the
/// result, whether or not its remedy yields a fix.
pub struct Classifier {
    rules: Vec<Rule>,
}

impl Classifier {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn classify(&self, ctx: &EvalContext) -> Classification {
        let Some(rule) = self.rules.iter().find(|r| (r.condition)(ctx.diagnostic)) else {
            return Classification::Unrecognized;
        };
        tracing::debug!(rule = rule.id, "diagnostic matched");
        match (rule.remedy)(ctx) {
            Some(fix) => Classification::Fix {
                detected: rule.detected,
                fix,
            },
            None => Classification::NoFix {
                detected: rule.detected,
            },
        }
    }
}
