//! Partitioning and summary of dispatch outcomes

use std::collections::HashSet;
use std::fmt;

use crate::calls::Outcome;
use crate::services::greeting::{ErrorEnvelope, SuccessEnvelope};

/// Outcomes split by result, plus the numbers reported to the user
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub successes: Vec<SuccessEnvelope>,
    pub failures: Vec<ErrorEnvelope>,
    pub summary: Summary,
}

/// Reporting-only figures over a set of outcomes
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// Number of outcomes, i.e. sync count + async count
    pub total: usize,
    pub successes: usize,
    pub failures: usize,
    /// `successes / total`, 0.0 when nothing was dispatched
    pub success_ratio: f64,
    /// Number of distinct greeting texts among the successes
    pub distinct_greetings: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Got {} good results and {} bad results: {:.2}%",
            self.successes,
            self.failures,
            self.success_ratio * 100.0
        )?;
        write!(f, "Got {} unique greetings.", self.distinct_greetings)
    }
}

/// Partition outcomes into successes and failures, keeping their relative order
pub fn aggregate(outcomes: Vec<Outcome>) -> Aggregate {
    let total = outcomes.len();
    let mut successes = Vec::new();
    let mut failures = Vec::new();

    for outcome in outcomes {
        match outcome {
            Outcome::Success(envelope) => successes.push(envelope),
            Outcome::Failure { error, .. } => failures.push(error),
        }
    }

    let distinct_greetings = successes
        .iter()
        .map(|envelope| envelope.output.greeting.as_str())
        .collect::<HashSet<_>>()
        .len();

    let success_ratio = if total == 0 {
        0.0
    } else {
        successes.len() as f64 / total as f64
    };

    let summary = Summary {
        total,
        successes: successes.len(),
        failures: failures.len(),
        success_ratio,
        distinct_greetings,
    };

    Aggregate {
        successes,
        failures,
        summary,
    }
}
