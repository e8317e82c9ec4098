//! Domain model types used throughout acctremap.
//!
//! These types carry per-row reconciliation results from the reconciler to
//! the CLI summary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Skip reasons
// ---------------------------------------------------------------------------

/// Why a row was skipped without touching any issue.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The tracker user has no visible email address.
    NoEmail,
    /// The directory could not resolve the email.
    NoInstitutionalId,
    /// No issue lists the account as a participant.
    NoIssues,
    /// No first-party tracker account exists for the email.
    NoFirstPartyAccount,
    /// The email already resolves to the legacy account.
    AlreadyCurrent,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoEmail => write!(f, "no_email"),
            Self::NoInstitutionalId => write!(f, "no_institutional_id"),
            Self::NoIssues => write!(f, "no_issues"),
            Self::NoFirstPartyAccount => write!(f, "no_first_party_account"),
            Self::AlreadyCurrent => write!(f, "already_current"),
        }
    }
}

// ---------------------------------------------------------------------------
// Row outcome
// ---------------------------------------------------------------------------

/// Result of reconciling one legacy account ID.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RowOutcome {
    Skipped {
        account_id: String,
        reason: SkipReason,
    },
    Replaced {
        old_account_id: String,
        new_account_id: String,
        /// Keys of the issues whose participants field was rewritten (or
        /// would have been, for a dry run).
        issues: Vec<String>,
        dry_run: bool,
    },
}

impl RowOutcome {
    /// The legacy account ID this row was about.
    pub fn account_id(&self) -> &str {
        match self {
            Self::Skipped { account_id, .. } => account_id,
            Self::Replaced { old_account_id, .. } => old_account_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Run summary
// ---------------------------------------------------------------------------

/// All row outcomes of a run, in input order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub outcomes: Vec<RowOutcome>,
}

impl RunSummary {
    pub fn push(&mut self, outcome: RowOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn rows(&self) -> usize {
        self.outcomes.len()
    }

    /// Rows where at least one issue was (or would be) rewritten.
    pub fn replaced_rows(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, RowOutcome::Replaced { .. }))
            .count()
    }

    /// Total issue updates across all rows.
    pub fn issues_updated(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match o {
                RowOutcome::Replaced { issues, .. } => issues.len(),
                RowOutcome::Skipped { .. } => 0,
            })
            .sum()
    }

    /// Skip counts keyed by reason, in a stable order.
    pub fn skips_by_reason(&self) -> BTreeMap<SkipReason, usize> {
        let mut counts = BTreeMap::new();
        for outcome in &self.outcomes {
            if let RowOutcome::Skipped { reason, .. } = outcome {
                *counts.entry(*reason).or_insert(0) += 1;
            }
        }
        counts
    }
}
