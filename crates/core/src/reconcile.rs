//! Per-account reconciliation driver.
//!
//! The [`Reconciler`] walks each legacy account ID through a fixed chain of
//! lookups and, when every step succeeds, rewrites the participants field of
//! every issue that still references it:
//!
//! 1. Tracker account -> email (skip if hidden / unknown).
//! 2. Email -> institutional identifier (skip if the directory has none).
//! 3. Legacy account -> participant issues (skip if none).
//! 4. Institutional identifier -> current first-party account (skip if none).
//! 5. For each issue, remove the legacy ID and add the current one.
//!
//! Rows run strictly one after another. The first error aborts the run.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::directory::DirectoryClient;
use crate::errors::{CoreError, InputError, TrackerError};
use crate::input;
use crate::models::{RowOutcome, RunSummary, SkipReason};
use crate::tracker::TrackerClient;

/// What happened to a single issue update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied,
    DryRun,
}

/// Identity chain for one account, without touching any issue.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountLookup {
    pub account_id: String,
    pub email: Option<String>,
    pub institutional_id: Option<String>,
    pub new_account_id: Option<String>,
}

/// Drives reconciliation of legacy account IDs.
pub struct Reconciler {
    tracker: TrackerClient,
    directory: DirectoryClient,
    dry_run: bool,
}

impl Reconciler {
    /// Build both API clients from a resolved configuration.
    pub fn new(config: &AppConfig) -> Result<Self, CoreError> {
        config.require_credentials()?;
        let tracker = TrackerClient::new(&config.tracker)?;
        let directory = DirectoryClient::new(&config.directory)?;
        Ok(Self::from_parts(tracker, directory, config.run.dry_run))
    }

    pub fn from_parts(tracker: TrackerClient, directory: DirectoryClient, dry_run: bool) -> Self {
        info!(dry_run, "initializing reconciler");
        Self {
            tracker,
            directory,
            dry_run,
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    // -----------------------------------------------------------------------
    // Runs
    // -----------------------------------------------------------------------

    /// Reconcile every account ID yielded by `rows`, in order.
    pub async fn run<I>(&self, rows: I) -> Result<RunSummary, CoreError>
    where
        I: IntoIterator<Item = Result<String, InputError>>,
    {
        let mut summary = RunSummary::default();
        for row in rows {
            let account_id = row?;
            let outcome = self.reconcile_account(&account_id).await?;
            summary.push(outcome);
        }
        info!(
            rows = summary.rows(),
            replaced = summary.replaced_rows(),
            issues = summary.issues_updated(),
            "run complete"
        );
        Ok(summary)
    }

    /// Reconcile every account ID in the CSV file at `path`.
    pub async fn run_csv(&self, path: &Path) -> Result<RunSummary, CoreError> {
        info!(path = %path.display(), "reading account IDs");
        let rows = input::open_account_ids(path)?;
        self.run(rows).await
    }

    // -----------------------------------------------------------------------
    // Single row
    // -----------------------------------------------------------------------

    /// Reconcile one legacy account ID.
    pub async fn reconcile_account(&self, old_account_id: &str) -> Result<RowOutcome, CoreError> {
        let skip = |reason: SkipReason| -> Result<RowOutcome, CoreError> {
            info!(account_id = old_account_id, reason = %reason, "skipping account");
            Ok(RowOutcome::Skipped {
                account_id: old_account_id.to_string(),
                reason,
            })
        };

        let Some(email) = self.tracker.get_user_email(old_account_id).await? else {
            return skip(SkipReason::NoEmail);
        };

        let Some(institutional_id) = self.directory.resolve_email(&email).await? else {
            return skip(SkipReason::NoInstitutionalId);
        };
        debug!(
            account_id = old_account_id,
            institutional_id = %institutional_id,
            "institutional identity found"
        );

        let issues = self.tracker.find_participant_issues(old_account_id).await?;
        if issues.is_empty() {
            return skip(SkipReason::NoIssues);
        }

        let Some(new_account_id) = self.resolve_new_account(Some(&institutional_id)).await? else {
            return skip(SkipReason::NoFirstPartyAccount);
        };
        if new_account_id == old_account_id {
            return skip(SkipReason::AlreadyCurrent);
        }

        let mut updated = Vec::with_capacity(issues.len());
        for issue in &issues {
            self.update_issue(&issue.key, old_account_id, &new_account_id).await?;
            updated.push(issue.key.clone());
        }

        Ok(RowOutcome::Replaced {
            old_account_id: old_account_id.to_string(),
            new_account_id,
            issues: updated,
            dry_run: self.dry_run,
        })
    }

    /// Resolve the identity chain for one account without touching issues.
    pub async fn lookup_account(&self, account_id: &str) -> Result<AccountLookup, CoreError> {
        let mut lookup = AccountLookup {
            account_id: account_id.to_string(),
            ..AccountLookup::default()
        };
        lookup.email = self.tracker.get_user_email(account_id).await?;
        if let Some(email) = lookup.email.as_deref() {
            lookup.institutional_id = self.directory.resolve_email(email).await?;
        }
        lookup.new_account_id = self
            .resolve_new_account(lookup.institutional_id.as_deref())
            .await?;
        Ok(lookup)
    }

    // -----------------------------------------------------------------------
    // Steps
    // -----------------------------------------------------------------------

    /// Current first-party account for an institutional identifier (an
    /// email-shaped UPN). A missing identifier short-circuits to `None`
    /// without calling the tracker.
    async fn resolve_new_account(
        &self,
        institutional_id: Option<&str>,
    ) -> Result<Option<String>, TrackerError> {
        let Some(upn) = institutional_id else {
            return Ok(None);
        };
        let account_id = self.tracker.find_account_id_by_email(upn).await?;
        if account_id.is_none() {
            info!(upn, "no first-party account for institutional identity");
        }
        Ok(account_id)
    }

    /// Swap the participant on one issue. A failed update is returned as an
    /// error. Rows without a replacement account never get this far.
    async fn update_issue(
        &self,
        issue_key: &str,
        old_account_id: &str,
        new_account_id: &str,
    ) -> Result<UpdateOutcome, TrackerError> {
        if self.dry_run {
            info!(
                issue = issue_key,
                old = old_account_id,
                new = new_account_id,
                "dry run: would replace participant"
            );
            return Ok(UpdateOutcome::DryRun);
        }

        self.tracker
            .replace_participant(issue_key, old_account_id, new_account_id)
            .await?;
        info!(
            issue = issue_key,
            old = old_account_id,
            new = new_account_id,
            "replaced participant"
        );
        Ok(UpdateOutcome::Applied)
    }
}
