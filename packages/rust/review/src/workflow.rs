//! Approve/reject workflow for submission issues.
//!
//! A review is a fixed, ordered list of tracker calls. Each step either
//! succeeds or stops the run with a [`ReviewError`] naming that step and the
//! steps already completed. Nothing is rolled back: the data-file write is
//! the commit point, and every step after it only touches the issue, so a
//! failed run can be finished by hand or rerun once the labels are fixed.

use std::fmt;

use serde_json::Value;
use tracing::{debug, info, instrument};

use navsphere_shared::{NavSphereError, ReviewConfig};

use crate::splice::{self, Placement};
use crate::submission::parse_submission_from_issue_body;
use crate::tracker::{FileUpdate, Issue, IssueState, IssueTracker};

/// One tracker interaction (or local transformation) within a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReviewStep {
    FetchIssue,
    CheckState,
    ParseSubmission,
    ReadDataFile,
    DecodeData,
    SpliceItem,
    EncodeData,
    WriteDataFile,
    UpdateLabels,
    Comment,
    CloseIssue,
}

impl ReviewStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FetchIssue => "fetch_issue",
            Self::CheckState => "check_state",
            Self::ParseSubmission => "parse_submission",
            Self::ReadDataFile => "read_data_file",
            Self::DecodeData => "decode_data",
            Self::SpliceItem => "splice_item",
            Self::EncodeData => "encode_data",
            Self::WriteDataFile => "write_data_file",
            Self::UpdateLabels => "update_labels",
            Self::Comment => "comment",
            Self::CloseIssue => "close_issue",
        }
    }
}

impl fmt::Display for ReviewStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The reviewer's decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewAction {
    Approve,
    Reject { reason: Option<String> },
}

/// What a completed review did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewOutcome {
    pub issue: u64,
    pub approved: bool,
    /// Where the new link was placed (approvals only).
    pub placement: Option<Placement>,
    /// Id of the new link (approvals only).
    pub item_id: Option<String>,
    /// Data file revision after the write (approvals only).
    pub revision: Option<String>,
    pub steps: Vec<ReviewStep>,
}

/// A review that stopped part-way.
#[derive(Debug, thiserror::Error)]
#[error("review of issue #{issue} failed at {step}: {source}")]
pub struct ReviewError {
    pub issue: u64,
    pub step: ReviewStep,
    /// Steps that finished before the failure, in order.
    pub completed: Vec<ReviewStep>,
    #[source]
    pub source: NavSphereError,
}

impl ReviewError {
    /// Whether the navigation data file was already rewritten.
    pub fn data_committed(&self) -> bool {
        self.completed.contains(&ReviewStep::WriteDataFile)
    }
}

/// Records finished steps and turns the first failure into a [`ReviewError`].
struct StepLog {
    issue: u64,
    completed: Vec<ReviewStep>,
}

impl StepLog {
    fn new(issue: u64) -> Self {
        Self {
            issue,
            completed: Vec::new(),
        }
    }

    fn record<T>(
        &mut self,
        step: ReviewStep,
        result: navsphere_shared::Result<T>,
    ) -> Result<T, ReviewError> {
        match result {
            Ok(value) => {
                debug!(issue = self.issue, %step, "review step completed");
                self.completed.push(step);
                Ok(value)
            }
            Err(source) => Err(ReviewError {
                issue: self.issue,
                step,
                completed: self.completed.clone(),
                source,
            }),
        }
    }
}

/// Drives reviews against an [`IssueTracker`].
pub struct ReviewWorkflow<T> {
    tracker: T,
    config: ReviewConfig,
}

impl<T: IssueTracker> ReviewWorkflow<T> {
    pub fn new(tracker: T, config: ReviewConfig) -> Self {
        Self { tracker, config }
    }

    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    pub fn config(&self) -> &ReviewConfig {
        &self.config
    }

    /// Run a review for issue `number`.
    #[instrument(skip(self, action), fields(approve = matches!(action, ReviewAction::Approve)))]
    pub async fn review(
        &self,
        number: u64,
        action: &ReviewAction,
    ) -> Result<ReviewOutcome, ReviewError> {
        let mut log = StepLog::new(number);

        let issue = log.record(ReviewStep::FetchIssue, self.tracker.get_issue(number).await)?;
        log.record(ReviewStep::CheckState, self.check_undecided(&issue))?;

        let outcome = match action {
            ReviewAction::Approve => self.approve(&issue, &mut log).await?,
            ReviewAction::Reject { reason } => {
                self.reject(&issue, reason.as_deref(), &mut log).await?
            }
        };

        info!(
            issue = number,
            approved = outcome.approved,
            placement = ?outcome.placement,
            "review completed"
        );

        Ok(outcome)
    }

    async fn approve(
        &self,
        issue: &Issue,
        log: &mut StepLog,
    ) -> Result<ReviewOutcome, ReviewError> {
        let submission = log.record(
            ReviewStep::ParseSubmission,
            parse_submission_from_issue_body(&issue.body).ok_or_else(|| {
                NavSphereError::validation("issue body holds no valid submission")
            }),
        )?;

        let file = log.record(
            ReviewStep::ReadDataFile,
            self.tracker
                .read_data_file(&self.config.data_path, &self.config.branch)
                .await,
        )?;

        let mut navigation = log.record(
            ReviewStep::DecodeData,
            serde_json::from_str::<Value>(&file.content)
                .map_err(|e| NavSphereError::parse(format!("{}: {e}", self.config.data_path))),
        )?;

        let item_id = chrono::Utc::now().timestamp_millis().to_string();
        let item = splice::new_link_item(&submission, item_id.clone(), &self.config.default_icon);
        let placement = log.record(
            ReviewStep::SpliceItem,
            splice::insert_submission(
                &mut navigation,
                &item,
                &submission.category,
                submission.subcategory.as_deref(),
            ),
        )?;

        let content = log.record(ReviewStep::EncodeData, encode_navigation(&navigation))?;

        let message = format!("Add submission: {}", submission.title);
        let revision = log.record(
            ReviewStep::WriteDataFile,
            self.tracker
                .write_data_file(FileUpdate {
                    path: &self.config.data_path,
                    branch: &self.config.branch,
                    content: &content,
                    revision: &file.revision,
                    message: &message,
                })
                .await,
        )?;

        let labels = swap_label(
            &issue.labels,
            &self.config.labels.pending,
            &self.config.labels.approved,
        );
        log.record(
            ReviewStep::UpdateLabels,
            self.tracker.set_labels(issue.number, &labels).await,
        )?;

        log.record(
            ReviewStep::Comment,
            self.tracker
                .add_comment(issue.number, &approval_comment(&self.config.reviewer))
                .await,
        )?;

        log.record(
            ReviewStep::CloseIssue,
            self.tracker.close_issue(issue.number).await,
        )?;

        Ok(ReviewOutcome {
            issue: issue.number,
            approved: true,
            placement: Some(placement),
            item_id: Some(item_id),
            revision: Some(revision),
            steps: log.completed.clone(),
        })
    }

    async fn reject(
        &self,
        issue: &Issue,
        reason: Option<&str>,
        log: &mut StepLog,
    ) -> Result<ReviewOutcome, ReviewError> {
        let labels = swap_label(
            &issue.labels,
            &self.config.labels.pending,
            &self.config.labels.rejected,
        );
        log.record(
            ReviewStep::UpdateLabels,
            self.tracker.set_labels(issue.number, &labels).await,
        )?;

        log.record(
            ReviewStep::Comment,
            self.tracker
                .add_comment(issue.number, &rejection_comment(reason, &self.config.reviewer))
                .await,
        )?;

        log.record(
            ReviewStep::CloseIssue,
            self.tracker.close_issue(issue.number).await,
        )?;

        Ok(ReviewOutcome {
            issue: issue.number,
            approved: false,
            placement: None,
            item_id: None,
            revision: None,
            steps: log.completed.clone(),
        })
    }

    /// Refuse closed issues and issues that already carry a decision label.
    fn check_undecided(&self, issue: &Issue) -> navsphere_shared::Result<()> {
        if issue.state == IssueState::Closed {
            return Err(NavSphereError::validation(format!(
                "issue #{} is already closed",
                issue.number
            )));
        }

        let labels = &self.config.labels;
        match issue
            .labels
            .iter()
            .find(|l| **l == labels.approved || **l == labels.rejected)
        {
            Some(label) => Err(NavSphereError::validation(format!(
                "issue #{} was already reviewed (label `{label}`)",
                issue.number
            ))),
            None => Ok(()),
        }
    }
}

/// Serialize the navigation document and make sure the site can still load it.
fn encode_navigation(navigation: &Value) -> navsphere_shared::Result<String> {
    let content = serde_json::to_string_pretty(navigation)
        .map_err(|e| NavSphereError::parse(format!("encoding navigation data: {e}")))?;
    navsphere_core::parse_navigation(&content)?;
    Ok(content)
}

/// Drop `remove`, keep every other label, and append `add` once.
fn swap_label(current: &[String], remove: &str, add: &str) -> Vec<String> {
    let mut labels: Vec<String> = current
        .iter()
        .filter(|l| l.as_str() != remove && l.as_str() != add)
        .cloned()
        .collect();
    labels.push(add.to_string());
    labels
}

fn approval_comment(reviewer: &str) -> String {
    format!(
        "✅ **Submission approved**\n\nThe site has been added to the navigation list.\n\nReviewer: @{reviewer}"
    )
}

fn rejection_comment(reason: Option<&str>, reviewer: &str) -> String {
    let detail = match reason.map(str::trim).filter(|r| !r.is_empty()) {
        Some(reason) => format!("Reason: {reason}"),
        None => "Thanks for your submission, but this site does not meet our listing criteria yet."
            .to_string(),
    };
    format!("❌ **Submission rejected**\n\n{detail}\n\nReviewer: @{reviewer}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::{DataFile, LocalTracker};
    use navsphere_shared::{AppConfig, LabelsConfig};

    const DATA_PATH: &str = "navigation.json";

    fn config() -> ReviewConfig {
        let mut config = ReviewConfig::from(&AppConfig::default());
        config.data_path = DATA_PATH.into();
        config.reviewer = "maintainer".into();
        config
    }

    fn issue(number: u64, body: String) -> Issue {
        Issue {
            number,
            title: "[Submission] Untitled".into(),
            body,
            labels: vec!["submission".into(), "pending".into()],
            state: IssueState::Open,
            comments: vec![],
        }
    }

    async fn setup(dir: &std::path::Path) -> LocalTracker {
        let nav = std::fs::read_to_string("../../../fixtures/json/navigation.fixture.json")
            .expect("read navigation fixture");
        std::fs::write(dir.join(DATA_PATH), nav).expect("seed navigation");

        let issue: Issue = serde_json::from_str(
            &std::fs::read_to_string("../../../fixtures/json/issue.fixture.json")
                .expect("read issue fixture"),
        )
        .expect("issue fixture");

        let tracker = LocalTracker::new(dir.join("issues"), dir);
        tracker.save_issue(&issue).await.expect("seed issue");
        tracker
    }

    fn read_nav(dir: &std::path::Path) -> Value {
        let content = std::fs::read_to_string(dir.join(DATA_PATH)).expect("read nav");
        serde_json::from_str(&content).expect("nav json")
    }

    #[tokio::test]
    async fn approve_adds_link_and_closes_issue() {
        let dir = tempfile::tempdir().expect("tempdir");
        let workflow = ReviewWorkflow::new(setup(dir.path()).await, config());

        let outcome = workflow
            .review(42, &ReviewAction::Approve)
            .await
            .expect("approve");

        assert!(outcome.approved);
        assert_eq!(
            outcome.placement,
            Some(Placement::Subcategory {
                category: "dev".into(),
                subcategory: "frontend".into()
            })
        );
        assert_eq!(outcome.steps.len(), 11);
        assert_eq!(outcome.steps.last(), Some(&ReviewStep::CloseIssue));

        let nav = read_nav(dir.path());
        let items = nav["navigationItems"][1]["subCategories"][0]["items"]
            .as_array()
            .expect("items");
        let added = items.last().expect("new item");
        assert_eq!(added["title"], "Rust Playground");
        assert_eq!(added["href"], "https://play.rust-lang.org");
        assert_eq!(added["enabled"], true);
        assert_eq!(added["id"].as_str(), outcome.item_id.as_deref());

        // Untouched categories keep their layout.
        assert_eq!(nav["navigationItems"][0]["icon"], "linecons-desktop");

        let issue = workflow.tracker().get_issue(42).await.expect("issue");
        assert_eq!(issue.labels, ["submission", "approved"]);
        assert_eq!(issue.state, IssueState::Closed);
        assert!(issue.comments[0].contains("@maintainer"));
    }

    #[tokio::test]
    async fn reject_leaves_data_untouched() {
        let dir = tempfile::tempdir().expect("tempdir");
        let workflow = ReviewWorkflow::new(setup(dir.path()).await, config());
        let before = read_nav(dir.path());

        let outcome = workflow
            .review(
                42,
                &ReviewAction::Reject {
                    reason: Some("duplicate of an existing link".into()),
                },
            )
            .await
            .expect("reject");

        assert!(!outcome.approved);
        assert_eq!(
            outcome.steps,
            [
                ReviewStep::FetchIssue,
                ReviewStep::CheckState,
                ReviewStep::UpdateLabels,
                ReviewStep::Comment,
                ReviewStep::CloseIssue,
            ]
        );
        assert_eq!(read_nav(dir.path()), before);

        let issue = workflow.tracker().get_issue(42).await.expect("issue");
        assert_eq!(issue.labels, ["submission", "rejected"]);
        assert!(issue.comments[0].contains("Reason: duplicate of an existing link"));
    }

    #[tokio::test]
    async fn reviewed_issue_is_refused() {
        let dir = tempfile::tempdir().expect("tempdir");
        let workflow = ReviewWorkflow::new(setup(dir.path()).await, config());

        workflow
            .review(42, &ReviewAction::Approve)
            .await
            .expect("first approval");
        let err = workflow
            .review(42, &ReviewAction::Approve)
            .await
            .unwrap_err();

        assert_eq!(err.step, ReviewStep::CheckState);
        assert!(err.to_string().contains("already reviewed"));
        assert!(!err.data_committed());
    }

    #[tokio::test]
    async fn closed_issue_is_refused() {
        let dir = tempfile::tempdir().expect("tempdir");
        let tracker = setup(dir.path()).await;
        let mut closed = issue(44, "closed without a decision".into());
        closed.state = IssueState::Closed;
        tracker.save_issue(&closed).await.expect("seed");
        let workflow = ReviewWorkflow::new(tracker, config());
        let before = read_nav(dir.path());

        let err = workflow
            .review(44, &ReviewAction::Approve)
            .await
            .unwrap_err();

        assert_eq!(err.step, ReviewStep::CheckState);
        assert!(err.to_string().contains("already closed"));
        assert_eq!(read_nav(dir.path()), before);
    }

    #[tokio::test]
    async fn missing_issue_fails_first_step() {
        let dir = tempfile::tempdir().expect("tempdir");
        let workflow = ReviewWorkflow::new(setup(dir.path()).await, config());

        let err = workflow
            .review(7, &ReviewAction::Approve)
            .await
            .unwrap_err();
        assert_eq!(err.step, ReviewStep::FetchIssue);
        assert!(err.completed.is_empty());
    }

    #[tokio::test]
    async fn unparseable_body_fails_at_parse_step() {
        let dir = tempfile::tempdir().expect("tempdir");
        let tracker = setup(dir.path()).await;
        tracker
            .save_issue(&issue(43, "no data here".into()))
            .await
            .expect("seed");
        let workflow = ReviewWorkflow::new(tracker, config());

        let err = workflow
            .review(43, &ReviewAction::Approve)
            .await
            .unwrap_err();
        assert_eq!(err.step, ReviewStep::ParseSubmission);
        assert_eq!(err.completed, [ReviewStep::FetchIssue, ReviewStep::CheckState]);
    }

    /// Wraps a tracker and fails the named operation.
    struct FailingTracker {
        inner: LocalTracker,
        fail: &'static str,
    }

    impl FailingTracker {
        fn check(&self, op: &str) -> navsphere_shared::Result<()> {
            if self.fail == op {
                Err(NavSphereError::tracker(format!("{op} unavailable")))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait::async_trait]
    impl IssueTracker for FailingTracker {
        async fn get_issue(&self, number: u64) -> navsphere_shared::Result<Issue> {
            self.check("get_issue")?;
            self.inner.get_issue(number).await
        }

        async fn read_data_file(
            &self,
            path: &str,
            branch: &str,
        ) -> navsphere_shared::Result<DataFile> {
            self.check("read_data_file")?;
            self.inner.read_data_file(path, branch).await
        }

        async fn write_data_file(
            &self,
            update: FileUpdate<'_>,
        ) -> navsphere_shared::Result<String> {
            self.check("write_data_file")?;
            self.inner.write_data_file(update).await
        }

        async fn set_labels(&self, number: u64, labels: &[String]) -> navsphere_shared::Result<()> {
            self.check("set_labels")?;
            self.inner.set_labels(number, labels).await
        }

        async fn add_comment(&self, number: u64, body: &str) -> navsphere_shared::Result<()> {
            self.check("add_comment")?;
            self.inner.add_comment(number, body).await
        }

        async fn close_issue(&self, number: u64) -> navsphere_shared::Result<()> {
            self.check("close_issue")?;
            self.inner.close_issue(number).await
        }
    }

    #[tokio::test]
    async fn failure_after_write_reports_committed_data() {
        let dir = tempfile::tempdir().expect("tempdir");
        let tracker = FailingTracker {
            inner: setup(dir.path()).await,
            fail: "add_comment",
        };
        let workflow = ReviewWorkflow::new(tracker, config());

        let err = workflow
            .review(42, &ReviewAction::Approve)
            .await
            .unwrap_err();

        assert_eq!(err.step, ReviewStep::Comment);
        assert!(err.data_committed());
        assert_eq!(err.completed.last(), Some(&ReviewStep::UpdateLabels));
        assert!(matches!(err.source, NavSphereError::Tracker(_)));

        // Labels were swapped before the failure; the issue stays open.
        let issue = workflow.tracker().inner.get_issue(42).await.expect("issue");
        assert_eq!(issue.labels, ["submission", "approved"]);
        assert_eq!(issue.state, IssueState::Open);
    }

    #[tokio::test]
    async fn failed_write_leaves_issue_pending() {
        let dir = tempfile::tempdir().expect("tempdir");
        let tracker = FailingTracker {
            inner: setup(dir.path()).await,
            fail: "write_data_file",
        };
        let workflow = ReviewWorkflow::new(tracker, config());

        let err = workflow
            .review(42, &ReviewAction::Approve)
            .await
            .unwrap_err();

        assert_eq!(err.step, ReviewStep::WriteDataFile);
        assert!(!err.data_committed());

        let issue = workflow.tracker().inner.get_issue(42).await.expect("issue");
        assert!(issue.labels.contains(&"pending".to_string()));
    }

    #[tokio::test]
    async fn custom_labels_are_used() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = config();
        config.labels = LabelsConfig {
            pending: "submission".into(),
            approved: "listed".into(),
            rejected: "declined".into(),
        };
        let workflow = ReviewWorkflow::new(setup(dir.path()).await, config);

        workflow
            .review(42, &ReviewAction::Reject { reason: None })
            .await
            .expect("reject");

        let issue = workflow.tracker().get_issue(42).await.expect("issue");
        assert_eq!(issue.labels, ["pending", "declined"]);
        assert!(issue.comments[0].contains("does not meet our listing criteria"));
    }

    #[test]
    fn swap_label_keeps_others_once() {
        let current = vec!["a".to_string(), "pending".into(), "approved".into()];
        assert_eq!(swap_label(&current, "pending", "approved"), ["a", "approved"]);
    }

    #[test]
    fn encode_rejects_documents_the_site_cannot_load() {
        let broken = serde_json::json!({ "navigationItems": [{ "id": "c" }] });
        assert!(encode_navigation(&broken).is_err());
    }
}
