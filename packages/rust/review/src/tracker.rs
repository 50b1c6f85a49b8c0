//! The issue-tracker seam used by the review workflow.
//!
//! The tracker holds submission issues and the navigation data file. Any
//! backend that can fetch an issue, rewrite a file with an optimistic
//! revision check, and update labels/comments/state can drive a review.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

use navsphere_shared::{NavSphereError, Result};

/// Open/closed state of an issue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    #[default]
    Open,
    Closed,
}

/// A submission issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub state: IssueState,
    #[serde(default)]
    pub comments: Vec<String>,
}

/// Decoded contents of a stored file plus the revision it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFile {
    pub content: String,
    pub revision: String,
}

/// A file rewrite, accepted only if the stored file is still at `revision`.
#[derive(Debug, Clone, Copy)]
pub struct FileUpdate<'a> {
    pub path: &'a str,
    pub branch: &'a str,
    pub content: &'a str,
    pub revision: &'a str,
    pub message: &'a str,
}

/// Operations the review workflow needs from the tracker.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Fetch an issue by number.
    async fn get_issue(&self, number: u64) -> Result<Issue>;

    /// Read a data file as text.
    async fn read_data_file(&self, path: &str, branch: &str) -> Result<DataFile>;

    /// Rewrite a data file. Returns the new revision.
    async fn write_data_file(&self, update: FileUpdate<'_>) -> Result<String>;

    /// Replace the issue's labels.
    async fn set_labels(&self, number: u64, labels: &[String]) -> Result<()>;

    /// Post a comment on the issue.
    async fn add_comment(&self, number: u64, body: &str) -> Result<()>;

    /// Close the issue.
    async fn close_issue(&self, number: u64) -> Result<()>;
}

// ---------------------------------------------------------------------------
// LocalTracker
// ---------------------------------------------------------------------------

/// Filesystem-backed tracker.
///
/// Issues live at `<issues_dir>/<number>.json`; data file paths are resolved
/// against `data_root`. Revisions are SHA-256 digests of the file content.
/// Branches are not modelled.
#[derive(Debug, Clone)]
pub struct LocalTracker {
    issues_dir: PathBuf,
    data_root: PathBuf,
}

impl LocalTracker {
    pub fn new(issues_dir: impl Into<PathBuf>, data_root: impl Into<PathBuf>) -> Self {
        Self {
            issues_dir: issues_dir.into(),
            data_root: data_root.into(),
        }
    }

    fn issue_path(&self, number: u64) -> PathBuf {
        self.issues_dir.join(format!("{number}.json"))
    }

    fn data_path(&self, path: &str) -> PathBuf {
        self.data_root.join(path)
    }

    /// Store an issue, replacing any existing one with the same number.
    pub async fn save_issue(&self, issue: &Issue) -> Result<()> {
        tokio::fs::create_dir_all(&self.issues_dir)
            .await
            .map_err(|e| NavSphereError::io(&self.issues_dir, e))?;

        let path = self.issue_path(issue.number);
        let json = serde_json::to_string_pretty(issue)
            .map_err(|e| NavSphereError::parse(format!("encoding issue #{}: {e}", issue.number)))?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| NavSphereError::io(&path, e))
    }

    async fn update_issue(
        &self,
        number: u64,
        change: impl FnOnce(&mut Issue) + Send,
    ) -> Result<()> {
        let mut issue = self.get_issue(number).await?;
        change(&mut issue);
        self.save_issue(&issue).await
    }
}

#[async_trait]
impl IssueTracker for LocalTracker {
    #[instrument(skip(self))]
    async fn get_issue(&self, number: u64) -> Result<Issue> {
        let path = self.issue_path(number);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(NavSphereError::tracker(format!("issue #{number} not found")));
            }
            Err(e) => return Err(NavSphereError::io(&path, e)),
        };

        serde_json::from_str(&content)
            .map_err(|e| NavSphereError::parse(format!("{}: {e}", path.display())))
    }

    #[instrument(skip(self))]
    async fn read_data_file(&self, path: &str, branch: &str) -> Result<DataFile> {
        let full = self.data_path(path);
        let content = read_text(&full).await?;
        debug!(bytes = content.len(), "data file read");

        Ok(DataFile {
            revision: revision_of(&content),
            content,
        })
    }

    #[instrument(skip_all, fields(path = update.path, branch = update.branch))]
    async fn write_data_file(&self, update: FileUpdate<'_>) -> Result<String> {
        let full = self.data_path(update.path);

        let current = read_text(&full).await?;
        if revision_of(&current) != update.revision {
            return Err(NavSphereError::tracker(format!(
                "{} changed since it was read (expected revision {})",
                update.path, update.revision
            )));
        }

        tokio::fs::write(&full, update.content)
            .await
            .map_err(|e| NavSphereError::io(&full, e))?;
        debug!(message = update.message, "data file written");

        Ok(revision_of(update.content))
    }

    async fn set_labels(&self, number: u64, labels: &[String]) -> Result<()> {
        self.update_issue(number, |issue| issue.labels = labels.to_vec())
            .await
    }

    async fn add_comment(&self, number: u64, body: &str) -> Result<()> {
        self.update_issue(number, |issue| issue.comments.push(body.to_string()))
            .await
    }

    async fn close_issue(&self, number: u64) -> Result<()> {
        self.update_issue(number, |issue| issue.state = IssueState::Closed)
            .await
    }
}

async fn read_text(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| NavSphereError::io(path, e))
}

/// Compute the SHA-256 revision of file content.
fn revision_of(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(number: u64) -> Issue {
        Issue {
            number,
            title: "[Submission] Example".into(),
            body: String::new(),
            labels: vec!["pending".into()],
            state: IssueState::Open,
            comments: vec![],
        }
    }

    #[tokio::test]
    async fn issue_roundtrip_and_updates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let tracker = LocalTracker::new(dir.path().join("issues"), dir.path());

        tracker.save_issue(&issue(7)).await.expect("save");
        tracker
            .set_labels(7, &["approved".to_string()])
            .await
            .expect("labels");
        tracker.add_comment(7, "looks good").await.expect("comment");
        tracker.close_issue(7).await.expect("close");

        let stored = tracker.get_issue(7).await.expect("get");
        assert_eq!(stored.labels, ["approved"]);
        assert_eq!(stored.comments, ["looks good"]);
        assert_eq!(stored.state, IssueState::Closed);
    }

    #[tokio::test]
    async fn missing_issue_is_tracker_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let tracker = LocalTracker::new(dir.path(), dir.path());
        let err = tracker.get_issue(404).await.unwrap_err();
        assert!(matches!(err, NavSphereError::Tracker(_)));
        assert!(err.to_string().contains("#404"));
    }

    #[tokio::test]
    async fn write_checks_revision() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("nav.json"), "{}").expect("seed");
        let tracker = LocalTracker::new(dir.path(), dir.path());

        let file = tracker.read_data_file("nav.json", "main").await.expect("read");
        assert_eq!(file.content, "{}");
        assert_eq!(file.revision.len(), 64);

        let new_revision = tracker
            .write_data_file(FileUpdate {
                path: "nav.json",
                branch: "main",
                content: "{\"a\":1}",
                revision: &file.revision,
                message: "update",
            })
            .await
            .expect("write");
        assert_ne!(new_revision, file.revision);

        // Writing again against the stale revision must fail.
        let err = tracker
            .write_data_file(FileUpdate {
                path: "nav.json",
                branch: "main",
                content: "{\"a\":2}",
                revision: &file.revision,
                message: "update",
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("changed since it was read"));

        let on_disk = std::fs::read_to_string(dir.path().join("nav.json")).expect("read back");
        assert_eq!(on_disk, "{\"a\":1}");
    }
}
