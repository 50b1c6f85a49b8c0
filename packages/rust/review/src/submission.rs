//! Submission payloads carried in issue bodies.
//!
//! The submission form files an issue whose body contains a fenced
//! ```` ```json ```` block with the submitted site. Free text around the
//! block is ignored.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

/// A site proposed for the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
    /// Category id or title.
    pub category: String,
    /// Subcategory id or title, if the submitter picked one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
}

/// Matches a fenced JSON block and captures its contents.
static JSON_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```json[ \t]*\r?\n(.*?)```").expect("json block regex")
});

/// Extract the first well-formed submission from an issue body.
///
/// Returns `None` when no block decodes, the title is blank, or the URL is
/// not an absolute http(s) URL.
pub fn parse_submission_from_issue_body(body: &str) -> Option<Submission> {
    JSON_BLOCK_RE
        .captures_iter(body)
        .filter_map(|caps| {
            let block = caps.get(1)?.as_str();
            match serde_json::from_str::<Submission>(block) {
                Ok(submission) => Some(submission),
                Err(e) => {
                    debug!(error = %e, "skipping undecodable json block");
                    None
                }
            }
        })
        .map(tidy)
        .find(is_acceptable)
}

/// Render the issue body the submission form would file.
pub fn render_issue_body(submission: &Submission) -> String {
    let json = serde_json::to_string_pretty(submission).unwrap_or_default();
    format!(
        "**{}** was submitted for the directory.\n\n```json\n{json}\n```\n",
        submission.title
    )
}

fn tidy(mut submission: Submission) -> Submission {
    submission.title = submission.title.trim().to_string();
    submission.url = submission.url.trim().to_string();
    submission.description = submission.description.trim().to_string();
    submission.category = submission.category.trim().to_string();
    submission.subcategory = submission
        .subcategory
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    submission
}

fn is_acceptable(submission: &Submission) -> bool {
    if submission.title.is_empty() {
        return false;
    }

    match Url::parse(&submission.url) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}
