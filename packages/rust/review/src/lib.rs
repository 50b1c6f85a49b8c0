//! Community submission review for NavSphere.
//!
//! Submissions arrive as issues on an external tracker that doubles as the
//! store for `navigation.json`. This crate provides:
//! - [`submission`]: decoding a submission from an issue body
//! - [`splice`]: inserting an approved submission into the navigation document
//! - [`tracker`]: the [`IssueTracker`] seam and a filesystem-backed [`LocalTracker`]
//! - [`workflow`]: the ordered approve/reject sequence with per-step errors

pub mod splice;
pub mod submission;
pub mod tracker;
pub mod workflow;

pub use splice::{Placement, insert_submission, new_link_item};
pub use submission::{Submission, parse_submission_from_issue_body, render_issue_body};
pub use tracker::{DataFile, FileUpdate, Issue, IssueState, IssueTracker, LocalTracker};
pub use workflow::{ReviewAction, ReviewError, ReviewOutcome, ReviewStep, ReviewWorkflow};
