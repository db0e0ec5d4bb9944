//! Job board domain types.

use serde::{Deserialize, Serialize};

/// A job posting.
///
/// `description` is absent when the job was loaded through a listing that
/// does not select it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Job identifier.
    pub id: String,
    /// Job title.
    pub title: String,
    /// Long-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// The hiring company.
    #[serde(default)]
    pub company: Option<CompanySummary>,
}

/// The company fields embedded in a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanySummary {
    /// Company identifier.
    pub id: String,
    /// Company name.
    pub name: String,
}

/// A company with its open positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    /// Company identifier.
    pub id: String,
    /// Company name.
    pub name: String,
    /// Long-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Jobs posted by the company.
    #[serde(default)]
    pub jobs: Vec<JobSummary>,
}

/// The job fields embedded in a company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    /// Job identifier.
    pub id: String,
    /// Job title.
    pub title: String,
}

/// Input for posting a new job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobInput {
    /// Job title.
    pub title: String,
    /// Long-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CreateJobInput {
    /// Create an input with only a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
        }
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
