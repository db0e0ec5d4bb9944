//! Prelude module for Joblink.
//!
//! ```ignore
//! use joblink::prelude::*;
//! ```

// ============================================================================
// Job Board
// ============================================================================

pub use crate::JobBoard;
pub use crate::model::{Company, CompanySummary, CreateJobInput, Job, JobSummary};

// ============================================================================
// Sessions
// ============================================================================

pub use joblink_graphql::{Anonymous, Session, SharedSession};

// ============================================================================
// Errors
// ============================================================================

pub use joblink_graphql::{Error, Result};
