//! Joblink - a typed client for the job board GraphQL service.
//!
//! This is the main crate: it adds the job board's operations and domain
//! types on top of [`joblink_graphql`], which it re-exports.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use joblink::{CreateJobInput, JobBoard, SharedSession};
//!
//! # async fn run() -> joblink::Result<()> {
//! let session = Arc::new(SharedSession::with_token("token"));
//! let board = JobBoard::connect(joblink::DEFAULT_ENDPOINT, session)?;
//!
//! let job = board.create_job(CreateJobInput::new("Engineer")).await?;
//! let company = board.load_company("c1").await?;
//! # Ok(())
//! # }
//! ```

mod board;
pub mod model;
pub mod operations;

pub mod prelude;

pub use joblink_graphql::*;
pub use joblink_graphql::transport::DEFAULT_ENDPOINT;

pub use board::JobBoard;
pub use model::{Company, CompanySummary, CreateJobInput, Job, JobSummary};
