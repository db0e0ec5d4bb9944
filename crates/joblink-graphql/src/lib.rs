//! Typed GraphQL client for joblink.
//!
//! This crate provides the client-side pieces needed to talk to a GraphQL
//! service:
//!
//! - **Operation registry**: named queries, mutations and fragments, with
//!   fragment composition checked at registration time
//! - **Auth interceptor**: `Authorization: Bearer` from a [`Session`],
//!   read fresh on every request
//! - **Transport**: JSON over HTTP POST to one endpoint via reqwest
//! - **Result cache**: normalized by `__typename` and `id`, shared by every
//!   query that references the same entity
//! - **Client**: `query` and `mutate` orchestrating the above
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use joblink_graphql::{Client, Fragment, HttpTransport, Operation, OperationRegistry, SharedSession};
//!
//! let mut registry = OperationRegistry::new();
//! registry.register_fragment(Fragment::new(
//!     "JobDetail",
//!     "fragment JobDetail on Job { __typename id title }",
//! ))?;
//! registry.register_operation(Operation::query(
//!     "JobQuery",
//!     "query JobQuery($id: ID!) { job(id: $id) { ...JobDetail } }",
//! ))?;
//!
//! let session = Arc::new(SharedSession::new());
//! let client = Client::new(registry, session.clone(), HttpTransport::new("http://localhost:9000/graphql")?);
//!
//! session.login(token);
//! let response = client.query("JobQuery", json!({"id": "1"})).await?;
//! let job: Job = response.field("job")?;
//! ```

pub mod auth;
pub mod cache;
mod client;
mod error;
pub mod logging;
pub mod registry;
pub mod transport;

pub use error::{Error, Result, TransportError};

// Re-export commonly used types at the crate root
pub use auth::{Anonymous, AuthInterceptor, Session, SharedSession};
pub use cache::{CacheLookup, EntityKey, ResultCache};
pub use client::{Client, Response, ResponseSource};
pub use registry::{FetchPolicy, Fragment, Operation, OperationKind, OperationRegistry};
pub use transport::{
    GraphQLError, GraphQLRequest, GraphQLResponse, HttpTransport, HttpTransportBuilder,
    OutgoingRequest, Transport, TransportConfig,
};
