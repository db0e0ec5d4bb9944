//! Logging targets.
//!
//! joblink uses the `tracing` crate for instrumentation and never installs a
//! subscriber itself. To see logs, install one in your application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("joblink_graphql::cache=trace,joblink_graphql=debug")
//!     .init();
//! ```
//!
//! Access tokens are never written to any log event.

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Client facade: dispatch and response handling.
    pub const CLIENT: &str = "joblink_graphql::client";
    /// Normalized result cache: hits, misses and writes.
    pub const CACHE: &str = "joblink_graphql::cache";
    /// HTTP transport.
    pub const TRANSPORT: &str = "joblink_graphql::transport";
    /// Credential injection.
    pub const AUTH: &str = "joblink_graphql::auth";
    /// Operation and fragment registration.
    pub const REGISTRY: &str = "joblink_graphql::registry";
}
