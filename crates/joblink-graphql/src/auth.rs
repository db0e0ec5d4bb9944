//! Credential injection.
//!
//! The [`AuthInterceptor`] asks a [`Session`] on every request whether the
//! caller is logged in and, if so, attaches `authorization: Bearer <token>`
//! with the token the session returns at that moment. Tokens are never
//! stored by the interceptor, so a rotated token is picked up by the next
//! request.

use std::sync::Arc;

use http::HeaderValue;
use http::header::AUTHORIZATION;
use parking_lot::RwLock;

use crate::logging::targets;
use crate::transport::OutgoingRequest;

/// External source of truth for the caller's authentication state.
pub trait Session: Send + Sync {
    /// Whether a caller is currently authenticated.
    fn is_logged_in(&self) -> bool;

    /// The current access token. Only consulted when logged in.
    fn access_token(&self) -> String;
}

impl<S: Session + ?Sized> Session for Arc<S> {
    fn is_logged_in(&self) -> bool {
        (**self).is_logged_in()
    }

    fn access_token(&self) -> String {
        (**self).access_token()
    }
}

/// A session that is never logged in.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl Session for Anonymous {
    fn is_logged_in(&self) -> bool {
        false
    }

    fn access_token(&self) -> String {
        String::new()
    }
}

/// A thread-safe token slot.
///
/// Share it through an `Arc` between the code that acquires tokens and the
/// client that sends them.
///
/// # Example
///
/// ```ignore
/// let session = Arc::new(SharedSession::new());
/// let client = Client::new(registry, session.clone(), transport);
///
/// session.login("token-1");
/// // ... requests carry "Bearer token-1"
/// session.login("token-2");
/// // ... requests now carry "Bearer token-2"
/// session.logout();
/// ```
#[derive(Debug, Default)]
pub struct SharedSession {
    token: RwLock<Option<String>>,
}

impl SharedSession {
    /// Create a logged-out session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session already holding a token.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }

    /// Store a token, replacing any previous one.
    pub fn login(&self, token: impl Into<String>) {
        *self.token.write() = Some(token.into());
    }

    /// Forget the token.
    pub fn logout(&self) {
        *self.token.write() = None;
    }
}

impl Session for SharedSession {
    fn is_logged_in(&self) -> bool {
        self.token.read().is_some()
    }

    fn access_token(&self) -> String {
        self.token.read().clone().unwrap_or_default()
    }
}

/// Attaches bearer credentials to outgoing requests.
#[derive(Debug, Clone)]
pub struct AuthInterceptor<S> {
    session: S,
}

impl<S: Session> AuthInterceptor<S> {
    /// Create an interceptor backed by a session.
    pub fn new(session: S) -> Self {
        Self { session }
    }

    /// The underlying session.
    pub fn session(&self) -> &S {
        &self.session
    }

    /// Attach `authorization: Bearer <token>` if the session is logged in.
    ///
    /// Never fails. A logged-out session, or a token that is not a valid
    /// header value, leaves the request unchanged.
    pub fn decorate(&self, mut request: OutgoingRequest) -> OutgoingRequest {
        if !self.session.is_logged_in() {
            tracing::trace!(target: targets::AUTH, "not logged in, sending anonymously");
            return request;
        }

        let token = self.session.access_token();
        match HeaderValue::try_from(format!("Bearer {token}")) {
            Ok(mut value) => {
                value.set_sensitive(true);
                request.headers.insert(AUTHORIZATION, value);
            }
            Err(_) => {
                tracing::warn!(
                    target: targets::AUTH,
                    "access token is not a valid header value, sending anonymously"
                );
            }
        }
        request
    }
}
