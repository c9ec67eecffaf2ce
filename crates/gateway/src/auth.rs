//! Login signing and authorization state

use crate::config::Credentials;
use crate::error::GatewayError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use okws_core::WsRequest;
use parking_lot::Mutex;
use sha2::Sha256;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

type HmacSha256 = Hmac<Sha256>;

/// Method and path signed by a socket login
pub const LOGIN_METHOD: &str = "GET";
pub const LOGIN_PATH: &str = "/users/self/verify";

/// HMAC-SHA256 signer holding the secret only as keying material
#[derive(Clone)]
pub struct Signer {
    key: Vec<u8>,
}

impl Signer {
    pub fn new(secret: &str) -> Self {
        Self {
            key: secret.as_bytes().to_vec(),
        }
    }

    /// `base64(HMAC-SHA256(secret, message))`
    pub fn sign(&self, message: &str) -> Result<String, GatewayError> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| GatewayError::Signing(format!("Failed to create HMAC: {e}")))?;
        mac.update(message.as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }

    /// Sign `timestamp + method + path`
    pub fn sign_at(&self, timestamp: &str, method: &str, path: &str) -> Result<String, GatewayError> {
        self.sign(&format!("{timestamp}{method}{path}"))
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Signer(<redacted>)")
    }
}

/// Current time as decimal unix seconds
pub fn unix_timestamp() -> String {
    chrono::Utc::now().timestamp().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Unauthenticated,
    /// A login was sent and is awaiting confirmation
    Pending,
    Authorized,
}

/// What an inbound `login` event means for the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    Authorized,
    /// No request outstanding, or it is older than the throttle window;
    /// the confirmation must not be trusted
    Stale,
}

#[derive(Debug)]
struct AuthInner {
    status: AuthStatus,
    requested_at: Option<Instant>,
}

/// Authorization flag and last request time, shared by the login caller,
/// the receive loop and anyone waiting for authorization
#[derive(Debug)]
pub struct AuthState {
    inner: Mutex<AuthInner>,
    throttle: Duration,
}

impl AuthState {
    pub fn new(throttle: Duration) -> Self {
        Self {
            inner: Mutex::new(AuthInner {
                status: AuthStatus::Unauthenticated,
                requested_at: None,
            }),
            throttle,
        }
    }

    /// Claim the right to send a login. Returns false when already
    /// authorized or when a login went out less than `throttle` ago.
    pub fn try_begin_login(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.status == AuthStatus::Authorized {
            return false;
        }
        if let Some(at) = inner.requested_at {
            if at.elapsed() < self.throttle {
                return false;
            }
        }
        inner.status = AuthStatus::Pending;
        inner.requested_at = Some(Instant::now());
        true
    }

    /// Handle a successful login confirmation
    pub fn confirm_login(&self) -> LoginOutcome {
        let mut inner = self.inner.lock();
        match inner.requested_at {
            Some(at) if at.elapsed() <= self.throttle => {
                inner.status = AuthStatus::Authorized;
                LoginOutcome::Authorized
            }
            _ => {
                inner.status = AuthStatus::Unauthenticated;
                inner.requested_at = None;
                LoginOutcome::Stale
            }
        }
    }

    /// Login rejected; the throttle window still applies
    pub fn reject_login(&self) {
        let mut inner = self.inner.lock();
        if inner.status == AuthStatus::Pending {
            inner.status = AuthStatus::Unauthenticated;
        }
    }

    pub fn mark_authorized(&self) {
        self.inner.lock().status = AuthStatus::Authorized;
    }

    pub fn is_authorized(&self) -> bool {
        self.inner.lock().status == AuthStatus::Authorized
    }

    pub fn status(&self) -> AuthStatus {
        self.inner.lock().status
    }

    /// Forget everything; called when the connection is replaced
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.status = AuthStatus::Unauthenticated;
        inner.requested_at = None;
    }
}

/// Builds throttled login operations from the configured credentials
pub struct Authenticator {
    api_key: String,
    passphrase: String,
    signer: Signer,
    state: AuthState,
}

impl Authenticator {
    pub fn new(credentials: &Credentials, throttle: Duration) -> Self {
        Self {
            api_key: credentials.api_key.clone(),
            passphrase: credentials.passphrase.clone(),
            signer: Signer::new(&credentials.secret_key),
            state: AuthState::new(throttle),
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    /// Signed login operation for the current second
    pub fn signed_login(&self) -> Result<WsRequest, GatewayError> {
        let timestamp = unix_timestamp();
        let sign = self.signer.sign_at(&timestamp, LOGIN_METHOD, LOGIN_PATH)?;
        Ok(WsRequest::login(&self.api_key, &self.passphrase, &timestamp, &sign))
    }

    /// A login to send now, or `None` when authorized or throttled
    pub fn login_request(&self) -> Result<Option<WsRequest>, GatewayError> {
        self.login_request_with(|| self.signed_login())
    }

    /// Sign only once the throttle admits a login; a signing failure gives
    /// the slot back
    fn login_request_with<F>(&self, sign: F) -> Result<Option<WsRequest>, GatewayError>
    where
        F: FnOnce() -> Result<WsRequest, GatewayError>,
    {
        if !self.state.try_begin_login() {
            return Ok(None);
        }
        match sign() {
            Ok(req) => Ok(Some(req)),
            Err(e) => {
                self.state.reset();
                Err(e)
            }
        }
    }
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authenticator")
            .field("api_key", &self.api_key)
            .field("status", &self.state.status())
            .finish_non_exhaustive()
    }
}
