//! The session manager: drives the state machine, keeps the vault in sync,
//! and publishes snapshots to observers.

use crate::machine::session_machine::{self, Input};
use crate::{SessionError, SessionResult};
use orbit_client::{ApiClient, AuthPayload, RegisterRequest};
use orbit_core::{CredentialPair, UserRecord};
use orbit_storage::TokenVault;
use rust_fsm::StateMachine;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

/// Current lifecycle state of the session.
pub type SessionStatus = session_machine::State;

/// Point-in-time view of the session.
#[derive(Debug, Clone)]
pub struct Session {
    pub status: SessionStatus,
    /// Cached user record. Present while `Authenticated`; kept through a
    /// profile-level `Failed` so the session can recover without a new
    /// login.
    pub user: Option<UserRecord>,
    /// Message of the most recent failure, cleared on the next attempt.
    pub last_error: Option<String>,
}

struct Inner {
    machine: StateMachine<session_machine::Impl>,
    user: Option<UserRecord>,
    last_error: Option<String>,
}

impl Inner {
    fn snapshot(&self) -> Session {
        Session {
            status: self.machine.state().clone(),
            user: self.user.clone(),
            last_error: self.last_error.clone(),
        }
    }

    fn consume(&mut self, input: &Input) -> SessionResult<()> {
        self.machine.consume(input).map_err(|_| {
            SessionError::Transition(format!(
                "{input:?} is not allowed in state {:?}",
                self.machine.state()
            ))
        })?;
        Ok(())
    }
}

/// Owns the session lifecycle.
///
/// Every mutating operation holds the inner lock for its full duration, so
/// concurrent calls (a login racing a logout, a double-tapped submit) are
/// serialized into a total order instead of interleaving their storage
/// writes.
pub struct SessionManager {
    api: ApiClient,
    vault: TokenVault,
    inner: Mutex<Inner>,
    updates: watch::Sender<Session>,
}

impl SessionManager {
    /// Create a manager starting in `Unauthenticated`.
    pub fn new(api: ApiClient, vault: TokenVault) -> Self {
        let inner = Inner {
            machine: StateMachine::new(),
            user: None,
            last_error: None,
        };
        let (updates, _) = watch::channel(inner.snapshot());
        Self {
            api,
            vault,
            inner: Mutex::new(inner),
            updates,
        }
    }

    /// Observe session snapshots. The receiver always holds the latest one.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.updates.subscribe()
    }

    /// Current session snapshot.
    pub async fn session(&self) -> Session {
        self.inner.lock().await.snapshot()
    }

    fn publish(&self, inner: &Inner) {
        self.updates.send_replace(inner.snapshot());
    }

    /// Rebuild the session from stored credentials at startup.
    ///
    /// Fails open: any problem (unreadable storage, no stored pair, a
    /// rejected or unreachable profile fetch) lands in `Unauthenticated`
    /// with no recorded error, and a stored pair the server rejected is
    /// cleared.
    pub async fn restore(&self) -> SessionResult<Session> {
        let mut inner = self.inner.lock().await;
        inner.consume(&Input::Restore)?;
        inner.last_error = None;
        self.publish(&inner);

        let stored = match self.vault.load().await {
            Ok(stored) => stored,
            Err(err) => {
                warn!(error = %err, "Could not read stored session, starting logged out");
                Default::default()
            }
        };

        if stored.pair.is_none() {
            debug!("No stored credentials");
            inner.consume(&Input::RestoreFailed)?;
            self.publish(&inner);
            return Ok(inner.snapshot());
        }

        match self.api.current_profile().await {
            Ok(user) => {
                if let Err(err) = self.vault.update_user(&user).await {
                    warn!(error = %err, "Could not refresh the stored user record");
                }
                inner.user = Some(user);
                inner.consume(&Input::RestoredSession)?;
                info!("Restored stored session");
            }
            Err(err) => {
                debug!(error = %err, "Stored session was rejected, starting logged out");
                if let Err(err) = self.vault.clear().await {
                    warn!(error = %err, "Could not clear the rejected session");
                }
                inner.user = None;
                inner.consume(&Input::RestoreFailed)?;
            }
        }
        self.publish(&inner);
        Ok(inner.snapshot())
    }

    /// Log in with email and password.
    ///
    /// On success the credential pair and user are persisted and the
    /// session becomes `Authenticated`; on failure the error message is
    /// recorded, the session moves to `Failed`, and the error re-raises.
    pub async fn login(&self, email: &str, password: &str) -> SessionResult<Session> {
        let mut inner = self.inner.lock().await;
        inner.consume(&Input::Authenticate)?;
        inner.last_error = None;
        self.publish(&inner);

        match self.api.login(email, password).await {
            Ok(payload) => self.complete_auth(&mut inner, payload).await,
            Err(err) => Err(self.fail_auth(&mut inner, err.into())),
        }
    }

    /// Register a new account. Same state handling as [`Self::login`].
    pub async fn register(&self, request: &RegisterRequest) -> SessionResult<Session> {
        let mut inner = self.inner.lock().await;
        inner.consume(&Input::Authenticate)?;
        inner.last_error = None;
        self.publish(&inner);

        match self.api.register(request).await {
            Ok(payload) => self.complete_auth(&mut inner, payload).await,
            Err(err) => Err(self.fail_auth(&mut inner, err.into())),
        }
    }

    /// End the session.
    ///
    /// The server-side logout is best-effort; local state always wins. The
    /// session is `Unauthenticated` afterwards even if clearing storage
    /// failed, in which case the storage error propagates.
    pub async fn logout(&self) -> SessionResult<Session> {
        let mut inner = self.inner.lock().await;
        inner.consume(&Input::Logout)?;
        inner.user = None;
        inner.last_error = None;

        let refresh_token = match self.vault.refresh_token().await {
            Ok(token) => token,
            Err(err) => {
                warn!(error = %err, "Could not read refresh token for server-side logout");
                None
            }
        };
        if let Some(token) = refresh_token {
            if let Err(err) = self.api.logout(&token).await {
                warn!(error = %err, "Server-side logout failed, clearing local session anyway");
            }
        }

        let cleared = self.vault.clear().await;
        self.publish(&inner);
        info!("Logged out");
        cleared?;
        Ok(inner.snapshot())
    }

    /// Re-fetch the profile of the authenticated user.
    ///
    /// On failure the cached user is kept, so `clear_error` can return the
    /// session to `Authenticated`.
    pub async fn refresh_profile(&self) -> SessionResult<Session> {
        let mut inner = self.inner.lock().await;
        self.require_authenticated(&inner)?;

        match self.api.current_profile().await {
            Ok(user) => {
                if let Err(err) = self.vault.update_user(&user).await {
                    warn!(error = %err, "Could not persist the refreshed user record");
                }
                inner.user = Some(user);
                inner.consume(&Input::ProfileUpdated)?;
                self.publish(&inner);
                Ok(inner.snapshot())
            }
            Err(err) => Err(self.fail_profile(&mut inner, err.into())),
        }
    }

    /// Upload a new profile picture and patch it onto the cached user.
    pub async fn upload_profile_picture(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> SessionResult<Session> {
        let mut inner = self.inner.lock().await;
        self.require_authenticated(&inner)?;

        match self.api.upload_profile_picture(file_name, bytes).await {
            Ok(image_url) => self.patch_picture(&mut inner, Some(image_url)).await,
            Err(err) => Err(self.fail_profile(&mut inner, err.into())),
        }
    }

    /// Remove the profile picture.
    pub async fn delete_profile_picture(&self) -> SessionResult<Session> {
        let mut inner = self.inner.lock().await;
        self.require_authenticated(&inner)?;

        match self.api.delete_profile_picture().await {
            Ok(()) => self.patch_picture(&mut inner, None).await,
            Err(err) => Err(self.fail_profile(&mut inner, err.into())),
        }
    }

    /// Acknowledge a recorded failure.
    ///
    /// Returns to `Authenticated` when a user is still cached, otherwise to
    /// `Unauthenticated`. Never modifies the cached user.
    pub async fn clear_error(&self) -> SessionResult<Session> {
        let mut inner = self.inner.lock().await;
        let input = if inner.user.is_some() {
            Input::ClearToAuthenticated
        } else {
            Input::ClearToUnauthenticated
        };
        inner.consume(&input)?;
        inner.last_error = None;
        self.publish(&inner);
        Ok(inner.snapshot())
    }

    /// Request a password reset email. No session state change.
    pub async fn forgot_password(&self, email: &str) -> SessionResult<()> {
        Ok(self.api.forgot_password(email).await?)
    }

    /// Complete a password reset with the emailed token. No session state
    /// change.
    pub async fn reset_password(&self, token: &str, password: &str) -> SessionResult<()> {
        Ok(self.api.reset_password(token, password).await?)
    }

    async fn complete_auth(
        &self,
        inner: &mut Inner,
        payload: AuthPayload,
    ) -> SessionResult<Session> {
        let pair = CredentialPair {
            access_token: payload.access_token,
            refresh_token: payload.refresh_token,
        };
        if let Err(err) = self.vault.save(&pair, &payload.user).await {
            return Err(self.fail_auth(inner, err.into()));
        }
        inner.user = Some(payload.user);
        inner.consume(&Input::Succeeded)?;
        self.publish(inner);
        info!("Authenticated");
        Ok(inner.snapshot())
    }

    /// Record a login/register failure. The cached user is dropped: the
    /// credentials on file no longer match what the caller attempted.
    fn fail_auth(&self, inner: &mut Inner, err: SessionError) -> SessionError {
        inner.user = None;
        self.fail(inner, err)
    }

    /// Record a profile-operation failure, keeping the cached user.
    fn fail_profile(&self, inner: &mut Inner, err: SessionError) -> SessionError {
        self.fail(inner, err)
    }

    fn fail(&self, inner: &mut Inner, err: SessionError) -> SessionError {
        inner.last_error = Some(err.to_string());
        if let Err(transition) = inner.consume(&Input::Failed) {
            return transition;
        }
        self.publish(inner);
        err
    }

    fn require_authenticated(&self, inner: &Inner) -> SessionResult<()> {
        if *inner.machine.state() != SessionStatus::Authenticated {
            return Err(SessionError::Transition(format!(
                "operation requires an authenticated session, state is {:?}",
                inner.machine.state()
            )));
        }
        Ok(())
    }

    async fn patch_picture(
        &self,
        inner: &mut Inner,
        image_url: Option<String>,
    ) -> SessionResult<Session> {
        if let Some(user) = inner.user.as_mut() {
            user.profile_picture = image_url;
            if let Err(err) = self.vault.update_user(user).await {
                warn!(error = %err, "Could not persist the updated profile picture");
            }
        }
        inner.consume(&Input::ProfileUpdated)?;
        self.publish(inner);
        Ok(inner.snapshot())
    }
}
