//! Authentication flow for the target site.
//!
//! Drives a small state machine: a validated stored session skips login
//! entirely; otherwise the login form is filled and submitted, and the
//! outcome is decided by racing navigation, a post-login landmark, and
//! inline error elements. Challenges that automation cannot solve block
//! on an external operator signal — the pipeline's contract is "pause
//! and resume", never "bypass".

use crate::config::AccountCredentials;
use crate::error::{LoginFailure, PipelineError};
use crate::navigation::{BlockReason, NavigationOutcome, Navigator, WaitMode, MAX_ATTEMPTS};
use crate::renderer::RenderContext;
use crate::session::{SessionCredentials, SessionStore};
use crate::site::SiteProfile;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Shared timeout for the post-submission outcome race.
const LOGIN_RACE_TIMEOUT_MS: u64 = 120_000;

/// How the flow resolved. Both variants mean the context is
/// authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    /// A stored session was applied; no login form was touched.
    SessionValid,
    /// A fresh login completed and its cookie jar was persisted.
    LoginSucceeded,
}

/// Flow states, traced as the machine advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthState {
    CheckingSession,
    SessionInvalid,
    SubmittingCredentials,
    AwaitingChallenge,
}

/// External coordination point for human-solved challenges.
///
/// The operator variant blocks without timeout until an explicit resume
/// trigger fires. The disabled variant waits a bounded grace period
/// (enough for someone at a visible browser window) and then gives up.
#[derive(Clone)]
pub enum ChallengeGate {
    Disabled { grace: Duration },
    Operator(Arc<Notify>),
}

/// Handle that resumes a flow parked on [`ChallengeGate::Operator`].
#[derive(Clone)]
pub struct ChallengeResume(Arc<Notify>);

impl ChallengeResume {
    /// Signal that the challenge has been solved.
    pub fn resume(&self) {
        self.0.notify_waiters();
        self.0.notify_one();
    }
}

impl ChallengeGate {
    /// Gate wired to an operator-triggered resume signal.
    pub fn operator() -> (Self, ChallengeResume) {
        let notify = Arc::new(Notify::new());
        (
            ChallengeGate::Operator(Arc::clone(&notify)),
            ChallengeResume(notify),
        )
    }

    /// Gate with no operator: wait `grace`, then treat the challenge as
    /// unresolved.
    pub fn disabled(grace: Duration) -> Self {
        ChallengeGate::Disabled { grace }
    }

    /// Park until the challenge is (possibly) solved.
    pub(crate) async fn wait(&self) {
        match self {
            ChallengeGate::Operator(notify) => {
                tracing::info!("challenge detected; waiting for operator resume signal");
                notify.notified().await;
                tracing::info!("operator resume signal received");
            }
            ChallengeGate::Disabled { grace } => {
                tracing::warn!(
                    grace_secs = grace.as_secs(),
                    "challenge detected with no operator gate; waiting grace period"
                );
                tokio::time::sleep(*grace).await;
            }
        }
    }
}

/// The authentication flow, bound to one site and one credential set.
pub struct AuthFlow<'a> {
    site: &'a SiteProfile,
    store: &'a SessionStore,
    credentials: &'a AccountCredentials,
    gate: &'a ChallengeGate,
}

impl<'a> AuthFlow<'a> {
    pub fn new(
        site: &'a SiteProfile,
        store: &'a SessionStore,
        credentials: &'a AccountCredentials,
        gate: &'a ChallengeGate,
    ) -> Self {
        Self {
            site,
            store,
            credentials,
            gate,
        }
    }

    /// Ensure the context is authenticated, logging in only when the
    /// stored session is absent or unusable.
    pub async fn run(&self, ctx: &mut dyn RenderContext) -> Result<AuthOutcome, PipelineError> {
        let mut state = AuthState::CheckingSession;
        tracing::debug!(?state, "authentication flow started");

        if let Some(stored) = self.store.load(self.site.id, self.site.session_cookie) {
            // Usable credentials are applied wholesale; no login surface
            // is visited and no form is ever filled.
            ctx.set_cookies(stored.cookies).await?;
            tracing::info!(site = self.site.id, "stored session applied");
            return Ok(AuthOutcome::SessionValid);
        }

        state = AuthState::SessionInvalid;
        tracing::debug!(?state, "no usable stored session, opening login surface");

        let navigator = Navigator::new(self.site);
        match navigator
            .open(ctx, self.site.login_url, WaitMode::DomReady)
            .await?
        {
            NavigationOutcome::Loaded => {}
            NavigationOutcome::TransientFailure(cause) => {
                return Err(PipelineError::Transport {
                    attempts: MAX_ATTEMPTS,
                    last_error: cause,
                });
            }
            NavigationOutcome::Blocked(BlockReason::Challenge) => {
                // Challenge before the form even renders. Park, then
                // continue: the form check below decides what is next.
                state = AuthState::AwaitingChallenge;
                tracing::debug!(?state, "challenge on login surface");
                self.gate.wait().await;
            }
            NavigationOutcome::Blocked(BlockReason::NotFound) => {
                return Err(PipelineError::Browser(anyhow::anyhow!(
                    "login surface unavailable: {}",
                    self.site.login_url
                )));
            }
        }

        if !ctx.exists(self.site.username_selector).await? {
            // The login page redirected straight through — the freshly
            // applied context (or a lingering browser profile) is
            // already authenticated.
            tracing::info!("no login form present, already authenticated");
            return Ok(AuthOutcome::SessionValid);
        }

        state = AuthState::SubmittingCredentials;
        tracing::debug!(?state, "filling credentials");

        ctx.fill(self.site.username_selector, &self.credentials.identifier)
            .await?;
        ctx.fill(self.site.password_selector, &self.credentials.secret)
            .await?;
        ctx.click(self.site.submit_selector).await?;

        // Race the three ways a submission can resolve under one shared
        // timeout; the first to complete decides which checks run next.
        let error_union = format!(
            "{}, {}",
            self.site.password_error_selector, self.site.username_error_selector
        );
        tokio::select! {
            _ = ctx.wait_for_navigation(LOGIN_RACE_TIMEOUT_MS) => {
                tracing::debug!("login race resolved by navigation");
            }
            _ = ctx.wait_for_selector(self.site.landmark_selector, LOGIN_RACE_TIMEOUT_MS) => {
                tracing::debug!("login race resolved by landmark element");
            }
            _ = ctx.wait_for_selector(&error_union, LOGIN_RACE_TIMEOUT_MS) => {
                tracing::debug!("login race resolved by inline error element");
            }
        }

        if ctx.exists(self.site.password_error_selector).await? {
            tracing::warn!("login rejected: bad password");
            return Err(PipelineError::Authentication(LoginFailure::BadPassword));
        }
        if ctx.exists(self.site.username_error_selector).await? {
            tracing::warn!("login rejected: bad identifier");
            return Err(PipelineError::Authentication(LoginFailure::BadIdentifier));
        }

        if ctx.exists(self.site.username_selector).await? {
            // No error, but still on the form: an interstitial challenge
            // is holding the submission. Park and re-check exactly once.
            state = AuthState::AwaitingChallenge;
            tracing::debug!(?state, "login form persisted after submission");
            self.gate.wait().await;

            if ctx.exists(self.site.username_selector).await? {
                return Err(PipelineError::Authentication(
                    LoginFailure::UnresolvedChallenge,
                ));
            }
        }

        // Persist the fresh cookie jar before reporting success so the
        // next run can skip login.
        let cookies = ctx.get_cookies().await?;
        self.store
            .save(self.site.id, &SessionCredentials::new(cookies));

        tracing::info!(site = self.site.id, "login succeeded");
        Ok(AuthOutcome::LoginSucceeded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_operator_gate_resumes_on_signal() {
        let (gate, resume) = ChallengeGate::operator();
        let waiter = tokio::spawn(async move { gate.wait().await });
        // Resume fires after the waiter parks (or queues a permit if not).
        resume.resume();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("gate did not resume")
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_gate_waits_grace_then_returns() {
        let gate = ChallengeGate::disabled(Duration::from_secs(30));
        let start = tokio::time::Instant::now();
        gate.wait().await;
        assert!(start.elapsed() >= Duration::from_secs(30));
    }
}
