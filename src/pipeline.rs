//! Pipeline orchestration: one profile extraction end to end.
//!
//! Each invocation runs in its own browsing context, acquired on entry
//! and released on every exit path, success or failure. Stages run
//! strictly in order — authenticate, navigate, extract — and any failure
//! snapshots the page for diagnostics before the error propagates.

use crate::auth::{AuthFlow, ChallengeGate};
use crate::config::{AccountCredentials, RuntimeConfig};
use crate::diagnostics::DiagnosticsSink;
use crate::error::{LoginFailure, PipelineError};
use crate::extract::{ExtractionEngine, ProfileRecord};
use crate::navigation::{BlockReason, NavigationOutcome, Navigator, WaitMode, MAX_ATTEMPTS};
use crate::renderer::{RenderContext, Renderer};
use crate::session::SessionStore;
use crate::site::SiteProfile;

/// The extraction pipeline for one site, reusable across invocations.
pub struct ProfilePipeline {
    renderer: Box<dyn Renderer>,
    site: SiteProfile,
    store: SessionStore,
    diagnostics: DiagnosticsSink,
    credentials: AccountCredentials,
    gate: ChallengeGate,
    engine: ExtractionEngine,
}

impl ProfilePipeline {
    pub fn new(
        renderer: Box<dyn Renderer>,
        site: SiteProfile,
        config: &RuntimeConfig,
        credentials: AccountCredentials,
        gate: ChallengeGate,
    ) -> Self {
        Self {
            renderer,
            site,
            store: SessionStore::new(&config.session_dir),
            diagnostics: DiagnosticsSink::new(&config.diagnostics_dir),
            credentials,
            gate,
            engine: ExtractionEngine::default(),
        }
    }

    /// Swap in a custom strategy chain.
    pub fn with_engine(mut self, engine: ExtractionEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn site(&self) -> &SiteProfile {
        &self.site
    }

    pub fn session_store(&self) -> &SessionStore {
        &self.store
    }

    /// Extract one profile record.
    ///
    /// `Err(NotFound)` is the normal negative result (missing profile or
    /// nothing extractable); every other error is a pipeline fault. The
    /// browsing context is closed before this returns, on every path.
    pub async fn extract_profile(&self, url: &str) -> Result<ProfileRecord, PipelineError> {
        tracing::info!(url, site = self.site.id, "profile extraction started");

        let mut ctx = self.renderer.new_context().await?;
        let result = self.run(ctx.as_mut(), url).await;

        if let Err(err) = &result {
            // Snapshot before teardown; the page is about to disappear.
            self.diagnostics.capture(ctx.as_ref(), error_label(err)).await;
        }
        if let Err(e) = ctx.close().await {
            tracing::warn!(error = %e, "failed to close browsing context");
        }

        match &result {
            Ok(record) => tracing::info!(url, name = %record.name, "profile extraction finished"),
            Err(err) => tracing::warn!(url, error = %err, "profile extraction failed"),
        }
        result
    }

    async fn run(
        &self,
        ctx: &mut dyn RenderContext,
        url: &str,
    ) -> Result<ProfileRecord, PipelineError> {
        let flow = AuthFlow::new(&self.site, &self.store, &self.credentials, &self.gate);
        let outcome = flow.run(ctx).await?;
        tracing::debug!(?outcome, "authentication resolved");

        let navigator = Navigator::new(&self.site);
        let mut outcome = navigator.open(ctx, url, WaitMode::NetworkIdle).await?;

        if outcome == NavigationOutcome::Blocked(BlockReason::Challenge) {
            // A challenge can interpose even after login. Park once on
            // the gate, reload, and accept whatever classification the
            // second load produces.
            self.gate.wait().await;
            outcome = navigator.open(ctx, url, WaitMode::NetworkIdle).await?;
            if outcome == NavigationOutcome::Blocked(BlockReason::Challenge) {
                return Err(PipelineError::Authentication(
                    LoginFailure::UnresolvedChallenge,
                ));
            }
        }

        match outcome {
            NavigationOutcome::Loaded => {}
            NavigationOutcome::TransientFailure(cause) => {
                return Err(PipelineError::Transport {
                    attempts: MAX_ATTEMPTS,
                    last_error: cause,
                });
            }
            // Checked above; unreachable on the re-load path too.
            NavigationOutcome::Blocked(BlockReason::Challenge) => {
                return Err(PipelineError::Authentication(
                    LoginFailure::UnresolvedChallenge,
                ));
            }
            NavigationOutcome::Blocked(BlockReason::NotFound) => {
                // Fail fast: no extraction strategy runs against a
                // not-found page.
                tracing::info!(url, "target page does not exist");
                return Err(PipelineError::NotFound);
            }
        }

        let extraction = self.engine.extract(ctx, &self.site).await?;
        match extraction.record {
            Some(record) => Ok(record),
            None => {
                // A loaded page that yields nothing is a negative result,
                // not a fault.
                tracing::info!(
                    url,
                    attempted = ?extraction.attempted,
                    "no strategy produced a record"
                );
                Err(PipelineError::NotFound)
            }
        }
    }
}

fn error_label(err: &PipelineError) -> &'static str {
    match err {
        PipelineError::Configuration(_) => "configuration",
        PipelineError::Transport { .. } => "transport",
        PipelineError::Authentication(_) => "authentication",
        PipelineError::NotFound => "not-found",
        PipelineError::Browser(_) => "browser",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_labels_are_filename_safe() {
        let errs = [
            PipelineError::Configuration("x".into()),
            PipelineError::Transport {
                attempts: 3,
                last_error: "t".into(),
            },
            PipelineError::Authentication(LoginFailure::BadPassword),
            PipelineError::NotFound,
            PipelineError::Browser(anyhow::anyhow!("b")),
        ];
        for err in &errs {
            let label = error_label(err);
            assert!(label
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-'));
        }
    }
}
