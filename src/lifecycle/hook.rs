use super::{LifecycleError, Phase, Result};
use crate::module::{Module, TypeKey};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Runs a single lifecycle hook under the handler's timeout and cancellation.
///
/// Cancellation only applies to `initialize` and `load`: once stop begins,
/// every loaded module gets its `unload` call.
pub(crate) struct HookRunner {
    timeout: Option<Duration>,
    cancellation: CancellationToken,
}

impl HookRunner {
    pub(crate) fn new(timeout: Option<Duration>, cancellation: CancellationToken) -> Self {
        Self {
            timeout,
            cancellation,
        }
    }

    pub(crate) async fn run(&self, key: TypeKey, module: &dyn Module, phase: Phase) -> Result<()> {
        let cancellable = phase != Phase::Unload;
        if cancellable && self.cancellation.is_cancelled() {
            tracing::warn!("Skipping {} for {}: start was cancelled", phase, key);
            return Err(LifecycleError::cancelled(key, phase));
        }

        tracing::debug!("Running {}: {}", phase, key);

        let hook = match phase {
            Phase::Initialize => module.initialize(),
            Phase::Load => module.load(),
            Phase::Unload => module.unload(),
        };

        let guarded = async move {
            match self.timeout {
                Some(limit) => match tokio::time::timeout(limit, hook).await {
                    Ok(outcome) => outcome.map_err(|e| LifecycleError::hook_failed(key, phase, e)),
                    Err(_) => Err(LifecycleError::timed_out(key, phase, limit)),
                },
                None => hook
                    .await
                    .map_err(|e| LifecycleError::hook_failed(key, phase, e)),
            }
        };

        let result = if cancellable {
            tokio::select! {
                biased;
                _ = self.cancellation.cancelled() => Err(LifecycleError::cancelled(key, phase)),
                result = guarded => result,
            }
        } else {
            guarded.await
        };

        match &result {
            Ok(()) => tracing::debug!("Completed {}: {}", phase, key),
            Err(e) => tracing::error!("{}", e),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Sleepy;

    #[async_trait]
    impl Module for Sleepy {
        async fn initialize(&self) -> anyhow::Result<()> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }
    }

    struct Broken;

    #[async_trait]
    impl Module for Broken {
        async fn load(&self) -> anyhow::Result<()> {
            anyhow::bail!("disk full")
        }
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        let runner = HookRunner::new(Some(Duration::from_millis(20)), CancellationToken::new());
        let error = runner
            .run(TypeKey::of::<Sleepy>(), &Sleepy, Phase::Initialize)
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            LifecycleError::HookTimedOut {
                phase: Phase::Initialize,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_hook_error_is_wrapped() {
        let runner = HookRunner::new(None, CancellationToken::new());
        let error = runner
            .run(TypeKey::of::<Broken>(), &Broken, Phase::Load)
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            LifecycleError::HookFailed {
                phase: Phase::Load,
                ..
            }
        ));
        assert!(error.to_string().contains("disk full"));
    }

    #[tokio::test]
    async fn test_cancellation_interrupts_start_hooks_only() {
        let token = CancellationToken::new();
        let runner = HookRunner::new(None, token.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });
        let error = runner
            .run(TypeKey::of::<Sleepy>(), &Sleepy, Phase::Initialize)
            .await
            .unwrap_err();
        canceller.await.unwrap();
        assert!(matches!(error, LifecycleError::HookCancelled { .. }));

        assert!(
            runner
                .run(TypeKey::of::<Sleepy>(), &Sleepy, Phase::Unload)
                .await
                .is_ok()
        );
    }
}
