//! Rebuilds for the dev server.

use crate::dev::{AssetCache, DevEvent, SharedState};
use crate::ui;
use kiln_pipeline::{BuildMode, BuildOutcome, Builder, Error, KilnConfig};
use std::path::PathBuf;

/// Runs development builds and publishes their results into the shared state.
#[derive(Debug, Clone)]
pub struct DevRunner {
    builder: Builder,
}

impl DevRunner {
    /// Runner for `config` (already materialized or not) in development mode.
    pub fn new(config: KilnConfig, root: impl Into<PathBuf>, write_to_disk: bool) -> Self {
        Self {
            builder: Builder::new(config, root, BuildMode::Development).write_to_disk(write_to_disk),
        }
    }

    pub fn builder(&self) -> &Builder {
        &self.builder
    }

    /// Run one build as a new generation.
    ///
    /// Any build still running is cancelled first. Returns the event sent to
    /// clients, or `None` if this build was itself superseded before it
    /// could publish.
    pub async fn rebuild(&self, state: &SharedState) -> Option<DevEvent> {
        let (generation, token) = state.begin_build();
        state.broadcast(&DevEvent::BuildStarted { generation });

        let builder = self.builder.clone().cancel_token(token);
        let joined = tokio::task::spawn_blocking(move || builder.build()).await;

        let (event, applied) = match joined {
            Err(err) => {
                let errors = vec![format!("build task failed: {err}")];
                let applied = state.fail_build(generation, errors.clone(), None);
                (DevEvent::BuildFailed { generation, errors }, applied)
            }
            Ok(Err(Error::Cancelled)) => {
                tracing::debug!(generation, "build superseded");
                return None;
            }
            Ok(Err(err)) => {
                let errors = vec![err.to_string()];
                let applied = state.fail_build(generation, errors.clone(), None);
                (DevEvent::BuildFailed { generation, errors }, applied)
            }
            Ok(Ok(result)) => {
                let cache = AssetCache::from_assets(&result.assets, state.dev_config());
                let duration_ms = u64::try_from(result.duration.as_millis()).unwrap_or(u64::MAX);

                if result.outcome == BuildOutcome::Success {
                    let assets = cache.len();
                    let applied = state.complete_build(generation, cache, duration_ms);
                    (
                        DevEvent::BuildCompleted {
                            generation,
                            duration_ms,
                            assets,
                        },
                        applied,
                    )
                } else {
                    let errors: Vec<String> = result.errors.iter().map(ToString::to_string).collect();
                    // A build that produced nothing keeps the last good artifacts.
                    let cache = (!cache.is_empty()).then_some(cache);
                    let applied = state.fail_build(generation, errors.clone(), cache);
                    (DevEvent::BuildFailed { generation, errors }, applied)
                }
            }
        };

        if !applied {
            tracing::debug!(generation, "discarding result of superseded build");
            return None;
        }

        match &event {
            DevEvent::BuildCompleted { duration_ms, assets, .. } => {
                ui::success(&format!("Rebuilt {assets} asset(s) in {duration_ms}ms"));
            }
            DevEvent::BuildFailed { errors, .. } => {
                for error in errors {
                    ui::error(error);
                }
            }
            DevEvent::BuildStarted { .. } => {}
        }

        state.broadcast(&event);
        Some(event)
    }
}
