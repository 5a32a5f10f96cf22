//! Run orchestration
//!
//! This module sequences a run over the community list and exposes the
//! control boundary a shell talks to:
//! - `Orchestrator` walks communities in order and aggregates counts
//! - `Runner` refuses overlapping runs and spawns one worker per run
//! - `RunHandle` carries the stop switch, the event stream and the result
//!
//! Cancellation is polled between communities only. A community that has
//! started is always walked to the end.

use crate::api::{Gateway, HttpTransport, Transport};
use crate::community::Resolver;
use crate::config::{validate_params, Config, LimitsConfig, RunParams};
use crate::crawler::Walker;
use crate::output::{CommunityReport, Reporter, RunEvent, RunSummary};
use crate::state::{RunControl, RunPhase, RunState};
use crate::{RelinkError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Sequences one run over the community list
pub struct Orchestrator {
    gateway: Gateway,
    limits: LimitsConfig,
    control: Arc<RunControl>,
}

impl Orchestrator {
    /// Creates an orchestrator
    ///
    /// Progress goes to the gateway's reporter. `control` should be fresh for
    /// every run.
    pub fn new(gateway: Gateway, limits: LimitsConfig, control: Arc<RunControl>) -> Self {
        Self {
            gateway,
            limits,
            control,
        }
    }

    pub fn control(&self) -> &Arc<RunControl> {
        &self.control
    }

    /// Runs the whole sequence and returns the summary
    ///
    /// The terminal [`RunEvent::Finished`] is always emitted, whatever
    /// happened to the individual communities.
    pub async fn run(&self, params: &RunParams) -> RunSummary {
        let reporter = self.gateway.reporter();
        let mut state = RunState::new(params.communities.len());

        if let Err(e) = self.control.transition(RunPhase::Running) {
            reporter.error(format!("Cannot start run: {}", e));
            return self.finish(state);
        }

        reporter.info(format!(
            "Starting link replacement: {} -> {}",
            params.old_link, params.new_link
        ));
        reporter.info(format!("{} communities queued", params.communities.len()));

        let pause = self.limits.community_pause();
        for (index, raw) in params.communities.iter().enumerate() {
            if index > 0 && !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }

            if self.control.is_cancelled() {
                reporter.warn("Stopped by user");
                state.mark_stopped();
                break;
            }

            reporter.info(format!(
                "[{}/{}] {}",
                index + 1,
                params.communities.len(),
                raw
            ));

            let community = match Resolver::new(&self.gateway).resolve(raw).await {
                Ok(community) => community,
                Err(e) => {
                    state.record(CommunityReport::unresolved(raw.as_str(), e.to_string()));
                    continue;
                }
            };

            let walker = Walker::new(
                &self.gateway,
                &self.limits,
                &params.old_link,
                &params.new_link,
            );
            let report = walker
                .crawl_community(&community.raw, community.owner_id)
                .await;
            state.record(report);
        }

        self.finish(state)
    }

    fn finish(&self, state: RunState) -> RunSummary {
        let reporter = self.gateway.reporter();
        if let Err(e) = self.control.transition(RunPhase::Done) {
            tracing::debug!("Run ended outside the running phase: {}", e);
        }

        let summary = state.into_summary();
        reporter.info(format!("Done. {}", summary));
        reporter.finish(summary.clone());
        summary
    }
}

/// Clears the active flag when a run's worker ends, however it ends
struct ActiveGuard(Arc<AtomicBool>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Starts runs, at most one at a time
pub struct Runner {
    config: Config,
    active: Arc<AtomicBool>,
}

impl Runner {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Starts a run against the configured HTTP endpoint
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Returns
    ///
    /// * `Ok(RunHandle)` - The worker was spawned
    /// * `Err(RelinkError::RunActive)` - Another run has not finished yet
    /// * `Err(RelinkError::Config)` - Missing token, empty links or no communities
    pub fn start(&self, params: RunParams) -> Result<RunHandle> {
        let guard = self.acquire()?;
        validate_params(&params)?;
        let transport = HttpTransport::new(&self.config.api, params.token.clone())?;
        Ok(self.spawn(params, Arc::new(transport), guard))
    }

    /// Starts a run over an arbitrary transport
    pub fn start_with_transport(
        &self,
        params: RunParams,
        transport: Arc<dyn Transport>,
    ) -> Result<RunHandle> {
        let guard = self.acquire()?;
        validate_params(&params)?;
        Ok(self.spawn(params, transport, guard))
    }

    fn acquire(&self) -> Result<ActiveGuard> {
        self.active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| RelinkError::RunActive)?;
        Ok(ActiveGuard(self.active.clone()))
    }

    fn spawn(
        &self,
        params: RunParams,
        transport: Arc<dyn Transport>,
        guard: ActiveGuard,
    ) -> RunHandle {
        let (reporter, events) = Reporter::channel();
        let control = Arc::new(RunControl::new());
        // Fresh window and backoff state for every run
        let gateway = Gateway::new(transport, &self.config.limits, &self.config.retry, reporter);
        let orchestrator =
            Orchestrator::new(gateway, self.config.limits.clone(), control.clone());

        let worker = tokio::spawn(async move {
            let summary = orchestrator.run(&params).await;
            drop(guard);
            summary
        });

        RunHandle {
            control,
            events,
            worker,
        }
    }
}

/// Handle to a started run
pub struct RunHandle {
    control: Arc<RunControl>,
    events: mpsc::UnboundedReceiver<RunEvent>,
    worker: JoinHandle<RunSummary>,
}

impl RunHandle {
    /// Requests the run to stop before its next community
    pub fn stop(&self) {
        self.control.request_stop();
    }

    /// Shared control, for stopping the run from another task
    pub fn control(&self) -> Arc<RunControl> {
        self.control.clone()
    }

    pub fn phase(&self) -> RunPhase {
        self.control.phase()
    }

    /// Next progress event; `None` once the stream has ended
    pub async fn next_event(&mut self) -> Option<RunEvent> {
        self.events.recv().await
    }

    /// Waits for the worker and returns the summary
    ///
    /// Events not read so far are discarded, and later ones are no longer
    /// buffered.
    pub async fn wait(self) -> Result<RunSummary> {
        let RunHandle { worker, events, .. } = self;
        drop(events);
        worker.await.map_err(|e| RelinkError::Worker(e.to_string()))
    }
}
