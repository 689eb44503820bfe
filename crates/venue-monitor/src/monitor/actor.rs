//! Single-writer monitor actor.
//!
//! ```text
//! MonitorHandle ──┐
//! sample ticker ──┼──► mpsc ──► MonitorActor (owns MonitorState)
//! watchdog ticker ┘                │
//!        ▲                         ├─ spawn planner call ──┐
//!        │                         └─ spawn alert send  ───┤
//!        └──────────── PlanReady / AlertCompleted ◄────────┘
//! ```
//!
//! The tickers and effect tasks hold weak senders, so dropping every
//! [`MonitorHandle`] closes the channel and ends the actor.

use std::sync::Arc;
use std::time::{Duration, Instant};

use escalation_core::{CrowdCounter, GateDecision, GridSampler, MonitorError};
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::snapshot::MonitorSnapshot;
use super::state::{Effect, MonitorState};
use crate::collaborators::{Collaborators, Planner};
use crate::config::MonitorConfig;
use crate::dispatcher::{AlertDispatcher, DispatchReport};

const COMMAND_QUEUE_DEPTH: usize = 64;

enum Command {
    Start { reply: oneshot::Sender<bool> },
    Stop { reply: oneshot::Sender<bool> },
    SampleTick,
    WatchdogTick,
    ManualDispatch { reply: oneshot::Sender<GateDecision> },
    InjectSurge { reply: oneshot::Sender<()> },
    RefreshPlan { reply: oneshot::Sender<bool> },
    PlanReady {
        generation: u64,
        result: Result<String, MonitorError>,
    },
    AlertCompleted {
        generation: u64,
        report: Box<DispatchReport>,
    },
    Snapshot { reply: oneshot::Sender<MonitorSnapshot> },
    Shutdown { reply: oneshot::Sender<()> },
}

/// Monotonic clock reading that follows tokio's (possibly paused) clock.
fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

/// Cloneable front door to a running monitor.
#[derive(Clone)]
pub struct MonitorHandle {
    commands: mpsc::Sender<Command>,
}

impl MonitorHandle {
    /// Start both schedules. `Ok(false)` if already monitoring.
    pub async fn start(&self) -> Result<bool, MonitorError> {
        self.request(|reply| Command::Start { reply }).await
    }

    /// Stop both schedules. `Ok(false)` if not monitoring.
    pub async fn stop(&self) -> Result<bool, MonitorError> {
        self.request(|reply| Command::Stop { reply }).await
    }

    /// Operator-authorized dispatch through the shared cooldown gate.
    pub async fn manual_dispatch(&self) -> Result<GateDecision, MonitorError> {
        self.request(|reply| Command::ManualDispatch { reply }).await
    }

    pub async fn inject_surge(&self) -> Result<(), MonitorError> {
        self.request(|reply| Command::InjectSurge { reply }).await
    }

    /// `Ok(false)` when a plan request is already in flight.
    pub async fn refresh_plan(&self) -> Result<bool, MonitorError> {
        self.request(|reply| Command::RefreshPlan { reply }).await
    }

    pub async fn snapshot(&self) -> Result<MonitorSnapshot, MonitorError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Stop the actor. In-flight collaborator calls finish but are ignored.
    pub async fn shutdown(&self) -> Result<(), MonitorError> {
        self.request(|reply| Command::Shutdown { reply }).await
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, MonitorError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(make(reply))
            .await
            .map_err(|_| MonitorError::MonitorStopped)?;
        response.await.map_err(|_| MonitorError::MonitorStopped)
    }
}

/// Boot a monitor actor on the current tokio runtime.
///
/// The boot sequence runs before this returns; monitoring itself begins on
/// [`MonitorHandle::start`].
pub fn spawn_monitor(
    config: &MonitorConfig,
    sampler: Box<dyn GridSampler>,
    collaborators: Collaborators,
) -> MonitorHandle {
    let (tx, rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
    let counter = match config.sampler_seed {
        Some(seed) => CrowdCounter::seeded(seed),
        None => CrowdCounter::new(),
    };

    let mut state = MonitorState::new(config, sampler.name(), counter);
    state.boot();

    let actor = MonitorActor {
        state,
        sampler,
        planner: collaborators.planner,
        dispatcher: AlertDispatcher::new(
            collaborators.transport,
            collaborators.geolocator,
            config.geolocation_timeout,
        ),
        sample_interval: config.sample_interval,
        watchdog_interval: config.watchdog_interval,
        schedules: None,
        commands: tx.downgrade(),
    };
    tokio::spawn(actor.run(rx));

    MonitorHandle { commands: tx }
}

struct MonitorActor {
    state: MonitorState,
    sampler: Box<dyn GridSampler>,
    planner: Arc<dyn Planner>,
    dispatcher: AlertDispatcher,
    sample_interval: Duration,
    watchdog_interval: Duration,
    schedules: Option<CancellationToken>,
    commands: mpsc::WeakSender<Command>,
}

impl MonitorActor {
    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        debug!(sampler = self.sampler.name(), "Monitor actor running");
        while let Some(command) = rx.recv().await {
            if !self.handle(command) {
                break;
            }
        }
        self.cancel_schedules();
        info!(generation = self.state.generation(), "Monitor actor exited");
    }

    /// Apply one command. Returns false when the actor should exit.
    fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Start { reply } => {
                let started = self.state.start();
                if started {
                    self.spawn_schedules();
                }
                let _ = reply.send(started);
            }
            Command::Stop { reply } => {
                let stopped = self.state.stop();
                if stopped {
                    self.cancel_schedules();
                }
                let _ = reply.send(stopped);
            }
            Command::SampleTick => {
                let raw = self.sampler.sample();
                let effects = self.state.on_sample(&raw, now());
                self.run_effects(effects);
            }
            Command::WatchdogTick => {
                let effects = self.state.on_watchdog(now());
                self.run_effects(effects);
            }
            Command::ManualDispatch { reply } => {
                let (decision, effect) = self.state.manual_dispatch(now());
                self.run_effects(effect);
                let _ = reply.send(decision);
            }
            Command::InjectSurge { reply } => {
                let effects = self.state.inject_surge(now());
                self.run_effects(effects);
                let _ = reply.send(());
            }
            Command::RefreshPlan { reply } => {
                let effect = self.state.refresh_plan();
                let requested = effect.is_some();
                self.run_effects(effect);
                let _ = reply.send(requested);
            }
            Command::PlanReady { generation, result } => {
                self.state.apply_plan(generation, result);
            }
            Command::AlertCompleted { generation, report } => {
                self.state.apply_alert(generation, *report);
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.state.snapshot(now()));
            }
            Command::Shutdown { reply } => {
                self.state.stop();
                let _ = reply.send(());
                return false;
            }
        }
        true
    }

    fn spawn_schedules(&mut self) {
        self.cancel_schedules();
        let token = CancellationToken::new();
        spawn_ticker(
            "sample",
            self.sample_interval,
            token.clone(),
            self.commands.clone(),
            || Command::SampleTick,
        );
        spawn_ticker(
            "watchdog",
            self.watchdog_interval,
            token.clone(),
            self.commands.clone(),
            || Command::WatchdogTick,
        );
        self.schedules = Some(token);
    }

    fn cancel_schedules(&mut self) {
        if let Some(token) = self.schedules.take() {
            token.cancel();
        }
    }

    fn run_effects(&self, effects: impl IntoIterator<Item = Effect>) {
        for effect in effects {
            self.spawn_effect(effect);
        }
    }

    fn spawn_effect(&self, effect: Effect) {
        let Some(tx) = self.commands.upgrade() else {
            warn!("Command channel closed; dropping effect");
            return;
        };
        match effect {
            Effect::RequestPlan {
                generation,
                density_signal,
            } => {
                let planner = Arc::clone(&self.planner);
                tokio::spawn(async move {
                    let call =
                        tokio::spawn(async move { planner.generate_plan(density_signal).await });
                    let result = match call.await {
                        Ok(result) => result,
                        Err(join_err) => Err(MonitorError::PlannerFailure(format!(
                            "planner task aborted: {}",
                            join_err
                        ))),
                    };
                    let _ = tx.send(Command::PlanReady { generation, result }).await;
                });
            }
            Effect::SendAlert {
                generation,
                pending,
            } => {
                let dispatcher = self.dispatcher.clone();
                tokio::spawn(async move {
                    let report = dispatcher.send(pending).await;
                    let _ = tx
                        .send(Command::AlertCompleted {
                            generation,
                            report: Box::new(report),
                        })
                        .await;
                });
            }
        }
    }
}

fn spawn_ticker(
    name: &'static str,
    period: Duration,
    token: CancellationToken,
    commands: mpsc::WeakSender<Command>,
    make: fn() -> Command,
) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    let Some(tx) = commands.upgrade() else { break };
                    if tx.send(make()).await.is_err() {
                        break;
                    }
                }
            }
        }
        debug!(schedule = name, "Schedule stopped");
    });
}
