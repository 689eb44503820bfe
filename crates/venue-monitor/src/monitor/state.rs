//! The monitor's owned state.
//!
//! `MonitorState` is plain synchronous data. Only the actor task touches it,
//! one command at a time, which serializes every write to the episode, the
//! cooldown window and the log. Anything that needs I/O comes back out as an
//! [`Effect`] for the actor to run off the critical path; its result returns
//! through `apply_plan` / `apply_alert` tagged with the generation it was
//! issued under.

use std::time::Instant;

use escalation_core::dispatch::format_timeframe;
use escalation_core::plan::{EMPTY_PLAN, EMPTY_RESPONSE, PLANNER_ERROR_PLAN, SURGE_SIGNAL};
use escalation_core::{
    categorize, Classification, CrowdCounter, DensityClassifier, DispatchGate, DispatchReason,
    EscalationAction, EscalationConfig, EscalationDecision, EventLog, GateDecision, Grid, LogKind,
    MonitorError, NotificationRecord, StatusEscalator, VenueStatus, WatchdogVerdict,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::snapshot::MonitorSnapshot;
use crate::config::MonitorConfig;
use crate::dispatcher::{DispatchReport, PendingAlert};

/// Lifecycle phase of the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Boot sequence not finished.
    Initializing,
    /// Booted, schedules not running.
    Ready,
    /// Sampling and watchdog schedules running.
    Monitoring,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initializing => write!(f, "initializing"),
            Self::Ready => write!(f, "ready"),
            Self::Monitoring => write!(f, "monitoring"),
        }
    }
}

/// Work the actor must run outside the state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    RequestPlan { generation: u64, density_signal: u32 },
    SendAlert { generation: u64, pending: PendingAlert },
}

pub struct MonitorState {
    phase: Phase,
    generation: u64,
    source: String,
    classifier: DensityClassifier,
    escalation: EscalationConfig,
    escalator: StatusEscalator,
    gate: DispatchGate,
    log: EventLog,
    counter: CrowdCounter,
    grid: Grid,
    high_cells: usize,
    critical_cells: usize,
    plan: Option<String>,
    plan_in_flight: bool,
    last_notification: Option<NotificationRecord>,
}

impl MonitorState {
    pub fn new(config: &MonitorConfig, source: impl Into<String>, counter: CrowdCounter) -> Self {
        Self {
            phase: Phase::Initializing,
            generation: 0,
            source: source.into(),
            classifier: DensityClassifier::with_thresholds(config.thresholds),
            escalation: config.escalation.clone(),
            escalator: StatusEscalator::with_config(config.escalation.clone()),
            gate: DispatchGate::new(config.dispatch_cooldown),
            log: EventLog::with_capacity(config.log_capacity),
            counter,
            grid: Grid::empty(),
            high_cells: 0,
            critical_cells: 0,
            plan: None,
            plan_in_flight: false,
            last_notification: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn status(&self) -> VenueStatus {
        self.escalator.current()
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn plan(&self) -> Option<&str> {
        self.plan.as_deref()
    }

    pub fn plan_in_flight(&self) -> bool {
        self.plan_in_flight
    }

    pub fn last_notification(&self) -> Option<&NotificationRecord> {
        self.last_notification.as_ref()
    }

    /// One-time boot sequence. Idempotent.
    pub fn boot(&mut self) {
        if self.phase != Phase::Initializing {
            return;
        }
        self.log.append(LogKind::System, "System startup initiated...");
        self.log.append(LogKind::System, "Initializing detection engine...");
        self.log
            .append(LogKind::Info, "Engine ready. Waiting for input stream.");
        self.phase = Phase::Ready;
        info!(source = %self.source, "Monitor booted");
    }

    /// Enter monitoring. Returns false if already monitoring.
    ///
    /// Each session starts from `Normal` with no episode and an empty grid;
    /// the cooldown window carries over.
    pub fn start(&mut self) -> bool {
        self.boot();
        if self.phase == Phase::Monitoring {
            return false;
        }
        self.phase = Phase::Monitoring;
        self.escalator = StatusEscalator::with_config(self.escalation.clone());
        self.grid = Grid::empty();
        self.high_cells = 0;
        self.critical_cells = 0;
        self.log
            .append(LogKind::Info, format!("Stream connected: {}", self.source));
        self.log.append(
            LogKind::System,
            format!(
                "Analysis started: {}x{} density grid",
                self.grid.rows(),
                self.grid.cols()
            ),
        );
        info!(generation = self.generation, source = %self.source, "Monitoring started");
        true
    }

    /// Leave monitoring. In-flight completions from this session become stale.
    pub fn stop(&mut self) -> bool {
        if self.phase != Phase::Monitoring {
            return false;
        }
        self.phase = Phase::Ready;
        self.generation += 1;
        self.plan_in_flight = false;
        self.log.append(LogKind::System, "Monitoring stopped");
        info!(generation = self.generation, "Monitoring stopped");
        true
    }

    /// Classify one sampled frame and run the transition rule.
    pub fn on_sample(&mut self, raw: &[Vec<u32>], now: Instant) -> Vec<Effect> {
        if self.phase != Phase::Monitoring {
            return Vec::new();
        }
        self.counter.step();

        let classification = match self.classifier.classify(raw) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, kind = e.kind(), "Discarding malformed frame");
                self.log
                    .append(LogKind::Warning, format!("Discarded frame: {}", e));
                return Vec::new();
            }
        };
        let status = classification.status;
        self.store(classification);

        match self.escalator.observe(status, now) {
            Some(decision) => self.apply_decision(decision, None),
            None => Vec::new(),
        }
    }

    /// Critical-dwell check.
    pub fn on_watchdog(&mut self, now: Instant) -> Vec<Effect> {
        if self.phase != Phase::Monitoring {
            return Vec::new();
        }
        match self.escalator.watchdog(now) {
            WatchdogVerdict::Dispatch { reason, elapsed } => {
                debug!(elapsed_ms = elapsed.as_millis() as u64, "Watchdog requested dispatch");
                self.dispatch(reason, now).1.into_iter().collect()
            }
            _ => Vec::new(),
        }
    }

    /// Operator-authorized dispatch. Shares the gate with the automatic path.
    pub fn manual_dispatch(&mut self, now: Instant) -> (GateDecision, Option<Effect>) {
        self.dispatch(DispatchReason::Manual, now)
    }

    /// Force `CriticalRisk` and request a surge plan.
    pub fn inject_surge(&mut self, now: Instant) -> Vec<Effect> {
        if self.phase != Phase::Monitoring {
            debug!(phase = %self.phase, "Surge injection ignored");
            return Vec::new();
        }
        self.log.append(
            LogKind::Warning,
            "MANUAL OVERRIDE: Injecting simulated surge data",
        );
        let mut effects = match self.escalator.observe(VenueStatus::CriticalRisk, now) {
            Some(decision) => self.apply_decision(decision, Some(SURGE_SIGNAL)),
            None => Vec::new(),
        };
        if effects.is_empty() {
            effects.extend(self.request_plan(SURGE_SIGNAL));
        }
        effects
    }

    /// Ask for a fresh plan using the current crowd total.
    pub fn refresh_plan(&mut self) -> Option<Effect> {
        if self.phase == Phase::Initializing {
            return None;
        }
        self.request_plan(self.counter.total())
    }

    /// Apply a planner result. Returns false for a stale generation.
    pub fn apply_plan(&mut self, generation: u64, result: Result<String, MonitorError>) -> bool {
        if generation != self.generation {
            debug!(generation, current = self.generation, "Discarding stale plan");
            return false;
        }
        self.plan_in_flight = false;
        let plan = match result {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => self.empty_plan(),
            Err(MonitorError::PlannerFailure(detail)) if detail == EMPTY_RESPONSE => {
                self.empty_plan()
            }
            Err(e) => {
                warn!(error = %e, "Plan generation failed");
                self.log
                    .append(LogKind::Warning, "AI plan unavailable; using default protocol");
                PLANNER_ERROR_PLAN.to_string()
            }
        };
        self.plan = Some(plan);
        true
    }

    fn empty_plan(&mut self) -> String {
        warn!("Planner returned no text");
        self.log
            .append(LogKind::Warning, "AI plan returned no text; no response generated");
        EMPTY_PLAN.to_string()
    }

    /// Apply a finished dispatch. Returns false for a stale generation.
    pub fn apply_alert(&mut self, generation: u64, report: DispatchReport) -> bool {
        if generation != self.generation {
            debug!(generation, current = self.generation, "Discarding stale alert result");
            return false;
        }
        if report.location_fallback {
            self.log.append(
                LogKind::Warning,
                "Location unavailable; using fallback coordinates",
            );
        }
        let (kind, message) = report.outcome.log_entry();
        self.log.append(kind, message);
        self.last_notification = Some(report.record);
        true
    }

    pub fn snapshot(&self, now: Instant) -> MonitorSnapshot {
        let status = self.escalator.current();
        let status_label = match self.phase {
            Phase::Initializing => "Initializing".to_string(),
            _ => status.label().to_string(),
        };
        MonitorSnapshot {
            phase: self.phase,
            status,
            status_label,
            generation: self.generation,
            grid: self.grid.clone(),
            total_persons: self.counter.total(),
            max_cell_density: self.grid.max_count(),
            high_cells: self.high_cells,
            critical_cells: self.critical_cells,
            cooldown_remaining_secs: self.gate.remaining_secs(now),
            critical_elapsed: self.escalator.critical_elapsed(now),
            plan: self.plan.clone(),
            plan_lines: self.plan.as_deref().map(categorize).unwrap_or_default(),
            plan_in_flight: self.plan_in_flight,
            log: self.log.list(),
            last_notification: self.last_notification.clone(),
        }
    }

    fn store(&mut self, classification: Classification) {
        self.high_cells = classification.high_cells;
        self.critical_cells = classification.critical_cells;
        self.grid = classification.grid;
    }

    /// Append the decision's log entries and turn its plan request into an effect.
    fn apply_decision(
        &mut self,
        decision: EscalationDecision,
        signal_override: Option<u32>,
    ) -> Vec<Effect> {
        let mut effects = Vec::new();
        for action in decision.actions {
            match action {
                EscalationAction::Log { kind, message } => {
                    self.log.append(kind, message);
                }
                EscalationAction::RequestPlan { density_signal } => {
                    let signal = signal_override.unwrap_or(density_signal);
                    effects.extend(self.request_plan(signal));
                }
            }
        }
        effects
    }

    fn request_plan(&mut self, density_signal: u32) -> Option<Effect> {
        if self.plan_in_flight {
            debug!(density_signal, "Plan request skipped: one already in flight");
            return None;
        }
        self.plan_in_flight = true;
        debug!(density_signal, generation = self.generation, "Requesting plan");
        Some(Effect::RequestPlan {
            generation: self.generation,
            density_signal,
        })
    }

    fn dispatch(&mut self, reason: DispatchReason, now: Instant) -> (GateDecision, Option<Effect>) {
        let decision = self.gate.try_dispatch(reason, now);
        match decision {
            GateDecision::Accepted { .. } => {
                self.log.append(
                    LogKind::Alert,
                    format!("Posting emergency alert: {}", reason.message()),
                );
                let pending = PendingAlert {
                    reason,
                    status: self.escalator.current(),
                    timeframe: format_timeframe(self.escalator.critical_elapsed(now)),
                };
                let effect = Effect::SendAlert {
                    generation: self.generation,
                    pending,
                };
                (decision, Some(effect))
            }
            GateDecision::RejectedCooldown { remaining } => {
                warn!(
                    %reason,
                    remaining_ms = remaining.as_millis() as u64,
                    "Dispatch suppressed"
                );
                self.log.append(
                    LogKind::Warning,
                    "Dispatch request suppressed: cooldown active.",
                );
                (decision, None)
            }
        }
    }
}
