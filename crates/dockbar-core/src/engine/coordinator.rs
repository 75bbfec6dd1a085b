//! The coordinating task. Owns the [`Reconciler`] and is the only writer of
//! published state; scans run on the blocking pool and hand their outcome
//! back over a channel.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{MissedTickBehavior, Sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::reconciler::Reconciler;
use super::types::{EngineCommand, EngineNotice, EngineOptions};
use crate::actions::{ActionDispatcher, ActionError, ActionOutcome, ActionTarget};
use crate::config::EngineTimings;
use crate::scan::{CapabilityStatus, ScanEngine, ScanGate, ScanOutcome, ScanPermit};
use crate::window::{
    EventSink, LocalId, OwnerId, ScanSnapshot, Subscription, WindowEvent, WindowEventKind,
    WindowService,
};

const NOTICE_CAPACITY: usize = 64;

/// A finished scan. The permit travels with it so the gate stays closed
/// until the coordinator has reconciled the result.
struct ScanResult {
    generation: u64,
    outcome: ScanOutcome,
    _permit: ScanPermit,
}

/// The caller's side of a coordinator.
pub(crate) struct CoordinatorChannels {
    pub commands: mpsc::UnboundedSender<EngineCommand>,
    pub snapshot: watch::Receiver<Arc<ScanSnapshot>>,
    pub status: watch::Receiver<CapabilityStatus>,
    pub notices: broadcast::Sender<EngineNotice>,
}

pub(crate) struct Coordinator {
    service: Arc<dyn WindowService>,
    scanner: Arc<ScanEngine>,
    dispatcher: ActionDispatcher,
    reconciler: Reconciler,
    gate: ScanGate,
    timings: EngineTimings,

    snapshot_tx: watch::Sender<Arc<ScanSnapshot>>,
    status_tx: watch::Sender<CapabilityStatus>,
    notices_tx: broadcast::Sender<EngineNotice>,
    results_tx: mpsc::UnboundedSender<ScanResult>,
    results_rx: mpsc::UnboundedReceiver<ScanResult>,
    event_sink: EventSink,
    events_rx: mpsc::UnboundedReceiver<WindowEvent>,
    commands_rx: mpsc::UnboundedReceiver<EngineCommand>,

    subscriptions: HashMap<OwnerId, Subscription>,
    debounce: Option<Pin<Box<Sleep>>>,
    recheck: Option<Pin<Box<Sleep>>>,
    shutdown: CancellationToken,
}

impl Coordinator {
    pub fn new(
        service: Arc<dyn WindowService>,
        options: &EngineOptions,
        shutdown: CancellationToken,
    ) -> (Self, CoordinatorChannels) {
        let reconciler = Reconciler::new(options);
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(reconciler.snapshot());
        let (status_tx, status_rx) = watch::channel(CapabilityStatus::Ready);
        let (notices_tx, _) = broadcast::channel(NOTICE_CAPACITY);
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        let (event_sink, events_rx) = mpsc::unbounded_channel();

        let coordinator = Self {
            scanner: Arc::new(ScanEngine::new(service.clone(), &options.excluded_apps)),
            dispatcher: ActionDispatcher::new(service.clone()),
            service,
            reconciler,
            gate: ScanGate::new(),
            timings: options.timings,
            snapshot_tx,
            status_tx,
            notices_tx: notices_tx.clone(),
            results_tx,
            results_rx,
            event_sink,
            events_rx,
            commands_rx,
            subscriptions: HashMap::new(),
            debounce: None,
            recheck: None,
            shutdown,
        };
        let channels = CoordinatorChannels {
            commands: commands_tx,
            snapshot: snapshot_rx,
            status: status_rx,
            notices: notices_tx,
        };
        (coordinator, channels)
    }

    pub async fn run(mut self) {
        info!(
            event = "core.engine.run_started",
            scan_interval_ms = self.timings.scan_interval.as_millis() as u64
        );

        let mut ticker = tokio::time::interval(self.timings.scan_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown.cancelled() => break,

                command = self.commands_rx.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },

                Some(result) = self.results_rx.recv() => {
                    self.handle_scan_result(result.generation, result.outcome);
                }

                Some(event) = self.events_rx.recv() => self.handle_event(event),

                _ = sleep_opt(&mut self.debounce) => {
                    self.debounce = None;
                    self.request_scan();
                }

                _ = sleep_opt(&mut self.recheck) => {
                    self.recheck = None;
                    self.request_scan();
                }

                _ = ticker.tick() => self.request_scan(),
            }
        }

        self.teardown();
    }

    fn teardown(&mut self) {
        let unsubscribed = self.subscriptions.len();
        self.subscriptions.clear();
        self.debounce = None;
        self.recheck = None;
        info!(event = "core.engine.run_completed", unsubscribed = unsubscribed);
    }

    /// Start a scan on the blocking pool unless one is already in flight.
    fn request_scan(&mut self) {
        let Some(permit) = self.gate.try_acquire() else {
            trace!(event = "core.engine.scan_skipped", reason = "in_flight");
            return;
        };

        let scanner = self.scanner.clone();
        let basis = self.reconciler.scan_basis();
        let generation = self.reconciler.generation();
        let results = self.results_tx.clone();

        tokio::task::spawn_blocking(move || {
            let outcome = scanner.scan(&basis);
            // The receiver is gone once the coordinator has stopped.
            let _ = results.send(ScanResult {
                generation,
                outcome,
                _permit: permit,
            });
        });
    }

    fn handle_scan_result(&mut self, generation: u64, outcome: ScanOutcome) {
        if generation != self.reconciler.generation() {
            debug!(
                event = "core.engine.stale_scan_discarded",
                generation = generation,
                current = self.reconciler.generation()
            );
            return;
        }

        if outcome.capability.is_ready() {
            self.sync_subscriptions(&outcome);
        } else {
            self.subscriptions.clear();
        }

        let pass = self
            .reconciler
            .reconcile(outcome, self.service.as_ref(), Instant::now());

        if let Some(status) = pass.status_changed {
            self.status_tx.send_replace(status);
        }
        if let Some(snapshot) = pass.published {
            self.snapshot_tx.send_replace(snapshot);
        }
    }

    /// Subscribe to newly seen owners and drop subscriptions of owners
    /// that are gone.
    fn sync_subscriptions(&mut self, outcome: &ScanOutcome) {
        let host_pid = self.service.host_pid();
        self.subscriptions
            .retain(|owner, _| outcome.live_owners.contains(owner));

        for owner in &outcome.live_owners {
            if owner.pid() == host_pid || self.subscriptions.contains_key(owner) {
                continue;
            }
            match self
                .service
                .subscribe(*owner, &WindowEventKind::ALL, self.event_sink.clone())
            {
                Ok(subscription) => {
                    self.subscriptions.insert(*owner, subscription);
                }
                // Retried on the next scan.
                Err(e) => debug!(
                    event = "core.engine.subscribe_failed",
                    pid = owner.pid(),
                    error = %e
                ),
            }
        }
    }

    fn handle_event(&mut self, event: WindowEvent) {
        trace!(
            event = "core.engine.window_event_received",
            pid = event.owner.pid(),
            kind = ?event.kind
        );
        if self.debounce.is_none() {
            self.debounce = Some(Box::pin(tokio::time::sleep(self.timings.event_debounce)));
        }
    }

    fn handle_command(&mut self, command: EngineCommand) {
        debug!(event = "core.engine.command_received", command = ?command);
        match command {
            EngineCommand::Toggle(local_id) => self.toggle(local_id),
            EngineCommand::Focus(local_id) => self.focus(local_id),
            EngineCommand::Close {
                local_id,
                allow_terminate,
            } => self.close(local_id, allow_terminate),
            EngineCommand::DisplaysChanged => {
                if let Some(snapshot) = self.reconciler.reset() {
                    self.snapshot_tx.send_replace(snapshot);
                }
                self.request_scan();
            }
        }
    }

    fn target(&self, local_id: &LocalId) -> Option<(ActionTarget, bool)> {
        self.reconciler
            .find(local_id)
            .map(|record| (ActionTarget::from(record), record.minimized))
    }

    fn notify(&self, notice: EngineNotice) {
        // No receivers is fine; notices are one-shot.
        let _ = self.notices_tx.send(notice);
    }

    fn notify_not_found(&self, local_id: LocalId) {
        warn!(event = "core.engine.command_target_missing", local_id = %local_id);
        self.notify(EngineNotice::ActionFailed {
            local_id,
            error: ActionError::WindowNotFound {
                local_id: local_id.to_string(),
            },
        });
    }

    /// Minimize a visible window or restore a minimized one. Ignored while a
    /// previous toggle on the same window is still pending.
    fn toggle(&mut self, local_id: LocalId) {
        let now = Instant::now();
        let Some((target, published_minimized)) = self.target(&local_id) else {
            self.notify_not_found(local_id);
            return;
        };
        if self.reconciler.is_pending(&local_id, now) {
            debug!(event = "core.engine.toggle_suppressed", local_id = %local_id);
            return;
        }

        let minimized = self
            .service
            .read_attributes(target.handle)
            .map(|attrs| attrs.minimized)
            .unwrap_or(published_minimized);

        let report = if minimized {
            self.reconciler.record_toggle(&local_id, false, true, now);
            self.dispatcher.restore(&target)
        } else {
            self.reconciler.record_toggle(&local_id, true, false, now);
            self.dispatcher.minimize(&target)
        };

        if let Some(snapshot) = self.reconciler.reapply_overlay(now) {
            self.snapshot_tx.send_replace(snapshot);
        }
        if let Some(error) = ActionError::from_report(&report) {
            self.notify(EngineNotice::ActionFailed { local_id, error });
        }
        self.schedule_recheck();
    }

    fn focus(&mut self, local_id: LocalId) {
        let Some((target, _)) = self.target(&local_id) else {
            self.notify_not_found(local_id);
            return;
        };
        let report = self.dispatcher.focus(&target);
        if let Some(error) = ActionError::from_report(&report) {
            self.notify(EngineNotice::ActionFailed { local_id, error });
        }
        self.schedule_recheck();
    }

    fn close(&mut self, local_id: LocalId, allow_terminate: bool) {
        let Some((target, _)) = self.target(&local_id) else {
            self.notify_not_found(local_id);
            return;
        };
        let report = self.dispatcher.close(&target, allow_terminate);
        match report.outcome {
            ActionOutcome::Terminated => self.notify(EngineNotice::WindowTerminated {
                local_id,
                app: target.owner_app_name.clone(),
            }),
            _ => {
                if let Some(error) = ActionError::from_report(&report) {
                    self.notify(EngineNotice::ActionFailed { local_id, error });
                }
            }
        }
        self.request_scan();
    }

    fn schedule_recheck(&mut self) {
        self.recheck = Some(Box::pin(tokio::time::sleep(self.timings.pending_grace)));
    }
}

/// Resolves when the timer fires; pends forever when there is none.
async fn sleep_opt(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}
