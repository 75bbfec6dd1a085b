use std::sync::Arc;

use tracing::{debug, info, warn};

use super::types::{
    ActionOutcome, ActionReport, ActionState, ActionTarget, ActionTier, AttemptFailure,
    WindowAction,
};
use crate::errors::DockbarError;
use crate::window::{ControlKind, WindowAttributeValue, WindowService, WindowServiceError};

/// Tracks one action through its fallback chain.
struct ActionRun<'a> {
    action: WindowAction,
    target: &'a ActionTarget,
    state: ActionState,
    attempts: Vec<ActionTier>,
    failures: Vec<AttemptFailure>,
}

impl<'a> ActionRun<'a> {
    fn new(action: WindowAction, target: &'a ActionTarget) -> Self {
        info!(
            event = "core.action.dispatch_started",
            action = %action,
            window = %target.id,
            app = %target.owner_app_name
        );
        Self {
            action,
            target,
            state: ActionState::Idle,
            attempts: Vec::new(),
            failures: Vec::new(),
        }
    }

    fn attempt(
        &mut self,
        tier: ActionTier,
        op: impl FnOnce() -> Result<(), WindowServiceError>,
    ) -> bool {
        self.state = ActionState::Attempting(tier);
        self.attempts.push(tier);
        match op() {
            Ok(()) => {
                debug!(
                    event = "core.action.tier_succeeded",
                    action = %self.action,
                    tier = %tier
                );
                true
            }
            Err(e) => {
                debug!(
                    event = "core.action.tier_failed",
                    action = %self.action,
                    state = ?self.state,
                    error = %e
                );
                self.failures.push(AttemptFailure {
                    tier,
                    code: e.error_code(),
                    message: e.to_string(),
                });
                false
            }
        }
    }

    fn finish(mut self, outcome: ActionOutcome) -> ActionReport {
        self.state = ActionState::Done {
            success: outcome.is_success(),
        };
        if outcome.is_success() {
            info!(
                event = "core.action.dispatch_completed",
                action = %self.action,
                window = %self.target.id,
                outcome = ?outcome
            );
        } else {
            warn!(
                event = "core.action.dispatch_exhausted",
                action = %self.action,
                window = %self.target.id,
                attempts = self.attempts.len()
            );
        }
        ActionReport {
            action: self.action,
            window: self.target.id,
            outcome,
            state: self.state,
            attempts: self.attempts,
            failures: self.failures,
        }
    }
}

/// Runs window actions through their ordered fallback chains.
///
/// Failures are returned in the report, never raised.
#[derive(Clone)]
pub struct ActionDispatcher {
    service: Arc<dyn WindowService>,
}

impl ActionDispatcher {
    pub fn new(service: Arc<dyn WindowService>) -> Self {
        Self { service }
    }

    pub fn dispatch(
        &self,
        action: WindowAction,
        target: &ActionTarget,
        allow_terminate: bool,
    ) -> ActionReport {
        match action {
            WindowAction::Minimize => self.minimize(target),
            WindowAction::Restore => self.restore(target),
            WindowAction::Focus => self.focus(target),
            WindowAction::Close => self.close(target, allow_terminate),
        }
    }

    /// Attribute write, then the minimize control, then the scripted
    /// equivalent. The first success ends the chain.
    pub fn minimize(&self, target: &ActionTarget) -> ActionReport {
        let service = self.service.as_ref();
        let mut run = ActionRun::new(WindowAction::Minimize, target);

        if run.attempt(ActionTier::AttributeWrite, || {
            service.write_attribute(target.handle, WindowAttributeValue::Minimized(true))
        }) {
            return run.finish(ActionOutcome::Succeeded {
                tier: ActionTier::AttributeWrite,
            });
        }
        if run.attempt(ActionTier::Control, || {
            service.invoke_control(target.handle, ControlKind::Minimize)
        }) {
            return run.finish(ActionOutcome::Succeeded {
                tier: ActionTier::Control,
            });
        }
        if run.attempt(ActionTier::Scripted, || {
            service.scripted_minimize(target.owner, &target.title)
        }) {
            return run.finish(ActionOutcome::Succeeded {
                tier: ActionTier::Scripted,
            });
        }
        run.finish(ActionOutcome::Exhausted)
    }

    pub fn restore(&self, target: &ActionTarget) -> ActionReport {
        self.bring_forward(WindowAction::Restore, target)
    }

    pub fn focus(&self, target: &ActionTarget) -> ActionReport {
        self.bring_forward(WindowAction::Focus, target)
    }

    /// Clear minimized, mark main, then activate the owner. Every step runs
    /// regardless of earlier failures and nothing is rolled back.
    fn bring_forward(&self, action: WindowAction, target: &ActionTarget) -> ActionReport {
        let service = self.service.as_ref();
        let mut run = ActionRun::new(action, target);
        let mut completed = Vec::new();

        if run.attempt(ActionTier::AttributeWrite, || {
            service.write_attribute(target.handle, WindowAttributeValue::Minimized(false))
        }) {
            completed.push(ActionTier::AttributeWrite);
        }
        if run.attempt(ActionTier::AttributeWrite, || {
            service.write_attribute(target.handle, WindowAttributeValue::Main(true))
        }) {
            completed.push(ActionTier::AttributeWrite);
        }
        if run.attempt(ActionTier::Activation, || {
            service.activate_owner(target.owner)
        }) {
            completed.push(ActionTier::Activation);
        }

        let outcome = if completed.is_empty() {
            ActionOutcome::Exhausted
        } else if completed.len() == run.attempts.len() {
            ActionOutcome::Succeeded {
                tier: ActionTier::Activation,
            }
        } else {
            ActionOutcome::PartiallySucceeded { completed }
        };
        run.finish(outcome)
    }

    /// Press the close control. Only when the caller permits it, fall back to
    /// terminating the owning process, reported as [`ActionOutcome::Terminated`].
    pub fn close(&self, target: &ActionTarget, allow_terminate: bool) -> ActionReport {
        let service = self.service.as_ref();
        let mut run = ActionRun::new(WindowAction::Close, target);

        if run.attempt(ActionTier::Control, || {
            service.invoke_control(target.handle, ControlKind::Close)
        }) {
            return run.finish(ActionOutcome::Succeeded {
                tier: ActionTier::Control,
            });
        }

        if !allow_terminate {
            return run.finish(ActionOutcome::Exhausted);
        }

        warn!(
            event = "core.action.terminate_started",
            window = %target.id,
            pid = target.owner.pid(),
            app = %target.owner_app_name
        );
        if run.attempt(ActionTier::Terminate, || {
            service.terminate_owner(target.owner, &target.owner_app_name)
        }) {
            return run.finish(ActionOutcome::Terminated);
        }
        run.finish(ActionOutcome::Exhausted)
    }
}
