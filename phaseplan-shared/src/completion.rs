/// Phase and task completion rules
///
/// # State Machine
///
/// ```text
/// Phase:  open ──(no open tasks)──> completed
///         completed ──────────────> open
///
/// Task:   open <──────────────────> done
/// ```
///
/// Only the forward phase transition is guarded. Reopening a phase is
/// always allowed, and re-applying the current state is a successful no-op.
/// Tasks flip freely; their only effect is being counted by their phase's
/// guard.

use serde::{Deserialize, Serialize};

/// Completion errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompletionError {
    /// The phase still has incomplete tasks
    #[error("Cannot complete phase: {open_tasks} task(s) are still open.")]
    OpenTasks { open_tasks: i64 },
}

/// Phase state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseStatus {
    Open,
    Completed,
}

impl PhaseStatus {
    pub fn from_completed(is_completed: bool) -> Self {
        if is_completed {
            PhaseStatus::Completed
        } else {
            PhaseStatus::Open
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, PhaseStatus::Completed)
    }
}

/// Task state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Open,
    Done,
}

impl TaskStatus {
    pub fn from_completed(is_completed: bool) -> Self {
        if is_completed {
            TaskStatus::Done
        } else {
            TaskStatus::Open
        }
    }

    /// Tasks have no guard; any target is reachable from any state
    pub fn can_transition_to(&self, _target: TaskStatus) -> bool {
        true
    }
}

/// Outcome of an accepted phase transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionTransition {
    /// Target equals the current state; nothing to write
    Unchanged,

    /// open → completed
    Completed,

    /// completed → open
    Reopened,
}

impl CompletionTransition {
    pub fn is_change(&self) -> bool {
        !matches!(self, CompletionTransition::Unchanged)
    }
}

/// Whether a phase with `open_tasks` incomplete tasks may be completed
pub fn can_complete(open_tasks: i64) -> bool {
    open_tasks == 0
}

/// Decides a phase completion change
///
/// # Errors
///
/// `CompletionError::OpenTasks` when moving an open phase to completed
/// while `open_tasks > 0`.
///
/// # Example
///
/// ```
/// use phaseplan_shared::completion::{set_phase_completion, CompletionTransition, PhaseStatus};
///
/// let err = set_phase_completion(PhaseStatus::Open, true, 2).unwrap_err();
/// assert_eq!(err.to_string(), "Cannot complete phase: 2 task(s) are still open.");
///
/// assert_eq!(
///     set_phase_completion(PhaseStatus::Completed, false, 2).unwrap(),
///     CompletionTransition::Reopened
/// );
/// ```
pub fn set_phase_completion(
    current: PhaseStatus,
    target_completed: bool,
    open_tasks: i64,
) -> Result<CompletionTransition, CompletionError> {
    match (current, target_completed) {
        (PhaseStatus::Open, false) | (PhaseStatus::Completed, true) => {
            Ok(CompletionTransition::Unchanged)
        }
        (PhaseStatus::Completed, false) => Ok(CompletionTransition::Reopened),
        (PhaseStatus::Open, true) => {
            if can_complete(open_tasks) {
                Ok(CompletionTransition::Completed)
            } else {
                Err(CompletionError::OpenTasks { open_tasks })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_complete() {
        assert!(can_complete(0));
        assert!(!can_complete(1));
        assert!(!can_complete(7));
    }

    #[test]
    fn test_complete_blocked_by_open_tasks() {
        let err = set_phase_completion(PhaseStatus::Open, true, 2).unwrap_err();
        assert_eq!(err, CompletionError::OpenTasks { open_tasks: 2 });
        assert_eq!(
            err.to_string(),
            "Cannot complete phase: 2 task(s) are still open."
        );
    }

    #[test]
    fn test_complete_after_tasks_done() {
        assert_eq!(
            set_phase_completion(PhaseStatus::Open, true, 0).unwrap(),
            CompletionTransition::Completed
        );
    }

    #[test]
    fn test_reopen_is_never_guarded() {
        for open in [0, 1, 50] {
            assert_eq!(
                set_phase_completion(PhaseStatus::Completed, false, open).unwrap(),
                CompletionTransition::Reopened
            );
        }
    }

    #[test]
    fn test_same_state_is_noop() {
        assert_eq!(
            set_phase_completion(PhaseStatus::Open, false, 3).unwrap(),
            CompletionTransition::Unchanged
        );
        // Tasks reopened after completion do not make re-completion fail
        assert_eq!(
            set_phase_completion(PhaseStatus::Completed, true, 3).unwrap(),
            CompletionTransition::Unchanged
        );
        assert!(!CompletionTransition::Unchanged.is_change());
        assert!(CompletionTransition::Reopened.is_change());
    }

    #[test]
    fn test_status_conversions() {
        assert_eq!(PhaseStatus::from_completed(true), PhaseStatus::Completed);
        assert!(!PhaseStatus::from_completed(false).is_completed());
        assert_eq!(TaskStatus::from_completed(true), TaskStatus::Done);
        assert!(TaskStatus::Done.can_transition_to(TaskStatus::Open));
        assert!(TaskStatus::Open.can_transition_to(TaskStatus::Done));
    }
}
