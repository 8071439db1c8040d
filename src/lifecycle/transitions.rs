//! Domain transfer state machine.
//!
//! Every status change goes through [`TRANSFER_TABLE`]. A `(status, event)`
//! pair missing from the table is rejected with
//! [`Error::InvalidTransition`], including every event on a terminal status.

use crate::error::{Error, Result};
use crate::types::{TransferAction, TransferStatus};

/// Inputs that move a transfer between statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEvent {
    Approve,
    Reject,
    Cancel,
    SubmitAuthCode,
    /// Automatic step run by the lifecycle worker.
    Advance,
    /// The worker gave up on an automatic step.
    Fail,
}

impl TransferEvent {
    /// Status-changing event of an operator action. Lock actions have none.
    #[must_use]
    pub const fn from_action(action: TransferAction) -> Option<Self> {
        match action {
            TransferAction::Approve => Some(TransferEvent::Approve),
            TransferAction::Reject => Some(TransferEvent::Reject),
            TransferAction::Cancel => Some(TransferEvent::Cancel),
            TransferAction::SubmitAuthCode => Some(TransferEvent::SubmitAuthCode),
            TransferAction::Lock | TransferAction::Unlock => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            TransferEvent::Approve => "approve",
            TransferEvent::Reject => "reject",
            TransferEvent::Cancel => "cancel",
            TransferEvent::SubmitAuthCode => "submit_auth_code",
            TransferEvent::Advance => "advance",
            TransferEvent::Fail => "fail",
        }
    }
}

use TransferEvent as E;
use TransferStatus as S;

pub const TRANSFER_TABLE: &[(TransferStatus, TransferEvent, TransferStatus)] = &[
    (S::Pending, E::Cancel, S::Cancelled),
    (S::Pending, E::SubmitAuthCode, S::Processing),
    (S::Pending, E::Advance, S::Processing),
    (S::Pending, E::Fail, S::Failed),
    (S::Processing, E::Cancel, S::Cancelled),
    (S::Processing, E::SubmitAuthCode, S::Processing),
    (S::Processing, E::Advance, S::AwaitingApproval),
    (S::Processing, E::Fail, S::Failed),
    (S::AwaitingApproval, E::Approve, S::Completed),
    (S::AwaitingApproval, E::Reject, S::Failed),
    (S::AwaitingApproval, E::Cancel, S::Cancelled),
    (S::AwaitingApproval, E::SubmitAuthCode, S::Processing),
    (S::AwaitingApproval, E::Fail, S::Failed),
];

#[must_use]
pub fn next_status(from: TransferStatus, event: TransferEvent) -> Option<TransferStatus> {
    TRANSFER_TABLE
        .iter()
        .find(|(f, e, _)| *f == from && *e == event)
        .map(|(_, _, to)| *to)
}

pub fn transition(from: TransferStatus, event: TransferEvent) -> Result<TransferStatus> {
    next_status(from, event).ok_or_else(|| Error::InvalidTransition {
        status: from.to_string(),
        action: event.as_str().to_string(),
    })
}

/// Lock changes are accepted on live transfers and on completed ones.
pub fn check_lock_change(from: TransferStatus, action: TransferAction) -> Result<()> {
    if from.is_terminal() && from != TransferStatus::Completed {
        return Err(Error::InvalidTransition {
            status: from.to_string(),
            action: action.to_string(),
        });
    }
    Ok(())
}

/// True when the worker still has an automatic step to run.
#[must_use]
pub fn can_advance(from: TransferStatus) -> bool {
    next_status(from, TransferEvent::Advance).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVENTS: [TransferEvent; 6] = [
        E::Approve,
        E::Reject,
        E::Cancel,
        E::SubmitAuthCode,
        E::Advance,
        E::Fail,
    ];

    #[test]
    fn test_happy_path() {
        let s = transition(S::Pending, E::Advance).unwrap();
        assert_eq!(s, S::Processing);
        let s = transition(s, E::Advance).unwrap();
        assert_eq!(s, S::AwaitingApproval);
        let s = transition(s, E::Approve).unwrap();
        assert_eq!(s, S::Completed);
    }

    #[test]
    fn test_approve_only_when_awaiting_approval() {
        for status in TransferStatus::ALL {
            let allowed = next_status(*status, E::Approve).is_some();
            assert_eq!(allowed, *status == S::AwaitingApproval, "{status}");
        }
    }

    #[test]
    fn test_terminal_states_reject_every_event() {
        for status in [S::Completed, S::Failed, S::Cancelled] {
            for event in EVENTS {
                let err = transition(status, event).unwrap_err();
                assert!(matches!(err, Error::InvalidTransition { .. }));
            }
            assert!(!can_advance(status));
        }
    }

    #[test]
    fn test_submit_auth_code_restarts_processing() {
        assert_eq!(
            transition(S::AwaitingApproval, E::SubmitAuthCode).unwrap(),
            S::Processing
        );
        assert!(can_advance(S::Processing));
    }

    #[test]
    fn test_table_has_no_duplicate_keys() {
        for (i, (f, e, _)) in TRANSFER_TABLE.iter().enumerate() {
            let dup = TRANSFER_TABLE[i + 1..]
                .iter()
                .any(|(f2, e2, _)| f2 == f && e2 == e);
            assert!(!dup, "duplicate entry for ({f}, {})", e.as_str());
        }
    }

    #[test]
    fn test_lock_changes() {
        assert!(check_lock_change(S::Pending, TransferAction::Unlock).is_ok());
        assert!(check_lock_change(S::Completed, TransferAction::Lock).is_ok());
        assert!(check_lock_change(S::Cancelled, TransferAction::Lock).is_err());
        assert!(check_lock_change(S::Failed, TransferAction::Unlock).is_err());
    }

    #[test]
    fn test_error_message_names_status_and_action() {
        let err = transition(S::Pending, E::Approve).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid transition: cannot approve a transfer that is PENDING"
        );
    }
}
