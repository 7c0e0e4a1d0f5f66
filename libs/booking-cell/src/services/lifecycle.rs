use tracing::{debug, warn};

use crate::models::{BookingError, BookingStatus};

/// Outcome of checking a requested status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The row must be written.
    Apply,
    /// The booking is already in the requested terminal state; nothing to write.
    AlreadyApplied,
}

/// All valid next statuses for a given current status.
pub fn valid_transitions(current: BookingStatus) -> &'static [BookingStatus] {
    match current {
        BookingStatus::Scheduled => &BookingStatus::HISTORY,
        // Terminal states - no transitions allowed
        BookingStatus::Completed | BookingStatus::Cancelled | BookingStatus::Rescheduled => &[],
    }
}

/// Validates a status change.
///
/// Cancelling a cancelled booking or completing a completed one is accepted
/// as a no-op. A reschedule always needs a scheduled booking, since it
/// creates a new row each time.
pub fn check_transition(
    current: BookingStatus,
    target: BookingStatus,
) -> Result<Transition, BookingError> {
    if valid_transitions(current).contains(&target) {
        debug!("Status transition validated: {} -> {}", current, target);
        return Ok(Transition::Apply);
    }

    if current == target && matches!(target, BookingStatus::Completed | BookingStatus::Cancelled) {
        debug!("Booking already {}, nothing to do", target);
        return Ok(Transition::AlreadyApplied);
    }

    warn!("Invalid status transition attempted: {} -> {}", current, target);
    Err(BookingError::InvalidStatusTransition {
        from: current,
        to: target,
    })
}
