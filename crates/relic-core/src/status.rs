//! # Shipment Status State Machine
//!
//! A shipment's status is not a stored column. It is derived from which of
//! the four milestone timestamps are set, and this module is the single
//! place that derivation and the transition rules live. Callers never
//! inspect the timestamp columns themselves.
//!
//! ## States and Transitions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   processing ──► shipped ──► delivered (terminal)                       │
//! │       │             │                                                   │
//! │       │             ├──────► cancelled (terminal)                       │
//! │       ├─────────────┤                                                   │
//! │       │             └──────► payment_failed (terminal)                  │
//! │       └──► cancelled / payment_failed                                   │
//! │                                                                         │
//! │   Each admin-triggered transition sets exactly one timestamp column.    │
//! │   Once any terminal timestamp is set, every further transition is       │
//! │   rejected by the guard - not merely hidden in the UI.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Display Priority
//! Historical rows can carry several timestamps (e.g. a shipment that was
//! shipped and then had its payment fail). For display, the highest-priority
//! state wins: `payment_failed > cancelled > delivered > shipped > processing`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::StatusError;

/// Human-facing shipment status, derived from the milestone timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    /// Implicit initial state: no timestamp set yet.
    Processing,
    /// `shipped_at` set.
    Shipped,
    /// `delivered_at` set. Terminal.
    Delivered,
    /// `cancelled_at` set. Terminal.
    Cancelled,
    /// `payment_failed_at` set. Terminal. Outranks everything for display.
    PaymentFailed,
}

impl ShipmentStatus {
    /// Derives the display status from the four nullable milestone
    /// timestamps, applying the priority order.
    pub fn derive(
        shipped_at: Option<DateTime<Utc>>,
        delivered_at: Option<DateTime<Utc>>,
        cancelled_at: Option<DateTime<Utc>>,
        payment_failed_at: Option<DateTime<Utc>>,
    ) -> Self {
        if payment_failed_at.is_some() {
            ShipmentStatus::PaymentFailed
        } else if cancelled_at.is_some() {
            ShipmentStatus::Cancelled
        } else if delivered_at.is_some() {
            ShipmentStatus::Delivered
        } else if shipped_at.is_some() {
            ShipmentStatus::Shipped
        } else {
            ShipmentStatus::Processing
        }
    }

    /// The timestamp column an admin transition into this state sets.
    ///
    /// `Processing` has no column: it is the absence of any timestamp, not
    /// something that can be entered.
    pub const fn milestone_column(&self) -> Option<&'static str> {
        match self {
            ShipmentStatus::Processing => None,
            ShipmentStatus::Shipped => Some("shipped_at"),
            ShipmentStatus::Delivered => Some("delivered_at"),
            ShipmentStatus::Cancelled => Some("cancelled_at"),
            ShipmentStatus::PaymentFailed => Some("payment_failed_at"),
        }
    }

    /// Terminal states accept no outgoing transition.
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            ShipmentStatus::Delivered | ShipmentStatus::Cancelled | ShipmentStatus::PaymentFailed
        )
    }

    /// Checks whether `self → target` is an allowed transition.
    ///
    /// ## Allowed Set
    /// - `processing → shipped`
    /// - `shipped → delivered`
    /// - any non-terminal → `cancelled`
    /// - any non-terminal → `payment_failed`
    ///
    /// `processing` is never a transition target (it is the absence of any
    /// timestamp), and terminal states reject everything.
    pub fn validate_transition(self, target: ShipmentStatus) -> Result<(), StatusError> {
        if self.is_terminal() {
            return Err(StatusError::Terminal { current: self });
        }

        let allowed = match target {
            ShipmentStatus::Shipped => self == ShipmentStatus::Processing,
            ShipmentStatus::Delivered => self == ShipmentStatus::Shipped,
            ShipmentStatus::Cancelled | ShipmentStatus::PaymentFailed => true,
            ShipmentStatus::Processing => false,
        };

        if allowed {
            Ok(())
        } else {
            Err(StatusError::InvalidTransition {
                from: self,
                to: target,
            })
        }
    }
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShipmentStatus::Processing => "processing",
            ShipmentStatus::Shipped => "shipped",
            ShipmentStatus::Delivered => "delivered",
            ShipmentStatus::Cancelled => "cancelled",
            ShipmentStatus::PaymentFailed => "payment_failed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts() -> Option<DateTime<Utc>> {
        Some(Utc::now())
    }

    #[test]
    fn derive_initial_state() {
        assert_eq!(
            ShipmentStatus::derive(None, None, None, None),
            ShipmentStatus::Processing
        );
    }

    #[test]
    fn derive_single_timestamps() {
        assert_eq!(
            ShipmentStatus::derive(ts(), None, None, None),
            ShipmentStatus::Shipped
        );
        assert_eq!(
            ShipmentStatus::derive(ts(), ts(), None, None),
            ShipmentStatus::Delivered
        );
    }

    #[test]
    fn payment_failed_outranks_shipped() {
        // Both timestamps set: the display status must be payment_failed,
        // never shipped.
        assert_eq!(
            ShipmentStatus::derive(ts(), None, None, ts()),
            ShipmentStatus::PaymentFailed
        );
    }

    #[test]
    fn cancelled_outranks_delivered() {
        assert_eq!(
            ShipmentStatus::derive(ts(), ts(), ts(), None),
            ShipmentStatus::Cancelled
        );
    }

    #[test]
    fn happy_path_transitions() {
        assert!(ShipmentStatus::Processing
            .validate_transition(ShipmentStatus::Shipped)
            .is_ok());
        assert!(ShipmentStatus::Shipped
            .validate_transition(ShipmentStatus::Delivered)
            .is_ok());
    }

    #[test]
    fn failure_transitions_from_any_non_terminal() {
        for from in [ShipmentStatus::Processing, ShipmentStatus::Shipped] {
            assert!(from.validate_transition(ShipmentStatus::Cancelled).is_ok());
            assert!(from
                .validate_transition(ShipmentStatus::PaymentFailed)
                .is_ok());
        }
    }

    #[test]
    fn cannot_skip_to_delivered() {
        assert_eq!(
            ShipmentStatus::Processing.validate_transition(ShipmentStatus::Delivered),
            Err(StatusError::InvalidTransition {
                from: ShipmentStatus::Processing,
                to: ShipmentStatus::Delivered,
            })
        );
    }

    #[test]
    fn processing_is_never_a_target() {
        assert!(ShipmentStatus::Shipped
            .validate_transition(ShipmentStatus::Processing)
            .is_err());
    }

    #[test]
    fn terminal_states_reject_everything() {
        for current in [
            ShipmentStatus::Delivered,
            ShipmentStatus::Cancelled,
            ShipmentStatus::PaymentFailed,
        ] {
            for target in [
                ShipmentStatus::Shipped,
                ShipmentStatus::Delivered,
                ShipmentStatus::Cancelled,
                ShipmentStatus::PaymentFailed,
            ] {
                assert_eq!(
                    current.validate_transition(target),
                    Err(StatusError::Terminal { current }),
                );
            }
        }
    }
}
