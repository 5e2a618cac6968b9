//! Status transition tables for every purchasing document.
//!
//! Each document kind owns its status enum and lists the edges it accepts.
//! Anything not listed is rejected with [`ServiceError::InvalidTransition`],
//! including a transition to the current status.

use crate::{
    entities::{
        goods_receipt::GrStatus, purchase_order::PoStatus, purchase_requisition::PrStatus,
        rfq::RfqStatus,
    },
    errors::ServiceError,
};
use sea_orm::Iterable;
use std::fmt::Display;
use uuid::Uuid;

pub trait Lifecycle: Copy + Eq + Display + Iterable + 'static {
    /// Human readable document kind used in error messages
    const DOCUMENT: &'static str;

    fn can_transition_to(self, next: Self) -> bool;

    fn is_terminal(self) -> bool {
        Self::iter().all(|next| !self.can_transition_to(next))
    }

    fn ensure_transition(self, next: Self) -> Result<(), ServiceError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(ServiceError::InvalidTransition {
                document: Self::DOCUMENT,
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl Lifecycle for PrStatus {
    const DOCUMENT: &'static str = "purchase requisition";

    fn can_transition_to(self, next: Self) -> bool {
        use PrStatus::*;
        matches!(
            (self, next),
            (Draft, Submitted)
                | (Draft, Canceled)
                | (Submitted, Approved)
                | (Submitted, Rejected)
                | (Submitted, Canceled)
                | (Approved, Processed)
        )
    }
}

impl Lifecycle for RfqStatus {
    const DOCUMENT: &'static str = "RFQ";

    fn can_transition_to(self, next: Self) -> bool {
        use RfqStatus::*;
        matches!(
            (self, next),
            (Created, Open)
                | (Created, Cancelled)
                | (Open, Closed)
                | (Open, Cancelled)
                | (Closed, Awarded)
                | (Closed, Cancelled)
        )
    }
}

impl Lifecycle for PoStatus {
    const DOCUMENT: &'static str = "purchase order";

    fn can_transition_to(self, next: Self) -> bool {
        use PoStatus::*;
        matches!(
            (self, next),
            (Draft, Submitted)
                | (Draft, Canceled)
                | (Submitted, Approved)
                | (Submitted, Canceled)
                | (Approved, Completed)
        )
    }
}

impl Lifecycle for GrStatus {
    const DOCUMENT: &'static str = "goods receipt";

    fn can_transition_to(self, next: Self) -> bool {
        use GrStatus::*;
        matches!((self, next), (Pending, Partial) | (Pending, Completed))
    }
}

/// Turns the row count of a compare-and-set status update into a result.
///
/// Zero rows means another request changed the status between our read and
/// our write.
pub fn ensure_swapped<S: Lifecycle>(
    rows_affected: u64,
    id: Uuid,
    expected: S,
) -> Result<(), ServiceError> {
    if rows_affected == 0 {
        Err(ServiceError::Conflict(format!(
            "{} {} is no longer {}",
            S::DOCUMENT,
            id,
            expected
        )))
    } else {
        Ok(())
    }
}
