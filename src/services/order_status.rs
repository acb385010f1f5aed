//! Order status state machine.
//!
//! Orders are created PROCESSING and move exactly once to a terminal
//! state. Funding records are born terminal (topup_successful). Admin
//! corrections may force any transition, but only with the explicit
//! force flag.

use std::fmt;
use std::str::FromStr;

use crate::error::{AppError, DomainError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Processing,
    DataSent,
    DataFailed,
    TopupSuccessful,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::DataSent => "data_sent",
            OrderStatus::DataFailed => "data_failed",
            OrderStatus::TopupSuccessful => "topup_successful",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Processing)
    }

    /// Whether `self -> to` is a legal unforced transition
    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        matches!(
            (self, to),
            (OrderStatus::Processing, OrderStatus::DataSent)
                | (OrderStatus::Processing, OrderStatus::DataFailed)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PROCESSING" => Ok(OrderStatus::Processing),
            "data_sent" => Ok(OrderStatus::DataSent),
            "data_failed" => Ok(OrderStatus::DataFailed),
            "topup_successful" => Ok(OrderStatus::TopupSuccessful),
            other => Err(format!("Unknown order status: {}", other)),
        }
    }
}

/// Validate a requested transition, honoring the admin force flag
pub fn check_transition(from: OrderStatus, to: OrderStatus, force: bool) -> Result<(), AppError> {
    if force || from.can_transition_to(to) {
        Ok(())
    } else {
        Err(AppError::domain(DomainError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_reaches_both_terminal_states() {
        assert!(check_transition(OrderStatus::Processing, OrderStatus::DataSent, false).is_ok());
        assert!(check_transition(OrderStatus::Processing, OrderStatus::DataFailed, false).is_ok());
    }

    #[test]
    fn test_terminal_states_are_sticky_without_force() {
        assert!(check_transition(OrderStatus::DataSent, OrderStatus::DataFailed, false).is_err());
        assert!(check_transition(OrderStatus::DataFailed, OrderStatus::DataSent, false).is_err());
        assert!(
            check_transition(OrderStatus::TopupSuccessful, OrderStatus::Processing, false)
                .is_err()
        );
    }

    #[test]
    fn test_force_allows_any_transition() {
        assert!(check_transition(OrderStatus::DataSent, OrderStatus::DataFailed, true).is_ok());
        assert!(check_transition(OrderStatus::DataFailed, OrderStatus::Processing, true).is_ok());
    }

    #[test]
    fn test_round_trips_through_strings() {
        for status in [
            OrderStatus::Processing,
            OrderStatus::DataSent,
            OrderStatus::DataFailed,
            OrderStatus::TopupSuccessful,
        ] {
            assert_eq!(OrderStatus::from_str(status.as_str()), Ok(status));
        }
        assert!(OrderStatus::from_str("shipped").is_err());
    }
}
