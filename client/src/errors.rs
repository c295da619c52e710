use std::fmt;

/// Failure of a target solicitation. `Invalid` tears the pending
/// request down; the triggering action must not be sent. `Superseded`
/// means a newer request replaced this one and the waiter should
/// abandon its flow quietly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetError {
    Invalid(String),
    Superseded,
}

impl fmt::Display for TargetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetError::Invalid(reason) => write!(f, "invalid target: {}", reason),
            TargetError::Superseded => write!(f, "target request superseded"),
        }
    }
}

impl std::error::Error for TargetError {}
