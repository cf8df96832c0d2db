//! Session state machine
//!
//! `Disconnected -> Connecting -> Connected -> Disconnected`, with a failed
//! login going straight from `Connecting` back to `Disconnected`.

use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    /// Encryption and login in progress
    Connecting,
    /// Logged in with a session key
    Connected { session: String },
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    /// Session key while logged in
    pub fn session(&self) -> Option<&str> {
        match self {
            Self::Connected { session } => Some(session),
            _ => None,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected { .. } => write!(f, "Connected"),
        }
    }
}

/// State transition validator
pub struct StateTransition<'a> {
    from: &'a ConnectionState,
    to: &'a ConnectionState,
}

impl<'a> StateTransition<'a> {
    pub fn new(from: &'a ConnectionState, to: &'a ConnectionState) -> Self {
        Self { from, to }
    }

    pub fn is_valid(&self) -> bool {
        use ConnectionState::*;

        matches!(
            (self.from, self.to),
            (Disconnected, Connecting)
                | (Connecting, Connected { .. })
                | (Connecting, Disconnected)
                | (Connected { .. }, Disconnected)
        )
    }

    pub fn validation_error(&self) -> Option<String> {
        if self.is_valid() {
            None
        } else {
            Some(format!(
                "Invalid transition from {} to {}",
                self.from, self.to
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected() -> ConnectionState {
        ConnectionState::Connected {
            session: "abc123".to_string(),
        }
    }

    #[test]
    fn test_state_capabilities() {
        assert!(!ConnectionState::Disconnected.is_connected());
        assert_eq!(ConnectionState::Connecting.session(), None);
        assert!(connected().is_connected());
        assert_eq!(connected().session(), Some("abc123"));
    }

    #[test]
    fn test_valid_transitions() {
        let valid = [
            (ConnectionState::Disconnected, ConnectionState::Connecting),
            (ConnectionState::Connecting, connected()),
            (ConnectionState::Connecting, ConnectionState::Disconnected),
            (connected(), ConnectionState::Disconnected),
        ];

        for (from, to) in &valid {
            let transition = StateTransition::new(from, to);
            assert!(transition.is_valid(), "{from} -> {to} should be valid");
            assert_eq!(transition.validation_error(), None);
        }
    }

    #[test]
    fn test_invalid_transitions() {
        let invalid = [
            (ConnectionState::Disconnected, connected()),
            (connected(), ConnectionState::Connecting),
            (ConnectionState::Disconnected, ConnectionState::Disconnected),
        ];

        for (from, to) in &invalid {
            let transition = StateTransition::new(from, to);
            assert!(!transition.is_valid(), "{from} -> {to} should be invalid");
            assert!(transition.validation_error().is_some());
        }
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ConnectionState::Disconnected.to_string(), "Disconnected");
        assert_eq!(connected().to_string(), "Connected");
    }
}
