//! Outcome Value Objects
//!
//! The closed vocabulary exchanged between the pipeline phases.
//!
//! ## Legal outcomes per phase
//! - `validate_request`: everything except [`Outcome::ProtocolError`]
//! - `secure_response`: [`Outcome::ResponseAuthenticated`],
//!   [`Outcome::ResponseIncomplete`], [`Outcome::ResponseFailure`]

use derive_more::Display;
use serde::{Deserialize, Serialize};

// ============================================================================
// Outcome
// ============================================================================

/// Result of a single phase call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    /// Caller verified, nothing written to the response
    #[display("AUTHENTICATED")]
    Authenticated,

    /// Caller verified, the module already wrote to the response
    #[display("RESPONSE_AUTHENTICATED")]
    ResponseAuthenticated,

    /// Multi-step handshake unfinished; the interim response goes back as is
    #[display("RESPONSE_INCOMPLETE")]
    ResponseIncomplete,

    /// The module failed and wrote (or intends) a failure response
    #[display("RESPONSE_FAILURE")]
    ResponseFailure,

    /// Absent or unrecognized value
    #[display("PROTOCOL_ERROR")]
    ProtocolError,
}

impl Outcome {
    /// Every outcome, in declaration order
    pub const ALL: [Outcome; 5] = [
        Outcome::Authenticated,
        Outcome::ResponseAuthenticated,
        Outcome::ResponseIncomplete,
        Outcome::ResponseFailure,
        Outcome::ProtocolError,
    ];

    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Authenticated => "AUTHENTICATED",
            Self::ResponseAuthenticated => "RESPONSE_AUTHENTICATED",
            Self::ResponseIncomplete => "RESPONSE_INCOMPLETE",
            Self::ResponseFailure => "RESPONSE_FAILURE",
            Self::ProtocolError => "PROTOCOL_ERROR",
        }
    }

    /// Parse a display code. Unknown codes are a protocol error.
    pub fn from_code(code: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|outcome| outcome.code().eq_ignore_ascii_case(code.trim()))
            .unwrap_or(Self::ProtocolError)
    }

    /// `Authenticated` or `ResponseAuthenticated`
    #[inline]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated | Self::ResponseAuthenticated)
    }

    /// Whether this outcome may be returned from `phase`
    ///
    /// `clean_subject` and `initialize` carry no outcome, so nothing is
    /// legal there.
    #[inline]
    pub const fn is_valid_for(&self, phase: Phase) -> bool {
        match phase {
            Phase::ValidateRequest => !matches!(self, Self::ProtocolError),
            Phase::SecureResponse => matches!(
                self,
                Self::ResponseAuthenticated | Self::ResponseIncomplete | Self::ResponseFailure
            ),
            Phase::CleanSubject | Phase::Initialize => false,
        }
    }
}

impl From<Option<Outcome>> for Outcome {
    fn from(value: Option<Outcome>) -> Self {
        value.unwrap_or(Self::ProtocolError)
    }
}

// ============================================================================
// Phase
// ============================================================================

/// The three phases of the message protocol, plus module initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Phase {
    #[display("validate_request")]
    ValidateRequest,

    #[display("secure_response")]
    SecureResponse,

    #[display("clean_subject")]
    CleanSubject,

    #[display("initialize")]
    Initialize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_codes() {
        assert_eq!(Outcome::Authenticated.to_string(), "AUTHENTICATED");
        assert_eq!(Outcome::ResponseFailure.to_string(), "RESPONSE_FAILURE");
        assert_eq!(Phase::SecureResponse.to_string(), "secure_response");
    }

    #[test]
    fn test_from_code_round_trips_known_codes() {
        for outcome in Outcome::ALL {
            assert_eq!(Outcome::from_code(outcome.code()), outcome);
        }
        assert_eq!(Outcome::from_code("SEND_CONTINUE"), Outcome::ProtocolError);
    }

    #[test]
    fn test_absent_outcome_is_protocol_error() {
        assert_eq!(Outcome::from(None), Outcome::ProtocolError);
        assert_eq!(
            Outcome::from(Some(Outcome::Authenticated)),
            Outcome::Authenticated
        );
    }

    #[test]
    fn test_phase_legality() {
        use Outcome::*;

        let validate: Vec<_> = Outcome::ALL
            .into_iter()
            .filter(|o| o.is_valid_for(Phase::ValidateRequest))
            .collect();
        assert_eq!(
            validate,
            vec![Authenticated, ResponseAuthenticated, ResponseIncomplete, ResponseFailure]
        );

        let secure: Vec<_> = Outcome::ALL
            .into_iter()
            .filter(|o| o.is_valid_for(Phase::SecureResponse))
            .collect();
        assert_eq!(
            secure,
            vec![ResponseAuthenticated, ResponseIncomplete, ResponseFailure]
        );
    }
}
