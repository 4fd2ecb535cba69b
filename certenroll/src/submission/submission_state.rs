//! The submission_state module provides the states a submission passes through and a tracker
//! that enforces the permitted transitions.

use core::fmt;

use crate::util::error::*;
use crate::util::logging::*;

/// States of the submission state machine
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubmissionState {
    /// Submission received
    New,
    /// Credentials are being authenticated
    Authenticating,
    /// Controls, witnesses and proof of possession are being verified
    ControlProcessing,
    /// Policy constraints are being evaluated
    Validating,
    /// Key archival and issuance are underway
    Executing,
    /// A certificate was issued
    Complete,
    /// The request awaits manual approval or a proof of possession response
    Pending,
    /// The request was rejected
    Rejected,
}

impl SubmissionState {
    /// Returns true for states a submission does not leave during a single call
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            SubmissionState::Complete | SubmissionState::Pending | SubmissionState::Rejected
        )
    }

    /// Returns true if the state machine permits moving from this state to `to`
    pub fn can_advance_to(&self, to: SubmissionState) -> bool {
        use SubmissionState::*;
        if self.is_final() {
            return false;
        }
        matches!(
            (self, to),
            (_, Rejected)
                | (New, Authenticating)
                | (Authenticating, ControlProcessing)
                | (ControlProcessing, Validating)
                | (ControlProcessing, Pending)
                | (Validating, Executing)
                | (Executing, Complete)
        )
    }
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SubmissionState::New => "NEW",
            SubmissionState::Authenticating => "AUTHENTICATING",
            SubmissionState::ControlProcessing => "CONTROL_PROCESSING",
            SubmissionState::Validating => "VALIDATING",
            SubmissionState::Executing => "EXECUTING",
            SubmissionState::Complete => "COMPLETE",
            SubmissionState::Pending => "PENDING",
            SubmissionState::Rejected => "REJECTED",
        };
        write!(f, "{}", s)
    }
}

/// Tracks the state of a submission, or of one request within it
#[derive(Clone, Debug)]
pub struct StateMachine {
    label: String,
    state: SubmissionState,
}

impl StateMachine {
    /// Creates a tracker in the [`SubmissionState::New`] state
    pub fn new(label: &str) -> Self {
        Self::resume(label, SubmissionState::New)
    }

    /// Creates a tracker in the given state, e.g., to resume a request at control processing
    pub fn resume(label: &str, state: SubmissionState) -> Self {
        StateMachine {
            label: label.to_string(),
            state,
        }
    }

    /// Returns the current state
    pub fn state(&self) -> SubmissionState {
        self.state
    }

    /// Moves to `to`, failing with [`Error::InternalError`] if the transition is not permitted
    pub fn advance(&mut self, to: SubmissionState) -> Result<()> {
        if !self.state.can_advance_to(to) {
            return Err(Error::InternalError(format!(
                "{}: invalid state transition from {} to {}",
                self.label, self.state, to
            )));
        }
        log_message(
            &EeLogLevels::EeDebug,
            format!("{}: {} -> {}", self.label, self.state, to).as_str(),
        );
        self.state = to;
        Ok(())
    }

    /// Moves to [`SubmissionState::Rejected`] unless already in a final state
    pub fn reject(&mut self) {
        if !self.state.is_final() {
            log_message(
                &EeLogLevels::EeDebug,
                format!("{}: {} -> {}", self.label, self.state, SubmissionState::Rejected)
                    .as_str(),
            );
            self.state = SubmissionState::Rejected;
        }
    }
}

#[test]
fn state_machine_test() {
    use SubmissionState::*;
    let mut sm = StateMachine::new("submission");
    assert!(sm.advance(ControlProcessing).is_err());
    sm.advance(Authenticating).unwrap();
    sm.advance(ControlProcessing).unwrap();
    assert!(sm.advance(Executing).is_err());
    sm.advance(Validating).unwrap();
    sm.advance(Executing).unwrap();
    sm.advance(Complete).unwrap();
    assert!(sm.advance(Rejected).is_err());
    sm.reject();
    assert_eq!(Complete, sm.state());

    let mut sm = StateMachine::resume("request 1", ControlProcessing);
    sm.advance(Pending).unwrap();
    assert!(sm.advance(Validating).is_err());

    let mut sm = StateMachine::resume("request 2", ControlProcessing);
    sm.reject();
    assert_eq!(Rejected, sm.state());
    assert_eq!("CONTROL_PROCESSING", ControlProcessing.to_string());
}
