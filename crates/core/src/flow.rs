//! Stages of a single generation-to-package flow.
//!
//! ```text
//! Requested -> Built -> Validated(valid)   -> Packaged
//!                    -> Validated(invalid) -> Rejected
//! ```
//!
//! There is no retry edge; a rejected flow is terminal.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum Stage {
    Requested,
    Built,
    Validated { valid: bool },
    Packaged,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Build,
    Validate { valid: bool },
    Package,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid transition from {from:?} on {event:?}")]
pub struct TransitionError {
    pub from: Stage,
    pub event: Event,
}

impl Stage {
    pub fn advance(self, event: Event) -> Result<Stage, TransitionError> {
        match (self, event) {
            (Stage::Requested, Event::Build) => Ok(Stage::Built),
            (Stage::Built, Event::Validate { valid }) => Ok(Stage::Validated { valid }),
            (Stage::Validated { valid: true }, Event::Package) => Ok(Stage::Packaged),
            (Stage::Validated { valid: false }, Event::Reject) => Ok(Stage::Rejected),
            (from, event) => Err(TransitionError { from, event }),
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Packaged | Stage::Rejected)
    }
}
