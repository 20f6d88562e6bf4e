//! Result state and the submission state machine
//!
//! These types don't depend on the terminal UI; the one-shot CLI reuses
//! `ResultState` to collapse failures the same way the TUI does.

use crate::recommend::{FetchError, Recommendation, RecommendationResponse, FETCH_FAILED};

/// What the user currently sees below the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultState {
    Error(String),
    Recommendations(Vec<Recommendation>),
}

impl ResultState {
    /// Collapse transport and decode failures into the fixed message;
    /// an application error from the service is kept verbatim.
    pub fn from_outcome(outcome: Result<RecommendationResponse, FetchError>) -> Self {
        match outcome {
            Ok(RecommendationResponse::Error { error }) => ResultState::Error(error),
            Ok(RecommendationResponse::Recommendations(recs)) => {
                ResultState::Recommendations(recs)
            }
            Err(e) => {
                tracing::warn!(error = %e, "recommendation request failed");
                ResultState::Error(FETCH_FAILED.to_string())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Settled,
}

/// Tracks in-flight submissions by sequence number.
///
/// Every submit gets a fresh number. Only the response carrying the most
/// recently issued number is applied; anything older is dropped.
#[derive(Debug, Default)]
pub struct Submission {
    last_issued: u64,
    loading: bool,
    result: Option<ResultState>,
}

impl Submission {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new submission. Clears the previous result immediately.
    pub fn begin(&mut self) -> u64 {
        self.last_issued += 1;
        self.loading = true;
        self.result = None;
        self.last_issued
    }

    /// Apply a response. Returns false if `seq` was superseded.
    pub fn settle(&mut self, seq: u64, result: ResultState) -> bool {
        if seq != self.last_issued || !self.loading {
            tracing::debug!(seq, latest = self.last_issued, "discarding stale response");
            return false;
        }
        self.loading = false;
        self.result = Some(result);
        true
    }

    pub fn phase(&self) -> Phase {
        if self.loading {
            Phase::Loading
        } else if self.result.is_some() {
            Phase::Settled
        } else {
            Phase::Idle
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn result(&self) -> Option<&ResultState> {
        self.result.as_ref()
    }
}
