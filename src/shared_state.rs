use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use axum::extract::FromRef;

use crate::models::prediction::PredictionResult;
use crate::models::system::{ConfigCommand, SystemConfiguration};
use crate::services::prediction_service::Predictor;

/// Lifecycle of the single logical prediction request.
///
/// `Idle → Pending → {Success, Failure}`, and back to `Pending` on every new
/// submission. Each submission carries a monotonic sequence number; only a
/// resolution for the latest sequence may leave `Pending`, so an
/// out-of-order response from a superseded request can never overwrite a
/// newer state.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionState {
    Idle,
    Pending { seq: u64 },
    Success { seq: u64, result: PredictionResult },
    Failure { seq: u64, message: String },
}

#[derive(Clone, Debug)]
pub struct AppState {
    /// The session's system configuration — the single mutable owner
    pub system: Arc<RwLock<SystemConfiguration>>,
    /// Current prediction lifecycle state
    pub prediction: Arc<RwLock<PredictionState>>,
    /// Sequence number of the most recent submission
    seq: Arc<AtomicU64>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            system: Arc::new(RwLock::new(SystemConfiguration::default())),
            prediction: Arc::new(RwLock::new(PredictionState::Idle)),
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Apply one configuration edit and return the updated configuration.
    pub fn apply_command(&self, command: &ConfigCommand) -> SystemConfiguration {
        if let Ok(mut system) = self.system.write() {
            system.apply(command);
            system.clone()
        } else {
            SystemConfiguration::default()
        }
    }

    pub fn system_snapshot(&self) -> SystemConfiguration {
        if let Ok(system) = self.system.read() {
            system.clone()
        } else {
            SystemConfiguration::default()
        }
    }

    /// Start a new submission: bump the sequence, enter `Pending` and drop
    /// any previous result — a stale forecast is never shown alongside a
    /// newer request. The sequence is bumped while holding the state lock,
    /// so the stored `Pending` always carries the latest sequence.
    pub fn begin_prediction(&self) -> u64 {
        if let Ok(mut state) = self.prediction.write() {
            let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
            *state = PredictionState::Pending { seq };
            seq
        } else {
            self.seq.fetch_add(1, Ordering::SeqCst) + 1
        }
    }

    /// Resolve the submission tagged `seq`. Discarded unless `seq` is still
    /// the latest submission. The comparison happens under the same lock
    /// submissions bump the sequence under, so a newer submission cannot
    /// slip in between the check and the write.
    pub fn resolve_prediction(&self, seq: u64, outcome: Result<PredictionResult, String>) {
        if let Ok(mut state) = self.prediction.write() {
            if seq != self.seq.load(Ordering::SeqCst) {
                println!("[PREDICT] Discarding superseded response (seq {})", seq);
                return;
            }
            *state = match outcome {
                Ok(result) => PredictionState::Success { seq, result },
                Err(message) => PredictionState::Failure { seq, message },
            };
        }
    }

    pub fn prediction_state(&self) -> PredictionState {
        if let Ok(state) = self.prediction.read() {
            state.clone()
        } else {
            PredictionState::Idle
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the handlers need, extractable piecewise via `FromRef` —
/// a single `.with_state(shared)` covers all of it.
#[derive(Clone)]
pub struct SharedState {
    pub app: AppState,
    pub predictor: Arc<Predictor>,
}

impl FromRef<SharedState> for AppState {
    fn from_ref(shared: &SharedState) -> AppState {
        shared.app.clone()
    }
}

impl FromRef<SharedState> for Arc<Predictor> {
    fn from_ref(shared: &SharedState) -> Arc<Predictor> {
        shared.predictor.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::prediction::LossBreakdown;

    fn result(annual: f64) -> PredictionResult {
        PredictionResult {
            annual_energy_kwh: annual,
            monthly_energy_kwh: vec![annual / 12.0; 12],
            performance_ratio: 0.8,
            loss_breakdown_kwh: LossBreakdown::default(),
        }
    }

    #[test]
    fn submission_moves_idle_to_pending() {
        let state = AppState::new();
        assert_eq!(state.prediction_state(), PredictionState::Idle);
        let seq = state.begin_prediction();
        assert_eq!(state.prediction_state(), PredictionState::Pending { seq });
    }

    #[test]
    fn latest_resolution_lands() {
        let state = AppState::new();
        let seq = state.begin_prediction();
        state.resolve_prediction(seq, Ok(result(1000.0)));
        match state.prediction_state() {
            PredictionState::Success { seq: s, result } => {
                assert_eq!(s, seq);
                assert_eq!(result.annual_energy_kwh, 1000.0);
            }
            other => panic!("expected Success, got {:?}", other),
        }
    }

    #[test]
    fn superseded_resolution_is_discarded() {
        let state = AppState::new();
        let first = state.begin_prediction();
        let second = state.begin_prediction();
        // The first request resolves late; the newer Pending must survive.
        state.resolve_prediction(first, Ok(result(1.0)));
        assert_eq!(state.prediction_state(), PredictionState::Pending { seq: second });
        state.resolve_prediction(second, Ok(result(2.0)));
        match state.prediction_state() {
            PredictionState::Success { result, .. } => {
                assert_eq!(result.annual_energy_kwh, 2.0);
            }
            other => panic!("expected Success, got {:?}", other),
        }
    }

    #[test]
    fn new_submission_clears_previous_result() {
        let state = AppState::new();
        let seq = state.begin_prediction();
        state.resolve_prediction(seq, Ok(result(1000.0)));
        let next = state.begin_prediction();
        assert_eq!(state.prediction_state(), PredictionState::Pending { seq: next });
    }

    #[test]
    fn failure_replaces_previous_success() {
        let state = AppState::new();
        let seq = state.begin_prediction();
        state.resolve_prediction(seq, Ok(result(1000.0)));
        let next = state.begin_prediction();
        state.resolve_prediction(next, Err("Failed to generate prediction".to_string()));
        match state.prediction_state() {
            PredictionState::Failure { seq: s, message } => {
                assert_eq!(s, next);
                assert_eq!(message, "Failed to generate prediction");
            }
            other => panic!("expected Failure, got {:?}", other),
        }
    }

    #[test]
    fn concurrent_submissions_leave_only_the_latest_state() {
        let state = AppState::new();
        let threads = 8u64;
        let rounds = 200u64;

        let workers: Vec<_> = (0..threads)
            .map(|_| {
                let state = state.clone();
                std::thread::spawn(move || {
                    for _ in 0..rounds {
                        let seq = state.begin_prediction();
                        state.resolve_prediction(seq, Ok(result(seq as f64)));
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        // The last submission overall is the highest sequence; whatever
        // interleaving happened, nothing older may survive it.
        let last = threads * rounds;
        match state.prediction_state() {
            PredictionState::Success { seq, result } => {
                assert_eq!(seq, last);
                assert_eq!(result.annual_energy_kwh, last as f64);
            }
            other => panic!("expected Success for seq {}, got {:?}", last, other),
        }
    }

    #[test]
    fn config_edits_go_through_the_reducer() {
        use crate::models::system::LocationField;
        let state = AppState::new();
        let updated = state.apply_command(&ConfigCommand::Location {
            field: LocationField::Altitude,
            value: serde_json::json!(250),
        });
        assert_eq!(updated.location.altitude, 250.0);
        assert_eq!(state.system_snapshot().location.altitude, 250.0);
    }
}
