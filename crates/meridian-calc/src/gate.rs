//! # Delete Validation Gate
//!
//! Serialized pre-flight for line deletes: simulate the order without
//! the line, ask the service to validate it, and only then commit the
//! delete to the real collection.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Delete Request Lifecycle                          │
//! │                                                                         │
//! │  request_delete(key)                                                    │
//! │        │                                                                │
//! │        ├─ permit taken? ──no──► Busy (another delete in flight)         │
//! │        ▼                                                                │
//! │  simulate without the line                                              │
//! │        │                                                                │
//! │        ├─ no valid lines left ──► commit, no remote call                │
//! │        ▼                                                                │
//! │  service.validate(simulated request)                                    │
//! │        │                                                                │
//! │        ├─ ok ────────────► commit (remove / soft-delete) ──► Deleted    │
//! │        ├─ rejected ──────► Denied, server message verbatim              │
//! │        └─ transport/etc ─► Denied, generic message                      │
//! │                                                                         │
//! │  Denied and Busy leave the line exactly as it was.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! One permit serializes the whole simulate-validate-commit sequence, so
//! two rapid delete clicks can never validate against each other's
//! uncommitted state.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::draft::DraftState;
use crate::error::CalcResult;
use crate::service::{CalcRequest, CalculationService};
use meridian_core::{CoreResult, DeleteKind, LineKey};

/// Shown when a delete fails for reasons the server did not explain.
pub const DELETE_DENIED_MESSAGE: &str = "The line cannot be deleted right now";

/// Result of a delete request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The delete was committed.
    Deleted(DeleteKind),
    /// The delete was refused; the line is unchanged.
    Denied { message: String },
    /// Another delete is still being validated; try again when it ends.
    Busy,
}

// =============================================================================
// Gate
// =============================================================================

/// Validates deletes against the service before committing them.
pub struct DeleteValidationGate {
    state: DraftState,
    service: Arc<dyn CalculationService>,
    permit: Arc<Semaphore>,
}

impl DeleteValidationGate {
    pub fn new(state: DraftState, service: Arc<dyn CalculationService>) -> Self {
        DeleteValidationGate {
            state,
            service,
            permit: Arc::new(Semaphore::new(1)),
        }
    }

    /// Whether a delete is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.permit.available_permits() == 0
    }

    /// Validates and, on success, commits the delete of `key`.
    ///
    /// Returns `Err` only for an unknown key; every service-side failure
    /// is folded into [`DeleteOutcome::Denied`].
    pub async fn request_delete(&self, key: LineKey) -> CalcResult<DeleteOutcome> {
        let _permit = match self.permit.try_acquire() {
            Ok(permit) => permit,
            Err(_) => {
                debug!(%key, "Delete requested while another is in flight");
                return Ok(DeleteOutcome::Busy);
            }
        };

        // Simulated post-delete state, captured under the lock.
        let simulated: CoreResult<Option<CalcRequest>> = self.state.with_draft(|draft| {
            let remaining = draft.lines.simulate_delete(key)?;
            if !remaining.has_valid_lines() {
                return Ok(None);
            }
            Ok(Some(CalcRequest::build(
                remaining.valid_lines(),
                &draft.header,
            )))
        });

        if let Some(request) = simulated? {
            if let Err(e) = self.service.validate(&request).await {
                if e.is_rejection() {
                    return Ok(DeleteOutcome::Denied {
                        message: e.to_string(),
                    });
                }
                warn!(error = %e, %key, "Delete validation unavailable");
                return Ok(DeleteOutcome::Denied {
                    message: DELETE_DENIED_MESSAGE.to_string(),
                });
            }
        } else {
            debug!(%key, "Delete leaves no valid lines, skipping validation");
        }

        let kind = self
            .state
            .with_draft_mut(|draft| draft.lines.soft_delete_or_remove(key))?;
        Ok(DeleteOutcome::Deleted(kind))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::OrderDraft;
    use crate::error::CalcError;
    use crate::test_support::MockCalcService;
    use meridian_core::{LineField, ProductChoice, RowStatus};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn choice(code: &str) -> ProductChoice {
        ProductChoice {
            code: code.into(),
            description: code.into(),
            units: vec![],
            default_unit: "PCS".into(),
        }
    }

    fn state_with_lines(codes: &[&str]) -> (DraftState, Vec<LineKey>) {
        let mut draft = OrderDraft::new();
        let keys: Vec<LineKey> = codes
            .iter()
            .map(|code| {
                let k = draft.lines.add_line();
                draft
                    .lines
                    .update_field(k, LineField::Product(choice(code)))
                    .unwrap();
                draft
                    .lines
                    .update_field(k, LineField::UnitPrice(dec("100")))
                    .unwrap();
                k
            })
            .collect();
        (DraftState::new(draft), keys)
    }

    #[tokio::test]
    async fn test_validated_delete_commits() {
        let (state, keys) = state_with_lines(&["P-1", "P-2"]);
        let service = MockCalcService::new();
        let gate = DeleteValidationGate::new(state.clone(), service.clone() as _);

        let outcome = gate.request_delete(keys[0]).await.unwrap();
        // New lines vanish outright.
        assert_eq!(outcome, DeleteOutcome::Deleted(DeleteKind::Removed));
        assert_eq!(service.validate_count(), 1);
        assert!(state.with_draft(|d| d.lines.get(keys[0]).is_none()));

        // The simulated request held only the surviving line.
        let request = service.last_validate_request().unwrap();
        assert_eq!(request.lines.len(), 1);
        assert_eq!(request.lines[0].product_code, "P-2");
    }

    #[tokio::test]
    async fn test_rejection_leaves_line_and_surfaces_message() {
        let (state, keys) = state_with_lines(&["P-1", "P-2"]);
        let service = MockCalcService::new();
        service.push_validate_err(CalcError::Rejected {
            message: "Line is referenced by a receipt".into(),
        });
        let gate = DeleteValidationGate::new(state.clone(), service.clone() as _);

        let outcome = gate.request_delete(keys[0]).await.unwrap();
        assert_eq!(
            outcome,
            DeleteOutcome::Denied {
                message: "Line is referenced by a receipt".into()
            }
        );
        assert_eq!(
            state.with_draft(|d| d.lines.get(keys[0]).unwrap().row_status),
            RowStatus::New
        );
    }

    #[tokio::test]
    async fn test_transport_failure_denies_with_generic_message() {
        let (state, keys) = state_with_lines(&["P-1", "P-2"]);
        let service = MockCalcService::new();
        service.push_validate_err(CalcError::Transport("connection refused".into()));
        let gate = DeleteValidationGate::new(state.clone(), service.clone() as _);

        let outcome = gate.request_delete(keys[0]).await.unwrap();
        assert_eq!(
            outcome,
            DeleteOutcome::Denied {
                message: DELETE_DENIED_MESSAGE.into()
            }
        );
    }

    #[tokio::test]
    async fn test_deleting_last_valid_line_skips_validation() {
        let (state, keys) = state_with_lines(&["P-1"]);
        let service = MockCalcService::new();
        let gate = DeleteValidationGate::new(state.clone(), service.clone() as _);

        let outcome = gate.request_delete(keys[0]).await.unwrap();
        assert_eq!(outcome, DeleteOutcome::Deleted(DeleteKind::Removed));
        assert_eq!(service.validate_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_key_is_an_error() {
        let (state, _) = state_with_lines(&["P-1"]);
        let service = MockCalcService::new();
        let gate = DeleteValidationGate::new(state, service as _);

        let err = gate.request_delete(LineKey::new()).await.unwrap_err();
        assert!(matches!(err, CalcError::Line(_)));
    }

    #[tokio::test]
    async fn test_concurrent_delete_reports_busy() {
        let (state, keys) = state_with_lines(&["P-1", "P-2", "P-3"]);
        let service = MockCalcService::new();
        service.hold_next_call();
        let gate = Arc::new(DeleteValidationGate::new(
            state.clone(),
            service.clone() as _,
        ));

        let first = {
            let gate = gate.clone();
            let key = keys[0];
            tokio::spawn(async move { gate.request_delete(key).await })
        };
        service.entered.notified().await;
        assert!(gate.is_busy());

        let second = gate.request_delete(keys[1]).await.unwrap();
        assert_eq!(second, DeleteOutcome::Busy);

        service.release.notify_one();
        let first = first.await.unwrap().unwrap();
        assert_eq!(first, DeleteOutcome::Deleted(DeleteKind::Removed));
        assert!(!gate.is_busy());
    }
}
