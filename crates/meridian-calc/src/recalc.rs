//! # Recalculation Coordinator
//!
//! Background task that keeps the header totals in sync with the line
//! grid by calling the remote calculation service, without blocking the
//! editing thread and without flooding the service during a burst of
//! keystrokes.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Recalculation Pipeline                              │
//! │                                                                         │
//! │  grid/header edit ──► RecalcHandle::notify_changed()                    │
//! │                              │ (try_send, never blocks)                 │
//! │                              ▼                                          │
//! │                      ┌───────────────┐   every trigger resets the       │
//! │                      │ debounce timer │   timer; it fires only after    │
//! │                      │    (300 ms)    │   a quiet gap                   │
//! │                      └───────┬───────┘                                  │
//! │                              ▼                                          │
//! │          no valid lines? ──► zero totals, drop the manual discount,     │
//! │                              no remote call                             │
//! │          key == last applied? ──► skip (nothing material changed)       │
//! │                              │                                          │
//! │                              ▼                                          │
//! │                  service.recalculate(request)                           │
//! │                              │                                          │
//! │          key still current? ──► write totals into the header            │
//! │          key changed meanwhile ──► discard (stale response)             │
//! │          error ──► warn + emit event, totals untouched                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Requests are serial: the loop awaits the service call inline, so a
//! second request cannot start while one is in flight. Triggers arriving
//! during a call queue in the channel and restart the debounce after it
//! returns.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::draft::DraftState;
use crate::error::{CalcError, CalcResult};
use crate::events::TableEventSink;
use crate::service::{CalcRequest, CalculationService};

/// Quiet gap after the last edit before a recalculation fires.
pub const RECALC_DEBOUNCE: Duration = Duration::from_millis(300);

// =============================================================================
// Handle
// =============================================================================

/// Cloneable handle for nudging the coordinator from edit paths.
#[derive(Debug, Clone)]
pub struct RecalcHandle {
    trigger_tx: mpsc::Sender<()>,
    shutdown_tx: mpsc::Sender<()>,
}

impl RecalcHandle {
    /// Signals that some recalculation input changed.
    ///
    /// Never blocks: if a trigger is already queued, this one coalesces
    /// into it.
    pub fn notify_changed(&self) {
        let _ = self.trigger_tx.try_send(());
    }

    /// Asks the coordinator task to stop.
    pub async fn shutdown(&self) -> CalcResult<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| CalcError::ChannelClosed)
    }
}

// =============================================================================
// Coordinator
// =============================================================================

/// Debouncing recalculation loop over the shared draft.
pub struct RecalcCoordinator {
    state: DraftState,
    service: Arc<dyn CalculationService>,
    events: Arc<dyn TableEventSink>,
    debounce: Duration,
    trigger_rx: mpsc::Receiver<()>,
    shutdown_rx: mpsc::Receiver<()>,

    /// Cache key of the last request whose totals were applied.
    last_applied_key: Option<String>,
}

/// What a debounce expiry decided to do, resolved under the draft lock.
enum Plan {
    /// No valid lines: totals were zeroed locally already.
    Zeroed,
    /// State unchanged since the last applied response.
    Unchanged,
    /// Call the service with this request, built from state `key`.
    Call { key: String, request: CalcRequest },
}

impl RecalcCoordinator {
    /// Creates a coordinator over `state` with the standard debounce.
    pub fn new(
        state: DraftState,
        service: Arc<dyn CalculationService>,
        events: Arc<dyn TableEventSink>,
    ) -> (Self, RecalcHandle) {
        Self::with_debounce(state, service, events, RECALC_DEBOUNCE)
    }

    /// Like [`RecalcCoordinator::new`] with an explicit debounce window.
    pub fn with_debounce(
        state: DraftState,
        service: Arc<dyn CalculationService>,
        events: Arc<dyn TableEventSink>,
        debounce: Duration,
    ) -> (Self, RecalcHandle) {
        let (trigger_tx, trigger_rx) = mpsc::channel(1);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let coordinator = RecalcCoordinator {
            state,
            service,
            events,
            debounce,
            trigger_rx,
            shutdown_rx,
            last_applied_key: None,
        };
        let handle = RecalcHandle {
            trigger_tx,
            shutdown_tx,
        };
        (coordinator, handle)
    }

    /// Creates the coordinator and spawns its loop onto the runtime.
    pub fn spawn(
        state: DraftState,
        service: Arc<dyn CalculationService>,
        events: Arc<dyn TableEventSink>,
    ) -> RecalcHandle {
        let (coordinator, handle) = Self::new(state, service, events);
        tokio::spawn(coordinator.run());
        handle
    }

    /// Runs until shutdown or until every handle is dropped.
    pub async fn run(mut self) {
        let sleep = tokio::time::sleep(self.debounce);
        tokio::pin!(sleep);
        let mut pending = false;

        loop {
            tokio::select! {
                trigger = self.trigger_rx.recv() => match trigger {
                    Some(()) => {
                        pending = true;
                        sleep.as_mut().reset(Instant::now() + self.debounce);
                    }
                    None => break,
                },
                () = sleep.as_mut(), if pending => {
                    pending = false;
                    self.recalculate_once().await;
                }
                _ = self.shutdown_rx.recv() => {
                    debug!("Recalculation coordinator shutting down");
                    break;
                }
            }
        }
    }

    /// One debounced recalculation: snapshot, maybe call, maybe apply.
    ///
    /// The draft lock is held only while snapshotting the request and
    /// while applying the response, never across the service call.
    async fn recalculate_once(&mut self) {
        let plan = {
            let last = self.last_applied_key.clone();
            self.state.with_draft_mut(|draft| {
                if !draft.has_valid_lines() {
                    // The manual discount refers to totals that no longer
                    // exist; drop it with them so it cannot feed the next
                    // recalculation once lines reappear.
                    draft.header.totals.reset();
                    draft.header.clear_manual_discount();
                    return Plan::Zeroed;
                }
                let key = draft.cache_key();
                if last.as_deref() == Some(key.as_str()) {
                    return Plan::Unchanged;
                }
                let request = draft.build_request();
                Plan::Call { key, request }
            })
        };

        match plan {
            Plan::Zeroed => {
                debug!("No valid lines, totals zeroed locally");
                // Forget the key so re-adding the same lines recalculates.
                self.last_applied_key = None;
            }
            Plan::Unchanged => {
                debug!("Recalculation inputs unchanged, skipping");
            }
            Plan::Call { key, request } => {
                debug!(lines = request.lines.len(), "Requesting recalculation");
                match self.service.recalculate(&request).await {
                    Ok(response) => {
                        let applied = self.state.with_draft_mut(|draft| {
                            if draft.cache_key() != key {
                                debug!("Discarding stale recalculation response");
                                return false;
                            }
                            response.apply_to(&mut draft.header.totals, draft.header.vat_adjusted);
                            true
                        });
                        if applied {
                            self.last_applied_key = Some(key);
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Recalculation failed, keeping last totals");
                        self.events.recalculation_failed(&e.to_string());
                    }
                }
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::OrderDraft;
    use crate::events::NoOpSink;
    use crate::service::CalcTotals;
    use crate::test_support::MockCalcService;
    use meridian_core::{LineField, ProductChoice};
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use tokio::time::sleep;

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

    fn totals(grand: &str) -> CalcTotals {
        CalcTotals {
            grand_total: dec(grand),
            ..Default::default()
        }
    }

    fn state_with_line(code: &str) -> DraftState {
        let mut draft = OrderDraft::new();
        let k = draft.lines.add_line();
        draft
            .lines
            .update_field(k, LineField::Product(choice(code)))
            .unwrap();
        draft
            .lines
            .update_field(k, LineField::UnitPrice(dec("100")))
            .unwrap();
        DraftState::new(draft)
    }

    fn spawn_over(state: &DraftState, service: &Arc<MockCalcService>) -> RecalcHandle {
        RecalcCoordinator::spawn(
            state.clone(),
            service.clone() as Arc<dyn CalculationService>,
            Arc::new(NoOpSink),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_of_triggers_yields_one_call() {
        let state = state_with_line("P-1");
        let service = MockCalcService::new();
        service.push_totals(totals("297"));
        let handle = spawn_over(&state, &service);

        for _ in 0..5 {
            handle.notify_changed();
            sleep(Duration::from_millis(50)).await;
        }
        sleep(Duration::from_millis(400)).await;

        assert_eq!(service.recalc_count(), 1);
        assert_eq!(
            state.with_draft(|d| d.header.totals.grand_total),
            dec("297")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_before_quiet_gap_does_not_fire() {
        let state = state_with_line("P-1");
        let service = MockCalcService::new();
        let handle = spawn_over(&state, &service);

        handle.notify_changed();
        sleep(Duration::from_millis(200)).await;
        assert_eq!(service.recalc_count(), 0);

        sleep(Duration::from_millis(200)).await;
        assert_eq!(service.recalc_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unchanged_state_is_not_resent() {
        let state = state_with_line("P-1");
        let service = MockCalcService::new();
        service.push_totals(totals("297"));
        let handle = spawn_over(&state, &service);

        handle.notify_changed();
        sleep(Duration::from_millis(400)).await;
        assert_eq!(service.recalc_count(), 1);

        // Same state again (e.g. commit of an identical value).
        handle.notify_changed();
        sleep(Duration::from_millis(400)).await;
        assert_eq!(service.recalc_count(), 1);

        // A material edit breaks the dedup.
        state.with_draft_mut(|d| {
            let k = d.lines.iter().next().unwrap().key;
            d.lines
                .update_field(k, LineField::Quantity(dec("2")))
                .unwrap();
        });
        handle.notify_changed();
        sleep(Duration::from_millis(400)).await;
        assert_eq!(service.recalc_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_order_zeroes_totals_without_a_call() {
        let state = DraftState::new(OrderDraft::new());
        state.with_draft_mut(|d| d.header.totals.grand_total = dec("500"));
        let service = MockCalcService::new();
        let handle = spawn_over(&state, &service);

        handle.notify_changed();
        sleep(Duration::from_millis(400)).await;

        assert_eq!(service.recalc_count(), 0);
        assert_eq!(
            state.with_draft(|d| d.header.totals.grand_total),
            Decimal::ZERO
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_emptied_order_drops_manual_discount() {
        let state = state_with_line("P-1");
        state.with_draft_mut(|d| d.header.manual_discount_before_vat = "10%".into());
        let service = MockCalcService::new();
        let handle = spawn_over(&state, &service);

        // Soft-delete the only valid line, as the delete path does.
        state.with_draft_mut(|d| {
            let k = d.lines.iter().next().unwrap().key;
            d.lines.soft_delete_or_remove(k).unwrap();
        });
        handle.notify_changed();
        sleep(Duration::from_millis(400)).await;

        assert_eq!(service.recalc_count(), 0);
        assert_eq!(
            state.with_draft(|d| d.header.manual_discount_before_vat.clone()),
            ""
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_last_good_totals() {
        let state = state_with_line("P-1");
        state.with_draft_mut(|d| d.header.totals.grand_total = dec("111"));
        let service = MockCalcService::new();
        service.push_recalc_err(CalcError::Transport("connection refused".into()));
        let handle = spawn_over(&state, &service);

        handle.notify_changed();
        sleep(Duration::from_millis(400)).await;

        assert_eq!(service.recalc_count(), 1);
        assert_eq!(
            state.with_draft(|d| d.header.totals.grand_total),
            dec("111")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_response_is_discarded() {
        let state = state_with_line("P-1");
        let service = MockCalcService::new();
        service.push_totals(totals("999"));
        service.hold_next_call();
        let handle = spawn_over(&state, &service);

        handle.notify_changed();
        sleep(Duration::from_millis(400)).await;
        // The call is now parked inside the mock.
        service.entered.notified().await;

        // Edit while the response is in flight.
        state.with_draft_mut(|d| {
            let k = d.lines.iter().next().unwrap().key;
            d.lines
                .update_field(k, LineField::Quantity(dec("7")))
                .unwrap();
        });
        service.release.notify_one();
        sleep(Duration::from_millis(50)).await;

        // Stale totals never land.
        assert_ne!(
            state.with_draft(|d| d.header.totals.grand_total),
            dec("999")
        );

        // The queued follow-up recalculates the edited state.
        service.push_totals(totals("700"));
        handle.notify_changed();
        sleep(Duration::from_millis(400)).await;
        assert_eq!(service.recalc_count(), 2);
        assert_eq!(
            state.with_draft(|d| d.header.totals.grand_total),
            dec("700")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_the_loop() {
        let state = state_with_line("P-1");
        let service = MockCalcService::new();
        let (coordinator, handle) = RecalcCoordinator::new(
            state.clone(),
            service.clone() as Arc<dyn CalculationService>,
            Arc::new(NoOpSink),
        );
        let task = tokio::spawn(coordinator.run());

        handle.shutdown().await.unwrap();
        task.await.unwrap();

        // Triggers after shutdown are inert.
        handle.notify_changed();
        sleep(Duration::from_millis(400)).await;
        assert_eq!(service.recalc_count(), 0);
    }
}
