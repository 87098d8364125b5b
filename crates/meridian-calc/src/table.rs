//! # Order Table
//!
//! The facade the host UI talks to: one object that owns the shared
//! draft, the recalculation coordinator, and the delete gate, and turns
//! cell commits into model updates plus recalculation triggers.
//!
//! Every mutation funnels through here so the coordinator is nudged
//! exactly once per committed change. Cell editors are handed out
//! pre-seeded from the current line and handed back as committed values
//! through the `commit_*` methods.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use meridian_core::{
    DiscountEditor, FieldOutcome, FormattedNumberEditor, HeaderTotals, LineCollection, LineField,
    LineKey, OrderHeader, OrderLine, PersistedLine, ProductChoice, SaveLine,
};

use crate::draft::{DraftState, OrderDraft};
use crate::error::{CalcError, CalcResult};
use crate::events::{NoOpSink, TableEventSink};
use crate::gate::{DeleteOutcome, DeleteValidationGate};
use crate::recalc::{RecalcCoordinator, RecalcHandle};
use crate::service::CalculationService;

// =============================================================================
// Order Table
// =============================================================================

/// Editing session over one purchase order.
pub struct OrderTable {
    state: DraftState,
    recalc: RecalcHandle,
    gate: DeleteValidationGate,
    events: Arc<dyn TableEventSink>,
}

impl OrderTable {
    /// Opens a session over a fresh, empty order.
    pub fn new(service: Arc<dyn CalculationService>) -> Self {
        Self::open(OrderDraft::new(), service, Arc::new(NoOpSink))
    }

    /// Opens a session over `draft`, spawning the recalculation
    /// coordinator onto the current runtime.
    pub fn open(
        draft: OrderDraft,
        service: Arc<dyn CalculationService>,
        events: Arc<dyn TableEventSink>,
    ) -> Self {
        let state = DraftState::new(draft);
        let recalc = RecalcCoordinator::spawn(state.clone(), service.clone(), events.clone());
        let gate = DeleteValidationGate::new(state.clone(), service);
        info!("Order table opened");
        OrderTable {
            state,
            recalc,
            gate,
            events,
        }
    }

    /// Opens a session over an order loaded from the backend.
    pub fn open_existing(
        lines: Vec<PersistedLine>,
        header: OrderHeader,
        service: Arc<dyn CalculationService>,
        events: Arc<dyn TableEventSink>,
    ) -> Self {
        Self::open(OrderDraft::open_existing(lines, header), service, events)
    }

    // =========================================================================
    // Snapshots for Rendering
    // =========================================================================

    /// Clone of every line in storage order, deleted included.
    pub fn lines(&self) -> Vec<OrderLine> {
        self.state.with_draft(|d| d.lines.iter().cloned().collect())
    }

    /// Clone of one line.
    pub fn line(&self, key: LineKey) -> Option<OrderLine> {
        self.state.with_draft(|d| d.lines.get(key).cloned())
    }

    /// Current header totals.
    pub fn totals(&self) -> HeaderTotals {
        self.state.with_draft(|d| d.header.totals.clone())
    }

    /// Clone of the current header.
    pub fn header(&self) -> OrderHeader {
        self.state.with_draft(|d| d.header.clone())
    }

    /// Read access to the whole collection, for custom rendering.
    pub fn with_lines<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&LineCollection) -> R,
    {
        self.state.with_draft(|d| f(&d.lines))
    }

    // =========================================================================
    // Line Mutations
    // =========================================================================

    /// Appends a blank line and returns its key.
    pub fn add_line(&self) -> LineKey {
        let key = self.state.with_draft_mut(|d| d.lines.add_line());
        self.recalc.notify_changed();
        key
    }

    /// Commits one field edit to a line.
    pub fn commit_field(&self, key: LineKey, field: LineField) -> CalcResult<()> {
        let outcome = self.state.with_draft_mut(|d| -> CalcResult<FieldOutcome> {
            let outcome = d.lines.update_field(key, field)?;
            if outcome.valid_set_empty {
                // The header discount references totals that no longer
                // exist; clear it rather than carry it to the next line.
                d.header.clear_manual_discount();
            }
            Ok(outcome)
        })?;
        if outcome.valid_set_empty {
            info!(%key, "Last valid line invalidated, header discount cleared");
        }
        self.recalc.notify_changed();
        Ok(())
    }

    pub fn commit_product(&self, key: LineKey, choice: ProductChoice) -> CalcResult<()> {
        self.commit_field(key, LineField::Product(choice))
    }

    pub fn commit_quantity(&self, key: LineKey, quantity: Decimal) -> CalcResult<()> {
        self.commit_field(key, LineField::Quantity(quantity))
    }

    pub fn commit_unit_price(&self, key: LineKey, unit_price: Decimal) -> CalcResult<()> {
        self.commit_field(key, LineField::UnitPrice(unit_price))
    }

    pub fn commit_discount(&self, key: LineKey, discount: impl Into<String>) -> CalcResult<()> {
        self.commit_field(key, LineField::Discount(discount.into()))
    }

    pub fn commit_unit(&self, key: LineKey, unit_code: impl Into<String>) -> CalcResult<()> {
        self.commit_field(key, LineField::Unit(unit_code.into()))
    }

    /// Restores a soft-deleted line; it rejoins the valid set at the
    /// end of the visible order.
    pub fn undo_delete(&self, key: LineKey) -> CalcResult<()> {
        self.state
            .with_draft_mut(|d| d.lines.undo_delete(key))?;
        self.recalc.notify_changed();
        Ok(())
    }

    // =========================================================================
    // Cell Editors
    // =========================================================================

    /// A quantity editor seeded from the line's committed value.
    pub fn quantity_editor(&self, key: LineKey) -> CalcResult<FormattedNumberEditor> {
        self.state.with_draft(|d| {
            let line = d.lines.get(key).ok_or_else(|| Self::unknown(key))?;
            Ok(FormattedNumberEditor::new(
                line.quantity,
                d.header.precision.quantity,
            ))
        })
    }

    /// A unit-price editor seeded from the line's committed value.
    pub fn unit_price_editor(&self, key: LineKey) -> CalcResult<FormattedNumberEditor> {
        self.state.with_draft(|d| {
            let line = d.lines.get(key).ok_or_else(|| Self::unknown(key))?;
            Ok(FormattedNumberEditor::new(
                line.unit_price,
                d.header.precision.unit_price,
            ))
        })
    }

    /// A discount editor ceilinged by the line's unit price.
    pub fn discount_editor(&self, key: LineKey) -> CalcResult<DiscountEditor> {
        self.state.with_draft(|d| {
            let line = d.lines.get(key).ok_or_else(|| Self::unknown(key))?;
            Ok(DiscountEditor::new(line.discount.clone(), line.unit_price))
        })
    }

    fn unknown(key: LineKey) -> CalcError {
        CalcError::Line(meridian_core::CoreError::LineNotFound(key.to_string()))
    }

    // =========================================================================
    // Header Overrides
    // =========================================================================

    /// Sets the header-level manual discount ("120" or "10%").
    pub fn set_manual_discount(&self, value: impl Into<String>) {
        let value = value.into();
        self.state
            .with_draft_mut(|d| d.header.manual_discount_before_vat = value);
        self.recalc.notify_changed();
    }

    pub fn set_exchange_rate(&self, rate: Decimal) {
        self.state.with_draft_mut(|d| d.header.exchange_rate = rate);
        self.recalc.notify_changed();
    }

    pub fn set_vat_rate(&self, percent: Decimal) {
        self.state
            .with_draft_mut(|d| d.header.vat_rate_percent = percent);
        self.recalc.notify_changed();
    }

    /// Turns manual VAT adjustment on or off.
    pub fn set_vat_adjusted(&self, adjusted: bool) {
        self.state.with_draft_mut(|d| d.header.vat_adjusted = adjusted);
        self.recalc.notify_changed();
    }

    pub fn set_manual_vat_base(&self, base: Decimal) {
        self.state.with_draft_mut(|d| d.header.manual_vat_base = base);
        self.recalc.notify_changed();
    }

    pub fn set_manual_vat_amount(&self, amount: Decimal) {
        self.state
            .with_draft_mut(|d| d.header.manual_vat_amount = amount);
        self.recalc.notify_changed();
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Whether a delete is currently being validated.
    pub fn is_delete_busy(&self) -> bool {
        self.gate.is_busy()
    }

    /// Validates and commits the delete of `key`.
    pub async fn delete_line(&self, key: LineKey) -> CalcResult<DeleteOutcome> {
        let outcome = self.gate.request_delete(key).await?;
        match &outcome {
            DeleteOutcome::Deleted(_) => self.recalc.notify_changed(),
            DeleteOutcome::Denied { message } => self.events.delete_denied(message),
            DeleteOutcome::Busy => {}
        }
        Ok(outcome)
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// One save entry per line, soft-deleted included, with totals
    /// rounded to the header's total precision.
    pub fn save_payload(&self) -> Vec<SaveLine> {
        self.state
            .with_draft(|d| d.lines.save_lines(d.header.precision.total))
    }

    /// Stops the recalculation coordinator.
    pub async fn shutdown(&self) -> CalcResult<()> {
        self.recalc.shutdown().await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
