//! # Order Draft State
//!
//! The shared in-memory state of the order being edited: the line
//! collection plus the header, behind one mutex.
//!
//! ## Thread Safety
//! The draft is wrapped in `Arc<Mutex<T>>` because the host UI mutates
//! it from event handlers while the recalculation coordinator and the
//! delete gate read it from background tasks. Neither coordinator ever
//! mutates line contents: recalculation writes only the header summary,
//! the gate only commits a delete that was just validated. All critical
//! sections are short; nothing holds the lock across an await.

use std::sync::{Arc, Mutex};

use meridian_core::{LineCollection, OrderHeader, PersistedLine};

use crate::service::{CalcRequest, VAT_ADJUSTED_FLAG};

// =============================================================================
// Order Draft
// =============================================================================

/// The order being edited: lines + header.
#[derive(Debug, Clone, Default)]
pub struct OrderDraft {
    pub lines: LineCollection,
    pub header: OrderHeader,
}

impl OrderDraft {
    /// A fresh, empty order.
    pub fn new() -> Self {
        OrderDraft::default()
    }

    /// An existing order loaded from the backend.
    pub fn open_existing(lines: Vec<PersistedLine>, header: OrderHeader) -> Self {
        OrderDraft {
            lines: LineCollection::load_existing(lines),
            header,
        }
    }

    /// Whether any line participates in totals.
    pub fn has_valid_lines(&self) -> bool {
        self.lines.has_valid_lines()
    }

    /// Builds the calculation request for the current state.
    pub fn build_request(&self) -> CalcRequest {
        CalcRequest::build(self.lines.valid_lines(), &self.header)
    }

    /// The cache key summarizing every input that affects the
    /// recalculation result ("calcKey").
    ///
    /// Two states with equal keys produce equal totals, so a request
    /// whose key matches the previously applied one is skipped, and a
    /// response whose key no longer matches the current state is stale.
    pub fn cache_key(&self) -> String {
        let mut key = String::new();
        for line in self.lines.valid_lines() {
            key.push_str(&format!(
                "{}:{}:{}:{}|",
                line.product_code, line.quantity, line.unit_price, line.discount
            ));
        }
        key.push_str(&format!(
            "#{}:{}:{}:{}:{}:{}",
            self.header.manual_discount_before_vat,
            self.header.exchange_rate,
            self.header.vat_rate_percent,
            if self.header.vat_adjusted { VAT_ADJUSTED_FLAG } else { "" },
            self.header.manual_vat_base,
            self.header.manual_vat_amount,
        ));
        key
    }
}

// =============================================================================
// Shared Draft State
// =============================================================================

/// Shared handle to the draft, cloned into every coordinator.
#[derive(Debug, Clone, Default)]
pub struct DraftState {
    draft: Arc<Mutex<OrderDraft>>,
}

impl DraftState {
    pub fn new(draft: OrderDraft) -> Self {
        DraftState {
            draft: Arc::new(Mutex::new(draft)),
        }
    }

    /// Executes a function with read access to the draft.
    pub fn with_draft<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&OrderDraft) -> R,
    {
        let draft = self.draft.lock().expect("Draft mutex poisoned");
        f(&draft)
    }

    /// Executes a function with write access to the draft.
    pub fn with_draft_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut OrderDraft) -> R,
    {
        let mut draft = self.draft.lock().expect("Draft mutex poisoned");
        f(&mut draft)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
