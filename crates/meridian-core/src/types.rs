//! # Domain Types
//!
//! Core domain types for the purchase-order entry engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   OrderLine     │   │  OrderHeader    │   │    SaveLine     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  key (UUID)     │   │  overrides      │   │  status tag     │       │
//! │  │  displaySeq     │   │  exchange rate  │   │  line totals    │       │
//! │  │  qty/price/disc │   │  HeaderTotals   │   │  (save payload) │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                              │
//! │  │   RowStatus     │   │ ProductChoice   │                              │
//! │  │  ─────────────  │   │  ─────────────  │                              │
//! │  │  New            │   │  code / desc    │                              │
//! │  │  Existing       │   │  unit options   │                              │
//! │  │  Deleted        │   │  default unit   │                              │
//! │  └─────────────────┘   └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// =============================================================================
// Row Status
// =============================================================================

/// Lifecycle status of an order line.
///
/// ## Why a closed enum and not a boolean?
/// Renumbering and save-payload construction both switch on the status
/// exhaustively. A `deleted: bool` next to an `is_new: bool` would allow
/// the impossible "new and deleted" combination; the enum cannot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum RowStatus {
    /// Created in this editing session; the backend has never seen it.
    /// Removing a `New` line deletes it outright.
    New,

    /// Loaded from a persisted order (possibly edited since).
    /// Removing an `Existing` line soft-deletes it so the save payload
    /// can report the removal to the backend.
    Existing,

    /// Soft-removed: excluded from totals and display numbering but kept
    /// in the collection so it can be undone or reported on save.
    Deleted,
}

// =============================================================================
// Product Selection
// =============================================================================

/// One purchase unit a product can be ordered in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UnitOption {
    /// Unit code (e.g. "PCS", "BOX12").
    pub code: String,

    /// Display name shown in the unit dropdown.
    pub name: String,
}

/// The result of a product lookup, applied to a line when the user picks
/// a product.
///
/// The lookup service itself is an external collaborator; this is the
/// shape the engine consumes. Selecting a product replaces the line's
/// unit code and unit options wholesale from the product's conversion
/// data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductChoice {
    /// Product code - business identifier.
    pub code: String,

    /// Display description.
    pub description: String,

    /// Candidate purchase units for this product.
    pub units: Vec<UnitOption>,

    /// Unit preselected when the product is chosen.
    pub default_unit: String,
}

// =============================================================================
// Digit Precision
// =============================================================================

/// Per-field digit precision settings, sent with every calculation
/// request so the service rounds the same way the grid displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigitPrecision {
    pub quantity: u32,
    pub unit_price: u32,
    pub total: u32,
}

impl Default for DigitPrecision {
    fn default() -> Self {
        DigitPrecision {
            quantity: 2,
            unit_price: 2,
            total: 2,
        }
    }
}

// =============================================================================
// Header Totals
// =============================================================================

/// The derived financial summary of the order header.
///
/// ## Ownership
/// Every field here is overwritten wholesale by a successful
/// recalculation response (VAT base/amount excepted while manual VAT
/// adjustment is enabled). Nothing in this struct is hand-edited; the
/// user-editable override fields live on [`OrderHeader`] instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderTotals {
    /// Sum of pre-discount line totals, document currency.
    pub total_before_discount: Decimal,

    /// Total discount amount, document currency.
    pub discount_amount: Decimal,

    /// Total discount amount, local currency.
    pub discount_amount_local: Decimal,

    /// Total after discount, before VAT.
    pub total_before_vat: Decimal,

    /// Base amount VAT is computed from.
    pub vat_base: Decimal,

    /// VAT amount.
    pub vat_amount: Decimal,

    /// Grand total (total before VAT + VAT amount).
    pub grand_total: Decimal,
}

impl HeaderTotals {
    /// Resets every derived field to zero.
    ///
    /// Used by the empty-order fast path: when no valid line remains
    /// there is nothing to calculate remotely, the summary is simply
    /// zeroed in place.
    pub fn reset(&mut self) {
        *self = HeaderTotals::default();
    }
}

// =============================================================================
// Order Header
// =============================================================================

/// Header-level inputs of the order form that feed recalculation.
///
/// ## Two kinds of fields
/// - Override fields (`manual_*`, `exchange_rate`, `vat_rate_percent`,
///   `vat_adjusted`) are user inputs; every one of them is a member of
///   the recalculation trigger set.
/// - `totals` is derived output, written only by the coordinator (or
///   the empty-order fast path).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderHeader {
    /// Digit precision settings for this document type.
    pub precision: DigitPrecision,

    /// Document-to-local currency exchange rate.
    pub exchange_rate: Decimal,

    /// VAT rate in percent (e.g. 10 = 10%).
    pub vat_rate_percent: Decimal,

    /// Whether the user manually adjusts the VAT base/amount.
    pub vat_adjusted: bool,

    /// Manual discount-before-VAT entry, amount or percentage string.
    /// Empty when not used. Cleared when the valid-line set empties.
    pub manual_discount_before_vat: String,

    /// Manually entered VAT base, honored only while `vat_adjusted`.
    pub manual_vat_base: Decimal,

    /// Manually entered VAT amount, honored only while `vat_adjusted`.
    pub manual_vat_amount: Decimal,

    /// Derived summary, owned by the recalculation coordinator.
    pub totals: HeaderTotals,
}

impl Default for OrderHeader {
    fn default() -> Self {
        OrderHeader {
            precision: DigitPrecision::default(),
            exchange_rate: Decimal::ONE,
            vat_rate_percent: Decimal::ZERO,
            vat_adjusted: false,
            manual_discount_before_vat: String::new(),
            manual_vat_base: Decimal::ZERO,
            manual_vat_amount: Decimal::ZERO,
            totals: HeaderTotals::default(),
        }
    }
}

impl OrderHeader {
    /// Clears the manual discount-before-VAT override.
    pub fn clear_manual_discount(&mut self) {
        self.manual_discount_before_vat.clear();
    }
}

// =============================================================================
// Save Payload
// =============================================================================

/// One line of the "save order" payload handed to the persistence API.
///
/// The engine emits this projection but does not own the save call.
/// Deleted lines are included (tagged [`RowStatus::Deleted`]) so the
/// backend can remove them; their `line_number` is the number the
/// backend originally assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveLine {
    /// Backend-assigned line number; 0 for lines never persisted.
    pub line_number: u32,

    /// Visible position among non-deleted lines at save time.
    pub display_sequence: u32,

    /// `New` / `Existing` / `Deleted` tag the persistence API switches on.
    pub status: RowStatus,

    pub product_code: String,
    pub unit_code: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,

    /// Discount exactly as committed in the grid (amount or `n%`).
    pub discount: String,

    /// Net line total, rounded to the header's total precision.
    pub line_total: Decimal,
}

// =============================================================================
// Unit Tests
// =============================================================================
