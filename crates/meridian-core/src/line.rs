//! # Order Line
//!
//! One row of a purchase order plus its discount math.
//!
//! ## Line Money Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Where line amounts come from                         │
//! │                                                                         │
//! │  unit_price ──┬──► per-unit discount (amount, or % of price)            │
//! │               │                                                         │
//! │               └──► (unit_price − per-unit discount) × quantity          │
//! │                                 │                                       │
//! │                                 ▼                                       │
//! │                          net line total ──► save payload               │
//! │                                                                         │
//! │  unit_price × quantity = gross line total ──► calculation request      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::types::{ProductChoice, RowStatus, UnitOption};
use crate::MAX_DISCOUNT_PERCENT;

// =============================================================================
// Line Key
// =============================================================================

/// Opaque stable identity of an order line.
///
/// Assigned at creation, never reused, independent of both the backend
/// line number and the display sequence - so edits keep addressing the
/// same row no matter how it is renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineKey(Uuid);

impl LineKey {
    /// Generates a fresh key (UUID v4).
    pub fn new() -> Self {
        LineKey(Uuid::new_v4())
    }
}

impl Default for LineKey {
    fn default() -> Self {
        LineKey::new()
    }
}

impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// =============================================================================
// Discount
// =============================================================================

/// A parsed discount: nothing, a fixed amount per unit, or a percentage
/// of the unit price.
///
/// The grid stores discounts as strings (`"25"`, `"10%"`, `""`); this is
/// the typed view used for math and clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discount {
    /// Empty discount cell.
    None,

    /// Fixed amount per unit, document currency.
    Amount(Decimal),

    /// Percentage of the unit price (0-100).
    Percent(Decimal),
}

impl Discount {
    /// Parses a discount string leniently.
    ///
    /// The editors guarantee the committed string is either empty, a
    /// decimal, or a decimal followed by `%`; anything else collapses to
    /// `Discount::None` rather than erroring.
    pub fn parse(text: &str) -> Discount {
        let text = text.trim();
        if text.is_empty() {
            return Discount::None;
        }

        match text.strip_suffix('%') {
            Some(pct) => match Decimal::from_str(pct.trim()) {
                Ok(v) => Discount::Percent(v),
                Err(_) => Discount::None,
            },
            None => match Decimal::from_str(text) {
                Ok(v) => Discount::Amount(v),
                Err(_) => Discount::None,
            },
        }
    }

    /// Clamps the discount to its bound: a fixed amount must not exceed
    /// `ceiling` (the unit price), a percentage must not exceed 100.
    pub fn clamped(self, ceiling: Decimal) -> Discount {
        match self {
            Discount::None => Discount::None,
            Discount::Amount(a) => Discount::Amount(a.min(ceiling)),
            Discount::Percent(p) => Discount::Percent(p.min(MAX_DISCOUNT_PERCENT)),
        }
    }

    /// The discount applied to a single unit at `unit_price`.
    ///
    /// Out-of-range values are clamped here as well, so a stale
    /// uncommitted string can never push a line total negative.
    pub fn per_unit(self, unit_price: Decimal) -> Decimal {
        match self.clamped(unit_price) {
            Discount::None => Decimal::ZERO,
            Discount::Amount(a) => a,
            Discount::Percent(p) => unit_price * p / Decimal::ONE_HUNDRED,
        }
    }
}

// =============================================================================
// Order Line
// =============================================================================

/// One row of the purchase-order grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    /// Stable identity, assigned at creation, never reused.
    pub key: LineKey,

    /// Backend-assigned line number; 0 for lines never persisted.
    pub persisted_line_number: u32,

    /// 1-based position among currently non-deleted lines ("vline").
    /// Always a contiguous 1..N sequence over the non-deleted subset;
    /// stale (and irrelevant) on `Deleted` lines.
    pub display_sequence: u32,

    pub product_code: String,
    pub product_description: String,

    /// Selected purchase unit.
    pub unit_code: String,

    /// Candidate units for the chosen product.
    pub unit_options: Vec<UnitOption>,

    /// Non-negative quantity.
    pub quantity: Decimal,

    /// Non-negative unit price, document currency.
    pub unit_price: Decimal,

    /// Committed discount string: decimal amount, decimal + `%`, or "".
    pub discount: String,

    pub row_status: RowStatus,

    /// When this row was created in the grid.
    pub created_at: DateTime<Utc>,
}

impl OrderLine {
    /// Creates a blank `New` line at the given display position.
    pub fn new_blank(display_sequence: u32) -> Self {
        OrderLine {
            key: LineKey::new(),
            persisted_line_number: 0,
            display_sequence,
            product_code: String::new(),
            product_description: String::new(),
            unit_code: String::new(),
            unit_options: Vec::new(),
            quantity: Decimal::ZERO,
            unit_price: Decimal::ZERO,
            discount: String::new(),
            row_status: RowStatus::New,
            created_at: Utc::now(),
        }
    }

    /// Applies a product selection, replacing unit data from the
    /// product's conversion set.
    pub fn apply_product(&mut self, choice: &ProductChoice) {
        self.product_code = choice.code.clone();
        self.product_description = choice.description.clone();
        self.unit_code = choice.default_unit.clone();
        self.unit_options = choice.units.clone();
    }

    /// Whether a product has been selected on this line.
    pub fn has_product(&self) -> bool {
        !self.product_code.is_empty()
    }

    /// A line participates in totals and numbering when it has a product
    /// and is not soft-deleted.
    pub fn is_valid(&self) -> bool {
        self.has_product() && self.row_status != RowStatus::Deleted
    }

    /// The committed discount, parsed.
    pub fn discount_value(&self) -> Discount {
        Discount::parse(&self.discount)
    }

    /// Pre-discount line total: `quantity × unit_price`.
    pub fn gross_total(&self) -> Decimal {
        self.quantity * self.unit_price
    }

    /// Net line total: `(unit_price − per-unit discount) × quantity`.
    pub fn net_total(&self) -> Decimal {
        let per_unit = self.discount_value().per_unit(self.unit_price);
        (self.unit_price - per_unit) * self.quantity
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
