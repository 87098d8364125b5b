//! # Calculation Service Interface
//!
//! Wire types and the trait seam for the one remote service this engine
//! consumes: "compute order totals", used in two modes.
//!
//! ## Request / Response Shapes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Calculation Service Protocol                          │
//! │                                                                         │
//! │  RECALCULATION MODE                                                    │
//! │  ──────────────────                                                    │
//! │  engine ───► CalcRequest { header, lines[] }                           │
//! │  service ◄── CalcTotals { subtotal, discount, VAT base/amount, ... }   │
//! │                                                                         │
//! │  VALIDATION MODE (delete pre-flight)                                   │
//! │  ───────────────────────────────────                                   │
//! │  engine ───► CalcRequest (simulated post-delete state)                 │
//! │  service ◄── ok, or a rejection message shown to the user verbatim     │
//! │                                                                         │
//! │  One detail entry per VALID line (product selected, not deleted);      │
//! │  deleted lines never reach the service.                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use meridian_core::{HeaderTotals, OrderHeader, OrderLine};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CalcResult;

/// Flag value the service expects while VAT is manually adjusted.
pub const VAT_ADJUSTED_FLAG: &str = "Y";

// =============================================================================
// Request
// =============================================================================

/// Header block of a calculation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalcHeader {
    /// Digit precision settings the service rounds with.
    pub quantity_digits: u32,
    pub unit_price_digits: u32,
    pub total_digits: u32,

    /// `"Y"` while VAT is manually adjusted, empty otherwise.
    pub vat_adjusted_flag: String,

    pub exchange_rate: Decimal,
    pub vat_rate_percent: Decimal,

    /// Sum of pre-discount line totals, document currency.
    pub total_before_discount: Decimal,

    /// Manual discount-before-VAT entry (amount or `n%`), possibly empty.
    pub manual_discount_before_vat: String,

    /// Manual VAT base/amount, meaningful only with the flag set.
    pub manual_vat_base: Decimal,
    pub manual_vat_amount: Decimal,
}

/// One detail entry of a calculation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalcLine {
    /// Display sequence of the line among non-deleted lines.
    pub line_sequence: u32,

    pub product_code: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,

    /// Discount string exactly as committed in the grid.
    pub discount: String,

    /// `quantity × unit_price`, pre-discount, document currency.
    pub line_total: Decimal,

    /// The same amount in local currency at the header exchange rate.
    pub line_total_local: Decimal,
}

/// A complete calculation request, shared by both service modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalcRequest {
    pub header: CalcHeader,
    pub lines: Vec<CalcLine>,
}

impl CalcRequest {
    /// Builds a request from the given valid lines and header fields.
    ///
    /// `lines` must already be filtered to the valid subset; the builder
    /// does not consult `row_status` again.
    pub fn build<'a>(lines: impl Iterator<Item = &'a OrderLine>, header: &OrderHeader) -> Self {
        let detail: Vec<CalcLine> = lines
            .map(|l| {
                let line_total = l.gross_total();
                CalcLine {
                    line_sequence: l.display_sequence,
                    product_code: l.product_code.clone(),
                    quantity: l.quantity,
                    unit_price: l.unit_price,
                    discount: l.discount.clone(),
                    line_total,
                    line_total_local: line_total * header.exchange_rate,
                }
            })
            .collect();

        let total_before_discount = detail.iter().map(|l| l.line_total).sum();

        CalcRequest {
            header: CalcHeader {
                quantity_digits: header.precision.quantity,
                unit_price_digits: header.precision.unit_price,
                total_digits: header.precision.total,
                vat_adjusted_flag: if header.vat_adjusted {
                    VAT_ADJUSTED_FLAG.to_string()
                } else {
                    String::new()
                },
                exchange_rate: header.exchange_rate,
                vat_rate_percent: header.vat_rate_percent,
                total_before_discount,
                manual_discount_before_vat: header.manual_discount_before_vat.clone(),
                manual_vat_base: if header.vat_adjusted {
                    header.manual_vat_base
                } else {
                    Decimal::ZERO
                },
                manual_vat_amount: if header.vat_adjusted {
                    header.manual_vat_amount
                } else {
                    Decimal::ZERO
                },
            },
            lines: detail,
        }
    }
}

// =============================================================================
// Response
// =============================================================================

/// Computed totals returned in recalculation mode.
///
/// Field-for-field the derived half of the order header; a successful
/// response overwrites [`HeaderTotals`] wholesale (VAT base/amount
/// excepted while manually adjusted).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalcTotals {
    pub total_before_discount: Decimal,
    pub discount_amount: Decimal,
    pub discount_amount_local: Decimal,
    pub total_before_vat: Decimal,
    pub vat_base: Decimal,
    pub vat_amount: Decimal,
    pub grand_total: Decimal,
}

impl CalcTotals {
    /// Writes these totals into a header summary.
    ///
    /// While VAT is manually adjusted the response's VAT base/amount are
    /// ignored: the user's entries stand and feed the next request.
    pub fn apply_to(&self, totals: &mut HeaderTotals, vat_adjusted: bool) {
        totals.total_before_discount = self.total_before_discount;
        totals.discount_amount = self.discount_amount;
        totals.discount_amount_local = self.discount_amount_local;
        totals.total_before_vat = self.total_before_vat;
        if !vat_adjusted {
            totals.vat_base = self.vat_base;
            totals.vat_amount = self.vat_amount;
        }
        totals.grand_total = self.grand_total;
    }
}

// =============================================================================
// Service Trait
// =============================================================================

/// The remote "compute order totals" service, in both of its modes.
///
/// The production implementation is [`crate::http::HttpCalculationService`];
/// tests substitute recording mocks.
#[async_trait]
pub trait CalculationService: Send + Sync {
    /// Recalculation mode: returns the computed header totals.
    async fn recalculate(&self, request: &CalcRequest) -> CalcResult<CalcTotals>;

    /// Validation mode: `Ok(())` when the given order state is
    /// acceptable, `Err(CalcError::Rejected { .. })` with the server's
    /// message when it is not.
    async fn validate(&self, request: &CalcRequest) -> CalcResult<()>;
}

// =============================================================================
// Unit Tests
// =============================================================================
