//! # meridian-core: Pure Business Logic for the Purchase-Order Entry Engine
//!
//! This crate is the **heart** of the order-line editing engine. It holds
//! the in-memory grid model and the cell editors as pure logic with zero
//! I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Purchase-Order Entry Engine                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                      Host UI (order form)                       │   │
//! │  │      product lookup ──► grid cells ──► header summary           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  meridian-calc (async engine)                   │   │
//! │  │    OrderTable, RecalcCoordinator, DeleteValidationGate          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ meridian-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌────────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   line    │  │ collection │  │  numeric  │  │ discount  │  │   │
//! │  │   │ OrderLine │  │ add/delete │  │ formatted │  │ amount or │  │   │
//! │  │   │ Discount  │  │ undo/renum │  │ cell edit │  │ percent   │  │   │
//! │  │   └───────────┘  └────────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO TIMERS • NO NETWORK • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (RowStatus, OrderHeader, SaveLine, ...)
//! - [`line`] - One order line and its discount math
//! - [`collection`] - The ordered line set with soft-delete/undo semantics
//! - [`numeric`] - The buffered, caret-stable formatted number editor
//! - [`discount`] - The amount-or-percent discount editor
//! - [`format`] - Thousands grouping and lenient parsing
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: every operation is deterministic and synchronous
//! 2. **No I/O**: timers and network calls live in meridian-calc, never here
//! 3. **Decimal Money**: all amounts are `rust_decimal::Decimal`, never floats
//! 4. **Committed vs. pending**: editors buffer keystrokes and only ever
//!    hand committed, validated values to the model

use rust_decimal::Decimal;

// =============================================================================
// Module Declarations
// =============================================================================

pub mod collection;
pub mod discount;
pub mod error;
pub mod format;
pub mod line;
pub mod numeric;
pub mod types;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use collection::{DeleteKind, FieldOutcome, LineCollection, LineField, PersistedLine};
pub use discount::DiscountEditor;
pub use error::{CoreError, CoreResult};
pub use line::{Discount, LineKey, OrderLine};
pub use numeric::{EditorKey, FormattedNumberEditor};
pub use types::{
    DigitPrecision, HeaderTotals, OrderHeader, ProductChoice, RowStatus, SaveLine, UnitOption,
};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default fractional precision for numeric cells.
///
/// Individual document types can override this per field through
/// [`DigitPrecision`]; 2 is the common case for currency-denominated
/// cells.
pub const DEFAULT_PRECISION: u32 = 2;

/// Upper bound for percentage discounts.
///
/// A percentage discount above 100 would push a line total negative;
/// both the discount editor (on commit) and the line math clamp to
/// this bound.
pub const MAX_DISCOUNT_PERCENT: Decimal = Decimal::ONE_HUNDRED;
