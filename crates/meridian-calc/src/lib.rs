//! # meridian-calc: Async Engine for the Purchase-Order Entry Screen
//!
//! Everything time- and network-shaped in the order entry engine lives
//! here: the debounced totals recalculation, the validated delete flow,
//! and the [`OrderTable`] facade the host UI drives.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Host UI (order form)                             │
//! │       cell commits ──► OrderTable ◄── delete clicks / header edits      │
//! └───────────────────────────────┬─────────────────────────────────────────┘
//! │
//! ┌───────────────────────────────▼─────────────────────────────────────────┐
//! │                   ★ meridian-calc (THIS CRATE) ★                        │
//! │                                                                         │
//! │   OrderTable ──────┬──► DraftState (Arc<Mutex<OrderDraft>>)             │
//! │   (facade)         │                                                    │
//! │                    ├──► RecalcCoordinator  300 ms debounce,             │
//! │                    │    (background task)  key dedup, stale guard       │
//! │                    │                                                    │
//! │                    └──► DeleteValidationGate  simulate → validate →     │
//! │                         (Semaphore(1))        commit                    │
//! │                                                                         │
//! │   Both coordinators speak to one CalculationService (HTTP in prod,     │
//! │   recording mocks in tests) and report trouble via TableEventSink.     │
//! └───────────────────────────────┬─────────────────────────────────────────┘
//! │
//! ┌───────────────────────────────▼─────────────────────────────────────────┐
//! │            meridian-core: lines, editors, header (pure)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency Rules
//!
//! 1. The draft mutex is never held across an await.
//! 2. Recalculation requests are serial; the loop awaits each call.
//! 3. At most one delete validates at a time; extra requests get `Busy`.
//! 4. A response only lands if the draft's cache key still matches the
//!    key the request was built from.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod draft;
pub mod error;
pub mod events;
pub mod gate;
pub mod http;
pub mod recalc;
pub mod service;
pub mod table;

#[cfg(test)]
pub(crate) mod test_support;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use draft::{DraftState, OrderDraft};
pub use error::{CalcError, CalcResult};
pub use events::{NoOpSink, TableEventSink};
pub use gate::{DeleteOutcome, DeleteValidationGate, DELETE_DENIED_MESSAGE};
pub use http::HttpCalculationService;
pub use recalc::{RecalcCoordinator, RecalcHandle, RECALC_DEBOUNCE};
pub use service::{CalcRequest, CalcTotals, CalculationService};
pub use table::OrderTable;
