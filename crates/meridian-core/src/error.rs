//! # Error Types
//!
//! Domain-specific error types for meridian-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  meridian-core errors (this file)                                       │
//! │  └── CoreError   - Line collection / domain failures                    │
//! │                                                                         │
//! │  meridian-calc errors (separate crate)                                  │
//! │  └── CalcError   - Remote calculation / validation failures             │
//! │                                                                         │
//! │  Flow: CoreError → CalcError → host UI message                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (line key, status, etc.)
//! 3. Errors are enum variants, never String
//!
//! Note: the cell editors never return errors. A rejected keystroke is
//! silently ignored and an out-of-range discount is clamped on blur, so
//! the only fallible operations in this crate are collection lookups.

use thiserror::Error;

use crate::types::RowStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No line with the given key exists in the collection.
    ///
    /// ## When This Occurs
    /// - The key belonged to a `New` line that was already removed
    /// - The caller is holding a stale key from a previous order
    #[error("Order line not found: {0}")]
    LineNotFound(String),

    /// Undo was requested for a line that is not soft-deleted.
    #[error("Line {key} is {status:?}, only Deleted lines can be undone")]
    NotDeleted { key: String, status: RowStatus },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
