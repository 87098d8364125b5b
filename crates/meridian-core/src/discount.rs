//! # Discount Editor
//!
//! Buffered text editor over a discount string that is either a fixed
//! amount (`"25"`) or a percentage (`"10%"`).
//!
//! Unlike the numeric editor, the buffer is free-form while typing: any
//! draft matching `digits, optional '.', optional digits, optional
//! trailing '%'` is kept verbatim with no reformatting. The clamping and
//! formatting all happen on blur:
//!
//! - no `%`  → parsed as a fixed amount, clamped to the ceiling (the
//!   line's unit price), rendered with 2 decimals
//! - with `%` → numeric portion clamped to 100, `%` suffix kept
//! - empty   → no discount
//!
//! The committed value propagates only when it differs from the previous
//! one. With a zero ceiling (no unit price entered yet) the editor is
//! disabled entirely and presents a placeholder instead.

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::format;
use crate::MAX_DISCOUNT_PERCENT;

/// Placeholder shown while the editor is disabled.
pub const DISABLED_PLACEHOLDER: &str = "Enter a unit price first";

// =============================================================================
// Editor
// =============================================================================

/// Buffered editor over a discount string with a price ceiling.
#[derive(Debug, Clone)]
pub struct DiscountEditor {
    committed: String,
    ceiling: Decimal,
    buffer: Option<String>,
}

impl DiscountEditor {
    /// Creates an editor over the committed discount of a line whose
    /// unit price is `ceiling`.
    pub fn new(committed: impl Into<String>, ceiling: Decimal) -> Self {
        DiscountEditor {
            committed: committed.into(),
            ceiling,
            buffer: None,
        }
    }

    /// A discount can only be entered once the line has a price.
    pub fn is_enabled(&self) -> bool {
        self.ceiling > Decimal::ZERO
    }

    /// The placeholder to render instead of a value while disabled.
    pub fn placeholder(&self) -> Option<&'static str> {
        if self.is_enabled() {
            None
        } else {
            Some(DISABLED_PLACEHOLDER)
        }
    }

    /// The last committed discount string.
    pub fn committed(&self) -> &str {
        &self.committed
    }

    pub fn is_editing(&self) -> bool {
        self.buffer.is_some()
    }

    /// The text currently shown in the cell.
    pub fn display(&self) -> &str {
        match &self.buffer {
            Some(buf) => buf,
            None => &self.committed,
        }
    }

    /// Opens the edit buffer. No-op while disabled.
    pub fn focus(&mut self) {
        if self.is_enabled() && self.buffer.is_none() {
            self.buffer = Some(self.committed.clone());
        }
    }

    /// Replaces the draft text, accepting it verbatim when it is a valid
    /// discount shape. Returns whether the input was accepted; rejected
    /// input leaves the buffer untouched.
    pub fn input(&mut self, text: &str) -> bool {
        let Some(buf) = &mut self.buffer else {
            return false;
        };
        if Self::is_valid_draft(text) {
            *buf = text.to_string();
            true
        } else {
            false
        }
    }

    /// Closes the buffer, clamping and formatting the draft.
    ///
    /// Returns `Some(final_value)` only when the result differs from the
    /// committed value.
    pub fn blur(&mut self) -> Option<String> {
        let buf = self.buffer.take()?;
        let value = self.finalize(buf.trim());
        if value != self.committed {
            self.committed = value.clone();
            Some(value)
        } else {
            None
        }
    }

    /// Clamp-and-format pass applied on blur.
    fn finalize(&self, draft: &str) -> String {
        if draft.is_empty() {
            return String::new();
        }

        match draft.strip_suffix('%') {
            Some(num) => match Decimal::from_str(num) {
                // Percentage: clamp to 100, keep the suffix.
                Ok(pct) if pct > MAX_DISCOUNT_PERCENT => {
                    format!("{}%", MAX_DISCOUNT_PERCENT.normalize())
                }
                Ok(_) => draft.to_string(),
                Err(_) => String::new(),
            },
            None => match Decimal::from_str(draft) {
                // Fixed amount: clamp to the unit price, 2 decimals.
                Ok(amount) => format::format_fixed(amount.min(self.ceiling), 2),
                Err(_) => String::new(),
            },
        }
    }

    /// `digits, optional '.', optional digits, optional trailing '%'`.
    fn is_valid_draft(text: &str) -> bool {
        let body = text.strip_suffix('%').unwrap_or(text);
        if body.contains('%') {
            return false; // '%' anywhere but the end
        }
        let mut seen_point = false;
        for c in body.chars() {
            match c {
                '0'..='9' => {}
                '.' if !seen_point => seen_point = true,
                _ => return false,
            }
        }
        true
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
