//! # Formatted Number Editor
//!
//! A buffered, comma-formatted, cursor-stable editor for one numeric
//! cell (quantity or unit price).
//!
//! ## Why Buffered?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE REFORMAT-ON-KEYSTROKE PROBLEM                                      │
//! │                                                                         │
//! │  Naive formatted inputs re-render "1234.5" → "1,234.50" on every       │
//! │  keystroke and throw the caret to the end, so typing into the          │
//! │  middle of a price is impossible.                                      │
//! │                                                                         │
//! │  OUR SOLUTION: an explicit edit buffer                                 │
//! │    • committed value  - owned by the line, only updated on blur        │
//! │    • edit buffer      - exists between focus and blur, reformatted     │
//! │                         after every accepted key with the caret        │
//! │                         compensated for separators moved around it     │
//! │                                                                         │
//! │  The parent only ever observes committed, parsed numbers.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Keystroke Rules
//! - Only digits and the decimal point are accepted; everything else is
//!   silently ignored.
//! - The decimal point key does not insert a second point: it jumps the
//!   caret just past the existing one.
//! - A digit typed inside the fractional part overwrites the digit under
//!   the caret, so the fraction can never grow past the precision.
//! - A digit typed at the very start while the integer part reads `0`
//!   overwrites the leading zero.
//! - Backspace removes integer digits, zeroes fractional digits in
//!   place, skips separators, and never deletes the decimal point.
//! - After every accepted edit the buffer is regrouped and the caret is
//!   repositioned by significant-character count, clamped so it can
//!   never sit beyond the last fractional digit.
//! - Blur parses the buffer (separators stripped, unparsable ⇒ 0) and
//!   propagates only if the parsed value differs from the committed one.

use rust_decimal::Decimal;

use crate::format::{self, DECIMAL_POINT, GROUP_SEPARATOR};
use crate::DEFAULT_PRECISION;

// =============================================================================
// Keys
// =============================================================================

/// A keystroke delivered to the editor while it has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKey {
    /// A character key; only ASCII digits have any effect.
    Char(char),
    /// The decimal point key.
    Point,
    /// Backspace.
    Backspace,
}

// =============================================================================
// Editor
// =============================================================================

#[derive(Debug, Clone)]
struct EditBuffer {
    text: String,
    caret: usize,
}

/// Buffered editor over one committed numeric value.
#[derive(Debug, Clone)]
pub struct FormattedNumberEditor {
    committed: Decimal,
    precision: u32,
    buffer: Option<EditBuffer>,
}

impl FormattedNumberEditor {
    /// Creates an editor over a committed value with the given precision.
    pub fn new(committed: Decimal, precision: u32) -> Self {
        FormattedNumberEditor {
            committed,
            precision,
            buffer: None,
        }
    }

    /// Creates an editor with the default precision (2).
    pub fn with_default_precision(committed: Decimal) -> Self {
        Self::new(committed, DEFAULT_PRECISION)
    }

    /// The last committed value.
    pub fn committed(&self) -> Decimal {
        self.committed
    }

    /// Whether an edit buffer is currently open.
    pub fn is_editing(&self) -> bool {
        self.buffer.is_some()
    }

    /// The text currently shown in the cell: the edit buffer while
    /// focused, otherwise the committed value fully formatted.
    pub fn display(&self) -> String {
        match &self.buffer {
            Some(buf) => buf.text.clone(),
            None => format::format_grouped(self.committed, self.precision),
        }
    }

    /// Caret position within the edit buffer, if one is open.
    pub fn caret(&self) -> Option<usize> {
        self.buffer.as_ref().map(|b| b.caret)
    }

    /// Repositions the caret (mouse click), clamped to the buffer.
    pub fn set_caret(&mut self, pos: usize) {
        if let Some(buf) = &mut self.buffer {
            buf.caret = pos.min(buf.text.len());
        }
    }

    /// Opens the edit buffer, seeded with the formatted committed value.
    /// No-op if already focused.
    pub fn focus(&mut self) {
        if self.buffer.is_none() {
            let text = format::format_grouped(self.committed, self.precision);
            let caret = text.len();
            self.buffer = Some(EditBuffer { text, caret });
        }
    }

    /// Applies one keystroke to the open edit buffer.
    ///
    /// Rejected keystrokes simply have no effect; nothing is surfaced.
    pub fn press(&mut self, key: EditorKey) {
        if self.buffer.is_none() {
            return;
        }
        match key {
            EditorKey::Char(c) if c.is_ascii_digit() => self.press_digit(c),
            EditorKey::Char(c) if c == DECIMAL_POINT => self.press_point(),
            EditorKey::Char(_) => {}
            EditorKey::Point => self.press_point(),
            EditorKey::Backspace => self.press_backspace(),
        }
    }

    /// Closes the edit buffer, parsing it back to a number.
    ///
    /// Returns `Some(value)` only when the parsed value differs from the
    /// committed one; the caller then writes it into the line and the
    /// editor adopts it as the new committed value.
    pub fn blur(&mut self) -> Option<Decimal> {
        let buf = self.buffer.take()?;
        let value = format::parse_grouped(&buf.text).round_dp(self.precision);
        if value != self.committed {
            self.committed = value;
            Some(value)
        } else {
            None
        }
    }

    // =========================================================================
    // Keystroke handling
    // =========================================================================

    fn press_digit(&mut self, digit: char) {
        let buf = self.buffer.as_mut().expect("press_digit without buffer");
        let dot = buf.text.find(DECIMAL_POINT);
        let caret = buf.caret.min(buf.text.len());

        match dot {
            Some(dot) if caret > dot => {
                // Fractional zone: overwrite, never insert, so the
                // fractional width stays at the precision.
                if caret >= buf.text.len() {
                    return;
                }
                buf.text.replace_range(caret..caret + 1, &digit.to_string());
                buf.caret = caret + 1;
            }
            _ => {
                // Integer zone. A digit at the very start overwrites a
                // lone leading zero instead of producing "07".
                let int_is_zero = matches!(dot, Some(d) if &buf.text[..d] == "0")
                    || (dot.is_none() && buf.text == "0");
                if caret == 0 && int_is_zero {
                    buf.text.replace_range(0..1, &digit.to_string());
                    buf.caret = 1;
                } else {
                    buf.text.insert(caret, digit);
                    buf.caret = caret + 1;
                }
            }
        }

        self.reformat();
    }

    fn press_point(&mut self) {
        let buf = self.buffer.as_mut().expect("press_point without buffer");
        // Never insert a second point; jump just past the existing one.
        if let Some(dot) = buf.text.find(DECIMAL_POINT) {
            buf.caret = dot + 1;
        }
    }

    fn press_backspace(&mut self) {
        let buf = self.buffer.as_mut().expect("press_backspace without buffer");
        if buf.caret == 0 {
            return;
        }
        let mut p = buf.caret - 1;
        let bytes = buf.text.as_bytes();

        if bytes[p] == DECIMAL_POINT as u8 {
            // The point is structural; just step over it.
            buf.caret = p;
            return;
        }
        if bytes[p] == GROUP_SEPARATOR as u8 {
            // Separators are presentation only; delete the digit before.
            if p == 0 {
                return;
            }
            p -= 1;
        }

        let dot = buf.text.find(DECIMAL_POINT);
        if matches!(dot, Some(d) if p > d) {
            // Fractional digits are zeroed in place to preserve width.
            buf.text.replace_range(p..p + 1, "0");
        } else {
            buf.text.remove(p);
        }
        buf.caret = p;
        self.reformat();
    }

    // =========================================================================
    // Reformatting
    // =========================================================================

    /// Regroups the buffer and repositions the caret.
    ///
    /// The caret is carried across the rewrite by counting significant
    /// characters (digits and the point) before it, then clamped so it
    /// never sits beyond the last fractional digit.
    fn reformat(&mut self) {
        let buf = self.buffer.as_mut().expect("reformat without buffer");
        let caret = buf.caret.min(buf.text.len());

        let significant_before = buf.text[..caret]
            .chars()
            .filter(|c| Self::is_significant(*c))
            .count();

        let (dot, raw): (Option<usize>, String) = {
            let raw: String = buf
                .text
                .chars()
                .filter(|c| *c != GROUP_SEPARATOR)
                .collect();
            (raw.find(DECIMAL_POINT), raw)
        };

        // Integer part: digits only, lone zero when emptied out.
        let int_end = dot.unwrap_or(raw.len());
        let mut int_part: String = raw[..int_end].chars().filter(char::is_ascii_digit).collect();
        while int_part.len() > 1 && int_part.starts_with('0') {
            int_part.remove(0);
        }
        if int_part.is_empty() {
            int_part.push('0');
        }

        // Fractional part: truncated/padded to exactly the precision.
        let mut new_text = Self::group(&int_part);
        if self.precision > 0 {
            let mut frac: String = match dot {
                Some(d) => raw[d + 1..].chars().filter(char::is_ascii_digit).collect(),
                None => String::new(),
            };
            frac.truncate(self.precision as usize);
            while frac.len() < self.precision as usize {
                frac.push('0');
            }
            new_text.push(DECIMAL_POINT);
            new_text.push_str(&frac);
        }

        // Carry the caret across by significant-character count.
        let mut new_caret = 0;
        let mut seen = 0;
        if significant_before > 0 {
            new_caret = new_text.len();
            for (i, c) in new_text.char_indices() {
                if Self::is_significant(c) {
                    seen += 1;
                    if seen == significant_before {
                        new_caret = i + 1;
                        break;
                    }
                }
            }
        }

        buf.text = new_text;
        buf.caret = new_caret;
    }

    fn is_significant(c: char) -> bool {
        c.is_ascii_digit() || c == DECIMAL_POINT
    }

    fn group(int_digits: &str) -> String {
        let digits: Vec<char> = int_digits.chars().collect();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, d) in digits.iter().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(GROUP_SEPARATOR);
            }
            grouped.push(*d);
        }
        grouped
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
