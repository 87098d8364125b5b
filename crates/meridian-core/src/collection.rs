//! # Line Collection
//!
//! The ordered set of order lines plus every structural operation the
//! grid performs on them.
//!
//! ## Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   LineCollection Operations                             │
//! │                                                                         │
//! │  Grid Action              Operation                 Effect              │
//! │  ───────────              ─────────                 ──────              │
//! │                                                                         │
//! │  Click "Add line" ──────► add_line() ─────────────► push New, renumber │
//! │                                                                         │
//! │  Edit a cell ───────────► update_field() ─────────► in-place mutation  │
//! │                                                                         │
//! │  Delete (New line) ─────► soft_delete_or_remove() ► physically removed │
//! │  Delete (Existing) ─────► soft_delete_or_remove() ► status = Deleted   │
//! │                                                                         │
//! │  Undo delete ───────────► undo_delete() ──────────► back to Existing,  │
//! │                                                      appended at end   │
//! │                                                                         │
//! │  Every structural change ends with a dense 1..N renumber of the        │
//! │  non-deleted subset, in its existing relative order.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::line::{LineKey, OrderLine};
use crate::types::{ProductChoice, RowStatus, SaveLine, UnitOption};

// =============================================================================
// Field Updates
// =============================================================================

/// One editable cell of a line.
#[derive(Debug, Clone)]
pub enum LineField {
    /// Product selection; also replaces unit code and unit options from
    /// the product's conversion data.
    Product(ProductChoice),
    Quantity(Decimal),
    UnitPrice(Decimal),
    /// Committed discount string (amount, `n%`, or empty).
    Discount(String),
    Unit(String),
}

/// What a field update did to the collection as a whole.
#[derive(Debug, Clone, Copy)]
pub struct FieldOutcome {
    /// True when the update left no valid line (non-deleted, product
    /// selected). The caller clears the header's manual
    /// discount-before-VAT override in that case.
    pub valid_set_empty: bool,
}

/// How a delete request was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteKind {
    /// The line was `New`; it was removed from the collection outright.
    Removed,
    /// The line was `Existing`; it was soft-deleted and can be undone.
    SoftDeleted,
}

// =============================================================================
// Persisted Line (loading an existing order)
// =============================================================================

/// One backend line of a previously saved order, as handed to
/// [`LineCollection::load_existing`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedLine {
    pub line_number: u32,
    pub product_code: String,
    pub product_description: String,
    pub unit_code: String,
    pub unit_options: Vec<UnitOption>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub discount: String,
}

// =============================================================================
// Line Collection
// =============================================================================

/// The ordered set of order lines.
///
/// ## Invariants
/// - `display_sequence` over non-deleted lines is always the dense set
///   `{1..N}` in their existing relative order.
/// - Deleted lines stay in the collection (for undo and for the save
///   payload); removed `New` lines do not.
/// - Keys are never reused; `add_line` always mints a fresh one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineCollection {
    lines: Vec<OrderLine>,
}

impl LineCollection {
    /// Creates an empty collection (new order).
    pub fn new() -> Self {
        LineCollection { lines: Vec::new() }
    }

    /// Loads the lines of an existing order, one `Existing` line per
    /// backend line, numbered in the given order.
    pub fn load_existing(persisted: Vec<PersistedLine>) -> Self {
        let lines = persisted
            .into_iter()
            .enumerate()
            .map(|(i, p)| OrderLine {
                persisted_line_number: p.line_number,
                display_sequence: (i + 1) as u32,
                product_code: p.product_code,
                product_description: p.product_description,
                unit_code: p.unit_code,
                unit_options: p.unit_options,
                quantity: p.quantity,
                unit_price: p.unit_price,
                discount: p.discount,
                row_status: RowStatus::Existing,
                ..OrderLine::new_blank(0)
            })
            .collect();

        LineCollection { lines }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// All lines, deleted ones included, in backing order.
    pub fn iter(&self) -> impl Iterator<Item = &OrderLine> {
        self.lines.iter()
    }

    /// Lines that participate in totals: product selected, not deleted.
    pub fn valid_lines(&self) -> impl Iterator<Item = &OrderLine> {
        self.lines.iter().filter(|l| l.is_valid())
    }

    /// Whether any line participates in totals.
    pub fn has_valid_lines(&self) -> bool {
        self.lines.iter().any(|l| l.is_valid())
    }

    /// Looks a line up by key.
    pub fn get(&self, key: LineKey) -> Option<&OrderLine> {
        self.lines.iter().find(|l| l.key == key)
    }

    /// Total number of lines, deleted ones included.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of non-deleted (visible) lines.
    pub fn visible_len(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| l.row_status != RowStatus::Deleted)
            .count()
    }

    // =========================================================================
    // Structural Operations
    // =========================================================================

    /// Appends a blank `New` line and returns its key.
    pub fn add_line(&mut self) -> LineKey {
        let seq = self.visible_len() as u32 + 1;
        let line = OrderLine::new_blank(seq);
        let key = line.key;
        self.lines.push(line);
        key
    }

    /// Deletes a line: `New` lines are removed outright (the backend
    /// never knew about them), `Existing` lines are soft-deleted so the
    /// save payload can report the removal. Either way the remaining
    /// non-deleted lines are renumbered densely.
    pub fn soft_delete_or_remove(&mut self, key: LineKey) -> CoreResult<DeleteKind> {
        let idx = self.index_of(key)?;
        let kind = match self.lines[idx].row_status {
            RowStatus::New => {
                self.lines.remove(idx);
                DeleteKind::Removed
            }
            RowStatus::Existing | RowStatus::Deleted => {
                self.lines[idx].row_status = RowStatus::Deleted;
                DeleteKind::SoftDeleted
            }
        };
        self.renumber();
        Ok(kind)
    }

    /// Restores a soft-deleted line to `Existing`.
    ///
    /// The line re-enters the visible ordering at the end; its original
    /// position is not restored.
    pub fn undo_delete(&mut self, key: LineKey) -> CoreResult<()> {
        let idx = self.index_of(key)?;
        if self.lines[idx].row_status != RowStatus::Deleted {
            return Err(CoreError::NotDeleted {
                key: key.to_string(),
                status: self.lines[idx].row_status,
            });
        }

        // Move to the tail of the backing vector so the dense renumber
        // below assigns it the last display sequence.
        let mut line = self.lines.remove(idx);
        line.row_status = RowStatus::Existing;
        self.lines.push(line);
        self.renumber();
        Ok(())
    }

    /// Updates one cell of a line in place.
    ///
    /// Does not touch `display_sequence` or `row_status`. Selecting a
    /// product additionally replaces the unit code and unit options from
    /// the product's conversion data.
    pub fn update_field(&mut self, key: LineKey, field: LineField) -> CoreResult<FieldOutcome> {
        let idx = self.index_of(key)?;
        let line = &mut self.lines[idx];

        match field {
            LineField::Product(choice) => line.apply_product(&choice),
            LineField::Quantity(q) => line.quantity = q,
            LineField::UnitPrice(p) => line.unit_price = p,
            LineField::Discount(d) => line.discount = d,
            LineField::Unit(u) => line.unit_code = u,
        }

        Ok(FieldOutcome {
            valid_set_empty: !self.has_valid_lines(),
        })
    }

    /// Recomputes `display_sequence` as a dense 1..N sequence over the
    /// non-deleted lines, preserving their relative order. Deleted lines
    /// keep whatever sequence they had at deletion time.
    fn renumber(&mut self) {
        let mut seq = 0u32;
        for line in &mut self.lines {
            if line.row_status != RowStatus::Deleted {
                seq += 1;
                line.display_sequence = seq;
            }
        }
    }

    fn index_of(&self, key: LineKey) -> CoreResult<usize> {
        self.lines
            .iter()
            .position(|l| l.key == key)
            .ok_or_else(|| CoreError::LineNotFound(key.to_string()))
    }

    // =========================================================================
    // Projections
    // =========================================================================

    /// The collection as it would look immediately after deleting `key`,
    /// without mutating real state. Used by the delete-validation gate
    /// to pre-flight the post-delete order.
    pub fn simulate_delete(&self, key: LineKey) -> CoreResult<LineCollection> {
        let mut simulated = self.clone();
        simulated.soft_delete_or_remove(key)?;
        Ok(simulated)
    }

    /// Builds the save payload: every line tagged `New`/`Existing`/
    /// `Deleted` with its final values and a per-line total rounded to
    /// `total_digits`.
    pub fn save_lines(&self, total_digits: u32) -> Vec<SaveLine> {
        self.lines
            .iter()
            .map(|l| SaveLine {
                line_number: l.persisted_line_number,
                display_sequence: l.display_sequence,
                status: l.row_status,
                product_code: l.product_code.clone(),
                unit_code: l.unit_code.clone(),
                quantity: l.quantity,
                unit_price: l.unit_price,
                discount: l.discount.clone(),
                line_total: l.net_total().round_dp(total_digits),
            })
            .collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn choice(code: &str) -> ProductChoice {
        ProductChoice {
            code: code.to_string(),
            description: format!("Product {code}"),
            units: vec![UnitOption {
                code: "PCS".into(),
                name: "Piece".into(),
            }],
            default_unit: "PCS".into(),
        }
    }

    fn persisted(line_number: u32, code: &str) -> PersistedLine {
        PersistedLine {
            line_number,
            product_code: code.to_string(),
            product_description: format!("Product {code}"),
            unit_code: "PCS".into(),
            unit_options: vec![],
            quantity: dec("1"),
            unit_price: dec("10"),
            discount: String::new(),
        }
    }

    /// Display sequences of non-deleted lines, in backing order.
    fn visible_seqs(c: &LineCollection) -> Vec<u32> {
        c.iter()
            .filter(|l| l.row_status != RowStatus::Deleted)
            .map(|l| l.display_sequence)
            .collect()
    }

    #[test]
    fn test_add_line_appends_with_next_sequence() {
        let mut c = LineCollection::new();
        c.add_line();
        let k2 = c.add_line();

        assert_eq!(visible_seqs(&c), vec![1, 2]);
        assert_eq!(c.get(k2).unwrap().row_status, RowStatus::New);
        assert_eq!(c.get(k2).unwrap().quantity, Decimal::ZERO);
        assert_eq!(c.get(k2).unwrap().discount, "");
    }

    #[test]
    fn test_delete_new_line_removes_it() {
        let mut c = LineCollection::new();
        let k1 = c.add_line();
        let k2 = c.add_line();
        let k3 = c.add_line();

        let kind = c.soft_delete_or_remove(k2).unwrap();
        assert_eq!(kind, DeleteKind::Removed);
        assert!(c.get(k2).is_none());
        assert_eq!(c.len(), 2);
        assert_eq!(visible_seqs(&c), vec![1, 2]);
        assert_eq!(c.get(k1).unwrap().display_sequence, 1);
        assert_eq!(c.get(k3).unwrap().display_sequence, 2);
    }

    #[test]
    fn test_delete_existing_line_soft_deletes() {
        let mut c = LineCollection::load_existing(vec![
            persisted(1, "A"),
            persisted(2, "B"),
            persisted(3, "C"),
        ]);
        let key = c.iter().nth(1).unwrap().key;

        let kind = c.soft_delete_or_remove(key).unwrap();
        assert_eq!(kind, DeleteKind::SoftDeleted);

        // Still present, excluded from numbering, backend number kept.
        let line = c.get(key).unwrap();
        assert_eq!(line.row_status, RowStatus::Deleted);
        assert_eq!(line.persisted_line_number, 2);
        assert_eq!(c.len(), 3);
        assert_eq!(c.visible_len(), 2);
        assert_eq!(visible_seqs(&c), vec![1, 2]);
    }

    #[test]
    fn test_undo_delete_appends_at_end() {
        let mut c = LineCollection::load_existing(vec![
            persisted(1, "A"),
            persisted(2, "B"),
            persisted(3, "C"),
        ]);
        let key = c.iter().next().unwrap().key;

        c.soft_delete_or_remove(key).unwrap();
        c.undo_delete(key).unwrap();

        let line = c.get(key).unwrap();
        assert_eq!(line.row_status, RowStatus::Existing);
        // Undo does not restore position: "A" is now last.
        assert_eq!(line.display_sequence, 3);
        assert_eq!(visible_seqs(&c), vec![1, 2, 3]);
    }

    #[test]
    fn test_undo_requires_deleted_status() {
        let mut c = LineCollection::load_existing(vec![persisted(1, "A")]);
        let key = c.iter().next().unwrap().key;

        let err = c.undo_delete(key).unwrap_err();
        assert!(matches!(err, CoreError::NotDeleted { .. }));
    }

    #[test]
    fn test_sequences_dense_after_mixed_operations() {
        let mut c = LineCollection::load_existing(vec![persisted(1, "A"), persisted(2, "B")]);
        let a = c.iter().next().unwrap().key;
        let new1 = c.add_line();
        c.update_field(new1, LineField::Product(choice("C"))).unwrap();

        c.soft_delete_or_remove(a).unwrap();
        c.add_line();
        c.undo_delete(a).unwrap();

        let seqs = visible_seqs(&c);
        let n = c.visible_len() as u32;
        let mut sorted = seqs.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (1..=n).collect::<Vec<_>>());
    }

    #[test]
    fn test_update_field_reports_empty_valid_set() {
        let mut c = LineCollection::new();
        let k = c.add_line();

        // No product anywhere: quantity edit leaves the valid set empty.
        let outcome = c.update_field(k, LineField::Quantity(dec("5"))).unwrap();
        assert!(outcome.valid_set_empty);

        let outcome = c.update_field(k, LineField::Product(choice("A"))).unwrap();
        assert!(!outcome.valid_set_empty);
    }

    #[test]
    fn test_update_missing_line_errors() {
        let mut c = LineCollection::new();
        let err = c
            .update_field(LineKey::new(), LineField::Quantity(dec("1")))
            .unwrap_err();
        assert!(matches!(err, CoreError::LineNotFound(_)));
    }

    #[test]
    fn test_simulate_delete_leaves_original_untouched() {
        let mut c = LineCollection::load_existing(vec![persisted(1, "A"), persisted(2, "B")]);
        let key = c.iter().next().unwrap().key;

        let simulated = c.simulate_delete(key).unwrap();
        assert_eq!(simulated.visible_len(), 1);
        assert_eq!(c.visible_len(), 2);
        assert_eq!(c.get(key).unwrap().row_status, RowStatus::Existing);
    }

    #[test]
    fn test_save_lines_tags_and_totals() {
        let mut c = LineCollection::load_existing(vec![persisted(7, "A")]);
        let existing = c.iter().next().unwrap().key;
        c.update_field(existing, LineField::Quantity(dec("3"))).unwrap();
        c.update_field(existing, LineField::UnitPrice(dec("100"))).unwrap();
        c.update_field(existing, LineField::Discount("10%".into())).unwrap();

        let added = c.add_line();
        c.update_field(added, LineField::Product(choice("B"))).unwrap();

        c.soft_delete_or_remove(existing).unwrap();

        let payload = c.save_lines(2);
        assert_eq!(payload.len(), 2);

        let deleted = &payload[0];
        assert_eq!(deleted.status, RowStatus::Deleted);
        assert_eq!(deleted.line_number, 7);
        assert_eq!(deleted.line_total, dec("270.00"));

        let new = &payload[1];
        assert_eq!(new.status, RowStatus::New);
        assert_eq!(new.line_number, 0);
        assert_eq!(new.display_sequence, 1);
    }
}
