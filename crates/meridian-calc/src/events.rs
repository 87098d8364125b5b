//! # Event Sink
//!
//! Trait for surfacing non-blocking warnings to the host UI.
//!
//! No failure in this engine is fatal to the enclosing form: a failed
//! recalculation leaves the last good totals in place, a denied delete
//! leaves the line untouched. Both degrade to "inform the user", and
//! this seam is where that information leaves the engine.

/// Sink for user-facing, non-blocking notifications (implemented by the
/// host UI integration).
pub trait TableEventSink: Send + Sync {
    /// The remote totals call failed; header totals keep their last
    /// good values and a later successful call will repair them.
    fn recalculation_failed(&self, message: &str);

    /// A delete was denied, either by the server (its message, verbatim)
    /// or by a transport failure (a generic message).
    fn delete_denied(&self, message: &str);
}

/// No-op sink for tests and headless use.
pub struct NoOpSink;

impl TableEventSink for NoOpSink {
    fn recalculation_failed(&self, _message: &str) {}
    fn delete_denied(&self, _message: &str) {}
}
