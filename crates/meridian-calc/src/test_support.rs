//! Shared recording mock of the calculation service for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::error::{CalcError, CalcResult};
use crate::service::{CalcRequest, CalcTotals, CalculationService};

/// Calculation service double that records every request and answers
/// from queued results (defaulting to success when the queue is empty).
///
/// `hold_next_call()` parks the next call: it signals `entered`, then
/// waits on `release`, letting tests overlap an in-flight request with
/// concurrent edits.
pub(crate) struct MockCalcService {
    recalc_calls: Mutex<Vec<CalcRequest>>,
    validate_calls: Mutex<Vec<CalcRequest>>,
    recalc_results: Mutex<VecDeque<CalcResult<CalcTotals>>>,
    validate_results: Mutex<VecDeque<CalcResult<()>>>,
    hold_next: AtomicBool,
    pub entered: Notify,
    pub release: Notify,
}

impl MockCalcService {
    pub fn new() -> Arc<Self> {
        Arc::new(MockCalcService {
            recalc_calls: Mutex::new(Vec::new()),
            validate_calls: Mutex::new(Vec::new()),
            recalc_results: Mutex::new(VecDeque::new()),
            validate_results: Mutex::new(VecDeque::new()),
            hold_next: AtomicBool::new(false),
            entered: Notify::new(),
            release: Notify::new(),
        })
    }

    pub fn push_totals(&self, totals: CalcTotals) {
        self.recalc_results.lock().unwrap().push_back(Ok(totals));
    }

    pub fn push_recalc_err(&self, err: CalcError) {
        self.recalc_results.lock().unwrap().push_back(Err(err));
    }

    pub fn push_validate_err(&self, err: CalcError) {
        self.validate_results.lock().unwrap().push_back(Err(err));
    }

    pub fn hold_next_call(&self) {
        self.hold_next.store(true, Ordering::SeqCst);
    }

    pub fn recalc_count(&self) -> usize {
        self.recalc_calls.lock().unwrap().len()
    }

    pub fn validate_count(&self) -> usize {
        self.validate_calls.lock().unwrap().len()
    }

    pub fn last_validate_request(&self) -> Option<CalcRequest> {
        self.validate_calls.lock().unwrap().last().cloned()
    }

    async fn maybe_hold(&self) {
        if self.hold_next.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
    }
}

#[async_trait]
impl CalculationService for MockCalcService {
    async fn recalculate(&self, request: &CalcRequest) -> CalcResult<CalcTotals> {
        self.recalc_calls.lock().unwrap().push(request.clone());
        self.maybe_hold().await;
        self.recalc_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(CalcTotals::default()))
    }

    async fn validate(&self, request: &CalcRequest) -> CalcResult<()> {
        self.validate_calls.lock().unwrap().push(request.clone());
        self.maybe_hold().await;
        self.validate_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()))
    }
}
