//! `UsageTracker`: accumulates per-call token/cost totals and fires a
//! registered callback, incrementally during streaming.
//!
//! No teacher equivalent (the teacher reports usage once per call, never
//! incrementally); built from `spec.md` §4.12's "fires the registered
//! callback... for streams it fires incrementally every 100 output
//! tokens" rule, reusing [`llmflow_provider::usage::Usage::accumulate`]
//! for the running total.

use std::sync::{Arc, Mutex};

use llmflow_provider::usage::Usage;

/// Callback invoked with the running total whenever a threshold fires.
pub type UsageCallback = Arc<dyn Fn(&Usage) + Send + Sync>;

/// Fires `callback` once per call completion, or every 100 output tokens
/// while a stream is in flight.
pub struct UsageTracker {
    total: Mutex<Usage>,
    last_fired_output_tokens: Mutex<u64>,
    callback: Option<UsageCallback>,
}

const STREAM_FIRE_INTERVAL_TOKENS: u64 = 100;

impl UsageTracker {
    pub fn new(callback: Option<UsageCallback>) -> Self {
        Self { total: Mutex::new(Usage::default()), last_fired_output_tokens: Mutex::new(0), callback }
    }

    /// Running accumulated total so far.
    pub fn total(&self) -> Usage {
        *self.total.lock().expect("usage tracker lock poisoned")
    }

    /// Adds `usage` into the running total and, for a non-streaming call,
    /// fires the callback unconditionally.
    pub fn record_call(&self, usage: &Usage) {
        self.total.lock().expect("usage tracker lock poisoned").accumulate(usage);
        self.fire();
    }

    /// Adds `delta`'s totals into the running total and fires the
    /// callback only once the accumulated output tokens since the last
    /// fire have crossed the 100-token threshold.
    pub fn record_stream_delta(&self, delta: &Usage) {
        self.total.lock().expect("usage tracker lock poisoned").accumulate(delta);
        let current_output = self.total().tokens.output.total;
        let mut last_fired = self.last_fired_output_tokens.lock().expect("usage tracker lock poisoned");
        if current_output.saturating_sub(*last_fired) >= STREAM_FIRE_INTERVAL_TOKENS {
            *last_fired = current_output;
            drop(last_fired);
            self.fire();
        }
    }

    /// Forces a final callback invocation with the current total,
    /// regardless of the threshold — called once a stream finishes so
    /// the last partial interval is still reported.
    pub fn finish_stream(&self) {
        self.fire();
    }

    fn fire(&self) {
        if let Some(callback) = &self.callback {
            callback(&self.total());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llmflow_provider::usage::{InputTokens, OutputTokens, Tokens};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn usage_with_output(tokens: u64) -> Usage {
        Usage { tokens: Tokens { input: InputTokens::default(), output: OutputTokens { total: tokens, ..Default::default() }, total: tokens }, costs: Default::default() }
    }

    #[test]
    fn record_call_always_fires() {
        let fires = Arc::new(AtomicU32::new(0));
        let fires_clone = fires.clone();
        let tracker = UsageTracker::new(Some(Arc::new(move |_u| {
            fires_clone.fetch_add(1, Ordering::SeqCst);
        })));
        tracker.record_call(&usage_with_output(5));
        assert_eq!(fires.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stream_delta_fires_only_every_hundred_tokens() {
        let fires = Arc::new(AtomicU32::new(0));
        let fires_clone = fires.clone();
        let tracker = UsageTracker::new(Some(Arc::new(move |_u| {
            fires_clone.fetch_add(1, Ordering::SeqCst);
        })));
        for _ in 0..5 {
            tracker.record_stream_delta(&usage_with_output(30));
        }
        // 150 total output tokens crossed the 100 threshold once
        assert_eq!(fires.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.total().tokens.output.total, 150);
    }

    #[test]
    fn finish_stream_forces_a_final_callback() {
        let fires = Arc::new(AtomicU32::new(0));
        let fires_clone = fires.clone();
        let tracker = UsageTracker::new(Some(Arc::new(move |_u| {
            fires_clone.fetch_add(1, Ordering::SeqCst);
        })));
        tracker.record_stream_delta(&usage_with_output(10));
        assert_eq!(fires.load(Ordering::SeqCst), 0);
        tracker.finish_stream();
        assert_eq!(fires.load(Ordering::SeqCst), 1);
    }
}
