//! Reporting metric recorders
//!
//! Thin wrappers over the `metrics` facade. Without an installed recorder
//! every call is a no-op.

use metrics::{counter, gauge, histogram};

/// An event was accepted into the client queue
pub fn record_event_recorded(event_type: &str) {
    counter!(
        "reporter_events_recorded_total",
        "type" => event_type.to_string()
    )
    .increment(1);
}

/// An event was discarded by the client
///
/// `reason` is `"queue_full"`, `"closed"` or `"encode"`.
pub fn record_event_dropped(reason: &'static str) {
    counter!("reporter_events_dropped_total", "reason" => reason).increment(1);
}

/// A flush attempt finished
pub fn record_flush(batch_size: usize, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!("reporter_flushes_total", "status" => status).increment(1);
    histogram!("reporter_flush_batch_size").record(batch_size as f64);
    if success {
        counter!("reporter_events_sent_total").increment(batch_size as u64);
        gauge!("reporter_events_pending").set(0.0);
    } else {
        gauge!("reporter_events_pending").set(batch_size as f64);
    }
}

/// The collector accepted and decoded a batch
pub fn record_batch_received(batch_size: usize) {
    counter!("collector_batches_received_total").increment(1);
    counter!("collector_events_received_total").increment(batch_size as u64);
}

/// The collector rejected a batch at decode
pub fn record_batch_rejected() {
    counter!("collector_batches_rejected_total").increment(1);
}

/// One sink put finished
pub fn record_sink_put(sink_name: &str, success: bool, latency_ms: f64) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "collector_sink_puts_total",
        "sink" => sink_name.to_string(),
        "status" => status
    )
    .increment(1);
    histogram!(
        "collector_sink_put_latency_ms",
        "sink" => sink_name.to_string()
    )
    .record(latency_ms);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorders_without_recorder_are_noops() {
        record_event_recorded("server");
        record_event_dropped("queue_full");
        record_flush(3, false);
        record_batch_received(3);
        record_batch_rejected();
        record_sink_put("log", true, 0.5);
    }
}
