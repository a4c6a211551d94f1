use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("thinkline.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("thinkline.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("thinkline.client.request_duration_seconds");

pub(crate) static STREAM_CHUNKS: Counter = Counter::new("thinkline.stream.chunks");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("thinkline.stream.errors");
pub(crate) static STREAM_BYTES: Counter = Counter::new("thinkline.stream.bytes");
pub(crate) static STREAM_DURATION: Moments = Moments::new("thinkline.stream.duration_seconds");

pub(crate) static PROBE_RESPONDED: Counter = Counter::new("thinkline.probe.responded");
pub(crate) static PROBE_TIMED_OUT: Counter = Counter::new("thinkline.probe.timed_out");
pub(crate) static PROBE_FAILED: Counter = Counter::new("thinkline.probe.failed");

pub(crate) static TURNS_APPENDED: Counter = Counter::new("thinkline.session.turns_appended");
pub(crate) static EMPTY_RESPONSES: Counter = Counter::new("thinkline.session.empty_responses");
pub(crate) static INTERRUPTED_RESPONSES: Counter =
    Counter::new("thinkline.session.interrupted_responses");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&STREAM_CHUNKS);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_counter(&STREAM_BYTES);
    collector.register_moments(&STREAM_DURATION);

    collector.register_counter(&PROBE_RESPONDED);
    collector.register_counter(&PROBE_TIMED_OUT);
    collector.register_counter(&PROBE_FAILED);

    collector.register_counter(&TURNS_APPENDED);
    collector.register_counter(&EMPTY_RESPONSES);
    collector.register_counter(&INTERRUPTED_RESPONSES);
}
