//! Startup connectivity check.

use std::time::Duration;

use tracing::{debug, warn};

use crate::client::Transport;
use crate::error::Result;
use crate::observability::{PROBE_FAILED, PROBE_RESPONDED, PROBE_TIMED_OUT};
use crate::types::{ChatCompletionParams, ChatMessage};

/// How long the probe waits before giving up on a reply.
pub const DEFAULT_PROBE_DEADLINE: Duration = Duration::from_secs(2);

/// The only message the probe sends.
pub const PROBE_SYSTEM_MESSAGE: &str = "You are a helpful assistant";

/// How the server answered the probe.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The server answered within the deadline.
    Responded,
    /// The server accepted the request but did not answer in time.
    ///
    /// A model still generating is taken as proof the server is up.
    TimedOut,
}

/// Sends one small completion request to check that the server is reachable.
///
/// Running past `deadline` counts as success. Any other failure, such as a
/// refused connection or an error status, is returned.
pub async fn check_server(
    transport: &dyn Transport,
    model: &str,
    deadline: Duration,
) -> Result<ProbeOutcome> {
    let params =
        ChatCompletionParams::new(model, vec![ChatMessage::system(PROBE_SYSTEM_MESSAGE)])
            .with_seed(0);
    debug!(model, deadline_ms = deadline.as_millis() as u64, "probing server");

    match tokio::time::timeout(deadline, transport.complete(params)).await {
        Ok(Ok(_)) => {
            PROBE_RESPONDED.click();
            debug!("probe answered");
            Ok(ProbeOutcome::Responded)
        }
        Ok(Err(err)) if err.is_timeout() => {
            PROBE_TIMED_OUT.click();
            debug!(error = %err, "probe timed out in the HTTP client");
            Ok(ProbeOutcome::TimedOut)
        }
        Ok(Err(err)) => {
            PROBE_FAILED.click();
            warn!(error = %err, "probe failed");
            Err(err)
        }
        Err(_) => {
            PROBE_TIMED_OUT.click();
            debug!("probe still running at deadline");
            Ok(ProbeOutcome::TimedOut)
        }
    }
}
