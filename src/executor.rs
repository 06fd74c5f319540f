//! Sending the command and polling for its result.
//!
//! The command is written without asking for an acknowledgment, since some peripherals only
//! support unacknowledged writes. Completion is inferred from the polled responses instead.

use btleplug::api::Characteristic;
use tracing::{debug, info, warn};

use crate::{
    Error,
    config::{PollPolicy, RESPONSE_MARKER},
    error::{Phase, SessionError},
    transport::Connection,
};

/// Write `command` to `write`, then read `read` until a response contains the marker.
///
/// Returns the completing response. A failed read ends the loop at once; only responses that
/// came back without the marker are retried, at most [`PollPolicy::attempts`] times.
pub async fn execute<C: Connection>(
    connection: &C,
    command: &str,
    write: &Characteristic,
    read: &Characteristic,
    policy: &PollPolicy,
) -> Result<String, SessionError> {
    info!("[write] {}", command.trim_end());
    connection
        .write_characteristic(write, command.as_bytes(), false)
        .await
        .map_err(SessionError::at(Phase::Write))?;

    let attempts = policy.attempts();
    for attempt in 1..=attempts {
        debug!(attempt, "reading {}", read.uuid);
        let buf = connection
            .read_characteristic(read)
            .await
            .map_err(SessionError::at(Phase::Read))?;

        match std::str::from_utf8(&buf) {
            Ok(response) => {
                info!("[read ] {}", response.trim_end());
                if response.contains(RESPONSE_MARKER) {
                    return Ok(response.to_owned());
                }
            }
            Err(e) => {
                warn!("[read ] {} ({e})", String::from_utf8_lossy(&buf));
            }
        }

        if attempt < attempts {
            tokio::time::sleep(policy.delay_after(attempt)).await;
        }
    }

    Err(SessionError {
        phase: Phase::Poll,
        source: Error::Timeout { attempts },
    })
}
