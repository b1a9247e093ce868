//! Bounded polling of the transcoder's processing status.

use std::time::Duration;

use vidhub_cloud::{AssetState, AssetStatus, TranscodingGateway};

/// Fixed attempt ceiling with a fixed delay between attempts.
#[derive(Debug, Clone)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            interval: Duration::from_secs(2),
        }
    }
}

/// Result of waiting for an asset.
///
/// `TimedOut` is a soft outcome: processing continues on the service side
/// and the caller proceeds. It carries the last status read, if any read
/// succeeded.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Ready(AssetStatus),
    Failed(AssetStatus),
    TimedOut(Option<AssetStatus>),
}

impl PollOutcome {
    /// Last known status, whatever the outcome.
    pub fn status(&self) -> Option<&AssetStatus> {
        match self {
            Self::Ready(s) | Self::Failed(s) => Some(s),
            Self::TimedOut(last) => last.as_ref(),
        }
    }

    pub fn duration_secs(&self) -> Option<f64> {
        self.status().and_then(|s| s.duration_secs)
    }
}

/// Poll `asset_id` until it is ready, has failed, or the attempts run out.
///
/// Status read errors count as attempts and are logged; they never end the
/// loop early.
pub async fn wait_for_ready(
    gateway: &dyn TranscodingGateway,
    asset_id: &str,
    policy: &PollPolicy,
) -> PollOutcome {
    let mut last = None;

    for attempt in 1..=policy.max_attempts {
        match gateway.get_status(asset_id).await {
            Ok(status) if status.is_ready() => {
                tracing::debug!(asset_id, attempt, "Asset ready");
                return PollOutcome::Ready(status);
            }
            Ok(status) if status.state == AssetState::Error => {
                tracing::warn!(asset_id, attempt, "Asset processing failed");
                return PollOutcome::Failed(status);
            }
            Ok(status) => last = Some(status),
            Err(e) => {
                tracing::warn!(asset_id, attempt, error = %e, "Status poll failed");
            }
        }

        if attempt < policy.max_attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }

    tracing::info!(
        asset_id,
        attempts = policy.max_attempts,
        "Asset not ready yet, continuing without waiting",
    );
    PollOutcome::TimedOut(last)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use vidhub_cloud::memory::FakeTranscoder;

    use super::*;

    fn quick(max_attempts: u32) -> PollPolicy {
        PollPolicy {
            max_attempts,
            interval: Duration::from_millis(1),
        }
    }

    fn queued() -> AssetStatus {
        AssetStatus {
            state: AssetState::Queued,
            duration_secs: None,
            ready_to_stream: false,
        }
    }

    #[tokio::test]
    async fn ready_asset_returns_immediately() {
        let fake = FakeTranscoder::new();
        fake.register_asset(
            "a",
            AssetStatus {
                state: AssetState::Ready,
                duration_secs: Some(30.0),
                ready_to_stream: true,
            },
        );

        let outcome = wait_for_ready(&fake, "a", &quick(5)).await;
        assert_matches!(outcome, PollOutcome::Ready(_));
        assert_eq!(outcome.duration_secs(), Some(30.0));
        assert_eq!(fake.status_calls(), 1);
    }

    #[tokio::test]
    async fn times_out_softly_with_last_status() {
        let fake = FakeTranscoder::new();
        fake.register_asset("a", queued());

        let outcome = wait_for_ready(&fake, "a", &quick(3)).await;
        assert_eq!(outcome, PollOutcome::TimedOut(Some(queued())));
        assert_eq!(fake.status_calls(), 3);
    }

    #[tokio::test]
    async fn read_errors_count_as_attempts() {
        let fake = FakeTranscoder::new();
        fake.fail_status(true);

        let outcome = wait_for_ready(&fake, "missing", &quick(4)).await;
        assert_eq!(outcome, PollOutcome::TimedOut(None));
        assert_eq!(fake.status_calls(), 4);
    }

    #[tokio::test]
    async fn error_state_stops_polling() {
        let fake = FakeTranscoder::new();
        fake.register_asset(
            "a",
            AssetStatus {
                state: AssetState::Error,
                duration_secs: None,
                ready_to_stream: false,
            },
        );

        let outcome = wait_for_ready(&fake, "a", &quick(5)).await;
        assert_matches!(outcome, PollOutcome::Failed(_));
        assert_eq!(fake.status_calls(), 1);
    }
}
