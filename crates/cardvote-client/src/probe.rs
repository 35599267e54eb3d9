use anyhow::{anyhow, bail, Result};
use cardvote_types::RoomOverview;
use std::time::Duration;

use crate::types::http_base_url;

/// Checks that the room service answers before a player tries to join.
///
/// The service root is requested up to `attempts` times, `interval` apart.
/// When every attempt fails the caller gets one generic error.
pub struct LivenessProbe {
    base_url: String,
    client: reqwest::Client,
    attempts: u32,
    interval: Duration,
    timeout: Duration,
}

impl LivenessProbe {
    pub const DEFAULT_ATTEMPTS: u32 = 5;
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

    /// Probe the service behind a `ws://` or `http://` backend URL.
    pub fn new(backend_url: &str) -> Self {
        Self {
            base_url: http_base_url(backend_url),
            client: reqwest::Client::new(),
            attempts: Self::DEFAULT_ATTEMPTS,
            interval: Self::DEFAULT_INTERVAL,
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Succeeds as soon as one attempt gets a successful response.
    pub async fn check(&self) -> Result<()> {
        for attempt in 1..=self.attempts {
            match self.fetch_overview().await {
                Ok(_) => {
                    log::debug!("Service at {} is up (attempt {})", self.base_url, attempt);
                    return Ok(());
                }
                Err(e) => {
                    log::debug!(
                        "Liveness attempt {}/{} against {} failed: {}",
                        attempt,
                        self.attempts,
                        self.base_url,
                        e
                    );
                }
            }
            if attempt < self.attempts {
                tokio::time::sleep(self.interval).await;
            }
        }

        bail!(
            "The voting service is not responding ({} attempts against {})",
            self.attempts,
            self.base_url
        )
    }

    /// Connected user ids per room, as listed by the service.
    pub async fn overview(&self) -> Result<RoomOverview> {
        self.fetch_overview().await
    }

    async fn fetch_overview(&self) -> Result<RoomOverview> {
        let response = self
            .client
            .get(format!("{}/", self.base_url))
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("Unexpected status {}", response.status()));
        }

        Ok(response.json::<RoomOverview>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_exhausted_budget_reports_generic_failure() {
        // bind then drop to get a port nothing listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let probe = LivenessProbe::new(&format!("ws://{}", addr))
            .with_attempts(2)
            .with_interval(Duration::from_millis(10))
            .with_timeout(Duration::from_millis(500));

        let err = probe.check().await.unwrap_err();
        assert!(err.to_string().contains("not responding"));
        assert!(err.to_string().contains("2 attempts"));
    }

    #[test]
    fn test_attempts_at_least_one() {
        let probe = LivenessProbe::new("ws://localhost:8000").with_attempts(0);
        assert_eq!(probe.attempts, 1);
        assert_eq!(probe.base_url, "http://localhost:8000");
    }
}
