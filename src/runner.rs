use crate::client::{ServiceClient, WifiService};
use crate::config::*;
use crate::models::SpeedTestResult;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{self, Instant};
use tracing::{error, info, warn};

/// What the speed-test card shows while a run is in flight
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunnerStatus {
    pub testing: bool,
    /// 0 to 100
    pub progress: f64,
    pub last_speed: Option<f64>,
}

impl Default for RunnerStatus {
    fn default() -> Self {
        Self {
            testing: false,
            progress: 0.0,
            last_speed: None,
        }
    }
}

/// Simulated download test: a timed progress bar followed by a random speed.
///
/// Only one run can be in flight. Starting while testing does nothing.
pub struct SpeedTestRunner<S> {
    client: Arc<ServiceClient<S>>,
    status: watch::Sender<RunnerStatus>,
    duration: Duration,
    tick: Duration,
}

impl<S: WifiService> SpeedTestRunner<S> {
    pub fn new(client: Arc<ServiceClient<S>>) -> Arc<Self> {
        let (status, _) = watch::channel(RunnerStatus::default());
        Arc::new(Self {
            client,
            status,
            duration: Duration::from_millis(SPEED_TEST_DURATION_MS),
            tick: Duration::from_millis(PROGRESS_TICK_MS),
        })
    }

    pub fn status(&self) -> RunnerStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RunnerStatus> {
        self.status.subscribe()
    }

    /// Starts a run in the background. Returns `false` if one is already running.
    pub fn start(self: &Arc<Self>) -> bool {
        if !self.try_begin() {
            warn!("Speed test already in progress");
            return false;
        }
        let runner = Arc::clone(self);
        tokio::spawn(async move {
            runner.execute().await;
        });
        true
    }

    /// Runs a test to completion on the current task.
    pub async fn run_once(&self) -> Option<SpeedTestResult> {
        if !self.try_begin() {
            warn!("Speed test already in progress");
            return None;
        }
        self.execute().await
    }

    fn try_begin(&self) -> bool {
        self.status.send_if_modified(|status| {
            if status.testing {
                return false;
            }
            *status = RunnerStatus {
                testing: true,
                ..RunnerStatus::default()
            };
            true
        })
    }

    async fn execute(&self) -> Option<SpeedTestResult> {
        info!("Starting speed test ({} ms)", self.duration.as_millis());
        self.track_progress().await;

        let result = SpeedTestResult::now(simulated_speed(rand::random::<f64>()));
        self.status
            .send_modify(|status| status.last_speed = Some(result.download_speed));

        let outcome = match self.client.record_speed_test(&result).await {
            Ok(()) => {
                info!(speed_mbps = result.download_speed, "Speed test recorded");
                if let Err(e) = self.client.speed_test_trend().await {
                    error!("Failed to refresh speed trend: {}", e);
                }
                Some(result)
            }
            Err(e) => {
                error!("Speed test failed: {}", e);
                None
            }
        };

        self.status.send_modify(|status| status.testing = false);
        outcome
    }

    async fn track_progress(&self) {
        let started = Instant::now();
        let mut interval = time::interval(self.tick);

        loop {
            interval.tick().await;
            let elapsed = started.elapsed();
            let progress =
                (elapsed.as_secs_f64() / self.duration.as_secs_f64() * 100.0).min(100.0);
            self.status.send_modify(|status| status.progress = progress);
            if elapsed >= self.duration {
                break;
            }
        }
    }
}

/// Maps a uniform sample in [0, 1) onto the simulated speed range, one decimal place.
fn simulated_speed(unit: f64) -> f64 {
    let base = MIN_SIMULATED_SPEED_MBPS + unit * SIMULATED_SPEED_SPREAD_MBPS;
    (base * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::FakeService;

    #[test]
    fn simulated_speed_stays_in_range_with_one_decimal() {
        assert_eq!(simulated_speed(0.0), 50.0);
        assert_eq!(simulated_speed(0.5), 100.0);
        assert_eq!(simulated_speed(0.12345), 62.3);
        assert!(simulated_speed(0.99999) <= 150.0);
    }

    #[tokio::test(start_paused = true)]
    async fn run_records_exactly_one_sample_and_returns_to_idle() {
        let client = ServiceClient::new(FakeService::default());
        let runner = SpeedTestRunner::new(client.clone());

        let result = runner.run_once().await.expect("run should complete");

        let samples = client.service().samples.lock().unwrap().clone();
        assert_eq!(samples, vec![result.clone()]);

        let status = runner.status();
        assert!(!status.testing);
        assert_eq!(status.progress, 100.0);
        assert_eq!(status.last_speed, Some(result.download_speed));
        assert!((50.0..=150.0).contains(&result.download_speed));
    }

    #[tokio::test(start_paused = true)]
    async fn starting_while_testing_has_no_effect() {
        let client = ServiceClient::new(FakeService::default());
        let runner = SpeedTestRunner::new(client.clone());

        assert!(runner.start());
        assert!(runner.status().testing);
        assert!(!runner.start());
        assert!(runner.run_once().await.is_none());

        let mut rx = runner.subscribe();
        rx.wait_for(|status| !status.testing).await.unwrap();

        assert_eq!(client.service().samples.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn progress_is_reported_while_testing() {
        let client = ServiceClient::new(FakeService::default());
        let runner = SpeedTestRunner::new(client);
        let mut rx = runner.subscribe();

        assert!(runner.start());
        rx.wait_for(|status| status.testing && status.progress > 0.0 && status.progress < 100.0)
            .await
            .unwrap();
        rx.wait_for(|status| !status.testing).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_record_resets_to_idle() {
        let client = ServiceClient::new(FakeService {
            fail: true,
            ..FakeService::default()
        });
        let runner = SpeedTestRunner::new(client.clone());

        assert!(runner.run_once().await.is_none());
        assert!(!runner.status().testing);
        assert!(client.service().samples.lock().unwrap().is_empty());

        // idle again, so a new run is accepted
        assert!(runner.start());
    }

    #[tokio::test(start_paused = true)]
    async fn completed_run_refreshes_the_trend() {
        let client = ServiceClient::new(FakeService::default());
        client.speed_test_trend().await.unwrap();
        let runner = SpeedTestRunner::new(client.clone());

        runner.run_once().await.unwrap();

        assert_eq!(*client.service().trend_calls.lock().unwrap(), 2);
        assert_eq!(client.speed_test_trend().await.unwrap().len(), 1);
    }
}
