use crate::models::SpeedTestResult;
use chrono::{Local, TimeZone};
use serde::Serialize;
use statrs::statistics::Statistics;
use std::fmt;

/// One point on the speed chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub time: String,
    pub speed: f64,
}

/// Chart data derived from the sample history. Rebuilt on every fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendView {
    pub points: Vec<TrendPoint>,
    pub average_speed: f64,
    pub total_tests: usize,
}

impl TrendView {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Builds the trend view with labels in the machine's local time zone.
pub fn build_trend_view(samples: &[SpeedTestResult]) -> TrendView {
    build_trend_view_in(samples, &Local)
}

/// Samples keep the order the service returned them in; nothing is sorted or filtered.
pub fn build_trend_view_in<Tz>(samples: &[SpeedTestResult], tz: &Tz) -> TrendView
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let points = samples
        .iter()
        .map(|sample| TrendPoint {
            time: time_label(sample, tz),
            speed: sample.download_speed,
        })
        .collect();

    TrendView {
        points,
        average_speed: average_speed(samples),
        total_tests: samples.len(),
    }
}

/// Arithmetic mean of all download speeds, 0 when there are none.
pub fn average_speed(samples: &[SpeedTestResult]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|s| s.download_speed).mean()
}

fn time_label<Tz>(sample: &SpeedTestResult, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    match sample.recorded_at() {
        Some(ts) => ts.with_timezone(tz).format("%H:%M").to_string(),
        None => "--:--".to_string(),
    }
}

/// Plain-text rendering used by the `trend` and `speed-test` commands.
pub fn render_text(view: &TrendView) -> String {
    let mut out = String::new();

    out.push_str("───────────────────────────────────────────────────────────────────\n");
    out.push_str("                            SPEED TREND                             \n");
    out.push_str("───────────────────────────────────────────────────────────────────\n\n");

    if view.is_empty() {
        out.push_str("  No Data Yet\n");
        out.push_str("  Run a speed test to start tracking your connection performance.\n");
        return out;
    }

    out.push_str(&format!("  Average Speed:   {:>8.1} Mbps\n", view.average_speed));
    out.push_str(&format!("  Total Tests:     {:>8}\n\n", view.total_tests));

    let max = view
        .points
        .iter()
        .map(|p| p.speed)
        .fold(0.0_f64, f64::max);

    for point in &view.points {
        let width = if max > 0.0 {
            ((point.speed / max) * 40.0).round() as usize
        } else {
            0
        };
        out.push_str(&format!(
            "  {}  {:>7.1} Mbps  {}\n",
            point.time,
            point.speed,
            "█".repeat(width)
        ));
    }

    out
}
