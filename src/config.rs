//! Centralized constants for the dashboard and the speed-test simulation

pub const DEFAULT_SERVICE_URL: &str = "http://localhost:4943/api";

// Speed test simulation
pub const SPEED_TEST_DURATION_MS: u64 = 3000;
pub const PROGRESS_TICK_MS: u64 = 50;
pub const MIN_SIMULATED_SPEED_MBPS: f64 = 50.0;
pub const SIMULATED_SPEED_SPREAD_MBPS: f64 = 100.0;

// Query cache
pub const SPEED_TEST_TREND_KEY: &str = "speedTestTrend";

// Form defaults
pub const DEFAULT_CHANNEL: &str = "6";
pub const DEFAULT_FREQUENCY: &str = "2400";
pub const DEFAULT_SIGNAL_STRENGTH: &str = "-50";
pub const DEFAULT_INTERFERENCE_LEVEL: &str = "0.3";

pub const CHANNELS: std::ops::RangeInclusive<u32> = 1..=11;

pub const FREQUENCIES: [(u32, &str); 2] = [(2400, "2.4 GHz"), (5000, "5 GHz")];

pub const INTERFERENCE_LEVELS: [(&str, &str); 5] = [
    ("0.1", "Low"),
    ("0.3", "Low-Medium"),
    ("0.5", "Medium"),
    ("0.7", "Medium-High"),
    ("0.9", "High"),
];

// Signal strength hint shown under the input
pub const SIGNAL_STRENGTH_MIN_DBM: i32 = -100;
pub const SIGNAL_STRENGTH_MAX_DBM: i32 = -30;
