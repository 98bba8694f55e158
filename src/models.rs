use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// WiFi settings submitted for analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WifiConfig {
    pub ssid: String,
    pub channel: u32,
    pub frequency: u32,
    pub signal_strength: i32,
    pub interference_level: f64,
}

impl WifiConfig {
    pub fn band(&self) -> WifiBand {
        WifiBand::from_frequency(self.frequency)
    }
}

/// Suggested changes returned by the analysis service.
///
/// Every field is independent. A recommendation with no field set means the
/// submitted configuration is already optimal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationRecommendation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_channel: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_frequency: Option<u32>,
    /// Expected signal strength in dBm once the changes are applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_improvement: Option<i32>,
}

impl OptimizationRecommendation {
    pub fn is_optimal(&self) -> bool {
        self.recommended_channel.is_none()
            && self.recommended_frequency.is_none()
            && self.signal_improvement.is_none()
    }
}

/// One download speed measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeedTestResult {
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    /// Mbps
    pub download_speed: f64,
}

impl SpeedTestResult {
    pub fn now(download_speed: f64) -> Self {
        Self {
            timestamp: Utc::now().timestamp_millis(),
            download_speed,
        }
    }

    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp).single()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WifiBand {
    Band2_4GHz,
    Band5GHz,
}

impl WifiBand {
    /// The form only offers 2400 and 5000; anything that isn't 2400 is shown as 5 GHz.
    pub fn from_frequency(freq_mhz: u32) -> Self {
        match freq_mhz {
            2400 => WifiBand::Band2_4GHz,
            _ => WifiBand::Band5GHz,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WifiBand::Band2_4GHz => "2.4 GHz",
            WifiBand::Band5GHz => "5 GHz",
        }
    }
}
