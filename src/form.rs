use crate::config::*;
use crate::error::FormError;
use crate::models::WifiConfig;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Raw field values as typed or selected in the configuration form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigForm {
    pub ssid: String,
    pub channel: String,
    pub frequency: String,
    pub signal_strength: String,
    pub interference_level: String,
}

impl Default for ConfigForm {
    fn default() -> Self {
        Self {
            ssid: String::new(),
            channel: DEFAULT_CHANNEL.to_string(),
            frequency: DEFAULT_FREQUENCY.to_string(),
            signal_strength: DEFAULT_SIGNAL_STRENGTH.to_string(),
            interference_level: DEFAULT_INTERFERENCE_LEVEL.to_string(),
        }
    }
}

impl ConfigForm {
    pub fn to_config(&self) -> Result<WifiConfig, FormError> {
        if self.ssid.trim().is_empty() {
            return Err(FormError::MissingSsid);
        }

        Ok(WifiConfig {
            ssid: self.ssid.clone(),
            channel: parse_field("channel", &self.channel)?,
            frequency: parse_field("frequency", &self.frequency)?,
            signal_strength: parse_field("signalStrength", &self.signal_strength)?,
            interference_level: parse_field("interferenceLevel", &self.interference_level)?,
        })
    }
}

fn parse_field<T: FromStr>(field: &'static str, value: &str) -> Result<T, FormError> {
    value.trim().parse().map_err(|_| FormError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

/// Defaults and choices used to draw the form
#[derive(Debug, Clone, Serialize)]
pub struct FormOptions {
    pub defaults: ConfigForm,
    pub channels: Vec<SelectOption>,
    pub frequencies: Vec<SelectOption>,
    pub interference_levels: Vec<SelectOption>,
    pub signal_strength_min: i32,
    pub signal_strength_max: i32,
}

pub fn form_options() -> FormOptions {
    FormOptions {
        defaults: ConfigForm::default(),
        channels: CHANNELS
            .map(|ch| SelectOption {
                value: ch.to_string(),
                label: format!("Channel {}", ch),
            })
            .collect(),
        frequencies: FREQUENCIES
            .iter()
            .map(|(mhz, label)| SelectOption {
                value: mhz.to_string(),
                label: label.to_string(),
            })
            .collect(),
        interference_levels: INTERFERENCE_LEVELS
            .iter()
            .map(|(value, label)| SelectOption {
                value: value.to_string(),
                label: format!("{} ({})", label, value),
            })
            .collect(),
        signal_strength_min: SIGNAL_STRENGTH_MIN_DBM,
        signal_strength_max: SIGNAL_STRENGTH_MAX_DBM,
    }
}
