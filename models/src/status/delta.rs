//! Partial status payload pushed by `notify_status_update`.
//!
//! Moonraker only sends the fields that changed since the previous
//! notification, so every field is optional. A missing or `null` field means
//! "no change", never "reset to zero".

use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StatusDelta {
    #[serde(default)]
    pub virtual_sdcard: Option<VirtualSdcardDelta>,
    #[serde(default)]
    pub print_stats: Option<PrintStatsDelta>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VirtualSdcardDelta {
    #[serde(default)]
    pub progress: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PrintStatsDelta {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub print_duration: Option<f64>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub info: Option<PrintStatsInfoDelta>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PrintStatsInfoDelta {
    #[serde(default)]
    pub total_layer: Option<i64>,
    #[serde(default)]
    pub current_layer: Option<i64>,
}
