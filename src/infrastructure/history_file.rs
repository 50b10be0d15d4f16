// Saved-history documents: the JSON a user downloads and re-opens offline
use crate::domain::telemetry::Reading;
use crate::error::HistoryFileError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedHistory {
    pub probe_readings: Vec<SavedReading>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedReading {
    pub ts: i64,
    pub probes: Vec<Option<f64>>,
}

// Uploaded files may spell integers as `1000.0`, so everything is read as
// a number and checked afterwards.
#[derive(Debug, Deserialize)]
struct UploadedHistory {
    probe_readings: Vec<UploadedReading>,
}

#[derive(Debug, Deserialize)]
struct UploadedReading {
    ts: f64,
    probes: Vec<Option<f64>>,
}

fn is_integer(value: f64) -> bool {
    value.is_finite() && value.fract() == 0.0
}

impl SavedHistory {
    pub fn from_readings(readings: &[Reading]) -> Self {
        Self {
            probe_readings: readings
                .iter()
                .map(|r| SavedReading {
                    ts: r.ts,
                    probes: r.probes.clone(),
                })
                .collect(),
        }
    }
}

impl UploadedHistory {
    /// Checks every reading before handing any of them out, so a bad file
    /// never leaves a half-loaded chart behind.
    fn into_readings(self) -> Result<Vec<Reading>, HistoryFileError> {
        for (index, reading) in self.probe_readings.iter().enumerate() {
            if !is_integer(reading.ts) || reading.ts >= i64::MAX as f64 {
                return Err(HistoryFileError::NonIntegerTimestamp { index });
            }
            if reading.ts < 0.0 {
                return Err(HistoryFileError::NegativeTimestamp { index });
            }
            if let Some(probe) = reading
                .probes
                .iter()
                .position(|p| p.is_some_and(|t| !is_integer(t)))
            {
                return Err(HistoryFileError::NonIntegerProbe { index, probe });
            }
        }

        Ok(self
            .probe_readings
            .into_iter()
            .map(|r| Reading::new(r.ts as i64, r.probes))
            .collect())
    }
}

/// Parses and validates an uploaded document.
pub fn parse_saved_history(bytes: &[u8]) -> Result<Vec<Reading>, HistoryFileError> {
    let doc: UploadedHistory = serde_json::from_slice(bytes)?;
    doc.into_readings()
}

pub async fn read_saved_history(path: &Path) -> crate::error::Result<Vec<Reading>> {
    let bytes = tokio::fs::read(path).await?;
    Ok(parse_saved_history(&bytes)?)
}

/// `ibbq_2024-05-01T18:30:05.json`
pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!("ibbq_{}.json", now.format("%Y-%m-%dT%H:%M:%S"))
}
