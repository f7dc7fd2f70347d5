//! Detection Records & Sources
//!
//! Core record types for satellite and user-reported hotspots, plus the
//! closed source enumeration. Feed labels are canonicalised here, once, at
//! the ingestion boundary; nothing downstream compares raw strings.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{REGION_LAT_MAX, REGION_LAT_MIN, REGION_LON_MAX, REGION_LON_MIN};
use crate::error::{CoreError, CoreResult};

// ============================================================================
// SOURCES
// ============================================================================

/// Closed enumeration of detection sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FireSource {
    ModisC61,
    ViirsSnppC2,
    ViirsNoaa20C2,
    UserReported,
}

/// Source family used by deduplication. MODIS and VIIRS stay separate
/// buckets: their pixel resolutions differ (1 km vs 375 m).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceBucket {
    Modis,
    Viirs,
    User,
}

impl FireSource {
    /// Canonical feed label (the FIRMS product code).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ModisC61 => "MODIS_C6_1",
            Self::ViirsSnppC2 => "VIIRS_SNPP_C2",
            Self::ViirsNoaa20C2 => "VIIRS_NOAA20_C2",
            Self::UserReported => "USER_REPORTED",
        }
    }

    /// Resolve a raw label, accepting the aliases the feed and older
    /// clients use interchangeably.
    pub fn canonicalize(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "MODIS_C6_1" | "MODIS" | "MODIS_NRT" => Some(Self::ModisC61),
            "VIIRS_SNPP_C2" | "VIIRS_SNPP" => Some(Self::ViirsSnppC2),
            "VIIRS_NOAA20_C2" | "VIIRS_NOAA20" => Some(Self::ViirsNoaa20C2),
            "USER_REPORTED" | "USER" => Some(Self::UserReported),
            _ => None,
        }
    }

    pub fn bucket(&self) -> SourceBucket {
        match self {
            Self::ModisC61 => SourceBucket::Modis,
            Self::ViirsSnppC2 | Self::ViirsNoaa20C2 => SourceBucket::Viirs,
            Self::UserReported => SourceBucket::User,
        }
    }

    /// The satellite feed products, in fetch order.
    pub fn feed_sources() -> &'static [FireSource] {
        &[Self::ModisC61, Self::ViirsSnppC2, Self::ViirsNoaa20C2]
    }
}

impl std::fmt::Display for FireSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// DETECTION RECORDS
// ============================================================================

/// A stored fire detection. Append-only: never updated, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FireDetection {
    pub id: i64,
    pub latitude: f64,
    pub longitude: f64,
    /// Detection confidence, 0-100
    pub confidence: i64,
    /// Brightness temperature (Kelvin)
    pub brightness: Option<f64>,
    /// 11um channel brightness temperature (Kelvin)
    pub bright_t31: Option<f64>,
    pub scan: Option<f64>,
    pub track: Option<f64>,
    pub acq_date: NaiveDate,
    /// Acquisition time as "HHMM"; sparse in the feed, absent for reports
    pub acq_time: Option<String>,
    pub satellite: String,
    pub instrument: String,
    pub source: FireSource,
    /// Fire radiative power (MW)
    pub frp: Option<f64>,
    pub daynight: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FireDetection {
    /// Acquisition date and time combined into one instant. Detections
    /// without a usable time sort and window at midnight.
    pub fn acq_datetime(&self) -> NaiveDateTime {
        self.acq_date.and_time(parse_hhmm(self.acq_time.as_deref()))
    }
}

/// Insert payload for a detection; the store assigns id and created_at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDetection {
    pub latitude: f64,
    pub longitude: f64,
    pub confidence: i64,
    pub brightness: Option<f64>,
    pub bright_t31: Option<f64>,
    pub scan: Option<f64>,
    pub track: Option<f64>,
    pub acq_date: NaiveDate,
    pub acq_time: Option<String>,
    pub satellite: String,
    pub instrument: String,
    pub source: FireSource,
    pub frp: Option<f64>,
    pub daynight: Option<String>,
}

impl NewDetection {
    pub fn acq_datetime(&self) -> NaiveDateTime {
        self.acq_date.and_time(parse_hhmm(self.acq_time.as_deref()))
    }
}

/// Parse an "HHMM" feed time; midnight when missing or malformed.
fn parse_hhmm(raw: Option<&str>) -> NaiveTime {
    let midnight = NaiveTime::from_hms_opt(0, 0, 0).unwrap();
    let Some(raw) = raw else { return midnight };
    if raw.len() != 4 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return midnight;
    }
    let hour: u32 = raw[..2].parse().unwrap_or(0);
    let minute: u32 = raw[2..].parse().unwrap_or(0);
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(midnight)
}

/// Hour-of-day from an "HHMM" time, when parseable.
pub fn hhmm_hour(raw: Option<&str>) -> Option<f64> {
    let raw = raw?;
    if raw.len() != 4 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hour: f64 = raw[..2].parse().ok()?;
    let minute: f64 = raw[2..].parse().ok()?;
    (hour < 24.0 && minute < 60.0).then_some(hour + minute / 60.0)
}

// ============================================================================
// VALIDATION
// ============================================================================

/// Reject coordinates outside the monitored acceptance band.
pub fn validate_region(latitude: f64, longitude: f64) -> CoreResult<()> {
    if !(REGION_LAT_MIN..=REGION_LAT_MAX).contains(&latitude) {
        return Err(CoreError::Validation(format!(
            "latitude {latitude} outside accepted band [{REGION_LAT_MIN}, {REGION_LAT_MAX}]"
        )));
    }
    if !(REGION_LON_MIN..=REGION_LON_MAX).contains(&longitude) {
        return Err(CoreError::Validation(format!(
            "longitude {longitude} outside accepted band [{REGION_LON_MIN}, {REGION_LON_MAX}]"
        )));
    }
    Ok(())
}

pub fn validate_confidence(confidence: i64) -> CoreResult<()> {
    if !(0..=100).contains(&confidence) {
        return Err(CoreError::Validation(format!(
            "confidence {confidence} outside [0, 100]"
        )));
    }
    Ok(())
}

/// Quick band check without an error payload, for feed-side rejection counts.
pub fn in_region(latitude: f64, longitude: f64) -> bool {
    validate_region(latitude, longitude).is_ok()
}

// ============================================================================
// USER REPORTS
// ============================================================================

/// Confidence assigned to unverified user reports: the midpoint of the
/// feed's 0-100 scale.
pub const USER_REPORT_CONFIDENCE: i64 = 50;

/// An unauthenticated fire sighting. Accepted reports become regular
/// detections with source `UserReported`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserFireReport {
    pub latitude: f64,
    pub longitude: f64,
    pub description: Option<String>,
    pub reporter_name: Option<String>,
    pub reporter_contact: Option<String>,
}

impl UserFireReport {
    /// Validate and convert into a detection dated now (UTC).
    pub fn into_detection(self, now: DateTime<Utc>) -> CoreResult<NewDetection> {
        validate_region(self.latitude, self.longitude)?;

        Ok(NewDetection {
            latitude: self.latitude,
            longitude: self.longitude,
            confidence: USER_REPORT_CONFIDENCE,
            brightness: None,
            bright_t31: None,
            scan: None,
            track: None,
            acq_date: now.date_naive(),
            acq_time: Some(now.format("%H%M").to_string()),
            satellite: "USER".to_string(),
            instrument: "REPORT".to_string(),
            source: FireSource::UserReported,
            frp: None,
            daynight: None,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
