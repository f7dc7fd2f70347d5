//! FIRMS API Client
//!
//! Blocking HTTP client for the NASA FIRMS country endpoint. Responses are
//! CSV; fields are unquoted, so parsing is a header-indexed split.

use std::time::Duration;

use chrono::NaiveDate;

use crate::constants;
use crate::error::{CoreError, CoreResult};
use crate::logic::detections::FireSource;

use super::feed::{HotspotFeed, RawHotspot};

/// Feed endpoint configuration
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub base_url: String,
    pub api_key: String,
    pub country: String,
    pub timeout_seconds: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: constants::get_firms_base_url(),
            api_key: constants::get_firms_api_key(),
            country: constants::get_firms_country(),
            timeout_seconds: constants::get_feed_timeout_secs(),
        }
    }
}

/// FIRMS feed client
pub struct FirmsClient {
    config: FeedConfig,
    agent: ureq::Agent,
}

impl FirmsClient {
    pub fn new(config: FeedConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build();
        Self { config, agent }
    }

    fn fetch_csv(&self, source: FireSource, days: u32) -> CoreResult<String> {
        let url = format!(
            "{}/api/country/csv/{}/{}/{}/{}",
            self.config.base_url,
            self.config.api_key,
            source.as_str(),
            self.config.country,
            days
        );

        log::info!("Fetching {} hotspots for the last {} day(s)", source, days);

        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|e| CoreError::FeedUnavailable(format!("{source}: {e}")))?;

        response
            .into_string()
            .map_err(|e| CoreError::FeedUnavailable(format!("{source}: read failed: {e}")))
    }
}

impl HotspotFeed for FirmsClient {
    fn fetch(&self, source: FireSource, days: u32) -> CoreResult<Vec<RawHotspot>> {
        let body = self.fetch_csv(source, days)?;
        let hotspots = parse_firms_csv(&body)?;
        log::info!("Parsed {} raw hotspot(s) from {}", hotspots.len(), source);
        Ok(hotspots)
    }
}

/// Parse a FIRMS CSV payload. An unusable header is a feed failure;
/// individually malformed rows are skipped.
pub fn parse_firms_csv(body: &str) -> CoreResult<Vec<RawHotspot>> {
    let mut lines = body.lines();
    let header = lines
        .next()
        .ok_or_else(|| CoreError::FeedUnavailable("empty feed response".to_string()))?;

    let columns: Vec<&str> = header.split(',').map(str::trim).collect();
    let index_of = |name: &str| columns.iter().position(|c| *c == name);

    // latitude/longitude are common to every product; anything else varies
    let lat_idx = index_of("latitude");
    let lon_idx = index_of("longitude");
    let (Some(lat_idx), Some(lon_idx)) = (lat_idx, lon_idx) else {
        return Err(CoreError::FeedUnavailable(format!(
            "unrecognised feed header: {header}"
        )));
    };

    let conf_idx = index_of("confidence");
    let date_idx = index_of("acq_date");
    let time_idx = index_of("acq_time");
    let sat_idx = index_of("satellite");
    let inst_idx = index_of("instrument");
    let frp_idx = index_of("frp");
    let dn_idx = index_of("daynight");
    let scan_idx = index_of("scan");
    let track_idx = index_of("track");
    // MODIS vs VIIRS channel names
    let bright_idx = index_of("brightness").or_else(|| index_of("bright_ti4"));
    let t31_idx = index_of("bright_t31").or_else(|| index_of("bright_ti5"));

    let mut hotspots = Vec::new();
    let mut skipped = 0usize;

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() < columns.len() {
            skipped += 1;
            continue;
        }

        let get = |idx: Option<usize>| idx.and_then(|i| fields.get(i)).copied();
        let get_f64 = |idx: Option<usize>| get(idx).and_then(|v| v.parse::<f64>().ok());

        let (Some(latitude), Some(longitude)) =
            (get_f64(Some(lat_idx)), get_f64(Some(lon_idx)))
        else {
            skipped += 1;
            continue;
        };

        let Some(acq_date) =
            get(date_idx).and_then(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d").ok())
        else {
            skipped += 1;
            continue;
        };

        let Some(confidence) = get(conf_idx).and_then(parse_confidence) else {
            skipped += 1;
            continue;
        };

        hotspots.push(RawHotspot {
            latitude,
            longitude,
            confidence,
            brightness: get_f64(bright_idx),
            bright_t31: get_f64(t31_idx),
            scan: get_f64(scan_idx),
            track: get_f64(track_idx),
            acq_date,
            acq_time: get(time_idx).map(normalize_hhmm),
            satellite: get(sat_idx).unwrap_or("").to_string(),
            instrument: get(inst_idx).unwrap_or("").to_string(),
            frp: get_f64(frp_idx),
            daynight: get(dn_idx).map(str::to_string),
        });
    }

    if skipped > 0 {
        log::debug!("Skipped {skipped} malformed feed row(s)");
    }
    Ok(hotspots)
}

/// MODIS reports numeric confidence; VIIRS collections report l/n/h grades.
/// Values outside [0, 100] are rejected (row skipped), never clamped.
fn parse_confidence(raw: &str) -> Option<i64> {
    match raw {
        "l" | "L" => Some(30),
        "n" | "N" => Some(50),
        "h" | "H" => Some(80),
        other => other
            .parse::<f64>()
            .ok()
            .map(|v| v.round() as i64)
            .filter(|v| (0..=100).contains(v)),
    }
}

/// Feed times come through as 1-4 digits ("7" means 00:07); left-pad to HHMM.
fn normalize_hhmm(raw: &str) -> String {
    format!("{raw:0>4}")
}
