//! Service Commands - API for the presentation layer
//!
//! One `FireService` owns the store, the model registry and the feed
//! client; each operation takes a request struct and returns a response
//! struct, both serde-serialisable for whatever transport sits outside.

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_GRID_SIZE_DEG, TRAINING_GRID_SIZE_DEG};
use crate::error::{CoreError, CoreResult};
use crate::logic::dedup::DedupConfig;
use crate::logic::detections::{validate_confidence, FireDetection, FireSource, UserFireReport};
use crate::logic::features::Grid;
use crate::logic::geo::BoundingBox;
use crate::logic::ingest::{self, FeedConfig, FirmsClient, HotspotFeed};
use crate::logic::model::{train_model, ModelRegistry, TrainingConfig};
use crate::logic::predict::{generate_predictions, FirePrediction, RiskLevel};
use crate::logic::stats::{fire_statistics, FireStatistics, GroupBy, TimePeriod};
use crate::logic::store::detections::DetectionFilter;
use crate::logic::store::predictions::PredictionFilter;
use crate::logic::store::FireStore;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Refresh request: which feed products, over which inclusive date range.
/// Missing dates default to the trailing week.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefreshRequest {
    pub sources: Option<Vec<String>>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshResponse {
    pub status: String,
    pub new_fires: usize,
    pub total_fires: usize,
    pub rejected_out_of_region: usize,
    pub sources: Vec<String>,
    pub date_range: String,
}

/// Detection query filters; unset bounds fall back to the monitoring area.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetectionQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub sources: Option<Vec<String>>,
    pub min_confidence: Option<i64>,
    pub lat_min: Option<f64>,
    pub lat_max: Option<f64>,
    pub lon_min: Option<f64>,
    pub lon_max: Option<f64>,
    pub limit: Option<usize>,
}

/// Detection as exposed across the boundary.
#[derive(Debug, Clone, Serialize)]
pub struct FireDetectionInfo {
    pub id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub confidence: i64,
    pub brightness: Option<f64>,
    pub acq_date: String,
    pub acq_time: Option<String>,
    pub satellite: String,
    pub instrument: String,
    pub source: String,
    pub frp: Option<f64>,
    pub daynight: Option<String>,
    pub created_at: String,
}

impl From<FireDetection> for FireDetectionInfo {
    fn from(d: FireDetection) -> Self {
        Self {
            id: d.id,
            latitude: d.latitude,
            longitude: d.longitude,
            confidence: d.confidence,
            brightness: d.brightness,
            acq_date: d.acq_date.to_string(),
            acq_time: d.acq_time,
            satellite: d.satellite,
            instrument: d.instrument,
            source: d.source.as_str().to_string(),
            frp: d.frp,
            daynight: d.daynight,
            created_at: d.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FireReportRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub description: Option<String>,
    pub reporter_name: Option<String>,
    pub reporter_contact: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FireReportResponse {
    pub status: String,
    pub fire_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainModelResponse {
    pub status: String,
    pub r2_score: f64,
    pub mse: f64,
    pub model_version: String,
    pub samples: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeneratePredictionsRequest {
    pub lat_min: Option<f64>,
    pub lat_max: Option<f64>,
    pub lon_min: Option<f64>,
    pub lon_max: Option<f64>,
    pub grid_size: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratePredictionsResponse {
    pub status: String,
    pub predictions_generated: usize,
    pub model_version: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictionQuery {
    pub risk_level: Option<String>,
    pub min_probability: Option<f64>,
    pub lat_min: Option<f64>,
    pub lat_max: Option<f64>,
    pub lon_min: Option<f64>,
    pub lon_max: Option<f64>,
    /// None = latest generation run
    pub model_version: Option<String>,
    pub limit: Option<usize>,
}

/// Prediction as exposed across the boundary.
#[derive(Debug, Clone, Serialize)]
pub struct FirePredictionInfo {
    pub id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub probability: f64,
    pub risk_level: String,
    pub prediction_date: String,
    pub model_version: String,
    pub created_at: String,
}

impl From<FirePrediction> for FirePredictionInfo {
    fn from(p: FirePrediction) -> Self {
        Self {
            id: p.id,
            latitude: p.latitude,
            longitude: p.longitude,
            probability: p.probability,
            risk_level: p.risk_level.as_str().to_string(),
            prediction_date: p.prediction_date.to_string(),
            model_version: p.model_version,
            created_at: p.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatsRequest {
    pub time_period: Option<String>,
    pub group_by: Option<String>,
}

// ============================================================================
// SERVICE
// ============================================================================

/// The core service handle. Owns the store, the model registry and the
/// feed client; safe to share behind whatever the outer layer uses.
pub struct FireService {
    store: FireStore,
    registry: ModelRegistry,
    feed: Box<dyn HotspotFeed>,
    dedup_config: DedupConfig,
    training_config: TrainingConfig,
}

impl FireService {
    pub fn new(store: FireStore, feed: Box<dyn HotspotFeed>) -> Self {
        Self {
            store,
            registry: ModelRegistry::new(),
            feed,
            dedup_config: DedupConfig::default(),
            training_config: TrainingConfig::default(),
        }
    }

    pub fn with_configs(
        store: FireStore,
        feed: Box<dyn HotspotFeed>,
        dedup_config: DedupConfig,
        training_config: TrainingConfig,
    ) -> Self {
        Self { store, registry: ModelRegistry::new(), feed, dedup_config, training_config }
    }

    /// Production wiring: database at the default path, FIRMS client from
    /// the environment.
    pub fn open_default() -> CoreResult<Self> {
        let store = FireStore::open(&crate::constants::get_database_path())?;
        let feed = Box::new(FirmsClient::new(FeedConfig::default()));
        Ok(Self::new(store, feed))
    }

    pub fn store(&self) -> &FireStore {
        &self.store
    }

    // ------------------------------------------------------------------
    // Ingestion
    // ------------------------------------------------------------------

    /// Refresh detections from the satellite feed.
    pub fn refresh_fire_data(&self, request: RefreshRequest) -> CoreResult<RefreshResponse> {
        let sources = resolve_feed_sources(request.sources.as_deref())?;

        let today = Utc::now().date_naive();
        let end = request.end_date.unwrap_or(today);
        let start = request.start_date.unwrap_or(end - Duration::days(7));
        if start > end {
            return Err(CoreError::Validation(format!(
                "start date {start} is after end date {end}"
            )));
        }

        let report =
            ingest::refresh(&self.store, self.feed.as_ref(), &sources, start, end, &self.dedup_config)?;

        Ok(RefreshResponse {
            status: "success".to_string(),
            new_fires: report.new_fires,
            total_fires: report.total_fires,
            rejected_out_of_region: report.rejected_out_of_region,
            sources: sources.iter().map(|s| s.as_str().to_string()).collect(),
            date_range: format!("{start} to {end}"),
        })
    }

    /// Accept an unauthenticated fire sighting.
    pub fn report_fire(&self, request: FireReportRequest) -> CoreResult<FireReportResponse> {
        let report = UserFireReport {
            latitude: request.latitude,
            longitude: request.longitude,
            description: request.description,
            reporter_name: request.reporter_name,
            reporter_contact: request.reporter_contact,
        };
        let detection = report.into_detection(Utc::now())?;
        let fire_id = self.store.insert_detection(&detection)?;

        log::info!("User report accepted as detection {fire_id}");
        Ok(FireReportResponse { status: "success".to_string(), fire_id })
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn get_fire_detections(&self, query: DetectionQuery) -> CoreResult<Vec<FireDetectionInfo>> {
        let sources = match query.sources.as_deref() {
            Some(labels) => Some(resolve_sources(labels)?),
            None => None,
        };
        if let Some(min_confidence) = query.min_confidence {
            validate_confidence(min_confidence)?;
        }

        let detections = self.store.query_detections(&DetectionFilter {
            start_date: query.start_date,
            end_date: query.end_date,
            sources,
            min_confidence: query.min_confidence,
            bbox: Some(bounds_from(
                query.lat_min,
                query.lat_max,
                query.lon_min,
                query.lon_max,
            )),
            limit: Some(query.limit.unwrap_or(1000)),
        })?;

        Ok(detections.into_iter().map(Into::into).collect())
    }

    pub fn get_recent_fires(&self, limit: Option<usize>) -> CoreResult<Vec<FireDetectionInfo>> {
        let detections = self.store.most_recent(limit.unwrap_or(3))?;
        Ok(detections.into_iter().map(Into::into).collect())
    }

    pub fn get_fire_predictions(&self, query: PredictionQuery) -> CoreResult<Vec<FirePredictionInfo>> {
        let risk_level = match query.risk_level.as_deref() {
            Some(label) => Some(
                RiskLevel::parse(label)
                    .ok_or_else(|| CoreError::Validation(format!("unknown risk level '{label}'")))?,
            ),
            None => None,
        };

        let predictions = self.store.query_predictions(&PredictionFilter {
            risk_level,
            min_probability: Some(query.min_probability.unwrap_or(0.3)),
            bbox: Some(bounds_from(
                query.lat_min,
                query.lat_max,
                query.lon_min,
                query.lon_max,
            )),
            model_version: query.model_version,
            limit: Some(query.limit.unwrap_or(500)),
        })?;

        Ok(predictions.into_iter().map(Into::into).collect())
    }

    pub fn get_fire_statistics(&self, request: StatsRequest) -> CoreResult<FireStatistics> {
        let time_period = TimePeriod::parse(request.time_period.as_deref().unwrap_or("week"))?;
        let group_by = GroupBy::parse(request.group_by.as_deref().unwrap_or("source"))?;
        fire_statistics(&self.store, time_period, group_by, Utc::now().date_naive())
    }

    // ------------------------------------------------------------------
    // Model lifecycle
    // ------------------------------------------------------------------

    /// Train a new model over the full stored history and publish it.
    pub fn train_model(&self) -> CoreResult<TrainModelResponse> {
        let detections = self.store.all_detections()?;
        let grid = Grid::new(BoundingBox::default(), TRAINING_GRID_SIZE_DEG);
        let version = self.registry.next_version();

        let model = train_model(&grid, &detections, &self.training_config, version)?;
        let published = self.registry.publish(model);

        Ok(TrainModelResponse {
            status: "success".to_string(),
            r2_score: published.metrics.r2_score,
            mse: published.metrics.mse,
            model_version: published.version.clone(),
            samples: published.samples,
        })
    }

    /// Generate predictions with the current artifact. Fails with
    /// `ModelNotTrained` before touching the store when no training run
    /// has completed.
    pub fn generate_predictions(
        &self,
        request: GeneratePredictionsRequest,
    ) -> CoreResult<GeneratePredictionsResponse> {
        let model = self.registry.current().ok_or(CoreError::ModelNotTrained)?;

        let bounds =
            bounds_from(request.lat_min, request.lat_max, request.lon_min, request.lon_max);
        let grid_size = request.grid_size.unwrap_or(DEFAULT_GRID_SIZE_DEG);
        if grid_size <= 0.0 {
            return Err(CoreError::Validation(format!("grid size {grid_size} must be positive")));
        }

        let outcome = generate_predictions(
            &self.store,
            model.as_ref(),
            bounds,
            grid_size,
            Utc::now().date_naive(),
        )?;

        Ok(GeneratePredictionsResponse {
            status: "success".to_string(),
            predictions_generated: outcome.predictions_generated,
            model_version: outcome.model_version,
        })
    }
}

fn bounds_from(
    lat_min: Option<f64>,
    lat_max: Option<f64>,
    lon_min: Option<f64>,
    lon_max: Option<f64>,
) -> BoundingBox {
    let defaults = BoundingBox::default();
    BoundingBox {
        lat_min: lat_min.unwrap_or(defaults.lat_min),
        lat_max: lat_max.unwrap_or(defaults.lat_max),
        lon_min: lon_min.unwrap_or(defaults.lon_min),
        lon_max: lon_max.unwrap_or(defaults.lon_max),
    }
}

fn resolve_sources(labels: &[String]) -> CoreResult<Vec<FireSource>> {
    labels
        .iter()
        .map(|label| {
            FireSource::canonicalize(label)
                .ok_or_else(|| CoreError::Validation(format!("unknown source '{label}'")))
        })
        .collect()
}

/// Resolve refresh sources; defaults to every satellite product. User
/// reports are not a feed and cannot be refreshed.
fn resolve_feed_sources(labels: Option<&[String]>) -> CoreResult<Vec<FireSource>> {
    let sources = match labels {
        Some(labels) => resolve_sources(labels)?,
        None => FireSource::feed_sources().to_vec(),
    };
    if sources.iter().any(|s| *s == FireSource::UserReported) {
        return Err(CoreError::Validation(
            "USER_REPORTED is not a satellite feed source".to_string(),
        ));
    }
    Ok(sources)
}

// ============================================================================
// TESTS
// ============================================================================
