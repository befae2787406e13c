//! Energy consumption estimates for route segments.
//!
//! The optimizer asks an external predictor for the energy a segment will
//! consume. The predictor is reached over HTTP with a bounded timeout; any
//! failure (timeout, transport error, non-2xx status, unusable body) falls
//! back to a linear heuristic on distance and elevation gain. There are no
//! retries, so a single failed call costs at most one timeout.
//!
//! # Wire format
//!
//! `POST {base_url}/predict` with body
//! `{"distance_km": .., "elevation_gain_m": .., "battery_capacity_kwh": ..}`
//! and a successful response body of `{"energy_kwh": ..}`.

use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};

const PREDICTOR_URL_ENV: &str = "EVROUTE_PREDICTOR_URL";
const PREDICTOR_TIMEOUT_ENV: &str = "EVROUTE_PREDICTOR_TIMEOUT_SECS";

/// Timeout applied to each predictor call unless configured otherwise.
pub const DEFAULT_PREDICTOR_TIMEOUT: Duration = Duration::from_secs(5);

/// Heuristic consumption per driven kilometre.
pub const FALLBACK_KWH_PER_KM: f64 = 0.15;
/// Heuristic consumption per kilometre of elevation gain.
pub const FALLBACK_KWH_PER_KM_CLIMB: f64 = 2.0;

/// Segment description sent to the predictor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnergyQuery {
    pub distance_km: f64,
    pub elevation_gain_m: f64,
    pub battery_capacity_kwh: f64,
}

/// Energy estimate for one segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EnergyEstimate {
    pub energy_kwh: f64,
    /// `true` when the heuristic produced the value instead of the predictor.
    pub used_fallback: bool,
}

/// Reasons a prediction could not be used.
#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("predictor returned unusable energy value {0}")]
    InvalidValue(f64),

    #[error("predictor unavailable: {0}")]
    Unavailable(String),
}

/// External energy-consumption predictor.
///
/// Implementations are shared across worker threads during a search, so
/// they must be `Send + Sync`.
pub trait EnergyPredictor: Send + Sync {
    /// Predict the energy in kWh needed to drive the described segment.
    fn predict(&self, query: &EnergyQuery) -> std::result::Result<f64, PredictionError>;
}

/// Linear heuristic used whenever the predictor cannot answer.
///
/// ```
/// use evroute_lib::energy::fallback_energy_kwh;
///
/// assert_eq!(fallback_energy_kwh(100.0, 0.0), 15.0);
/// assert_eq!(fallback_energy_kwh(100.0, 500.0), 16.0);
/// ```
pub fn fallback_energy_kwh(distance_km: f64, elevation_gain_m: f64) -> f64 {
    distance_km * FALLBACK_KWH_PER_KM + (elevation_gain_m / 1000.0) * FALLBACK_KWH_PER_KM_CLIMB
}

/// Connection settings for [`HttpEnergyPredictor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictorConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl PredictorConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_PREDICTOR_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read the configuration from `EVROUTE_PREDICTOR_URL` and
    /// `EVROUTE_PREDICTOR_TIMEOUT_SECS`.
    ///
    /// Returns `None` when no predictor URL is configured.
    pub fn from_env() -> Option<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let base_url = lookup(PREDICTOR_URL_ENV).filter(|url| !url.trim().is_empty())?;
        let timeout = lookup(PREDICTOR_TIMEOUT_ENV)
            .and_then(|value| value.trim().parse::<f64>().ok())
            .filter(|secs| *secs > 0.0)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .unwrap_or(DEFAULT_PREDICTOR_TIMEOUT);

        Some(Self {
            base_url: base_url.trim().to_string(),
            timeout,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/predict", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct PredictionResponse {
    energy_kwh: f64,
}

/// Predictor backed by a blocking HTTP client.
#[derive(Debug, Clone)]
pub struct HttpEnergyPredictor {
    client: Client,
    endpoint: String,
}

impl HttpEnergyPredictor {
    /// Build a predictor client; the timeout covers the whole request.
    pub fn new(config: &PredictorConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(user_agent())
            .build()
            .map_err(Error::Http)?;

        Ok(Self {
            client,
            endpoint: config.endpoint(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl EnergyPredictor for HttpEnergyPredictor {
    fn predict(&self, query: &EnergyQuery) -> std::result::Result<f64, PredictionError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(ACCEPT, "application/json")
            .json(query)
            .send()?
            .error_for_status()?;

        let body = response.json::<PredictionResponse>()?;
        Ok(body.energy_kwh)
    }
}

fn user_agent() -> String {
    format!("evroute-lib/{version}", version = env!("CARGO_PKG_VERSION"))
}

/// Combines an optional external predictor with the fallback heuristic.
///
/// [`EnergyEstimator::estimate`] never fails: it is the last line of defense
/// so the optimizer always has an energy value for every edge.
#[derive(Clone, Default)]
pub struct EnergyEstimator {
    predictor: Option<Arc<dyn EnergyPredictor>>,
}

impl fmt::Debug for EnergyEstimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnergyEstimator")
            .field("predictor", &self.predictor.is_some())
            .finish()
    }
}

impl EnergyEstimator {
    /// Estimator that only uses the heuristic.
    pub fn heuristic() -> Self {
        Self { predictor: None }
    }

    pub fn with_predictor(predictor: Arc<dyn EnergyPredictor>) -> Self {
        Self {
            predictor: Some(predictor),
        }
    }

    /// Estimator talking to the HTTP predictor described by `config`.
    pub fn http(config: &PredictorConfig) -> Result<Self> {
        Ok(Self::with_predictor(Arc::new(HttpEnergyPredictor::new(
            config,
        )?)))
    }

    pub fn has_predictor(&self) -> bool {
        self.predictor.is_some()
    }

    /// Estimate the energy for a segment, falling back to the heuristic on
    /// any predictor failure.
    pub fn estimate(&self, query: &EnergyQuery) -> EnergyEstimate {
        let Some(predictor) = &self.predictor else {
            return self.fallback(query);
        };

        match predictor.predict(query) {
            Ok(energy_kwh) if energy_kwh.is_finite() && energy_kwh >= 0.0 => EnergyEstimate {
                energy_kwh,
                used_fallback: false,
            },
            Ok(energy_kwh) => {
                warn!(
                    distance_km = query.distance_km,
                    error = %PredictionError::InvalidValue(energy_kwh),
                    "energy predictor failed, using heuristic"
                );
                self.fallback(query)
            }
            Err(error) => {
                warn!(
                    distance_km = query.distance_km,
                    error = %error,
                    "energy predictor failed, using heuristic"
                );
                self.fallback(query)
            }
        }
    }

    fn fallback(&self, query: &EnergyQuery) -> EnergyEstimate {
        let energy_kwh = fallback_energy_kwh(query.distance_km, query.elevation_gain_m);
        debug!(
            distance_km = query.distance_km,
            elevation_gain_m = query.elevation_gain_m,
            energy_kwh,
            "heuristic energy estimate"
        );
        EnergyEstimate {
            energy_kwh,
            used_fallback: true,
        }
    }
}
