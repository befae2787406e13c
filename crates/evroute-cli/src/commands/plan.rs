//! Plan command handler for computing charging-aware routes.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use evroute_lib::{
    optimize_route_with_options, EnergyEstimator, PredictorConfig, RouteRequest, RouteResponse,
    SearchOptions,
};

use crate::output::OutputFormat;

/// Arguments for the plan command.
#[derive(Debug, Clone, Default)]
pub struct PlanCommandArgs {
    /// JSON request file; stdin when absent or `-`.
    pub input: Option<PathBuf>,
    pub format: OutputFormat,
    /// Overrides the request's departure time.
    pub departure: Option<DateTime<Utc>>,
    /// Abort the search after this many milliseconds.
    pub deadline_ms: Option<u64>,
    /// Overrides `EVROUTE_PREDICTOR_URL`.
    pub predictor_url: Option<String>,
    /// Overrides `EVROUTE_PREDICTOR_TIMEOUT_SECS`.
    pub predictor_timeout_secs: Option<f64>,
}

impl PlanCommandArgs {
    /// Load the route request, applying command-line overrides.
    pub fn load_request(&self) -> Result<RouteRequest> {
        let (raw, source) = match self.input.as_deref() {
            Some(path) if path.as_os_str() != "-" => (
                fs::read_to_string(path)
                    .with_context(|| format!("failed to read request file {}", path.display()))?,
                path.display().to_string(),
            ),
            _ => {
                let mut buffer = String::new();
                io::stdin()
                    .read_to_string(&mut buffer)
                    .context("failed to read request from stdin")?;
                (buffer, "<stdin>".to_string())
            }
        };

        let mut request: RouteRequest = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse route request from {source}"))?;
        if let Some(departure) = self.departure {
            request.departure_time = Some(departure);
        }
        Ok(request)
    }

    /// Predictor settings from flags, falling back to the environment.
    pub fn predictor_config(&self) -> Result<Option<PredictorConfig>> {
        let config = match &self.predictor_url {
            Some(url) => Some(PredictorConfig::new(url.clone())),
            None => PredictorConfig::from_env(),
        };

        let Some(mut config) = config else {
            return Ok(None);
        };
        if let Some(secs) = self.predictor_timeout_secs {
            let timeout = Duration::try_from_secs_f64(secs)
                .ok()
                .filter(|timeout| !timeout.is_zero())
                .with_context(|| {
                    format!("--predictor-timeout must be a positive number of seconds, got {secs}")
                })?;
            config = config.with_timeout(timeout);
        }
        Ok(Some(config))
    }

    pub fn estimator(&self) -> Result<EnergyEstimator> {
        match self.predictor_config()? {
            Some(config) => {
                info!(
                    url = %config.base_url,
                    timeout_ms = config.timeout.as_millis() as u64,
                    "using external energy predictor"
                );
                EnergyEstimator::http(&config).context("failed to build energy predictor client")
            }
            None => {
                debug!("no energy predictor configured, using heuristic");
                Ok(EnergyEstimator::heuristic())
            }
        }
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            deadline: self
                .deadline_ms
                .map(|ms| Instant::now() + Duration::from_millis(ms)),
        }
    }
}

/// Compute the route response for the given arguments.
pub fn plan(args: &PlanCommandArgs) -> Result<RouteResponse> {
    let request = args.load_request()?;
    let estimator = args.estimator()?;
    let plan = optimize_route_with_options(&request, &estimator, &args.search_options())
        .context("route optimization failed")?;
    Ok(RouteResponse::from_plan(&plan, &request.policy))
}

/// Handle the `plan` subcommand, writing the result to stdout.
pub fn handle_plan(args: &PlanCommandArgs) -> Result<()> {
    let response = plan(args)?;
    args.format.write_to(&response, io::stdout().lock())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    const REQUEST: &str = r#"{
        "start": {"latitude": 0.0, "longitude": 0.0},
        "destination": {"latitude": 0.0, "longitude": 0.4496608029593653},
        "vehicle": {
            "battery_capacity_kwh": 60.0,
            "max_ac_charge_power_kw": 11.0,
            "max_dc_charge_power_kw": 150.0
        },
        "current_soc": 50.0,
        "departure_time": "2024-06-01T08:00:00Z"
    }"#;

    fn request_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(REQUEST.as_bytes()).expect("write request");
        file
    }

    #[test]
    fn departure_flag_overrides_request() {
        let file = request_file();
        let departure = "2025-01-01T00:00:00Z"
            .parse::<DateTime<Utc>>()
            .expect("timestamp");
        let args = PlanCommandArgs {
            input: Some(file.path().to_path_buf()),
            departure: Some(departure),
            ..PlanCommandArgs::default()
        };
        let request = args.load_request().expect("request loads");
        assert_eq!(request.departure_time, Some(departure));
        assert!(request.stations.is_empty());
    }

    #[test]
    fn predictor_flags_take_precedence() {
        let args = PlanCommandArgs {
            predictor_url: Some("http://127.0.0.1:9".to_string()),
            predictor_timeout_secs: Some(0.5),
            ..PlanCommandArgs::default()
        };
        let config = args
            .predictor_config()
            .expect("valid flags")
            .expect("predictor configured");
        assert_eq!(config.base_url, "http://127.0.0.1:9");
        assert_eq!(config.timeout, Duration::from_millis(500));
    }

    #[test]
    fn unusable_timeouts_are_rejected() {
        for secs in [0.0, -1.0, f64::NAN, f64::INFINITY, 1e20] {
            let args = PlanCommandArgs {
                predictor_url: Some("http://127.0.0.1:9".to_string()),
                predictor_timeout_secs: Some(secs),
                ..PlanCommandArgs::default()
            };
            let err = args.predictor_config().expect_err("timeout rejected");
            assert!(err.to_string().contains("--predictor-timeout"), "{secs}");
        }
    }

    #[test]
    fn plan_produces_direct_route() {
        let file = request_file();
        let args = PlanCommandArgs {
            input: Some(file.path().to_path_buf()),
            ..PlanCommandArgs::default()
        };
        let response = plan(&args).expect("route planned");
        assert!(response.feasible);
        assert!(response.charging_stops.is_empty());
        assert_eq!(response.total_distance, 50.0);
        assert_eq!(response.final_arrival_soc, 37.5);
    }
}
