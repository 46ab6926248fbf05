//! Viewer configuration
//!
//! Defaults reproduce the classic setup: a service on `localhost:8000`, a
//! 25 unit ring drawn at 32 px per unit, car 1 tracked, polled at 10 Hz.
//! Every field can be overridden with a `TSV_*` environment variable.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tsv_core::{Hertz, TrackGeometry, VehicleId};

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    /// Base URL of the simulation service
    pub backend_url: String,

    /// Address the viewer's web UI and API listen on
    pub listen: SocketAddr,

    pub geometry: TrackGeometry,

    /// Initial polling rate
    pub rate: Hertz,

    /// Number of speed samples kept for the chart
    pub window_capacity: usize,

    pub request_timeout: Duration,

    /// Run against the in-process demo simulation instead of `backend_url`
    pub demo: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8000".to_string(),
            listen: SocketAddr::from(([0, 0, 0, 0], 9200)),
            geometry: TrackGeometry::default(),
            rate: Hertz::default(),
            window_capacity: tsv_core::window::DEFAULT_CAPACITY,
            request_timeout: tsv_backends::http::DEFAULT_TIMEOUT,
            demo: false,
        }
    }
}

impl ViewerConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from any key/value source, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("TSV_BACKEND_URL") {
            config.backend_url = url;
        }
        if let Some(listen) = parse::<SocketAddr, _>(&lookup, "TSV_LISTEN")? {
            config.listen = listen;
        }
        if let Some(extent) = parse::<f64, _>(&lookup, "TSV_EXTENT_X")? {
            anyhow::ensure!(
                extent.is_finite() && extent > 0.0,
                "TSV_EXTENT_X must be a positive number, got {}",
                extent
            );
            config.geometry.extent_x = extent;
        }
        if let Some(scale) = parse::<f64, _>(&lookup, "TSV_SCALE_PX")? {
            anyhow::ensure!(
                scale.is_finite() && scale > 0.0,
                "TSV_SCALE_PX must be a positive number, got {}",
                scale
            );
            config.geometry.scale_px = scale;
        }
        if let Some(id) = parse::<VehicleId, _>(&lookup, "TSV_TRACKED_ID")? {
            config.geometry.tracked_id = id;
        }
        if let Some(rate) = parse::<u32, _>(&lookup, "TSV_RATE_HZ")? {
            config.rate = Hertz::clamped(rate);
        }
        if let Some(capacity) = parse::<usize, _>(&lookup, "TSV_WINDOW")? {
            config.window_capacity = capacity;
        }
        if let Some(ms) = parse::<u64, _>(&lookup, "TSV_TIMEOUT_MS")? {
            config.request_timeout = Duration::from_millis(ms);
        }
        if let Some(demo) = lookup("TSV_DEMO") {
            config.demo = matches!(demo.trim(), "1" | "true" | "yes" | "on");
        }

        Ok(config)
    }
}

fn parse<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("Invalid value for {}: {:?}", key, raw))
        })
        .transpose()
}
