use anyhow::Result;
use figment::{providers::{Env, Format, Toml}, Figment};
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

use crate::domain::ModelLimits;
use crate::optimizer::SolverSettings;
use crate::plot::PlotSettings;
use crate::telemetry::{LogFormat, DEFAULT_FILTER};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub solver: SolverConfig,
    pub plot: PlotConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
    pub request_timeout_secs: u64,
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            enable_cors: false,
            request_timeout_secs: 60,
            body_limit_bytes: 1024 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub time_limit_seconds: u64,
    pub max_variables: usize,
    pub max_constraints: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        let limits = ModelLimits::default();
        Self {
            time_limit_seconds: 30,
            max_variables: limits.max_variables,
            max_constraints: limits.max_constraints,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub width: u32,
    pub height: u32,
    pub axis_scale: f64,
    pub min_axis: f64,
}

impl Default for PlotConfig {
    fn default() -> Self {
        let settings = PlotSettings::default();
        Self {
            width: settings.width,
            height: settings.height,
            axis_scale: settings.axis_scale,
            min_axis: settings.min_axis,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub ttl_seconds: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "lp_session".to_string(),
            ttl_seconds: 600,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Json,
            filter: DEFAULT_FILTER.to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_figment(
            Figment::new()
                .merge(Toml::file("config/default.toml"))
                .merge(Env::prefixed("LPWEB__").split("__")),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let cfg: Config = figment.extract()?;
        if cfg.plot.width == 0 || cfg.plot.height == 0 {
            anyhow::bail!("plot dimensions must be positive");
        }
        if cfg.plot.axis_scale <= 0.0 || cfg.plot.min_axis <= 0.0 {
            anyhow::bail!("plot axis_scale and min_axis must be positive");
        }
        Ok(cfg)
    }

    pub fn solver_settings(&self) -> SolverSettings {
        SolverSettings {
            time_limit: Duration::from_secs(self.solver.time_limit_seconds.max(1)),
            limits: ModelLimits {
                max_variables: self.solver.max_variables,
                max_constraints: self.solver.max_constraints,
            },
            plot: PlotSettings {
                width: self.plot.width,
                height: self.plot.height,
                axis_scale: self.plot.axis_scale,
                min_axis: self.plot.min_axis,
            },
        }
    }
}
