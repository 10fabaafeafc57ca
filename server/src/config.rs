use std::env;
use std::net::SocketAddr;

use schema::Speed;

use crate::runner::DEFAULT_DRIFT_STEP_DEG;

/// Server settings, read from the environment (and `.env`) at start-up
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Address the gRPC server listens on (`SERVER_SOCKET`)
    pub socket: SocketAddr,
    /// Seed file for riders (`RIDERS_CSV`)
    pub riders_csv: String,
    /// Seed file for orders (`ORDERS_CSV`)
    pub orders_csv: String,
    /// `FAST_FORWARD` or `SLOW_MOTION` multiplier for rider movement
    pub speed: Speed,
    /// Max degrees a rider moves per drift (`DRIFT_STEP_DEG`)
    pub drift_step_deg: f64,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = lookup("SERVER_SOCKET")
            .unwrap_or_else(|| "0.0.0.0:50051".to_string())
            .parse()?;

        let rate = |key: &str| -> Result<Option<u8>, Box<dyn std::error::Error>> {
            lookup(key)
                .map(|value| value.parse::<u8>())
                .transpose()
                .map_err(|e| format!("{}: {}", key, e).into())
        };
        let speed = match (rate("FAST_FORWARD")?, rate("SLOW_MOTION")?) {
            (Some(_), Some(_)) => {
                return Err("FAST_FORWARD and SLOW_MOTION are exclusive".into())
            }
            (Some(n), None) => Speed::fast_forward(n).ok_or("FAST_FORWARD must be positive")?,
            (None, Some(n)) => Speed::slow_motion(n).ok_or("SLOW_MOTION must be positive")?,
            (None, None) => Speed::RealTime,
        };

        let drift_step_deg = match lookup("DRIFT_STEP_DEG") {
            Some(value) => value.parse::<f64>()?,
            None => DEFAULT_DRIFT_STEP_DEG,
        };
        if !drift_step_deg.is_finite() || drift_step_deg < 0.0 {
            return Err("DRIFT_STEP_DEG must be a non-negative number".into());
        }

        Ok(Self {
            socket,
            riders_csv: lookup("RIDERS_CSV")
                .unwrap_or_else(|| schema::SAMPLE_RIDERS_CSV_PATH.to_string()),
            orders_csv: lookup("ORDERS_CSV")
                .unwrap_or_else(|| schema::SAMPLE_ORDERS_CSV_PATH.to_string()),
            speed,
            drift_step_deg,
        })
    }
}
