use anyhow::{Context, Result};
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
};

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_MODEL_PATH: &str = "models/carbon_model.json";

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub model_path: PathBuf,
    /// `LOG_PRED=1`: log every assembled feature vector.
    pub log_predictions: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            log_predictions: false,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(port) = lookup("PORT") {
            cfg.port = port
                .trim()
                .parse()
                .with_context(|| format!("invalid PORT value {:?}", port))?;
        }
        if let Some(host) = lookup("HOST") {
            cfg.host = host
                .trim()
                .parse()
                .with_context(|| format!("invalid HOST value {:?}", host))?;
        }
        if let Some(path) = lookup("MODEL_PATH").filter(|p| !p.trim().is_empty()) {
            cfg.model_path = PathBuf::from(path);
        }
        cfg.log_predictions = lookup("LOG_PRED").as_deref() == Some("1");
        Ok(cfg)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
