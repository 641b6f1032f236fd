use std::net::SocketAddr;

use serde::Deserialize;
use infergate_core::error::{InferError, Result};

use crate::obs::CountPolicy;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub model: ModelSection,

    #[serde(default)]
    pub metrics: MetricsSection,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(InferError::UnsupportedVersion);
        }

        self.server.validate()?;
        self.model.validate()?;

        Ok(())
    }

    /// Apply `INFERGATE_LISTEN` / `INFERGATE_MODEL_PATH` style overrides.
    /// The caller is expected to re-run `validate`.
    pub fn apply_overrides(&mut self, listen: Option<String>, model_path: Option<String>) {
        if let Some(listen) = listen {
            self.server.listen = listen;
        }
        if let Some(path) = model_path {
            self.model.path = path;
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            model: ModelSection::default(),
            metrics: MetricsSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        if !(1..=16 * 1024 * 1024).contains(&self.max_body_bytes) {
            return Err(InferError::Config(
                "server.max_body_bytes must be between 1 and 16777216".into(),
            ));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|e| {
            InferError::Config(format!(
                "server.listen must be a valid SocketAddr ({}): {e}",
                self.listen
            ))
        })
    }
}

fn default_listen() -> String {
    "0.0.0.0:8000".into()
}
fn default_max_body_bytes() -> usize {
    64 * 1024
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelSection {
    #[serde(default = "default_model_path")]
    pub path: String,
}

impl Default for ModelSection {
    fn default() -> Self {
        Self { path: default_model_path() }
    }
}

impl ModelSection {
    pub fn validate(&self) -> Result<()> {
        if self.path.trim().is_empty() {
            return Err(InferError::Config("model.path must not be empty".into()));
        }
        Ok(())
    }
}

fn default_model_path() -> String {
    "models/iris_tree.json".into()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    #[serde(default)]
    pub count_policy: CountPolicy,
}
