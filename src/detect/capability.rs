use anyhow::Result;

use crate::config::ServiceConfig;
use crate::detect::backend::DetectorBackend;

/// Whether a detection model is available, resolved once at startup.
pub enum DetectorCapability {
    /// A loaded, warmed-up backend.
    Initialized(Box<dyn DetectorBackend>),
    /// No model; `/analyze` answers with a placeholder result.
    Unavailable { reason: String },
}

impl DetectorCapability {
    pub fn initialized<B: DetectorBackend + 'static>(backend: B) -> Self {
        Self::Initialized(Box::new(backend))
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Load the configured model, degrading to `Unavailable` on any failure.
    pub fn load(config: &ServiceConfig) -> Self {
        log::info!("loading detection model from {}", config.model_path);
        match load_backend(config) {
            Ok(backend) => {
                log::info!("detection model loaded and warmed up ({})", backend.name());
                Self::Initialized(backend)
            }
            Err(err) => {
                log::error!("failed to load detection model: {:#}", err);
                log::warn!("service will run without a model; /analyze returns mock responses");
                Self::Unavailable {
                    reason: format!("{:#}", err),
                }
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Initialized(_))
    }

    pub fn backend(&self) -> Option<&dyn DetectorBackend> {
        match self {
            Self::Initialized(backend) => Some(backend.as_ref()),
            Self::Unavailable { .. } => None,
        }
    }
}

impl std::fmt::Debug for DetectorCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized(backend) => f
                .debug_tuple("Initialized")
                .field(&backend.name())
                .finish(),
            Self::Unavailable { reason } => f
                .debug_struct("Unavailable")
                .field("reason", reason)
                .finish(),
        }
    }
}

#[cfg(feature = "backend-tract")]
fn load_backend(config: &ServiceConfig) -> Result<Box<dyn DetectorBackend>> {
    let backend = crate::detect::backends::TractBackend::new(&config.model_path, config.input_size)?
        .with_iou_threshold(config.iou_threshold);
    log::info!("warming up model...");
    backend.warm_up()?;
    Ok(Box::new(backend))
}

#[cfg(not(feature = "backend-tract"))]
fn load_backend(_config: &ServiceConfig) -> Result<Box<dyn DetectorBackend>> {
    Err(anyhow::anyhow!(
        "built without an inference backend (enable the backend-tract feature)"
    ))
}
