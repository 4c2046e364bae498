//! proctor-vision - face detection service for exam proctoring
//!
//! This daemon:
//! 1. Loads configuration from `PROCTOR_CONFIG` and the environment
//! 2. Loads and warms up the detection model (or runs degraded without it)
//! 3. Serves `GET /`, `GET /health` and `POST /analyze` until Ctrl-C

use anyhow::Result;
use clap::Parser;
use std::sync::mpsc;
use std::sync::Arc;

use proctor_vision::{
    api::{ApiConfig, ApiServer},
    DetectorCapability, ProctorService, ServiceConfig,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Listen address (overrides PROCTOR_ADDR).
    #[arg(long)]
    addr: Option<String>,
    /// ONNX model path (overrides YOLO_MODEL_PATH).
    #[arg(long)]
    model_path: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = ServiceConfig::load()?;
    if let Some(addr) = args.addr {
        config.addr = addr;
    }
    if let Some(model_path) = args.model_path {
        config.model_path = model_path;
    }
    config.validate()?;
    log::info!(
        "confidence_threshold={}, max_image_size={}, input_size={}",
        config.confidence_threshold,
        config.max_image_size,
        config.input_size
    );

    let detector = DetectorCapability::load(&config);
    let api_config = ApiConfig {
        addr: config.addr.clone(),
        ..ApiConfig::default()
    };
    let service = Arc::new(ProctorService::new(config, detector));
    let api_handle = ApiServer::new(api_config, service).spawn()?;
    log::info!("proctor-vision listening on {}", api_handle.addr);

    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })?;

    log::info!("waiting for shutdown signal (Ctrl-C)...");
    let _ = rx.recv();
    log::info!("shutting down...");
    api_handle.stop()?;

    Ok(())
}
