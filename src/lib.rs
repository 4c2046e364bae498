//! Proctoring vision service
//!
//! Counts people/faces in base64 camera frames and flags a lone subject
//! whose face sits far off the horizontal center ("looking away").
//!
//! # Module Structure
//!
//! - `decode`: base64 → bounded RGB image
//! - `detect`: detector backends (tract ONNX, stub) and the startup-resolved
//!   `DetectorCapability`
//! - `compose`: face count, top confidence, looking-away heuristic
//! - `service`: the decode → detect → compose pipeline and wire types
//! - `api`: HTTP server (`GET /`, `GET /health`, `POST /analyze`)
//! - `config`: startup configuration from file and environment

pub mod api;
pub mod compose;
pub mod config;
pub mod decode;
pub mod detect;
pub mod service;

pub use compose::{compose, estimate_looking_away, Composition};
pub use config::ServiceConfig;
pub use decode::{decode_base64_image, DecodeError};
pub use detect::{Detection, DetectorBackend, DetectorCapability, StubBackend};
pub use service::{AnalyzeError, AnalyzeRequest, AnalyzeResponse, HealthResponse, ProctorService};
