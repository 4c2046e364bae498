mod backend;
mod backends;
mod capability;
mod result;
pub mod yolo;

pub use backend::DetectorBackend;
#[cfg(feature = "backend-tract")]
pub use backends::TractBackend;
pub use backends::StubBackend;
pub use capability::DetectorCapability;
pub use result::Detection;
