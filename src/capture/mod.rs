pub mod backend;
pub mod session;

#[cfg(feature = "audio-io")]
pub use backend::CpalBackend;
pub use backend::{RecorderBackend, RecorderEvent};
pub use session::{CaptureSession, DeviceLock, SessionState};
