//! Scanner helper integration: probing, configuration, and the scan
//! session workflow.
//!
//! The helper is a locally-run, unauthenticated HTTP service bridging this
//! client to physical scanning hardware. It is best-effort by nature: its
//! unavailability is an expected, recoverable condition, never a fatal
//! error.

pub mod helper;
pub mod prober;
pub mod session;

pub use helper::{HelperClient, ScannerHelper};
pub use prober::{ConnectionProber, ProbeMonitor};
pub use session::{ScanSession, ScanSessionController};
