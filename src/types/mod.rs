pub mod errors;
pub mod files;
pub mod scan;

pub use errors::{ServiceError, ServiceResult};
pub use files::{AttachedFile, FileOrigin, FileSnapshot, LocalFile};
pub use scan::{DeviceStatus, HelperScanStatus, ScanOutcome, ScanSessionState, ScanTarget, ScannerConnectionStatus};
