//! Shared fixtures for service tests: in-memory fakes for the two external
//! HTTP collaborators plus a recording notifier.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, Once};

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};

use crate::services::backend::FileBackend;
use crate::services::notify::Notifier;
use crate::services::scanner::ScannerHelper;
use crate::types::{
    AttachedFile, DeviceStatus, FileOrigin, HelperScanStatus, LocalFile, ScanTarget, ServiceError,
    ServiceResult,
};

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap()
}

pub fn attached_file(id: &str, minutes_after_base: i64) -> AttachedFile {
    AttachedFile {
        id: id.to_string(),
        display_name: format!("{id}.pdf"),
        size_bytes: 4096,
        mime_type: "application/pdf".to_string(),
        created_at: base_time() + ChronoDuration::minutes(minutes_after_base),
        source_url: None,
        origin: FileOrigin::Existing,
    }
}

pub fn pdf(name: &str) -> LocalFile {
    LocalFile::new(name, "application/pdf", vec![0x25, 0x50, 0x44, 0x46])
}

pub fn text_file(name: &str) -> LocalFile {
    LocalFile::new(name, "text/plain", b"hello".to_vec())
}

/// Scanner helper fake: reachability, device presence, and per-endpoint
/// failure switches, with a call log for ordering assertions.
#[derive(Default)]
pub struct FakeHelper {
    pub reachable: AtomicBool,
    pub device_detected: AtomicBool,
    pub refuse_target: AtomicBool,
    pub refuse_document: AtomicBool,
    pub reject_scan: AtomicBool,
    pub calls: Mutex<Vec<String>>,
    pub last_target_url: Mutex<Option<String>>,
    pub last_target: Mutex<Option<ScanTarget>>,
}

impl FakeHelper {
    pub fn ready() -> Self {
        let fake = Self::default();
        fake.reachable.store(true, Ordering::Relaxed);
        fake.device_detected.store(true, Ordering::Relaxed);
        fake
    }

    pub fn offline() -> Self {
        Self::default()
    }

    pub fn without_device() -> Self {
        let fake = Self::default();
        fake.reachable.store(true, Ordering::Relaxed);
        fake
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }

    fn connectivity_gate(&self) -> ServiceResult<()> {
        if self.reachable.load(Ordering::Relaxed) {
            Ok(())
        } else {
            Err(ServiceError::Connectivity(
                "connection refused (os error 111)".to_string(),
            ))
        }
    }
}

#[async_trait]
impl ScannerHelper for FakeHelper {
    async fn ping(&self) -> ServiceResult<()> {
        self.record("ping");
        self.connectivity_gate()
    }

    async fn device_status(&self) -> ServiceResult<DeviceStatus> {
        self.record("device");
        self.connectivity_gate()?;
        Ok(DeviceStatus {
            detected: self.device_detected.load(Ordering::Relaxed),
            name: Some("Fake ADF Scanner".to_string()),
        })
    }

    async fn set_target_url(&self, base_url: &str) -> ServiceResult<()> {
        self.record("target");
        self.connectivity_gate()?;
        if self.refuse_target.load(Ordering::Relaxed) {
            return Err(ServiceError::Connectivity(
                "scanner helper answered HTTP 500".to_string(),
            ));
        }
        *self.last_target_url.lock().unwrap() = Some(base_url.to_string());
        Ok(())
    }

    async fn set_document(&self, target: &ScanTarget) -> ServiceResult<()> {
        self.record("document");
        self.connectivity_gate()?;
        if self.refuse_document.load(Ordering::Relaxed) {
            return Err(ServiceError::Connectivity(
                "scanner helper answered HTTP 500".to_string(),
            ));
        }
        *self.last_target.lock().unwrap() = Some(target.clone());
        Ok(())
    }

    async fn start_scan(&self) -> ServiceResult<()> {
        self.record("start");
        self.connectivity_gate()?;
        if self.reject_scan.load(Ordering::Relaxed) {
            return Err(ServiceError::Remote {
                status: 409,
                message: "scanner busy".to_string(),
            });
        }
        Ok(())
    }

    async fn status(&self) -> ServiceResult<HelperScanStatus> {
        self.record("status");
        self.connectivity_gate()?;
        Ok(HelperScanStatus {
            is_scanning: false,
            last_error: None,
        })
    }
}

/// Backend fake: serves a mutable file listing and counts calls.
#[derive(Default)]
pub struct FakeBackend {
    pub files: Mutex<Vec<AttachedFile>>,
    pub fail_listing: AtomicBool,
    pub list_calls: AtomicUsize,
    pub upload_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn with_files(files: Vec<AttachedFile>) -> Self {
        Self {
            files: Mutex::new(files),
            ..Self::default()
        }
    }

    pub fn push_file(&self, file: AttachedFile) {
        self.files.lock().unwrap().push(file);
    }
}

#[async_trait]
impl FileBackend for FakeBackend {
    async fn list_files(&self, _document_id: &str) -> ServiceResult<Vec<AttachedFile>> {
        self.list_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_listing.load(Ordering::Relaxed) {
            return Err(ServiceError::Connectivity("backend unreachable".to_string()));
        }
        Ok(self.files.lock().unwrap().clone())
    }

    async fn upload_files(
        &self,
        _document_id: &str,
        _classeur_id: &str,
        files: Vec<LocalFile>,
    ) -> ServiceResult<Vec<AttachedFile>> {
        self.upload_calls.fetch_add(1, Ordering::Relaxed);
        let created: Vec<AttachedFile> = files
            .iter()
            .enumerate()
            .map(|(i, f)| AttachedFile {
                id: format!("up-{i}-{}", f.file_name),
                display_name: f.file_name.clone(),
                size_bytes: f.bytes.len() as u64,
                mime_type: f.mime_type.clone(),
                created_at: Utc::now(),
                source_url: None,
                origin: FileOrigin::Existing,
            })
            .collect();
        self.files.lock().unwrap().extend(created.clone());
        Ok(created)
    }

    async fn delete_file(&self, file_id: &str) -> ServiceResult<()> {
        self.delete_calls.fetch_add(1, Ordering::Relaxed);
        let mut files = self.files.lock().unwrap();
        let before = files.len();
        files.retain(|f| f.id != file_id);
        if files.len() == before {
            return Err(ServiceError::Remote {
                status: 404,
                message: "file not found".to_string(),
            });
        }
        Ok(())
    }

    async fn download_file(&self, file_id: &str) -> ServiceResult<Vec<u8>> {
        let files = self.files.lock().unwrap();
        if files.iter().any(|f| f.id == file_id) {
            Ok(b"%PDF-1.7".to_vec())
        } else {
            Err(ServiceError::Remote {
                status: 404,
                message: "file not found".to_string(),
            })
        }
    }
}

/// Notifier that records everything and answers confirmations per flag.
#[derive(Default)]
pub struct RecordingNotifier {
    pub confirm_answer: AtomicBool,
    pub messages: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn confirming() -> Self {
        let notifier = Self::default();
        notifier.confirm_answer.store(true, Ordering::Relaxed);
        notifier
    }

    pub fn messages_of(&self, kind: &str) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| k == kind)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn info(&self, message: &str) {
        self.messages
            .lock()
            .unwrap()
            .push(("info".to_string(), message.to_string()));
    }

    fn success(&self, message: &str) {
        self.messages
            .lock()
            .unwrap()
            .push(("success".to_string(), message.to_string()));
    }

    fn error(&self, message: &str) {
        self.messages
            .lock()
            .unwrap()
            .push(("error".to_string(), message.to_string()));
    }

    fn confirm(&self, message: &str) -> bool {
        self.messages
            .lock()
            .unwrap()
            .push(("confirm".to_string(), message.to_string()));
        self.confirm_answer.load(Ordering::Relaxed)
    }
}
