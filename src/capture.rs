//! QR capture
//!
//! Decoding QR images is left to an external decoder. A [`QrCapture`]
//! delivers decoded payloads as [`ScanEvent`]s on a channel; a
//! [`ScanSession`] feeds them into the mission ledger.

use std::fmt;
use std::process::Stdio;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::{Mutex, Notify, mpsc};
use tracing::{debug, warn};

use crate::account::Session;
use crate::ledger::{LedgerError, MissionCompleted, MissionLedger};

/// Which camera a capture should use
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraSelector {
    Facing(Facing),
    /// Platform device identifier, e.g. `/dev/video0`
    Device(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    /// Rear camera
    Environment,
    /// Front camera
    User,
}

impl Default for CameraSelector {
    fn default() -> Self {
        Self::Facing(Facing::Environment)
    }
}

impl FromStr for CameraSelector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" => Err("camera selector must not be empty".to_string()),
            "environment" | "back" | "rear" => Ok(Self::Facing(Facing::Environment)),
            "user" | "front" => Ok(Self::Facing(Facing::User)),
            _ => Ok(Self::Device(s.trim().to_string())),
        }
    }
}

impl fmt::Display for CameraSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Facing(Facing::Environment) => write!(f, "environment"),
            Self::Facing(Facing::User) => write!(f, "user"),
            Self::Device(id) => write!(f, "{id}"),
        }
    }
}

/// Output of a running capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    Decoded(String),
    /// A frame or line that could not be decoded; scanning continues
    DecodeError(String),
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// No camera, permission denied, or the decoder could not be started
    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),

    #[error("capture I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("scan task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// A source of decoded QR payloads
#[async_trait]
pub trait QrCapture: Send + Sync {
    /// Start capturing. Events are sent until the source ends or
    /// [`QrCapture::stop`] is called; the sender is dropped afterwards.
    async fn start(
        &self,
        camera: &CameraSelector,
        events: mpsc::Sender<ScanEvent>,
    ) -> Result<(), CaptureError>;

    async fn stop(&self);
}

#[derive(Debug, PartialEq, Eq)]
enum PumpEnd {
    Eof,
    Stopped,
    ReceiverGone,
}

async fn pump_lines<R>(reader: R, events: &mpsc::Sender<ScanEvent>, stop: &Notify) -> PumpEnd
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        let next = tokio::select! {
            _ = stop.notified() => return PumpEnd::Stopped,
            line = lines.next_line() => line,
        };
        let event = match next {
            Ok(Some(line)) => {
                let payload = line.trim();
                if payload.is_empty() {
                    continue;
                }
                ScanEvent::Decoded(payload.to_string())
            }
            Ok(None) => return PumpEnd::Eof,
            Err(e) => {
                // Undecodable bytes leave the line reader in an unknown state
                let _ = events.send(ScanEvent::DecodeError(e.to_string())).await;
                return PumpEnd::Eof;
            }
        };
        if events.send(event).await.is_err() {
            return PumpEnd::ReceiverGone;
        }
    }
}

// ============================================
// LINE CAPTURE
// ============================================

/// Reads one decoded payload per line from any async reader.
///
/// Typical sources are stdin piped from a decoder or a file of payloads.
/// The reader is consumed by the first `start`.
pub struct LineCapture<R> {
    reader: Mutex<Option<R>>,
    stop: Arc<Notify>,
}

impl<R> LineCapture<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: Mutex::new(Some(reader)),
            stop: Arc::new(Notify::new()),
        }
    }
}

impl LineCapture<BufReader<tokio::io::Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

#[async_trait]
impl<R> QrCapture for LineCapture<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    async fn start(
        &self,
        camera: &CameraSelector,
        events: mpsc::Sender<ScanEvent>,
    ) -> Result<(), CaptureError> {
        let reader = self.reader.lock().await.take().ok_or_else(|| {
            CaptureError::CameraUnavailable("line source already consumed".to_string())
        })?;
        debug!(%camera, "Reading decoded payloads line by line");
        let stop = self.stop.clone();
        tokio::spawn(async move {
            pump_lines(reader, &events, &stop).await;
        });
        Ok(())
    }

    async fn stop(&self) {
        self.stop.notify_one();
    }
}

// ============================================
// EXTERNAL DECODER
// ============================================

/// Runs an external decoder (e.g. `zbarcam --raw --nodisplay`) and reads
/// its stdout. A device selector is appended as the last argument.
pub struct DecoderCommand {
    program: String,
    args: Vec<String>,
    stop: Arc<Notify>,
}

impl DecoderCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            stop: Arc::new(Notify::new()),
        }
    }

    pub fn zbarcam() -> Self {
        Self::new("zbarcam", vec!["--raw".to_string(), "--nodisplay".to_string()])
    }
}

#[async_trait]
impl QrCapture for DecoderCommand {
    async fn start(
        &self,
        camera: &CameraSelector,
        events: mpsc::Sender<ScanEvent>,
    ) -> Result<(), CaptureError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        match camera {
            CameraSelector::Device(device) => {
                cmd.arg(device);
            }
            CameraSelector::Facing(facing) => {
                debug!(?facing, "Decoder picks its default camera");
            }
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                CaptureError::CameraUnavailable(format!("cannot start {}: {e}", self.program))
            }
            _ => CaptureError::Io(e),
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            CaptureError::CameraUnavailable(format!("{} has no output stream", self.program))
        })?;

        let program = self.program.clone();
        let stop = self.stop.clone();
        tokio::spawn(async move {
            if pump_lines(BufReader::new(stdout), &events, &stop).await != PumpEnd::Eof {
                let _ = child.kill().await;
                return;
            }
            match child.wait().await {
                Ok(status) if !status.success() => {
                    warn!(%program, %status, "QR decoder exited");
                    let _ = events
                        .send(ScanEvent::DecodeError(format!("{program} exited with {status}")))
                        .await;
                }
                Ok(_) => {}
                Err(e) => warn!(%program, "Failed to reap QR decoder: {}", e),
            }
        });
        Ok(())
    }

    async fn stop(&self) {
        self.stop.notify_one();
    }
}

// ============================================
// SCAN SESSION
// ============================================

/// Connects a capture to the mission ledger for one user
pub struct ScanSession {
    ledger: MissionLedger,
    session: Session,
    camera: CameraSelector,
}

impl ScanSession {
    pub fn new(ledger: MissionLedger, session: Session) -> Self {
        Self {
            ledger,
            session,
            camera: CameraSelector::default(),
        }
    }

    pub fn with_camera(mut self, camera: CameraSelector) -> Self {
        self.camera = camera;
        self
    }

    /// Wait for the first decoded payload, stop the capture and submit it.
    ///
    /// Returns `None` if the capture ended without decoding anything; in that
    /// case nothing was written.
    pub async fn scan_once(
        &self,
        capture: &dyn QrCapture,
    ) -> Result<Option<(String, Result<MissionCompleted, LedgerError>)>, CaptureError> {
        let (tx, mut rx) = mpsc::channel(16);
        capture.start(&self.camera, tx).await?;

        let mut decoded = None;
        while let Some(event) = rx.recv().await {
            match event {
                ScanEvent::Decoded(payload) => {
                    decoded = Some(payload);
                    break;
                }
                ScanEvent::DecodeError(reason) => debug!("Decode error: {}", reason),
            }
        }
        capture.stop().await;

        match decoded {
            Some(payload) => {
                let result = self.submit(&payload).await?;
                Ok(Some((payload, result)))
            }
            None => Ok(None),
        }
    }

    /// Submit every decoded payload until the capture ends.
    ///
    /// Returns the number of successful completions.
    pub async fn scan_all<F>(
        &self,
        capture: &dyn QrCapture,
        mut on_result: F,
    ) -> Result<usize, CaptureError>
    where
        F: FnMut(&str, &Result<MissionCompleted, LedgerError>),
    {
        let (tx, mut rx) = mpsc::channel(16);
        capture.start(&self.camera, tx).await?;

        let mut completed = 0;
        while let Some(event) = rx.recv().await {
            match event {
                ScanEvent::Decoded(payload) => {
                    let result = self.submit(&payload).await?;
                    if result.is_ok() {
                        completed += 1;
                    }
                    on_result(&payload, &result);
                }
                ScanEvent::DecodeError(reason) => debug!("Decode error: {}", reason),
            }
        }
        Ok(completed)
    }

    /// Run the ledger write on the blocking pool; SQLite may wait on the file lock
    async fn submit(
        &self,
        payload: &str,
    ) -> Result<Result<MissionCompleted, LedgerError>, CaptureError> {
        let ledger = self.ledger.clone();
        let session = self.session.clone();
        let payload = payload.to_string();
        let result =
            tokio::task::spawn_blocking(move || ledger.complete_mission(&session, &payload))
                .await?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Mission, Profile, Role, new_id, now_ms};
    use crate::ledger::QrPolicy;
    use crate::store::{CampusDb, MissionRepository, ProfileRepository};
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::tempdir;

    /// Replays a fixed list of events
    struct ScriptedCapture {
        events: Vec<ScanEvent>,
        stopped: AtomicBool,
    }

    #[async_trait]
    impl QrCapture for ScriptedCapture {
        async fn start(
            &self,
            _camera: &CameraSelector,
            events: mpsc::Sender<ScanEvent>,
        ) -> Result<(), CaptureError> {
            let script = self.events.clone();
            tokio::spawn(async move {
                for event in script {
                    if events.send(event).await.is_err() {
                        break;
                    }
                }
            });
            Ok(())
        }

        async fn stop(&self) {
            self.stopped.store(true, Ordering::SeqCst);
        }
    }

    struct NoCamera;

    #[async_trait]
    impl QrCapture for NoCamera {
        async fn start(
            &self,
            camera: &CameraSelector,
            _events: mpsc::Sender<ScanEvent>,
        ) -> Result<(), CaptureError> {
            Err(CaptureError::CameraUnavailable(format!("no camera facing {camera}")))
        }

        async fn stop(&self) {}
    }

    fn setup(dir: &std::path::Path) -> ScanSession {
        let db = CampusDb::open(&dir.join("campus.db")).unwrap();
        let profile = Profile::new("rina@campus.ac.id", "Rina", Role::Student);
        ProfileRepository::new(db.clone()).create(&profile).unwrap();
        let now = now_ms();
        MissionRepository::new(db.clone())
            .create(&Mission {
                id: new_id(),
                title: "Bawa Tumbler Sendiri".to_string(),
                description: String::new(),
                points: 15,
                location: "Kantin".to_string(),
                category: "Plastic Reduction".to_string(),
                qr_code: "QR_PLASTIC_1".to_string(),
                qr_secret: "secret".to_string(),
                active: true,
                created_at: now,
                updated_at: now,
            })
            .unwrap();
        ScanSession::new(
            MissionLedger::new(db, QrPolicy::lenient()),
            Session::for_profile(&profile),
        )
    }

    #[test]
    fn test_camera_selector_parsing() {
        assert_eq!(
            "back".parse::<CameraSelector>().unwrap(),
            CameraSelector::Facing(Facing::Environment)
        );
        assert_eq!(
            "Front".parse::<CameraSelector>().unwrap(),
            CameraSelector::Facing(Facing::User)
        );
        assert_eq!(
            "/dev/video2".parse::<CameraSelector>().unwrap(),
            CameraSelector::Device("/dev/video2".to_string())
        );
        assert!("  ".parse::<CameraSelector>().is_err());
    }

    #[tokio::test]
    async fn test_scan_once_skips_decode_errors_and_stops() {
        let dir = tempdir().unwrap();
        let scanner = setup(dir.path());
        let capture = ScriptedCapture {
            events: vec![
                ScanEvent::DecodeError("blurry".to_string()),
                ScanEvent::Decoded("QR_PLASTIC_1".to_string()),
                ScanEvent::Decoded("QR_PLASTIC_1".to_string()),
            ],
            stopped: AtomicBool::new(false),
        };

        let (payload, result) = scanner.scan_once(&capture).await.unwrap().unwrap();
        assert_eq!(payload, "QR_PLASTIC_1");
        assert_eq!(result.unwrap().points_awarded, 15);
        assert!(capture.stopped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_scan_once_without_decode_writes_nothing() {
        let dir = tempdir().unwrap();
        let scanner = setup(dir.path());
        let capture = ScriptedCapture {
            events: vec![ScanEvent::DecodeError("no code in frame".to_string())],
            stopped: AtomicBool::new(false),
        };
        assert!(scanner.scan_once(&capture).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_camera_is_reported() {
        let dir = tempdir().unwrap();
        let scanner = setup(dir.path());
        assert!(matches!(
            scanner.scan_once(&NoCamera).await,
            Err(CaptureError::CameraUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_line_capture_feeds_ledger() {
        let dir = tempdir().unwrap();
        let scanner = setup(dir.path());
        let input: &'static [u8] = b"QR_PLASTIC_1\n\nQR_UNKNOWN\nQR_PLASTIC_1\n";
        let capture = LineCapture::new(input);

        let mut seen = Vec::new();
        let completed = scanner
            .scan_all(&capture, |payload, result| {
                seen.push((payload.to_string(), result.as_ref().map(|_| ()).map_err(|e| e.kind())));
            })
            .await
            .unwrap();

        assert_eq!(completed, 1);
        assert_eq!(
            seen,
            vec![
                ("QR_PLASTIC_1".to_string(), Ok(())),
                ("QR_UNKNOWN".to_string(), Err("invalid_or_inactive_mission")),
                ("QR_PLASTIC_1".to_string(), Err("already_completed")),
            ]
        );

        // The reader is consumed by the first start
        let (tx, _rx) = mpsc::channel(1);
        assert!(matches!(
            capture.start(&CameraSelector::default(), tx).await,
            Err(CaptureError::CameraUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_decoder_binary_is_camera_unavailable() {
        let capture = DecoderCommand::new("greencampus-no-such-decoder", Vec::new());
        let (tx, _rx) = mpsc::channel(1);
        assert!(matches!(
            capture.start(&CameraSelector::default(), tx).await,
            Err(CaptureError::CameraUnavailable(_))
        ));
    }
}
