//! Connection lifecycle for one camera device.
//!
//! A [`DeviceSession`] owns at most one stream task at a time. The task
//! opens `GET http://{address}/`, runs the body through a [`FrameDemuxer`],
//! decodes each frame and publishes it. UI state goes out through a
//! `tokio::sync::watch` channel as whole [`SessionSnapshot`]s; observers
//! only ever read.
//!
//! Control commands (light, restart) are independent one-shot requests and
//! never touch the stream.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cam_viewer_common::config::{Config, StreamConfig};
use cam_viewer_common::frame::TimestampedFrame;
use cam_viewer_common::settings::{DeviceConfig, DeviceKind, SettingsStore, TomlSettingsStore};
use futures_util::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::command::Command;
use crate::decode::{DecodedFrame, FrameDecoder, JpegDecoder};
use crate::demux::{demux, FrameDemuxer};
use crate::error::SessionError;
use crate::status::{ConnectionStatus, SessionSnapshot};
use crate::transport::{DeviceTransport, HttpTransport, TransportError};

pub struct DeviceSession {
    transport: Arc<dyn DeviceTransport>,
    decoder: Arc<dyn FrameDecoder>,
    settings: Arc<dyn SettingsStore>,
    frame_limit: Option<usize>,
    inner: Mutex<Inner>,
    state: Arc<watch::Sender<SessionSnapshot>>,
    active: tokio::sync::Mutex<Option<ActiveStream>>,
}

struct Inner {
    device: DeviceConfig,
    /// Address of the most recent connect; commands are sent here.
    server_address: Option<String>,
}

/// Handle on a running stream task.
struct ActiveStream {
    address: String,
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl ActiveStream {
    /// Signal the task and wait for its cleanup to finish.
    async fn stop(self) {
        // The receiver is gone if the task already ended on its own.
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.handle.await {
            warn!(address = self.address, error = %e, "stream task did not finish cleanly");
        }
    }
}

impl DeviceSession {
    pub fn new(transport: Arc<dyn DeviceTransport>, settings: Arc<dyn SettingsStore>) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::default());
        Self {
            transport,
            decoder: Arc::new(JpegDecoder),
            settings,
            frame_limit: StreamConfig::default().frame_limit(),
            inner: Mutex::new(Inner {
                device: DeviceConfig::default(),
                server_address: None,
            }),
            state: Arc::new(state),
            active: tokio::sync::Mutex::new(None),
        }
    }

    /// Session talking HTTP to the device, with settings in the configured file.
    pub fn from_config(config: &Config) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(&config.stream, &config.control)?;
        let settings = TomlSettingsStore::new(&config.settings.path);
        Ok(Self::new(Arc::new(transport), Arc::new(settings))
            .with_frame_limit(config.stream.frame_limit()))
    }

    pub fn with_decoder(mut self, decoder: Arc<dyn FrameDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn with_frame_limit(mut self, frame_limit: Option<usize>) -> Self {
        self.frame_limit = frame_limit;
        self
    }

    /// Load the persisted settings and, if auto-connect is on and an address
    /// is saved, connect once. Returns whether a connection was started.
    pub async fn start(&self) -> Result<bool, SessionError> {
        let device = self.settings.load()?;
        info!(
            address = device.address,
            kind = %device.device_kind,
            auto_connect = device.auto_connect,
            "loaded device settings"
        );

        let address = device.address.trim().to_string();
        let auto_connect = device.auto_connect && !address.is_empty();
        self.inner().device = device;

        if !auto_connect {
            return Ok(false);
        }
        self.connect(&address).await?;
        Ok(true)
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.state.borrow().status.clone()
    }

    pub fn device_config(&self) -> DeviceConfig {
        self.inner().device.clone()
    }

    pub fn set_device_kind(&self, kind: DeviceKind) -> Result<(), SessionError> {
        let device = {
            let mut inner = self.inner();
            inner.device.device_kind = kind;
            inner.device.clone()
        };
        self.settings.save(&device)?;
        info!(%kind, "device kind updated");
        Ok(())
    }

    /// Persist the auto-connect flag. Turning it on while disconnected with
    /// a saved address connects right away.
    pub async fn set_auto_connect(&self, enabled: bool) -> Result<(), SessionError> {
        let device = {
            let mut inner = self.inner();
            inner.device.auto_connect = enabled;
            inner.device.clone()
        };
        self.settings.save(&device)?;
        info!(enabled, "auto-connect updated");

        let address = device.address.trim();
        if enabled && !address.is_empty() && self.status().is_disconnected() {
            self.connect(address).await?;
        }
        Ok(())
    }

    /// Start streaming from `address` (`host[:port]`).
    ///
    /// Returns once the stream task is running; progress shows up in the
    /// published status. Any previous stream is stopped first.
    pub async fn connect(&self, address: &str) -> Result<(), SessionError> {
        let address = address.trim();
        if address.is_empty() {
            warn!("connect requested without a device address");
            self.state.send_if_modified(|s| {
                if s.status.is_active() {
                    return false;
                }
                s.status = ConnectionStatus::Failed(SessionError::EmptyAddress.to_string());
                true
            });
            return Err(SessionError::EmptyAddress);
        }

        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            info!(address = previous.address, "closing previous stream");
            previous.stop().await;
        }

        self.remember_address(address);
        self.state.send_modify(|s| {
            s.status = ConnectionStatus::Connecting;
            s.frame = None;
        });
        info!(address, "connecting to device stream");

        let (stop_tx, stop_rx) = watch::channel(false);
        let task = StreamTask {
            address: address.to_string(),
            transport: Arc::clone(&self.transport),
            decoder: Arc::clone(&self.decoder),
            state: Arc::clone(&self.state),
            frame_limit: self.frame_limit,
        };
        let handle = tokio::spawn(task.run(stop_rx));
        *active = Some(ActiveStream {
            address: address.to_string(),
            stop_tx,
            handle,
        });
        Ok(())
    }

    /// Stop the stream, release the connection and clear the frame.
    pub async fn disconnect(&self) {
        let mut active = self.active.lock().await;
        if let Some(stream) = active.take() {
            info!(address = stream.address, "disconnecting");
            stream.stop().await;
        }
        self.state.send_if_modified(|s| {
            let changed = s.status != ConnectionStatus::Disconnected || s.frame.is_some();
            s.status = ConnectionStatus::Disconnected;
            s.frame = None;
            changed
        });
    }

    /// Switch the flash (CAM) or LED (XIAO) on or off.
    pub async fn control_led(&self, turn_on: bool) -> Result<String, SessionError> {
        self.send_command(Command::Light { on: turn_on }).await
    }

    /// Ask the device to reboot. On success the stream is closed, since the
    /// device drops it anyway.
    pub async fn restart_device(&self) -> Result<String, SessionError> {
        let message = self.send_command(Command::Restart).await?;
        self.disconnect().await;
        Ok(message)
    }

    async fn send_command(&self, command: Command) -> Result<String, SessionError> {
        let (address, kind) = {
            let inner = self.inner();
            (inner.server_address.clone(), inner.device.device_kind)
        };
        let address = address.ok_or(SessionError::NotConnected)?;
        let url = format!("http://{address}{}", command.path(kind));
        debug!(%command, url, "sending device command");

        let status = match self.transport.send_command(&url).await {
            Ok(status) => status,
            Err(source) => {
                warn!(%command, error = %source, "device command failed");
                return Err(SessionError::Transport { command, source });
            }
        };
        if status != 200 {
            warn!(%command, status, "device rejected command");
            return Err(SessionError::Device { command, status });
        }

        let message = command.success_message(kind);
        info!(%command, message, "device command succeeded");
        Ok(message)
    }

    fn remember_address(&self, address: &str) {
        let device = {
            let mut inner = self.inner();
            inner.server_address = Some(address.to_string());
            inner.device.address = address.to_string();
            inner.device.clone()
        };
        if let Err(e) = self.settings.save(&device) {
            warn!(error = %e, "failed to persist device address");
        }
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug)]
enum StreamEnd {
    Stopped,
    Closed,
}

/// The read loop of one connection.
struct StreamTask {
    address: String,
    transport: Arc<dyn DeviceTransport>,
    decoder: Arc<dyn FrameDecoder>,
    state: Arc<watch::Sender<SessionSnapshot>>,
    frame_limit: Option<usize>,
}

impl StreamTask {
    async fn run(self, mut stop: watch::Receiver<bool>) {
        let outcome = self.stream_frames(&mut stop).await;

        // Cleanup runs however the loop ended; the connection is already dropped.
        let status = match outcome {
            Ok(end) => {
                info!(address = self.address, ?end, "stream closed");
                ConnectionStatus::Disconnected
            }
            Err(e) => {
                warn!(address = self.address, error = %e, "stream failed");
                ConnectionStatus::Failed(e.to_string())
            }
        };
        self.state.send_modify(|s| {
            s.status = status;
            s.frame = None;
        });
    }

    async fn stream_frames(
        &self,
        stop: &mut watch::Receiver<bool>,
    ) -> Result<StreamEnd, TransportError> {
        let url = format!("http://{}/", self.address);
        let body = tokio::select! {
            biased;
            _ = stop.changed() => return Ok(StreamEnd::Stopped),
            opened = self.transport.open_stream(&url) => opened?,
        };

        info!(address = self.address, "connected to device stream");
        self.state
            .send_modify(|s| s.status = ConnectionStatus::Connected(self.address.clone()));

        let mut frames =
            std::pin::pin!(demux(body, FrameDemuxer::with_limit(self.frame_limit)));
        let mut seq: u64 = 0;
        let mut dropped: u64 = 0;

        loop {
            if *stop.borrow() {
                return Ok(StreamEnd::Stopped);
            }
            let next = tokio::select! {
                biased;
                _ = stop.changed() => return Ok(StreamEnd::Stopped),
                next = frames.next() => next,
            };
            let frame = match next {
                Some(frame) => frame?,
                None => return Ok(StreamEnd::Closed),
            };

            match self.decoder.decode(&frame) {
                Ok(image) => {
                    let decoded = DecodedFrame::new(TimestampedFrame::now(frame, seq), image);
                    seq += 1;
                    if seq % 100 == 0 {
                        debug!(frames = seq, dropped, "frames decoded");
                    }
                    self.state.send_modify(|s| s.frame = Some(decoded));
                }
                Err(e) => {
                    dropped += 1;
                    debug!(error = %e, bytes = frame.len(), "dropping undecodable frame");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::test_jpeg;
    use crate::transport::ByteStream;
    use async_trait::async_trait;
    use bytes::Bytes;
    use cam_viewer_common::settings::MemorySettingsStore;
    use futures_util::stream;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    /// Sets its flag when the stream holding it is dropped.
    struct ReleaseGuard(Arc<AtomicBool>);

    impl Drop for ReleaseGuard {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct MockTransport {
        chunks: Mutex<Vec<Result<Bytes, TransportError>>>,
        keep_open: bool,
        open_error: Option<TransportError>,
        /// `None` answers every command with 200.
        command_reply: Option<Result<u16, TransportError>>,
        stream_urls: Mutex<Vec<String>>,
        command_urls: Mutex<Vec<String>>,
        released: Arc<AtomicBool>,
        stream_calls: AtomicUsize,
    }

    impl MockTransport {
        fn streaming(chunks: Vec<Result<Bytes, TransportError>>, keep_open: bool) -> Self {
            Self {
                chunks: Mutex::new(chunks),
                keep_open,
                ..Self::default()
            }
        }

        fn idle() -> Self {
            Self::streaming(Vec::new(), true)
        }

        fn replying(reply: Result<u16, TransportError>) -> Self {
            Self {
                command_reply: Some(reply),
                ..Self::idle()
            }
        }

        fn stream_calls(&self) -> usize {
            self.stream_calls.load(Ordering::SeqCst)
        }

        fn command_urls(&self) -> Vec<String> {
            self.command_urls.lock().unwrap().clone()
        }

        fn released(&self) -> bool {
            self.released.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DeviceTransport for MockTransport {
        async fn open_stream(&self, url: &str) -> Result<ByteStream, TransportError> {
            self.stream_calls.fetch_add(1, Ordering::SeqCst);
            self.stream_urls.lock().unwrap().push(url.to_string());
            if let Some(e) = &self.open_error {
                return Err(e.clone());
            }

            let chunks = std::mem::take(&mut *self.chunks.lock().unwrap());
            let body = if self.keep_open {
                stream::iter(chunks).chain(stream::pending()).boxed()
            } else {
                stream::iter(chunks).boxed()
            };
            // The guard lives as long as the whole body, pending tail included.
            let guard = ReleaseGuard(Arc::clone(&self.released));
            Ok(body
                .map(move |chunk| {
                    let _alive = &guard;
                    chunk
                })
                .boxed())
        }

        async fn send_command(&self, url: &str) -> Result<u16, TransportError> {
            self.command_urls.lock().unwrap().push(url.to_string());
            self.command_reply.clone().unwrap_or(Ok(200))
        }
    }

    fn session_with(
        transport: Arc<MockTransport>,
        device: DeviceConfig,
    ) -> (DeviceSession, Arc<MemorySettingsStore>) {
        let settings = Arc::new(MemorySettingsStore::new(device));
        let session = DeviceSession::new(transport, settings.clone());
        (session, settings)
    }

    async fn wait_until(
        session: &DeviceSession,
        pred: impl FnMut(&SessionSnapshot) -> bool,
    ) -> SessionSnapshot {
        let mut rx = session.subscribe();
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(pred))
            .await
            .expect("timed out waiting for session state")
            .map(|snapshot| (*snapshot).clone())
            .expect("session state channel closed")
    }

    async fn wait_connected(session: &DeviceSession) -> SessionSnapshot {
        wait_until(session, |s| s.status.is_connected()).await
    }

    #[tokio::test]
    async fn connect_rejects_empty_address_without_network() {
        let transport = Arc::new(MockTransport::idle());
        let (session, settings) = session_with(transport.clone(), DeviceConfig::default());

        let err = session.connect("  ").await.unwrap_err();
        assert!(matches!(err, SessionError::EmptyAddress));
        assert_eq!(transport.stream_calls(), 0);
        assert!(matches!(session.status(), ConnectionStatus::Failed(_)));
        assert!(settings.current().address.is_empty());
    }

    #[tokio::test]
    async fn streams_decoded_frames_in_arrival_order() {
        let jpeg = test_jpeg(8, 8);
        let half = jpeg.len() / 2;
        let mut middle = jpeg[half..].to_vec();
        // A marker-framed frame that does not decode, then the start of the next frame.
        middle.extend_from_slice(&[0xFF, 0xD8, 0x00, 0x01, 0xFF, 0xD9]);
        middle.extend_from_slice(&jpeg[..10]);
        let chunks = vec![
            Ok(Bytes::from_static(&[0x00, 0x11])),
            Ok(Bytes::copy_from_slice(&jpeg[..half])),
            Ok(Bytes::from(middle)),
            Ok(Bytes::copy_from_slice(&jpeg[10..])),
        ];
        let transport = Arc::new(MockTransport::streaming(chunks, true));
        let (session, settings) = session_with(transport.clone(), DeviceConfig::default());

        session.connect("cam.local:81").await.unwrap();
        let snapshot = wait_until(&session, |s| s.frame.as_ref().map(|f| f.seq()) == Some(1)).await;

        let frame = snapshot.frame.unwrap();
        assert_eq!((frame.width(), frame.height()), (8, 8));
        assert_eq!(frame.jpeg(), jpeg.as_slice());
        assert_eq!(
            snapshot.status,
            ConnectionStatus::Connected("cam.local:81".into())
        );
        assert_eq!(
            *transport.stream_urls.lock().unwrap(),
            vec!["http://cam.local:81/".to_string()]
        );
        assert_eq!(settings.current().address, "cam.local:81");
    }

    #[tokio::test]
    async fn stream_error_fails_and_clears_frame() {
        let chunks = vec![
            Ok(Bytes::from(test_jpeg(8, 8))),
            Err(TransportError::Stream("connection reset by peer".into())),
        ];
        let transport = Arc::new(MockTransport::streaming(chunks, false));
        let (session, _) = session_with(transport.clone(), DeviceConfig::default());

        session.connect("cam.local").await.unwrap();
        let snapshot =
            wait_until(&session, |s| matches!(s.status, ConnectionStatus::Failed(_))).await;

        assert!(snapshot.status.is_disconnected());
        assert!(snapshot.frame.is_none());
        match snapshot.status {
            ConnectionStatus::Failed(reason) => assert!(reason.contains("connection reset")),
            other => panic!("unexpected status {other:?}"),
        }
        assert!(transport.released());
    }

    #[tokio::test]
    async fn open_failure_reports_detail() {
        let transport = Arc::new(MockTransport {
            open_error: Some(TransportError::Connect("connection refused".into())),
            ..MockTransport::default()
        });
        let (session, _) = session_with(transport.clone(), DeviceConfig::default());

        session.connect("10.0.0.9").await.unwrap();
        let snapshot =
            wait_until(&session, |s| matches!(s.status, ConnectionStatus::Failed(_))).await;
        assert!(snapshot.status.to_string().contains("connection refused"));
        assert_eq!(transport.stream_calls(), 1);
    }

    #[tokio::test]
    async fn end_of_stream_disconnects() {
        let chunks = vec![Ok(Bytes::from(test_jpeg(8, 8)))];
        let transport = Arc::new(MockTransport::streaming(chunks, false));
        let (session, _) = session_with(transport.clone(), DeviceConfig::default());

        session.connect("cam.local").await.unwrap();
        let snapshot = wait_until(&session, |s| s.status == ConnectionStatus::Disconnected).await;
        assert!(snapshot.frame.is_none());
        assert!(transport.released());
    }

    #[tokio::test]
    async fn disconnect_stops_stream_and_releases_connection() {
        let chunks = vec![Ok(Bytes::from(test_jpeg(8, 8)))];
        let transport = Arc::new(MockTransport::streaming(chunks, true));
        let (session, _) = session_with(transport.clone(), DeviceConfig::default());

        session.connect("cam.local").await.unwrap();
        wait_until(&session, |s| s.frame.is_some()).await;
        assert!(!transport.released());

        session.disconnect().await;
        let snapshot = session.snapshot();
        assert_eq!(snapshot.status, ConnectionStatus::Disconnected);
        assert!(snapshot.frame.is_none());
        assert!(transport.released());
    }

    #[tokio::test]
    async fn reconnect_replaces_previous_stream() {
        let transport = Arc::new(MockTransport::idle());
        let (session, _) = session_with(transport.clone(), DeviceConfig::default());

        session.connect("10.0.0.1").await.unwrap();
        wait_connected(&session).await;
        session.connect("10.0.0.2").await.unwrap();
        let snapshot = wait_connected(&session).await;

        assert_eq!(snapshot.status, ConnectionStatus::Connected("10.0.0.2".into()));
        assert_eq!(transport.stream_calls(), 2);
    }

    #[tokio::test]
    async fn control_led_targets_flash_on_cam() {
        let transport = Arc::new(MockTransport::idle());
        let (session, _) = session_with(transport.clone(), DeviceConfig::default());
        session.connect("cam.local").await.unwrap();

        let message = session.control_led(true).await.unwrap();
        assert_eq!(message, "Flash on");
        assert_eq!(transport.command_urls(), vec!["http://cam.local/flash/on"]);
        assert!(session.status().is_active());
    }

    #[tokio::test]
    async fn control_led_targets_led_on_xiao() {
        let transport = Arc::new(MockTransport::idle());
        let device = DeviceConfig {
            device_kind: DeviceKind::Xiao,
            ..DeviceConfig::default()
        };
        let (session, _) = session_with(transport.clone(), device);
        assert!(!session.start().await.unwrap());
        session.connect("192.168.4.1").await.unwrap();

        let message = session.control_led(false).await.unwrap();
        assert_eq!(message, "LED off");
        assert_eq!(transport.command_urls(), vec!["http://192.168.4.1/led/off"]);
    }

    #[tokio::test]
    async fn control_led_reports_status_code() {
        let transport = Arc::new(MockTransport::replying(Ok(500)));
        let (session, _) = session_with(transport.clone(), DeviceConfig::default());
        session.connect("cam.local").await.unwrap();

        let err = session.control_led(true).await.unwrap_err();
        assert!(matches!(err, SessionError::Device { status: 500, .. }));
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn control_transport_failure_carries_detail() {
        let transport = Arc::new(MockTransport::replying(Err(TransportError::Timeout(
            Duration::from_secs(4),
        ))));
        let (session, _) = session_with(transport.clone(), DeviceConfig::default());
        session.connect("cam.local").await.unwrap();

        let err = session.control_led(true).await.unwrap_err();
        assert!(matches!(err, SessionError::Transport { .. }));
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn commands_need_an_address() {
        let transport = Arc::new(MockTransport::idle());
        let (session, _) = session_with(transport.clone(), DeviceConfig::default());

        assert!(matches!(
            session.control_led(true).await,
            Err(SessionError::NotConnected)
        ));
        assert!(matches!(
            session.restart_device().await,
            Err(SessionError::NotConnected)
        ));
        assert!(transport.command_urls().is_empty());
    }

    #[tokio::test]
    async fn restart_success_disconnects() {
        let transport = Arc::new(MockTransport::idle());
        let (session, _) = session_with(transport.clone(), DeviceConfig::default());
        session.connect("cam.local").await.unwrap();
        wait_connected(&session).await;

        let message = session.restart_device().await.unwrap();
        assert_eq!(message, "Device is restarting...");
        assert_eq!(transport.command_urls(), vec!["http://cam.local/restart"]);
        assert_eq!(session.status(), ConnectionStatus::Disconnected);
        assert!(session.snapshot().frame.is_none());
        assert!(transport.released());
    }

    #[tokio::test]
    async fn restart_failure_keeps_streaming() {
        let transport = Arc::new(MockTransport::replying(Ok(503)));
        let (session, _) = session_with(transport.clone(), DeviceConfig::default());
        session.connect("cam.local").await.unwrap();
        wait_connected(&session).await;

        let err = session.restart_device().await.unwrap_err();
        assert!(err.to_string().contains("503"));
        assert!(session.status().is_connected());
        assert!(!transport.released());
    }

    #[tokio::test]
    async fn start_auto_connects_to_saved_address() {
        let transport = Arc::new(MockTransport::idle());
        let device = DeviceConfig {
            address: "10.0.0.7".into(),
            device_kind: DeviceKind::Cam,
            auto_connect: true,
        };
        let (session, _) = session_with(transport.clone(), device);

        assert!(session.start().await.unwrap());
        let snapshot = wait_connected(&session).await;
        assert_eq!(snapshot.status, ConnectionStatus::Connected("10.0.0.7".into()));
        assert_eq!(transport.stream_calls(), 1);
    }

    #[tokio::test]
    async fn start_without_auto_connect_stays_idle() {
        let transport = Arc::new(MockTransport::idle());
        let device = DeviceConfig {
            address: "10.0.0.7".into(),
            device_kind: DeviceKind::Xiao,
            auto_connect: false,
        };
        let (session, _) = session_with(transport.clone(), device.clone());

        assert!(!session.start().await.unwrap());
        assert_eq!(session.device_config(), device);
        assert_eq!(session.status(), ConnectionStatus::Disconnected);
        assert_eq!(transport.stream_calls(), 0);
    }

    #[tokio::test]
    async fn enabling_auto_connect_connects_and_persists() {
        let transport = Arc::new(MockTransport::idle());
        let device = DeviceConfig {
            address: "cam.local".into(),
            ..DeviceConfig::default()
        };
        let (session, settings) = session_with(transport.clone(), device);
        session.start().await.unwrap();

        session.set_auto_connect(true).await.unwrap();
        wait_connected(&session).await;
        assert!(settings.current().auto_connect);
        assert_eq!(transport.stream_calls(), 1);

        session.set_device_kind(DeviceKind::Xiao).unwrap();
        assert_eq!(settings.current().device_kind, DeviceKind::Xiao);
    }
}
