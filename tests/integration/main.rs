//! FastPhotos integration test harness.
//!
//! Tests here run the real receiver runtime end to end. Image fetches go
//! through a scripted fetcher so every test controls latency and failures,
//! and the headless screen is shared so tests can see what is on display.
//!
//! Scheduler tests run on paused time. Transport tests use real sockets and
//! real time with short delays.

mod scheduling;
mod sessions;
mod streaming;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use fastphotos_core::protocol::{NewAssetPayload, PrecachePayload};
use fastphotos_core::{AssetDescriptor, Command, Inbound, ResponseEnvelope, SenderId};
use fastphotos_services::{
    new_connection_table, ConnectionTable, DisplaySurface, FetchError, FetchOutcome, Fetcher,
    LayoutRect, LoadedImage, PlaybackSurface, ReceiverHandle, ReceiverRuntime, ReceiverSettings,
    Viewport,
};
use fastphotosd::HeadlessScreen;

// ── Scripted fetcher ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Script {
    pub delay: Duration,
    pub outcome: FetchOutcome,
}

/// Answers every URL from a script. Unscripted URLs load an 800x600 image
/// after 10ms. Every requested URL is recorded in order.
#[derive(Clone, Default)]
pub struct ScriptedFetcher {
    scripts: Arc<Mutex<HashMap<String, Script>>>,
    requested: Arc<Mutex<Vec<String>>>,
}

impl ScriptedFetcher {
    pub fn delay(&self, url: &str, delay: Duration) -> &Self {
        let outcome = Ok(image(url, 800, 600));
        self.scripts
            .lock()
            .unwrap()
            .insert(url.to_string(), Script { delay, outcome });
        self
    }

    pub fn fail(&self, url: &str, err: FetchError) -> &Self {
        self.scripts.lock().unwrap().insert(
            url.to_string(),
            Script {
                delay: Duration::from_millis(10),
                outcome: Err(err),
            },
        );
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }

    pub fn times_requested(&self, url: &str) -> usize {
        self.requested().iter().filter(|u| *u == url).count()
    }
}

impl Fetcher for ScriptedFetcher {
    fn fetch(&self, url: &str) -> BoxFuture<'static, FetchOutcome> {
        self.requested.lock().unwrap().push(url.to_string());
        let script = self.scripts.lock().unwrap().get(url).cloned().unwrap_or(Script {
            delay: Duration::from_millis(10),
            outcome: Ok(image(url, 800, 600)),
        });
        async move {
            tokio::time::sleep(script.delay).await;
            script.outcome
        }
        .boxed()
    }
}

pub fn image(url: &str, width: u32, height: u32) -> LoadedImage {
    LoadedImage {
        url: url.to_string(),
        width,
        height,
        bytes: Bytes::from_static(b"img"),
    }
}

// ── Shared screen ─────────────────────────────────────────────────────────────

/// Headless screen the test keeps a handle to after the runtime takes it.
#[derive(Clone)]
pub struct SharedScreen(pub Arc<Mutex<HeadlessScreen>>);

impl SharedScreen {
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(HeadlessScreen::new(Viewport {
            width: 1920,
            height: 1080,
        }))))
    }

    pub fn with<R>(&self, f: impl FnOnce(&HeadlessScreen) -> R) -> R {
        f(&self.0.lock().unwrap())
    }
}

impl DisplaySurface for SharedScreen {
    fn show_idle(&mut self) {
        self.0.lock().unwrap().show_idle()
    }
    fn show_photo_view(&mut self) {
        self.0.lock().unwrap().show_photo_view()
    }
    fn show_image(&mut self, image: &LoadedImage, rect: LayoutRect) {
        self.0.lock().unwrap().show_image(image, rect)
    }
    fn show_video(&mut self) {
        self.0.lock().unwrap().show_video()
    }
    fn show_spinner(&mut self, visible: bool) {
        self.0.lock().unwrap().show_spinner(visible)
    }
    fn viewport_size(&self) -> Viewport {
        self.0.lock().unwrap().viewport_size()
    }
    fn is_video_active(&self) -> bool {
        self.0.lock().unwrap().is_video_active()
    }
}

impl PlaybackSurface for SharedScreen {
    fn load(&mut self, url: &str) {
        self.0.lock().unwrap().load(url)
    }
    fn pause(&mut self) {
        self.0.lock().unwrap().pause()
    }
    fn stop(&mut self) {
        self.0.lock().unwrap().stop()
    }
}

// ── Receiver under test ───────────────────────────────────────────────────────

pub struct Receiver {
    pub handle: ReceiverHandle,
    pub fetcher: ScriptedFetcher,
    pub screen: SharedScreen,
    pub connections: ConnectionTable,
    pub shutdown_tx: broadcast::Sender<()>,
    pub task: JoinHandle<anyhow::Result<()>>,
}

impl Receiver {
    pub fn spawn(fetcher: ScriptedFetcher) -> Self {
        let screen = SharedScreen::new();
        let connections = new_connection_table();
        let (shutdown_tx, _) = broadcast::channel(1);
        let (runtime, handle) = ReceiverRuntime::new(
            screen.clone(),
            Arc::new(fetcher.clone()),
            connections.clone(),
            ReceiverSettings::default(),
            shutdown_tx.clone(),
        );
        let task = tokio::spawn(runtime.run());
        Self {
            handle,
            fetcher,
            screen,
            connections,
            shutdown_tx,
            task,
        }
    }

    pub async fn sender(&self) -> TestSender {
        let (tx, rx) = mpsc::unbounded_channel();
        let peer = SocketAddr::from(([127, 0, 0, 1], 40000 + self.connections.len() as u16));
        let id = self.handle.connect(peer, tx).await.unwrap();
        TestSender {
            id,
            handle: self.handle.clone(),
            rx,
        }
    }

    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(());
        self.task.await.unwrap().unwrap();
    }
}

/// An in-process sender attached straight to the runtime.
pub struct TestSender {
    pub id: SenderId,
    handle: ReceiverHandle,
    rx: mpsc::UnboundedReceiver<ResponseEnvelope>,
}

impl TestSender {
    pub fn send(&self, message: Inbound) {
        self.handle.deliver(self.id, message).unwrap();
    }

    pub fn show(&self, url: &str) {
        self.send(new_asset(url, None));
    }

    pub async fn recv(&mut self) -> ResponseEnvelope {
        tokio::time::timeout(Duration::from_secs(120), self.rx.recv())
            .await
            .expect("no response within two minutes")
            .expect("receiver dropped the sender")
    }

    /// Whether anything arrives within `wait`.
    pub async fn silent_for(&mut self, wait: Duration) -> bool {
        tokio::time::timeout(wait, self.rx.recv()).await.is_err()
    }

    pub fn disconnect(self) {
        self.handle.disconnect(self.id).unwrap();
    }
}

// ── Frames ────────────────────────────────────────────────────────────────────

pub fn new_asset(url: &str, precache: Option<Vec<&str>>) -> Inbound {
    Inbound::Photos(Command::NewAsset {
        payload: NewAssetPayload {
            asset: AssetDescriptor::remote_image(url),
            precache: precache
                .map(|urls| urls.into_iter().map(AssetDescriptor::remote_image).collect()),
        },
    })
}

pub fn precache(urls: &[&str]) -> Inbound {
    Inbound::Photos(Command::PrecacheAssets {
        payload: PrecachePayload {
            precache: Some(urls.iter().map(|u| AssetDescriptor::remote_image(*u)).collect()),
        },
    })
}

pub fn new_session(token: Option<&str>) -> Inbound {
    Inbound::Photos(Command::NewSession {
        session_token: token.map(str::to_string),
    })
}
