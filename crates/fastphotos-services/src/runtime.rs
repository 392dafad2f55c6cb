//! Actor runtime — one task owns the handler and processes events in order.
//!
//! Transports, the playback surface, fetch tasks, and timers all talk to the
//! runtime through a single unbounded event channel. Fetches and timers are
//! spawned tasks whose only effect is posting an event back; cancelling one
//! aborts its task, and the handler ignores anything that slips through.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use fastphotos_core::{Inbound, ResponseEnvelope, SenderId};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::fetch::{FetchOutcome, Fetcher};
use crate::handler::{ProtocolHandler, ReceiverSettings};
use crate::status::ReceiverStatus;
use crate::surface::{
    DisplaySurface, FetchTicket, Lane, LayoutRect, LoadedImage, PlaybackEvent, PlaybackSurface,
    Screen, TaskRunner, TimerKind, TimerTicket, Transport, Viewport,
};

/// Everything the runtime reacts to.
#[derive(Debug)]
pub enum ReceiverEvent {
    Connected {
        peer: SocketAddr,
        outbound: mpsc::UnboundedSender<ResponseEnvelope>,
        reply: oneshot::Sender<SenderId>,
    },
    Disconnected {
        sender: SenderId,
    },
    Inbound {
        sender: SenderId,
        message: Inbound,
    },
    Playback(PlaybackEvent),
    FetchDone {
        ticket: FetchTicket,
        outcome: FetchOutcome,
    },
    TimerFired(TimerTicket),
}

/// A connected sender's outbound side.
#[derive(Debug)]
pub struct Connection {
    pub peer: SocketAddr,
    pub connected_at: Instant,
    pub outbound: mpsc::UnboundedSender<ResponseEnvelope>,
}

/// Connected senders, shared with the status API.
pub type ConnectionTable = Arc<DashMap<SenderId, Connection>>;

pub fn new_connection_table() -> ConnectionTable {
    Arc::new(DashMap::new())
}

#[derive(Debug, thiserror::Error)]
#[error("receiver runtime has stopped")]
pub struct RuntimeStopped;

// ── Host backed by tokio tasks ───────────────────────────────────────────────

pub struct ChannelHost<S> {
    screen: S,
    connections: ConnectionTable,
    fetcher: Arc<dyn Fetcher>,
    events: mpsc::UnboundedSender<ReceiverEvent>,
    fetches: HashMap<Lane, (u64, JoinHandle<()>)>,
    timers: HashMap<TimerKind, (u64, JoinHandle<()>)>,
}

impl<S: Screen> ChannelHost<S> {
    fn new(
        screen: S,
        connections: ConnectionTable,
        fetcher: Arc<dyn Fetcher>,
        events: mpsc::UnboundedSender<ReceiverEvent>,
    ) -> Self {
        Self {
            screen,
            connections,
            fetcher,
            events,
            fetches: HashMap::new(),
            timers: HashMap::new(),
        }
    }

    fn abort_all(&mut self) {
        for (_, (_, task)) in self.fetches.drain() {
            task.abort();
        }
        for (_, (_, task)) in self.timers.drain() {
            task.abort();
        }
    }
}

impl<S: Screen> DisplaySurface for ChannelHost<S> {
    fn show_idle(&mut self) {
        self.screen.show_idle();
    }

    fn show_photo_view(&mut self) {
        self.screen.show_photo_view();
    }

    fn show_image(&mut self, image: &LoadedImage, rect: LayoutRect) {
        self.screen.show_image(image, rect);
    }

    fn show_video(&mut self) {
        self.screen.show_video();
    }

    fn show_spinner(&mut self, visible: bool) {
        self.screen.show_spinner(visible);
    }

    fn viewport_size(&self) -> Viewport {
        self.screen.viewport_size()
    }

    fn is_video_active(&self) -> bool {
        self.screen.is_video_active()
    }
}

impl<S: Screen> PlaybackSurface for ChannelHost<S> {
    fn load(&mut self, url: &str) {
        self.screen.load(url);
    }

    fn pause(&mut self) {
        self.screen.pause();
    }

    fn stop(&mut self) {
        self.screen.stop();
    }
}

impl<S: Screen> Transport for ChannelHost<S> {
    fn send(&mut self, to: SenderId, envelope: &ResponseEnvelope) {
        match self.connections.get(&to) {
            Some(conn) => {
                if conn.outbound.send(envelope.clone()).is_err() {
                    tracing::debug!(sender = %to, name = %envelope.name, "sender writer gone, response dropped");
                }
            }
            None => tracing::debug!(sender = %to, name = %envelope.name, "sender not connected, response dropped"),
        }
    }
}

impl<S: Screen> TaskRunner for ChannelHost<S> {
    fn start_fetch(&mut self, ticket: FetchTicket) {
        let lane = ticket.lane;
        let generation = ticket.generation;
        let fut = self.fetcher.fetch(&ticket.url);
        let events = self.events.clone();
        let task = tokio::spawn(async move {
            let outcome = fut.await;
            let _ = events.send(ReceiverEvent::FetchDone { ticket, outcome });
        });
        if let Some((_, previous)) = self.fetches.insert(lane, (generation, task)) {
            // Finished, or already superseded by the scheduler.
            previous.abort();
        }
    }

    fn abort_fetch(&mut self, ticket: &FetchTicket) {
        if let Some((generation, _)) = self.fetches.get(&ticket.lane) {
            if *generation == ticket.generation {
                if let Some((_, task)) = self.fetches.remove(&ticket.lane) {
                    task.abort();
                }
            }
        }
    }

    fn arm_timer(&mut self, ticket: TimerTicket, after: Duration) {
        let events = self.events.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = events.send(ReceiverEvent::TimerFired(ticket));
        });
        if let Some((_, previous)) = self.timers.insert(ticket.kind, (ticket.generation, task)) {
            previous.abort();
        }
    }

    fn cancel_timer(&mut self, ticket: TimerTicket) {
        if let Some((generation, _)) = self.timers.get(&ticket.kind) {
            if *generation == ticket.generation {
                if let Some((_, task)) = self.timers.remove(&ticket.kind) {
                    task.abort();
                }
            }
        }
    }
}

// ── Runtime ──────────────────────────────────────────────────────────────────

pub struct ReceiverRuntime<S> {
    handler: ProtocolHandler<ChannelHost<S>>,
    events: mpsc::UnboundedReceiver<ReceiverEvent>,
    connections: ConnectionTable,
    status_tx: watch::Sender<ReceiverStatus>,
    shutdown_tx: broadcast::Sender<()>,
}

impl<S: Screen> ReceiverRuntime<S> {
    pub fn new(
        screen: S,
        fetcher: Arc<dyn Fetcher>,
        connections: ConnectionTable,
        settings: ReceiverSettings,
        shutdown_tx: broadcast::Sender<()>,
    ) -> (Self, ReceiverHandle) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let host = ChannelHost::new(screen, connections.clone(), fetcher, events_tx.clone());
        let handler = ProtocolHandler::new(host, settings);
        let (status_tx, status_rx) = watch::channel(handler.status());

        let runtime = Self {
            handler,
            events: events_rx,
            connections,
            status_tx,
            shutdown_tx,
        };
        let handle = ReceiverHandle {
            events: events_tx,
            status: status_rx,
        };
        (runtime, handle)
    }

    /// Process events until shutdown is broadcast or the last sender's grace
    /// period runs out.
    pub async fn run(mut self) -> anyhow::Result<()> {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        self.handler.start();
        self.publish();
        tracing::info!("receiver started");

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("receiver shutting down");
                    break;
                }
                event = self.events.recv() => {
                    let Some(event) = event else { break };
                    self.dispatch(event);
                    self.publish();
                    if self.handler.exit_requested() {
                        let _ = self.shutdown_tx.send(());
                        break;
                    }
                }
            }
        }

        self.handler.finish();
        self.handler.host_mut().abort_all();
        self.publish();
        Ok(())
    }

    fn dispatch(&mut self, event: ReceiverEvent) {
        match event {
            ReceiverEvent::Connected {
                peer,
                outbound,
                reply,
            } => {
                let id = self.handler.on_sender_connected();
                self.connections.insert(
                    id,
                    Connection {
                        peer,
                        connected_at: Instant::now(),
                        outbound,
                    },
                );
                if reply.send(id).is_err() {
                    // Transport gave up before we answered.
                    self.connections.remove(&id);
                    self.handler.on_sender_disconnected(id);
                }
            }
            ReceiverEvent::Disconnected { sender } => {
                self.connections.remove(&sender);
                self.handler.on_sender_disconnected(sender);
            }
            ReceiverEvent::Inbound { sender, message } => self.handler.on_inbound(sender, message),
            ReceiverEvent::Playback(event) => self.handler.on_playback(event),
            ReceiverEvent::FetchDone { ticket, outcome } => {
                self.handler.on_fetch_complete(ticket, outcome)
            }
            ReceiverEvent::TimerFired(ticket) => self.handler.on_timer(ticket),
        }
    }

    fn publish(&self) {
        self.status_tx.send_replace(self.handler.status());
    }
}

/// Cheap handle for feeding the runtime.
#[derive(Clone)]
pub struct ReceiverHandle {
    events: mpsc::UnboundedSender<ReceiverEvent>,
    status: watch::Receiver<ReceiverStatus>,
}

impl ReceiverHandle {
    /// Register a new sender. Responses for it arrive on `outbound`.
    pub async fn connect(
        &self,
        peer: SocketAddr,
        outbound: mpsc::UnboundedSender<ResponseEnvelope>,
    ) -> Result<SenderId, RuntimeStopped> {
        let (reply, rx) = oneshot::channel();
        self.send(ReceiverEvent::Connected {
            peer,
            outbound,
            reply,
        })?;
        rx.await.map_err(|_| RuntimeStopped)
    }

    pub fn disconnect(&self, sender: SenderId) -> Result<(), RuntimeStopped> {
        self.send(ReceiverEvent::Disconnected { sender })
    }

    pub fn deliver(&self, sender: SenderId, message: Inbound) -> Result<(), RuntimeStopped> {
        self.send(ReceiverEvent::Inbound { sender, message })
    }

    pub fn playback(&self, event: PlaybackEvent) -> Result<(), RuntimeStopped> {
        self.send(ReceiverEvent::Playback(event))
    }

    fn send(&self, event: ReceiverEvent) -> Result<(), RuntimeStopped> {
        self.events.send(event).map_err(|_| RuntimeStopped)
    }

    /// Latest published snapshot.
    pub fn status(&self) -> ReceiverStatus {
        self.status.borrow().clone()
    }

    pub fn status_watch(&self) -> watch::Receiver<ReceiverStatus> {
        self.status.clone()
    }
}
