//! Mixer service loop
//!
//! One tokio task owns the `MixerController`. Intents and timer ticks are
//! delivered over channels and processed strictly one at a time, so the
//! mix state needs no locking. HTTP handlers talk to the loop through a
//! clonable `MixerHandle`.

use crate::controller::{Intent, IntentOutcome, MixSnapshot, MixerController, PresetEntry};
use crate::error::{Error, Result};
use crate::playback::{AudioBackend, PlaybackEngine};
use crate::presenter::EventPresenter;
use crate::presets::{PresetStorage, PresetStore};
use crate::timer::{Timer, TokioTicker};
use ambimix_common::events::{EventBus, TrackInfo};
use ambimix_common::Catalog;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Pending commands buffered before senders wait
const COMMAND_CAPACITY: usize = 64;

/// Requests accepted by the service loop
#[derive(Debug)]
pub enum Command {
    Intent {
        intent: Intent,
        reply: oneshot::Sender<Result<IntentOutcome>>,
    },
    Snapshot {
        reply: oneshot::Sender<MixSnapshot>,
    },
    Presets {
        reply: oneshot::Sender<Vec<PresetEntry>>,
    },
    Tracks {
        reply: oneshot::Sender<Vec<TrackInfo>>,
    },
}

/// Clonable access to a running mixer
#[derive(Debug, Clone)]
pub struct MixerHandle {
    tx: mpsc::Sender<Command>,
}

impl MixerHandle {
    /// Submit an intent and wait for it to be applied
    pub async fn dispatch(&self, intent: Intent) -> Result<IntentOutcome> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Intent { intent, reply }).await?;
        rx.await.map_err(|_| Error::ServiceStopped)?
    }

    pub async fn snapshot(&self) -> Result<MixSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot { reply }).await?;
        rx.await.map_err(|_| Error::ServiceStopped)
    }

    pub async fn presets(&self) -> Result<Vec<PresetEntry>> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Presets { reply }).await?;
        rx.await.map_err(|_| Error::ServiceStopped)
    }

    pub async fn tracks(&self) -> Result<Vec<TrackInfo>> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Tracks { reply }).await?;
        rx.await.map_err(|_| Error::ServiceStopped)
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.tx.send(command).await.map_err(|_| Error::ServiceStopped)
    }
}

/// Everything needed to assemble a mixer
pub struct MixerParts {
    pub catalog: Catalog,
    pub backend: Box<dyn AudioBackend>,
    pub storage: Box<dyn PresetStorage>,
    pub events: EventBus,
    pub initial_master_volume: u8,
}

pub struct MixerService {
    controller: MixerController,
    commands: mpsc::Receiver<Command>,
    ticks: mpsc::UnboundedReceiver<u64>,
}

impl MixerService {
    /// Assemble the controller from `parts` and start the loop
    ///
    /// Must be called within a tokio runtime. The loop exits once every
    /// `MixerHandle` has been dropped.
    pub fn launch(parts: MixerParts) -> (MixerHandle, JoinHandle<()>) {
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        let timer = Timer::new(Box::new(TokioTicker::new(tick_tx)));

        let controller = MixerController::new(
            parts.catalog,
            Box::new(PlaybackEngine::new(parts.backend)),
            PresetStore::open(parts.storage),
            timer,
            Box::new(EventPresenter::new(parts.events)),
            parts.initial_master_volume,
        );

        Self::spawn(controller, tick_rx)
    }

    /// Run an already assembled controller
    ///
    /// `ticks` must be the receiving end of the channel the controller's
    /// timer ticks into.
    pub fn spawn(
        controller: MixerController,
        ticks: mpsc::UnboundedReceiver<u64>,
    ) -> (MixerHandle, JoinHandle<()>) {
        let (tx, commands) = mpsc::channel(COMMAND_CAPACITY);
        let service = Self {
            controller,
            commands,
            ticks,
        };
        let task = tokio::spawn(service.run());
        (MixerHandle { tx }, task)
    }

    async fn run(mut self) {
        info!("Mixer service started");
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                Some(generation) = self.ticks.recv() => {
                    self.controller.timer_tick(generation);
                }
            }
        }
        info!("Mixer service stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Intent { intent, reply } => {
                let result = self.controller.handle_intent(intent);
                if let Err(e) = &result {
                    debug!("Intent failed: {}", e);
                }
                let _ = reply.send(result);
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.controller.snapshot());
            }
            Command::Presets { reply } => {
                let _ = reply.send(self.controller.preset_entries());
            }
            Command::Tracks { reply } => {
                let _ = reply.send(self.controller.track_infos());
            }
        }
    }
}
