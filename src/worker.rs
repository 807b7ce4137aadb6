//! Background generation.
//!
//! `spawn_generation` runs one pipeline on its own thread and streams progress over a
//! channel, followed by exactly one terminal message. Every message carries the
//! caller's generation id so a caller that started a newer generation can drop stale
//! results.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::error::{GenerationError, Result};
use crate::world::{generate_with, GenerationRequest, World, WorldConfig};

#[derive(Debug)]
pub enum GenerationEvent {
    Progress { status: String },
    Complete(Box<World>),
    Failed(GenerationError),
}

impl GenerationEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GenerationEvent::Progress { .. })
    }
}

#[derive(Debug)]
pub struct GenerationMessage {
    pub generation: u64,
    pub event: GenerationEvent,
}

/// Receiving end of a running generation.
pub struct GenerationHandle {
    pub generation: u64,
    receiver: Receiver<GenerationMessage>,
    thread: Option<JoinHandle<()>>,
}

impl GenerationHandle {
    /// Next message; `WorkerDisconnected` once the worker is gone.
    pub fn recv(&self) -> Result<GenerationMessage> {
        self.receiver.recv().map_err(|_| GenerationError::WorkerDisconnected)
    }

    /// Block until the terminal message, forwarding progress to `on_progress`.
    pub fn wait(mut self, mut on_progress: impl FnMut(&str)) -> Result<World> {
        let result = loop {
            let message = match self.recv() {
                Ok(message) => message,
                Err(err) => break Err(err),
            };
            match message.event {
                GenerationEvent::Progress { status } => on_progress(&status),
                GenerationEvent::Complete(world) => break Ok(*world),
                GenerationEvent::Failed(err) => break Err(err),
            }
        };
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!(generation = self.generation, "generation worker panicked");
            }
        }
        result
    }
}

fn send(sender: &Sender<GenerationMessage>, generation: u64, event: GenerationEvent) {
    // The caller may have dropped the handle to abandon this generation
    if sender.send(GenerationMessage { generation, event }).is_err() {
        debug!(generation, "generation receiver dropped");
    }
}

/// Start a generation on a dedicated thread.
pub fn spawn_generation(generation: u64, request: GenerationRequest, config: WorldConfig) -> GenerationHandle {
    let (sender, receiver) = mpsc::channel();
    let thread = thread::spawn(move || {
        let mut progress = |status: &str| {
            send(&sender, generation, GenerationEvent::Progress { status: status.to_string() });
        };
        let event = match generate_with(&request, &config, &mut progress) {
            Ok(world) => GenerationEvent::Complete(Box::new(world)),
            Err(err) => GenerationEvent::Failed(err),
        };
        send(&sender, generation, event);
    });
    GenerationHandle { generation, receiver, thread: Some(thread) }
}
