//! Touch input channel
//!
//! Touch sources run on their own threads (device callbacks, network
//! listeners). They push [`TouchEvent`]s through a [`TouchSender`]; the
//! simulation drains the channel once at the start of each tick, so the
//! touch set is never read while it is being changed.

use std::sync::mpsc::{self, Receiver, Sender};

use glam::Vec2;

use crate::sim::touch::{TouchEvent, TouchId};

/// Cloneable producer end, one per touch source
#[derive(Debug, Clone)]
pub struct TouchSender {
    tx: Sender<TouchEvent>,
    viewport: Vec2,
}

impl TouchSender {
    fn send(&self, event: TouchEvent) {
        if self.tx.send(event).is_err() {
            log::debug!("Touch channel closed, dropping {event:?}");
        }
    }

    pub fn add(&self, id: TouchId, x: f32, y: f32) {
        self.send(TouchEvent::Add { id, x, y });
    }

    pub fn update(&self, id: TouchId, x: f32, y: f32) {
        self.send(TouchEvent::Update { id, x, y });
    }

    pub fn remove(&self, id: TouchId) {
        self.send(TouchEvent::Remove { id });
    }

    /// Add from normalized [0, 1] coordinates
    pub fn add_normalized(&self, id: TouchId, x: f32, y: f32) {
        let p = Vec2::new(x, y) * self.viewport;
        self.add(id, p.x, p.y);
    }

    /// Update from normalized [0, 1] coordinates
    pub fn update_normalized(&self, id: TouchId, x: f32, y: f32) {
        let p = Vec2::new(x, y) * self.viewport;
        self.update(id, p.x, p.y);
    }
}

/// Consumer end owned by the simulation loop
#[derive(Debug)]
pub struct TouchChannel {
    rx: Receiver<TouchEvent>,
    tx: Sender<TouchEvent>,
    viewport: Vec2,
}

impl TouchChannel {
    pub fn new(viewport: Vec2) -> Self {
        let (tx, rx) = mpsc::channel();
        Self { rx, tx, viewport }
    }

    pub fn sender(&self) -> TouchSender {
        TouchSender {
            tx: self.tx.clone(),
            viewport: self.viewport,
        }
    }

    /// Everything received since the last drain, in arrival order
    pub fn drain(&self) -> Vec<TouchEvent> {
        self.rx.try_iter().collect()
    }
}
