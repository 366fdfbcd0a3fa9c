//! Rattlesnakes headless runner
//!
//! Drives the engine without a display or sound card: a scripted visitor
//! unlocks the page cycle, skips ahead to the first biting pages, holds a
//! word until a snake strikes, then lets go. Progress is logged through
//! `RUST_LOG`.
//!
//! Usage: `rattlesnakes [settings.json] [scene-out.json]`

#[cfg(not(target_arch = "wasm32"))]
use std::error::Error;

#[cfg(not(target_arch = "wasm32"))]
use rattlesnakes::{
    Settings,
    audio::RecordingAudio,
    consts::SIM_DT,
    layout::FixedAdvanceLayout,
    platform::{FixedStep, TouchChannel, TouchSender},
    renderer::Scene,
    sim::{Installation, SimEvent, TickInput, tick},
};

/// Length of the scripted session
#[cfg(not(target_arch = "wasm32"))]
const SESSION_SECS: f32 = 120.0;
/// Simulated host frame time (a 30 Hz display)
#[cfg(not(target_arch = "wasm32"))]
const HOST_FRAME_SECS: f32 = 1.0 / 30.0;
/// How long the visitor keeps a finger on the bitten word
#[cfg(not(target_arch = "wasm32"))]
const HOLD_MS: u64 = 15_000;

#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy, PartialEq)]
enum Step {
    /// Tap once to unlock page changes
    Unlock,
    /// Skip pages until snakes may bite
    Skipping,
    Holding { since_ms: u64 },
    Done,
}

/// The scripted visitor
#[cfg(not(target_arch = "wasm32"))]
struct Visitor {
    step: Step,
    tx: TouchSender,
}

#[cfg(not(target_arch = "wasm32"))]
impl Visitor {
    fn act(&mut self, state: &Installation) {
        let now = state.now_ms();
        match self.step {
            Step::Unlock if now >= 1_000 => {
                self.tx.add_normalized(0, 0.5, 0.5);
                self.tx.remove(0);
                self.step = Step::Skipping;
            }
            Step::Skipping if state.page_index > state.settings.bite.first_page => {
                self.tx.add(1, 100.0, 100.0);
                self.step = Step::Holding { since_ms: now };
                log::info!("Visitor touches page {} at (100, 100)", state.page_index);
            }
            Step::Holding { since_ms } if now - since_ms >= HOLD_MS => {
                self.tx.remove(1);
                self.step = Step::Done;
                log::info!("Visitor lets go");
            }
            _ => {}
        }
    }

    fn wants_skip(&self, state: &Installation) -> bool {
        self.step == Step::Skipping && !state.transition.is_changing()
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn report(state: &Installation) {
    for event in &state.events {
        match event {
            SimEvent::Bite { .. }
            | SimEvent::Strike { .. }
            | SimEvent::Contract { .. }
            | SimEvent::Retract { .. }
            | SimEvent::Settled { .. } => log::info!("{event:?}"),
            _ => log::debug!("{event:?}"),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    log::info!("Rattlesnakes (headless) starting...");

    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(path) => Settings::load_from_path(&path)?,
        None => Settings::default(),
    };
    let scene_out = args.next();

    let channel = TouchChannel::new(settings.viewport_size());
    let audio = RecordingAudio::new();
    let mut state = Installation::new(settings, &FixedAdvanceLayout::default(), Box::new(audio.clone()))?;
    let mut visitor = Visitor {
        step: Step::Unlock,
        tx: channel.sender(),
    };

    let mut clock = FixedStep::new();
    let frames = (SESSION_SECS / HOST_FRAME_SECS) as u32;
    for _ in 0..frames {
        for _ in 0..clock.advance(HOST_FRAME_SECS) {
            visitor.act(&state);
            let input = TickInput {
                touches: channel.drain(),
                skip_page: visitor.wants_skip(&state),
            };
            tick(&mut state, &input, SIM_DT);
            report(&state);
        }
    }

    let scene = Scene::capture(&state);
    log::info!(
        "Finished after {} ticks on page {}: {} lit words, {} ripples, {} audio calls",
        state.time_ticks,
        scene.page,
        scene.words.len(),
        scene.ripples.len(),
        audio.calls().len()
    );
    if let Some(path) = scene_out {
        std::fs::write(&path, serde_json::to_string_pretty(&scene)?)?;
        log::info!("Scene written to {path}");
    }
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The engine is a library on the web; the host page drives `tick`
}
