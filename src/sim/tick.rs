//! Fixed timestep simulation tick
//!
//! One call advances the whole installation by one step:
//! 1. Clock, touch events and debug input
//! 2. Physics and audio bookkeeping
//! 3. Ripples, biteable words and idle highlights
//! 4. Either the page transition or the idle wander plus bite assignment
//! 5. Word fades and contractions, then the snakes

use super::snake::SnakeEvent;
use super::state::{Installation, SimEvent};
use super::touch::{TouchEvent, select_biting_touch};
use super::transition::TransitionPhase;
use crate::audio::sounds_per_bite;
use crate::seconds_to_frames;

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Touch events received since the last tick, in arrival order
    pub touches: Vec<TouchEvent>,
    /// Start the next page change right away (debug)
    pub skip_page: bool,
}

/// Advance the installation by one fixed timestep
pub fn tick(state: &mut Installation, input: &TickInput, dt: f32) {
    state.events.clear();
    state.time_ms += f64::from(dt) * 1000.0;
    state.time_ticks += 1;

    for &event in &input.touches {
        state.apply_touch_event(event);
    }
    if input.skip_page {
        state.skip_page();
    }
    let now = state.now_ms();

    state.physics.tick(seconds_to_frames(dt));
    state.audio.update(now, &mut state.rng);

    update_ripples(state);
    handle_biteable_words(state, now);
    handle_visible_words(state);

    state.idle_point = None;
    if state.transition.is_due(now, !state.touches.is_empty()) {
        change_pages(state, now);
    } else {
        move_idle(state, now);
        snake_bite(state, now);
    }

    update_words(state);
    update_snakes(state, now);
}

/// Grow ripples, and start one under every bite that just landed
fn update_ripples(state: &mut Installation) {
    state.ripples.update();

    let distance = state.settings.bite.ripple_distance;
    for i in 0..state.snakes.len() {
        let landed = {
            let snake = &state.snakes[i];
            snake.bite_state().is_some_and(|b| {
                b.strike_played && !b.rippled && snake.distance_from_prey(&state.physics) < distance
            })
        };
        if !landed {
            continue;
        }
        let at = state.snakes[i].prey_position(&state.physics);
        state.ripples.spawn(at, &mut state.rng);
        if let Some(bite) = state.snakes[i].bite_state_mut() {
            bite.rippled = true;
        }
        state.events.push(SimEvent::Ripple { at });
    }
}

/// Drop biteable words no touch is on any more, then highlight the words
/// under every touch
fn handle_biteable_words(state: &mut Installation, now: u64) {
    let seen_ratio = state.settings.transition.seen_ratio;
    for r in std::mem::take(&mut state.biteable) {
        let Some(bounds) = state.word(r).map(|w| w.bounds) else {
            continue;
        };
        if state.touches.iter().any(|t| bounds.contains(t.position)) {
            state.biteable.push(r);
            continue;
        }

        let mut newly_seen = false;
        if let Some(word) = state.word_mut(r) {
            newly_seen = !word.seen;
            word.seen = true;
            word.biteable = false;
            word.fade.fade_out(None);
        }
        if newly_seen {
            let page = &mut state.pages[r.page];
            page.seen_count += 1;
            if page.seen_ratio() > seen_ratio {
                state.transition.pull_forward(now);
            }
        }
    }

    let points: Vec<_> = state.touches.iter().map(|t| t.position).collect();
    for point in points {
        state.highlight_word_at(point, 1.0, true);
    }
}

/// Non-biteable highlights fade out as soon as their fade in completes
fn handle_visible_words(state: &mut Installation) {
    for r in std::mem::take(&mut state.visible) {
        let Some(word) = state.word_mut(r) else {
            continue;
        };
        if word.biteable {
            continue;
        }
        if word.fade.is_fading() {
            state.visible.push(r);
        } else {
            word.fade.fade_out(None);
        }
    }
}

fn change_pages(state: &mut Installation, now: u64) {
    if !state.transition.is_changing() {
        let page = state.page_index;
        let lines = state.pages[page].lines.len();
        state.transition.begin(page, lines, now, &mut state.rng);
        state.idle.end();
        let interval = state.settings.transition.interval_ms;
        state.audio.change_page_audio(page, state.pages.len(), interval);
        state.events.push(SimEvent::TransitionStarted { page });
    }

    let TransitionPhase::Changing { page: from, .. } = state.transition.phase else {
        return;
    };
    let touched = !state.touches.is_empty();
    if !state.transition.step(&mut state.pages[from], now, touched) {
        return;
    }

    state.transition.finish(now);
    let mut to = from + 1;
    if to >= state.pages.len() {
        to = 0;
        state.first_bite = true;
        state.transition.locked = true;
    }
    state.page_index = to;
    state.pages[to].seen_count = 0;
    state.events.push(SimEvent::PageChanged { from, to });
    log::info!("Page {from} -> {to}");
}

fn move_idle(state: &mut Installation, now: u64) {
    let touched = !state.touches.is_empty();
    let Some(point) = state.idle.step(now, state.last_touch_ms, touched, &mut state.rng) else {
        return;
    };
    state.idle_point = Some(point);
    let opacity = state.settings.idle.highlight.target;
    state.highlight_word_at(point, opacity, false);
}

/// Assign snakes to fully lit biteable words whose touch is ready
fn snake_bite(state: &mut Installation, now: u64) {
    let page = state.page_index;
    let first_page = state.settings.bite.first_page;
    // One more snake may bite on each page past the first biting page
    if page < first_page || state.biting_count() > page - first_page {
        return;
    }

    let trigger = state.settings.bite.opacity_trigger;
    let first_delay = state.settings.bite.first_delay_ms;
    for r in state.biteable.clone() {
        let Some(word) = state.word(r) else {
            continue;
        };
        if word.opacity() < trigger {
            continue;
        }
        let bounds = word.bounds;
        let Some(touch_id) = select_biting_touch(state.touches.iter(), &bounds, now, first_delay)
        else {
            continue;
        };
        let snake = state.quadrant(bounds.center());
        if state.snakes.get(snake).is_none_or(|s| s.is_biting()) {
            continue;
        }

        if state.first_bite {
            state.audio.arm_first_bite(snake, &mut state.rng);
            state.first_bite = false;
        } else {
            let count = sounds_per_bite(page, state.biting_count());
            state.audio.arm_bite(snake, count, &mut state.rng);
        }

        let extra = state.random_bite_delay();
        let Some(touch) = state.touches.get_mut(touch_id) else {
            continue;
        };
        state.snakes[snake].bite(&mut state.physics, r, touch);
        touch.delay_ms += extra;
        state.events.push(SimEvent::Bite {
            snake,
            touch: touch_id,
            word: r,
        });
        log::info!("Snake {snake} bites {:?} for touch {touch_id}", r);
    }
}

/// Words on every page keep fading and relaxing, shown or not
fn update_words(state: &mut Installation) {
    let contract = &state.settings.contract;
    for page in &mut state.pages {
        for word in page.words_mut() {
            word.update(contract);
        }
    }
}

fn update_snakes(state: &mut Installation, now: u64) {
    let strike_distance = state.settings.bite.strike_distance;
    for i in 0..state.snakes.len() {
        let (touch, bounds) = match state.snakes[i].bite_state() {
            Some(bite) => (
                state.touches.get(bite.touch).map(|t| t.position),
                state.word(bite.word).map(|w| w.bounds),
            ),
            None => (None, None),
        };
        let events = state.snakes[i].update(&mut state.physics, now, touch, bounds, strike_distance);
        for event in events {
            match event {
                SnakeEvent::Strike => {
                    state.audio.strike(i);
                    state.events.push(SimEvent::Strike { snake: i });
                }
                SnakeEvent::Contract { word, at } => {
                    let contract = state.settings.contract.clone();
                    if let Some(w) = state.word_mut(word) {
                        w.contract(at, now, &contract);
                    }
                    state.events.push(SimEvent::Contract { snake: i, word });
                }
                SnakeEvent::Settled => {
                    state.events.push(SimEvent::Settled { snake: i });
                    log::debug!("Snake {i} is home");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::Settings;
    use crate::audio::{AudioCall, RecordingAudio};
    use crate::consts::SIM_DT;
    use crate::layout::FixedAdvanceLayout;
    use crate::sim::touch::Touch;
    use crate::sim::word::WordRef;

    fn installation_with_audio() -> (Installation, RecordingAudio) {
        let settings = Settings {
            seed: Some(12345),
            ..Default::default()
        };
        let audio = RecordingAudio::new();
        let state = Installation::new(settings, &FixedAdvanceLayout::default(), Box::new(audio.clone()))
            .expect("default settings build");
        (state, audio)
    }

    fn installation() -> Installation {
        installation_with_audio().0
    }

    /// Tick with no input until `done` holds; returns the ticks taken
    fn run_until(
        state: &mut Installation,
        max_ticks: u32,
        mut done: impl FnMut(&Installation) -> bool,
    ) -> Option<u32> {
        let input = TickInput::default();
        for n in 1..=max_ticks {
            tick(state, &input, SIM_DT);
            if done(state) {
                return Some(n);
            }
        }
        None
    }

    fn touch(state: &mut Installation, event: TouchEvent) {
        let input = TickInput {
            touches: vec![event],
            ..Default::default()
        };
        tick(state, &input, SIM_DT);
    }

    fn word_at(state: &Installation, point: Vec2) -> Option<WordRef> {
        let page = state.page_index;
        state.pages[page].lines.iter().enumerate().find_map(|(line, l)| {
            l.words
                .iter()
                .position(|w| w.bounds.contains(point))
                .map(|word| WordRef { page, line, word })
        })
    }

    /// Let the start-up retraction finish
    fn settle(state: &mut Installation) {
        let settled = run_until(state, 600, |s| s.snakes.iter().all(|sn| !sn.is_retracting()));
        assert!(settled.is_some(), "snakes never settled");
    }

    #[test]
    fn test_clock_advances_by_dt() {
        let mut state = installation();
        run_until(&mut state, 60, |_| false);
        assert_eq!(state.time_ticks, 60);
        assert!((state.time_ms - 1000.0).abs() < 0.01);
    }

    #[test]
    fn test_touch_bites_after_first_delay() {
        let mut state = installation();
        state.page_index = 4;
        settle(&mut state);

        let point = Vec2::new(100.0, 100.0);
        let target = word_at(&state, point).expect("a word under (100, 100)");
        touch(&mut state, TouchEvent::Add { id: 1, x: point.x, y: point.y });
        assert_eq!(state.biteable, vec![target]);

        let ticks = run_until(&mut state, 400, |s| {
            s.events.iter().any(|e| matches!(e, SimEvent::Bite { .. }))
        })
        .expect("snake bites");
        // 3 s first bite delay at 60 Hz
        assert!((175..=185).contains(&ticks), "bit after {ticks} ticks");

        let snake = state.quadrant(point);
        assert_eq!(snake, 0);
        assert!(state.snakes[0].is_biting());
        assert_eq!(state.snakes[0].bite_state().map(|b| b.word), Some(target));
        assert_eq!(state.touches.get(1).map(|t| t.bites), Some(1));
        assert!(!state.first_bite);

        // Prey follows the finger
        touch(&mut state, TouchEvent::Update { id: 1, x: 110.0, y: 95.0 });
        assert_eq!(state.snakes[0].prey_position(&state.physics), Vec2::new(110.0, 95.0));

        let contracted = run_until(&mut state, 600, |s| {
            s.word(target).is_some_and(|w| w.contraction.is_contracting())
        });
        assert!(contracted.is_some(), "head never reached the word");
    }

    #[test]
    fn test_no_bites_before_first_biting_page() {
        let mut state = installation();
        state.page_index = 2;
        touch(&mut state, TouchEvent::Add { id: 1, x: 100.0, y: 100.0 });
        let bit = run_until(&mut state, 600, |s| s.snakes.iter().any(|sn| sn.is_biting()));
        assert!(bit.is_none());
    }

    #[test]
    fn test_second_snake_only_on_later_pages() {
        let mut state = installation();
        state.page_index = 3;
        settle(&mut state);
        // Two fingers in two quadrants; page 3 allows one biting snake
        touch(&mut state, TouchEvent::Add { id: 1, x: 100.0, y: 100.0 });
        touch(&mut state, TouchEvent::Add { id: 2, x: 1100.0, y: 100.0 });
        run_until(&mut state, 400, |_| false);
        assert_eq!(state.biting_count(), 1);
    }

    #[test]
    fn test_fewest_bites_touch_wins() {
        let mut state = installation();
        state.page_index = 4;
        settle(&mut state);

        let point = Vec2::new(100.0, 100.0);
        let now = state.now_ms();
        state.touches.add(Touch {
            bites: 2,
            ..Touch::new(1, point, now, 0)
        });
        state.touches.add(Touch {
            bites: 1,
            ..Touch::new(2, point + Vec2::new(2.0, 0.0), now, 0)
        });

        let bite = {
            let mut found = None;
            run_until(&mut state, 120, |s| {
                found = s.events.iter().find_map(|e| match e {
                    SimEvent::Bite { touch, .. } => Some(*touch),
                    _ => None,
                });
                found.is_some()
            });
            found
        };
        assert_eq!(bite, Some(2));
        assert_eq!(state.touches.get(2).map(|t| t.bites), Some(2));
        assert!(state.touches.get(2).is_some_and(|t| t.delay_ms >= 5_000));
    }

    #[test]
    fn test_release_retracts_and_settles_on_anchors() {
        let (mut state, audio) = installation_with_audio();
        state.page_index = 4;
        settle(&mut state);
        touch(&mut state, TouchEvent::Add { id: 7, x: 100.0, y: 100.0 });
        run_until(&mut state, 400, |s| s.snakes[0].is_biting()).expect("snake bites");
        // Let the strike land
        run_until(&mut state, 120, |_| false);

        audio.clear();
        touch(&mut state, TouchEvent::Remove { id: 7 });
        assert!(state.events.contains(&SimEvent::Retract { snake: 0 }));
        assert!(!state.snakes[0].is_biting());
        assert!(
            audio
                .calls()
                .iter()
                .any(|c| matches!(c, AudioCall::FadeTo { stop_when_done: true, .. }))
        );

        run_until(&mut state, 1200, |s| !s.snakes[0].is_retracting()).expect("retraction settles");
        let snake = &state.snakes[0];
        assert_eq!(snake.section_positions(&state.physics), snake.anchor_positions(&state.physics));
        assert!(!snake.is_biting());
    }

    #[test]
    fn test_bite_spawns_one_ripple() {
        let mut state = installation();
        state.page_index = 4;
        settle(&mut state);
        touch(&mut state, TouchEvent::Add { id: 1, x: 100.0, y: 100.0 });
        let mut ripples = 0;
        run_until(&mut state, 900, |s| {
            ripples += s
                .events
                .iter()
                .filter(|e| matches!(e, SimEvent::Ripple { .. }))
                .count();
            false
        });
        assert_eq!(ripples, 1);
    }

    #[test]
    fn test_transition_advances_page() {
        let mut state = installation();
        state.transition.locked = false;
        state.transition.next_change_ms = 0;

        tick(&mut state, &TickInput::default(), SIM_DT);
        assert!(state.events.contains(&SimEvent::TransitionStarted { page: 0 }));
        assert!(state.transition.is_changing());

        run_until(&mut state, 1200, |s| !s.transition.is_changing()).expect("transition finishes");
        assert!(state.events.contains(&SimEvent::PageChanged { from: 0, to: 1 }));
        assert_eq!(state.page_index, 1);
        assert_eq!(state.pages[1].seen_count, 0);
        assert!(state.transition.next_change_ms > state.now_ms());
    }

    #[test]
    fn test_last_page_wraps_and_relocks() {
        let mut state = installation();
        let last = state.pages.len() - 1;
        state.page_index = last;
        state.first_bite = false;
        state.transition.locked = false;
        state.transition.next_change_ms = 0;

        run_until(&mut state, 1200, |s| {
            s.events.iter().any(|e| matches!(e, SimEvent::PageChanged { .. }))
        })
        .expect("page changes");
        assert_eq!(state.page_index, 0);
        assert!(state.transition.locked);
        assert!(state.first_bite);
    }

    #[test]
    fn test_touch_blocks_transition_start() {
        let mut state = installation();
        state.transition.locked = false;
        state.transition.next_change_ms = 0;
        touch(&mut state, TouchEvent::Add { id: 1, x: 640.0, y: 360.0 });
        assert!(!state.transition.is_changing());
    }

    #[test]
    fn test_skip_page_starts_transition() {
        let mut state = installation();
        let input = TickInput {
            skip_page: true,
            ..Default::default()
        };
        tick(&mut state, &input, SIM_DT);
        assert!(state.transition.is_changing());
        assert!(state.events.contains(&SimEvent::TransitionStarted { page: 0 }));
    }

    #[test]
    fn test_idle_wander_highlights_faintly() {
        let mut state = installation();
        let ticks = run_until(&mut state, 1800, |s| !s.visible.is_empty());
        assert!(ticks.is_some_and(|t| t >= 600), "idle ran before the idle threshold");
        assert!(state.biteable.is_empty());
        let highlight = state.settings.idle.highlight.target;
        for &r in &state.visible {
            let word = state.word(r).expect("visible word exists");
            assert!(!word.biteable);
            assert!(word.opacity() <= highlight);
        }
    }

    #[test]
    fn test_reading_most_of_a_page_brings_the_change_forward() {
        let mut state = installation();
        let early = state.settings.transition.early_change_ms;
        let ratio = state.settings.transition.seen_ratio;
        let total = state.pages[0].word_count();
        let centers: Vec<Vec2> = state.pages[0].words().map(|w| w.bounds.center()).collect();

        let mut lifted = 0;
        for &c in &centers {
            touch(&mut state, TouchEvent::Add { id: 1, x: c.x, y: c.y });
            touch(&mut state, TouchEvent::Remove { id: 1 });
            lifted += 1;
            assert_eq!(state.pages[0].seen_count, lifted);
            if state.pages[0].seen_ratio() > ratio {
                break;
            }
        }
        assert!(lifted as f32 / total as f32 > ratio);
        assert!(state.transition.next_change_ms <= state.now_ms() + early);

        // A word already seen does not count twice
        touch(&mut state, TouchEvent::Add { id: 2, x: centers[0].x, y: centers[0].y });
        touch(&mut state, TouchEvent::Remove { id: 2 });
        assert_eq!(state.pages[0].seen_count, lifted);

        // Left over from an earlier cycle
        state.pages[1].seen_count = 7;
        run_until(&mut state, 3000, |s| s.page_index == 1).expect("page changes early");
        assert_eq!(state.pages[1].seen_count, 0);
    }

    #[test]
    fn test_lifted_word_is_seen_and_fades() {
        let mut state = installation();
        let point = Vec2::new(100.0, 60.0);
        let target = word_at(&state, point).expect("word under the touch");
        touch(&mut state, TouchEvent::Add { id: 4, x: point.x, y: point.y });
        run_until(&mut state, 30, |_| false);
        touch(&mut state, TouchEvent::Remove { id: 4 });

        let word = state.word(target).expect("word exists");
        assert!(word.seen);
        assert!(!word.biteable);
        assert!(word.fade.is_fading_out());
        assert_eq!(state.pages[0].seen_count, 1);
        assert!(state.biteable.is_empty());
    }
}
