//! Active touches and per-touch bite timing

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::Rect;

/// Caller-assigned touch identifier (0 is used for a mouse pointer)
pub type TouchId = u32;

/// Input event from the touch source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TouchEvent {
    Add { id: TouchId, x: f32, y: f32 },
    Update { id: TouchId, x: f32, y: f32 },
    Remove { id: TouchId },
}

/// One finger (or pointer) on the surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Touch {
    pub id: TouchId,
    pub position: Vec2,
    pub start_ms: u64,
    /// Bites triggered by this touch so far
    pub bites: u32,
    /// Time after `start_ms` before this touch may trigger another bite
    pub delay_ms: u64,
}

impl Touch {
    pub fn new(id: TouchId, position: Vec2, start_ms: u64, delay_ms: u64) -> Self {
        Self {
            id,
            position,
            start_ms,
            bites: 0,
            delay_ms,
        }
    }

    /// Whether this touch may trigger a bite at `now_ms`
    pub fn can_bite(&self, now_ms: u64, first_delay_ms: u64) -> bool {
        let wait = if self.bites == 0 {
            first_delay_ms
        } else {
            self.delay_ms
        };
        now_ms >= self.start_ms + wait
    }
}

/// Active touches keyed by id, iterated in ascending id order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TouchSet {
    touches: BTreeMap<TouchId, Touch>,
}

impl TouchSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a touch, replacing any stale touch with the same id
    pub fn add(&mut self, touch: Touch) -> Option<Touch> {
        self.touches.insert(touch.id, touch)
    }

    /// Move a touch; returns false for unknown ids
    pub fn update(&mut self, id: TouchId, position: Vec2) -> bool {
        match self.touches.get_mut(&id) {
            Some(t) => {
                t.position = position;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: TouchId) -> Option<Touch> {
        self.touches.remove(&id)
    }

    pub fn get(&self, id: TouchId) -> Option<&Touch> {
        self.touches.get(&id)
    }

    pub fn get_mut(&mut self, id: TouchId) -> Option<&mut Touch> {
        self.touches.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Touch> {
        self.touches.values()
    }

    pub fn len(&self) -> usize {
        self.touches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.touches.is_empty()
    }
}

/// Pick the touch over `bounds` that should trigger a bite.
///
/// A touch that never bit wins as soon as its first delay passed. Otherwise
/// the eligible touch with the fewest bites wins, first found on ties.
pub fn select_biting_touch<'a>(
    touches: impl IntoIterator<Item = &'a Touch>,
    bounds: &Rect,
    now_ms: u64,
    first_delay_ms: u64,
) -> Option<TouchId> {
    let mut pick: Option<&Touch> = None;
    for t in touches {
        if !bounds.contains(t.position) || !t.can_bite(now_ms, first_delay_ms) {
            continue;
        }
        if t.bites == 0 {
            return Some(t.id);
        }
        if pick.is_none_or(|p| t.bites < p.bites) {
            pick = Some(t);
        }
    }
    pick.map(|t| t.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(id: TouchId, bites: u32, delay_ms: u64) -> Touch {
        Touch {
            bites,
            ..Touch::new(id, Vec2::new(50.0, 50.0), 0, delay_ms)
        }
    }

    #[test]
    fn test_first_bite_waits_for_first_delay() {
        let t = touch(1, 0, 9_000);
        assert!(!t.can_bite(2_999, 3_000));
        assert!(t.can_bite(3_000, 3_000));
    }

    #[test]
    fn test_repeat_bite_uses_touch_delay() {
        let t = touch(1, 1, 9_000);
        assert!(!t.can_bite(8_999, 3_000));
        assert!(t.can_bite(9_000, 3_000));
    }

    #[test]
    fn test_fewest_bites_wins() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);
        let touches = [touch(1, 2, 1_000), touch(2, 1, 1_000)];
        assert_eq!(select_biting_touch(&touches, &bounds, 5_000, 3_000), Some(2));
        let touches = [touch(2, 1, 1_000), touch(1, 2, 1_000)];
        assert_eq!(select_biting_touch(&touches, &bounds, 5_000, 3_000), Some(2));
    }

    #[test]
    fn test_tie_keeps_first_found() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);
        let touches = [touch(4, 1, 1_000), touch(7, 1, 1_000)];
        assert_eq!(select_biting_touch(&touches, &bounds, 5_000, 3_000), Some(4));
    }

    #[test]
    fn test_touch_outside_bounds_ignored() {
        let bounds = Rect::new(200.0, 200.0, 100.0, 100.0);
        let touches = [touch(1, 0, 0)];
        assert_eq!(select_biting_touch(&touches, &bounds, 5_000, 3_000), None);
    }

    #[test]
    fn test_fresh_touch_beats_bitten_touch() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);
        let touches = [touch(1, 1, 1_000), touch(2, 0, 20_000)];
        assert_eq!(select_biting_touch(&touches, &bounds, 5_000, 3_000), Some(2));
    }

    #[test]
    fn test_touch_set_orders_by_id_and_reuses_ids() {
        let mut set = TouchSet::new();
        set.add(Touch::new(5, Vec2::ZERO, 0, 0));
        set.add(Touch::new(2, Vec2::ZERO, 0, 0));
        let ids: Vec<_> = set.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 5]);

        assert!(set.update(5, Vec2::new(3.0, 4.0)));
        assert!(!set.update(9, Vec2::ZERO));
        assert!(set.remove(5).is_some());
        set.add(Touch::new(5, Vec2::new(1.0, 1.0), 100, 0));
        assert_eq!(set.get(5).map(|t| t.start_ms), Some(100));
    }
}
