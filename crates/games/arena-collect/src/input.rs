use std::collections::HashSet;

/// A movement direction in screen space (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Map a `KeyboardEvent.code` to a movement direction. Arrow keys and WASD
/// are equivalent.
pub fn direction_for_key(code: &str) -> Option<Direction> {
    match code {
        "ArrowUp" | "KeyW" => Some(Direction::Up),
        "ArrowDown" | "KeyS" => Some(Direction::Down),
        "ArrowLeft" | "KeyA" => Some(Direction::Left),
        "ArrowRight" | "KeyD" => Some(Direction::Right),
        _ => None,
    }
}

/// Set of movement keys currently held down.
///
/// Key events only edit the set; the simulator samples it once per tick, so a
/// held key contributes movement on every tick until released.
#[derive(Debug, Default, Clone)]
pub struct InputSampler {
    held: HashSet<String>,
}

impl InputSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key press. Returns `true` when the key is a movement key, in
    /// which case the browser default (page scrolling) must be suppressed.
    pub fn on_key_down(&mut self, code: &str) -> bool {
        if direction_for_key(code).is_none() {
            return false;
        }
        self.held.insert(code.to_string());
        true
    }

    /// Record a key release. Returns `true` for movement keys.
    pub fn on_key_up(&mut self, code: &str) -> bool {
        if direction_for_key(code).is_none() {
            return false;
        }
        self.held.remove(code);
        true
    }

    /// Whether any key mapped to `direction` is held.
    pub fn is_held(&self, direction: Direction) -> bool {
        self.held
            .iter()
            .any(|code| direction_for_key(code) == Some(direction))
    }

    /// Net per-axis direction as `(dx, dy)`, each in `-1..=1`.
    pub fn axis(&self) -> (i8, i8) {
        let dx = i8::from(self.is_held(Direction::Right)) - i8::from(self.is_held(Direction::Left));
        let dy = i8::from(self.is_held(Direction::Down)) - i8::from(self.is_held(Direction::Up));
        (dx, dy)
    }

    #[cfg(test)]
    fn is_idle(&self) -> bool {
        self.held.is_empty()
    }

    /// Forget all held keys (window blur, session teardown).
    pub fn clear(&mut self) {
        self.held.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrow_and_letter_keys_are_equivalent() {
        let mut a = InputSampler::new();
        a.on_key_down("ArrowLeft");
        let mut b = InputSampler::new();
        b.on_key_down("KeyA");
        assert_eq!(a.axis(), (-1, 0));
        assert_eq!(a.axis(), b.axis());
    }

    #[test]
    fn held_key_persists_until_release() {
        let mut input = InputSampler::new();
        assert!(input.on_key_down("KeyD"));
        assert_eq!(input.axis(), (1, 0));
        assert_eq!(input.axis(), (1, 0));
        assert!(input.on_key_up("KeyD"));
        assert_eq!(input.axis(), (0, 0));
        assert!(input.is_idle());
    }

    #[test]
    fn unmapped_keys_are_ignored_and_not_suppressed() {
        let mut input = InputSampler::new();
        assert!(!input.on_key_down("Space"));
        assert!(!input.on_key_down("KeyQ"));
        assert!(input.is_idle());
    }

    #[test]
    fn opposite_keys_cancel() {
        let mut input = InputSampler::new();
        input.on_key_down("ArrowUp");
        input.on_key_down("KeyS");
        assert_eq!(input.axis(), (0, 0));
    }

    #[test]
    fn releasing_one_mapping_keeps_the_other() {
        let mut input = InputSampler::new();
        input.on_key_down("ArrowUp");
        input.on_key_down("KeyW");
        input.on_key_up("ArrowUp");
        assert!(input.is_held(Direction::Up));
    }

    #[test]
    fn diagonal_reports_both_axes() {
        let mut input = InputSampler::new();
        input.on_key_down("ArrowDown");
        input.on_key_down("ArrowRight");
        assert_eq!(input.axis(), (1, 1));
    }
}
