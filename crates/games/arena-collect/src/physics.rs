use arena_core::participant::Position;

use crate::collectible::{Collectible, CollectibleField};
use crate::config::CollectConfig;
use crate::input::InputSampler;

/// Clamp a position into the arena's interior margin.
pub fn clamp_to_arena(position: Position, config: &CollectConfig) -> Position {
    let (min_x, max_x, min_y, max_y) = config.bounds();
    Position::new(
        position.x.clamp(min_x, max_x),
        position.y.clamp(min_y, max_y),
    )
}

/// Candidate position after one tick of held input, already clamped.
///
/// Each held axis moves a full `step`; diagonals are not normalized, so a
/// diagonal tick covers `step * sqrt(2)`.
pub fn step_position(position: Position, input: &InputSampler, config: &CollectConfig) -> Position {
    let (dx, dy) = input.axis();
    let candidate = Position::new(
        position.x + f32::from(dx) * config.step,
        position.y + f32::from(dy) * config.step,
    );
    clamp_to_arena(candidate, config)
}

/// Result of advancing the local player by one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepResult {
    pub position: Position,
    pub moved: bool,
    pub collected: Vec<Collectible>,
    pub points: u32,
}

/// Advance the local player one tick: move from held input, then consume any
/// collectibles within pickup distance of the new position.
pub fn advance_local(
    position: Position,
    input: &InputSampler,
    field: &mut CollectibleField,
    config: &CollectConfig,
) -> StepResult {
    let next = step_position(position, input, config);
    let moved = next != position;
    let position = if moved { next } else { position };

    let collected = field.collect_within(position, config.pickup_distance());
    let points = collected.iter().map(|c| c.kind.points()).sum();

    StepResult {
        position,
        moved,
        collected,
        points,
    }
}

/// Frame-rate decoupling: admits a simulation tick only once enough wall-clock
/// time has passed since the previous admitted tick.
#[derive(Debug, Clone, Default)]
pub struct TickGate {
    last_tick_ms: Option<f64>,
}

impl TickGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` and records `now_ms` when a tick is due.
    pub fn admit(&mut self, now_ms: f64, min_interval_ms: f64) -> bool {
        match self.last_tick_ms {
            Some(last) if now_ms - last < min_interval_ms => false,
            _ => {
                self.last_tick_ms = Some(now_ms);
                true
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectible::CollectibleKind;

    fn holding(keys: &[&str]) -> InputSampler {
        let mut input = InputSampler::new();
        for k in keys {
            input.on_key_down(k);
        }
        input
    }

    #[test]
    fn axis_step_is_five_units() {
        let config = CollectConfig::default();
        let next = step_position(Position::new(400.0, 300.0), &holding(&["KeyD"]), &config);
        assert_eq!(next, Position::new(405.0, 300.0));
    }

    #[test]
    fn diagonal_step_is_not_normalized() {
        let config = CollectConfig::default();
        let start = Position::new(400.0, 300.0);
        let next = step_position(start, &holding(&["ArrowUp", "ArrowLeft"]), &config);
        assert_eq!(next, Position::new(395.0, 295.0));
        let expected = 5.0 * std::f32::consts::SQRT_2;
        assert!((start.distance(&next) - expected).abs() < 1e-4);
    }

    #[test]
    fn clamps_at_every_edge() {
        let config = CollectConfig::default();
        let corner = step_position(
            Position::new(21.0, 579.0),
            &holding(&["KeyA", "KeyS"]),
            &config,
        );
        assert_eq!(corner, Position::new(20.0, 580.0));
        let other = step_position(
            Position::new(779.0, 22.0),
            &holding(&["KeyD", "KeyW"]),
            &config,
        );
        assert_eq!(other, Position::new(780.0, 20.0));
    }

    #[test]
    fn pinned_against_wall_reports_no_move() {
        let config = CollectConfig::default();
        let mut field = CollectibleField::default();
        let result = advance_local(
            Position::new(20.0, 300.0),
            &holding(&["ArrowLeft"]),
            &mut field,
            &config,
        );
        assert!(!result.moved);
        assert_eq!(result.position, Position::new(20.0, 300.0));
    }

    #[test]
    fn advance_collects_and_scores() {
        let config = CollectConfig::default();
        let mut field = CollectibleField::from_items(vec![Collectible {
            id: 3,
            position: Position::new(140.0, 100.0),
            kind: CollectibleKind::Star,
            collected: false,
        }]);
        let result = advance_local(
            Position::new(100.0, 100.0),
            &holding(&["ArrowRight"]),
            &mut field,
            &config,
        );
        assert!(result.moved);
        assert_eq!(result.points, 50);
        assert_eq!(result.collected.len(), 1);

        let again = advance_local(result.position, &InputSampler::new(), &mut field, &config);
        assert_eq!(again.points, 0);
    }

    #[test]
    fn tick_gate_skips_fast_frames() {
        let mut gate = TickGate::new();
        assert!(gate.admit(0.0, 16.0));
        assert!(!gate.admit(8.0, 16.0));
        assert!(!gate.admit(15.9, 16.0));
        assert!(gate.admit(16.0, 16.0));
        assert!(gate.admit(40.0, 16.0));
    }

    // ================================================================
    // Property-based tests (proptest)
    // ================================================================

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        const KEYS: [&str; 8] = [
            "ArrowUp",
            "ArrowDown",
            "ArrowLeft",
            "ArrowRight",
            "KeyW",
            "KeyS",
            "KeyA",
            "KeyD",
        ];

        proptest! {
            #[test]
            fn position_stays_inside_margin(
                x in 20.0f32..=780.0,
                y in 20.0f32..=580.0,
                ticks in proptest::collection::vec(proptest::collection::vec(0usize..8, 0..4), 1..300),
            ) {
                let config = CollectConfig::default();
                let mut position = Position::new(x, y);
                for held in ticks {
                    let mut input = InputSampler::new();
                    for k in held {
                        input.on_key_down(KEYS[k]);
                    }
                    position = step_position(position, &input, &config);
                    prop_assert!((20.0..=780.0).contains(&position.x), "x={}", position.x);
                    prop_assert!((20.0..=580.0).contains(&position.y), "y={}", position.y);
                }
            }

            #[test]
            fn diagonal_covers_step_times_sqrt2(
                x in 30.0f32..770.0,
                y in 30.0f32..570.0,
                vertical in prop_oneof![Just("ArrowUp"), Just("KeyS")],
                horizontal in prop_oneof![Just("KeyA"), Just("ArrowRight")],
            ) {
                let config = CollectConfig::default();
                let mut input = InputSampler::new();
                input.on_key_down(vertical);
                input.on_key_down(horizontal);
                let start = Position::new(x, y);
                let next = step_position(start, &input, &config);
                let expected = config.step * std::f32::consts::SQRT_2;
                prop_assert!(
                    (start.distance(&next) - expected).abs() < 1e-3,
                    "moved {} expected {}",
                    start.distance(&next),
                    expected
                );
            }

            #[test]
            fn repeated_contact_scores_once(
                ticks in 1usize..50,
                dx in -10.0f32..10.0,
            ) {
                let config = CollectConfig::default();
                let mut field = CollectibleField::from_items(vec![Collectible {
                    id: 0,
                    position: Position::new(300.0 + dx, 300.0),
                    kind: CollectibleKind::Coin,
                    collected: false,
                }]);
                let mut total = 0;
                for _ in 0..ticks {
                    total += advance_local(
                        Position::new(300.0, 300.0),
                        &InputSampler::new(),
                        &mut field,
                        &config,
                    )
                    .points;
                }
                prop_assert_eq!(total, 10);
            }
        }
    }
}
