use arena_core::participant::Position;

use crate::collectible::{Collectible, CollectibleField};

/// Dead zone per axis; inside it the bot stops pressing that axis.
const AXIS_DEAD_ZONE: f32 = 2.5;

/// Nearest uncollected item to `position`, if any remain.
pub fn nearest_target(position: Position, field: &CollectibleField) -> Option<&Collectible> {
    field.active().min_by(|a, b| {
        position
            .distance(&a.position)
            .total_cmp(&position.distance(&b.position))
    })
}

/// Key codes a bot holds this tick to steer toward the nearest collectible.
/// Empty once the field is cleared.
pub fn bot_keys(position: Position, field: &CollectibleField) -> Vec<&'static str> {
    let Some(target) = nearest_target(position, field) else {
        return Vec::new();
    };
    let mut keys = Vec::with_capacity(2);
    let dx = target.position.x - position.x;
    let dy = target.position.y - position.y;
    if dx > AXIS_DEAD_ZONE {
        keys.push("ArrowRight");
    } else if dx < -AXIS_DEAD_ZONE {
        keys.push("ArrowLeft");
    }
    if dy > AXIS_DEAD_ZONE {
        keys.push("ArrowDown");
    } else if dy < -AXIS_DEAD_ZONE {
        keys.push("ArrowUp");
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectible::CollectibleKind;

    fn field(points: &[(f32, f32)]) -> CollectibleField {
        CollectibleField::from_items(
            points
                .iter()
                .enumerate()
                .map(|(i, &(x, y))| Collectible {
                    id: i as u32,
                    position: Position::new(x, y),
                    kind: CollectibleKind::Coin,
                    collected: false,
                })
                .collect(),
        )
    }

    #[test]
    fn steers_toward_nearest() {
        let f = field(&[(500.0, 500.0), (120.0, 80.0)]);
        let keys = bot_keys(Position::new(100.0, 100.0), &f);
        assert_eq!(keys, vec!["ArrowRight", "ArrowUp"]);
        assert_eq!(nearest_target(Position::new(100.0, 100.0), &f).unwrap().id, 1);
    }

    #[test]
    fn idle_when_aligned_or_empty() {
        let f = field(&[(100.0, 100.0)]);
        assert!(bot_keys(Position::new(101.0, 99.0), &f).is_empty());
        assert!(bot_keys(Position::new(0.0, 0.0), &CollectibleField::default()).is_empty());
    }
}
