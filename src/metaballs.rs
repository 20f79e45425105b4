//! Procedural metaball layout and animation.
//!
//! Anchors live in normalized percentage space: positions around the 50%/50%
//! canvas center, radii in canvas-relative units. Everything here is a pure
//! function of its inputs; the refresh loop owns the clock.

use crate::rng::rand;

/// Canvas center in percentage space.
const CENTER: f64 = 50.0;
/// Derived radius range, normalized units.
const RADIUS_MIN: f64 = 20.0;
const RADIUS_MAX: f64 = 80.0;
/// Orbit amplitude around the anchor, normalized units. Fixed regardless of
/// spread so circles orbit rather than drift.
const JITTER_AMPLITUDE: f64 = 5.0;

/// One derived metaball slot. Regenerated wholesale whenever the deriving
/// inputs change; never patched incrementally.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct MetaballAnchor {
    pub index: u32,
    pub base_x: f64,
    pub base_y: f64,
    pub radius: f64,
    pub phase: f64,
    pub speed_factor: f64,
}

/// Derive the full anchor set for `(num_metaballs, metaball_spread, noise_seed)`.
///
/// Four decorrelated draws per anchor, seeded as `seed * K + index` for
/// K in {100, 200, 300, 400}. The speed factor reuses the fourth draw, so
/// each anchor consumes exactly four draws in index order.
pub fn derive_anchors(num_metaballs: u32, metaball_spread: f64, noise_seed: u32) -> Vec<MetaballAnchor> {
    let seed = f64::from(noise_seed);
    (0..num_metaballs)
        .map(|index| {
            let i = f64::from(index);
            let dx = rand(seed * 100.0 + i);
            let dy = rand(seed * 200.0 + i);
            let dr = rand(seed * 300.0 + i);
            let dp = rand(seed * 400.0 + i);

            MetaballAnchor {
                index,
                base_x: CENTER + (dx - 0.5) * metaball_spread,
                base_y: CENTER + (dy - 0.5) * metaball_spread,
                radius: RADIUS_MIN + dr * (RADIUS_MAX - RADIUS_MIN),
                phase: dp * std::f64::consts::TAU,
                speed_factor: 0.5 + dp * 0.5,
            }
        })
        .collect()
}

/// The anchor's position at `clock_time`, orbiting its base point.
pub fn animated_position(anchor: &MetaballAnchor, clock_time: f64) -> (f64, f64) {
    let angle = clock_time * anchor.speed_factor + anchor.phase;
    (
        anchor.base_x + angle.sin() * JITTER_AMPLITUDE,
        anchor.base_y + angle.cos() * JITTER_AMPLITUDE,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_count_yields_no_anchors() {
        assert!(derive_anchors(0, 40.0, 1).is_empty());
    }

    #[test]
    fn derivation_is_idempotent() {
        let a = derive_anchors(8, 30.0, 7);
        let b = derive_anchors(8, 30.0, 7);
        assert_eq!(a, b);
    }

    #[test]
    fn anchors_ordered_by_index() {
        let anchors = derive_anchors(5, 40.0, 3);
        for (i, a) in anchors.iter().enumerate() {
            assert_eq!(a.index as usize, i);
        }
    }

    #[test]
    fn base_positions_bounded_by_half_spread() {
        let spread = 40.0;
        for a in derive_anchors(5, spread, 1) {
            assert!(
                (a.base_x - CENTER).abs() <= spread / 2.0,
                "base_x {} outside spread bound",
                a.base_x
            );
            assert!(
                (a.base_y - CENTER).abs() <= spread / 2.0,
                "base_y {} outside spread bound",
                a.base_y
            );
        }
    }

    #[test]
    fn derived_ranges_hold() {
        for a in derive_anchors(20, 60.0, 11) {
            assert!((RADIUS_MIN..=RADIUS_MAX).contains(&a.radius));
            assert!((0.0..std::f64::consts::TAU).contains(&a.phase));
            assert!((0.5..=1.0).contains(&a.speed_factor));
        }
    }

    #[test]
    fn shrinking_count_keeps_prefix_stable() {
        // The draw order is per-index, so the first N anchors must not move
        // when the count changes.
        let five = derive_anchors(5, 40.0, 9);
        let three = derive_anchors(3, 40.0, 9);
        assert_eq!(&five[..3], &three[..]);
    }

    #[test]
    fn different_seeds_move_anchors() {
        let a = derive_anchors(4, 40.0, 1);
        let b = derive_anchors(4, 40.0, 2);
        assert_ne!(a, b);
    }

    #[test]
    fn animated_position_orbits_at_fixed_amplitude() {
        let anchor = derive_anchors(1, 40.0, 5)[0];
        let (x, y) = animated_position(&anchor, 123.4);
        let dx = x - anchor.base_x;
        let dy = y - anchor.base_y;
        let dist = (dx * dx + dy * dy).sqrt();
        assert!(
            (dist - JITTER_AMPLITUDE).abs() < 1e-9,
            "orbit radius {dist} != jitter amplitude"
        );
    }
}
