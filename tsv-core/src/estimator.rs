//! Wrap-aware speed estimation on a periodic track
//!
//! Consecutive positions of a vehicle on the ring are turned into a signed
//! speed. A raw delta larger than half the ring can only come from crossing
//! the seam at zero, so it is folded onto the shortest signed arc.

/// Fold a raw positional delta onto the shortest signed arc of the ring.
///
/// The lower boundary is closed and the upper one open: a delta of exactly
/// `±extent / 2` is returned unchanged.
pub fn wrap_delta(prev: f64, curr: f64, extent: f64) -> f64 {
    debug_assert!(extent > 0.0, "ring extent must be positive, got {extent}");

    let half = extent / 2.0;
    let mut dx = curr - prev;
    if dx < -half {
        dx += extent;
    }
    if dx > half {
        dx -= extent;
    }
    dx
}

/// Speed in pixels per second of a vehicle that moved from `prev` to `curr`
/// during one tick.
///
/// `scale` converts model units to pixels, `rate` is ticks per second.
pub fn estimate(prev: f64, curr: f64, extent: f64, scale: f64, rate: f64) -> f64 {
    wrap_delta(prev, curr, extent) * scale * rate
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXTENT: f64 = 25.0;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn forward_motion_without_wrap() {
        assert_close(wrap_delta(5.0, 5.5, EXTENT), 0.5);
        assert_close(estimate(5.0, 5.5, EXTENT, 32.0, 10.0), 160.0);
    }

    #[test]
    fn crossing_zero_forward_is_unwrapped() {
        assert_close(wrap_delta(24.0, 1.0, EXTENT), 2.0);
    }

    #[test]
    fn crossing_zero_backward_is_unwrapped() {
        assert_close(wrap_delta(5.5, 24.7, EXTENT), -5.8);
        assert_close(estimate(5.5, 24.7, EXTENT, 32.0, 10.0), -1856.0);
    }

    #[test]
    fn half_ring_boundary_is_left_alone() {
        assert_close(wrap_delta(0.0, 12.5, EXTENT), 12.5);
        assert_close(wrap_delta(12.5, 0.0, EXTENT), -12.5);
    }

    #[test]
    fn just_past_half_ring_is_corrected() {
        assert_close(wrap_delta(0.0, 12.75, EXTENT), -12.25);
        assert_close(wrap_delta(12.75, 0.0, EXTENT), 12.25);
    }

    #[test]
    fn stationary_vehicle_has_zero_speed() {
        assert_close(estimate(7.25, 7.25, EXTENT, 32.0, 60.0), 0.0);
    }

    #[test]
    fn recovers_minimal_arc_across_the_ring() {
        // Quarter-unit steps keep the arithmetic exact.
        let arcs: [f64; 7] = [-12.25, -6.5, -0.25, 0.0, 0.25, 3.0, 12.25];
        let starts = [0.0, 0.25, 6.0, 12.5, 18.0, 24.75];
        for &start in &starts {
            for &arc in &arcs {
                let curr = (start + arc).rem_euclid(EXTENT);
                let got = estimate(start, curr, EXTENT, 32.0, 10.0);
                assert!(
                    (got - arc * 320.0).abs() < 1e-6,
                    "start {start}, arc {arc}: got {got}"
                );
            }
        }
    }
}
