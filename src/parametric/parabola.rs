//! Parabolic ground path: a cubic Bezier curve between two tiles,
//! lofted to `min_height` at its apex, advanced by arc-length-ish speed
//! steps rather than solved analytically.

/// Advances a `(x, y, height)` arc from `start` to `end` over `t in [0, 1]`.
pub struct ParabolaPlanner {
    start: (f64, f64),
    end: (f64, f64),
    control_a: (f64, f64),
    control_b: (f64, f64),
    min_height: f64,
    ground_distance: f64,
    t: f64,
}

impl ParabolaPlanner {
    pub fn new(start: (f64, f64), end: (f64, f64), min_height: f64) -> Self {
        let mid = ((start.0 + end.0) / 2.0, (start.1 + end.1) / 2.0);
        let control_a = (
            start.0 + (mid.0 - start.0) * 0.5,
            start.1 + (mid.1 - start.1) * 0.5,
        );
        let control_b = (end.0 + (mid.0 - end.0) * 0.5, end.1 + (mid.1 - end.1) * 0.5);
        let ground_distance = ((end.0 - start.0).powi(2) + (end.1 - start.1).powi(2))
            .sqrt()
            .max(1.0);
        Self {
            start,
            end,
            control_a,
            control_b,
            min_height,
            ground_distance,
            t: 0.0,
        }
    }

    fn ground_position(&self, t: f64) -> (f64, f64) {
        let u = 1.0 - t;
        let x = u.powi(3) * self.start.0
            + 3.0 * u.powi(2) * t * self.control_a.0
            + 3.0 * u * t.powi(2) * self.control_b.0
            + t.powi(3) * self.end.0;
        let y = u.powi(3) * self.start.1
            + 3.0 * u.powi(2) * t * self.control_a.1
            + 3.0 * u * t.powi(2) * self.control_b.1
            + t.powi(3) * self.end.1;
        (x, y)
    }

    fn height(&self, t: f64) -> f64 {
        4.0 * self.min_height * t * (1.0 - t)
    }

    /// Advances the arc by `speed` ground-distance units and returns the new
    /// `(x, y, height)`, or `None` once the arc has landed. `speed` is
    /// converted to a `Δt` bounded by the straight-line start-end distance,
    /// so a unit speed samples the arc over several calls instead of jumping
    /// straight to landing.
    pub fn advance(&mut self, speed: f64) -> Option<(f64, f64, f64)> {
        if self.t >= 1.0 {
            return None;
        }
        let dt = speed / self.ground_distance;
        self.t = (self.t + dt).min(1.0);
        let (x, y) = self.ground_position(self.t);
        Some((x, y, self.height(self.t)))
    }

    pub fn is_done(&self) -> bool {
        self.t >= 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn height_is_zero_at_both_ends_and_peaks_at_midpoint() {
        let mut planner = ParabolaPlanner::new((0.0, 0.0), (10.0, 0.0), 5.0);
        assert_eq!(planner.height(0.0), 0.0);
        assert_eq!(planner.height(1.0), 0.0);
        assert_eq!(planner.height(0.5), 5.0);
        let _ = planner.advance(0.1);
    }

    #[test]
    fn advance_reaches_end_position() {
        let mut planner = ParabolaPlanner::new((0.0, 0.0), (10.0, 10.0), 3.0);
        let mut last = None;
        while let Some(p) = planner.advance(0.2) {
            last = Some(p);
        }
        let (x, y, h) = last.unwrap();
        assert!((x - 10.0).abs() < 1e-9);
        assert!((y - 10.0).abs() < 1e-9);
        assert!((h - 0.0).abs() < 1e-9);
        assert!(planner.is_done());
    }
}
