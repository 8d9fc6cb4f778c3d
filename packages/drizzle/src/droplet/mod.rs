//! Droplets, their physics, and how they merge.

pub mod merge;

use std::f64::consts::PI;


/// Default gravitational constant, in pixels per frame squared
pub const GRAVITY: f64 = 0.005;


/// A circular droplet on the pane
///
/// `g` is the droplet's current downward acceleration per frame. A droplet that has never fallen
/// has none (or zero, which is what merging two such droplets gives), and falls with the
/// gravitational constant.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Droplet {
    /// Horizontal position of the centre
    pub x: f64,
    /// Vertical position of the centre, growing downwards
    pub y: f64,
    /// Radius
    pub r: f64,
    /// Downward acceleration
    pub g: Option<f64>,
}

impl Droplet {
    /// Construct a droplet that has not started falling.
    pub fn new(x: f64, y: f64, r: f64) -> Self {
        Droplet { x, y, r, g: None }
    }

    /// Ownership-chaining setter for the acceleration.
    pub fn with_accel(mut self, g: f64) -> Self {
        self.g = Some(g);
        self
    }

    /// Area of the droplet's circle.
    pub fn area(&self) -> f64 {
        area(self.r)
    }

    /// Advance one frame with gravitational constant `k`.
    ///
    /// Moves down by the current acceleration, then grows the acceleration by `k * r`, so larger
    /// droplets speed up faster. `x` and `r` are unchanged.
    pub fn fall(&self, k: f64) -> Droplet {
        let g = self.g.filter(|&g| g != 0.0).unwrap_or(k);
        let dg = k * self.r;
        Droplet {
            y: self.y + g,
            g: Some(g + dg),
            ..*self
        }
    }
}

// area of a circle of radius r.
pub(crate) fn area(r: f64) -> f64 {
    PI * r * r
}

// radius of a circle of the given area.
pub(crate) fn radius(area: f64) -> f64 {
    (area / PI).sqrt()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fall_uses_gravity_when_at_rest() {
        let d = Droplet::new(3.0, 10.0, 4.0).fall(GRAVITY);
        assert_eq!(d.x, 3.0);
        assert_eq!(d.r, 4.0);
        assert!((d.y - 10.005).abs() < 1e-12);
        assert!((d.g.unwrap() - (0.005 + 0.02)).abs() < 1e-12);
    }

    #[test]
    fn fall_accelerates() {
        let mut d = Droplet::new(0.0, 0.0, 2.0);
        let mut prev_step = 0.0;
        for _ in 0..10 {
            let next = d.fall(GRAVITY);
            let step = next.y - d.y;
            assert!(step > prev_step);
            prev_step = step;
            d = next;
        }
    }

    #[test]
    fn fall_keeps_existing_accel() {
        let d = Droplet::new(0.0, 1.0, 1.0).with_accel(0.5).fall(0.1);
        assert!((d.y - 1.5).abs() < 1e-12);
        assert!((d.g.unwrap() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn fall_treats_zero_accel_as_at_rest() {
        let d = Droplet::new(0.0, 0.0, 1.0).with_accel(0.0).fall(0.5);
        assert_eq!(d, Droplet::new(0.0, 0.5, 1.0).with_accel(1.0));
    }

    #[test]
    fn area_and_radius_invert() {
        for r in [0.5, 1.0, 2.0, 7.0] {
            assert!((radius(area(r)) - r).abs() < 1e-12);
        }
    }
}
