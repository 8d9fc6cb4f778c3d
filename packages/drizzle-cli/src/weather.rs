//! Where new droplets come from and when.

use crate::config::{DisplayConfig, RainConfig};
use drizzle::{droplet::Droplet, pipeline::DropletFactory};
use rand::prelude::*;
use rand_pcg::Pcg32;
use std::time::Duration;


fn new_rng(seed: Option<u64>) -> Pcg32 {
    match seed {
        Some(seed) => Pcg32::seed_from_u64(seed),
        None => Pcg32::from_entropy(),
    }
}

/// Droplets at uniformly random positions on the pane with a random whole radius
#[derive(Debug, Clone)]
pub struct RandomDroplets {
    rng: Pcg32,
    width: f64,
    height: f64,
    min_radius: u32,
    max_radius: u32,
}

impl RandomDroplets {
    pub fn new(rain: &RainConfig, display: &DisplayConfig) -> Self {
        RandomDroplets {
            rng: new_rng(rain.seed),
            width: display.width,
            height: display.height,
            min_radius: rain.min_radius,
            max_radius: rain.max_radius,
        }
    }
}

impl DropletFactory for RandomDroplets {
    fn next_droplet(&mut self) -> Droplet {
        let x = self.rng.gen_range(0.0..self.width);
        let y = self.rng.gen_range(0.0..self.height);
        let r = self.rng.gen_range(self.min_radius..=self.max_radius);
        Droplet::new(x, y, r as f64)
    }
}

/// Delay selector picking a random multiple of `interval_step_ms` each time it is called
///
/// Zero is one of the multiples, so some droplets arrive together. A
/// [validated](crate::config::Config::validate) config never makes every delay zero.
///
/// Uses its own rng, offset from the droplet seed so the two streams differ.
pub fn jittered_delay(rain: &RainConfig) -> impl FnMut() -> Duration + Send + 'static {
    let mut rng = new_rng(rain.seed.map(|seed| seed.wrapping_add(1)));
    let step = rain.interval_step_ms;
    let steps = rain.interval_steps;
    move || Duration::from_millis(step * rng.gen_range(0..steps) as u64)
}
