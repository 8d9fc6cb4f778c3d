//! Merging overlapping droplets.
//!
//! The reduction is first-match and single-pass: a new droplet merges with at most the first
//! droplet it overlaps, and the merged droplet is not checked against the rest of the collection.
//! When three or more droplets overlap, some may stay separate until a later frame.

use super::{Droplet, area, radius};


fn square(x: f64) -> f64 {
    x * x
}

/// Whether two droplets touch, intersect, or one contains the other
///
/// Compares the squared centre distance against the squared difference and sum of the radii, so
/// no square root is taken. Symmetric.
pub fn overlapping(a: &Droplet, b: &Droplet) -> bool {
    let dist_sq = square(a.x - b.x) + square(a.y - b.y);
    square(a.r - b.r) <= dist_sq && dist_sq <= square(a.r + b.r)
}

/// Combine two droplets into one with their combined area
///
/// The position is the midpoint of the two centres and the acceleration is the mean of the two
/// accelerations, a missing acceleration counting as zero.
pub fn merge(a: &Droplet, b: &Droplet) -> Droplet {
    Droplet {
        x: (a.x + b.x) / 2.0,
        y: (a.y + b.y) / 2.0,
        r: radius(area(a.r) + area(b.r)),
        g: Some((a.g.unwrap_or(0.0) + b.g.unwrap_or(0.0)) / 2.0),
    }
}

/// Add `droplet` to `droplets`, merging it into the first droplet it overlaps
///
/// If it overlaps none, it is appended. Shaped for use with [`Iterator::fold`].
pub fn reduce(mut droplets: Vec<Droplet>, droplet: Droplet) -> Vec<Droplet> {
    match droplets.iter().position(|d| overlapping(&droplet, d)) {
        Some(i) => droplets[i] = merge(&droplet, &droplets[i]),
        None => droplets.push(droplet),
    }
    droplets
}

/// Fold [`reduce`] over `droplets`, starting from nothing
pub fn reduce_all<I>(droplets: I) -> Vec<Droplet>
where
    I: IntoIterator<Item = Droplet>,
{
    droplets.into_iter().fold(Vec::new(), reduce)
}
