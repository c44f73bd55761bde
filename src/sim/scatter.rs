//! One-time procedural placement of pages, trees and the stalker
//!
//! Positions are sampled on the integer grid of a square region so that
//! "lands on zero" and "lands on the same coordinate" are exact tests.
//! How coincident samples are resolved is a pluggable [`OverlapResolution`].

use glam::{Vec2, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::engine::Sphere;
use crate::{ground, lift};

/// How degenerate or overlapping samples are corrected
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum OverlapResolution {
    /// Nudge an axis by `nudge` if it is zero or equals the same-index
    /// entity of an earlier class. Cheap, but only compares index i with
    /// index i, so two entities can still coincide.
    IndexAligned,
    /// Resample until the point keeps `min_separation` on the ground plane
    /// from the origin and from every earlier placement. After
    /// `max_attempts` failures the last sample is kept.
    RejectAll { min_separation: f32, max_attempts: u32 },
}

/// Inputs to [`scatter`]
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterParams {
    pub item_count: usize,
    pub obstacle_count: usize,
    /// Samples are drawn from [-half_width, half_width] on both axes
    pub half_width: i32,
    pub item_height: f32,
    pub obstacle_height: f32,
    pub antagonist_height: f32,
    /// Offset applied by `IndexAligned` correction
    pub nudge: f32,
    pub resolution: OverlapResolution,
}

/// Where everything starts
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub antagonist: Vec3,
    pub items: Vec<Vec3>,
    pub obstacles: Vec<Vec3>,
}

impl Placement {
    /// Every placed position, antagonist first
    pub fn all(&self) -> impl Iterator<Item = Vec3> + '_ {
        std::iter::once(self.antagonist)
            .chain(self.items.iter().copied())
            .chain(self.obstacles.iter().copied())
    }
}

/// Scatter the antagonist, then the items, then the obstacles
pub fn scatter<R: Rng>(params: &ScatterParams, rng: &mut R) -> Placement {
    match params.resolution {
        OverlapResolution::IndexAligned => scatter_index_aligned(params, rng),
        OverlapResolution::RejectAll {
            min_separation,
            max_attempts,
        } => scatter_rejecting(params, rng, min_separation, max_attempts),
    }
}

fn sample<R: Rng>(rng: &mut R, half_width: i32) -> Vec2 {
    let x = rng.random_range(-half_width..=half_width);
    let z = rng.random_range(-half_width..=half_width);
    Vec2::new(x as f32, z as f32)
}

/// Nudge a coordinate once if it is zero or matches any of `others`
fn nudge_axis(value: f32, others: &[f32], nudge: f32) -> f32 {
    if value == 0.0 || others.contains(&value) {
        value + nudge
    } else {
        value
    }
}

fn scatter_index_aligned<R: Rng>(params: &ScatterParams, rng: &mut R) -> Placement {
    let nudge = params.nudge;

    let p = sample(rng, params.half_width);
    let antagonist = Vec2::new(nudge_axis(p.x, &[], nudge), nudge_axis(p.y, &[], nudge));

    // Only index 0 has an antagonist to compare against
    let antagonist_at = |i: usize| (i == 0).then_some(antagonist);

    let mut items = Vec::with_capacity(params.item_count);
    for i in 0..params.item_count {
        let p = sample(rng, params.half_width);
        let earlier: Vec<Vec2> = antagonist_at(i).into_iter().collect();
        items.push(correct(p, &earlier, nudge));
    }

    let mut obstacles = Vec::with_capacity(params.obstacle_count);
    for i in 0..params.obstacle_count {
        let p = sample(rng, params.half_width);
        let earlier: Vec<Vec2> = items
            .get(i)
            .copied()
            .into_iter()
            .chain(antagonist_at(i))
            .collect();
        obstacles.push(correct(p, &earlier, nudge));
    }

    Placement {
        antagonist: lift(antagonist, params.antagonist_height),
        items: items
            .into_iter()
            .map(|p| lift(p, params.item_height))
            .collect(),
        obstacles: obstacles
            .into_iter()
            .map(|p| lift(p, params.obstacle_height))
            .collect(),
    }
}

fn correct(p: Vec2, earlier: &[Vec2], nudge: f32) -> Vec2 {
    let xs: Vec<f32> = earlier.iter().map(|e| e.x).collect();
    let zs: Vec<f32> = earlier.iter().map(|e| e.y).collect();
    Vec2::new(nudge_axis(p.x, &xs, nudge), nudge_axis(p.y, &zs, nudge))
}

fn scatter_rejecting<R: Rng>(
    params: &ScatterParams,
    rng: &mut R,
    min_separation: f32,
    max_attempts: u32,
) -> Placement {
    let mut placed: Vec<Vec2> = Vec::with_capacity(1 + params.item_count + params.obstacle_count);

    let mut place = |rng: &mut R| -> Vec2 {
        let mut candidate = sample(rng, params.half_width);
        let mut attempts = 1;
        while !is_clear(candidate, &placed, min_separation) {
            if attempts >= max_attempts {
                log::warn!(
                    "Placement gave up after {} attempts, keeping ({}, {})",
                    attempts,
                    candidate.x,
                    candidate.y
                );
                break;
            }
            candidate = sample(rng, params.half_width);
            attempts += 1;
        }
        placed.push(candidate);
        candidate
    };

    let antagonist = place(rng);
    let items: Vec<Vec2> = (0..params.item_count).map(|_| place(rng)).collect();
    let obstacles: Vec<Vec2> = (0..params.obstacle_count).map(|_| place(rng)).collect();

    Placement {
        antagonist: lift(antagonist, params.antagonist_height),
        items: items
            .into_iter()
            .map(|p| lift(p, params.item_height))
            .collect(),
        obstacles: obstacles
            .into_iter()
            .map(|p| lift(p, params.obstacle_height))
            .collect(),
    }
}

fn is_clear(candidate: Vec2, placed: &[Vec2], min_separation: f32) -> bool {
    candidate.length() >= min_separation
        && placed
            .iter()
            .all(|p| p.distance(candidate) >= min_separation)
}

/// Model bounds scaled to world size and centred on `position`
pub fn bounding_sphere(model_bounds: &Sphere, scale: f32, position: Vec3) -> Sphere {
    Sphere::new(position, model_bounds.radius * scale)
}

/// Ground-plane distance between two placements
pub fn ground_distance(a: Vec3, b: Vec3) -> f32 {
    ground(a).distance(ground(b))
}
