//! Page visibility and pickup detection
//!
//! Visibility is recomputed every gameplay frame from the renderer's
//! frustum test. Only pages visible this frame can be drawn or picked up.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::engine::{Ray, Spatial, Sphere};

/// Which page wins when one click ray hits several
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PickupResolution {
    /// Lowest placement index wins
    #[default]
    FirstMatch,
    /// Closest along the ray wins
    Nearest,
}

/// A collectible page
#[derive(Debug, Clone, PartialEq)]
pub struct Collectible {
    pub position: Vec3,
    pub bounds: Sphere,
    /// One-way: never reset once set
    pub collected: bool,
    /// Frustum result for the current frame
    pub visible: bool,
}

impl Collectible {
    pub fn new(position: Vec3, bounds: Sphere) -> Self {
        Self {
            position,
            bounds,
            collected: false,
            visible: false,
        }
    }

    /// Drawn and pickable this frame
    pub fn is_available(&self) -> bool {
        self.visible && !self.collected
    }
}

/// Recompute `visible` for every page. Collected pages are never visible.
/// Returns how many are visible.
pub fn update_visibility<S: Spatial + ?Sized>(items: &mut [Collectible], spatial: &S) -> usize {
    let mut count = 0;
    for item in items.iter_mut() {
        item.visible = !item.collected && spatial.sphere_in_frustum(&item.bounds);
        if item.visible {
            count += 1;
        }
    }
    count
}

/// Resolve one click. Marks at most one page collected and returns its index.
pub fn try_pickup<S: Spatial + ?Sized>(
    items: &mut [Collectible],
    ray: &Ray,
    ray_radius: f32,
    spatial: &S,
    resolution: PickupResolution,
) -> Option<usize> {
    let mut hits = items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.is_available())
        .filter(|(_, item)| spatial.ray_sphere_intersect(ray, ray_radius, &item.bounds));

    let index = match resolution {
        PickupResolution::FirstMatch => hits.next().map(|(i, _)| i),
        PickupResolution::Nearest => hits
            .min_by(|(_, a), (_, b)| {
                ray.project(a.bounds.center)
                    .partial_cmp(&ray.project(b.bounds.center))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(i, _)| i),
    }?;

    items[index].collected = true;
    items[index].visible = false;
    Some(index)
}
