//! Ground contact detection
//!
//! The lander is a horizontal footprint `[x - half_width, x + half_width]`
//! whose bottom edge sits at `pos.y`. Terrain is sorted by x, so one
//! left-to-right pass over the segments finds everything under the footprint.

use glam::Vec2;

use super::terrain::TerrainProfile;
use crate::interpolate_height;

/// Tolerance (world units) for touching a terrain vertex under the footprint
const VERTEX_CONTACT_TOLERANCE: f32 = 1.0;

/// Result of a contact check
#[derive(Debug, Clone, PartialEq)]
pub struct ContactResult {
    /// Whether the lander touched the ground this tick
    pub touched: bool,
    /// Ground height under the lander's center, if the center is over the field
    pub ground_at_center: Option<f32>,
    /// Ground points under the footprint: interior vertices plus the
    /// interpolated (rounded) heights at both footprint edges
    pub samples: Vec<Vec2>,
}

impl ContactResult {
    pub fn miss() -> Self {
        Self {
            touched: false,
            ground_at_center: None,
            samples: Vec::new(),
        }
    }

    /// True when every ground sample under the footprint has the same integer height
    pub fn landed_flat(&self) -> bool {
        let mut heights = self.samples.iter().map(|p| p.y.round() as i32);
        match heights.next() {
            Some(first) => heights.all(|h| h == first),
            None => true,
        }
    }
}

/// Check the lander footprint against the terrain
pub fn resolve_contact(pos: Vec2, half_width: f32, terrain: &TerrainProfile) -> ContactResult {
    let left = pos.x - half_width;
    let right = pos.x + half_width;
    let points = terrain.points();

    let mut result = ContactResult::miss();

    for (i, &p) in points.iter().enumerate() {
        if right < p.x {
            break;
        }

        if left < p.x && p.x < right {
            result.samples.push(p);
            if pos.y <= p.y + VERTEX_CONTACT_TOLERANCE {
                result.touched = true;
            }
        }

        let Some(&next) = points.get(i + 1) else {
            continue;
        };

        if p.x <= left && left <= next.x {
            let ground = interpolate_height(p, next, left);
            result.samples.push(Vec2::new(left, ground.round()));
            if pos.y <= ground {
                result.touched = true;
            }
        }

        if p.x <= pos.x && pos.x <= next.x && result.ground_at_center.is_none() {
            result.ground_at_center = Some(interpolate_height(p, next, pos.x).round());
        }

        if p.x <= right && right <= next.x {
            let ground = interpolate_height(p, next, right);
            result.samples.push(Vec2::new(right, ground.round()));
            if pos.y <= ground {
                result.touched = true;
            }
        }
    }

    if pos.y <= 0.0 {
        result.touched = true;
    }

    result
}
