//! Terrain profiles
//!
//! A profile is a polyline across the whole field, left to right, with one
//! flat run of points marked as the landing pad. Generated profiles are a
//! bounded random walk; custom profiles come from a height plot.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{ALTITUDE_SPAN_M, SPAWN_ALTITUDE_M, TERRAIN_FLOOR};
use crate::consts::{MAX_ALTITUDE_M, MAX_HORIZONTAL_OFFSET_M, MIN_ALTITUDE_M};
use crate::settings::{ConfigError, Settings};

/// Rejected height plot
#[derive(Debug, Error, PartialEq)]
pub enum TerrainError {
    #[error("invalid height {0:?} in plot")]
    InvalidHeight(String),
    #[error("plot needs at least 2 points, got {0}")]
    TooFewPoints(usize),
    #[error("no flat run in the plot is wide enough for a {0} unit lander")]
    NoLandingPad(u32),
    #[error("pad height {0} leaves no room for the lander in the field")]
    PadTooHigh(f32),
    #[error("{points} points do not fit across a {field_width} unit field")]
    TooManyPoints { points: usize, field_width: u32 },
    #[error("terrain x coordinates must increase from 0 to the field width")]
    NotMonotonic,
}

/// The flat run of terrain points where a landing can be safe
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandingPad {
    /// Index of the first pad point
    pub start: usize,
    /// Index of the last pad point (inclusive)
    pub end: usize,
    pub x_start: f32,
    pub x_end: f32,
    pub height: f32,
}

impl LandingPad {
    pub fn width(&self) -> f32 {
        self.x_end - self.x_start
    }

    /// Whether the horizontal span `left..=right` lies fully on the pad
    pub fn contains_span(&self, left: f32, right: f32) -> bool {
        left >= self.x_start && right <= self.x_end
    }
}

/// Ground polyline for one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainProfile {
    points: Vec<Vec2>,
    pad: LandingPad,
    /// Height reported as altitude 0
    ground_zero: f32,
    /// Meters per world unit on the vertical axis
    altitude_scale: f32,
    field_width: f32,
    field_height: f32,
}

impl TerrainProfile {
    /// Generate a random profile with one flat landing pad
    pub fn generate<R: Rng>(settings: &Settings, rng: &mut R) -> Result<Self, ConfigError> {
        settings.validate()?;

        let n = settings.terrain_points;
        let xs = sample_xs(settings.field_width, n);
        let floor = TERRAIN_FLOOR;
        let max_height = settings.max_terrain_height();
        let steepness = settings.steepness;

        let pad_start = rng.random_range(0..n - settings.pad_size);
        let pad_end = pad_start + settings.pad_size;

        let mut height = floor + rng.random_range(0..max_height - floor);
        let mut points = Vec::with_capacity(n);

        for (i, &x) in xs.iter().enumerate() {
            points.push(Vec2::new(x, height as f32));

            // The walk stops for the pad intervals, so every pad point
            // shares the first pad point's height.
            if (pad_start..pad_end).contains(&i) || steepness == 0 {
                continue;
            }

            // Out-of-bounds steps bounce back instead of being re-rolled
            let delta = rng.random_range(-steepness..steepness);
            let next = height + delta;
            height = if next > floor && next < max_height {
                next
            } else {
                height - delta
            };
            height = height.clamp(floor, max_height);
        }

        let pad = LandingPad {
            start: pad_start,
            end: pad_end,
            x_start: points[pad_start].x,
            x_end: points[pad_end].x,
            height: points[pad_start].y,
        };

        let profile = Self::with_pad(points, pad, settings)
            .map_err(|_| ConfigError::FieldTooSmall {
                width: settings.field_width,
                height: settings.field_height,
                lander_height: settings.lander_height,
            })?;

        log::debug!(
            "Generated terrain: pad {}..={} at height {} (x {}..{})",
            pad.start,
            pad.end,
            pad.height,
            pad.x_start,
            pad.x_end
        );
        Ok(profile)
    }

    /// Build a profile from a height plot, spacing the points evenly across the field
    ///
    /// The widest flat run that fits the lander becomes the pad.
    pub fn from_plot(plot: &[i32], settings: &Settings) -> Result<Self, TerrainError> {
        if plot.len() < 2 {
            return Err(TerrainError::TooFewPoints(plot.len()));
        }
        // Every interval needs at least one unit or x stops increasing
        if plot.len() - 1 > settings.field_width as usize {
            return Err(TerrainError::TooManyPoints {
                points: plot.len(),
                field_width: settings.field_width,
            });
        }

        let xs = sample_xs(settings.field_width, plot.len());
        let points: Vec<Vec2> = xs
            .iter()
            .zip(plot)
            .map(|(&x, &h)| Vec2::new(x, h as f32))
            .collect();

        let pad = find_pad(&points, settings.lander_width as f32)
            .ok_or(TerrainError::NoLandingPad(settings.lander_width))?;

        Self::with_pad(points, pad, settings)
    }

    fn with_pad(points: Vec<Vec2>, pad: LandingPad, settings: &Settings) -> Result<Self, TerrainError> {
        let room = settings.field_height as f32 - pad.height - settings.lander_height as f32;
        if room <= 0.0 {
            return Err(TerrainError::PadTooHigh(pad.height));
        }

        let profile = Self {
            points,
            pad,
            ground_zero: pad.height,
            altitude_scale: ALTITUDE_SPAN_M / room,
            field_width: settings.field_width as f32,
            field_height: settings.field_height as f32,
        };
        profile.validate()?;
        Ok(profile)
    }

    /// Check invariants of a profile that did not come from this module (e.g. a save file)
    pub fn validate(&self) -> Result<(), TerrainError> {
        if self.points.len() < 2 {
            return Err(TerrainError::TooFewPoints(self.points.len()));
        }
        let first = self.points[0].x;
        let last = self.points[self.points.len() - 1].x;
        let increasing = self.points.windows(2).all(|w| w[1].x > w[0].x);
        if first != 0.0 || last != self.field_width || !increasing {
            return Err(TerrainError::NotMonotonic);
        }
        let pad_ok = self.pad.start < self.pad.end
            && self.pad.end < self.points.len()
            && self.points[self.pad.start..=self.pad.end]
                .iter()
                .all(|p| p.y == self.pad.height);
        if !pad_ok {
            return Err(TerrainError::NoLandingPad(0));
        }
        if !(self.altitude_scale > 0.0) {
            return Err(TerrainError::PadTooHigh(self.pad.height));
        }
        Ok(())
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn pad(&self) -> &LandingPad {
        &self.pad
    }

    pub fn ground_zero(&self) -> f32 {
        self.ground_zero
    }

    pub fn altitude_scale(&self) -> f32 {
        self.altitude_scale
    }

    pub fn field_width(&self) -> f32 {
        self.field_width
    }

    pub fn field_height(&self) -> f32 {
        self.field_height
    }

    /// Heights of every point, as a plot
    pub fn plot(&self) -> Vec<i32> {
        self.points.iter().map(|p| p.y.round() as i32).collect()
    }

    /// Where a fresh lander appears: field center, spawn altitude above ground zero
    pub fn spawn_position(&self) -> Vec2 {
        Vec2::new(
            self.field_width / 2.0,
            SPAWN_ALTITUDE_M / self.altitude_scale + self.ground_zero,
        )
    }

    /// Altitude in meters above ground zero
    pub fn altitude_m(&self, y: f32) -> f32 {
        (y - self.ground_zero) * self.altitude_scale
    }

    /// Horizontal distance in meters from the field center
    pub fn horizontal_offset_m(&self, x: f32) -> f32 {
        (x - self.field_width / 2.0) * (self.altitude_scale / 2.0)
    }

    /// Whether the lander has left the playable volume
    pub fn is_out_of_range(&self, pos: Vec2) -> bool {
        let altitude = self.altitude_m(pos.y);
        altitude > MAX_ALTITUDE_M
            || altitude < MIN_ALTITUDE_M
            || self.horizontal_offset_m(pos.x).abs() > MAX_HORIZONTAL_OFFSET_M
    }
}

/// X coordinates for `n` points across `width`; the remainder is spread so the
/// last point lands exactly on `width`
fn sample_xs(width: u32, n: usize) -> Vec<f32> {
    let intervals = (n - 1) as u32;
    let inc = width / intervals;
    let extra = width % intervals;
    (0..n as u32)
        .map(|i| (i * inc + i * extra / intervals) as f32)
        .collect()
}

/// Widest run of equal-height points spanning at least `min_width`
fn find_pad(points: &[Vec2], min_width: f32) -> Option<LandingPad> {
    let mut best: Option<LandingPad> = None;
    let mut start = 0;

    for i in 1..=points.len() {
        let run_continues = i < points.len() && points[i].y == points[start].y;
        if run_continues {
            continue;
        }
        let end = i - 1;
        if end > start {
            let pad = LandingPad {
                start,
                end,
                x_start: points[start].x,
                x_end: points[end].x,
                height: points[start].y,
            };
            let wider = best.is_none_or(|b| pad.width() > b.width());
            if pad.width() >= min_width && wider {
                best = Some(pad);
            }
        }
        start = i;
    }

    best
}

/// Parse a space-separated height plot such as `"40 52 52 52 30"`
pub fn parse_plot(s: &str) -> Result<Vec<i32>, TerrainError> {
    let plot = s
        .split_whitespace()
        .map(|h| h.parse::<i32>().map_err(|_| TerrainError::InvalidHeight(h.to_string())))
        .collect::<Result<Vec<_>, _>>()?;
    if plot.len() < 2 {
        return Err(TerrainError::TooFewPoints(plot.len()));
    }
    Ok(plot)
}

/// Format a height plot as space-separated integers
pub fn format_plot(plot: &[i32]) -> String {
    plot.iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
