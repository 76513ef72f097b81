use glam::DVec2;
use std::f64::consts::{FRAC_PI_2, TAU};

use crate::data::Location;
use crate::risk::{classify, RiskLevel};

/// Golden angle used by the scatter spiral, in degrees
const GOLDEN_ANGLE_DEG: f64 = 137.5;

/// Positioning algorithm for markers
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LayoutMode {
    #[default]
    Grid,
    Scatter,
    Cluster,
}

impl LayoutMode {
    pub const ALL: [LayoutMode; 3] = [LayoutMode::Grid, LayoutMode::Scatter, LayoutMode::Cluster];

    /// Cycle to the next mode
    pub fn next(self) -> Self {
        match self {
            LayoutMode::Grid => LayoutMode::Scatter,
            LayoutMode::Scatter => LayoutMode::Cluster,
            LayoutMode::Cluster => LayoutMode::Grid,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LayoutMode::Grid => "grid",
            LayoutMode::Scatter => "scatter",
            LayoutMode::Cluster => "cluster",
        }
    }
}

impl std::str::FromStr for LayoutMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "grid" => Ok(LayoutMode::Grid),
            "scatter" => Ok(LayoutMode::Scatter),
            "cluster" => Ok(LayoutMode::Cluster),
            other => Err(format!("unknown layout mode '{}'", other)),
        }
    }
}

/// Position of item `index` out of `total`, as percentages of the container
/// (x from the left edge, y from the top edge).
///
/// `level` is only consulted by the cluster layout. Returns `None` when
/// `index` is out of range, which covers `total == 0`.
pub fn position(index: usize, total: usize, mode: LayoutMode, level: RiskLevel) -> Option<DVec2> {
    if index >= total {
        return None;
    }

    let i = index as f64;
    let n = total as f64;

    let pos = match mode {
        LayoutMode::Grid => {
            let cols = (n.sqrt().ceil() as usize).max(1);
            let row = (index / cols) as f64;
            let col = (index % cols) as f64;
            let spacing = 80.0 / cols as f64;
            DVec2::new(10.0 + col * spacing, 15.0 + row * spacing)
        }
        LayoutMode::Scatter => {
            // Phyllotactic spiral: radius grows with sqrt(index) so area per point stays even
            let angle = (i * GOLDEN_ANGLE_DEG).to_radians();
            let radius = (i / n).sqrt() * 35.0;
            polar(angle, radius)
        }
        LayoutMode::Cluster => {
            let ring = level.ordinal() as f64;
            let angle = i * TAU / n + ring * FRAC_PI_2;
            let radius = 25.0 + ring * 10.0;
            polar(angle, radius)
        }
    };

    Some(pos)
}

/// Distance from the container center for the scatter layout
pub fn scatter_radius(index: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (index as f64 / total as f64).sqrt() * 35.0
}

/// Lay out a whole list; index `i` of the result belongs to `locations[i]`
pub fn layout(locations: &[Location], mode: LayoutMode) -> Vec<DVec2> {
    let total = locations.len();
    locations
        .iter()
        .enumerate()
        .filter_map(|(i, loc)| position(i, total, mode, classify(loc.risk_score)))
        .collect()
}

#[inline(always)]
fn polar(angle: f64, radius: f64) -> DVec2 {
    DVec2::new(50.0 + radius * angle.cos(), 50.0 + radius * angle.sin())
}
