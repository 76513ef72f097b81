use crate::braille::BrailleCanvas;
use crate::data::LocationId;
use crate::map::geometry::{draw_line_stepped, draw_ring};
use crate::map::layout::LayoutMode;
use crate::map::projection::Viewport;
use crate::risk::{RiskLevel, Rgb};
use crate::view::Marker;

/// Display settings for map layers
#[derive(Clone, Debug)]
pub struct DisplaySettings {
    pub show_grid: bool,
    pub show_guides: bool,
    pub show_labels: bool,
    /// Color markers with the continuous gradient instead of the flat level color
    pub gradient_markers: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_grid: true,
            show_guides: true,
            show_labels: true,
            gradient_markers: true,
        }
    }
}

/// A marker glyph placed on a character cell
#[derive(Clone, Debug, PartialEq)]
pub struct MarkerGlyph {
    pub id: LocationId,
    pub col: u16,
    pub row: u16,
    pub glyph: char,
    pub color: Rgb,
    pub label: Option<String>,
    pub selected: bool,
    pub hovered: bool,
    pub z_order: f64,
}

/// Rendered layers, drawn back to front by the UI
pub struct MapLayers {
    /// Background grid overlay
    pub grid: BrailleCanvas,
    /// Cluster guide rings
    pub guides: BrailleCanvas,
    /// Pulse rings, indexed by `RiskLevel::ordinal`
    pub pulses: [BrailleCanvas; 4],
    /// Marker glyphs sorted by ascending z-order
    pub markers: Vec<MarkerGlyph>,
}

/// Turns view markers into drawable layers
pub struct MapRenderer {
    pub settings: DisplaySettings,
}

/// Longest label drawn next to a marker
const MAX_LABEL: usize = 24;

impl MapRenderer {
    pub fn new() -> Self {
        Self {
            settings: DisplaySettings::default(),
        }
    }

    /// Render markers for a map area of `cols` x `rows` characters
    pub fn render(
        &self,
        markers: &[Marker<'_>],
        mode: LayoutMode,
        cols: usize,
        rows: usize,
        frame: u64,
    ) -> MapLayers {
        let viewport = Viewport::for_cells(cols, rows);
        let mut layers = MapLayers {
            grid: BrailleCanvas::new(cols, rows),
            guides: BrailleCanvas::new(cols, rows),
            pulses: std::array::from_fn(|_| BrailleCanvas::new(cols, rows)),
            markers: Vec::with_capacity(markers.len()),
        };

        if self.settings.show_grid {
            draw_grid(&mut layers.grid, &viewport);
        }

        if self.settings.show_guides && mode == LayoutMode::Cluster {
            let (cx, cy) = viewport.project(glam::DVec2::new(50.0, 50.0));
            for level in RiskLevel::ALL {
                let radius = 25.0 + level.ordinal() as f64 * 10.0;
                draw_ring(&mut layers.guides, cx, cy, viewport.scale_radius(radius));
            }
        }

        for marker in markers {
            let (px, py) = viewport.project(marker.position);
            let (px, py) = viewport.clip(px, py);

            if marker.pulsing {
                // Ring grows over 4 phases then restarts
                let phase = ((frame / 6) % 4) as i32;
                let canvas = &mut layers.pulses[marker.level.ordinal()];
                draw_ring(canvas, px, py, 2 + phase * 2);
            }

            let glyph = if marker.selected {
                '◉'
            } else if marker.hovered {
                '◎'
            } else {
                '●'
            };

            let show_label = self.settings.show_labels || marker.selected || marker.hovered;
            let label = show_label.then(|| marker.location.name.chars().take(MAX_LABEL).collect());

            layers.markers.push(MarkerGlyph {
                id: marker.location.id.clone(),
                col: (px / 2) as u16,
                row: (py / 4) as u16,
                glyph,
                color: if self.settings.gradient_markers {
                    marker.gradient_color.to_rgb()
                } else {
                    marker.flat_color
                },
                label,
                selected: marker.selected,
                hovered: marker.hovered,
                z_order: marker.z_order,
            });
        }

        layers
            .markers
            .sort_by(|a, b| a.z_order.partial_cmp(&b.z_order).unwrap_or(std::cmp::Ordering::Equal));

        layers
    }

    /// Marker under a character cell, preferring the one drawn on top.
    /// A one-cell margin around each glyph counts as a hit.
    pub fn hit_test<'a>(&self, layers: &'a MapLayers, col: u16, row: u16) -> Option<&'a LocationId> {
        layers
            .markers
            .iter()
            .rev()
            .filter(|m| m.row == row && m.col.abs_diff(col) <= 1)
            .map(|m| &m.id)
            .next()
    }

    pub fn toggle_grid(&mut self) {
        self.settings.show_grid = !self.settings.show_grid;
    }

    pub fn toggle_labels(&mut self) {
        self.settings.show_labels = !self.settings.show_labels;
    }

    pub fn toggle_gradient(&mut self) {
        self.settings.gradient_markers = !self.settings.gradient_markers;
    }
}

impl Default for MapRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Dotted lines every 10% of the container
fn draw_grid(canvas: &mut BrailleCanvas, viewport: &Viewport) {
    let w = viewport.width as i32;
    let h = viewport.height as i32;
    if w == 0 || h == 0 {
        return;
    }
    for step in 1..10 {
        let x = w * step / 10;
        let y = h * step / 10;
        draw_line_stepped(canvas, x, 0, x, h - 1, 4);
        draw_line_stepped(canvas, 0, y, w - 1, y, 4);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Location;
    use crate::view::{RiskMapView, ViewConfig};

    fn view() -> RiskMapView {
        RiskMapView::new(
            vec![
                Location::new("OR1", "Operating Room 1", 45.0),
                Location::new("OR3", "Operating Room 3", 89.0),
                Location::new("ICU1", "ICU Room 1", 34.0),
            ],
            ViewConfig::default(),
        )
    }

    #[test]
    fn test_render_places_all_markers() {
        let view = view();
        let renderer = MapRenderer::new();
        let layers = renderer.render(&view.markers(), view.state().layout_mode, 40, 20, 0);
        assert_eq!(layers.markers.len(), 3);
        assert!(layers.markers.iter().all(|m| m.col < 40 && m.row < 20));
        // Sorted back to front by score
        assert_eq!(layers.markers.last().unwrap().id.as_str(), "OR3");
    }

    #[test]
    fn test_selected_marker_on_top() {
        let mut view = view();
        view.click(LocationId::from("ICU1"));
        let layers = MapRenderer::new().render(&view.markers(), LayoutMode::Grid, 40, 20, 0);
        let top = layers.markers.last().unwrap();
        assert_eq!(top.id.as_str(), "ICU1");
        assert_eq!(top.glyph, '◉');
    }

    #[test]
    fn test_hit_test() {
        let view = view();
        let renderer = MapRenderer::new();
        let layers = renderer.render(&view.markers(), LayoutMode::Grid, 40, 20, 0);
        let first = layers.markers.iter().find(|m| m.id.as_str() == "OR1").unwrap().clone();
        assert_eq!(renderer.hit_test(&layers, first.col, first.row), Some(&first.id));
        assert_eq!(renderer.hit_test(&layers, 39, 19), None);
    }

    #[test]
    fn test_pulse_only_for_high_risk() {
        let view = view();
        let layers = MapRenderer::new().render(&view.markers(), LayoutMode::Grid, 40, 20, 0);
        let has_dots = |c: &BrailleCanvas| (0..c.height()).any(|r| (0..c.width()).any(|col| c.glyph(col, r).is_some()));
        assert!(has_dots(&layers.pulses[RiskLevel::Critical.ordinal()]));
        assert!(!has_dots(&layers.pulses[RiskLevel::Low.ordinal()]));
        assert!(!has_dots(&layers.guides));
    }

    #[test]
    fn test_flat_colors_when_gradient_disabled() {
        let view = view();
        let mut renderer = MapRenderer::new();
        renderer.toggle_gradient();
        let layers = renderer.render(&view.markers(), LayoutMode::Grid, 40, 20, 0);
        let or3 = layers.markers.iter().find(|m| m.id.as_str() == "OR3").unwrap();
        assert_eq!(or3.color.hex(), "#e74c3c");
    }

    #[test]
    fn test_cluster_spillover_pinned_to_edge() {
        // Critical ring radius is 55%, past the container edge at some angles
        let locations = (0..8).map(|i| Location::new(i, format!("Room {}", i), 95.0)).collect();
        let view = RiskMapView::new(locations, ViewConfig::default());
        let layers = MapRenderer::new().render(&view.markers(), LayoutMode::Cluster, 40, 20, 0);
        assert_eq!(layers.markers.len(), 8);
        assert!(layers.markers.iter().all(|m| m.col < 40 && m.row < 20));
        assert!(layers.markers.iter().any(|m| m.col == 0 || m.col == 39 || m.row == 0 || m.row == 19));
    }

    #[test]
    fn test_zero_sized_area() {
        let view = view();
        let layers = MapRenderer::new().render(&view.markers(), LayoutMode::Scatter, 0, 0, 0);
        assert_eq!(layers.markers.len(), 3);
    }
}
