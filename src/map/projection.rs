use glam::DVec2;

/// Maps layout coordinates (percent of the container) onto canvas pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

impl Viewport {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Viewport covering a braille canvas of `cols` x `rows` characters
    pub fn for_cells(cols: usize, rows: usize) -> Self {
        Self::new(cols * 2, rows * 4)
    }

    /// Project a percent position to pixel coordinates
    pub fn project(&self, pos: DVec2) -> (i32, i32) {
        let px = (pos.x / 100.0 * self.width as f64).round() as i32;
        let py = (pos.y / 100.0 * self.height as f64).round() as i32;
        (px, py)
    }

    /// Scale a percent length to pixels along the shorter axis
    pub fn scale_radius(&self, radius_percent: f64) -> i32 {
        let px_w = radius_percent / 100.0 * self.width as f64;
        let px_h = radius_percent / 100.0 * self.height as f64;
        px_w.min(px_h).round() as i32
    }

    /// Clamp a projected point onto the canvas. Edge layouts may spill past
    /// 100%, and those markers are pinned to the border rather than hidden.
    pub fn clip(&self, px: i32, py: i32) -> (i32, i32) {
        (
            px.clamp(0, self.width.saturating_sub(1) as i32),
            py.clamp(0, self.height.saturating_sub(1) as i32),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_center() {
        let vp = Viewport::new(100, 40);
        assert_eq!(vp.project(DVec2::new(50.0, 50.0)), (50, 20));
    }

    #[test]
    fn test_for_cells_uses_braille_resolution() {
        let vp = Viewport::for_cells(50, 10);
        assert_eq!((vp.width, vp.height), (100, 40));
        assert_eq!(vp.project(DVec2::new(25.0, 25.0)), (25, 10));
    }

    #[test]
    fn test_clip_pins_spillover_to_edge() {
        let vp = Viewport::new(100, 40);
        assert_eq!(vp.clip(120, -4), (99, 0));
        assert_eq!(vp.clip(40, 12), (40, 12));
        assert_eq!(Viewport::new(0, 0).clip(3, 3), (0, 0));
    }

    #[test]
    fn test_scale_radius_uses_shorter_axis() {
        let vp = Viewport::new(200, 40);
        assert_eq!(vp.scale_radius(25.0), 10);
    }
}
