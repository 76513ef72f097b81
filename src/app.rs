use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant};

use ratatui::layout::Rect;
use risk_map::data::{self, Alert, Location, LocationId, Snapshot};
use risk_map::map::{LayoutMode, MapRenderer};
use risk_map::{LevelFilter, NavDirection, RiskLevel, RiskMapView, ViewConfig, ViewEvent};
use tracing::{info, warn};

use crate::ui;

/// Keyboard focus
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
}

/// Startup options collected from the command line
pub struct Options {
    pub snapshot: Option<PathBuf>,
    pub layout: LayoutMode,
    pub config: ViewConfig,
    pub animation: bool,
    pub refresh_every: Duration,
}

/// Application state
pub struct App {
    pub view: RiskMapView,
    pub map_renderer: MapRenderer,
    pub should_quit: bool,
    pub input_mode: InputMode,
    /// Frame counter for pulse animation
    pub frame: u64,
    /// Transient message shown in the status bar
    pub notice: Option<String>,
    /// Terminal size, kept for mouse hit testing
    pub screen: Rect,
    /// Recent alerts from the last loaded snapshot
    pub alerts: Vec<Alert>,
    /// Alerts panel beside the map
    pub show_alerts: bool,
    /// Filled by the selection callback, drained each tick
    opened: Rc<RefCell<Option<String>>>,
    snapshot_path: Option<PathBuf>,
    refresh_every: Duration,
    last_refresh: Instant,
}

impl App {
    pub fn new(options: Options, width: u16, height: u16) -> Self {
        let (locations, alerts) = match &options.snapshot {
            Some(path) => load_or_warn(path).map_or_else(Default::default, |s| (s.locations, s.alerts)),
            None => (data::demo_snapshot(), data::demo_alerts()),
        };

        let mut view = RiskMapView::new(locations, options.config);
        if options.config.show_controls {
            view.set_layout_mode(options.layout);
            if !options.animation {
                view.toggle_animation();
            }
        } else if options.layout != LayoutMode::default() || !options.animation {
            warn!("Controls disabled, ignoring startup layout and animation options");
        }

        let opened = Rc::new(RefCell::new(None));
        let sink = opened.clone();
        view.on_select(move |location: &Location| {
            info!("Location selected: {} ({})", location.name, location.id);
            *sink.borrow_mut() = Some(location.name.clone());
        });

        Self {
            view,
            map_renderer: MapRenderer::new(),
            should_quit: false,
            input_mode: InputMode::Normal,
            frame: 0,
            notice: None,
            screen: Rect::new(0, 0, width, height),
            alerts,
            show_alerts: true,
            opened,
            snapshot_path: options.snapshot,
            refresh_every: options.refresh_every,
            last_refresh: Instant::now(),
        }
    }

    /// Update screen size when terminal resizes
    pub fn resize(&mut self, width: u16, height: u16) {
        self.screen = Rect::new(0, 0, width, height);
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn controls_enabled(&self) -> bool {
        self.view.config().show_controls
    }

    pub fn escape(&mut self) {
        self.view.handle(ViewEvent::KeyEscape);
    }

    pub fn navigate(&mut self, direction: NavDirection) {
        self.view.handle(ViewEvent::KeyArrow(direction));
    }

    pub fn view_details(&mut self) {
        self.view.handle(ViewEvent::ViewDetails);
    }

    /// Number keys follow legend order: 1 = Critical .. 4 = Low
    pub fn toggle_filter(&mut self, slot: usize) {
        let Some(&level) = RiskLevel::ALL.iter().rev().nth(slot) else {
            return;
        };
        let next = self.view.state().filter.toggle(level);
        self.view.handle(ViewEvent::SetFilterLevel(next));
    }

    pub fn show_all_levels(&mut self) {
        self.view.handle(ViewEvent::SetFilterLevel(LevelFilter::All));
    }

    pub fn set_layout(&mut self, mode: LayoutMode) {
        self.view.handle(ViewEvent::SetLayoutMode(mode));
    }

    pub fn cycle_layout(&mut self) {
        let next = self.view.state().layout_mode.next();
        self.set_layout(next);
    }

    pub fn toggle_animation(&mut self) {
        self.view.handle(ViewEvent::ToggleAnimation);
    }

    pub fn reset_filters(&mut self) {
        self.view.handle(ViewEvent::ResetFilters);
    }

    pub fn start_search(&mut self) {
        self.input_mode = InputMode::Search;
    }

    pub fn end_search(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    pub fn search_push(&mut self, c: char) {
        let mut query = self.view.state().search_query.clone();
        query.push(c);
        self.view.handle(ViewEvent::SetSearchQuery(query));
    }

    pub fn search_pop(&mut self) {
        let mut query = self.view.state().search_query.clone();
        if query.pop().is_some() {
            self.view.handle(ViewEvent::SetSearchQuery(query));
        }
    }

    pub fn search_clear(&mut self) {
        self.view.handle(ViewEvent::SetSearchQuery(String::new()));
    }

    /// Location marker under a terminal cell
    fn marker_at(&self, col: u16, row: u16) -> Option<LocationId> {
        let inner = ui::map_inner(self.screen, self);
        if !inner.contains((col, row).into()) {
            return None;
        }
        let layers = self.map_renderer.render(
            &self.view.markers(),
            self.view.state().layout_mode,
            inner.width as usize,
            inner.height as usize,
            self.frame,
        );
        self.map_renderer
            .hit_test(&layers, col - inner.x, row - inner.y)
            .cloned()
    }

    /// Left click: select the marker under the cursor, or deselect on background
    pub fn click_at(&mut self, col: u16, row: u16) {
        match self.marker_at(col, row) {
            Some(id) => self.view.handle(ViewEvent::Click(id)),
            None => self.view.handle(ViewEvent::ClickBackground),
        }
    }

    /// Mouse motion: enter/leave hover
    pub fn hover_at(&mut self, col: u16, row: u16) {
        match self.marker_at(col, row) {
            Some(id) if self.view.state().hovered.as_ref() != Some(&id) => {
                self.view.handle(ViewEvent::HoverEnter(id));
            }
            Some(_) => {}
            None if self.view.state().hovered.is_some() => {
                self.view.handle(ViewEvent::HoverLeave);
            }
            None => {}
        }
    }

    pub fn toggle_alerts(&mut self) {
        self.show_alerts = !self.show_alerts;
    }

    /// Per-frame housekeeping: animation counter, callback notices, refresh timer
    pub fn tick(&mut self) {
        self.frame = self.frame.wrapping_add(1);

        if let Some(name) = self.opened.borrow_mut().take() {
            self.notice = Some(format!("Opened details: {}", name));
        }

        if self.last_refresh.elapsed() >= self.refresh_every {
            self.last_refresh = Instant::now();
            self.refresh();
        }
    }

    /// Reload the snapshot file, if one was given. Returns whether anything changed.
    pub fn refresh(&mut self) -> bool {
        let Some(path) = self.snapshot_path.clone() else {
            return false;
        };
        let Some(snapshot) = load_or_warn(&path) else {
            self.notice = Some("Refresh failed, see log".to_string());
            return false;
        };

        let count = snapshot.locations.len();
        let locations_changed = self.view.set_snapshot(snapshot.locations);
        let alerts_changed = self.alerts != snapshot.alerts;
        self.alerts = snapshot.alerts;

        if locations_changed || alerts_changed {
            self.notice = Some(format!("Refreshed {} locations, {} alerts", count, self.alerts.len()));
        }
        locations_changed || alerts_changed
    }

    /// Manual refresh: reload now and restart the timer
    pub fn refresh_now(&mut self) {
        self.last_refresh = Instant::now();
        if self.snapshot_path.is_none() {
            self.notice = Some("Showing demo data, nothing to refresh".to_string());
            return;
        }
        info!("Manual refresh requested");
        if !self.refresh() && self.notice.is_none() {
            self.notice = Some("Snapshot unchanged".to_string());
        }
    }
}

fn load_or_warn(path: &Path) -> Option<Snapshot> {
    match data::load_snapshot(path) {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            warn!("Failed to load {:?}: {}", path, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Options {
        Options {
            snapshot: None,
            layout: LayoutMode::Grid,
            config: ViewConfig::default(),
            animation: true,
            refresh_every: Duration::from_secs(30),
        }
    }

    fn app() -> App {
        App::new(options(), 120, 40)
    }

    fn write_snapshot(file: &mut tempfile::NamedTempFile, json: &str) {
        use std::io::{Seek, Write};
        file.as_file_mut().set_len(0).unwrap();
        file.rewind().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file.flush().unwrap();
    }

    const ONE_ROOM: &str = r#"{"locations": [{"id": "OR1", "name": "Operating Room 1", "risk_score": 45}], "alerts": []}"#;
    const ONE_ROOM_ALERTED: &str = r#"{
        "locations": [{"id": "OR1", "name": "Operating Room 1", "risk_score": 91}],
        "alerts": [{"id": "a1", "location": "Operating Room 1", "message": "CRITICAL: 91% infection risk", "status": "ACTIVE"}]
    }"#;

    #[test]
    fn test_demo_snapshot_loaded() {
        let app = app();
        assert_eq!(app.view.locations().len(), 5);
        assert_eq!(app.view.filtered_len(), 5);
    }

    #[test]
    fn test_toggle_filter_slots() {
        let mut app = app();
        app.toggle_filter(0);
        assert_eq!(app.view.state().filter, LevelFilter::Only(RiskLevel::Critical));
        app.toggle_filter(0);
        assert_eq!(app.view.state().filter, LevelFilter::All);
        app.toggle_filter(7);
        assert_eq!(app.view.state().filter, LevelFilter::All);
    }

    #[test]
    fn test_search_editing() {
        let mut app = app();
        app.start_search();
        for c in "icu".chars() {
            app.search_push(c);
        }
        assert_eq!(app.view.filtered_len(), 2);
        app.search_pop();
        app.search_pop();
        app.search_pop();
        app.search_pop();
        assert_eq!(app.view.filtered_len(), 5);
        app.end_search();
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[test]
    fn test_click_background_and_marker() {
        let mut app = app();
        let inner = ui::map_inner(app.screen, &app);
        let layers = app.map_renderer.render(
            &app.view.markers(),
            LayoutMode::Grid,
            inner.width as usize,
            inner.height as usize,
            0,
        );
        let target = layers.markers[0].clone();

        app.click_at(inner.x + target.col, inner.y + target.row);
        assert_eq!(app.view.state().selected.as_ref(), Some(&target.id));

        app.tick();
        assert!(app.notice.as_deref().unwrap_or("").starts_with("Opened details"));

        app.click_at(0, 0);
        assert!(app.view.state().selected.is_none());
    }

    #[test]
    fn test_refresh_without_file_is_noop() {
        let mut app = app();
        assert!(!app.refresh());
        assert!(app.notice.is_none());
        assert_eq!(app.view.locations().len(), 5);
    }

    #[test]
    fn test_startup_options_ignored_without_controls() {
        let mut opts = options();
        opts.layout = LayoutMode::Scatter;
        opts.animation = false;
        opts.config.show_controls = false;
        let app = App::new(opts, 120, 40);
        assert_eq!(app.view.state().layout_mode, LayoutMode::Grid);
        assert!(app.view.state().animation_enabled);
    }

    #[test]
    fn test_startup_options_applied_with_controls() {
        let mut opts = options();
        opts.layout = LayoutMode::Cluster;
        opts.animation = false;
        let app = App::new(opts, 120, 40);
        assert_eq!(app.view.state().layout_mode, LayoutMode::Cluster);
        assert!(!app.view.state().animation_enabled);
    }

    #[test]
    fn test_demo_alerts_shown() {
        let app = app();
        assert_eq!(app.alerts.len(), 1);
        assert!(app.alerts[0].is_active());
        assert!(app.show_alerts);
    }

    #[test]
    fn test_manual_refresh_reloads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write_snapshot(&mut file, ONE_ROOM);

        let mut opts = options();
        opts.snapshot = Some(file.path().to_path_buf());
        let mut app = App::new(opts, 120, 40);
        assert_eq!(app.view.locations().len(), 1);
        assert!(app.alerts.is_empty());

        app.refresh_now();
        assert_eq!(app.notice.as_deref(), Some("Snapshot unchanged"));

        write_snapshot(&mut file, ONE_ROOM_ALERTED);
        app.notice = None;
        app.refresh_now();
        assert_eq!(app.view.locations()[0].risk_score, 91.0);
        assert_eq!(app.alerts.len(), 1);
        assert_eq!(app.notice.as_deref(), Some("Refreshed 1 locations, 1 alerts"));
    }

    #[test]
    fn test_manual_refresh_with_demo_data() {
        let mut app = app();
        app.refresh_now();
        assert_eq!(app.notice.as_deref(), Some("Showing demo data, nothing to refresh"));
        assert_eq!(app.view.locations().len(), 5);
    }

    #[test]
    fn test_refresh_failure_keeps_last_snapshot() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write_snapshot(&mut file, ONE_ROOM);
        let mut opts = options();
        opts.snapshot = Some(file.path().to_path_buf());
        let mut app = App::new(opts, 120, 40);

        write_snapshot(&mut file, "{broken");
        assert!(!app.refresh());
        assert_eq!(app.notice.as_deref(), Some("Refresh failed, see log"));
        assert_eq!(app.view.locations().len(), 1);
    }
}
