use glam::DVec2;
use tracing::{debug, trace};

use crate::data::{sanitize, Location, LocationId};
use crate::filter::{filter_indices, LevelFilter};
use crate::hash::snapshot_fingerprint;
use crate::map::layout::{position, LayoutMode};
use crate::risk::{classify, flat_color, gradient_color, Hsl, RiskLevel, Rgb};
use crate::stats::{aggregate, Statistics};

/// Arrow key direction for list navigation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavDirection {
    Left,
    Right,
}

/// Input accepted by the view. The host translates its real input source
/// (terminal keys, mouse, timers) into these values.
#[derive(Clone, Debug, PartialEq)]
pub enum ViewEvent {
    Click(LocationId),
    ClickBackground,
    HoverEnter(LocationId),
    HoverLeave,
    SetFilterLevel(LevelFilter),
    SetSearchQuery(String),
    KeyEscape,
    KeyArrow(NavDirection),
    ToggleAnimation,
    SetLayoutMode(LayoutMode),
    /// Open the detail view for the current selection
    ViewDetails,
    /// Clear the search box and show all levels
    ResetFilters,
}

/// Interactive view state
#[derive(Clone, Debug, PartialEq)]
pub struct ViewState {
    pub selected: Option<LocationId>,
    pub hovered: Option<LocationId>,
    pub filter: LevelFilter,
    pub search_query: String,
    pub layout_mode: LayoutMode,
    pub animation_enabled: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            selected: None,
            hovered: None,
            filter: LevelFilter::All,
            search_query: String::new(),
            layout_mode: LayoutMode::Grid,
            animation_enabled: true,
        }
    }
}

/// Host-level switches
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewConfig {
    /// Whether search/filter/layout/animation controls are offered to the user
    pub show_controls: bool,
    /// Drop selection and hover when their location leaves the filtered list
    pub clear_hidden_selection: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            show_controls: true,
            clear_hidden_selection: true,
        }
    }
}

/// Everything the renderer needs to draw one location
#[derive(Clone, Debug)]
pub struct Marker<'a> {
    pub location: &'a Location,
    /// Index within the filtered list
    pub index: usize,
    pub level: RiskLevel,
    pub flat_color: Rgb,
    pub gradient_color: Hsl,
    pub position: DVec2,
    pub selected: bool,
    pub hovered: bool,
    /// Stacking order: 100 when selected, otherwise the score
    pub z_order: f64,
    /// Drawn scale factor
    pub scale: f64,
    /// High-risk marker with animation enabled
    pub pulsing: bool,
}

/// One legend row
#[derive(Clone, Debug, PartialEq)]
pub struct LegendEntry {
    pub level: RiskLevel,
    pub label: &'static str,
    pub range: String,
    pub color: Rgb,
    pub count: usize,
    pub active: bool,
}

type SelectCallback = Box<dyn FnMut(&Location)>;

/// Risk map view: snapshot, interactive state and the state derived from them.
///
/// Derived state (filtered list, positions, statistics) is rebuilt inside
/// every mutating call, so readers never observe it out of step with its inputs.
pub struct RiskMapView {
    locations: Vec<Location>,
    fingerprint: u64,
    state: ViewState,
    config: ViewConfig,
    /// Indices into `locations` passing the current filter, in snapshot order
    filtered: Vec<usize>,
    /// `positions[i]` belongs to `filtered[i]`
    positions: Vec<DVec2>,
    statistics: Option<Statistics>,
    /// Filter and query the filtered list was built for; `None` after a snapshot change
    filtered_for: Option<(LevelFilter, String)>,
    on_select: Option<SelectCallback>,
}

impl RiskMapView {
    pub fn new(locations: Vec<Location>, config: ViewConfig) -> Self {
        let mut view = Self {
            locations: Vec::new(),
            fingerprint: 0,
            state: ViewState::default(),
            config,
            filtered: Vec::new(),
            positions: Vec::new(),
            statistics: None,
            filtered_for: None,
            on_select: None,
        };
        view.replace_snapshot(sanitize(locations));
        view
    }

    /// Register the callback fired when a location is clicked or its details requested
    pub fn on_select(&mut self, callback: impl FnMut(&Location) + 'static) {
        self.on_select = Some(Box::new(callback));
    }

    /// Replace the snapshot. Returns false when it is identical to the current one.
    pub fn set_snapshot(&mut self, locations: Vec<Location>) -> bool {
        let locations = sanitize(locations);
        // Fingerprint is a cheap pre-check; equality decides
        if snapshot_fingerprint(&locations) == self.fingerprint && locations == self.locations {
            trace!("Snapshot unchanged, skipping recompute");
            return false;
        }
        self.replace_snapshot(locations);
        true
    }

    fn replace_snapshot(&mut self, locations: Vec<Location>) {
        self.fingerprint = snapshot_fingerprint(&locations);
        self.locations = locations;
        self.statistics = aggregate(&self.locations);
        self.filtered_for = None;
        debug!("Snapshot replaced: {} locations", self.locations.len());
        self.refilter();
    }

    /// Apply one input event
    pub fn handle(&mut self, event: ViewEvent) {
        trace!(?event, "view event");
        match event {
            ViewEvent::Click(id) => self.click(id),
            ViewEvent::ClickBackground => self.click_background(),
            ViewEvent::HoverEnter(id) => self.hover_enter(id),
            ViewEvent::HoverLeave => self.hover_leave(),
            ViewEvent::SetFilterLevel(level) => self.set_filter_level(level),
            ViewEvent::SetSearchQuery(query) => self.set_search_query(query),
            ViewEvent::KeyEscape => self.key_escape(),
            ViewEvent::KeyArrow(direction) => self.key_arrow(direction),
            ViewEvent::ToggleAnimation => self.toggle_animation(),
            ViewEvent::SetLayoutMode(mode) => self.set_layout_mode(mode),
            ViewEvent::ViewDetails => self.view_details(),
            ViewEvent::ResetFilters => self.reset_filters(),
        }
    }

    pub fn click(&mut self, id: LocationId) {
        self.state.selected = Some(id);
        self.notify_selected();
    }

    pub fn click_background(&mut self) {
        self.state.selected = None;
    }

    pub fn hover_enter(&mut self, id: LocationId) {
        self.state.hovered = Some(id);
    }

    pub fn hover_leave(&mut self) {
        self.state.hovered = None;
    }

    pub fn set_filter_level(&mut self, level: LevelFilter) {
        self.state.filter = level;
        self.refilter();
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.state.search_query = query.into();
        self.refilter();
    }

    pub fn key_escape(&mut self) {
        self.state.selected = None;
    }

    /// Move the selection through the filtered list with wraparound.
    /// No-op without a selection or when the selection is not in the list.
    pub fn key_arrow(&mut self, direction: NavDirection) {
        let n = self.filtered.len();
        if n == 0 {
            return;
        }
        let Some(current) = self.selected_index() else {
            return;
        };

        let next = match direction {
            NavDirection::Right => (current + 1) % n,
            NavDirection::Left => (current + n - 1) % n,
        };
        self.state.selected = Some(self.locations[self.filtered[next]].id.clone());
    }

    pub fn toggle_animation(&mut self) {
        self.state.animation_enabled = !self.state.animation_enabled;
    }

    pub fn set_layout_mode(&mut self, mode: LayoutMode) {
        if self.state.layout_mode != mode {
            self.state.layout_mode = mode;
            self.relayout();
        }
    }

    pub fn view_details(&mut self) {
        self.notify_selected();
    }

    pub fn reset_filters(&mut self) {
        self.state.search_query.clear();
        self.state.filter = LevelFilter::All;
        self.refilter();
    }

    fn notify_selected(&mut self) {
        let Some(id) = self.state.selected.as_ref() else {
            return;
        };
        let Some(location) = self.locations.iter().find(|l| &l.id == id) else {
            return;
        };
        if let Some(callback) = self.on_select.as_mut() {
            callback(location);
        }
    }

    fn refilter(&mut self) {
        let unchanged = self
            .filtered_for
            .as_ref()
            .is_some_and(|(filter, query)| *filter == self.state.filter && *query == self.state.search_query);
        if !unchanged {
            self.filtered = filter_indices(&self.locations, self.state.filter, &self.state.search_query);
            self.filtered_for = Some((self.state.filter, self.state.search_query.clone()));
            self.relayout();
        }

        if self.config.clear_hidden_selection {
            self.drop_hidden();
        }
    }

    fn relayout(&mut self) {
        let total = self.filtered.len();
        let mode = self.state.layout_mode;
        self.positions = self
            .filtered
            .iter()
            .enumerate()
            .filter_map(|(i, &idx)| position(i, total, mode, classify(self.locations[idx].risk_score)))
            .collect();
    }

    fn drop_hidden(&mut self) {
        if let Some(id) = &self.state.selected {
            if !self.is_visible(id) {
                debug!("Selected location {} filtered out, clearing selection", id);
                self.state.selected = None;
            }
        }
        if let Some(id) = &self.state.hovered {
            if !self.is_visible(id) {
                self.state.hovered = None;
            }
        }
    }

    fn is_visible(&self, id: &LocationId) -> bool {
        self.filtered.iter().any(|&i| &self.locations[i].id == id)
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn config(&self) -> ViewConfig {
        self.config
    }

    /// Full snapshot, unfiltered
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// Locations passing the current filter and search, in snapshot order
    pub fn filtered(&self) -> impl Iterator<Item = &Location> + '_ {
        self.filtered.iter().map(|&i| &self.locations[i])
    }

    pub fn filtered_len(&self) -> usize {
        self.filtered.len()
    }

    /// Positions of the filtered locations, index-aligned with [`filtered`](Self::filtered)
    pub fn positions(&self) -> &[DVec2] {
        &self.positions
    }

    /// Statistics over the whole snapshot, not the filtered view
    pub fn statistics(&self) -> Option<&Statistics> {
        self.statistics.as_ref()
    }

    /// Index of the selection within the filtered list
    pub fn selected_index(&self) -> Option<usize> {
        let id = self.state.selected.as_ref()?;
        self.filtered.iter().position(|&i| &self.locations[i].id == id)
    }

    /// Selected record, looked up in the full snapshot
    pub fn selected_location(&self) -> Option<&Location> {
        let id = self.state.selected.as_ref()?;
        self.locations.iter().find(|l| &l.id == id)
    }

    pub fn hovered_location(&self) -> Option<&Location> {
        let id = self.state.hovered.as_ref()?;
        self.locations.iter().find(|l| &l.id == id)
    }

    /// Render contract: one marker per filtered location, in filtered order
    pub fn markers(&self) -> Vec<Marker<'_>> {
        self.filtered
            .iter()
            .zip(&self.positions)
            .enumerate()
            .map(|(index, (&idx, &position))| {
                let location = &self.locations[idx];
                let level = classify(location.risk_score);
                let selected = self.state.selected.as_ref() == Some(&location.id);
                let hovered = self.state.hovered.as_ref() == Some(&location.id);
                Marker {
                    location,
                    index,
                    level,
                    flat_color: flat_color(level),
                    gradient_color: gradient_color(location.risk_score),
                    position,
                    selected,
                    hovered,
                    z_order: if selected { 100.0 } else { location.risk_score },
                    scale: if selected { 1.5 } else { 1.0 },
                    pulsing: level >= RiskLevel::High && self.state.animation_enabled,
                }
            })
            .collect()
    }

    /// Legend rows, Critical first. Counts come from the whole snapshot.
    pub fn legend(&self) -> Vec<LegendEntry> {
        RiskLevel::ALL
            .iter()
            .rev()
            .map(|&level| LegendEntry {
                level,
                label: level.label(),
                range: level.range_label(),
                color: level.color(),
                count: self
                    .statistics
                    .as_ref()
                    .map_or(0, |s| s.distribution.count(level)),
                active: self.state.filter == LevelFilter::Only(level),
            })
            .collect()
    }
}
