use crate::cache::DatasetCache;
use crate::dashboard::DashboardView;
use crate::data::{Dataset, Region, Sources};
use crate::map::{ChoroplethRenderer, RegionIndex, Viewport};
use crate::ui;
use ratatui::layout::Rect;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Application state
pub struct App {
    pub sources: Sources,
    cache: DatasetCache,
    pub dataset: Option<Arc<Dataset>>,
    /// Set when no dataset could be loaded at all
    pub load_error: Option<String>,
    /// Index into `dataset.provinces`
    pub selected: usize,
    pub view: Option<DashboardView>,
    pub viewport: Viewport,
    pub renderer: ChoroplethRenderer,
    /// Hit-testing over the regions of the selected province
    hit_index: RegionIndex,
    pub show_details: bool,
    pub detail_scroll: usize,
    /// One-line message for the status bar
    pub status: Option<String>,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Current mouse position for cursor marker and tooltip
    pub mouse_pos: Option<(u16, u16)>,
    /// Terminal size in cells
    size: (u16, u16),
}

impl App {
    /// Load `sources` and select `province` (or the first province)
    pub fn new(sources: Sources, width: u16, height: u16, province: Option<&str>) -> Self {
        let mut app = Self {
            sources,
            cache: DatasetCache::new(),
            dataset: None,
            load_error: None,
            selected: 0,
            view: None,
            viewport: Viewport::world(0, 0),
            renderer: ChoroplethRenderer::new(),
            hit_index: RegionIndex::empty(),
            show_details: false,
            detail_scroll: 0,
            status: None,
            should_quit: false,
            last_mouse: None,
            mouse_pos: None,
            size: (width, height),
        };
        app.fit_map();
        app.reload();

        if let Some(name) = province {
            if !app.select_named(name) {
                warn!(province = name, "requested province not found");
                app.status = Some(format!("province {name:?} not found"));
            }
        }
        app
    }

    pub fn provinces(&self) -> &[String] {
        self.dataset.as_deref().map(|d| d.provinces.as_slice()).unwrap_or(&[])
    }

    pub fn selected_province(&self) -> Option<&str> {
        self.provinces().get(self.selected).map(String::as_str)
    }

    /// Province change handler: rebuilds the view, hit index and viewport
    pub fn select_province(&mut self, index: usize) {
        let Some(dataset) = self.dataset.clone() else {
            return;
        };
        if dataset.provinces.is_empty() {
            self.view = None;
            self.hit_index = RegionIndex::empty();
            return;
        }

        self.selected = index.min(dataset.provinces.len() - 1);
        let province = &dataset.provinces[self.selected];
        let view = DashboardView::build(&dataset, province);
        self.hit_index = RegionIndex::build(&dataset, view.map.iter().map(|m| m.index));
        info!(
            province = %province,
            districts = view.details.len(),
            clusters = view.summary.len(),
            "province selected"
        );

        self.view = Some(view);
        self.detail_scroll = 0;
        self.fit_map();
    }

    /// Select a province by name, ignoring case
    pub fn select_named(&mut self, name: &str) -> bool {
        let found = self.provinces().iter().position(|p| p.eq_ignore_ascii_case(name.trim()));
        match found {
            Some(index) => {
                self.select_province(index);
                true
            }
            None => false,
        }
    }

    pub fn next_province(&mut self) {
        let count = self.provinces().len();
        if count > 0 {
            self.select_province((self.selected + 1) % count);
        }
    }

    pub fn prev_province(&mut self) {
        let count = self.provinces().len();
        if count > 0 {
            self.select_province((self.selected + count - 1) % count);
        }
    }

    /// Reload through the cache. Unchanged inputs keep the current state;
    /// a failure keeps the previous dataset.
    pub fn reload(&mut self) {
        let previous = self.selected_province().map(str::to_string);

        match self.cache.get_or_load(&self.sources) {
            Ok(dataset) => {
                if self.dataset.as_ref().is_some_and(|d| Arc::ptr_eq(d, &dataset)) {
                    self.status = Some("inputs unchanged".to_string());
                    return;
                }
                let index = previous
                    .as_deref()
                    .and_then(|p| dataset.province_index(p))
                    .unwrap_or(0);
                self.status = Some(format!(
                    "loaded {} districts in {} provinces",
                    dataset.regions.len(),
                    dataset.provinces.len()
                ));
                self.dataset = Some(dataset);
                self.load_error = None;
                self.select_province(index);
            }
            Err(e) => {
                error!(error = %e, "failed to load dataset");
                if self.dataset.is_some() {
                    self.status = Some(format!("reload failed: {e}"));
                } else {
                    self.load_error = Some(e.to_string());
                }
            }
        }
    }

    /// Inner map area in terminal cells
    fn map_area(&self) -> Rect {
        let (width, height) = self.size;
        ui::map_inner(ui::layout(Rect::new(0, 0, width, height)).map)
    }

    /// Braille pixel size of the map
    fn map_pixels(&self) -> (usize, usize) {
        let area = self.map_area();
        (area.width as usize * 2, area.height as usize * 4)
    }

    /// Fit the viewport to the selected province
    pub fn fit_map(&mut self) {
        let (width, height) = self.map_pixels();
        let bounds = match (self.dataset.as_deref(), self.view.as_ref()) {
            (Some(dataset), Some(view)) => view
                .map
                .iter()
                .filter_map(|m| dataset.regions.get(m.index)?.bounds)
                .reduce(union_bounds),
            _ => None,
        };
        self.viewport = match bounds {
            Some(bounds) => Viewport::fit(bounds, width, height),
            None => Viewport::world(width, height),
        };
    }

    /// Update viewport size when terminal resizes
    pub fn resize(&mut self, width: u16, height: u16) {
        self.size = (width, height);
        self.fit_map();
    }

    /// Pan the map
    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    /// Map pixel under a terminal cell, `None` outside the map
    fn cell_to_pixel(&self, col: u16, row: u16) -> Option<(i32, i32)> {
        let (cx, cy) = self.cell_in_map(col, row)?;
        // Each terminal cell is 2 braille pixels wide, 4 tall
        Some((cx as i32 * 2 + 1, cy as i32 * 4 + 2))
    }

    fn cell_in_map(&self, col: u16, row: u16) -> Option<(u16, u16)> {
        let area = self.map_area();
        let inside = col >= area.x && col < area.x + area.width && row >= area.y && row < area.y + area.height;
        inside.then(|| (col - area.x, row - area.y))
    }

    pub fn is_over_map(&self, col: u16, row: u16) -> bool {
        self.cell_in_map(col, row).is_some()
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        if let Some((px, py)) = self.cell_to_pixel(col, row) {
            self.viewport.zoom_in_at(px, py);
        }
    }

    /// Zoom out from a screen position (terminal column/row)
    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        if let Some((px, py)) = self.cell_to_pixel(col, row) {
            self.viewport.zoom_out_at(px, py);
        }
    }

    /// Start a drag when the button goes down over the map
    pub fn begin_drag(&mut self, col: u16, row: u16) {
        self.last_mouse = self.is_over_map(col, row).then_some((col, row));
    }

    /// Pan so the map follows the pointer
    pub fn handle_drag(&mut self, x: u16, y: u16) {
        let Some((last_x, last_y)) = self.last_mouse else {
            return;
        };
        let dx = last_x as i32 - x as i32;
        let dy = last_y as i32 - y as i32;
        self.pan(dx * 2, dy * 4);
        self.last_mouse = Some((x, y));
    }

    /// Reset drag state when mouse button released
    pub fn end_drag(&mut self) {
        self.last_mouse = None;
    }

    /// Update mouse cursor position
    pub fn set_mouse_pos(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
    }

    /// Mouse position relative to the map's inner area
    pub fn mouse_cell_in_map(&self) -> Option<(u16, u16)> {
        let (col, row) = self.mouse_pos?;
        self.cell_in_map(col, row)
    }

    /// Region under the mouse cursor
    pub fn hovered_region(&self) -> Option<&Region> {
        let dataset = self.dataset.as_deref()?;
        let (col, row) = self.mouse_pos?;
        let (px, py) = self.cell_to_pixel(col, row)?;
        let (lon, lat) = self.viewport.unproject(px, py);
        let index = self.hit_index.hit_test(dataset, lon, lat)?;
        dataset.regions.get(index)
    }

    pub fn toggle_details(&mut self) {
        self.show_details = !self.show_details;
        self.detail_scroll = 0;
    }

    pub fn scroll_details(&mut self, delta: i32) {
        let rows = self.view.as_ref().map_or(0, |v| v.details.len());
        let max = rows.saturating_sub(1) as i64;
        self.detail_scroll = (self.detail_scroll as i64 + delta as i64).clamp(0, max) as usize;
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Get current zoom level as a string
    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.viewport.zoom)
    }

    /// Get current center coordinates as a string
    pub fn center_coords(&self) -> String {
        format!(
            "{:.2}°{}, {:.2}°{}",
            self.viewport.center_lat.abs(),
            if self.viewport.center_lat >= 0.0 { "N" } else { "S" },
            self.viewport.center_lon.abs(),
            if self.viewport.center_lon >= 0.0 { "E" } else { "W" }
        )
    }
}

/// Smallest lon/lat box covering both boxes
fn union_bounds(a: geo::Rect<f64>, b: geo::Rect<f64>) -> geo::Rect<f64> {
    geo::Rect::new(
        (a.min().x.min(b.min().x), a.min().y.min(b.min().y)),
        (a.max().x.max(b.max().x), a.max().y.max(b.max().y)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const GEOJSON: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","properties":{"NAME_1":"Jambi","NAME_2":"Kerinci"},
         "geometry":{"type":"Polygon","coordinates":[[[101.0,-2.0],[102.0,-2.0],[102.0,-1.0],[101.0,-1.0],[101.0,-2.0]]]}},
        {"type":"Feature","properties":{"NAME_1":"Aceh","NAME_2":"Kota Banda Aceh"},
         "geometry":{"type":"Polygon","coordinates":[[[95.2,5.5],[95.4,5.5],[95.4,5.6],[95.2,5.6],[95.2,5.5]]]}},
        {"type":"Feature","properties":{"NAME_1":"Aceh","NAME_2":"Kabupaten Aceh Besar"},
         "geometry":{"type":"Polygon","coordinates":[[[95.4,5.0],[96.0,5.0],[96.0,5.5],[95.4,5.5],[95.4,5.0]]]}}
    ]}"#;

    const CSV: &str = "Kabupaten/Kota,Cluster,IKP\nKerinci,1,80.5\nBanda Aceh Kota,4,88\nAceh Besar,0,70\n";

    fn write_inputs(dir: &Path) -> Sources {
        let boundaries = dir.join("sumatera.geojson");
        let clusters = dir.join("clusters.csv");
        fs::write(&boundaries, GEOJSON).unwrap();
        fs::write(&clusters, CSV).unwrap();
        Sources::new(boundaries, clusters)
    }

    #[test]
    fn test_startup_selects_first_province() {
        let dir = TempDir::new().unwrap();
        let app = App::new(write_inputs(dir.path()), 160, 50, None);

        assert!(app.load_error.is_none());
        assert_eq!(app.provinces(), ["Aceh".to_string(), "Jambi".to_string()]);
        assert_eq!(app.selected_province(), Some("Aceh"));
        let view = app.view.as_ref().unwrap();
        assert_eq!(view.details.len(), 2);
        assert!(app.viewport.zoom > 1.0);
    }

    #[test]
    fn test_initial_province_by_name() {
        let dir = TempDir::new().unwrap();
        let app = App::new(write_inputs(dir.path()), 160, 50, Some("jambi"));
        assert_eq!(app.selected_province(), Some("Jambi"));
        assert!(app.status.is_some());

        let missing = App::new(write_inputs(dir.path()), 160, 50, Some("Bali"));
        assert_eq!(missing.selected_province(), Some("Aceh"));
        assert!(missing.status.as_deref().unwrap().contains("not found"));
    }

    #[test]
    fn test_province_navigation_wraps() {
        let dir = TempDir::new().unwrap();
        let mut app = App::new(write_inputs(dir.path()), 160, 50, None);
        app.next_province();
        assert_eq!(app.selected_province(), Some("Jambi"));
        app.next_province();
        assert_eq!(app.selected_province(), Some("Aceh"));
        app.prev_province();
        assert_eq!(app.selected_province(), Some("Jambi"));
        assert_eq!(app.view.as_ref().unwrap().province, "Jambi");
    }

    #[test]
    fn test_reload_keeps_selection_and_reuses_cache() {
        let dir = TempDir::new().unwrap();
        let mut app = App::new(write_inputs(dir.path()), 160, 50, Some("Jambi"));
        let before = app.dataset.clone().unwrap();

        app.reload();
        assert!(Arc::ptr_eq(&before, app.dataset.as_ref().unwrap()));
        assert_eq!(app.status.as_deref(), Some("inputs unchanged"));

        fs::write(dir.path().join("clusters.csv"), "Kabupaten/Kota,Cluster\nKerinci,3\n").unwrap();
        app.reload();
        assert!(!Arc::ptr_eq(&before, app.dataset.as_ref().unwrap()));
        assert_eq!(app.selected_province(), Some("Jambi"));
        assert_eq!(app.view.as_ref().unwrap().summary[0].cluster, 3);
    }

    #[test]
    fn test_failed_reload_keeps_dataset() {
        let dir = TempDir::new().unwrap();
        let mut app = App::new(write_inputs(dir.path()), 160, 50, None);
        fs::remove_file(dir.path().join("clusters.csv")).unwrap();

        app.reload();
        assert!(app.dataset.is_some());
        assert!(app.load_error.is_none());
        assert!(app.status.as_deref().unwrap().starts_with("reload failed"));
    }

    #[test]
    fn test_initial_load_failure() {
        let dir = TempDir::new().unwrap();
        let sources = Sources::new(dir.path().join("missing.geojson"), dir.path().join("missing.csv"));
        let app = App::new(sources, 160, 50, None);
        assert!(app.dataset.is_none());
        assert!(app.view.is_none());
        assert!(app.load_error.is_some());
    }

    #[test]
    fn test_hover_finds_region_under_cursor() {
        let dir = TempDir::new().unwrap();
        let mut app = App::new(write_inputs(dir.path()), 160, 50, Some("Jambi"));

        let area = app.map_area();
        app.set_mouse_pos(area.x + area.width / 2, area.y + area.height / 2);
        assert_eq!(app.hovered_region().map(|r| r.district.as_str()), Some("Kerinci"));

        // Outside the map
        app.set_mouse_pos(0, 0);
        assert!(app.hovered_region().is_none());
    }

    #[test]
    fn test_drag_only_starts_over_map() {
        let dir = TempDir::new().unwrap();
        let mut app = App::new(write_inputs(dir.path()), 160, 50, None);
        app.begin_drag(0, 0);
        assert!(app.last_mouse.is_none());

        let area = app.map_area();
        let (col, row) = (area.x + 10, area.y + 5);
        app.begin_drag(col, row);
        let before = app.viewport.center_lon;
        app.handle_drag(col - 4, row);
        assert!(app.viewport.center_lon > before);
        app.end_drag();
        assert!(app.last_mouse.is_none());
    }

    #[test]
    fn test_detail_scroll_clamps() {
        let dir = TempDir::new().unwrap();
        let mut app = App::new(write_inputs(dir.path()), 160, 50, None);
        app.toggle_details();
        assert!(app.show_details);
        app.scroll_details(10);
        assert_eq!(app.detail_scroll, 1);
        app.scroll_details(-5);
        assert_eq!(app.detail_scroll, 0);
    }
}
