use geo::Rect;
use glam::DVec2;
use std::f64::consts::PI;

const MIN_ZOOM: f64 = 0.5;
const MAX_ZOOM: f64 = 20_000.0;

/// Fraction of the canvas a fitted area may fill
const FIT_MARGIN: f64 = 0.9;

/// Viewport representing the visible map area and zoom level
#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
    /// Center longitude (-180 to 180)
    pub center_lon: f64,
    /// Center latitude (-85 to 85)
    pub center_lat: f64,
    /// Zoom level (higher = more zoomed in)
    pub zoom: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

/// Web Mercator, normalized to 0..1 on both axes
#[inline]
fn mercator(lon: f64, lat: f64) -> DVec2 {
    let lat_rad = lat.clamp(-85.0, 85.0).to_radians();
    DVec2::new(
        (lon + 180.0) / 360.0,
        (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0,
    )
}

#[inline]
fn inverse_mercator(m: DVec2) -> (f64, f64) {
    let lon = m.x * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * m.y)).sinh().atan().to_degrees();
    (lon, lat)
}

impl Viewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center_lon,
            center_lat,
            zoom,
            width,
            height,
        }
    }

    /// Create a world view (shows entire world)
    pub fn world(width: usize, height: usize) -> Self {
        Self::new(0.0, 20.0, 1.0, width, height)
    }

    /// Viewport centered on `bounds`, zoomed so the whole box fits
    pub fn fit(bounds: Rect<f64>, width: usize, height: usize) -> Self {
        let lo = mercator(bounds.min().x, bounds.max().y);
        let hi = mercator(bounds.max().x, bounds.min().y);
        let span = (hi - lo).max(DVec2::splat(1e-9));
        let (center_lon, center_lat) = inverse_mercator((lo + hi) * 0.5);

        let zoom = if width == 0 || height == 0 {
            1.0
        } else {
            let w = width as f64;
            (FIT_MARGIN / span.x).min(FIT_MARGIN * height as f64 / (w * span.y))
        };

        Self::new(center_lon, center_lat, zoom.clamp(MIN_ZOOM, MAX_ZOOM), width, height)
    }

    /// Pan the viewport by pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.pan_by(DVec2::new(dx as f64, dy as f64));
    }

    fn pan_by(&mut self, delta: DVec2) {
        let scale = self.scale();
        if scale <= 0.0 {
            return;
        }
        let center = self.center() + delta / scale;
        let (lon, lat) = inverse_mercator(center);

        // Wrap longitude
        self.center_lon = if lon > 180.0 {
            lon - 360.0
        } else if lon < -180.0 {
            lon + 360.0
        } else {
            lon
        };
        self.center_lat = lat.clamp(-85.0, 85.0);
    }

    /// Zoom in by a factor
    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * 1.5).min(MAX_ZOOM);
    }

    /// Zoom out by a factor
    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / 1.5).max(MIN_ZOOM);
    }

    /// Zoom in towards a specific pixel location
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.5);
    }

    /// Zoom out from a specific pixel location
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0 / 1.5);
    }

    /// Zoom by factor, keeping the point under (px, py) in place
    fn zoom_at(&mut self, px: i32, py: i32, factor: f64) {
        let (lon, lat) = self.unproject(px, py);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);

        let moved = self.project_f(lon, lat);
        self.pan_by(moved - DVec2::new(px as f64, py as f64));
    }

    #[inline]
    fn scale(&self) -> f64 {
        self.zoom * self.width as f64
    }

    #[inline]
    fn center(&self) -> DVec2 {
        mercator(self.center_lon, self.center_lat)
    }

    /// Unproject pixel coordinates back to geographic coordinates (lon, lat)
    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        let half = DVec2::new(self.width as f64, self.height as f64) / 2.0;
        let m = (DVec2::new(px as f64, py as f64) - half) / self.scale() + self.center();
        inverse_mercator(m)
    }

    /// Project to sub-pixel coordinates
    pub fn project_f(&self, lon: f64, lat: f64) -> DVec2 {
        let half = DVec2::new(self.width as f64, self.height as f64) / 2.0;
        (mercator(lon, lat) - self.center()) * self.scale() + half
    }

    /// Project a geographic coordinate (lon, lat) to pixel coordinates
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let p = self.project_f(lon, lat);
        (p.x as i32, p.y as i32)
    }

    /// Check if a line segment might be visible (rough bounding box check)
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0 && min_x < self.width as i32 && max_y >= 0 && min_y < self.height as i32
    }

    /// Whether a lon/lat box overlaps the visible area
    pub fn bounds_visible(&self, bounds: &Rect<f64>) -> bool {
        let a = self.project_f(bounds.min().x, bounds.max().y);
        let b = self.project_f(bounds.max().x, bounds.min().y);
        b.x >= 0.0 && a.x < self.width as f64 && b.y >= 0.0 && a.y < self.height as f64
    }
}
