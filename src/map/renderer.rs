use crate::braille::{BrailleCanvas, LayeredCanvas};
use crate::dashboard::MapRegion;
use crate::data::{Dataset, Region};
use crate::map::geometry::{draw_line, fill_rings};
use crate::map::projection::Viewport;
use geo::LineString;
use glam::DVec2;

/// Display settings for map layers
#[derive(Clone, Debug, Default)]
pub struct DisplaySettings {
    pub show_labels: bool,
}

/// Rendered map: colored fill layers, outlines and text labels
pub struct MapLayers {
    pub fills: LayeredCanvas,
    pub outlines: BrailleCanvas,
    /// (column, row, text) in character cells
    pub labels: Vec<(u16, u16, String)>,
}

/// Choropleth renderer for district polygons
#[derive(Default)]
pub struct ChoroplethRenderer {
    pub settings: DisplaySettings,
}

impl ChoroplethRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `regions` onto a `width` x `height` character grid
    pub fn render(&self, dataset: &Dataset, regions: &[MapRegion], width: usize, height: usize, viewport: &Viewport) -> MapLayers {
        let mut layers = MapLayers {
            fills: LayeredCanvas::new(width, height),
            outlines: BrailleCanvas::new(width, height),
            labels: Vec::new(),
        };

        for map_region in regions {
            let Some(region) = dataset.regions.get(map_region.index) else {
                continue;
            };
            if !region.bounds.is_some_and(|b| viewport.bounds_visible(&b)) {
                continue;
            }

            let canvas = layers.fills.layer_mut(map_region.color);
            for polygon in region.shape.0.iter() {
                let rings: Vec<Vec<DVec2>> = std::iter::once(polygon.exterior())
                    .chain(polygon.interiors())
                    .map(|ring| ring.coords().map(|c| viewport.project_f(c.x, c.y)).collect())
                    .collect();
                fill_rings(canvas, &rings);
            }

            for polygon in region.shape.0.iter() {
                for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
                    draw_ring(&mut layers.outlines, ring, viewport);
                }
            }

            if self.settings.show_labels {
                if let Some(label) = label_for(region, viewport, width, height) {
                    layers.labels.push(label);
                }
            }
        }

        layers
    }
}

/// Draw a closed ring with viewport culling
fn draw_ring(canvas: &mut BrailleCanvas, ring: &LineString<f64>, viewport: &Viewport) {
    let coords = &ring.0;
    if coords.len() < 2 {
        return;
    }

    let last = coords[coords.len() - 1];
    let mut prev = viewport.project(last.x, last.y);
    for p in coords {
        let (px, py) = viewport.project(p.x, p.y);
        if viewport.line_might_be_visible(prev, (px, py)) {
            draw_line(canvas, prev.0, prev.1, px, py);
        }
        prev = (px, py);
    }
}

/// District name centered on the region, if the region is wide enough
/// on screen to carry it
fn label_for(region: &Region, viewport: &Viewport, width: usize, height: usize) -> Option<(u16, u16, String)> {
    let centroid = region.centroid?;
    let bounds = region.bounds?;
    let left = viewport.project_f(bounds.min().x, bounds.max().y);
    let right = viewport.project_f(bounds.max().x, bounds.min().y);
    let cells_wide = ((right.x - left.x) / 2.0) as usize;

    let name = region.district.as_str();
    if name.is_empty() || cells_wide < name.chars().count().min(8) {
        return None;
    }

    let c = viewport.project_f(centroid.x(), centroid.y());
    let row = (c.y / 4.0).floor();
    let col = (c.x / 2.0).floor() - (name.chars().count() / 2) as f64;
    if row < 0.0 || row >= height as f64 || c.x < 0.0 || c.x >= (width * 2) as f64 {
        return None;
    }
    Some((col.max(0.0) as u16, row as u16, name.to_string()))
}
