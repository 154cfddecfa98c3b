use crate::data::Dataset;
use geo::Rect;
use std::collections::HashMap;

/// Spatial index for geographic features using conservative approximation.
/// Each feature's bounding box is indexed into every cell it overlaps,
/// guaranteeing no false negatives while allowing false positives
/// (eliminated by the exact point-in-polygon test afterwards).
pub struct FeatureGrid {
    cells: HashMap<(i32, i32), Vec<usize>>,
    cell_size: f64,
}

impl FeatureGrid {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cells: HashMap::new(),
            cell_size,
        }
    }

    #[inline(always)]
    fn to_cell(&self, lon: f64, lat: f64) -> (i32, i32) {
        let x = (lon / self.cell_size).floor() as i32;
        let y = (lat / self.cell_size).floor() as i32;
        (x, y)
    }

    /// Insert feature `id` into every cell its bbox overlaps
    pub fn insert(&mut self, id: usize, bbox: &Rect<f64>) {
        let min_cell = self.to_cell(bbox.min().x, bbox.min().y);
        let max_cell = self.to_cell(bbox.max().x, bbox.max().y);
        for y in min_cell.1..=max_cell.1 {
            for x in min_cell.0..=max_cell.0 {
                self.cells.entry((x, y)).or_default().push(id);
            }
        }
    }

    /// Candidate feature ids for a point, in insertion order
    pub fn query_point(&self, lon: f64, lat: f64) -> &[usize] {
        self.cells
            .get(&self.to_cell(lon, lat))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Hit-testing over the regions currently on the map
pub struct RegionIndex {
    grid: FeatureGrid,
}

impl RegionIndex {
    const CELL_DEGREES: f64 = 0.25;

    /// Index the dataset regions listed in `indices`
    pub fn build(dataset: &Dataset, indices: impl IntoIterator<Item = usize>) -> Self {
        let mut grid = FeatureGrid::new(Self::CELL_DEGREES);
        for idx in indices {
            if let Some(bounds) = dataset.regions.get(idx).and_then(|r| r.bounds) {
                grid.insert(idx, &bounds);
            }
        }
        Self { grid }
    }

    pub fn empty() -> Self {
        Self {
            grid: FeatureGrid::new(Self::CELL_DEGREES),
        }
    }

    /// Dataset index of the region containing (lon, lat), first match wins
    pub fn hit_test(&self, dataset: &Dataset, lon: f64, lat: f64) -> Option<usize> {
        self.grid
            .query_point(lon, lat)
            .iter()
            .copied()
            .find(|&idx| dataset.regions.get(idx).is_some_and(|r| r.contains(lon, lat)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::boundary::BoundaryFeature;
    use crate::data::{ClusterTable, JoinOptions};
    use geo::{LineString, MultiPolygon, Polygon};

    fn square_feature(district: &str, x0: f64, y0: f64, size: f64) -> BoundaryFeature {
        let ring = LineString::from(vec![(x0, y0), (x0 + size, y0), (x0 + size, y0 + size), (x0, y0 + size)]);
        BoundaryFeature {
            province: "Jambi".to_string(),
            district: district.to_string(),
            shape: MultiPolygon::new(vec![Polygon::new(ring, vec![])]),
        }
    }

    #[test]
    fn test_hit_test() {
        let dataset = Dataset::from_parts(
            vec![square_feature("A", 101.0, -2.0, 1.0), square_feature("B", 102.0, -2.0, 1.0)],
            &ClusterTable::default(),
            JoinOptions::default(),
        );
        let index = RegionIndex::build(&dataset, 0..dataset.regions.len());

        assert_eq!(index.hit_test(&dataset, 101.5, -1.5), Some(0));
        assert_eq!(index.hit_test(&dataset, 102.5, -1.5), Some(1));
        assert_eq!(index.hit_test(&dataset, 104.0, -1.5), None);
    }

    #[test]
    fn test_only_listed_regions_indexed() {
        let dataset = Dataset::from_parts(
            vec![square_feature("A", 101.0, -2.0, 1.0), square_feature("B", 102.0, -2.0, 1.0)],
            &ClusterTable::default(),
            JoinOptions::default(),
        );
        let index = RegionIndex::build(&dataset, [1]);
        assert_eq!(index.hit_test(&dataset, 101.5, -1.5), None);
        assert!(RegionIndex::empty().hit_test(&dataset, 102.5, -1.5).is_none());
    }

    #[test]
    fn test_grid_spans_cells() {
        let mut grid = FeatureGrid::new(1.0);
        grid.insert(7, &Rect::new((0.5, 0.5), (2.5, 0.6)));
        assert_eq!(grid.query_point(1.5, 0.5), &[7]);
        assert_eq!(grid.query_point(2.9, 0.5), &[7]);
        assert!(grid.query_point(3.1, 0.5).is_empty());
    }
}
