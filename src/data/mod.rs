//! Loading and joining the boundary and cluster datasets.

pub mod boundary;
pub mod error;
pub mod join;
pub mod key;
pub mod similarity;
pub mod table;

pub use boundary::BoundaryFields;
pub use error::LoadError;
pub use join::{JoinOptions, JoinReport, MatchKind};
pub use similarity::Similarity;
pub use table::{ClusterRecord, ClusterTable, Indicators, TableColumns};

use crate::category::Category;
use geo::{BoundingRect, Centroid, Contains, MultiPolygon, Point, Rect};
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// A district polygon with its joined cluster data
#[derive(Debug, Clone)]
pub struct Region {
    pub province: String,
    pub district: String,
    pub key: String,
    pub shape: MultiPolygon<f64>,
    pub bounds: Option<Rect<f64>>,
    pub centroid: Option<Point<f64>>,
    pub cluster: Option<u8>,
    pub category: Option<Category>,
    /// Category text from the table, when it had a category column
    pub category_label: Option<String>,
    pub indicators: Indicators,
    /// District name of the cluster record this region was joined with
    pub matched_name: Option<String>,
    pub match_kind: MatchKind,
}

impl Region {
    pub fn new(province: String, district: String, shape: MultiPolygon<f64>) -> Self {
        Self {
            key: key::normalize_key(&district),
            province,
            district,
            bounds: shape.bounding_rect(),
            centroid: shape.centroid(),
            shape,
            cluster: None,
            category: None,
            category_label: None,
            indicators: Indicators::default(),
            matched_name: None,
            match_kind: MatchKind::Unmatched,
        }
    }

    /// Copy every non-geometry field of `record` onto this region
    pub fn apply(&mut self, record: &ClusterRecord, kind: MatchKind) {
        self.cluster = record.cluster;
        self.category = record.category;
        self.category_label = record.category_label.clone();
        self.indicators = record.indicators.clone();
        self.matched_name = Some(record.district.clone());
        self.match_kind = kind;
    }

    /// Whether (lon, lat) lies inside the region; holes are excluded
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.shape.contains(&Point::new(lon, lat))
    }

    /// Category name for display: the known label, else the table's own text
    pub fn category_text(&self) -> Option<&str> {
        self.category.map(Category::label).or(self.category_label.as_deref())
    }
}

/// Everything needed to (re)load the dataset
#[derive(Debug, Clone, PartialEq)]
pub struct Sources {
    pub boundaries: PathBuf,
    pub clusters: PathBuf,
    pub sheet: Option<String>,
    pub fields: BoundaryFields,
    pub columns: TableColumns,
    pub join: JoinOptions,
}

impl Sources {
    pub fn new(boundaries: impl Into<PathBuf>, clusters: impl Into<PathBuf>) -> Self {
        Self {
            boundaries: boundaries.into(),
            clusters: clusters.into(),
            sheet: None,
            fields: BoundaryFields::default(),
            columns: TableColumns::default(),
            join: JoinOptions::default(),
        }
    }
}

/// Immutable result of a load
#[derive(Debug, Clone)]
pub struct Dataset {
    pub regions: Vec<Region>,
    /// Sorted, unique, non-empty
    pub provinces: Vec<String>,
    pub report: JoinReport,
}

impl Dataset {
    /// Build a dataset from already-read inputs
    pub fn from_parts(boundaries: Vec<boundary::BoundaryFeature>, table: &ClusterTable, options: JoinOptions) -> Self {
        let mut regions: Vec<Region> = boundaries
            .into_iter()
            .map(|b| Region::new(b.province, b.district, b.shape))
            .collect();
        let report = join::join_regions(&mut regions, table, options);

        let provinces = regions
            .iter()
            .filter(|r| !r.province.is_empty())
            .map(|r| r.province.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        Self {
            regions,
            provinces,
            report,
        }
    }

    /// Regions of a province with their dataset indices
    pub fn regions_in<'a>(&'a self, province: &'a str) -> impl Iterator<Item = (usize, &'a Region)> + 'a {
        self.regions
            .iter()
            .enumerate()
            .filter(move |(_, r)| r.province == province)
    }

    pub fn province_index(&self, province: &str) -> Option<usize> {
        self.provinces.iter().position(|p| p == province)
    }
}

/// Contents of both input files, read once per load
#[derive(Debug, Clone)]
pub struct SourceBytes {
    pub boundaries: Vec<u8>,
    pub clusters: Vec<u8>,
}

impl SourceBytes {
    pub fn read(sources: &Sources) -> Result<Self, LoadError> {
        let boundaries = fs::read(&sources.boundaries).map_err(|e| LoadError::io(&sources.boundaries, e))?;
        let clusters = fs::read(&sources.clusters).map_err(|e| LoadError::io(&sources.clusters, e))?;
        Ok(Self { boundaries, clusters })
    }
}

/// Read both inputs and join them. Any read failure aborts the load.
pub fn load(sources: &Sources) -> Result<Dataset, LoadError> {
    load_bytes(sources, SourceBytes::read(sources)?)
}

/// Parse and join inputs that were already read. The paths in `sources`
/// only pick the table format and label errors.
pub fn load_bytes(sources: &Sources, bytes: SourceBytes) -> Result<Dataset, LoadError> {
    let started = Instant::now();
    let boundaries = boundary::parse_boundaries(&sources.boundaries, bytes.boundaries, &sources.fields)?;
    let table = table::parse_cluster_table(
        &sources.clusters,
        bytes.clusters,
        sources.sheet.as_deref(),
        &sources.columns,
    )?;
    let dataset = Dataset::from_parts(boundaries, &table, sources.join);

    info!(
        boundaries = %sources.boundaries.display(),
        clusters = %sources.clusters.display(),
        regions = dataset.regions.len(),
        provinces = dataset.provinces.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "dataset loaded"
    );
    Ok(dataset)
}
