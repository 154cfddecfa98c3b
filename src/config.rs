use crate::data::{BoundaryFields, JoinOptions, Similarity, Sources, TableColumns};
use clap::Parser;
use std::path::PathBuf;

/// Food-security dashboard: district boundaries joined with clustering results
#[derive(Debug, Clone, Parser)]
#[command(name = "foodmap", version, about)]
pub struct Args {
    /// District boundary GeoJSON
    #[arg(long, env = "FOODMAP_BOUNDARIES", default_value = "data/Sumatera.geojson")]
    pub boundaries: PathBuf,

    /// Cluster result table (.xlsx, .xls, .ods or .csv)
    #[arg(long, env = "FOODMAP_CLUSTERS", default_value = "data/hasil_cluster_som.xlsx")]
    pub clusters: PathBuf,

    /// Worksheet to read (first sheet when omitted)
    #[arg(long, env = "FOODMAP_SHEET")]
    pub sheet: Option<String>,

    /// Boundary property holding the province name
    #[arg(long, default_value = "NAME_1")]
    pub province_field: String,

    /// Boundary property holding the district name
    #[arg(long, default_value = "NAME_2")]
    pub district_field: String,

    /// Table column holding the district name
    #[arg(long, default_value = "Kabupaten/Kota")]
    pub name_column: String,

    /// Table column holding the cluster id
    #[arg(long, default_value = "Cluster")]
    pub cluster_column: String,

    /// Table column holding a precomputed category label, if any
    #[arg(long, default_value = "Kategori_Ketahanan_Pangan")]
    pub category_column: String,

    /// Minimum similarity for the fuzzy join fallback
    #[arg(long, env = "FOODMAP_THRESHOLD", default_value_t = 0.80, value_parser = parse_threshold)]
    pub threshold: f64,

    /// Similarity metric for the fuzzy join fallback
    #[arg(long, value_enum, default_value_t = Similarity::Gestalt)]
    pub similarity: Similarity,

    /// Province selected at startup
    #[arg(long, env = "FOODMAP_PROVINCE")]
    pub province: Option<String>,

    /// Print the join report and exit instead of starting the dashboard
    #[arg(long)]
    pub check: bool,

    /// Directory for the log file written while the dashboard runs
    #[arg(long, env = "FOODMAP_LOG_DIR", default_value = "logs")]
    pub log_dir: PathBuf,

    /// Default log level; RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

fn parse_threshold(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|e| format!("{s:?} is not a number: {e}"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("threshold must be within 0.0..=1.0, got {value}"))
    }
}

impl Args {
    pub fn sources(&self) -> Sources {
        Sources {
            boundaries: self.boundaries.clone(),
            clusters: self.clusters.clone(),
            sheet: self.sheet.clone(),
            fields: BoundaryFields {
                province: self.province_field.clone(),
                district: self.district_field.clone(),
            },
            columns: TableColumns {
                name: self.name_column.clone(),
                cluster: self.cluster_column.clone(),
                category: self.category_column.clone(),
                ..TableColumns::default()
            },
            join: JoinOptions {
                threshold: self.threshold,
                similarity: self.similarity,
            },
        }
    }
}
