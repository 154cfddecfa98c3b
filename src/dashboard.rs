//! Per-province render model.
//!
//! `DashboardView::build` is the whole presentation query: it filters the
//! loaded dataset to one province and derives everything the widgets show.
//! It never fails; an empty province yields empty tables and `NaN` means.

use crate::category::{category_color, cluster_color, Category};
use crate::data::{Dataset, Region};
use ratatui::style::Color;
use std::collections::BTreeMap;

/// Headline metrics for the selected province
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregates {
    pub mean_food_security: f64,
    pub mean_rice_productivity: f64,
    pub total_rice_production: f64,
    pub total_grdp: f64,
}

/// One row of the cluster summary table
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSummary {
    pub cluster: u8,
    pub category: Option<Category>,
    pub districts: usize,
    pub mean_food_security: f64,
    pub mean_rice_productivity: f64,
    pub mean_rice_production: f64,
    pub mean_grdp: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub category: Option<Category>,
    pub districts: usize,
    /// Fraction of the whole pie, 0.0..=1.0
    pub share: f64,
    pub color: Color,
}

impl PieSlice {
    pub fn label(&self) -> &'static str {
        self.category.map(Category::label).unwrap_or("Uncategorized")
    }
}

/// A region to draw on the map and its fill
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapRegion {
    /// Index into `Dataset::regions`
    pub index: usize,
    pub color: Color,
}

/// One row of the per-district detail table
#[derive(Debug, Clone, PartialEq)]
pub struct DetailRow {
    pub province: String,
    pub district: String,
    pub cluster: Option<u8>,
    pub category: Option<Category>,
    /// Category as shown: the known label or the table's own text
    pub category_text: Option<String>,
    pub food_security_index: Option<f64>,
    pub rice_production: Option<f64>,
    pub grdp: Option<f64>,
    pub provenance: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub province: String,
    pub aggregates: Aggregates,
    pub summary: Vec<ClusterSummary>,
    pub pie: Vec<PieSlice>,
    pub map: Vec<MapRegion>,
    pub details: Vec<DetailRow>,
}

impl DashboardView {
    pub fn build(dataset: &Dataset, province: &str) -> Self {
        let regions: Vec<(usize, &Region)> = dataset.regions_in(province).collect();

        let aggregates = Aggregates {
            mean_food_security: mean(regions.iter().map(|(_, r)| r.indicators.food_security_index)),
            mean_rice_productivity: mean(regions.iter().map(|(_, r)| r.indicators.rice_productivity)),
            total_rice_production: total(regions.iter().map(|(_, r)| r.indicators.rice_production)),
            total_grdp: total(regions.iter().map(|(_, r)| r.indicators.grdp)),
        };

        let summary = summarize(regions.iter().map(|(_, r)| *r));
        let pie = pie_slices(&summary);

        let map = regions
            .iter()
            .map(|&(index, r)| MapRegion {
                index,
                color: cluster_color(r.cluster),
            })
            .collect();

        let details = regions
            .iter()
            .map(|(_, r)| DetailRow {
                province: r.province.clone(),
                district: r.district.clone(),
                cluster: r.cluster,
                category: r.category,
                category_text: r.category_text().map(str::to_string),
                food_security_index: r.indicators.food_security_index,
                rice_production: r.indicators.rice_production,
                grdp: r.indicators.grdp,
                provenance: r.match_kind.describe(),
            })
            .collect();

        Self {
            province: province.to_string(),
            aggregates,
            summary,
            pie,
            map,
            details,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Group by cluster id (ascending). Regions without a cluster are left out.
fn summarize<'a>(regions: impl Iterator<Item = &'a Region>) -> Vec<ClusterSummary> {
    let mut groups: BTreeMap<u8, Vec<&Region>> = BTreeMap::new();
    for region in regions {
        if let Some(cluster) = region.cluster {
            groups.entry(cluster).or_default().push(region);
        }
    }

    groups
        .into_iter()
        .map(|(cluster, members)| ClusterSummary {
            cluster,
            category: Category::from_cluster(cluster),
            districts: members.len(),
            mean_food_security: mean(members.iter().map(|r| r.indicators.food_security_index)),
            mean_rice_productivity: mean(members.iter().map(|r| r.indicators.rice_productivity)),
            mean_rice_production: mean(members.iter().map(|r| r.indicators.rice_production)),
            mean_grdp: mean(members.iter().map(|r| r.indicators.grdp)),
        })
        .collect()
}

/// District counts summed per category, in first-seen summary order
fn pie_slices(summary: &[ClusterSummary]) -> Vec<PieSlice> {
    let total: usize = summary.iter().map(|s| s.districts).sum();
    let mut slices: Vec<PieSlice> = Vec::new();

    for row in summary {
        match slices.iter_mut().find(|s| s.category == row.category) {
            Some(slice) => slice.districts += row.districts,
            None => slices.push(PieSlice {
                category: row.category,
                districts: row.districts,
                share: 0.0,
                color: category_color(row.category),
            }),
        }
    }

    for slice in &mut slices {
        slice.share = if total == 0 {
            0.0
        } else {
            slice.districts as f64 / total as f64
        };
    }
    slices
}

/// Mean of the present values, `NaN` when none are present
pub fn mean(values: impl Iterator<Item = Option<f64>>) -> f64 {
    let (sum, count) = values.flatten().fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Sum of the present values, `0.0` when none are present
pub fn total(values: impl Iterator<Item = Option<f64>>) -> f64 {
    values.flatten().sum()
}

/// Format with thousands separators; `NaN` renders as "n/a"
pub fn format_number(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3 + 4);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    if value < 0.0 && grouped.chars().any(|c| c.is_ascii_digit() && c != '0') {
        grouped.insert(0, '-');
    }
    grouped
}

/// Optional value for table cells
pub fn format_optional(value: Option<f64>, decimals: usize) -> String {
    value.map(|v| format_number(v, decimals)).unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ClusterRecord, ClusterTable, Indicators, JoinOptions};
    use crate::data::boundary::BoundaryFeature;
    use crate::data::key::normalize_key;
    use geo::MultiPolygon;

    fn feature(province: &str, district: &str) -> BoundaryFeature {
        BoundaryFeature {
            province: province.to_string(),
            district: district.to_string(),
            shape: MultiPolygon::new(Vec::new()),
        }
    }

    fn record(district: &str, cluster: u8, ikp: f64, production: f64, grdp: f64) -> ClusterRecord {
        ClusterRecord {
            district: district.to_string(),
            key: normalize_key(district),
            cluster: Some(cluster),
            category: None,
            category_label: None,
            indicators: Indicators {
                food_security_index: Some(ikp),
                rice_productivity: Some(ikp / 2.0),
                rice_production: Some(production),
                grdp: Some(grdp),
                extra: Default::default(),
            },
        }
    }

    fn dataset() -> Dataset {
        let features = vec![
            feature("Aceh", "Aceh Besar"),
            feature("Aceh", "Pidie"),
            feature("Aceh", "Kota Sabang"),
            feature("Aceh", "Nowhere"),
            feature("Riau", "Siak"),
            feature("Kepulauan Riau", "Natuna"),
        ];
        let table = ClusterTable {
            records: vec![
                record("Aceh Besar", 2, 70.0, 100.0, 1000.0),
                record("Pidie", 5, 80.0, 300.0, 3000.0),
                record("Sabang", 3, 50.0, 0.0, 500.0),
                record("Siak", 1, 60.0, 10.0, 100.0),
            ],
            has_category_column: false,
        };
        Dataset::from_parts(features, &table, JoinOptions::default())
    }

    #[test]
    fn test_aggregates() {
        let view = DashboardView::build(&dataset(), "Aceh");
        let agg = view.aggregates;
        assert!((agg.mean_food_security - 200.0 / 3.0).abs() < 1e-9);
        assert!((agg.mean_rice_productivity - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(agg.total_rice_production, 400.0);
        assert_eq!(agg.total_grdp, 4500.0);
    }

    #[test]
    fn test_summary_groups_by_cluster() {
        let view = DashboardView::build(&dataset(), "Aceh");
        let clusters: Vec<u8> = view.summary.iter().map(|s| s.cluster).collect();
        assert_eq!(clusters, vec![2, 3, 5]);
        assert!(view.summary.iter().all(|s| s.districts == 1));
        assert_eq!(view.summary[1].category, Some(Category::VeryVulnerable));
        assert_eq!(view.summary[0].mean_grdp, 1000.0);
    }

    #[test]
    fn test_pie_merges_shared_category() {
        let view = DashboardView::build(&dataset(), "Aceh");
        // clusters 2 and 5 are both Very Resilient
        assert_eq!(view.pie.len(), 2);
        assert_eq!(view.pie[0].category, Some(Category::VeryResilient));
        assert_eq!(view.pie[0].districts, 2);
        assert!((view.pie[0].share - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(view.pie[0].color, Category::VeryResilient.color());
        let shares: f64 = view.pie.iter().map(|s| s.share).sum();
        assert!((shares - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_unmatched_region_is_drawn_neutral() {
        let data = dataset();
        let view = DashboardView::build(&data, "Aceh");
        assert_eq!(view.map.len(), 4);
        let nowhere = view
            .map
            .iter()
            .find(|m| data.regions[m.index].district == "Nowhere")
            .unwrap();
        assert_eq!(nowhere.color, crate::category::UNMAPPED_COLOR);
        let row = view.details.iter().find(|d| d.district == "Nowhere").unwrap();
        assert_eq!(row.cluster, None);
        assert_eq!(row.provenance, "unmatched");
    }

    #[test]
    fn test_province_without_clusters() {
        let view = DashboardView::build(&dataset(), "Kepulauan Riau");
        assert!(view.summary.is_empty());
        assert!(view.pie.is_empty());
        assert!(view.aggregates.mean_food_security.is_nan());
        assert!(view.aggregates.mean_rice_productivity.is_nan());
        assert_eq!(view.aggregates.total_rice_production, 0.0);
        assert_eq!(view.aggregates.total_grdp, 0.0);
        assert_eq!(view.details.len(), 1);
    }

    #[test]
    fn test_unknown_province_is_empty() {
        let view = DashboardView::build(&dataset(), "Bali");
        assert!(view.is_empty());
        assert!(view.details.is_empty());
        assert!(view.aggregates.mean_food_security.is_nan());
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1234567.0, 0), "1,234,567");
        assert_eq!(format_number(999.0, 0), "999");
        assert_eq!(format_number(1234.5, 2), "1,234.50");
        assert_eq!(format_number(-4500.0, 0), "-4,500");
        assert_eq!(format_number(-0.001, 2), "0.00");
        assert_eq!(format_number(f64::NAN, 2), "n/a");
        assert_eq!(format_optional(None, 2), "-");
    }

    #[test]
    fn test_unknown_category_shown_as_written() {
        let mut known = record("Pidie", 1, 60.0, 10.0, 100.0);
        known.category = Some(Category::Vulnerable);
        known.category_label = Some("rentan".to_string());
        let mut unknown = record("Aceh Besar", 3, 70.0, 10.0, 100.0);
        unknown.category_label = Some("Cukup Tahan".to_string());

        let dataset = Dataset::from_parts(
            vec![feature("Aceh", "Aceh Besar"), feature("Aceh", "Pidie")],
            &ClusterTable {
                records: vec![known, unknown],
                has_category_column: true,
            },
            JoinOptions::default(),
        );
        let view = DashboardView::build(&dataset, "Aceh");

        let text = |district: &str| {
            view.details
                .iter()
                .find(|d| d.district == district)
                .and_then(|d| d.category_text.clone())
        };
        assert_eq!(text("Aceh Besar").as_deref(), Some("Cukup Tahan"));
        assert_eq!(text("Pidie").as_deref(), Some("Vulnerable"));
        assert!(view.details.iter().find(|d| d.district == "Aceh Besar").unwrap().category.is_none());
    }
}
