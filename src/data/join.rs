//! Record linkage between boundary features and cluster records.
//!
//! Exact join on the normalized key first; every region still unmatched is
//! then scored against all cluster keys and backfilled from the best
//! candidate at or above the threshold.

use crate::category::Category;
use crate::data::similarity::Similarity;
use crate::data::table::{ClusterRecord, ClusterTable};
use crate::data::Region;
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// How a region got its cluster data
#[derive(Debug, Clone, PartialEq)]
pub enum MatchKind {
    Exact,
    Fuzzy { candidate: String, score: f64 },
    Unmatched,
}

impl MatchKind {
    pub fn describe(&self) -> String {
        match self {
            MatchKind::Exact => "exact".to_string(),
            MatchKind::Fuzzy { candidate, score } => format!("fuzzy {candidate} ({score:.2})"),
            MatchKind::Unmatched => "unmatched".to_string(),
        }
    }
}

/// Outcome of a join run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoinReport {
    pub exact: usize,
    /// (region key, matched cluster key, score)
    pub fuzzy: Vec<(String, String, f64)>,
    /// District names left without cluster data
    pub unmatched: Vec<String>,
    /// Cluster keys that appeared more than once; the first row was used
    pub duplicate_keys: Vec<String>,
}

impl JoinReport {
    pub fn matched(&self) -> usize {
        self.exact + self.fuzzy.len()
    }
}

/// Join settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JoinOptions {
    pub threshold: f64,
    pub similarity: Similarity,
}

impl Default for JoinOptions {
    fn default() -> Self {
        Self {
            threshold: 0.80,
            similarity: Similarity::Gestalt,
        }
    }
}

/// Best candidate scoring at or above `threshold`.
///
/// Ties on score go to the lexicographically greater candidate, mirroring
/// `difflib.get_close_matches` ordering. Empty keys never match.
pub fn best_match<'a>(
    key: &str,
    candidates: impl IntoIterator<Item = &'a str>,
    options: JoinOptions,
) -> Option<(&'a str, f64)> {
    if key.is_empty() {
        return None;
    }

    candidates
        .into_iter()
        .filter(|candidate| !candidate.is_empty())
        .map(|candidate| (candidate, options.similarity.score(key, candidate)))
        .filter(|(_, score)| *score >= options.threshold)
        .max_by(|(a, sa), (b, sb)| sa.total_cmp(sb).then_with(|| a.cmp(b)))
}

/// Join `table` onto `regions` in place and derive categories.
pub fn join_regions(regions: &mut [Region], table: &ClusterTable, options: JoinOptions) -> JoinReport {
    let mut report = JoinReport::default();

    // First row wins for a repeated key
    let mut by_key: HashMap<&str, &ClusterRecord> = HashMap::with_capacity(table.records.len());
    for record in &table.records {
        if record.key.is_empty() {
            continue;
        }
        if by_key.contains_key(record.key.as_str()) {
            warn!(key = %record.key, "duplicate district key in cluster table, keeping first row");
            report.duplicate_keys.push(record.key.clone());
        } else {
            by_key.insert(record.key.as_str(), record);
        }
    }

    for region in regions.iter_mut() {
        if region.key.is_empty() {
            continue;
        }
        if let Some(record) = by_key.get(region.key.as_str()) {
            region.apply(record, MatchKind::Exact);
            report.exact += 1;
        }
    }

    // Score unmatched regions in parallel, apply in region order
    let candidates: Vec<&str> = table.records.iter().map(|r| r.key.as_str()).collect();
    let fallbacks: Vec<(usize, &str, f64)> = regions
        .par_iter()
        .enumerate()
        .filter(|(_, region)| region.match_kind == MatchKind::Unmatched)
        .filter_map(|(idx, region)| {
            best_match(&region.key, candidates.iter().copied(), options).map(|(key, score)| (idx, key, score))
        })
        .collect();

    for (idx, key, score) in fallbacks {
        let Some(record) = by_key.get(key) else {
            continue;
        };
        let region = &mut regions[idx];
        debug!(district = %region.district, candidate = %record.district, score, "fuzzy match");
        report.fuzzy.push((region.key.clone(), key.to_string(), score));
        region.apply(
            record,
            MatchKind::Fuzzy {
                candidate: record.district.clone(),
                score,
            },
        );
    }

    if !table.has_category_column {
        for region in regions.iter_mut() {
            region.category = region.cluster.and_then(Category::from_cluster);
        }
    }

    report.unmatched = regions
        .iter()
        .filter(|r| r.match_kind == MatchKind::Unmatched)
        .map(|r| r.district.clone())
        .collect();

    info!(
        exact = report.exact,
        fuzzy = report.fuzzy.len(),
        unmatched = report.unmatched.len(),
        "joined boundaries with cluster table"
    );

    report
}
