use crate::dashboard::{format_number, format_optional, DashboardView};
use crate::data::Dataset;
use std::io::{self, Write};

/// Plain-text join report, plus the province view when one is given
pub fn write_report(out: &mut impl Write, dataset: &Dataset, view: Option<&DashboardView>) -> io::Result<()> {
    let report = &dataset.report;
    writeln!(out, "regions:    {}", dataset.regions.len())?;
    writeln!(out, "provinces:  {}", dataset.provinces.join(", "))?;
    writeln!(out, "exact:      {}", report.exact)?;
    writeln!(out, "fuzzy:      {}", report.fuzzy.len())?;
    for (key, candidate, score) in &report.fuzzy {
        writeln!(out, "  {key} -> {candidate} ({score:.3})")?;
    }
    writeln!(out, "unmatched:  {}", report.unmatched.len())?;
    for name in &report.unmatched {
        writeln!(out, "  {name}")?;
    }
    if !report.duplicate_keys.is_empty() {
        writeln!(out, "duplicate cluster keys: {}", report.duplicate_keys.join(", "))?;
    }

    let Some(view) = view else {
        return Ok(());
    };

    let agg = &view.aggregates;
    writeln!(out)?;
    writeln!(out, "province:   {}", view.province)?;
    writeln!(out, "mean IKP:                {}", format_number(agg.mean_food_security, 2))?;
    writeln!(out, "mean rice productivity:  {} ku/ha", format_number(agg.mean_rice_productivity, 2))?;
    writeln!(out, "total rice production:   {} ton", format_number(agg.total_rice_production, 0))?;
    writeln!(out, "total PDRB:              {}", format_number(agg.total_grdp, 0))?;
    writeln!(out, "clusters:")?;
    for row in &view.summary {
        writeln!(
            out,
            "  {:>2}  {:<20} districts={:<3} IKP={}",
            row.cluster,
            row.category.map(|c| c.label()).unwrap_or("-"),
            row.districts,
            format_number(row.mean_food_security, 2),
        )?;
    }
    writeln!(out, "districts:")?;
    for row in &view.details {
        writeln!(
            out,
            "  {:<28} cluster={:<2} IKP={:<8} {}",
            row.district,
            row.cluster.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string()),
            format_optional(row.food_security_index, 2),
            row.provenance,
        )?;
    }
    Ok(())
}
