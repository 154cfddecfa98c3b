use crate::category::Category;
use crate::data::error::LoadError;
use crate::data::key::normalize_key;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, warn};

/// Column headers of the cluster-result table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumns {
    pub name: String,
    pub cluster: String,
    pub category: String,
    pub food_security_index: String,
    pub rice_productivity: String,
    pub rice_production: String,
    pub grdp: String,
}

impl Default for TableColumns {
    fn default() -> Self {
        Self {
            name: "Kabupaten/Kota".to_string(),
            cluster: "Cluster".to_string(),
            category: "Kategori_Ketahanan_Pangan".to_string(),
            food_security_index: "IKP".to_string(),
            rice_productivity: "Produktivitas_Padi".to_string(),
            rice_production: "Produksi_Beras".to_string(),
            grdp: "PDRB".to_string(),
        }
    }
}

/// Numeric indicators attached to a district
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Indicators {
    /// IKP, food-security index
    pub food_security_index: Option<f64>,
    /// Rice productivity (ku/ha)
    pub rice_productivity: Option<f64>,
    /// Rice production (ton)
    pub rice_production: Option<f64>,
    /// PDRB, gross regional domestic product
    pub grdp: Option<f64>,
    /// Every other numeric column, by header
    pub extra: BTreeMap<String, f64>,
}

/// One row of the cluster-result table
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterRecord {
    pub district: String,
    pub key: String,
    pub cluster: Option<u8>,
    pub category: Option<Category>,
    /// Category cell as written, kept for labels `Category::parse` does not know
    pub category_label: Option<String>,
    pub indicators: Indicators,
}

#[derive(Debug, Clone, Default)]
pub struct ClusterTable {
    pub records: Vec<ClusterRecord>,
    /// Source carried its own category column
    pub has_category_column: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    fn number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(*n),
            Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    fn text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Number(n) if n.fract() == 0.0 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
            Cell::Text(s) => s.trim().to_string(),
        }
    }
}

static EMPTY_CELL: Cell = Cell::Empty;

struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

/// Parse the cluster table from the bytes of a spreadsheet (`.xlsx`,
/// `.xlsm`, `.xls`, `.ods`) or a `.csv` file. The format follows the
/// extension of `path`. `sheet` selects a worksheet by name; the first sheet
/// is used otherwise.
pub fn parse_cluster_table(
    path: &Path,
    bytes: Vec<u8>,
    sheet: Option<&str>,
    columns: &TableColumns,
) -> Result<ClusterTable, LoadError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let raw = match extension.as_str() {
        "csv" => read_csv(path, &bytes)?,
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => read_spreadsheet(path, bytes, sheet)?,
        _ => {
            return Err(LoadError::UnsupportedFormat {
                path: path.to_path_buf(),
            })
        }
    };

    let table = build_table(path, raw, columns)?;
    debug!(
        path = %path.display(),
        records = table.records.len(),
        category_column = table.has_category_column,
        "read cluster table"
    );
    Ok(table)
}

fn read_spreadsheet(path: &Path, bytes: Vec<u8>, sheet: Option<&str>) -> Result<RawTable, LoadError> {
    let spreadsheet_error = |message: String| LoadError::Spreadsheet {
        path: path.to_path_buf(),
        message,
    };

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| spreadsheet_error(e.to_string()))?;
    let sheet_name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| spreadsheet_error("workbook has no sheets".to_string()))?,
    };
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| spreadsheet_error(format!("sheet {sheet_name:?}: {e}")))?;

    let mut rows = range.rows();
    let headers = rows
        .next()
        .ok_or_else(|| LoadError::EmptyTable {
            path: path.to_path_buf(),
        })?
        .iter()
        .map(|cell| from_data(cell).text())
        .collect();
    let rows = rows.map(|row| row.iter().map(from_data).collect()).collect();

    Ok(RawTable { headers, rows })
}

fn from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) if s.trim().is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Error(_) => Cell::Empty,
        other => Cell::Text(other.to_string()),
    }
}

fn read_csv(path: &Path, bytes: &[u8]) -> Result<RawTable, LoadError> {
    let csv_error = |source: csv::Error| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(LoadError::EmptyTable {
            path: path.to_path_buf(),
        });
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        rows.push(record.iter().map(from_field).collect());
    }

    Ok(RawTable { headers, rows })
}

fn from_field(field: &str) -> Cell {
    let field = field.trim();
    if field.is_empty() {
        Cell::Empty
    } else if let Ok(n) = field.parse::<f64>() {
        Cell::Number(n)
    } else {
        Cell::Text(field.to_string())
    }
}

/// Header lookup: exact match first, then case-insensitive
fn find_column(headers: &[String], wanted: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h == wanted)
        .or_else(|| headers.iter().position(|h| h.eq_ignore_ascii_case(wanted)))
}

fn build_table(path: &Path, raw: RawTable, columns: &TableColumns) -> Result<ClusterTable, LoadError> {
    let required = |column: &str| {
        find_column(&raw.headers, column).ok_or_else(|| LoadError::MissingColumn {
            path: path.to_path_buf(),
            column: column.to_string(),
        })
    };
    let name_col = required(&columns.name)?;
    let cluster_col = required(&columns.cluster)?;
    let category_col = find_column(&raw.headers, &columns.category);
    let fsi_col = find_column(&raw.headers, &columns.food_security_index);
    let productivity_col = find_column(&raw.headers, &columns.rice_productivity);
    let production_col = find_column(&raw.headers, &columns.rice_production);
    let grdp_col = find_column(&raw.headers, &columns.grdp);

    let named: Vec<usize> = [Some(name_col), Some(cluster_col), category_col, fsi_col, productivity_col, production_col, grdp_col]
        .into_iter()
        .flatten()
        .collect();

    let mut records = Vec::with_capacity(raw.rows.len());
    for (line, row) in raw.rows.iter().enumerate() {
        if row.iter().all(|c| *c == Cell::Empty) {
            continue;
        }
        let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i)).unwrap_or(&EMPTY_CELL);
        let number = |idx: Option<usize>| cell(idx).number();

        let district = cell(Some(name_col)).text();
        let cluster = parse_cluster(cell(Some(cluster_col)));
        if cluster.is_none() && *cell(Some(cluster_col)) != Cell::Empty {
            warn!(row = line + 2, district = %district, value = ?cell(Some(cluster_col)), "cluster id is not a small non-negative integer");
        }

        let category_label = category_col
            .map(|_| cell(category_col).text())
            .filter(|text| !text.is_empty());
        let category = category_label.as_deref().and_then(|text| {
            let parsed = Category::parse(text);
            if parsed.is_none() {
                warn!(row = line + 2, district = %district, label = %text, "unknown category label");
            }
            parsed
        });

        let extra = raw
            .headers
            .iter()
            .enumerate()
            .filter(|(idx, header)| !named.contains(idx) && !header.is_empty())
            .filter_map(|(idx, header)| number(Some(idx)).map(|n| (header.clone(), n)))
            .collect();

        records.push(ClusterRecord {
            key: normalize_key(&district),
            district,
            cluster,
            category,
            category_label,
            indicators: Indicators {
                food_security_index: number(fsi_col),
                rice_productivity: number(productivity_col),
                rice_production: number(production_col),
                grdp: number(grdp_col),
                extra,
            },
        });
    }

    Ok(ClusterTable {
        records,
        has_category_column: category_col.is_some(),
    })
}

fn parse_cluster(cell: &Cell) -> Option<u8> {
    let n = cell.number()?;
    if n.fract() == 0.0 && (0.0..=u8::MAX as f64).contains(&n) {
        Some(n as u8)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use std::path::PathBuf;

    fn read_cluster_table(path: &Path, sheet: Option<&str>, columns: &TableColumns) -> Result<ClusterTable, LoadError> {
        parse_cluster_table(path, fs::read(path).unwrap(), sheet, columns)
    }

    fn xlsx_fixture() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/clusters.xlsx")
    }

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_reads_csv_records() {
        let file = write_csv(
            "Kabupaten/Kota,IKP,Produktivitas_Padi,Produksi_Beras,PDRB,RLS,Cluster\n\
             Aceh Besar,72.5,55.1,120000,9000,8.9,4\n\
             Kota Banda Aceh,80.0,,0,25000,12.1,2.0\n",
        );
        let table = read_cluster_table(file.path(), None, &TableColumns::default()).unwrap();
        assert!(!table.has_category_column);
        assert_eq!(table.records.len(), 2);

        let first = &table.records[0];
        assert_eq!(first.district, "Aceh Besar");
        assert_eq!(first.key, "ACEH BESAR");
        assert_eq!(first.cluster, Some(4));
        assert_eq!(first.indicators.food_security_index, Some(72.5));
        assert_eq!(first.indicators.extra.get("RLS"), Some(&8.9));

        let second = &table.records[1];
        assert_eq!(second.key, "BANDA ACEH");
        assert_eq!(second.cluster, Some(2));
        assert_eq!(second.indicators.rice_productivity, None);
        assert_eq!(second.indicators.rice_production, Some(0.0));
    }

    #[test]
    fn test_category_column_is_parsed() {
        let file = write_csv(
            "Kabupaten/Kota,Cluster,Kategori_Ketahanan_Pangan\n\
             Langsa,3,Sangat Rentan\n\
             Nias,1,\n",
        );
        let table = read_cluster_table(file.path(), None, &TableColumns::default()).unwrap();
        assert!(table.has_category_column);
        assert_eq!(table.records[0].category, Some(Category::VeryVulnerable));
        assert_eq!(table.records[1].category, None);
    }

    #[test]
    fn test_invalid_cluster_is_absent() {
        let file = write_csv("Kabupaten/Kota,Cluster\nA,1.5\nB,-1\nC,x\nD,\n");
        let table = read_cluster_table(file.path(), None, &TableColumns::default()).unwrap();
        assert!(table.records.iter().all(|r| r.cluster.is_none()));
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let file = write_csv("kabupaten/kota,CLUSTER\nAgam,0\n");
        let table = read_cluster_table(file.path(), None, &TableColumns::default()).unwrap();
        assert_eq!(table.records[0].cluster, Some(0));
    }

    #[test]
    fn test_missing_required_column() {
        let file = write_csv("Kabupaten/Kota,IKP\nAgam,70\n");
        let err = read_cluster_table(file.path(), None, &TableColumns::default()).unwrap_err();
        match err {
            LoadError::MissingColumn { column, .. } => assert_eq!(column, "Cluster"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_blank_rows_skipped() {
        let file = write_csv("Kabupaten/Kota,Cluster\nAgam,0\n,\nSolok,1\n");
        let table = read_cluster_table(file.path(), None, &TableColumns::default()).unwrap();
        assert_eq!(table.records.len(), 2);
    }

    #[test]
    fn test_unsupported_extension() {
        let mut file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        file.write_all(b"x").unwrap();
        let err = read_cluster_table(file.path(), None, &TableColumns::default()).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_unknown_category_keeps_raw_label() {
        let file = write_csv(
            "Kabupaten/Kota,Cluster,Kategori_Ketahanan_Pangan\n\
             Agam,3,Cukup Tahan\n\
             Solok,4,Tahan\n",
        );
        let table = read_cluster_table(file.path(), None, &TableColumns::default()).unwrap();
        assert_eq!(table.records[0].category, None);
        assert_eq!(table.records[0].category_label.as_deref(), Some("Cukup Tahan"));
        assert_eq!(table.records[1].category, Some(Category::Resilient));
        assert_eq!(table.records[1].category_label.as_deref(), Some("Tahan"));
    }

    #[test]
    fn test_xlsx_first_sheet_by_default() {
        let table = read_cluster_table(&xlsx_fixture(), None, &TableColumns::default()).unwrap();
        assert!(!table.has_category_column);
        assert_eq!(table.records.len(), 3);

        let first = &table.records[0];
        assert_eq!(first.district, "Aceh Besar");
        assert_eq!(first.key, "ACEH BESAR");
        assert_eq!(first.cluster, Some(0));
        assert_eq!(first.indicators.food_security_index, Some(70.5));

        assert_eq!(table.records[1].key, "BANDA ACEH");
        assert_eq!(table.records[1].cluster, Some(4));
        assert_eq!(table.records[2].cluster, None);
    }

    #[test]
    fn test_xlsx_named_sheet() {
        let table = read_cluster_table(&xlsx_fixture(), Some("Riau"), &TableColumns::default()).unwrap();
        let names: Vec<&str> = table.records.iter().map(|r| r.district.as_str()).collect();
        assert_eq!(names, ["Pekanbaru", "Kampar"]);
        assert!(table.records.iter().all(|r| r.cluster == Some(5)));
        assert!(table.has_category_column);
        assert_eq!(table.records[0].category, Some(Category::VeryResilient));
    }

    #[test]
    fn test_xlsx_missing_sheet() {
        let err = read_cluster_table(&xlsx_fixture(), Some("Bali"), &TableColumns::default()).unwrap_err();
        match err {
            LoadError::Spreadsheet { message, .. } => assert!(message.contains("Bali"), "{message}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_spreadsheet_cells() {
        assert_eq!(from_data(&Data::Int(3)), Cell::Number(3.0));
        assert_eq!(from_data(&Data::Float(2.0)), Cell::Number(2.0));
        assert_eq!(from_data(&Data::String("  ".to_string())), Cell::Empty);
        assert_eq!(parse_cluster(&from_data(&Data::Int(3))), Some(3));
        assert_eq!(parse_cluster(&from_data(&Data::Float(4.0))), Some(4));
        assert_eq!(parse_cluster(&from_data(&Data::Float(1.5))), None);
    }

    #[test]
    fn test_garbage_spreadsheet_bytes() {
        let err = parse_cluster_table(Path::new("hasil.xlsx"), b"not a zip".to_vec(), None, &TableColumns::default())
            .unwrap_err();
        assert!(matches!(err, LoadError::Spreadsheet { .. }));
    }
}
