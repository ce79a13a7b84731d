//! Conversion of canonical records into polars DataFrames.

use std::fs::File;
use std::path::Path;

use polars::prelude::*;
use tracing::debug;

use facts_core::{CanonicalRecord, FactError, Metric, PeriodRole, Result, YearBlock};

/// A present year block and the record it belongs to.
type Row<'a> = (&'a CanonicalRecord, PeriodRole, &'a YearBlock);

fn text_column<'a>(
    name: &str,
    rows: &[Row<'a>],
    value: impl Fn(&'a CanonicalRecord) -> Option<&'a str>,
) -> Column {
    let values: Vec<Option<&str>> = rows.iter().map(|(record, _, _)| value(record)).collect();
    Column::new(name.into(), values)
}

/// Converts records into one row per present year block.
///
/// Identity columns come first (`doc_id`, `security_code`, `company_name`,
/// `accounting_standard`, `consolidation_type`, `report_type`,
/// `fiscal_year_end`, `period`, `period_start`, `period_end`), followed by one
/// `Float64` column per metric in output order.
///
/// # Errors
/// Returns [`FactError::Frame`] if the frame cannot be built.
pub fn records_to_frame(records: &[CanonicalRecord]) -> Result<DataFrame> {
    let rows: Vec<Row<'_>> = records
        .iter()
        .flat_map(|record| {
            [
                (PeriodRole::Current, record.current_year.as_ref()),
                (PeriodRole::Prior, record.prior_year.as_ref()),
            ]
            .into_iter()
            .filter_map(move |(role, block)| block.map(|block| (record, role, block)))
        })
        .collect();

    let mut columns = vec![
        text_column("doc_id", &rows, |r| Some(r.doc_id.as_str())),
        text_column("security_code", &rows, |r| r.security_code.as_deref()),
        text_column("company_name", &rows, |r| r.company_name.as_deref()),
        text_column("accounting_standard", &rows, |r| {
            r.accounting_standard.as_deref()
        }),
        text_column("consolidation_type", &rows, |r| {
            Some(r.consolidation_type.as_str())
        }),
        text_column("report_type", &rows, |r| Some(r.report_type.as_str())),
        text_column("fiscal_year_end", &rows, |r| r.fiscal_year_end.as_deref()),
        Column::new(
            "period".into(),
            rows.iter()
                .map(|(_, role, _)| role.to_string())
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "period_start".into(),
            rows.iter()
                .map(|(_, _, block)| block.period.map(|p| p.start.to_string()))
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "period_end".into(),
            rows.iter()
                .map(|(_, _, block)| block.period.map(|p| p.end.to_string()))
                .collect::<Vec<_>>(),
        ),
    ];

    for metric in Metric::ALL {
        let values: Vec<Option<f64>> = rows
            .iter()
            .map(|(_, _, block)| block.get(metric).map(|v| v.as_f64()))
            .collect();
        columns.push(Column::new(metric.as_str().into(), values));
    }

    let df = DataFrame::new(columns).map_err(|e| FactError::Frame(e.to_string()))?;

    // Convert date strings to Date type
    let df = df
        .lazy()
        .with_columns([
            col("period_start").cast(DataType::Date),
            col("period_end").cast(DataType::Date),
        ])
        .collect()
        .map_err(|e| FactError::Frame(e.to_string()))?;

    debug!(rows = df.height(), "Built record frame");
    Ok(df)
}

/// Writes a frame to a parquet file.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn write_parquet(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<()> {
    let file = File::create(path.as_ref())?;
    ParquetWriter::new(file)
        .finish(df)
        .map_err(|e| FactError::Frame(e.to_string()))?;
    debug!(path = %path.as_ref().display(), rows = df.height(), "Wrote parquet");
    Ok(())
}
