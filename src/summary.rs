//! Per-column file summaries.
//!
//! Numeric columns report min/max/mean over their non-null values. Every other
//! column reports its number of distinct values and the most frequent value,
//! with ties going to the value seen first. All columns report a null count.

use std::collections::HashMap;

use polars::prelude::*;
use serde::Serialize;

use crate::store::{ColumnKind, FileId};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileSummary {
    pub file_id: FileId,
    pub row_count: usize,
    pub column_count: usize,
    pub columns: Vec<ColumnSummary>,
}

impl FileSummary {
    pub fn column(&self, name: &str) -> Option<&ColumnSummary> {
        self.columns.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub kind: ColumnKind,
    pub null_count: usize,
    pub numeric: Option<NumericSummary>,
    pub categorical: Option<CategoricalSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalSummary {
    pub unique_count: usize,
    pub most_frequent: Option<(String, usize)>,
}

/// Summarize every column of `df`.
pub fn summarize_frame(file_id: FileId, df: &DataFrame) -> PolarsResult<FileSummary> {
    let mut columns = Vec::with_capacity(df.width());

    for column in df.get_columns() {
        let series = column.as_materialized_series();
        let kind = ColumnKind::from_dtype(series.dtype());
        let null_count = series.null_count();

        let (numeric, categorical) = if kind.is_numeric() {
            (numeric_summary(series)?, None)
        } else {
            let mut values = Vec::with_capacity(series.len() - null_count);
            for idx in 0..series.len() {
                let value = series.get(idx)?;
                if !value.is_null() {
                    values.push(value.str_value().into_owned());
                }
            }
            (None, Some(categorical_summary(values)))
        };

        columns.push(ColumnSummary {
            name: series.name().to_string(),
            kind,
            null_count,
            numeric,
            categorical,
        });
    }

    Ok(FileSummary {
        file_id,
        row_count: df.height(),
        column_count: df.width(),
        columns,
    })
}

fn numeric_summary(series: &Series) -> PolarsResult<Option<NumericSummary>> {
    let cast = series.cast(&DataType::Float64)?;
    let values: Vec<f64> = cast.f64()?.iter().flatten().collect();
    Ok(numeric_summary_of(&values))
}

/// Min, max and mean of `values`; `None` when there are no values.
pub fn numeric_summary_of(values: &[f64]) -> Option<NumericSummary> {
    if values.is_empty() {
        return None;
    }
    let (min, max, sum) = values.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY, 0.0),
        |(min, max, sum), &v| (min.min(v), max.max(v), sum + v),
    );
    Some(NumericSummary {
        min,
        max,
        mean: sum / values.len() as f64,
    })
}

/// Distinct count and most frequent value of `values`, ties broken by first appearance.
pub fn categorical_summary<I>(values: I) -> CategoricalSummary
where
    I: IntoIterator<Item = String>,
{
    // value -> (count, first position)
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (pos, value) in values.into_iter().enumerate() {
        counts.entry(value).or_insert((0, pos)).0 += 1;
    }

    let most_frequent = counts
        .iter()
        .max_by(|(_, (ca, pa)), (_, (cb, pb))| ca.cmp(cb).then(pb.cmp(pa)))
        .map(|(value, (count, _))| (value.clone(), *count));

    CategoricalSummary {
        unique_count: counts.len(),
        most_frequent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_mode_tie_goes_to_first_seen() {
        let summary = categorical_summary(strings(&["b", "a", "a", "b", "c"]));
        assert_eq!(summary.unique_count, 3);
        assert_eq!(summary.most_frequent, Some(("b".to_string(), 2)));
    }

    #[test]
    fn test_empty_categorical() {
        let summary = categorical_summary(Vec::new());
        assert_eq!(summary.unique_count, 0);
        assert_eq!(summary.most_frequent, None);
    }

    #[test]
    fn test_numeric_summary_of() {
        let s = numeric_summary_of(&[3.0, 1.0, 5.0, 3.0]).unwrap();
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 5.0);
        assert_eq!(s.mean, 3.0);
        assert!(numeric_summary_of(&[]).is_none());
    }

    #[test]
    fn test_summarize_frame_mixed_columns() -> color_eyre::Result<()> {
        let df = df! {
            "region" => &[Some("east"), Some("west"), None, Some("east")],
            "sales" => &[Some(10i64), None, Some(30), Some(20)],
        }?;
        let summary = summarize_frame(FileId::random(), &df)?;
        assert_eq!(summary.row_count, 4);
        assert_eq!(summary.column_count, 2);

        let region = summary.column("region").unwrap();
        assert_eq!(region.kind, ColumnKind::Text);
        assert_eq!(region.null_count, 1);
        let cat = region.categorical.as_ref().unwrap();
        assert_eq!(cat.unique_count, 2);
        assert_eq!(cat.most_frequent, Some(("east".to_string(), 2)));

        let sales = summary.column("sales").unwrap();
        assert_eq!(sales.kind, ColumnKind::Integer);
        assert_eq!(sales.null_count, 1);
        let num = sales.numeric.unwrap();
        assert_eq!(num.min, 10.0);
        assert_eq!(num.max, 30.0);
        assert_eq!(num.mean, 20.0);
        Ok(())
    }
}
