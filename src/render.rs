//! Output seam for table pages and validated charts.

use crate::chart_spec::ChartConfiguration;
use crate::store::{CellValue, ColumnInfo};

pub trait Renderer {
    fn render_table(&mut self, columns: &[ColumnInfo], rows: &[Vec<CellValue>]);

    /// Called only with a complete configuration whose columns exist in the active file.
    fn render_chart(&mut self, chart: &ChartConfiguration);

    fn clear(&mut self);
}

impl<R: Renderer + ?Sized> Renderer for &mut R {
    fn render_table(&mut self, columns: &[ColumnInfo], rows: &[Vec<CellValue>]) {
        (**self).render_table(columns, rows);
    }

    fn render_chart(&mut self, chart: &ChartConfiguration) {
        (**self).render_chart(chart);
    }

    fn clear(&mut self) {
        (**self).clear();
    }
}

/// What a [`RecordingRenderer`] saw last.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Table {
        columns: Vec<ColumnInfo>,
        rows: Vec<Vec<CellValue>>,
    },
    Chart(ChartConfiguration),
    Cleared,
}

/// Keeps every render call. Backs the CLI output path and tests.
#[derive(Debug, Default, Clone)]
pub struct RecordingRenderer {
    pub calls: Vec<Rendered>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&Rendered> {
        self.calls.last()
    }

    pub fn table_renders(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, Rendered::Table { .. }))
            .count()
    }

    pub fn chart_renders(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, Rendered::Chart(_)))
            .count()
    }
}

impl Renderer for RecordingRenderer {
    fn render_table(&mut self, columns: &[ColumnInfo], rows: &[Vec<CellValue>]) {
        self.calls.push(Rendered::Table {
            columns: columns.to_vec(),
            rows: rows.to_vec(),
        });
    }

    fn render_chart(&mut self, chart: &ChartConfiguration) {
        self.calls.push(Rendered::Chart(chart.clone()));
    }

    fn clear(&mut self) {
        self.calls.push(Rendered::Cleared);
    }
}
