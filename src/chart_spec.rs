//! Chart selection state: chart type plus x/y columns, validated before rendering.

use std::fmt;
use std::str::FromStr;

use crate::error::ChartError;
use crate::render::Renderer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartType {
    Bar,
    Line,
    Pie,
    Scatter,
}

impl ChartType {
    pub const ALL: [Self; 4] = [Self::Bar, Self::Line, Self::Pie, Self::Scatter];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bar => "Bar",
            Self::Line => "Line",
            Self::Pie => "Pie",
            Self::Scatter => "Scatter",
        }
    }

    /// Next type in [`ChartType::ALL`], wrapping around.
    pub fn cycle(self) -> Self {
        let idx = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartType {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ChartError::UnknownChartType(s.to_string()))
    }
}

/// A complete chart selection. Only built by [`ChartSpec::generate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartConfiguration {
    pub chart_type: ChartType,
    pub x_column: String,
    pub y_column: String,
}

impl ChartConfiguration {
    pub fn title(&self) -> String {
        format!(
            "{} Chart: {} vs {}",
            self.chart_type, self.x_column, self.y_column
        )
    }
}

/// The last generated chart. `current` is false once any field changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedChart {
    pub config: ChartConfiguration,
    pub current: bool,
}

/// Three independent optional fields; setting one never touches the others.
#[derive(Debug, Default, Clone)]
pub struct ChartSpec {
    chart_type: Option<ChartType>,
    x_column: Option<String>,
    y_column: Option<String>,
    rendered: Option<RenderedChart>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl ChartSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chart_type(&self) -> Option<ChartType> {
        self.chart_type
    }

    pub fn x_column(&self) -> Option<&str> {
        self.x_column.as_deref()
    }

    pub fn y_column(&self) -> Option<&str> {
        self.y_column.as_deref()
    }

    pub fn set_chart_type(&mut self, chart_type: Option<ChartType>) {
        if self.chart_type != chart_type {
            self.chart_type = chart_type;
            self.mark_stale();
        }
    }

    pub fn set_x_column(&mut self, column: Option<String>) {
        let column = non_empty(column);
        if self.x_column != column {
            self.x_column = column;
            self.mark_stale();
        }
    }

    pub fn set_y_column(&mut self, column: Option<String>) {
        let column = non_empty(column);
        if self.y_column != column {
            self.y_column = column;
            self.mark_stale();
        }
    }

    fn mark_stale(&mut self) {
        if let Some(rendered) = self.rendered.as_mut() {
            rendered.current = false;
        }
    }

    pub fn is_complete(&self) -> bool {
        self.chart_type.is_some() && self.x_column.is_some() && self.y_column.is_some()
    }

    /// Fails when a selected column is not in `available_columns`. Unset fields pass.
    pub fn validate(&self, available_columns: &[String]) -> Result<(), ChartError> {
        for column in [&self.x_column, &self.y_column].into_iter().flatten() {
            if !available_columns.iter().any(|c| c == column) {
                return Err(ChartError::InvalidColumn {
                    column: column.clone(),
                });
            }
        }
        Ok(())
    }

    /// Record the selection as the rendered chart and hand it to `renderer`.
    ///
    /// On error the previously rendered chart is left as it was.
    pub fn generate<R: Renderer + ?Sized>(
        &mut self,
        available_columns: &[String],
        renderer: &mut R,
    ) -> Result<&ChartConfiguration, ChartError> {
        let (Some(chart_type), Some(x_column), Some(y_column)) =
            (self.chart_type, &self.x_column, &self.y_column)
        else {
            return Err(ChartError::IncompleteConfiguration);
        };
        self.validate(available_columns)?;

        let config = ChartConfiguration {
            chart_type,
            x_column: x_column.clone(),
            y_column: y_column.clone(),
        };
        renderer.render_chart(&config);
        let rendered = self.rendered.insert(RenderedChart {
            config,
            current: true,
        });
        Ok(&rendered.config)
    }

    pub fn rendered(&self) -> Option<&RenderedChart> {
        self.rendered.as_ref()
    }

    /// True when a chart was generated and the selection changed since.
    pub fn is_stale(&self) -> bool {
        self.rendered.as_ref().is_some_and(|r| !r.current)
    }

    /// Title for the current selection, if complete.
    pub fn title(&self) -> Option<String> {
        match (self.chart_type, &self.x_column, &self.y_column) {
            (Some(t), Some(x), Some(y)) => Some(format!("{t} Chart: {x} vs {y}")),
            _ => None,
        }
    }

    /// Clear all fields and the rendered chart.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
