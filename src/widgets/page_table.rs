use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Paragraph, Row, Table, Widget},
};

use crate::format::CellFormat;
use crate::store::{CellValue, ColumnInfo};

const MAX_COLUMN_WIDTH: usize = 30;

/// One page of rows with a header derived from the page's columns.
pub struct PageTable<'a> {
    pub columns: &'a [ColumnInfo],
    pub rows: &'a [Vec<CellValue>],
    pub format: CellFormat,
    /// 1-based number of the first row; shown when row numbers are on.
    pub first_row: Option<usize>,
    pub title: String,
    pub focused: bool,
}

impl PageTable<'_> {
    fn formatted_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .zip(self.columns)
                    .map(|(value, col)| self.format.format(value, col.kind))
                    .collect()
            })
            .collect()
    }
}

impl Widget for PageTable<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border = if self.focused {
            Color::Cyan
        } else {
            Color::DarkGray
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(self.title.clone());

        if self.columns.is_empty() {
            Paragraph::new("No file open. Select a file and press Enter.")
                .style(Style::default().fg(Color::DarkGray))
                .block(block)
                .render(area, buf);
            return;
        }

        let cells = self.formatted_rows();
        let mut widths: Vec<usize> = self
            .columns
            .iter()
            .map(|c| c.name.chars().count())
            .collect();
        for row in &cells {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.chars().count());
            }
        }

        let mut constraints: Vec<Constraint> = Vec::with_capacity(widths.len() + 1);
        let mut header: Vec<String> = Vec::with_capacity(widths.len() + 1);
        let number_width = self
            .first_row
            .map(|first| (first + cells.len()).to_string().len().max(1));
        if let Some(w) = number_width {
            constraints.push(Constraint::Length(w as u16));
            header.push(String::new());
        }
        constraints.extend(
            widths
                .iter()
                .map(|w| Constraint::Length((*w).min(MAX_COLUMN_WIDTH) as u16)),
        );
        header.extend(self.columns.iter().map(|c| c.name.clone()));

        let rows: Vec<Row> = cells
            .into_iter()
            .enumerate()
            .map(|(idx, row)| {
                let mut out = Vec::with_capacity(row.len() + 1);
                if let Some(first) = self.first_row {
                    out.push(format!("{}", first + idx));
                }
                out.extend(row);
                Row::new(out)
            })
            .collect();

        let header_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
        let table = Table::new(rows, constraints)
            .header(Row::new(header).style(header_style))
            .column_spacing(2)
            .block(block);
        Widget::render(table, area, buf);
    }
}

