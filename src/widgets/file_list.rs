use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, StatefulWidget},
};

use crate::format::{format_file_size, format_timestamp};
use crate::store::{FileId, FileRecord};

/// Uploaded files, newest first. The active file is marked.
pub struct FileList<'a> {
    pub files: &'a [FileRecord],
    pub active: Option<FileId>,
    pub focused: bool,
}

impl StatefulWidget for FileList<'_> {
    type State = ListState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut ListState) {
        let items: Vec<ListItem> = self
            .files
            .iter()
            .map(|file| {
                let marker = if Some(file.id) == self.active { "● " } else { "  " };
                ListItem::new(vec![
                    Line::from(vec![
                        Span::raw(marker),
                        Span::styled(
                            file.display_name.clone(),
                            Style::default().add_modifier(Modifier::BOLD),
                        ),
                    ]),
                    Line::from(Span::styled(
                        format!(
                            "  {} · {} rows · {}",
                            format_file_size(file.size_bytes),
                            file.row_count,
                            format_timestamp(&file.created_at)
                        ),
                        Style::default().fg(Color::DarkGray),
                    )),
                ])
            })
            .collect();

        let border = if self.focused {
            Color::Cyan
        } else {
            Color::DarkGray
        };
        let title = format!("Files ({})", self.files.len());
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(border))
                    .title(title),
            )
            .highlight_style(Style::default().bg(Color::DarkGray));
        StatefulWidget::render(list, area, buf, state);
    }
}
