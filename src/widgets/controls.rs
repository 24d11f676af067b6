use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    widgets::{Paragraph, Widget},
};

use crate::notice::{Notice, NoticeKind};

/// Key hints for the focused pane.
pub type KeyHints = &'static [(&'static str, &'static str)];

pub const FILE_CONTROLS: KeyHints = &[
    ("Enter", "Open"),
    ("d", "Delete"),
    ("R", "Refresh"),
    ("Tab", "Table"),
    ("q", "Quit"),
];

pub const TABLE_CONTROLS: KeyHints = &[
    ("←→", "Page"),
    ("g/G", "First/Last"),
    ("+/-", "Size"),
    ("r", "Retry"),
    ("c/x/y", "Chart"),
    ("Enter", "Generate"),
    ("Tab", "Files"),
    ("q", "Quit"),
];

/// Bottom bar: key hints on the left, paging status on the right.
pub struct Controls {
    pub hints: KeyHints,
    pub status: Option<String>,
}

impl Controls {
    pub fn new(hints: KeyHints) -> Self {
        Self {
            hints,
            status: None,
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}

impl Widget for &Controls {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut constraints = self.hints.iter().fold(vec![], |mut acc, (key, action)| {
            acc.push(Constraint::Length(key.chars().count() as u16 + 2));
            acc.push(Constraint::Length(action.chars().count() as u16 + 1));
            acc
        });
        constraints.push(Constraint::Fill(1));

        let layout = Layout::new(Direction::Horizontal, constraints).split(area);
        let color = Color::DarkGray;
        let base_style = Style::default();

        for (i, (key, action)) in self.hints.iter().enumerate() {
            let j = i * 2;
            Paragraph::new(*key)
                .style(base_style.bold())
                .centered()
                .render(layout[j], buf);
            Paragraph::new(*action)
                .style(base_style.bg(color))
                .render(layout[j + 1], buf);
        }

        Paragraph::new(self.status.clone().unwrap_or_default())
            .style(base_style.bg(color).fg(Color::White))
            .right_aligned()
            .render(layout[self.hints.len() * 2], buf);
    }
}

/// One-line display of the most recent notice.
pub struct NoticeLine<'a> {
    pub notice: Option<&'a Notice>,
}

impl Widget for NoticeLine<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(notice) = self.notice else {
            return;
        };
        let style = match notice.kind {
            NoticeKind::Success => Style::default().fg(Color::Green),
            NoticeKind::Error => Style::default().fg(Color::Red).bold(),
        };
        Paragraph::new(notice.message.as_str())
            .style(style)
            .render(area, buf);
    }
}
