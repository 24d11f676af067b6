//! Interactive terminal browser.
//!
//! Page fetches run on a single worker thread. The worker always executes the
//! newest queued request and drops older ones; results come back as
//! [`AppEvent::PageLoaded`] and go through the session's ticket check, so only
//! the latest request can change what is shown.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, ListState, Paragraph, StatefulWidget, Widget},
    DefaultTerminal,
};
use tracing::{debug, warn};

use crate::chart_spec::{ChartConfiguration, ChartType};
use crate::config::AppConfig;
use crate::controller::SessionController;
use crate::error::StoreError;
use crate::format::CellFormat;
use crate::notice::{NoticeLog, Notifier};
use crate::render::Renderer;
use crate::store::{CellValue, ColumnInfo, DataStore, FileId, PageResult};
use crate::table_session::{FetchTicket, PageFetch, SessionState};
use crate::widgets::controls::{Controls, NoticeLine, FILE_CONTROLS, TABLE_CONTROLS};
use crate::widgets::file_list::FileList;
use crate::widgets::page_table::PageTable;

pub type SharedStore = Arc<dyn DataStore + Send + Sync>;

pub enum AppEvent {
    Key(KeyEvent),
    PageLoaded(FetchTicket, Result<PageResult, StoreError>),
    Exit,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    #[default]
    Files,
    Table,
}

/// What the browser draws: the last rendered page and chart.
#[derive(Debug, Default)]
pub struct Screen {
    pub columns: Vec<ColumnInfo>,
    pub rows: Vec<Vec<CellValue>>,
    pub chart: Option<ChartConfiguration>,
}

impl Renderer for Screen {
    fn render_table(&mut self, columns: &[ColumnInfo], rows: &[Vec<CellValue>]) {
        self.columns = columns.to_vec();
        self.rows = rows.to_vec();
    }

    fn render_chart(&mut self, chart: &ChartConfiguration) {
        self.chart = Some(chart.clone());
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

pub type BrowserController = SessionController<SharedStore, NoticeLog, Screen>;

/// The status line only shows the newest notice.
const NOTICE_HISTORY: usize = 1;

/// Run fetches for the browser. Exits when either channel closes.
pub fn spawn_fetch_worker(
    store: SharedStore,
    requests: Receiver<PageFetch>,
    events: Sender<AppEvent>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        while let Ok(mut fetch) = requests.recv() {
            while let Ok(newer) = requests.try_recv() {
                debug!(dropped = fetch.ticket.value(), "superseded fetch skipped");
                fetch = newer;
            }
            let outcome = store.fetch_page(&fetch.request);
            if events
                .send(AppEvent::PageLoaded(fetch.ticket, outcome))
                .is_err()
            {
                break;
            }
        }
    })
}

pub struct App {
    controller: BrowserController,
    fetches: Sender<PageFetch>,
    focus: Focus,
    list_state: ListState,
    cell_format: CellFormat,
    row_numbers: bool,
    pending_delete: Option<FileId>,
}

impl App {
    pub fn new(controller: BrowserController, fetches: Sender<PageFetch>, config: &AppConfig) -> Self {
        Self {
            controller,
            fetches,
            focus: Focus::Files,
            list_state: ListState::default(),
            cell_format: config.cell_format(),
            row_numbers: config.display.row_numbers,
            pending_delete: None,
        }
    }

    pub fn controller(&self) -> &BrowserController {
        &self.controller
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    /// Load the catalog and open `initial` (or the newest file).
    pub fn start(&mut self, initial: Option<&str>) {
        let _ = self.controller.refresh();
        let target = match initial {
            Some(query) => self.controller.catalog().find(query).map(|f| f.id),
            None => self.controller.catalog().newest().map(|f| f.id),
        };
        if let (Some(query), None) = (initial, target) {
            self.controller
                .notifier_mut()
                .error(&format!("No file matches '{query}'"));
        }
        if !self.controller.catalog().is_empty() {
            self.list_state.select(Some(0));
        }
        if let Some(id) = target {
            self.select_id(id);
            self.open(id);
        }
    }

    fn select_id(&mut self, id: FileId) {
        let idx = self.controller.catalog().iter().position(|f| f.id == id);
        self.list_state.select(idx);
    }

    fn selected_id(&self) -> Option<FileId> {
        let idx = self.list_state.selected()?;
        self.controller.catalog().files().get(idx).map(|f| f.id)
    }

    fn dispatch(&mut self, fetch: Option<PageFetch>) {
        if let Some(fetch) = fetch {
            if self.fetches.send(fetch).is_err() {
                warn!("fetch worker is gone");
            }
        }
    }

    fn open(&mut self, id: FileId) {
        if let Ok(fetch) = self.controller.open(id) {
            self.focus = Focus::Table;
            self.dispatch(Some(fetch));
        }
    }

    /// Handle one event. Returns a follow-up event (only `Exit`).
    pub fn event(&mut self, event: AppEvent) -> Option<AppEvent> {
        match event {
            AppEvent::Key(key) if key.kind == KeyEventKind::Press => self.key(key),
            AppEvent::Key(_) => None,
            AppEvent::PageLoaded(ticket, outcome) => {
                self.controller.complete(ticket, outcome);
                None
            }
            AppEvent::Exit => Some(AppEvent::Exit),
        }
    }

    fn key(&mut self, key: KeyEvent) -> Option<AppEvent> {
        if let Some(id) = self.pending_delete.take() {
            if key.code == KeyCode::Char('y') {
                let _ = self.controller.delete_file(id);
                let len = self.controller.catalog().len();
                let selected = self.list_state.selected().unwrap_or(0);
                self.list_state
                    .select((len > 0).then(|| selected.min(len - 1)));
                if self.controller.active_file().is_none() {
                    self.focus = Focus::Files;
                }
            }
            return None;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Some(AppEvent::Exit),
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Files => Focus::Table,
                    Focus::Table => Focus::Files,
                };
                return None;
            }
            _ => {}
        }

        match self.focus {
            Focus::Files => self.files_key(key),
            Focus::Table => self.table_key(key),
        }
        None
    }

    fn files_key(&mut self, key: KeyEvent) {
        let len = self.controller.catalog().len();
        match key.code {
            KeyCode::Down | KeyCode::Char('j') if len > 0 => {
                let next = self.list_state.selected().map_or(0, |i| (i + 1).min(len - 1));
                self.list_state.select(Some(next));
            }
            KeyCode::Up | KeyCode::Char('k') if len > 0 => {
                let prev = self.list_state.selected().map_or(0, |i| i.saturating_sub(1));
                self.list_state.select(Some(prev));
            }
            KeyCode::Enter => {
                if let Some(id) = self.selected_id() {
                    self.open(id);
                }
            }
            KeyCode::Char('d') => {
                self.pending_delete = self.selected_id();
            }
            KeyCode::Char('R') => {
                let selected = self.selected_id();
                let _ = self.controller.refresh();
                match selected {
                    Some(id) => self.select_id(id),
                    None => self
                        .list_state
                        .select((!self.controller.catalog().is_empty()).then_some(0)),
                }
            }
            _ => {}
        }
    }

    fn table_key(&mut self, key: KeyEvent) {
        let fetch = match key.code {
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('n') => {
                self.controller.next_page().ok().flatten()
            }
            KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('p') => {
                self.controller.prev_page().ok().flatten()
            }
            KeyCode::Char('g') | KeyCode::Home => self.controller.first_page().ok().flatten(),
            KeyCode::Char('G') | KeyCode::End => self.controller.last_page().ok().flatten(),
            KeyCode::Char('+') | KeyCode::Char('=') => self.step_page_size(1),
            KeyCode::Char('-') => self.step_page_size(-1),
            KeyCode::Char('r') => self.controller.retry(),
            KeyCode::Char('c') => {
                let chart = self.controller.chart_mut();
                let next = chart.chart_type().map_or(ChartType::ALL[0], ChartType::cycle);
                chart.set_chart_type(Some(next));
                None
            }
            KeyCode::Char('x') => {
                self.cycle_axis(true);
                None
            }
            KeyCode::Char('y') => {
                self.cycle_axis(false);
                None
            }
            KeyCode::Enter => {
                let _ = self.controller.generate_chart();
                None
            }
            _ => None,
        };
        self.dispatch(fetch);
    }

    fn step_page_size(&mut self, step: isize) -> Option<PageFetch> {
        let session = self.controller.session();
        let sizes = session.allowed_page_sizes();
        let idx = sizes.iter().position(|s| *s == session.page_size())?;
        let target = idx.checked_add_signed(step).filter(|i| *i < sizes.len())?;
        let size = sizes[target];
        self.controller.set_page_size(size).ok().flatten()
    }

    /// Advance the x or y column to the next column of the active file, wrapping to unset.
    fn cycle_axis(&mut self, x_axis: bool) {
        let Some(columns) = self.controller.active_file().map(|f| f.column_names()) else {
            return;
        };
        let chart = self.controller.chart_mut();
        let current = if x_axis {
            chart.x_column()
        } else {
            chart.y_column()
        };
        let next = match current.and_then(|c| columns.iter().position(|n| n == c)) {
            Some(idx) => columns.get(idx + 1).cloned(),
            None => columns.first().cloned(),
        };
        if x_axis {
            chart.set_x_column(next);
        } else {
            chart.set_y_column(next);
        }
    }

    fn status_text(&self) -> String {
        let session = self.controller.session();
        let state = match session.state() {
            SessionState::Idle => String::new(),
            SessionState::Loading => " · loading…".to_string(),
            SessionState::Ready => String::new(),
            SessionState::Failed(_) => " · failed (r to retry)".to_string(),
        };
        match session.window() {
            Some(w) if w.total_pages > 0 => format!(
                "Showing {}-{} of {} rows · page {}/{} · {} per page{} ",
                w.start_index,
                w.end_index,
                session.total_rows().unwrap_or(0),
                w.page_number,
                w.total_pages,
                session.page_size(),
                state
            ),
            Some(_) => format!("No rows{} ", state),
            None => format!("{} per page{} ", session.page_size(), state),
        }
    }

    fn render_chart_panel(&self, area: Rect, buf: &mut Buffer) {
        let chart = self.controller.chart();
        let value = |v: Option<&str>| v.unwrap_or("-").to_string();
        let mut lines = vec![Line::from(vec![
            Span::styled("Type ", Style::default().fg(Color::DarkGray)),
            Span::raw(chart.chart_type().map_or("-".to_string(), |t| t.to_string())),
            Span::styled("  X ", Style::default().fg(Color::DarkGray)),
            Span::raw(value(chart.x_column())),
            Span::styled("  Y ", Style::default().fg(Color::DarkGray)),
            Span::raw(value(chart.y_column())),
        ])];
        if let Some(rendered) = chart.rendered() {
            let mut spans = vec![Span::styled(
                rendered.config.title(),
                Style::default().add_modifier(Modifier::BOLD),
            )];
            if !rendered.current {
                spans.push(Span::styled(
                    "  (selection changed, press Enter to regenerate)",
                    Style::default().fg(Color::Yellow),
                ));
            }
            lines.push(Line::from(spans));
        }
        Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Chart"))
            .render(area, buf);
    }
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Fill(1),
                Constraint::Length(4),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(area);
        let main = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(40), Constraint::Fill(1)])
            .split(layout[0]);

        let active = self.controller.active_file().map(|f| f.id);
        FileList {
            files: self.controller.catalog().files(),
            active,
            focused: self.focus == Focus::Files,
        }
        .render(main[0], buf, &mut self.list_state);

        let title = self
            .controller
            .active_file()
            .map(|f| f.display_name.clone())
            .unwrap_or_else(|| "Table".to_string());
        let screen = self.controller.renderer();
        let first_row = self
            .row_numbers
            .then(|| self.controller.session().window().map(|w| w.start_index))
            .flatten();
        PageTable {
            columns: &screen.columns,
            rows: &screen.rows,
            format: self.cell_format,
            first_row,
            title,
            focused: self.focus == Focus::Table,
        }
        .render(main[1], buf);

        self.render_chart_panel(layout[1], buf);

        let notice = if self.pending_delete.is_some() {
            None
        } else {
            self.controller.notifier().last()
        };
        if self.pending_delete.is_some() {
            Paragraph::new("Delete the selected file? (y to confirm, any other key cancels)")
                .style(Style::default().fg(Color::Yellow))
                .render(layout[2], buf);
        } else {
            NoticeLine { notice }.render(layout[2], buf);
        }

        let hints = match self.focus {
            Focus::Files => FILE_CONTROLS,
            Focus::Table => TABLE_CONTROLS,
        };
        let controls = Controls::new(hints).with_status(self.status_text());
        (&controls).render(layout[3], buf);
    }
}

fn render(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    terminal.draw(|frame| frame.render_widget(app, frame.area()))?;
    Ok(())
}

fn run(
    terminal: &mut DefaultTerminal,
    app: &mut App,
    tx: &Sender<AppEvent>,
    rx: &Receiver<AppEvent>,
) -> Result<()> {
    render(terminal, app)?;

    loop {
        if crossterm::event::poll(Duration::from_millis(25))? {
            match crossterm::event::read()? {
                crossterm::event::Event::Key(key) => tx.send(AppEvent::Key(key))?,
                crossterm::event::Event::Resize(_, _) => render(terminal, app)?,
                _ => {}
            }
        }

        let updated = match rx.recv_timeout(Duration::from_millis(0)) {
            Ok(AppEvent::Exit) => break,
            Ok(event) => {
                if let Some(AppEvent::Exit) = app.event(event) {
                    break;
                }
                true
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => false,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
        };

        if updated {
            render(terminal, app)?;
        }
    }
    Ok(())
}

/// Run the browser until the user quits.
pub fn run_browser(store: SharedStore, config: &AppConfig, initial: Option<&str>) -> Result<()> {
    let (tx, rx) = channel::<AppEvent>();
    let (fetch_tx, fetch_rx) = channel::<PageFetch>();
    let worker = spawn_fetch_worker(store.clone(), fetch_rx, tx.clone());

    let controller = SessionController::new(
        store,
        NoticeLog::bounded(NOTICE_HISTORY),
        Screen::default(),
        config.upload_gate(),
        config.table_session()?,
    );
    let mut app = App::new(controller, fetch_tx, config);
    app.start(initial);

    let mut terminal = ratatui::init();
    let result = run(&mut terminal, &mut app, &tx, &rx);
    ratatui::restore();

    // closing the request channel stops the worker
    drop(app);
    drop(rx);
    let _ = worker.join();
    result
}
