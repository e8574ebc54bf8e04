use std::{io, thread, time::Duration};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use metroquest_core::{
    game::{Resource, StationLines},
    models::{display_cost, GameStatus, LineBadge, DEFAULT_LINE_COLOR},
    GameEngine, GameState, GraphService, Intent, Response, ServiceError,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const TICK_RATE: Duration = Duration::from_millis(250);
const KEY_HINTS: &str = "Tab pane  c city  l line  r random  n round  v submit  a answer  f route  R reset  / filter  q quit";

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

enum AppEvent {
    Input(Event),
    Tick,
    LineDetail {
        city: String,
        line: String,
        result: Result<Vec<String>, ServiceError>,
    },
}

/// Stations of one line, shown in the answer pane while no round is scored.
#[derive(Debug, Clone, PartialEq)]
struct LineDetail {
    line: String,
    stations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pane {
    Lines,
    Stations,
    Path,
}

impl Pane {
    fn next(self) -> Self {
        match self {
            Pane::Lines => Pane::Stations,
            Pane::Stations => Pane::Path,
            Pane::Path => Pane::Lines,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Browse,
    Filter,
}

/// Terminal frontend: renders [`GameState`] and turns keys into intents.
pub struct MetroQuestApp<S: GraphService> {
    engine: GameEngine<S>,
    state: UiState,
    theme: Theme,
    event_tx: Option<mpsc::Sender<AppEvent>>,
}

impl<S: GraphService> MetroQuestApp<S> {
    pub fn new(engine: GameEngine<S>) -> Self {
        Self {
            engine,
            state: UiState::default(),
            theme: Theme::default(),
            event_tx: None,
        }
    }

    pub async fn run(&mut self, mut responses: mpsc::Receiver<Response>) -> Result<()> {
        let city = self.game().city().id.clone();
        self.dispatch(Intent::SetCity(city));
        self.state
            .set_status(format!("Loading lines for {}", self.game().city().name));

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        self.event_tx = Some(event_tx.clone());
        spawn_input_thread(event_tx);

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.state.should_quit {
                break;
            }

            tokio::select! {
                maybe_event = event_rx.recv() => {
                    if !self.process_app_event(maybe_event) {
                        break;
                    }
                }
                Some(response) = responses.recv() => {
                    self.engine.apply(response);
                    self.state.clamp(self.engine.state());
                }
            }

            if self.state.should_quit {
                break;
            }
        }

        restore_terminal(&mut terminal)?;
        info!("terminal restored");
        Ok(())
    }

    fn game(&self) -> &GameState {
        self.engine.state()
    }

    fn dispatch(&mut self, intent: Intent) {
        self.engine.dispatch(intent);
        self.state.clamp(self.engine.state());
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                self.handle_key(key);
                true
            }
            Some(AppEvent::LineDetail { city, line, result }) => {
                self.apply_line_detail(city, line, result);
                true
            }
            Some(AppEvent::Input(_)) | Some(AppEvent::Tick) => true,
            None => false,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match self.state.mode {
            Mode::Filter => self.handle_filter_key(key),
            Mode::Browse => self.handle_browse_key(key),
        }
    }

    fn handle_filter_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.state.mode = Mode::Browse;
                self.state.filter.clear();
                self.state.set_status("Filter cleared".to_string());
            }
            KeyCode::Enter => {
                self.state.mode = Mode::Browse;
                self.state
                    .set_status(format!("Filter applied: {}", self.state.filter));
            }
            KeyCode::Backspace => {
                self.state.filter.pop();
                self.state.station_cursor = 0;
            }
            KeyCode::Char(c) => {
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                    self.state.filter.push(c);
                    self.state.station_cursor = 0;
                }
            }
            _ => {}
        }
    }

    fn handle_browse_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.state.should_quit = true,
            KeyCode::Tab => self.state.focus = self.state.focus.next(),
            KeyCode::Char('j') | KeyCode::Down => self.move_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_cursor(-1),
            KeyCode::Char('/') => {
                self.state.mode = Mode::Filter;
                self.state.focus = Pane::Stations;
                self.state.set_status("Type to filter stations".to_string());
            }
            KeyCode::Char('c') => self.cycle_city(),
            KeyCode::Char('A') => self.dispatch(Intent::SelectAllLines),
            KeyCode::Char('X') => self.dispatch(Intent::ClearLines),
            KeyCode::Char('r') => {
                self.dispatch(Intent::GenerateRandom);
                self.state.set_status("Picking random stations".to_string());
            }
            KeyCode::Char('n') => self.start_chosen_round(),
            KeyCode::Char('v') => {
                self.dispatch(Intent::Submit);
                self.state.set_status("Checking your path".to_string());
            }
            KeyCode::Char('a') => self.dispatch(Intent::RevealAnswer),
            KeyCode::Char('f') => {
                self.dispatch(Intent::QueryRoute);
                self.state.set_status("Looking up route".to_string());
            }
            KeyCode::Char('C') => self.dispatch(Intent::ClearPath),
            KeyCode::Char('R') => {
                self.dispatch(Intent::NewGame);
                self.state.set_status("New game".to_string());
            }
            _ => self.handle_pane_key(key),
        }
    }

    fn handle_pane_key(&mut self, key: KeyEvent) {
        match (self.state.focus, key.code) {
            (Pane::Lines, KeyCode::Enter | KeyCode::Char(' ')) => {
                if let Some(line) = self.game().all_lines().get(self.state.line_cursor).cloned() {
                    self.dispatch(Intent::ToggleLine(line));
                }
            }
            (Pane::Lines, KeyCode::Char('l')) => {
                if let Some(line) = self.game().all_lines().get(self.state.line_cursor).cloned() {
                    self.request_line_detail(line);
                }
            }
            (Pane::Stations, KeyCode::Char('s')) => {
                if let Some(station) = self.station_under_cursor() {
                    self.state.set_status(format!("Start: {station}"));
                    self.dispatch(Intent::SetStart(Some(station)));
                }
            }
            (Pane::Stations, KeyCode::Char('e')) => {
                if let Some(station) = self.station_under_cursor() {
                    self.state.set_status(format!("End: {station}"));
                    self.dispatch(Intent::SetEnd(Some(station)));
                }
            }
            (Pane::Stations, KeyCode::Enter | KeyCode::Char(' ')) => {
                if let Some(station) = self.station_under_cursor() {
                    self.dispatch(Intent::AppendStation(station));
                }
            }
            (Pane::Stations, KeyCode::Char('i')) => {
                if let Some(station) = self.station_under_cursor() {
                    let index = self.state.path_cursor + 1;
                    self.dispatch(Intent::InsertStation { station, index });
                }
            }
            (Pane::Path, KeyCode::Char('d') | KeyCode::Delete | KeyCode::Backspace) => {
                self.dispatch(Intent::RemoveStation(self.state.path_cursor));
            }
            _ => {}
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let (cursor, len) = match self.state.focus {
            Pane::Lines => (&mut self.state.line_cursor, self.engine.state().all_lines().len()),
            Pane::Stations => {
                let len = visible_stations(self.engine.state(), &self.state.filter).len();
                (&mut self.state.station_cursor, len)
            }
            Pane::Path => (&mut self.state.path_cursor, self.engine.state().path().len()),
        };
        *cursor = step(*cursor, delta, len);
    }

    fn request_line_detail(&mut self, line: String) {
        let Some(tx) = self.event_tx.clone() else {
            return;
        };
        let city = self.game().city().id.clone();
        let lookup = self.engine.line_stations(&line);
        self.state.set_status(format!("Loading stations of {line}"));
        tokio::spawn(async move {
            let result = lookup.await;
            if tx
                .send(AppEvent::LineDetail { city, line, result })
                .await
                .is_err()
            {
                warn!("app closed before line stations arrived");
            }
        });
    }

    fn apply_line_detail(
        &mut self,
        city: String,
        line: String,
        result: Result<Vec<String>, ServiceError>,
    ) {
        if city != self.game().city().id {
            debug!(%city, %line, "discarding line stations for previous city");
            return;
        }
        match result {
            Ok(stations) => {
                self.state
                    .set_status(format!("{line}: {} stations", stations.len()));
                self.state.line_detail = Some(LineDetail { line, stations });
            }
            Err(err) => {
                warn!(?err, %line, "failed to load line stations");
                self.state
                    .set_status(format!("Failed to load stations of {line}"));
            }
        }
    }

    fn cycle_city(&mut self) {
        let game = self.game();
        let Some(next) = game.cities().next_after(&game.city().id).cloned() else {
            warn!("no cities configured");
            return;
        };
        self.state.line_cursor = 0;
        self.state.station_cursor = 0;
        self.state.path_cursor = 0;
        self.state.filter.clear();
        self.state.line_detail = None;
        self.state.set_status(format!("Switched to {}", next.name));
        self.dispatch(Intent::SetCity(next.id));
    }

    fn start_chosen_round(&mut self) {
        let game = self.game();
        let endpoints = (game.start().map(str::to_string), game.end().map(str::to_string));
        match endpoints {
            (Some(start), Some(end)) => {
                self.state.set_status(format!("Round: {start} → {end}"));
                self.dispatch(Intent::SetEndpoints { start, end });
            }
            _ => self
                .state
                .set_status("Choose start (s) and end (e) stations first".to_string()),
        }
    }

    fn station_under_cursor(&self) -> Option<String> {
        visible_stations(self.game(), &self.state.filter)
            .get(self.state.station_cursor)
            .map(|station| station.to_string())
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(4),
            ])
            .split(area);

        self.render_header(frame, layout[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(25),
                Constraint::Percentage(35),
                Constraint::Percentage(40),
            ])
            .split(layout[1]);
        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(body[2]);

        self.render_lines(frame, body[0]);
        self.render_stations(frame, body[1]);
        self.render_path(frame, right[0]);
        self.render_answer(frame, right[1]);
        self.render_status(frame, layout[2]);
    }

    fn pane_block(&self, pane: Pane, title: String) -> Block<'static> {
        let style = if self.state.focus == pane {
            Style::default().fg(self.theme.accent)
        } else {
            Style::default().fg(self.theme.muted)
        };
        Block::default()
            .borders(Borders::ALL)
            .border_style(style)
            .title(title)
    }

    fn highlight(&self) -> Style {
        Style::default()
            .bg(self.theme.selection_bg)
            .add_modifier(Modifier::BOLD)
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let game = self.game();
        let city = game.city();
        let phase = match game.status() {
            GameStatus::Setup => ("SETUP", self.theme.muted),
            GameStatus::Playing => ("PLAYING", self.theme.accent),
            GameStatus::Result => ("SOLVED", self.theme.success),
            GameStatus::Query => ("ROUTE", self.theme.warning),
        };
        let mut spans = vec![
            Span::styled(
                city.title.clone(),
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(city.subtitle.clone(), Style::default().fg(self.theme.muted)),
            Span::raw("  "),
            Span::styled(
                format!("[{}]", phase.0),
                Style::default().fg(phase.1).add_modifier(Modifier::BOLD),
            ),
        ];
        if game.is_busy() {
            spans.push(Span::styled(
                "  working…",
                Style::default().fg(self.theme.warning),
            ));
        }
        let paragraph =
            Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(paragraph, area);
    }

    fn render_lines(&self, frame: &mut Frame, area: Rect) {
        let game = self.game();
        let title = format!(
            "Lines {}/{}",
            game.selected_lines().len(),
            game.all_lines().len()
        );
        let block = self.pane_block(Pane::Lines, title);

        if game.all_lines().is_empty() {
            let message = if game.is_loading(Resource::Catalog) {
                "Loading lines…"
            } else {
                "No lines loaded (c to switch city)"
            };
            frame.render_widget(Paragraph::new(message).block(block), area);
            return;
        }

        let items: Vec<ListItem> = game
            .all_lines()
            .iter()
            .map(|line| {
                let color = game
                    .catalog()
                    .and_then(|catalog| catalog.info(line))
                    .map(|info| info.display_color())
                    .unwrap_or(DEFAULT_LINE_COLOR);
                let mark = if game.is_line_selected(line) { "[x]" } else { "[ ]" };
                ListItem::new(Line::from(vec![
                    Span::raw(format!("{mark} ")),
                    Span::styled("■ ", Style::default().fg(line_color(color))),
                    Span::raw(line.clone()),
                ]))
            })
            .collect();
        let mut list_state = ListState::default().with_selected(Some(self.state.line_cursor));
        let list = List::new(items)
            .block(block)
            .highlight_style(self.highlight());
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_stations(&self, frame: &mut Frame, area: Rect) {
        let game = self.game();
        let stations = visible_stations(game, &self.state.filter);
        let mut title = format!("Stations {}", stations.len());
        if !self.state.filter.is_empty() || self.state.mode == Mode::Filter {
            title.push_str(&format!("  /{}", self.state.filter));
        }
        let block = self.pane_block(Pane::Stations, title);

        if stations.is_empty() {
            let message = if game.is_loading(Resource::Availability) {
                "Loading stations…"
            } else if game.has_selected_lines() {
                "No matching stations"
            } else {
                "Select lines to list stations"
            };
            frame.render_widget(Paragraph::new(message).block(block), area);
            return;
        }

        let station_lines = game.station_lines();
        let check_reach = game.start().is_some() && !game.reachable_stations().is_empty();
        let items: Vec<ListItem> = stations
            .iter()
            .map(|station| {
                let role = if game.start() == Some(*station) {
                    Span::styled("S ", Style::default().fg(self.theme.success))
                } else if game.end() == Some(*station) {
                    Span::styled("E ", Style::default().fg(self.theme.danger))
                } else {
                    Span::raw("  ")
                };
                let reachable = !check_reach
                    || game.start() == Some(*station)
                    || game.reachable_stations().iter().any(|s| s == station);
                let name_style = if reachable {
                    Style::default().fg(self.theme.primary_fg)
                } else {
                    Style::default().fg(self.theme.muted)
                };
                let mut spans = vec![role, Span::styled(station.to_string(), name_style)];
                spans.extend(badge_spans(&station_lines, station));
                ListItem::new(Line::from(spans))
            })
            .collect();
        let mut list_state = ListState::default().with_selected(Some(self.state.station_cursor));
        let list = List::new(items)
            .block(block)
            .highlight_style(self.highlight());
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_path(&self, frame: &mut Frame, area: Rect) {
        let game = self.game();
        let title = format!("Your path ({} stations)", game.path().len());
        let block = self.pane_block(Pane::Path, title);
        let path = game.path();
        if path.is_empty() {
            frame.render_widget(
                Paragraph::new("Start a round with r (random) or n (chosen stations)")
                    .block(block)
                    .wrap(Wrap { trim: true }),
                area,
            );
            return;
        }

        let last = path.len() - 1;
        let items: Vec<ListItem> = path
            .stations()
            .iter()
            .enumerate()
            .map(|(idx, station)| {
                let anchored = game.status() == GameStatus::Playing && (idx == 0 || idx == last);
                let style = if anchored {
                    Style::default()
                        .fg(self.theme.accent)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(self.theme.primary_fg)
                };
                ListItem::new(Line::from(Span::styled(
                    format!("{:>2}. {station}", idx + 1),
                    style,
                )))
            })
            .collect();
        let mut list_state = ListState::default().with_selected(Some(self.state.path_cursor));
        let list = List::new(items)
            .block(block)
            .highlight_style(self.highlight());
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_answer(&self, frame: &mut Frame, area: Rect) {
        let game = self.game();
        let block = Block::default().borders(Borders::ALL).title("Answer");
        let mut lines: Vec<Line> = Vec::new();

        if let Some(outcome) = game.validation() {
            let (verdict, color) = if outcome.is_shortest {
                ("Correct! That is a shortest path.", self.theme.success)
            } else if outcome.valid {
                ("Valid, but not the shortest.", self.theme.warning)
            } else {
                ("That path is not valid.", self.theme.danger)
            };
            lines.push(Line::from(Span::styled(
                outcome.message.clone().unwrap_or_else(|| verdict.to_string()),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )));
            if let Some(cost) = outcome.user_cost {
                lines.push(Line::from(format!("Your cost: {}", display_cost(cost))));
            }
            if let Some(reason) = &outcome.error_reason {
                lines.push(Line::from(reason.clone()));
            }
            if let Some(annotated) = &outcome.user_path_annotated {
                lines.push(Line::from(Span::styled(
                    annotated.clone(),
                    Style::default().fg(self.theme.muted),
                )));
            }
            lines.push(Line::from(""));
        }

        if game.solution().is_some() {
            lines.push(Line::from(format!("Shortest cost: {}", game.display_cost())));
        }
        if game.revealed() {
            for path in game.system_paths() {
                lines.push(Line::from(Span::styled(
                    path.display(),
                    Style::default().fg(self.theme.accent),
                )));
            }
        } else if game.status() == GameStatus::Playing {
            lines.push(Line::from(Span::styled(
                "Press a to reveal the answer",
                Style::default().fg(self.theme.muted),
            )));
        }

        if let (Some(detail), None, None) =
            (&self.state.line_detail, game.solution(), game.validation())
        {
            lines.push(Line::from(Span::styled(
                detail.line.clone(),
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(detail.summary()));
        }

        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let primary = match self.game().error() {
            Some(err) => Line::from(Span::styled(
                err.message().to_string(),
                Style::default().fg(self.theme.danger),
            )),
            None if self.state.mode == Mode::Filter => {
                Line::from(format!("Filter: {}", self.state.filter))
            }
            None => Line::from(self.state.status.clone()),
        };
        let hints = Line::from(Span::styled(KEY_HINTS, Style::default().fg(self.theme.muted)));
        let paragraph = Paragraph::new(vec![primary, hints])
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

/// Available stations matching `filter` (case-insensitive substring).
fn visible_stations<'a>(game: &'a GameState, filter: &str) -> Vec<&'a str> {
    let needle = filter.trim().to_lowercase();
    game.available_stations()
        .iter()
        .map(String::as_str)
        .filter(|station| needle.is_empty() || station.to_lowercase().contains(&needle))
        .collect()
}

impl LineDetail {
    fn summary(&self) -> String {
        if self.stations.is_empty() {
            return "No stations listed".to_string();
        }
        self.stations.join(" → ")
    }
}

fn badge_spans(station_lines: &StationLines, station: &str) -> Vec<Span<'static>> {
    station_lines
        .get(station)
        .map(|badges| badges.iter().map(badge_span).collect())
        .unwrap_or_default()
}

fn badge_span(badge: &LineBadge) -> Span<'static> {
    Span::styled(
        format!(" {}", badge.line),
        Style::default().fg(line_color(&badge.color)),
    )
}

fn line_color(hex: &str) -> Color {
    parse_hex_color(hex)
        .or_else(|| parse_hex_color(DEFAULT_LINE_COLOR))
        .unwrap_or(Color::Blue)
}

fn parse_hex_color(input: &str) -> Option<Color> {
    let trimmed = input.trim();
    let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Color::Rgb(r, g, b))
        }
        3 => {
            let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
            let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
            let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
            Some(Color::Rgb(r, g, b))
        }
        _ => None,
    }
}

fn step(cursor: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    cursor.saturating_add_signed(delta).min(len - 1)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

struct UiState {
    focus: Pane,
    mode: Mode,
    line_cursor: usize,
    station_cursor: usize,
    path_cursor: usize,
    filter: String,
    status: String,
    line_detail: Option<LineDetail>,
    should_quit: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            focus: Pane::Lines,
            mode: Mode::Browse,
            line_cursor: 0,
            station_cursor: 0,
            path_cursor: 0,
            filter: String::new(),
            status: "Select lines, then press r for a random round".to_string(),
            line_detail: None,
            should_quit: false,
        }
    }
}

impl UiState {
    fn set_status(&mut self, message: String) {
        debug!(%message, "status updated");
        self.status = message;
    }

    /// Keep cursors inside lists that may have shrunk.
    fn clamp(&mut self, game: &GameState) {
        self.line_cursor = step(self.line_cursor, 0, game.all_lines().len());
        self.station_cursor = step(
            self.station_cursor,
            0,
            visible_stations(game, &self.filter).len(),
        );
        self.path_cursor = step(self.path_cursor, 0, game.path().len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_long_hex() {
        assert_eq!(parse_hex_color("#3B82F6"), Some(Color::Rgb(0x3B, 0x82, 0xF6)));
        assert_eq!(parse_hex_color("fff"), Some(Color::Rgb(255, 255, 255)));
        assert_eq!(parse_hex_color("#12"), None);
        assert_eq!(parse_hex_color("红色红"), None);
    }

    #[test]
    fn unknown_colors_use_default_line_color() {
        assert_eq!(line_color("not a color"), Color::Rgb(0x3B, 0x82, 0xF6));
    }

    #[test]
    fn cursor_steps_stay_in_bounds() {
        assert_eq!(step(0, -1, 5), 0);
        assert_eq!(step(4, 1, 5), 4);
        assert_eq!(step(7, 0, 3), 2);
        assert_eq!(step(3, 1, 0), 0);
    }

    #[test]
    fn line_detail_lists_stations_in_order() {
        let detail = LineDetail {
            line: "2号线".to_string(),
            stations: vec!["赤湾".to_string(), "蛇口港".to_string(), "海上世界".to_string()],
        };
        assert_eq!(detail.summary(), "赤湾 → 蛇口港 → 海上世界");

        let empty = LineDetail {
            line: "9号线".to_string(),
            stations: Vec::new(),
        };
        assert_eq!(empty.summary(), "No stations listed");
    }
}
