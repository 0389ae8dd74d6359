use std::io::stdout;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;
use campus_tour_core::views::cards::{CardRun, build_carousel};
use campus_tour_core::views::info_panel::info_panel;
use campus_tour_core::TourController;
use campus_tour_protocol::{Rgb, ViewerCommand};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, List, ListItem, ListState, Paragraph, Wrap},
};

fn rgb_to_color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}

/// What a key press asks the browser to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Next,
    Previous,
    CardUp,
    CardDown,
    OpenCard,
    Toggle,
    Exit,
    ZoomIn,
    ZoomOut,
    AutoRotate,
}

pub fn action_for(code: KeyCode) -> Option<Action> {
    match code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Right => Some(Action::Next),
        KeyCode::Left => Some(Action::Previous),
        KeyCode::Up => Some(Action::CardUp),
        KeyCode::Down => Some(Action::CardDown),
        KeyCode::Enter => Some(Action::OpenCard),
        KeyCode::Char(' ') => Some(Action::Toggle),
        KeyCode::Esc => Some(Action::Exit),
        KeyCode::Char('+' | '=') => Some(Action::ZoomIn),
        KeyCode::Char('-') => Some(Action::ZoomOut),
        KeyCode::Char('r') => Some(Action::AutoRotate),
        _ => None,
    }
}

/// Terminal stand-in for the panorama engine and map: it keeps whatever
/// the controller last told it to show.
#[derive(Debug)]
pub struct Browser {
    controller: TourController,
    asset_dir: PathBuf,
    selected_card: usize,
    panorama: Option<String>,
    hfov: f64,
    rotating: bool,
    loading: bool,
    toast: Option<(String, f64)>,
    notice: Option<(String, f64)>,
}

impl Browser {
    /// `asset_dir` is where panorama paths resolve; a panorama counts as
    /// loaded as soon as its file exists there.
    pub fn new(controller: TourController, asset_dir: impl Into<PathBuf>) -> Self {
        let hfov = controller.hfov();
        Self {
            controller,
            asset_dir: asset_dir.into(),
            selected_card: 0,
            panorama: None,
            hfov,
            rotating: false,
            loading: false,
            toast: None,
            notice: None,
        }
    }

    pub fn controller(&self) -> &TourController {
        &self.controller
    }

    /// Run one action at `now_ms`. Returns `false` when the browser should quit.
    pub fn handle(&mut self, action: Action, now_ms: f64) -> bool {
        let commands = match action {
            Action::Quit => return false,
            Action::Next => self.controller.next(),
            Action::Previous => self.controller.previous(),
            Action::CardUp => {
                self.selected_card = self.selected_card.saturating_sub(1);
                Vec::new()
            }
            Action::CardDown => {
                let last = self.controller.sequence().len().saturating_sub(1);
                self.selected_card = (self.selected_card + 1).min(last);
                Vec::new()
            }
            Action::OpenCard => match self.controller.sequence().get(self.selected_card) {
                Some(&id) => self.controller.select_card(id),
                None => Vec::new(),
            },
            Action::Toggle => self.controller.toggle(),
            Action::Exit => self.controller.exit(),
            Action::ZoomIn => self.zoom(now_ms, TourController::zoom_in),
            Action::ZoomOut => self.zoom(now_ms, TourController::zoom_out),
            Action::AutoRotate => self.controller.toggle_autorotate(),
        };
        self.apply(&commands, now_ms);
        true
    }

    // Zooming counts as touching the viewer, so autorotate backs off.
    fn zoom(
        &mut self,
        now_ms: f64,
        op: fn(&mut TourController) -> Vec<ViewerCommand>,
    ) -> Vec<ViewerCommand> {
        self.controller.interaction_start();
        let commands = op(&mut self.controller);
        self.controller.interaction_end(now_ms);
        commands
    }

    pub fn tick(&mut self, now_ms: f64) {
        let commands = self.controller.tick(now_ms);
        self.apply(&commands, now_ms);
        if self.toast.as_ref().is_some_and(|(_, until)| now_ms >= *until) {
            self.toast = None;
        }
        if self.notice.as_ref().is_some_and(|(_, until)| now_ms >= *until) {
            self.notice = None;
        }
    }

    pub fn apply(&mut self, commands: &[ViewerCommand], now_ms: f64) {
        let mut loaded = false;
        for command in commands {
            match command {
                ViewerCommand::ModeChanged { active } => {
                    if !active {
                        self.panorama = None;
                    }
                }
                ViewerCommand::LoadPanorama { path, hfov, .. } => {
                    loaded = self.asset_dir.join(path).is_file();
                    self.panorama = Some(path.clone());
                    self.hfov = *hfov;
                    self.sync_card();
                }
                ViewerCommand::SetHfov { hfov } => self.hfov = *hfov,
                ViewerCommand::StartAutoRotate { .. } => self.rotating = true,
                ViewerCommand::StopAutoRotate => self.rotating = false,
                ViewerCommand::LoadingChanged { loading } => self.loading = *loading,
                ViewerCommand::ShowToast { text, duration_ms } => {
                    self.toast = Some((text.clone(), now_ms + f64::from(*duration_ms)));
                }
                ViewerCommand::HideToast => self.toast = None,
                ViewerCommand::ShowNotice {
                    notice,
                    duration_ms,
                } => {
                    self.notice = Some((
                        notice.message().to_string(),
                        now_ms + f64::from(*duration_ms),
                    ));
                }
                other => tracing::trace!(?other, "no terminal counterpart"),
            }
        }
        if loaded {
            let done = self.controller.panorama_loaded();
            self.apply(&done, now_ms);
        }
    }

    fn sync_card(&mut self) {
        let current = self.controller.current();
        if let Some(pos) = self
            .controller
            .sequence()
            .iter()
            .position(|id| Some(*id) == current)
        {
            self.selected_card = pos;
        }
    }

    pub fn panorama(&self) -> Option<&str> {
        self.panorama.as_deref()
    }

    pub fn is_rotating(&self) -> bool {
        self.rotating
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_ref().map(|(text, _)| text.as_str())
    }

    fn draw(&self, frame: &mut Frame) {
        let [header, body, status] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .areas(frame.area());
        let [cards_area, panel_area] =
            Layout::horizontal([Constraint::Percentage(45), Constraint::Percentage(55)])
                .areas(body);

        let title = format!(
            " campus tour | {} spots | ←→ walk | ↑↓ Enter card | Space street view | Esc leave | +/- zoom | r rotate | q quit ",
            self.controller.catalog().len()
        );
        frame.render_widget(
            Paragraph::new(title).style(Style::default().fg(Color::White).bg(Color::DarkGray)),
            header,
        );

        self.draw_cards(frame, cards_area);
        self.draw_panel(frame, panel_area);

        let line = match (self.notice(), &self.toast) {
            (Some(text), _) => Line::styled(text, Style::default().fg(Color::LightRed)),
            (None, Some((text, _))) => Line::styled(text.as_str(), Style::default().fg(Color::Cyan)),
            (None, None) => Line::default(),
        };
        frame.render_widget(Paragraph::new(line), status);
    }

    fn draw_cards(&self, frame: &mut Frame, area: Rect) {
        let runs: Vec<CardRun> = build_carousel(&self.controller);
        let mut items: Vec<ListItem> = Vec::new();
        let mut selected_row = None;
        let mut card_index = 0;

        for run in &runs {
            if let Some(group) = &run.group {
                items.push(ListItem::new(Line::styled(
                    format!("■ {}", group.style.label),
                    Style::default()
                        .fg(rgb_to_color(group.style.color))
                        .add_modifier(Modifier::BOLD),
                )));
            }
            for card in &run.cards {
                if card_index == self.selected_card {
                    selected_row = Some(items.len());
                }
                card_index += 1;
                let marker = if card.active { "▶ " } else { "  " };
                let mut spans = vec![Span::raw(marker), Span::raw(card.name.clone())];
                if let Some(subtitle) = &card.subtitle {
                    spans.push(Span::styled(
                        format!("  {subtitle}"),
                        Style::default().fg(Color::Gray),
                    ));
                }
                items.push(ListItem::new(Line::from(spans)));
            }
        }

        let panel = info_panel(&self.controller);
        if let Some(message) = panel.empty_message {
            frame.render_widget(
                Paragraph::new(message).block(Block::bordered().title(" spots ")),
                area,
            );
            return;
        }

        let list = List::new(items)
            .block(Block::bordered().title(" spots "))
            .highlight_style(Style::default().bg(Color::DarkGray));
        let mut state = ListState::default().with_selected(selected_row);
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_panel(&self, frame: &mut Frame, area: Rect) {
        let panel = info_panel(&self.controller);
        let muted = Style::default().fg(Color::Gray);
        let nav = if panel.nav_disabled { muted } else { Style::default() };

        let mut lines = vec![
            Line::styled(panel.title, Style::default().add_modifier(Modifier::BOLD)),
            Line::styled(panel.meta, muted),
            Line::raw(panel.category),
            Line::default(),
            Line::styled(format!("← {}", panel.prev.label), nav),
            Line::styled(format!("→ {}", panel.next.label), nav),
            Line::default(),
        ];
        if let Some(path) = self.panorama() {
            lines.push(Line::raw(format!("panorama  {path}")));
            lines.push(Line::raw(format!("hfov      {:.0}°", self.hfov)));
            lines.push(Line::raw(format!(
                "rotate    {}",
                if self.is_rotating() { "on" } else { "off" }
            )));
            if self.is_loading() {
                lines.push(Line::styled("loading…", Style::default().fg(Color::Yellow)));
            }
        } else if let Some(group) = self.controller.selected_marker() {
            lines.push(Line::styled(group.title(), Style::default().fg(rgb_to_color(group.color))));
        }

        frame.render_widget(
            Paragraph::new(lines)
                .wrap(Wrap { trim: false })
                .block(Block::bordered().title(" street view ")),
            area,
        );
    }
}

pub fn run_browser(browser: &mut Browser) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let started = Instant::now();
    let now_ms = || started.elapsed().as_secs_f64() * 1000.0;

    let result = (|| -> Result<()> {
        loop {
            browser.tick(now_ms());
            terminal.draw(|frame| browser.draw(frame))?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if let Some(action) = action_for(key.code) {
                        if !browser.handle(action, now_ms()) {
                            return Ok(());
                        }
                    }
                }
            }
        }
    })();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Directory panorama paths resolve against: the places file's directory.
pub fn asset_dir_for(places_file: &Path) -> PathBuf {
    places_file
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
}
