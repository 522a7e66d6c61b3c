#[cfg(test)]
#[path = "ui_test.rs"]
mod tests;

use std::io;
use std::time::Instant;

use anyhow::Result;
use crossterm::cursor;
use crossterm::event::DisableBracketedPaste;
use crossterm::event::EnableBracketedPaste;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use ratatui::backend::CrosstermBackend;
use ratatui::prelude::*;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use ratatui::widgets::Clear;
use ratatui::widgets::List;
use ratatui::widgets::ListItem;
use ratatui::widgets::ListState;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Tabs;
use ratatui::widgets::Wrap;
use ratatui::Terminal;
use strum::IntoEnumIterator;
use tokio::sync::mpsc;
use tui_textarea::Input;
use tui_textarea::Key;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Action;
use crate::domain::models::Catalog;
use crate::domain::models::Event;
use crate::domain::models::Loading;
use crate::domain::models::NotificationKind;
use crate::domain::models::PageContext;
use crate::domain::models::PageName;
use crate::domain::models::StudioEvent;
use crate::domain::models::TextArea;
use crate::domain::services::events::EventsService;
use crate::domain::services::GenerateControl;
use crate::domain::services::GenerationState;
use crate::domain::services::LocalStorage;
use crate::domain::services::Router;
use crate::domain::services::Studio;
use crate::domain::services::StudioOptions;
use crate::domain::services::HISTORY_LIMIT;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
    Prompt,
    History,
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);

    return Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };
}

fn notice_color(kind: NotificationKind) -> Color {
    match kind {
        NotificationKind::Info => return Color::Cyan,
        NotificationKind::Success => return Color::Green,
        NotificationKind::Error => return Color::Red,
    }
}

pub struct UiState<'a> {
    pub studio: Studio,
    pub router: Router,
    pub prompt: tui_textarea::TextArea<'a>,
    pub credential_input: tui_textarea::TextArea<'a>,
    pub focus: Focus,
    pub history_state: ListState,
    loading: Loading,
}

impl<'a> UiState<'a> {
    pub fn new(studio: Studio, landing: &str) -> Result<UiState<'a>> {
        let mut router = Router::new(PageName::Image);
        if landing != PageName::Image.to_string() {
            router.navigate(landing, None)?;
        }

        let mut state = UiState {
            studio,
            router,
            prompt: TextArea::default(),
            credential_input: TextArea::credential(),
            focus: Focus::Prompt,
            history_state: ListState::default(),
            loading: Loading::default(),
        };

        state.sync()?;
        return Ok(state);
    }

    fn dispatch(&mut self, event: StudioEvent) -> Result<()> {
        self.studio.handle(event)?;
        return self.sync();
    }

    /// Pulls anything the studio handed out back into the view.
    fn sync(&mut self) -> Result<()> {
        if let Some(prompt) = self.studio.take_prompt_fill() {
            self.router.navigate(
                &PageName::Image.to_string(),
                Some(PageContext::Prompt(prompt)),
            )?;
        }

        if let Some(PageContext::Prompt(prompt)) = self.router.take_context() {
            self.prompt = TextArea::with_prompt(&prompt);
            self.focus = Focus::Prompt;
        }

        let history_len = self.studio.history().len();
        match self.history_state.selected() {
            Some(_) if history_len == 0 => self.history_state.select(None),
            Some(idx) if idx >= history_len => self.history_state.select(Some(history_len - 1)),
            _ => (),
        }

        return Ok(());
    }

    fn selected_history(&self) -> Option<usize> {
        return self.history_state.selected();
    }

    fn move_history(&mut self, forward: bool) -> Result<()> {
        let len = self.studio.history().len();
        if len == 0 {
            return Ok(());
        }

        let idx = match (self.history_state.selected(), forward) {
            (None, _) => 0,
            (Some(idx), true) => (idx + 1).min(len - 1),
            (Some(idx), false) => idx.saturating_sub(1),
        };

        self.history_state.select(Some(idx));
        return self.dispatch(StudioEvent::HistorySelected(idx));
    }

    fn handle_selection_keys(&mut self, input: &Input) -> Result<bool> {
        if !input.alt {
            return Ok(false);
        }

        let selection = self.studio.selection();
        let event = match input.key {
            Key::Char('m') => StudioEvent::ModelSelected(
                selection.cycle_model(self.studio.catalog(), true),
            ),
            Key::Char('n') => StudioEvent::ModelSelected(
                selection.cycle_model(self.studio.catalog(), false),
            ),
            Key::Char('a') => StudioEvent::AspectRatioSelected(selection.cycle_aspect_ratio(true)),
            Key::Char('s') => {
                if !selection.resolution_visible {
                    return Ok(true);
                }
                StudioEvent::ResolutionSelected(selection.cycle_resolution(true))
            }
            _ => return Ok(false),
        };

        self.dispatch(event)?;
        return Ok(true);
    }

    fn handle_history_keys(&mut self, input: Input) -> Result<()> {
        match input.key {
            Key::Up => return self.move_history(false),
            Key::Down => return self.move_history(true),
            Key::Char('x') => return self.dispatch(StudioEvent::HistoryClearRequested()),
            _ => (),
        }

        let idx = match self.selected_history() {
            Some(idx) => idx,
            None => return Ok(()),
        };

        match input.key {
            Key::Char('c') => return self.dispatch(StudioEvent::HistoryCopyPrompt(idx)),
            Key::Char('d') => return self.dispatch(StudioEvent::HistoryDownload(idx)),
            Key::Char('r') => return self.dispatch(StudioEvent::HistoryRemix(idx)),
            Key::Char('o') => {
                self.dispatch(StudioEvent::HistorySelected(idx))?;
                return self.dispatch(StudioEvent::OpenCurrent());
            }
            _ => return Ok(()),
        }
    }

    fn handle_credential_overlay(&mut self, event: Event) -> Result<()> {
        match event {
            Event::KeyboardEsc() => {
                self.credential_input = TextArea::credential();
                self.dispatch(StudioEvent::CredentialDismissed())?;
            }
            Event::KeyboardEnter() => {
                let value = self.credential_input.lines().join("");
                self.dispatch(StudioEvent::CredentialProvided(value))?;
                if !self.studio.is_credential_prompt_open() {
                    self.credential_input = TextArea::credential();
                }
            }
            Event::KeyboardPaste(text) => {
                self.credential_input.insert_str(text.trim());
            }
            Event::KeyboardCharInput(input) => {
                self.credential_input.input(input);
            }
            _ => (),
        }

        return Ok(());
    }

    fn handle_image_page(&mut self, event: Event) -> Result<()> {
        match event {
            Event::KeyboardEnter() => {
                if self.focus == Focus::History {
                    if let Some(idx) = self.selected_history() {
                        self.dispatch(StudioEvent::HistorySelected(idx))?;
                    }
                    return Ok(());
                }

                let prompt = self.prompt.lines().join("\n");
                self.dispatch(StudioEvent::Generate(prompt))?;
            }
            Event::KeyboardCTRLR() => {
                self.dispatch(StudioEvent::Regenerate())?;
            }
            Event::KeyboardTab() => {
                self.focus = match self.focus {
                    Focus::Prompt => Focus::History,
                    Focus::History => Focus::Prompt,
                };
                if self.focus == Focus::History && self.history_state.selected().is_none() {
                    self.move_history(true)?;
                }
            }
            Event::KeyboardPaste(text) => {
                if self.focus == Focus::Prompt {
                    self.prompt.insert_str(text);
                }
            }
            Event::KeyboardCharInput(input) => {
                if self.handle_selection_keys(&input)? {
                    return Ok(());
                }

                match self.focus {
                    Focus::History => self.handle_history_keys(input)?,
                    Focus::Prompt => {
                        self.prompt.input(input);
                    }
                }
            }
            _ => (),
        }

        return Ok(());
    }

    /// Applies a single event. Returns false once the user asked to quit.
    pub fn handle_event(&mut self, event: Event) -> Result<bool> {
        match event {
            Event::KeyboardCTRLC() => return Ok(false),
            Event::UITick() => {
                self.dispatch(StudioEvent::Tick(Instant::now()))?;
                return Ok(true);
            }
            Event::UIResize() => return Ok(true),
            Event::Notify(message, kind) => {
                self.dispatch(StudioEvent::Notify(message, kind))?;
                return Ok(true);
            }
            Event::GenerationSucceeded(request, image) => {
                self.dispatch(StudioEvent::GenerationSucceeded(request, image))?;
                if self.studio.state() == GenerationState::Succeeded {
                    self.history_state.select(Some(0));
                }
                return Ok(true);
            }
            Event::GenerationFailed(request, message) => {
                self.dispatch(StudioEvent::GenerationFailed(request, message))?;
                return Ok(true);
            }
            _ => (),
        }

        // The credential overlay swallows every key, Esc included, so that a
        // single press only ever closes the overlay.
        if self.studio.is_credential_prompt_open() {
            self.handle_credential_overlay(event)?;
            return Ok(true);
        }

        if self.studio.is_confirming_clear() {
            match event {
                Event::KeyboardCharInput(Input {
                    key: Key::Char('y'),
                    ..
                }) => {
                    self.dispatch(StudioEvent::HistoryClearConfirmed())?;
                }
                _ => {
                    self.dispatch(StudioEvent::HistoryClearCancelled())?;
                }
            }
            return Ok(true);
        }

        if let Event::KeyboardEsc() = event {
            self.dispatch(StudioEvent::NotificationDismissed())?;
            return Ok(true);
        }

        if let Event::KeyboardCharInput(Input {
            key: Key::F(num), ..
        }) = event
        {
            if let Some(page) = PageName::iter().nth(usize::from(num).saturating_sub(1)) {
                self.router.navigate(&page.to_string(), None)?;
            }
            return Ok(true);
        }

        match self.router.active() {
            PageName::Image => self.handle_image_page(event)?,
            PageName::Settings => {
                if let Event::KeyboardCharInput(Input {
                    key: Key::Char('k'),
                    ..
                }) = event
                {
                    self.dispatch(StudioEvent::CredentialEditRequested())?;
                }
            }
            PageName::Video => (),
        }

        return Ok(true);
    }

    fn render_tabs<B: Backend>(&self, frame: &mut Frame<B>, rect: Rect) {
        let titles = PageName::iter()
            .enumerate()
            .map(|(idx, page)| {
                return Line::from(format!("F{} {}", idx + 1, page.title()));
            })
            .collect::<Vec<Line>>();

        frame.render_widget(
            Tabs::new(titles)
                .select(self.router.active().index())
                .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            rect,
        );
    }

    fn render_pickers<B: Backend>(&self, frame: &mut Frame<B>, rect: Rect) {
        let selection = self.studio.selection();
        let model_name = self
            .studio
            .catalog()
            .find_by_id(&selection.model_id)
            .map(|model| return model.name.to_string())
            .unwrap_or_else(|| return selection.model_id.to_string());

        let mut spans = vec![
            Span::raw("Model: "),
            Span::styled(model_name, Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  Aspect: "),
            Span::styled(
                selection.aspect_ratio.to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ];
        if selection.resolution_visible {
            spans.push(Span::raw("  Resolution: "));
            spans.push(Span::styled(
                selection.resolution.to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ));
        }

        frame.render_widget(
            Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL)),
            rect,
        );
    }

    fn render_result<B: Backend>(&self, frame: &mut Frame<B>, rect: Rect) {
        let lines = match self.studio.current() {
            Some(result) => vec![
                Line::from(Span::styled(
                    result.prompt.to_string(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(format!(
                    "Model: {}  Aspect: {}  Created: {}",
                    result.model_id, result.aspect_ratio, result.timestamp
                )),
                Line::from(""),
                Line::from(Span::styled(
                    result.url.to_string(),
                    Style::default().fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
                )),
            ],
            None => vec![Line::from("Nothing generated yet. Describe an image below and press Enter.")],
        };

        frame.render_widget(
            Paragraph::new(lines)
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::ALL).title("Result")),
            rect,
        );
    }

    fn render_control<B: Backend>(&self, frame: &mut Frame<B>, rect: Rect) {
        let control = self.studio.control();
        let color = match control {
            GenerateControl::Ready => Color::Green,
            GenerateControl::Busy => Color::Yellow,
            GenerateControl::Error { .. } => Color::Red,
        };

        let mut style = Style::default().fg(color);
        if !control.is_enabled() {
            style = style.add_modifier(Modifier::DIM);
        }

        frame.render_widget(
            Paragraph::new(control.label())
                .style(style)
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL)),
            rect,
        );
    }

    fn render_history<B: Backend>(&mut self, frame: &mut Frame<B>, rect: Rect) {
        let width = usize::from(rect.width.saturating_sub(4));
        let items = self
            .studio
            .history()
            .entries()
            .iter()
            .map(|entry| {
                return ListItem::new(entry.summary(width));
            })
            .collect::<Vec<ListItem>>();

        let mut block = Block::default().borders(Borders::ALL).title(format!(
            "History ({}/{HISTORY_LIMIT})",
            self.studio.history().len()
        ));
        if self.focus == Focus::History {
            block = block.border_style(Style::default().fg(Color::Yellow));
        }

        frame.render_stateful_widget(
            List::new(items)
                .block(block)
                .highlight_style(Style::default().add_modifier(Modifier::REVERSED)),
            rect,
            &mut self.history_state,
        );
    }

    fn render_image_page<B: Backend>(&mut self, frame: &mut Frame<B>, rect: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(rect);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(vec![
                Constraint::Length(3),
                Constraint::Min(3),
                Constraint::Length(5),
                Constraint::Length(3),
            ])
            .split(columns[0]);

        self.render_pickers(frame, rows[0]);
        self.render_result(frame, rows[1]);

        if self.studio.state() == GenerationState::Submitting {
            let prompt = self
                .studio
                .last_request()
                .map(|req| return req.prompt.to_string())
                .unwrap_or_default();
            self.loading.render(frame, rows[2], &prompt);
        } else {
            frame.render_widget(self.prompt.widget(), rows[2]);
        }

        self.render_control(frame, rows[3]);
        self.render_history(frame, columns[1]);
    }

    fn render_text_page<B: Backend>(&self, frame: &mut Frame<B>, rect: Rect) {
        let mut lines = self
            .router
            .page()
            .map(|page| return page.body.clone())
            .unwrap_or_default();

        if self.router.active() == PageName::Settings {
            let status = if self.studio.credentials().is_set() {
                "API key: saved. Press k to replace it."
            } else {
                "API key: not saved. Press k to add one."
            };
            lines.insert(0, status.to_string());
            lines.insert(1, "".to_string());
        }

        frame.render_widget(
            Paragraph::new(lines.into_iter().map(Line::from).collect::<Vec<Line>>())
                .wrap(Wrap { trim: false })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(self.router.active().title()),
                ),
            rect,
        );
    }

    fn render_notifications<B: Backend>(&self, frame: &mut Frame<B>, area: Rect) {
        let width = 44.min(area.width);
        let mut y = area.y + 1;

        for notice in self.studio.notifications().list().iter().rev() {
            if y + 3 > area.y + area.height {
                break;
            }

            let rect = Rect {
                x: area.x + area.width - width,
                y,
                width,
                height: 3,
            };
            frame.render_widget(Clear, rect);
            frame.render_widget(
                Paragraph::new(notice.message.to_string())
                    .style(Style::default().fg(notice_color(notice.kind)))
                    .block(Block::default().borders(Borders::ALL)),
                rect,
            );
            y += 3;
        }
    }

    fn render_overlays<B: Backend>(&self, frame: &mut Frame<B>, area: Rect) {
        if self.studio.is_credential_prompt_open() {
            let rect = centered_rect(60, 5, area);
            frame.render_widget(Clear, rect);

            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints(vec![Constraint::Length(3), Constraint::Length(2)])
                .split(rect);
            frame.render_widget(self.credential_input.widget(), rows[0]);
            frame.render_widget(
                Paragraph::new("Enter to save, Esc to cancel.").alignment(Alignment::Center),
                rows[1],
            );
        } else if self.studio.is_confirming_clear() {
            let rect = centered_rect(60, 5, area);
            frame.render_widget(Clear, rect);
            frame.render_widget(
                Paragraph::new(format!(
                    "Clear all {} generations from history?\nPress y to confirm, any other key to cancel.",
                    self.studio.history().len()
                ))
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title("Clear history")),
                rect,
            );
        }
    }

    pub fn render<B: Backend>(&mut self, frame: &mut Frame<B>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(vec![
                Constraint::Length(1),
                Constraint::Min(5),
                Constraint::Length(1),
            ])
            .split(frame.size());

        self.render_tabs(frame, layout[0]);
        match self.router.active() {
            PageName::Image => self.render_image_page(frame, layout[1]),
            PageName::Video | PageName::Settings => self.render_text_page(frame, layout[1]),
        }

        frame.render_widget(
            Paragraph::new("Enter generate | CTRL+R regenerate | Tab history | ALT+M model | ALT+A aspect | ALT+S resolution | CTRL+C quit")
                .style(Style::default().fg(Color::DarkGray)),
            layout[2],
        );

        self.render_notifications(frame, frame.size());
        self.render_overlays(frame, frame.size());
    }
}

async fn start_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    ui_state: &mut UiState<'_>,
    events: &mut EventsService,
) -> Result<()> {
    loop {
        terminal.draw(|frame| {
            ui_state.render(frame);
        })?;

        let event = events.next().await?;
        if !ui_state.handle_event(event)? {
            break;
        }
    }

    return Ok(());
}

pub fn destruct_terminal_for_panic() {
    let _ = disable_raw_mode();
    let _ = crossterm::execute!(io::stdout(), LeaveAlternateScreen, DisableBracketedPaste);
    let _ = crossterm::execute!(io::stdout(), cursor::Show);
}

pub async fn start(
    catalog: Catalog,
    tx: mpsc::UnboundedSender<Action>,
    rx: mpsc::UnboundedReceiver<Event>,
) -> Result<()> {
    let studio = Studio::new(
        catalog,
        LocalStorage::default(),
        StudioOptions::from_config()?,
        tx,
    );
    let mut ui_state = UiState::new(studio, &Config::get(ConfigKey::Page))?;
    let mut events = EventsService::new(rx);

    let stdout = io::stdout();
    let mut stdout = stdout.lock();

    enable_raw_mode()?;
    crossterm::execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let term_backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(term_backend)?;

    let res = start_loop(&mut terminal, &mut ui_state, &mut events).await;

    disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    return res;
}
