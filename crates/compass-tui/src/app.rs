//! App — component-based event loop.
//!
//! Architecture:
//! - `App` owns all components and `AppState` (shared read-only data for components).
//! - A `tokio::mpsc` channel carries `AppMessage` events in from background tasks
//!   (terminal input, search requests, the health probe, preview players).
//! - The event loop draws each frame, then awaits the next message.
//! - Components return `Vec<Action>`; App dispatches each Action.

use std::io;
use std::time::Duration;

use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    Terminal,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use compass_proto::client::{AnalyzeClient, ClientError};
use compass_proto::protocol::AnalyzeResponse;

use crate::{
    action::{Action, ComponentId},
    app_state::{AppState, BackendHealth},
    component::Component,
    components::{
        header::Header, help_overlay::HelpOverlay, recommendation_list::RecommendationList,
        search_bar::SearchBar, tag_cloud::TagCloud,
    },
    focus::FocusRing,
    preview::{players_for, PlayerKey, PreviewEvent, PreviewLauncher},
    search::SearchPhase,
    widgets::{
        banner, hit,
        status_bar::{self, InputMode},
        toast::ToastManager,
    },
};

// ── Internal event bus ────────────────────────────────────────────────────────

enum AppMessage {
    Event(Event),
    SearchDone {
        seq: u64,
        result: Result<AnalyzeResponse, ClientError>,
    },
    Health(bool),
    Preview(PlayerKey, PreviewEvent),
}

/// Where each pane was drawn last frame, for mouse routing.
#[derive(Debug, Clone, Default)]
struct PaneAreas {
    search_bar: Rect,
    tag_cloud: Rect,
    recommendations: Rect,
}

/// Startup switches taken from config and the command line.
#[derive(Debug, Clone)]
pub struct AppOptions {
    pub mouse: bool,
    pub show_keys_bar: bool,
    pub health_check: bool,
    pub initial_query: Option<String>,
}

pub struct App {
    state: AppState,
    client: AnalyzeClient,
    launcher: Box<dyn PreviewLauncher>,
    options: AppOptions,

    // ── Components ───────────────────────────────────────────────────────────
    header: Header,
    search_bar: SearchBar,
    tag_cloud: TagCloud,
    recommendations: RecommendationList,
    help_overlay: HelpOverlay,
    toast: ToastManager,

    focus: FocusRing,
    pane_areas: PaneAreas,
    show_keys_bar: bool,
    loading_tick: usize,

    // ── Channels / tasks ─────────────────────────────────────────────────────
    tx: mpsc::Sender<AppMessage>,
    rx: Option<mpsc::Receiver<AppMessage>>,
    preview_rx: Option<mpsc::UnboundedReceiver<(PlayerKey, PreviewEvent)>>,
    search_task: Option<JoinHandle<()>>,

    should_quit: bool,
}

impl App {
    pub fn new(
        client: AnalyzeClient,
        launcher: Box<dyn PreviewLauncher>,
        preview_rx: mpsc::UnboundedReceiver<(PlayerKey, PreviewEvent)>,
        options: AppOptions,
    ) -> Self {
        let (tx, rx) = mpsc::channel::<AppMessage>(256);
        let state = AppState::new(client.analyze_url().to_string());
        Self {
            state,
            client,
            launcher,
            show_keys_bar: options.show_keys_bar,
            options,
            header: Header::new(),
            search_bar: SearchBar::new(),
            tag_cloud: TagCloud::new(),
            recommendations: RecommendationList::new(),
            help_overlay: HelpOverlay::new(),
            toast: ToastManager::new(),
            focus: FocusRing::default(),
            pane_areas: PaneAreas::default(),
            loading_tick: 0,
            tx,
            rx: Some(rx),
            preview_rx: Some(preview_rx),
            search_task: None,
            should_quit: false,
        }
    }

    // ── Main run loop ─────────────────────────────────────────────────────────

    pub async fn run(mut self) -> anyhow::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if self.options.mouse {
            execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        } else {
            execute!(stdout, EnterAlternateScreen)?;
        }
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        let result = self.event_loop(&mut terminal).await;

        // Kill any preview processes before handing the terminal back.
        self.state.players.clear();
        if let Some(task) = self.search_task.take() {
            task.abort();
        }

        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
        result
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        let Some(mut rx) = self.rx.take() else {
            anyhow::bail!("event loop already started");
        };

        // ── Background task: keyboard/mouse events ────────────────────────────
        let event_tx = self.tx.clone();
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        // ── Background task: preview events → AppMessage ──────────────────────
        if let Some(mut preview_rx) = self.preview_rx.take() {
            let preview_tx = self.tx.clone();
            tokio::spawn(async move {
                while let Some((key, ev)) = preview_rx.recv().await {
                    if preview_tx.send(AppMessage::Preview(key, ev)).await.is_err() {
                        break;
                    }
                }
            });
        }

        // ── Background task: one-shot health probe ────────────────────────────
        if self.options.health_check {
            let client = self.client.clone();
            let health_tx = self.tx.clone();
            tokio::spawn(async move {
                let ok = match client.health().await {
                    Ok(ok) => ok,
                    Err(e) => {
                        debug!("health probe failed: {}", e);
                        false
                    }
                };
                let _ = health_tx.send(AppMessage::Health(ok)).await;
            });
        }

        if let Some(query) = self.options.initial_query.take() {
            self.dispatch(Action::SearchTerm(query));
        }
        self.sync_input_mode();

        // Toast expiry + loading animation.
        let mut ui_tick = tokio::time::interval(Duration::from_millis(100));
        ui_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // ── Main loop ─────────────────────────────────────────────────────────
        terminal.draw(|f| self.draw(f))?;
        while !self.should_quit {
            let redraw = tokio::select! {
                Some(msg) = rx.recv() => {
                    const MAX_DRAIN: usize = 64;
                    let mut redraw = self.handle_message(msg);
                    for _ in 0..MAX_DRAIN {
                        match rx.try_recv() {
                            Ok(next) => redraw |= self.handle_message(next),
                            Err(_) => break,
                        }
                    }
                    redraw
                }

                _ = ui_tick.tick() => self.on_tick(),
            };
            if redraw && !self.should_quit {
                terminal.draw(|f| self.draw(f))?;
            }
        }
        info!("quitting");
        Ok(())
    }

    fn on_tick(&mut self) -> bool {
        let mut redraw = self.toast.tick();
        if self.state.phase().is_loading() {
            self.loading_tick = self.loading_tick.wrapping_add(1);
            redraw = true;
        }
        redraw
    }

    // ── Message handler ───────────────────────────────────────────────────────

    /// Returns `true` if the message requires a redraw.
    fn handle_message(&mut self, msg: AppMessage) -> bool {
        match msg {
            AppMessage::Event(ev) => match ev {
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Release {
                        return false;
                    }
                    for a in self.handle_key(key) {
                        self.dispatch(a);
                    }
                }
                Event::Mouse(mouse) => {
                    if !self.options.mouse {
                        return false;
                    }
                    for a in self.handle_mouse(mouse) {
                        self.dispatch(a);
                    }
                }
                Event::Resize(_, _) => {}
                _ => return false,
            },

            AppMessage::SearchDone { seq, result } => self.on_search_done(seq, result),

            AppMessage::Health(ok) => {
                info!("backend {} is {}", self.state.analyze_url, if ok { "up" } else { "down" });
                self.state.health = if ok {
                    BackendHealth::Online
                } else {
                    self.toast
                        .warning(format!("backend unreachable: {}", self.state.analyze_url));
                    BackendHealth::Offline
                };
            }

            AppMessage::Preview(key, ev) => {
                let Some(Some(player)) = self.state.players.get_mut(key.index) else {
                    return false;
                };
                // Events from the players of a previous result set are stale.
                if player.key() != key {
                    return false;
                }
                let changed = player.on_event(&ev);
                if let PreviewEvent::Failed(msg) = &ev {
                    self.toast.error(format!("preview failed: {}", msg));
                    return true;
                }
                return changed;
            }
        }
        true
    }

    fn on_search_done(&mut self, seq: u64, result: Result<AnalyzeResponse, ClientError>) {
        if !self.state.search.resolve(seq, result) {
            return;
        }
        self.search_task = None;
        let players = match self.state.phase() {
            SearchPhase::Success {
                seq,
                recommendations,
                ..
            } => players_for(*seq, recommendations),
            _ => Vec::new(),
        };
        self.state.players = players;
        // Leave the field so the results are one key away.
        if !self.state.phase().recommendations().is_empty()
            && self.focus.is_focused(ComponentId::SearchBar)
        {
            self.focus.set(ComponentId::Recommendations);
            self.sync_input_mode();
        }
    }

    // ── Key handling ──────────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        if key.code == KeyCode::Char('c') && key.modifiers == KeyModifiers::CONTROL {
            return vec![Action::Quit];
        }

        // Help overlay captures all keys when visible.
        if self.help_overlay.visible {
            return self.help_overlay.handle_key(key, &self.state);
        }

        match key.code {
            KeyCode::Tab => return vec![Action::FocusNext],
            KeyCode::BackTab => return vec![Action::FocusPrev],
            _ => {}
        }

        if self.state.input_mode == InputMode::Normal {
            match key.code {
                KeyCode::Char('q') => return vec![Action::Quit],
                KeyCode::Char('?') => return vec![Action::ToggleHelp],
                KeyCode::Char('K') => return vec![Action::ToggleKeys],
                KeyCode::Char('/') => return vec![Action::FocusPane(ComponentId::SearchBar)],
                KeyCode::Esc if self.state.phase().is_loading() => {
                    return vec![Action::CancelSearch]
                }
                _ => {}
            }
        }

        let s = &self.state;
        match self.focus.current() {
            Some(ComponentId::SearchBar) => self.search_bar.handle_key(key, s),
            Some(ComponentId::TagCloud) => self.tag_cloud.handle_key(key, s),
            Some(ComponentId::Recommendations) => self.recommendations.handle_key(key, s),
            Some(ComponentId::HelpOverlay) | None => vec![],
        }
    }

    // ── Mouse handling ────────────────────────────────────────────────────────

    fn handle_mouse(&mut self, event: MouseEvent) -> Vec<Action> {
        let is_click = matches!(
            event.kind,
            MouseEventKind::Down(_) | MouseEventKind::ScrollUp | MouseEventKind::ScrollDown
        );
        if !is_click || self.help_overlay.visible {
            return vec![];
        }

        let (col, row) = (event.column, event.row);
        let areas = self.pane_areas.clone();
        let s = &self.state;

        // Focus follows the click.
        macro_rules! click_pane {
            ($component:expr, $area:expr) => {{
                let mut actions = $component.handle_mouse(event, $area, s);
                let id = $component.id();
                if !self.focus.is_focused(id) && matches!(event.kind, MouseEventKind::Down(_)) {
                    actions.insert(0, Action::FocusPane(id));
                }
                return actions;
            }};
        }

        if hit(areas.search_bar, col, row) {
            click_pane!(self.search_bar, areas.search_bar);
        }
        if hit(areas.tag_cloud, col, row) {
            click_pane!(self.tag_cloud, areas.tag_cloud);
        }
        if hit(areas.recommendations, col, row) {
            click_pane!(self.recommendations, areas.recommendations);
        }
        vec![]
    }

    // ── Action dispatcher ─────────────────────────────────────────────────────

    fn dispatch(&mut self, action: Action) {
        let secondary: Vec<Action> = {
            let s = &self.state;
            let mut out = Vec::new();
            out.extend(self.search_bar.on_action(&action, s));
            out.extend(self.tag_cloud.on_action(&action, s));
            out.extend(self.recommendations.on_action(&action, s));
            out.extend(self.help_overlay.on_action(&action, s));
            out
        };

        self.apply_action(action);

        for a in secondary {
            self.apply_action(a);
        }
    }

    fn apply_action(&mut self, action: Action) {
        if !matches!(action, Action::Noop) {
            debug!("apply_action: {:?}", action);
        }
        match action {
            // ── Search ────────────────────────────────────────────────────────
            Action::Submit(query) | Action::SearchTerm(query) => self.start_search(&query),
            Action::CancelSearch => {
                if let Some(task) = self.search_task.take() {
                    task.abort();
                }
                if self.state.search.cancel() {
                    self.toast.info("search cancelled");
                }
            }

            // ── Preview ───────────────────────────────────────────────────────
            Action::TogglePreview(index) => {
                let launcher = self.launcher.as_ref();
                if let Some(Some(player)) = self.state.players.get_mut(index) {
                    if let Err(e) = player.toggle(launcher) {
                        warn!("preview #{} ({}): {:#}", index, player.url(), e);
                        self.toast.error(format!("{:#}", e));
                    }
                }
            }

            // ── Navigation ────────────────────────────────────────────────────
            Action::FocusNext => self.cycle_focus(true),
            Action::FocusPrev => self.cycle_focus(false),
            Action::FocusPane(id) => {
                self.focus.set(id);
                self.sync_input_mode();
            }

            // ── UI toggles ────────────────────────────────────────────────────
            Action::ToggleKeys => self.show_keys_bar = !self.show_keys_bar,
            Action::ToggleHelp => {} // handled by HelpOverlay::on_action
            Action::CopyToClipboard(text) => {
                match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(text.clone())) {
                    Ok(()) => {
                        let display = if text.chars().count() > 40 {
                            format!("{}…", text.chars().take(40).collect::<String>())
                        } else {
                            text.clone()
                        };
                        self.toast.success(format!("copied: {}", display));
                    }
                    Err(e) => {
                        warn!("clipboard error: {}", e);
                        self.toast.error(format!("clipboard error: {}", e));
                    }
                }
            }

            // ── System ────────────────────────────────────────────────────────
            Action::Quit => self.should_quit = true,
            Action::Noop => {}
        }
    }

    /// Issue a request for `query`, replacing whatever was in flight.
    fn start_search(&mut self, query: &str) {
        let Some(ticket) = self.state.search.submit(query) else {
            return;
        };
        if let Some(task) = self.search_task.take() {
            task.abort();
        }
        // Loading clears the cards, and with them their preview processes.
        self.state.players.clear();
        self.loading_tick = 0;

        let client = self.client.clone();
        let tx = self.tx.clone();
        self.search_task = Some(tokio::spawn(async move {
            let result = client.analyze(ticket.artists).await;
            let _ = tx
                .send(AppMessage::SearchDone {
                    seq: ticket.seq,
                    result,
                })
                .await;
        }));
    }

    /// Panes with nothing in them are skipped.
    fn pane_available(&self, id: ComponentId) -> bool {
        match id {
            ComponentId::SearchBar => true,
            ComponentId::TagCloud => !self.state.cloud_tags().is_empty(),
            ComponentId::Recommendations => !self.state.phase().recommendations().is_empty(),
            ComponentId::HelpOverlay => false,
        }
    }

    fn cycle_focus(&mut self, forward: bool) {
        for _ in 0..3 {
            let next = if forward {
                self.focus.next()
            } else {
                self.focus.prev()
            };
            match next {
                Some(id) if self.pane_available(id) => break,
                Some(_) => continue,
                None => break,
            }
        }
        self.sync_input_mode();
    }

    fn sync_input_mode(&mut self) {
        self.state.input_mode = if self.focus.is_focused(ComponentId::SearchBar) {
            InputMode::Input
        } else {
            InputMode::Normal
        };
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut ratatui::Frame) {
        use crate::theme::C_BG;
        use ratatui::widgets::Block;
        let area = frame.area();

        frame.render_widget(
            Block::default().style(ratatui::style::Style::default().bg(C_BG)),
            area,
        );

        let phase = self.state.phase();
        let header_h = Header::height(&self.state);
        let error_h = u16::from(phase.error().is_some());
        let loading_h = if phase.is_loading() {
            banner::LOADING_HEIGHT
        } else {
            0
        };
        let cloud_h = match TagCloud::height(&self.state, area.width) {
            0 => 0,
            h => h + 1, // blank row above
        };
        let status_h = u16::from(self.show_keys_bar);

        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(header_h),
                Constraint::Length(crate::components::search_bar::HEIGHT),
                Constraint::Length(error_h),
                Constraint::Length(loading_h),
                Constraint::Length(cloud_h),
                Constraint::Min(0),
                Constraint::Length(status_h),
            ])
            .split(area);

        // ── Header ────────────────────────────────────────────────────────────
        self.header.draw(frame, outer[0], &self.state);

        // ── Search bar ────────────────────────────────────────────────────────
        let focused = self.focus.is_focused(ComponentId::SearchBar);
        self.search_bar.draw(frame, outer[1], focused, &self.state);
        self.pane_areas.search_bar = outer[1];

        // ── Error / loading ───────────────────────────────────────────────────
        if let Some(message) = self.state.phase().error() {
            banner::draw_error(frame, outer[2], message);
        }
        if self.state.phase().is_loading() {
            banner::draw_loading(frame, outer[3], self.loading_tick);
        }

        // ── Tag cloud ─────────────────────────────────────────────────────────
        if cloud_h > 0 {
            let cloud_area = Rect {
                y: outer[4].y + 1,
                height: outer[4].height.saturating_sub(1),
                ..outer[4]
            };
            let focused = self.focus.is_focused(ComponentId::TagCloud);
            self.tag_cloud.draw(frame, cloud_area, focused, &self.state);
            self.pane_areas.tag_cloud = cloud_area;
        } else {
            self.pane_areas.tag_cloud = Rect::default();
        }

        // ── Recommendations ───────────────────────────────────────────────────
        if !self.state.phase().recommendations().is_empty() {
            let focused = self.focus.is_focused(ComponentId::Recommendations);
            self.recommendations
                .draw(frame, outer[5], focused, &self.state);
            self.pane_areas.recommendations = outer[5];
        } else {
            self.pane_areas.recommendations = Rect::default();
        }

        // ── Status bar ────────────────────────────────────────────────────────
        if self.show_keys_bar {
            status_bar::draw_keys_bar(
                frame,
                outer[6],
                self.state.input_mode,
                self.state.phase().is_loading(),
            );
        }

        // ── Help overlay (on top of everything) ──────────────────────────────
        if self.help_overlay.visible {
            self.help_overlay.draw(frame, area, false, &self.state);
        }

        // ── Toast notifications (topmost layer) ──────────────────────────────
        self.toast.draw(frame, area);
    }
}
