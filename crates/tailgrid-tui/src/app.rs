//! Control-loop state.
//!
//! [`App`] owns every pane and applies one [`AppEvent`] at a time. Work that
//! leaves the loop (opening streams, running actions, timers, clipboard
//! writes) is returned as a [`Command`] for the runtime to carry out.

use std::time::Duration;

use tailgrid_core::{ContainerInfo, LogLine, PaneId, SessionId};
use tailgrid_render::input::{InputEvent, Key, KeyEvent, MouseEvent, MouseKind, ResizeEvent};
use tailgrid_render::render::{FrameSize, Rect, RenderFrame, TextRole};
use tailgrid_render::style::ThemeSpec;
use tailgrid_runtime::actions::{ActionEvent, ActionOutcome, BulkSummary};
use tailgrid_runtime::error::StreamError;
use tailgrid_runtime::reconnect::{should_reconnect, ReconnectEvent};
use tailgrid_runtime::session::SessionEvent;
use tailgrid_runtime::types::{ContainerAction, LogRequest};

use crate::config::ViewerConfig;
use crate::focus::Focus;
use crate::keymap::{hint_line, KeyCommand, Keymap};
use crate::layout::GridLayout;
use crate::pane::Pane;
use crate::panel_error_boundary::render_pane_with_boundary;
use crate::selection::Selection;
use crate::theme::cycle_theme;
use crate::toast::{ToastId, ToastLevel, Toasts};

/// Ratio moved per column/row resize key press.
pub const RESIZE_STEP: f64 = 0.05;
/// Rows scrolled per wheel notch.
pub const WHEEL_STEP: usize = 3;
/// Columns scrolled per horizontal scroll key press.
pub const HORIZONTAL_STEP: usize = 8;

/// Everything the control loop reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    Input(InputEvent),
    Line {
        pane: PaneId,
        session: SessionId,
        line: LogLine,
    },
    StreamClosed {
        pane: PaneId,
        session: SessionId,
    },
    StreamFailed {
        pane: PaneId,
        session: SessionId,
        error: StreamError,
    },
    Reconnected {
        pane: PaneId,
        container: ContainerInfo,
        attempt: usize,
    },
    ReconnectFailed {
        pane: PaneId,
        attempts: usize,
    },
    ActionFinished(ActionOutcome),
    BulkFinished(BulkSummary),
    /// Settled terminal size after debouncing.
    Resize(ResizeEvent),
    ToastExpired(ToastId),
}

impl From<InputEvent> for AppEvent {
    fn from(event: InputEvent) -> Self {
        Self::Input(event)
    }
}

impl From<SessionEvent> for AppEvent {
    fn from(event: SessionEvent) -> Self {
        match event {
            SessionEvent::Line {
                pane,
                session,
                line,
            } => Self::Line {
                pane,
                session,
                line,
            },
            SessionEvent::Closed { pane, session } => Self::StreamClosed { pane, session },
            SessionEvent::Failed {
                pane,
                session,
                error,
            } => Self::StreamFailed {
                pane,
                session,
                error,
            },
        }
    }
}

impl From<ReconnectEvent> for AppEvent {
    fn from(event: ReconnectEvent) -> Self {
        match event {
            ReconnectEvent::Reconnected {
                pane,
                container,
                attempt,
            } => Self::Reconnected {
                pane,
                container,
                attempt,
            },
            ReconnectEvent::GaveUp { pane, attempts } => Self::ReconnectFailed { pane, attempts },
        }
    }
}

impl From<ActionEvent> for AppEvent {
    fn from(event: ActionEvent) -> Self {
        match event {
            ActionEvent::Finished(outcome) => Self::ActionFinished(outcome),
            ActionEvent::BulkFinished(summary) => Self::BulkFinished(summary),
        }
    }
}

/// Side effects requested by [`App::update`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    None,
    Quit,
    OpenStream {
        pane: PaneId,
        container: ContainerInfo,
        request: LogRequest,
    },
    CloseStream {
        pane: PaneId,
    },
    Reconnect {
        pane: PaneId,
        previous: ContainerInfo,
    },
    RunAction {
        pane: PaneId,
        action: ContainerAction,
        container: ContainerInfo,
    },
    RunBulk {
        action: ContainerAction,
        targets: Vec<(PaneId, ContainerInfo)>,
    },
    CopyToClipboard(String),
    ScheduleToastDismiss {
        id: ToastId,
        after: Duration,
    },
    Batch(Vec<Command>),
}

impl Command {
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Combine commands, dropping `None`s and unwrapping single entries.
    #[must_use]
    pub fn batch(commands: Vec<Command>) -> Self {
        let mut commands: Vec<Command> = commands.into_iter().filter(|c| !c.is_none()).collect();
        match commands.len() {
            0 => Self::None,
            1 => commands.pop().unwrap_or(Self::None),
            _ => Self::Batch(commands),
        }
    }

    /// Flatten nested batches into execution order.
    #[must_use]
    pub fn into_vec(self) -> Vec<Command> {
        match self {
            Self::None => Vec::new(),
            Self::Batch(commands) => commands.into_iter().flat_map(Self::into_vec).collect(),
            other => vec![other],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiMode {
    Main,
    /// Typing a search query into the status bar.
    Search,
}

#[derive(Debug, Clone)]
pub struct App {
    config: ViewerConfig,
    theme: ThemeSpec,
    keymap: Keymap,
    panes: Vec<Pane>,
    layout: GridLayout,
    focus: Focus,
    selection: Selection,
    toasts: Toasts,
    mode: UiMode,
    search_input: String,
    width: usize,
    height: usize,
    quitting: bool,
}

impl App {
    /// One pane per container, in the given order.
    #[must_use]
    pub fn new(config: ViewerConfig, theme: ThemeSpec, containers: Vec<ContainerInfo>) -> Self {
        let panes: Vec<Pane> = containers
            .into_iter()
            .enumerate()
            .map(|(index, container)| Pane::new(PaneId(index as u64 + 1), container, config.history_limit))
            .collect();
        let layout = GridLayout::compute(panes.len());
        Self {
            config,
            theme,
            keymap: Keymap::default(),
            panes,
            layout,
            focus: Focus::default(),
            selection: Selection::default(),
            toasts: Toasts::default(),
            mode: UiMode::Main,
            search_input: String::new(),
            width: 0,
            height: 0,
            quitting: false,
        }
    }

    /// Open a stream for every pane.
    #[must_use]
    pub fn start(&self) -> Command {
        Command::batch(
            self.panes
                .iter()
                .map(|pane| self.open_stream(pane.id(), pane.container().clone()))
                .collect(),
        )
    }

    /// Bind the session the runtime opened for `pane`.
    pub fn attach_session(&mut self, pane: PaneId, session: SessionId) {
        if let Some(pane) = self.pane_mut(pane) {
            pane.attach_session(session);
        }
    }

    #[must_use]
    pub fn quitting(&self) -> bool {
        self.quitting
    }

    #[must_use]
    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    #[must_use]
    pub fn theme(&self) -> ThemeSpec {
        self.theme
    }

    #[must_use]
    pub fn mode(&self) -> UiMode {
        self.mode
    }

    #[must_use]
    pub fn panes(&self) -> &[Pane] {
        &self.panes
    }

    #[must_use]
    pub fn pane(&self, id: PaneId) -> Option<&Pane> {
        self.panes.iter().find(|pane| pane.id() == id)
    }

    #[must_use]
    pub fn focused_pane(&self) -> Option<&Pane> {
        self.panes.get(self.focus.focused())
    }

    #[must_use]
    pub fn focus(&self) -> &Focus {
        &self.focus
    }

    #[must_use]
    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    #[must_use]
    pub fn toasts(&self) -> &Toasts {
        &self.toasts
    }

    /// Everything above the status bar.
    #[must_use]
    pub fn grid_area(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height.saturating_sub(1))
    }

    /// Screen rectangles of the panes currently drawn.
    #[must_use]
    pub fn visible_rects(&self) -> Vec<(usize, Rect)> {
        let area = self.grid_area();
        if self.panes.is_empty() {
            return Vec::new();
        }
        if self.focus.is_maximized() {
            return vec![(self.focus.focused(), area)];
        }
        self.layout.pane_rects(area)
    }

    fn pane_rect(&self, index: usize) -> Option<Rect> {
        self.visible_rects()
            .into_iter()
            .find(|(candidate, _)| *candidate == index)
            .map(|(_, rect)| rect)
    }

    fn pane_at(&self, x: usize, y: usize) -> Option<usize> {
        if self.panes.is_empty() {
            return None;
        }
        let area = self.grid_area();
        if self.focus.is_maximized() {
            return area.contains(x, y).then(|| self.focus.focused());
        }
        self.layout.pane_at(area, x, y)
    }

    fn index_of(&self, id: PaneId) -> Option<usize> {
        self.panes.iter().position(|pane| pane.id() == id)
    }

    fn pane_mut(&mut self, id: PaneId) -> Option<&mut Pane> {
        self.panes.iter_mut().find(|pane| pane.id() == id)
    }

    fn focused_pane_mut(&mut self) -> Option<&mut Pane> {
        self.panes.get_mut(self.focus.focused())
    }

    fn open_stream(&self, pane: PaneId, container: ContainerInfo) -> Command {
        let request = self.config.log_request(container.is_running());
        Command::OpenStream {
            pane,
            container,
            request,
        }
    }

    fn toast(&mut self, level: ToastLevel, message: impl Into<String>) -> Command {
        let id = self.toasts.show(level, message);
        Command::ScheduleToastDismiss {
            id,
            after: self.config.toast_duration,
        }
    }

    pub fn update(&mut self, event: AppEvent) -> Command {
        let command = match event {
            AppEvent::Input(input) => self.update_input(input),
            AppEvent::Line {
                pane,
                session,
                line,
            } => {
                if let Some(pane) = self.pane_mut(pane).filter(|pane| pane.accepts(session)) {
                    pane.append(line);
                }
                Command::None
            }
            AppEvent::StreamClosed { pane, session } => self.stream_ended(pane, session, None),
            AppEvent::StreamFailed {
                pane,
                session,
                error,
            } => self.stream_ended(pane, session, Some(error)),
            AppEvent::Reconnected {
                pane,
                container,
                attempt,
            } => self.reconnected(pane, container, attempt),
            AppEvent::ReconnectFailed { pane, attempts } => self.reconnect_failed(pane, attempts),
            AppEvent::ActionFinished(outcome) => self.action_finished(outcome),
            AppEvent::BulkFinished(summary) => self.bulk_finished(summary),
            AppEvent::Resize(resize) => self.resize(resize),
            AppEvent::ToastExpired(id) => {
                self.toasts.dismiss(id);
                Command::None
            }
        };
        self.sync_pane_sizes();
        command
    }

    fn sync_pane_sizes(&mut self) {
        for (index, rect) in self.visible_rects() {
            if let Some(pane) = self.panes.get_mut(index) {
                pane.resize(FrameSize {
                    width: rect.width,
                    height: rect.height,
                });
            }
        }
    }

    fn resize(&mut self, resize: ResizeEvent) -> Command {
        if (resize.width, resize.height) != (self.width, self.height) {
            self.width = resize.width;
            self.height = resize.height;
            self.selection.clear();
        }
        Command::None
    }

    fn stream_ended(&mut self, id: PaneId, session: SessionId, error: Option<StreamError>) -> Command {
        let Some(pane) = self.pane_mut(id).filter(|pane| pane.accepts(session)) else {
            return Command::None;
        };
        let reason = match &error {
            None => "stream closed".to_owned(),
            Some(err) => format!("stream error: {err}"),
        };
        if should_reconnect(pane.container(), error.is_none()) {
            pane.mark_disconnected(&format!("{reason}; reconnecting"), true);
            let previous = pane.container().clone();
            Command::Batch(vec![
                Command::CloseStream { pane: id },
                Command::Reconnect { pane: id, previous },
            ])
        } else {
            pane.mark_disconnected("end of log (container stopped)", false);
            Command::CloseStream { pane: id }
        }
    }

    fn reconnected(&mut self, id: PaneId, container: ContainerInfo, attempt: usize) -> Command {
        let Some(pane) = self.pane_mut(id).filter(|pane| pane.is_reconnecting()) else {
            return Command::None;
        };
        pane.replace_container(container.clone());
        let name = container.display_name().to_owned();
        let open = self.open_stream(id, container);
        let toast = self.toast(
            ToastLevel::Success,
            format!("{name} reconnected (attempt {attempt})"),
        );
        Command::Batch(vec![Command::CloseStream { pane: id }, open, toast])
    }

    fn reconnect_failed(&mut self, id: PaneId, attempts: usize) -> Command {
        let Some(pane) = self.pane_mut(id).filter(|pane| pane.is_reconnecting()) else {
            return Command::None;
        };
        pane.mark_disconnected(
            &format!("disconnected: no replacement after {attempts} attempts"),
            false,
        );
        let name = pane.container().display_name().to_owned();
        self.toast(ToastLevel::Warning, format!("{name}: gave up reconnecting"))
    }

    fn action_finished(&mut self, outcome: ActionOutcome) -> Command {
        let Some(index) = self.index_of(outcome.pane) else {
            return Command::None;
        };
        let name = outcome.container.display_name().to_owned();
        let action = outcome.action;
        self.panes[index].set_busy(None);
        match outcome.result {
            Ok(_) if action.removes_container() => {
                let toast = self.toast(ToastLevel::Success, format!("{action} {name}: ok"));
                let close = self.remove_pane(index);
                Command::Batch(vec![close, toast])
            }
            Ok(output) => {
                let pane = &mut self.panes[index];
                for line in &output {
                    pane.push_system(line);
                }
                self.toast(ToastLevel::Success, format!("{action} {name}: ok"))
            }
            Err(err) => {
                let pane = &mut self.panes[index];
                pane.push_system(&format!("{action} failed: {err}"));
                for line in err.output() {
                    pane.push_system(line);
                }
                self.toast(ToastLevel::Error, format!("{action} {name} failed"))
            }
        }
    }

    fn bulk_finished(&mut self, summary: BulkSummary) -> Command {
        for outcome in &summary.outcomes {
            let Some(pane) = self.pane_mut(outcome.pane) else {
                continue;
            };
            pane.set_busy(None);
            if let Err(err) = &outcome.result {
                pane.push_system(&format!("{} failed: {err}", outcome.action));
            }
        }
        // Panes whose task was lost never report back.
        for pane in &mut self.panes {
            if pane.busy() == Some(summary.action) {
                pane.set_busy(None);
            }
        }
        let level = if summary.failed == 0 {
            ToastLevel::Success
        } else {
            ToastLevel::Warning
        };
        self.toast(level, summary.headline())
    }

    /// Drop the pane at `index`; the grid is recomputed with equal ratios.
    fn remove_pane(&mut self, index: usize) -> Command {
        let pane = self.panes.remove(index);
        self.layout.relayout(self.panes.len());
        self.focus.clamp(self.panes.len());
        self.selection.clear();
        Command::CloseStream { pane: pane.id() }
    }

    fn update_input(&mut self, input: InputEvent) -> Command {
        if input.is_interrupt() {
            self.quitting = true;
            return Command::Quit;
        }
        match input {
            InputEvent::Key(key) => match self.mode {
                UiMode::Main => self.update_main_mode(key),
                UiMode::Search => self.update_search_mode(key),
            },
            InputEvent::Mouse(mouse) => self.update_mouse(mouse),
            InputEvent::Resize(resize) => self.resize(resize),
            InputEvent::Tick => Command::None,
        }
    }

    fn update_main_mode(&mut self, key: KeyEvent) -> Command {
        let Some(command) = self.keymap.resolve(key) else {
            return Command::None;
        };
        let count = self.panes.len();
        match command {
            KeyCommand::Quit => {
                self.quitting = true;
                return Command::Quit;
            }
            KeyCommand::FocusNext => self.focus.next(count),
            KeyCommand::FocusPrev => self.focus.prev(count),
            KeyCommand::FocusDirection(direction) => {
                self.focus.move_direction(direction, &self.layout);
            }
            KeyCommand::JumpTo(k) => {
                self.focus.jump(k, count);
            }
            KeyCommand::ToggleMaximize => {
                self.focus.toggle_maximize(count);
                self.selection.clear();
            }
            KeyCommand::ScrollUp => self.with_focused(|pane| pane.scroll_up(1)),
            KeyCommand::ScrollDown => self.with_focused(|pane| pane.scroll_down(1)),
            KeyCommand::PageUp => self.with_focused(Pane::page_up),
            KeyCommand::PageDown => self.with_focused(Pane::page_down),
            KeyCommand::ScrollTop => self.with_focused(Pane::scroll_to_top),
            KeyCommand::ScrollBottom => self.with_focused(Pane::scroll_to_bottom),
            KeyCommand::ScrollLeft => self.with_focused(|pane| pane.scroll_left(HORIZONTAL_STEP)),
            KeyCommand::ScrollRight => self.with_focused(|pane| pane.scroll_right(HORIZONTAL_STEP)),
            KeyCommand::TogglePause => self.with_focused(|pane| {
                pane.toggle_pause();
            }),
            KeyCommand::ToggleWrap => self.with_focused(|pane| {
                pane.toggle_word_wrap();
            }),
            KeyCommand::StartSearch => {
                if let Some(pane) = self.focused_pane() {
                    self.search_input = pane
                        .search()
                        .map(|search| search.query().to_owned())
                        .unwrap_or_default();
                    self.mode = UiMode::Search;
                }
            }
            KeyCommand::NextMatch => self.with_focused(|pane| {
                pane.next_match();
            }),
            KeyCommand::PrevMatch => self.with_focused(|pane| {
                pane.prev_match();
            }),
            KeyCommand::GrowColumn => self.resize_focused(true, RESIZE_STEP),
            KeyCommand::ShrinkColumn => self.resize_focused(true, -RESIZE_STEP),
            KeyCommand::GrowRow => self.resize_focused(false, RESIZE_STEP),
            KeyCommand::ShrinkRow => self.resize_focused(false, -RESIZE_STEP),
            KeyCommand::CycleTheme => {
                self.theme = cycle_theme(self.theme.kind, 1);
                let label = self.theme.kind.label();
                return self.toast(ToastLevel::Info, format!("theme: {label}"));
            }
            KeyCommand::Action(action) => return self.request_action(action),
            KeyCommand::RestartAll => return self.request_bulk(ContainerAction::Restart),
            KeyCommand::Cancel => {
                self.selection.clear();
                self.with_focused(Pane::clear_search);
            }
        }
        Command::None
    }

    fn with_focused<F>(&mut self, apply: F)
    where
        F: FnOnce(&mut Pane),
    {
        if let Some(pane) = self.focused_pane_mut() {
            apply(pane);
        }
    }

    fn resize_focused(&mut self, column: bool, delta: f64) {
        if self.focus.is_maximized() {
            return;
        }
        let Some((row, col)) = self.layout.position_of(self.focus.focused()) else {
            return;
        };
        let changed = if column {
            self.layout.resize_column(col, delta)
        } else {
            self.layout.resize_row(row, delta)
        };
        if changed {
            self.selection.clear();
        }
    }

    fn update_search_mode(&mut self, key: KeyEvent) -> Command {
        match key.key {
            Key::Escape => {
                self.search_input.clear();
                self.mode = UiMode::Main;
                Command::None
            }
            Key::Enter => {
                self.mode = UiMode::Main;
                let query = std::mem::take(&mut self.search_input);
                let Some(pane) = self.focused_pane_mut() else {
                    return Command::None;
                };
                if query.trim().is_empty() {
                    pane.clear_search();
                    return Command::None;
                }
                pane.set_search(&query);
                let found = pane.search().map_or(0, |search| search.match_count());
                if found == 0 {
                    self.toast(ToastLevel::Info, format!("no matches for \"{query}\""))
                } else {
                    Command::None
                }
            }
            Key::Backspace => {
                self.search_input.pop();
                Command::None
            }
            Key::Char(ch) if !key.modifiers.ctrl => {
                self.search_input.push(ch);
                Command::None
            }
            _ => Command::None,
        }
    }

    fn update_mouse(&mut self, mouse: MouseEvent) -> Command {
        match mouse.kind {
            MouseKind::Down => {
                let Some(index) = self.pane_at(mouse.x, mouse.y) else {
                    self.selection.clear();
                    return Command::None;
                };
                self.focus.focus(index, self.panes.len());
                if let Some(rect) = self.pane_rect(index) {
                    self.selection.start((mouse.x, mouse.y), index, (rect.x, rect.y));
                }
                Command::None
            }
            MouseKind::Drag => {
                self.selection.update((mouse.x, mouse.y));
                Command::None
            }
            MouseKind::Up => self.finish_selection(mouse),
            MouseKind::ScrollUp => {
                if let Some(pane) = self.pane_at(mouse.x, mouse.y).and_then(|i| self.panes.get_mut(i)) {
                    pane.scroll_up(WHEEL_STEP);
                }
                Command::None
            }
            MouseKind::ScrollDown => {
                if let Some(pane) = self.pane_at(mouse.x, mouse.y).and_then(|i| self.panes.get_mut(i)) {
                    pane.scroll_down(WHEEL_STEP);
                }
                Command::None
            }
        }
    }

    fn finish_selection(&mut self, mouse: MouseEvent) -> Command {
        if !self.selection.is_active() {
            return Command::None;
        }
        self.selection.update((mouse.x, mouse.y));
        self.selection.finish();
        let text = match (self.selection.has_selection(), self.selection.pane_index()) {
            (true, Some(index)) => {
                let (start, end) = self.selection.normalized_range();
                self.panes
                    .get(index)
                    .map(|pane| pane.selected_text(start, end))
                    .unwrap_or_default()
            }
            _ => String::new(),
        };
        self.selection.clear();
        if text.is_empty() {
            return Command::None;
        }
        let chars = text.chars().count();
        let toast = self.toast(ToastLevel::Info, format!("copied {chars} chars"));
        Command::Batch(vec![Command::CopyToClipboard(text), toast])
    }

    fn request_action(&mut self, action: ContainerAction) -> Command {
        let Some(pane) = self.focused_pane_mut() else {
            return Command::None;
        };
        let name = pane.container().display_name().to_owned();
        if let Some(running) = pane.busy() {
            return self.toast(ToastLevel::Warning, format!("{name}: {running} in progress"));
        }
        if action.requires_compose() && pane.container().compose_key().is_none() {
            return self.toast(
                ToastLevel::Warning,
                format!("{name}: {action} needs a compose service"),
            );
        }
        pane.set_busy(Some(action));
        pane.push_system(&format!("{action} requested"));
        Command::RunAction {
            pane: pane.id(),
            action,
            container: pane.container().clone(),
        }
    }

    fn request_bulk(&mut self, action: ContainerAction) -> Command {
        let mut targets = Vec::new();
        for pane in self.panes.iter_mut().filter(|pane| pane.busy().is_none()) {
            pane.set_busy(Some(action));
            targets.push((pane.id(), pane.container().clone()));
        }
        if targets.is_empty() {
            return Command::None;
        }
        let toast = self.toast(ToastLevel::Info, format!("{action}: {} containers", targets.len()));
        Command::Batch(vec![Command::RunBulk { action, targets }, toast])
    }

    #[must_use]
    pub fn render(&self) -> RenderFrame {
        let size = FrameSize {
            width: self.width,
            height: self.height,
        };
        let mut frame = RenderFrame::new(size, self.theme);
        if self.width == 0 || self.height == 0 {
            return frame;
        }
        if self.panes.is_empty() {
            let area = self.grid_area();
            frame.draw_text(1, area.height / 2, "no containers to show", TextRole::Muted);
        }
        for (index, rect) in self.visible_rects() {
            let Some(pane) = self.panes.get(index) else {
                continue;
            };
            let pane_size = FrameSize {
                width: rect.width,
                height: rect.height,
            };
            let focused = index == self.focus.focused();
            let selection = self.selection.range_for(index);
            let theme = self.theme;
            let pane_frame = render_pane_with_boundary(
                pane.container().display_name(),
                pane_size,
                theme,
                || pane.render(pane_size, focused, theme, selection),
            );
            frame.blit(rect.x, rect.y, &pane_frame);
        }
        self.render_status(&mut frame);
        frame
    }

    fn render_status(&self, frame: &mut RenderFrame) {
        let y = self.height - 1;
        if self.mode == UiMode::Search {
            frame.draw_text(0, y, &format!("/{}_", self.search_input), TextRole::Accent);
            return;
        }
        if let Some(toast) = self.toasts.current() {
            let role = match toast.level {
                ToastLevel::Info => TextRole::Info,
                ToastLevel::Success => TextRole::Success,
                ToastLevel::Warning => TextRole::Warning,
                ToastLevel::Error => TextRole::Danger,
            };
            frame.draw_text(0, y, &toast.message, role);
            return;
        }
        let status = self.status_text();
        frame.draw_text(0, y, &status, TextRole::Primary);
        let hint = hint_line();
        let used = status.chars().count() + 2;
        let hint_width = hint.chars().count();
        if used + hint_width <= self.width {
            frame.draw_text(self.width - hint_width, y, hint, TextRole::Muted);
        }
    }

    fn status_text(&self) -> String {
        let Some(pane) = self.focused_pane() else {
            return "no panes".to_owned();
        };
        let mut parts = vec![format!(
            "[{}/{}] {}",
            self.focus.focused() + 1,
            self.panes.len(),
            pane.container().display_name()
        )];
        if self.focus.is_maximized() {
            parts.push("zoomed".to_owned());
        }
        if pane.is_paused() {
            parts.push(format!("paused (+{})", pane.staged_len()));
        }
        if !pane.word_wrap() {
            parts.push("nowrap".to_owned());
        }
        if let Some(search) = pane.search() {
            parts.push(format!(
                "/{} {}/{}",
                search.query(),
                search.current(),
                search.match_count()
            ));
        }
        parts.join("  ")
    }
}
