//! Log pane: bounded history, pause staging, viewport, search and rendering.
//!
//! A pane renders as a bordered panel. Inside the border the first row shows
//! container state and badges; log rows follow. Each log row starts with a
//! `HH:MM:SS ` column (blank on wrapped continuation rows) and the last
//! content column holds the scrollbar.

use std::collections::VecDeque;

use chrono::Local;
use regex::{Regex, RegexBuilder};
use tailgrid_core::sanitize::plain_text;
use tailgrid_core::{ContainerInfo, LogLine, PaneId, SessionId, StreamClass};
use tailgrid_render::render::{CellStyle, FrameSize, Rect, RenderFrame, StyledChar, TermColor, TextRole};
use tailgrid_render::sgr::styled_chars;
use tailgrid_render::style::{StyleToken, ThemeSpec};
use tailgrid_render::widgets::BorderStyle;
use tailgrid_runtime::types::ContainerAction;

use crate::selection::{ContentPos, BORDER_OFFSET, HEADER_ROWS};

pub const DEFAULT_HISTORY: usize = 1000;
/// Width of the `HH:MM:SS ` column.
pub const TIMESTAMP_WIDTH: usize = 9;
const SCROLLBAR_WIDTH: usize = 1;

#[derive(Debug, Clone)]
struct BufferedLine {
    line: LogLine,
    plain: String,
    width: usize,
}

impl BufferedLine {
    fn new(line: LogLine) -> Self {
        let plain = plain_text(&line.content);
        let width = plain.chars().count();
        Self { line, plain, width }
    }
}

/// One screen row of pane content: `line`'s visible chars `start..end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DisplayRow {
    line: usize,
    start: usize,
    end: usize,
    first: bool,
}

/// Active search over a pane's history.
#[derive(Debug, Clone)]
pub struct Search {
    query: String,
    matcher: Regex,
    matches: Vec<usize>,
    current: usize,
}

impl Search {
    fn new(query: &str) -> Option<Self> {
        let matcher = RegexBuilder::new(&regex::escape(query))
            .case_insensitive(true)
            .build()
            .ok()?;
        Some(Self {
            query: query.to_owned(),
            matcher,
            matches: Vec::new(),
            current: 0,
        })
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Matching line indices in buffer order.
    #[must_use]
    pub fn matches(&self) -> &[usize] {
        &self.matches
    }

    #[must_use]
    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    /// 1-based cursor into [`Search::matches`]; 0 when nothing matches.
    #[must_use]
    pub fn current(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_line(&self) -> Option<usize> {
        self.current
            .checked_sub(1)
            .and_then(|index| self.matches.get(index))
            .copied()
    }

    /// Drop matches for the `evicted` oldest lines and renumber the rest, so
    /// the cursor keeps pointing at the same line while it survives.
    fn shift_out(&mut self, evicted: usize) {
        if evicted == 0 {
            return;
        }
        let gone = self.matches.partition_point(|line| *line < evicted);
        self.matches.drain(..gone);
        for line in &mut self.matches {
            *line -= evicted;
        }
        self.current = if self.matches.is_empty() {
            0
        } else if self.current > gone {
            self.current - gone
        } else {
            1
        };
    }

    /// Char ranges of every match in `plain`.
    fn spans(&self, plain: &str) -> Vec<(usize, usize)> {
        self.matcher
            .find_iter(plain)
            .map(|found| {
                let start = plain[..found.start()].chars().count();
                (start, start + found.as_str().chars().count())
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// First visible display row when not following.
    pub offset: usize,
    pub h_offset: usize,
    /// Pinned to the newest line.
    pub follow: bool,
    /// Full pane size including chrome.
    pub frame: FrameSize,
}

/// Scrollbar thumb as `(position, length)` for a track of `height` rows, or
/// `None` when everything fits.
#[must_use]
pub fn scrollbar(height: usize, total: usize, offset: usize) -> Option<(usize, usize)> {
    if height == 0 || total <= height {
        return None;
    }
    let thumb = (height * height / total).clamp(1, height);
    let travel = height - thumb;
    let position = (offset * travel / (total - height).max(1)).min(travel);
    Some((position, thumb))
}

#[derive(Debug, Clone)]
pub struct Pane {
    id: PaneId,
    container: ContainerInfo,
    session: Option<SessionId>,
    connected: bool,
    reconnecting: bool,
    busy: Option<ContainerAction>,
    history_limit: usize,
    lines: VecDeque<BufferedLine>,
    staging: VecDeque<BufferedLine>,
    paused: bool,
    word_wrap: bool,
    viewport: Viewport,
    search: Option<Search>,
}

impl Pane {
    #[must_use]
    pub fn new(id: PaneId, container: ContainerInfo, history_limit: usize) -> Self {
        Self {
            id,
            container,
            session: None,
            connected: false,
            reconnecting: false,
            busy: None,
            history_limit: history_limit.max(1),
            lines: VecDeque::new(),
            staging: VecDeque::new(),
            paused: false,
            word_wrap: true,
            viewport: Viewport {
                offset: 0,
                h_offset: 0,
                follow: true,
                frame: FrameSize {
                    width: 0,
                    height: 0,
                },
            },
            search: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> PaneId {
        self.id
    }

    #[must_use]
    pub fn container(&self) -> &ContainerInfo {
        &self.container
    }

    #[must_use]
    pub fn session(&self) -> Option<SessionId> {
        self.session
    }

    /// Bind a freshly opened stream session; the pane is live again.
    pub fn attach_session(&mut self, session: SessionId) {
        self.session = Some(session);
        self.connected = true;
        self.reconnecting = false;
    }

    /// Whether events from `session` still belong to this pane.
    #[must_use]
    pub fn accepts(&self, session: SessionId) -> bool {
        self.session == Some(session)
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    #[must_use]
    pub fn is_reconnecting(&self) -> bool {
        self.reconnecting
    }

    /// Drop the session and note why in the log.
    pub fn mark_disconnected(&mut self, message: &str, reconnecting: bool) {
        self.session = None;
        self.connected = false;
        self.reconnecting = reconnecting;
        self.push_system(message);
    }

    #[must_use]
    pub fn busy(&self) -> Option<ContainerAction> {
        self.busy
    }

    pub fn set_busy(&mut self, action: Option<ContainerAction>) {
        self.busy = action;
    }

    pub fn update_container(&mut self, container: ContainerInfo) {
        self.container = container;
    }

    /// Adopt a new container identity in place: history, staging, search
    /// matches and viewport start over.
    pub fn replace_container(&mut self, container: ContainerInfo) {
        self.container = container;
        self.session = None;
        self.lines.clear();
        self.staging.clear();
        self.viewport.offset = 0;
        self.viewport.h_offset = 0;
        self.viewport.follow = true;
        if let Some(search) = self.search.as_mut() {
            search.matches.clear();
            search.current = 0;
        }
        self.push_system("reconnected");
    }

    pub fn push_system(&mut self, message: &str) {
        let line = LogLine::system(self.container.id.clone(), message);
        self.append(line);
    }

    /// Visible history, oldest first.
    pub fn lines(&self) -> impl Iterator<Item = &LogLine> {
        self.lines.iter().map(|buffered| &buffered.line)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn staged_len(&self) -> usize {
        self.staging.len()
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[must_use]
    pub fn word_wrap(&self) -> bool {
        self.word_wrap
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[must_use]
    pub fn search(&self) -> Option<&Search> {
        self.search.as_ref()
    }

    pub fn append(&mut self, line: LogLine) {
        let buffered = BufferedLine::new(line);
        if self.paused {
            self.staging.push_back(buffered);
            while self.staging.len() > self.history_limit {
                self.staging.pop_front();
            }
        } else {
            self.push_visible(buffered);
        }
    }

    fn push_visible(&mut self, buffered: BufferedLine) {
        self.lines.push_back(buffered);
        let mut evicted = 0;
        let mut evicted_rows = 0;
        while self.lines.len() > self.history_limit {
            if let Some(old) = self.lines.pop_front() {
                evicted += 1;
                evicted_rows += self.row_count(old.width);
            }
        }
        if !self.viewport.follow {
            self.viewport.offset = self.viewport.offset.saturating_sub(evicted_rows);
        }
        if let Some(search) = self.search.as_mut() {
            search.shift_out(evicted);
            let index = self.lines.len().saturating_sub(1);
            if self.lines.back().is_some_and(|last| search.matcher.is_match(&last.plain)) {
                search.matches.push(index);
                if search.current == 0 {
                    search.current = 1;
                }
            }
        }
    }

    /// Toggle pause; resuming flushes staged lines in arrival order.
    pub fn toggle_pause(&mut self) -> bool {
        if self.paused {
            self.paused = false;
            let staged = std::mem::take(&mut self.staging);
            for buffered in staged {
                self.push_visible(buffered);
            }
        } else {
            self.paused = true;
        }
        self.paused
    }

    pub fn set_word_wrap(&mut self, enabled: bool) {
        self.word_wrap = enabled;
        self.viewport.h_offset = 0;
    }

    pub fn toggle_word_wrap(&mut self) -> bool {
        self.set_word_wrap(!self.word_wrap);
        self.word_wrap
    }

    /// Record the pane's full on-screen size.
    pub fn resize(&mut self, frame: FrameSize) {
        self.viewport.frame = frame;
    }

    /// Columns available for log text after chrome, timestamp and scrollbar.
    #[must_use]
    pub fn text_width(&self) -> usize {
        text_width_for(self.viewport.frame.width)
    }

    #[must_use]
    pub fn content_height(&self) -> usize {
        content_height_for(self.viewport.frame.height)
    }

    fn row_count(&self, width: usize) -> usize {
        if self.word_wrap {
            width.div_ceil(self.text_width()).max(1)
        } else {
            1
        }
    }

    fn display_rows(&self) -> Vec<DisplayRow> {
        let text_width = self.text_width();
        let mut rows = Vec::with_capacity(self.lines.len());
        for (index, buffered) in self.lines.iter().enumerate() {
            if self.word_wrap {
                let count = self.row_count(buffered.width);
                for part in 0..count {
                    let start = part * text_width;
                    rows.push(DisplayRow {
                        line: index,
                        start,
                        end: (start + text_width).min(buffered.width),
                        first: part == 0,
                    });
                }
            } else {
                let start = self.viewport.h_offset.min(buffered.width);
                rows.push(DisplayRow {
                    line: index,
                    start,
                    end: (start + text_width).min(buffered.width),
                    first: true,
                });
            }
        }
        rows
    }

    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.lines
            .iter()
            .map(|buffered| self.row_count(buffered.width))
            .sum()
    }

    /// First display row of buffered line `index`, using the render wrap.
    #[must_use]
    pub fn display_line_of(&self, index: usize) -> usize {
        self.lines
            .iter()
            .take(index)
            .map(|buffered| self.row_count(buffered.width))
            .sum()
    }

    fn max_offset(&self) -> usize {
        self.total_rows().saturating_sub(self.content_height())
    }

    /// Top display row actually shown.
    #[must_use]
    pub fn effective_offset(&self) -> usize {
        let max = self.max_offset();
        if self.viewport.follow {
            max
        } else {
            self.viewport.offset.min(max)
        }
    }

    pub fn scroll_up(&mut self, rows: usize) {
        self.viewport.offset = self.effective_offset().saturating_sub(rows);
        self.viewport.follow = false;
    }

    pub fn scroll_down(&mut self, rows: usize) {
        let max = self.max_offset();
        let offset = self.effective_offset().saturating_add(rows);
        self.viewport.offset = offset.min(max);
        self.viewport.follow = offset >= max;
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.content_height().max(1));
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.content_height().max(1));
    }

    pub fn scroll_to_top(&mut self) {
        self.viewport.offset = 0;
        self.viewport.follow = false;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.viewport.follow = true;
    }

    /// Horizontal scroll; only meaningful without word wrap.
    pub fn scroll_left(&mut self, cols: usize) {
        if !self.word_wrap {
            self.viewport.h_offset = self.viewport.h_offset.saturating_sub(cols);
        }
    }

    pub fn scroll_right(&mut self, cols: usize) {
        if self.word_wrap {
            return;
        }
        let widest = self.lines.iter().map(|buffered| buffered.width).max().unwrap_or(0);
        let max = widest.saturating_sub(self.text_width());
        self.viewport.h_offset = (self.viewport.h_offset + cols).min(max);
    }

    /// Start a case-insensitive search and jump to the first match.
    /// An empty query clears the search.
    pub fn set_search(&mut self, query: &str) {
        if query.is_empty() {
            self.search = None;
            return;
        }
        self.search = Search::new(query);
        self.rescan_search();
        if let Some(search) = self.search.as_mut() {
            search.current = usize::from(!search.matches.is_empty());
        }
        self.center_current_match();
    }

    pub fn clear_search(&mut self) {
        self.search = None;
    }

    pub fn next_match(&mut self) -> bool {
        let Some(search) = self.search.as_mut() else {
            return false;
        };
        if search.matches.is_empty() {
            return false;
        }
        search.current = search.current % search.matches.len() + 1;
        self.center_current_match();
        true
    }

    pub fn prev_match(&mut self) -> bool {
        let Some(search) = self.search.as_mut() else {
            return false;
        };
        if search.matches.is_empty() {
            return false;
        }
        search.current = if search.current <= 1 {
            search.matches.len()
        } else {
            search.current - 1
        };
        self.center_current_match();
        true
    }

    fn center_current_match(&mut self) {
        let Some(line) = self.search.as_ref().and_then(Search::current_line) else {
            return;
        };
        let display = self.display_line_of(line);
        let target = display.saturating_sub(self.content_height() / 2);
        self.viewport.offset = target.min(self.max_offset());
        self.viewport.follow = false;
    }

    fn rescan_search(&mut self) {
        let Some(search) = self.search.as_mut() else {
            return;
        };
        search.matches = self
            .lines
            .iter()
            .enumerate()
            .filter(|(_, buffered)| search.matcher.is_match(&buffered.plain))
            .map(|(index, _)| index)
            .collect();
        search.current = search.current.min(search.matches.len());
    }

    fn row_text(&self, row: &DisplayRow) -> String {
        let Some(buffered) = self.lines.get(row.line) else {
            return String::new();
        };
        let mut text = if row.first {
            timestamp_label(&buffered.line)
        } else {
            " ".repeat(TIMESTAMP_WIDTH)
        };
        text.extend(
            buffered
                .plain
                .chars()
                .skip(row.start)
                .take(row.end.saturating_sub(row.start)),
        );
        text
    }

    /// Plain text under a content-relative range (end column exclusive),
    /// resolved against the current scroll position.
    #[must_use]
    pub fn selected_text(&self, start: ContentPos, end: ContentPos) -> String {
        let rows = self.display_rows();
        let offset = self.effective_offset();
        let mut out = Vec::new();
        for screen_row in start.row..=end.row {
            let Some(row) = rows.get(offset + screen_row) else {
                break;
            };
            let text = self.row_text(row);
            let from = if screen_row == start.row { start.col } else { 0 };
            let to = if screen_row == end.row {
                end.col
            } else {
                usize::MAX
            };
            let piece: String = text
                .chars()
                .skip(from)
                .take(to.saturating_sub(from))
                .collect();
            out.push(piece.trim_end().to_owned());
        }
        out.join("\n")
    }

    /// Render the pane into its own frame of `size`.
    #[must_use]
    pub fn render(
        &self,
        size: FrameSize,
        focused: bool,
        theme: ThemeSpec,
        selection: Option<(ContentPos, ContentPos)>,
    ) -> RenderFrame {
        let mut frame = RenderFrame::new(size, theme);
        if size.width < 2 || size.height < 2 {
            return frame;
        }
        let border_color = frame.color_for_role(if focused {
            TextRole::Focus
        } else {
            TextRole::Muted
        });
        let inner = frame.draw_panel(
            Rect::new(0, 0, size.width, size.height),
            self.container.display_name(),
            BorderStyle::for_focus(focused),
            border_color,
        );
        if inner.height == 0 {
            return frame;
        }
        self.render_header(&mut frame, inner);

        let content = Rect::new(
            inner.x,
            inner.y + 1,
            inner.width,
            inner.height.saturating_sub(1),
        );
        let text_width = text_width_for(size.width);
        let rows = self.display_rows();
        let offset = self.effective_offset().min(rows.len().saturating_sub(content.height));

        if rows.is_empty() {
            let hint = if self.connected { "waiting for logs" } else { "not streaming" };
            frame.draw_with_style(
                content.x,
                content.y,
                hint,
                frame.style_for_role(TextRole::Muted),
                content.width,
            );
        }

        for (screen_row, row) in rows.iter().skip(offset).take(content.height).enumerate() {
            let y = content.y + screen_row;
            self.render_row(&mut frame, row, content.x, y, text_width);
            if let Some((start, end)) = selection {
                if (start.row..=end.row).contains(&screen_row) {
                    let from = if screen_row == start.row { start.col } else { 0 };
                    let to = if screen_row == end.row {
                        end.col
                    } else {
                        usize::MAX
                    };
                    let selection_bg = TermColor::Ansi256(theme.color(StyleToken::Selection));
                    let limit = content.width.saturating_sub(SCROLLBAR_WIDTH);
                    for col in from..to.min(limit) {
                        frame.set_bg(content.x + col, y, selection_bg);
                    }
                }
            }
        }

        if let Some((position, thumb)) = scrollbar(content.height, rows.len(), offset) {
            let x = content.x + content.width.saturating_sub(1);
            let track = frame.style_for_role(TextRole::Muted);
            let handle = frame.style_for_role(if focused {
                TextRole::Focus
            } else {
                TextRole::Accent
            });
            for row in 0..content.height {
                let (glyph, style) = if (position..position + thumb).contains(&row) {
                    ("┃", handle)
                } else {
                    ("│", track)
                };
                frame.draw_with_style(x, content.y + row, glyph, style, 1);
            }
        }
        frame
    }

    fn render_header(&self, frame: &mut RenderFrame, inner: Rect) {
        let muted = frame.style_for_role(TextRole::Muted);
        let left = if self.container.image.is_empty() {
            self.container.state.label().to_owned()
        } else {
            format!("{} · {}", self.container.state.label(), self.container.image)
        };
        frame.draw_with_style(inner.x, inner.y, &left, muted, inner.width);

        let mut badges: Vec<(String, TextRole)> = Vec::new();
        if let Some(action) = self.busy {
            badges.push((format!("{action}…"), TextRole::Info));
        }
        if let Some(search) = &self.search {
            badges.push((
                format!("/{} {}/{}", search.query, search.current, search.match_count()),
                TextRole::Accent,
            ));
        }
        if self.paused {
            badges.push((format!("PAUSED +{}", self.staging.len()), TextRole::Warning));
        }
        if !self.word_wrap {
            badges.push(("NOWRAP".to_owned(), TextRole::Muted));
        }
        if self.reconnecting {
            badges.push(("RECONNECTING".to_owned(), TextRole::Warning));
        } else if !self.connected {
            badges.push(("DISCONNECTED".to_owned(), TextRole::Danger));
        }
        let width: usize = badges
            .iter()
            .map(|(text, _)| text.chars().count() + 1)
            .sum();
        if width > inner.width {
            return;
        }
        let mut x = inner.x + inner.width - width;
        for (text, role) in badges {
            x += 1;
            let style = frame.style_for_role(role);
            frame.draw_with_style(x, inner.y, &text, style, inner.width);
            x += text.chars().count();
        }
    }

    fn render_row(&self, frame: &mut RenderFrame, row: &DisplayRow, x: usize, y: usize, text_width: usize) {
        let Some(buffered) = self.lines.get(row.line) else {
            return;
        };
        if row.first {
            let muted = frame.style_for_role(TextRole::Muted);
            frame.draw_with_style(x, y, &timestamp_label(&buffered.line), muted, TIMESTAMP_WIDTH);
        }
        let base = match buffered.line.stream {
            StreamClass::Stdout => frame.style_for_role(TextRole::Primary),
            StreamClass::Stderr => frame.style_for_role(TextRole::Danger),
            StreamClass::System => frame.style_for_role(TextRole::Info),
        };
        let mut chars = styled_chars(&buffered.line.content, base);
        let end = row.end.min(chars.len());
        let start = row.start.min(end);
        self.highlight_matches(frame.theme(), row.line, &buffered.plain, &mut chars);
        frame.draw_styled_chars(x + TIMESTAMP_WIDTH, y, &chars[start..end], text_width);
    }

    fn highlight_matches(&self, theme: ThemeSpec, line: usize, plain: &str, chars: &mut [StyledChar]) {
        let Some(search) = &self.search else {
            return;
        };
        if search.matches.binary_search(&line).is_err() {
            return;
        }
        let token = if search.current_line() == Some(line) {
            StyleToken::CurrentMatch
        } else {
            StyleToken::Match
        };
        let bg = TermColor::Ansi256(theme.color(token));
        for (start, end) in search.spans(plain) {
            for styled in chars.iter_mut().take(end).skip(start) {
                styled.style = CellStyle { bg, ..styled.style };
            }
        }
    }
}

/// `HH:MM:SS ` in local time.
#[must_use]
pub fn timestamp_label(line: &LogLine) -> String {
    format!("{} ", line.timestamp.with_timezone(&Local).format("%H:%M:%S"))
}

fn text_width_for(frame_width: usize) -> usize {
    frame_width
        .saturating_sub(2 * BORDER_OFFSET + SCROLLBAR_WIDTH + TIMESTAMP_WIDTH)
        .max(1)
}

fn content_height_for(frame_height: usize) -> usize {
    // Bottom border plus the header rows.
    frame_height.saturating_sub(HEADER_ROWS + 1)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use tailgrid_core::{LogLine, PaneId, StreamClass};
    use tailgrid_render::render::FrameSize;
    use tailgrid_render::style::{StyleToken, ThemeSpec};
    use tailgrid_runtime::mock::test_container;

    use super::{scrollbar, timestamp_label, Pane, TIMESTAMP_WIDTH};
    use crate::selection::ContentPos;

    fn line(text: &str) -> LogLine {
        LogLine {
            source_id: "c1".into(),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            stream: StreamClass::Stdout,
            content: text.into(),
        }
    }

    fn pane(width: usize, height: usize) -> Pane {
        let mut pane = Pane::new(PaneId(0), test_container("c1", "api", "shop", "api"), 1000);
        pane.resize(FrameSize { width, height });
        pane
    }

    fn texts(pane: &Pane) -> Vec<String> {
        pane.lines().map(|l| l.content.clone()).collect()
    }

    #[test]
    fn history_keeps_last_thousand_in_order() {
        let mut pane = pane(80, 20);
        for i in 0..1500 {
            pane.append(line(&format!("line {i}")));
        }
        let kept = texts(&pane);
        assert_eq!(kept.len(), 1000);
        assert_eq!(kept.first().map(String::as_str), Some("line 500"));
        assert_eq!(kept.last().map(String::as_str), Some("line 1499"));
        assert!(kept.windows(2).all(|pair| {
            let a: usize = pair[0][5..].parse().unwrap();
            let b: usize = pair[1][5..].parse().unwrap();
            b == a + 1
        }));
    }

    #[test]
    fn pause_stages_then_flushes_in_order() {
        let mut pane = pane(80, 20);
        pane.append(line("before"));
        assert!(pane.toggle_pause());
        pane.append(line("during 1"));
        pane.append(line("during 2"));
        assert_eq!(pane.len(), 1);
        assert_eq!(pane.staged_len(), 2);
        assert!(!pane.toggle_pause());
        assert_eq!(texts(&pane), vec!["before", "during 1", "during 2"]);
        assert_eq!(pane.staged_len(), 0);
    }

    #[test]
    fn single_match_search_wraps_to_itself() {
        let mut pane = pane(80, 20);
        for text in ["a", "b", "c"] {
            pane.append(line(text));
        }
        pane.set_search("b");
        let search = pane.search().unwrap();
        assert_eq!(search.match_count(), 1);
        assert_eq!(search.current(), 1);
        assert!(pane.next_match());
        assert_eq!(pane.search().unwrap().current(), 1);
        assert!(pane.prev_match());
        assert_eq!(pane.search().unwrap().current(), 1);
    }

    #[test]
    fn search_is_case_insensitive_and_tracks_appends() {
        let mut pane = pane(80, 20);
        pane.append(line("Error: disk"));
        pane.append(line("ok"));
        pane.set_search("error");
        assert_eq!(pane.search().unwrap().matches(), &[0]);
        pane.append(line("another ERROR"));
        assert_eq!(pane.search().unwrap().matches(), &[0, 2]);
        assert!(pane.next_match());
        assert_eq!(pane.search().unwrap().current(), 2);
        assert!(pane.next_match());
        assert_eq!(pane.search().unwrap().current(), 1);
    }

    #[test]
    fn search_follows_current_line_through_eviction() {
        let mut pane = Pane::new(PaneId(0), test_container("c1", "api", "shop", "api"), 3);
        pane.resize(FrameSize { width: 80, height: 10 });
        for text in ["x1", "y", "x2"] {
            pane.append(line(text));
        }
        pane.set_search("x");
        pane.next_match();
        assert_eq!(pane.search().unwrap().current_line(), Some(2));
        pane.append(line("x3"));
        let search = pane.search().unwrap();
        assert_eq!(search.matches(), &[1, 2]);
        assert_eq!(search.current_line(), Some(1));
    }

    #[test]
    fn matches_stay_consistent_while_history_rolls() {
        let mut pane = Pane::new(PaneId(0), test_container("c1", "api", "shop", "api"), 5);
        pane.resize(FrameSize { width: 80, height: 10 });
        pane.set_search("hit");
        for i in 0..40 {
            pane.append(line(&format!("{} {i}", if i % 3 == 0 { "hit" } else { "miss" })));
        }
        let expected: Vec<usize> = texts(&pane)
            .iter()
            .enumerate()
            .filter(|(_, text)| text.starts_with("hit"))
            .map(|(index, _)| index)
            .collect();
        let search = pane.search().unwrap();
        assert_eq!(search.matches(), expected.as_slice());
        assert!(search.current() >= 1 && search.current() <= expected.len());
    }

    #[test]
    fn evicted_current_match_falls_back_to_first() {
        let mut pane = Pane::new(PaneId(0), test_container("c1", "api", "shop", "api"), 2);
        pane.resize(FrameSize { width: 80, height: 10 });
        pane.append(line("x1"));
        pane.append(line("y"));
        pane.set_search("x");
        assert_eq!(pane.search().unwrap().current_line(), Some(0));
        pane.append(line("x2"));
        let search = pane.search().unwrap();
        assert_eq!(search.matches(), &[1]);
        assert_eq!(search.current(), 1);
        pane.append(line("z"));
        pane.append(line("z"));
        let search = pane.search().unwrap();
        assert!(search.matches().is_empty());
        assert_eq!(search.current(), 0);
    }

    #[test]
    fn match_jump_centers_viewport() {
        let mut pane = pane(80, 13);
        for i in 0..100 {
            pane.append(line(if i == 60 { "needle" } else { "hay" }));
        }
        pane.set_search("needle");
        assert_eq!(pane.content_height(), 10);
        assert_eq!(pane.effective_offset(), 55);
        assert!(!pane.viewport().follow);
    }

    #[test]
    fn wrap_maps_lines_to_display_rows() {
        // Width 22 leaves 10 text columns.
        let mut pane = pane(22, 10);
        assert_eq!(pane.text_width(), 10);
        pane.append(line("0123456789abcdefghij!"));
        pane.append(line("short"));
        assert_eq!(pane.total_rows(), 4);
        assert_eq!(pane.display_line_of(1), 3);
        pane.set_word_wrap(false);
        assert_eq!(pane.total_rows(), 2);
        assert_eq!(pane.display_line_of(1), 1);
    }

    #[test]
    fn follow_tail_until_scrolled_up() {
        let mut pane = pane(80, 13);
        for i in 0..30 {
            pane.append(line(&format!("{i}")));
        }
        assert_eq!(pane.effective_offset(), 20);
        pane.scroll_up(5);
        pane.append(line("new"));
        assert_eq!(pane.effective_offset(), 15);
        pane.scroll_down(100);
        assert!(pane.viewport().follow);
        pane.append(line("newer"));
        assert_eq!(pane.effective_offset(), 22);
    }

    #[test]
    fn horizontal_scroll_only_without_wrap() {
        let mut pane = pane(22, 10);
        pane.append(line(&"x".repeat(25)));
        pane.scroll_right(4);
        assert_eq!(pane.viewport().h_offset, 0);
        pane.set_word_wrap(false);
        pane.scroll_right(100);
        assert_eq!(pane.viewport().h_offset, 15);
        pane.toggle_word_wrap();
        assert_eq!(pane.viewport().h_offset, 0);
    }

    #[test]
    fn scrollbar_math() {
        assert_eq!(scrollbar(10, 10, 0), None);
        assert_eq!(scrollbar(10, 100, 0), Some((0, 1)));
        assert_eq!(scrollbar(10, 100, 90), Some((9, 1)));
        assert_eq!(scrollbar(10, 20, 5), Some((2, 5)));
        assert_eq!(scrollbar(10, 20, 10), Some((5, 5)));
    }

    #[test]
    fn selection_extracts_rendered_text() {
        let mut pane = pane(22, 10);
        pane.append(line("0123456789abcdefghij"));
        pane.append(line("tail  "));
        let stamp = timestamp_label(pane.lines().next().unwrap());
        // Row 0: "HH:MM:SS 0123456789", row 1: continuation, row 2: "tail".
        let start = ContentPos { row: 0, col: TIMESTAMP_WIDTH + 5 };
        let end = ContentPos { row: 2, col: TIMESTAMP_WIDTH + 3 };
        assert_eq!(
            pane.selected_text(start, end),
            format!("56789\n{}abcdefghij\n{stamp}tai", " ".repeat(TIMESTAMP_WIDTH))
        );
        let whole_first = pane.selected_text(ContentPos { row: 0, col: 0 }, ContentPos { row: 0, col: 30 });
        assert_eq!(whole_first, format!("{stamp}0123456789"));
    }

    #[test]
    fn replace_container_resets_history() {
        let mut pane = pane(80, 20);
        pane.append(line("old"));
        pane.set_search("old");
        pane.scroll_up(1);
        pane.replace_container(test_container("c2", "api", "shop", "api"));
        assert_eq!(pane.container().id, "c2");
        let contents: Vec<_> = pane.lines().map(|l| (l.stream, l.content.clone())).collect();
        assert_eq!(contents, vec![(StreamClass::System, "reconnected".to_owned())]);
        assert!(pane.viewport().follow);
        assert_eq!(pane.search().unwrap().match_count(), 0);
    }

    #[test]
    fn render_draws_chrome_rows_and_highlights() {
        let mut pane = pane(40, 6);
        pane.attach_session(tailgrid_core::SessionId(1));
        pane.append(line("boot \u{1b}[31mfailed\u{1b}[0m"));
        pane.set_search("failed");
        let theme = ThemeSpec::default();
        let frame = pane.render(FrameSize { width: 40, height: 6 }, true, theme, None);
        let snapshot = frame.snapshot();
        let rows: Vec<&str> = snapshot.lines().collect();
        assert!(rows[0].starts_with("┏ api ━"), "{snapshot}");
        assert!(rows[1].contains("running"), "{snapshot}");
        assert!(rows[1].contains("/failed 1/1"), "{snapshot}");
        assert!(rows[2].contains("boot failed"), "{snapshot}");
        let failed_x = rows[2].chars().position(|c| c == 'f').unwrap();
        let cell = frame.cell(failed_x, 2).unwrap();
        assert_eq!(
            cell.style.bg,
            tailgrid_render::render::TermColor::Ansi256(theme.color(StyleToken::CurrentMatch))
        );
    }

    #[test]
    fn render_marks_selection_cells() {
        let mut pane = pane(40, 6);
        pane.append(line("hello world"));
        let theme = ThemeSpec::default();
        let range = (ContentPos { row: 0, col: 9 }, ContentPos { row: 0, col: 14 });
        let frame = pane.render(FrameSize { width: 40, height: 6 }, false, theme, Some(range));
        let selection_bg = tailgrid_render::render::TermColor::Ansi256(theme.color(StyleToken::Selection));
        assert_eq!(frame.cell(1 + 9, 2).unwrap().style.bg, selection_bg);
        assert_eq!(frame.cell(1 + 13, 2).unwrap().style.bg, selection_bg);
        assert_ne!(frame.cell(1 + 14, 2).unwrap().style.bg, selection_bg);
    }
}
