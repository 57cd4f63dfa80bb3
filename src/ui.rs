use std::io::{self, Stdout};

use anyhow::{Context, Result};
use crossterm::cursor;
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Frame;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{List, ListItem, Paragraph};

use crate::context::AppContext;
use crate::fuzzy::{MatchResult, display_path};
use crate::machine::Screen;

// Layout tunables. Header = title + filter + spacer; the offset accounts for
// the status line and one slack row.
const HEADER_HEIGHT: u16 = 3;
const LIST_HEIGHT_OFFSET: u16 = 2;
const MIN_VISIBLE_ITEMS: usize = 5;
const DEFAULT_TERMINAL_HEIGHT: u16 = 24;

type TuiTerminal = Terminal<CrosstermBackend<Stdout>>;

/// Owns raw mode and the alternate screen. `setup` and `restore` are both
/// idempotent; restore in particular runs on every exit path and must be
/// safe to repeat.
pub struct TerminalScreen {
    terminal: Option<TuiTerminal>,
}

impl TerminalScreen {
    pub fn new() -> Self {
        Self { terminal: None }
    }
}

impl Screen for TerminalScreen {
    fn setup(&mut self) -> Result<()> {
        if self.terminal.is_some() {
            return Ok(());
        }
        enable_raw_mode().context("failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, cursor::Hide)
            .context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        self.terminal = Some(Terminal::new(backend).context("failed to create terminal")?);
        Ok(())
    }

    fn render(&mut self, context: &mut AppContext) -> Result<()> {
        let Some(terminal) = self.terminal.as_mut() else {
            return Ok(());
        };
        terminal.draw(|frame| {
            let window = visible_rows(frame.area().height);
            context.adjust_scroll(window);
            draw_ui(frame, context, window);
        })?;
        Ok(())
    }

    fn restore(&mut self) -> Result<()> {
        let Some(mut terminal) = self.terminal.take() else {
            return Ok(());
        };
        disable_raw_mode().context("failed to disable raw mode")?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show)
            .context("failed to leave alternate screen")?;
        terminal.show_cursor().context("failed to show cursor")?;
        Ok(())
    }
}

/// Rows available for the directory list, recomputed from the live terminal
/// height on every render. Falls back to a conventional 24-row terminal when
/// the height is unknown.
pub fn visible_rows(terminal_height: u16) -> usize {
    let height = if terminal_height == 0 {
        DEFAULT_TERMINAL_HEIGHT
    } else {
        terminal_height
    };
    let list_height = height.saturating_sub(HEADER_HEIGHT + LIST_HEIGHT_OFFSET);
    (list_height as usize).max(MIN_VISIBLE_ITEMS)
}

fn draw_ui(frame: &mut Frame, context: &AppContext, window: usize) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    draw_header(frame, chunks[0]);
    draw_filter_line(frame, context, chunks[1]);
    draw_directory_list(frame, context, window, chunks[3]);
    draw_status_line(frame, chunks[4]);
}

fn draw_header(frame: &mut Frame, area: Rect) {
    let title = Span::styled(
        "tmux sessionizer",
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );
    frame.render_widget(Paragraph::new(Line::from(title)), area);
}

fn draw_filter_line(frame: &mut Frame, context: &AppContext, area: Rect) {
    let line = Line::from(vec![
        Span::raw("fuzzy search: "),
        Span::styled(
            context.filter_query.clone(),
            Style::default().fg(Color::Yellow),
        ),
        Span::styled("█", Style::default().add_modifier(Modifier::DIM)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_directory_list(frame: &mut Frame, context: &AppContext, window: usize, area: Rect) {
    if context.filtered.is_empty() {
        let placeholder = Paragraph::new(Span::styled(
            "No matching directories",
            Style::default().fg(Color::DarkGray),
        ));
        frame.render_widget(placeholder, area);
        return;
    }

    let end = (context.scroll_offset + window).min(context.filtered.len());
    let items: Vec<ListItem<'_>> = context.filtered[context.scroll_offset..end]
        .iter()
        .enumerate()
        .map(|(row, item)| {
            let selected = context.scroll_offset + row == context.selected_index;
            ListItem::new(directory_line(item, selected))
        })
        .collect();

    frame.render_widget(List::new(items), area);
}

fn directory_line(item: &MatchResult, selected: bool) -> Line<'static> {
    let base = if selected {
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let prefix = if selected { "> " } else { "  " };

    let display = display_path(&item.directory.full_path);
    let mut spans = vec![Span::styled(prefix.to_string(), base)];
    spans.extend(highlight_spans(&display, &item.match_indices, base));
    Line::from(spans)
}

/// Splits the display path into spans, styling the matched char positions
/// distinctly. `indices` are strictly increasing char offsets, so one
/// forward pass suffices.
fn highlight_spans(display: &str, indices: &[usize], base: Style) -> Vec<Span<'static>> {
    let highlight = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    let mut spans = Vec::new();
    let mut buffer = String::new();
    let mut buffer_highlighted = false;
    let mut pending = indices.iter().peekable();

    for (index, ch) in display.chars().enumerate() {
        let highlighted = pending.peek().is_some_and(|&&at| at == index);
        if highlighted {
            pending.next();
        }

        if highlighted != buffer_highlighted && !buffer.is_empty() {
            let style = if buffer_highlighted { highlight } else { base };
            spans.push(Span::styled(std::mem::take(&mut buffer), style));
        }
        buffer_highlighted = highlighted;
        buffer.push(ch);
    }

    if !buffer.is_empty() {
        let style = if buffer_highlighted { highlight } else { base };
        spans.push(Span::styled(buffer, style));
    }

    spans
}

fn draw_status_line(frame: &mut Frame, area: Rect) {
    let status = Span::styled(
        "↑/↓: navigate • Enter: select • ESC: exit",
        Style::default().fg(Color::DarkGray),
    );
    frame.render_widget(Paragraph::new(Line::from(status)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::Screen as _;

    #[test]
    fn restore_is_idempotent() {
        // Without a prior setup there is no terminal to tear down; repeated
        // restores must stay no-ops rather than touching the tty again.
        let mut screen = TerminalScreen::new();

        assert!(screen.restore().is_ok());
        assert!(screen.restore().is_ok());
        assert!(screen.terminal.is_none());
    }

    #[test]
    fn visible_rows_uses_the_full_height_minus_chrome() {
        assert_eq!(visible_rows(24), 19);
        assert_eq!(visible_rows(40), 35);
    }

    #[test]
    fn visible_rows_never_drops_below_the_minimum() {
        assert_eq!(visible_rows(8), MIN_VISIBLE_ITEMS);
        assert_eq!(visible_rows(1), MIN_VISIBLE_ITEMS);
    }

    #[test]
    fn visible_rows_falls_back_when_height_is_unknown() {
        assert_eq!(visible_rows(0), visible_rows(DEFAULT_TERMINAL_HEIGHT));
    }

    #[test]
    fn highlight_spans_group_consecutive_matches() {
        let spans = highlight_spans("alpha", &[0, 1, 3], Style::default());

        let texts: Vec<&str> = spans.iter().map(|span| span.content.as_ref()).collect();
        assert_eq!(texts, vec!["al", "p", "h", "a"]);
    }

    #[test]
    fn highlight_spans_without_matches_yield_one_span() {
        let spans = highlight_spans("~/git/alpha", &[], Style::default());

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].content.as_ref(), "~/git/alpha");
    }

    #[test]
    fn highlighted_text_reassembles_the_display_path() {
        let display = "~/git/alpha-beta";
        let spans = highlight_spans(display, &[2, 3, 8, 12], Style::default());

        let reassembled: String = spans.iter().map(|span| span.content.as_ref()).collect();
        assert_eq!(reassembled, display);
    }
}
