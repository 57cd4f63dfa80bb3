use anyhow::Error;

use crate::fuzzy::{self, MatchResult};
use crate::scanner::Directory;

/// The single mutable state container. Created once at startup, owned by the
/// state machine for the whole process lifetime; handlers borrow it for the
/// duration of one event. The directory and filtered lists are replaced
/// wholesale on load and on every query change, never mutated in place.
#[derive(Debug, Default)]
pub struct AppContext {
    pub directories: Vec<Directory>,
    pub filtered: Vec<MatchResult>,
    pub selected_index: usize,
    pub scroll_offset: usize,
    pub filter_query: String,
    pub selected_directory: Option<Directory>,
    pub error: Option<Error>,
}

impl AppContext {
    pub fn load_directories(&mut self, directories: Vec<Directory>) {
        self.filtered = directories
            .iter()
            .map(|directory| MatchResult {
                directory: directory.clone(),
                score: 0,
                match_indices: Vec::new(),
            })
            .collect();
        self.directories = directories;
    }

    pub fn set_error(&mut self, error: Error) {
        self.error = Some(error);
    }

    pub fn move_selection_up(&mut self) {
        if !self.filtered.is_empty() {
            self.selected_index = self.selected_index.saturating_sub(1);
        }
    }

    pub fn move_selection_down(&mut self) {
        if !self.filtered.is_empty() {
            self.selected_index = (self.selected_index + 1).min(self.filtered.len() - 1);
        }
    }

    pub fn add_filter_char(&mut self, ch: char) {
        self.filter_query.push(ch);
        self.reset_selection_and_scroll();
        self.refresh_filtered();
    }

    /// Drops the last filter character. A no-op on an empty filter: the
    /// selection and scroll stay untouched.
    pub fn remove_last_filter_char(&mut self) {
        if self.filter_query.pop().is_some() {
            self.reset_selection_and_scroll();
            self.refresh_filtered();
        }
    }

    pub fn current_selection(&self) -> Option<&MatchResult> {
        self.filtered.get(self.selected_index)
    }

    pub fn select_directory(&mut self, directory: Directory) {
        self.selected_directory = Some(directory);
    }

    /// Keeps the selected row inside the visible window without recomputing
    /// the offset from scratch: advance when the selection falls below the
    /// window, snap when it moves above.
    pub fn adjust_scroll(&mut self, window: usize) {
        if window == 0 {
            return;
        }
        if self.selected_index >= self.scroll_offset + window {
            self.scroll_offset = self.selected_index + 1 - window;
        } else if self.selected_index < self.scroll_offset {
            self.scroll_offset = self.selected_index;
        }
    }

    fn reset_selection_and_scroll(&mut self) {
        self.selected_index = 0;
        self.scroll_offset = 0;
    }

    fn refresh_filtered(&mut self) {
        self.filtered = fuzzy::match_directories(&self.filter_query, &self.directories);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn context_with(names: &[&str]) -> AppContext {
        let mut context = AppContext::default();
        context.load_directories(
            names
                .iter()
                .map(|name| Directory {
                    name: name.to_string(),
                    full_path: PathBuf::from(format!("~/git/{name}")),
                })
                .collect(),
        );
        context
    }

    #[test]
    fn loading_populates_unscored_filtered_list() {
        let context = context_with(&["alpha", "beta"]);
        assert_eq!(context.filtered.len(), 2);
        assert!(context.filtered.iter().all(|result| result.score == 0));
    }

    #[test]
    fn selection_is_clamped_to_list_bounds() {
        let mut context = context_with(&["alpha", "beta", "gamma"]);

        context.move_selection_up();
        assert_eq!(context.selected_index, 0);

        for _ in 0..10 {
            context.move_selection_down();
        }
        assert_eq!(context.selected_index, 2);

        context.move_selection_up();
        assert_eq!(context.selected_index, 1);
    }

    #[test]
    fn selection_moves_are_no_ops_on_an_empty_list() {
        let mut context = context_with(&[]);
        context.move_selection_down();
        context.move_selection_up();
        assert_eq!(context.selected_index, 0);
        assert!(context.current_selection().is_none());
    }

    #[test]
    fn typing_resets_selection_and_scroll_and_refilters() {
        let mut context = context_with(&["alpha", "beta", "gamma"]);
        context.move_selection_down();
        context.scroll_offset = 1;

        context.add_filter_char('b');

        assert_eq!(context.selected_index, 0);
        assert_eq!(context.scroll_offset, 0);
        assert_eq!(context.filtered.len(), 1);
        assert_eq!(context.filtered[0].directory.name, "beta");
    }

    #[test]
    fn backspace_on_empty_filter_changes_nothing() {
        let mut context = context_with(&["alpha", "beta"]);
        context.move_selection_down();
        context.scroll_offset = 1;

        context.remove_last_filter_char();

        assert_eq!(context.filter_query, "");
        assert_eq!(context.selected_index, 1);
        assert_eq!(context.scroll_offset, 1);
        assert_eq!(context.filtered.len(), 2);
    }

    #[test]
    fn backspace_restores_the_wider_match_set() {
        let mut context = context_with(&["alpha", "beta"]);
        context.add_filter_char('b');
        assert_eq!(context.filtered.len(), 1);

        context.remove_last_filter_char();
        assert_eq!(context.filter_query, "");
        assert_eq!(context.filtered.len(), 2);
    }

    #[test]
    fn scroll_window_always_contains_the_selection() {
        let names: Vec<String> = (0..30).map(|index| format!("project{index:02}")).collect();
        let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut context = context_with(&name_refs);
        let window = 5;

        for _ in 0..20 {
            context.move_selection_down();
            context.adjust_scroll(window);
            assert!(context.scroll_offset <= context.selected_index);
            assert!(context.selected_index < context.scroll_offset + window);
        }

        for _ in 0..20 {
            context.move_selection_up();
            context.adjust_scroll(window);
            assert!(context.scroll_offset <= context.selected_index);
            assert!(context.selected_index < context.scroll_offset + window);
        }
    }
}
