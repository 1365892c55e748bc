//! Terminal SQL editor backend.
//!
//! [`BufferEditor`] holds one text buffer per editor instance with a byte
//! cursor, keyword highlighting and schema-aware completion.

use std::collections::BTreeMap;

use ratatui::{
    layout::{Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::hook::{EditorBackend, EditorConfig, MountId, RenderError};
use crate::sql::complete::word_start;
use crate::sql::{Completer, Dialect};
use crate::ui::Theme;

const INDENT: &str = "  ";

/// Handle to a buffer owned by a [`BufferEditor`].
#[derive(Debug, PartialEq, Eq)]
pub struct EditorHandle(u64);

#[derive(Debug)]
struct Buffer {
    mount: MountId,
    text: String,
    cursor: usize,
    dialect: Dialect,
    completer: Completer,
}

impl Buffer {
    fn current_word(&self) -> &str {
        &self.text[word_start(&self.text, self.cursor)..self.cursor]
    }
}

/// Editor backend keeping documents in memory.
#[derive(Debug, Default)]
pub struct BufferEditor {
    next_id: u64,
    buffers: BTreeMap<u64, Buffer>,
}

impl BufferEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live(&self) -> usize {
        self.buffers.len()
    }

    fn buffer_mut(&mut self, handle: &EditorHandle) -> Option<&mut Buffer> {
        self.buffers.get_mut(&handle.0)
    }

    fn buffer_for(&self, mount: &MountId) -> Option<&Buffer> {
        self.buffers.values().find(|b| &b.mount == mount)
    }

    pub fn insert_char(&mut self, handle: &EditorHandle, c: char) {
        if let Some(buf) = self.buffer_mut(handle) {
            buf.text.insert(buf.cursor, c);
            buf.cursor += c.len_utf8();
        }
    }

    pub fn newline(&mut self, handle: &EditorHandle) {
        self.insert_char(handle, '\n');
    }

    pub fn backspace(&mut self, handle: &EditorHandle) {
        if let Some(buf) = self.buffer_mut(handle) {
            if let Some((i, _)) = buf.text[..buf.cursor].char_indices().next_back() {
                buf.text.remove(i);
                buf.cursor = i;
            }
        }
    }

    pub fn cursor_left(&mut self, handle: &EditorHandle) {
        if let Some(buf) = self.buffer_mut(handle) {
            if let Some((i, _)) = buf.text[..buf.cursor].char_indices().next_back() {
                buf.cursor = i;
            }
        }
    }

    pub fn cursor_right(&mut self, handle: &EditorHandle) {
        if let Some(buf) = self.buffer_mut(handle) {
            if let Some(c) = buf.text[buf.cursor..].chars().next() {
                buf.cursor += c.len_utf8();
            }
        }
    }

    /// Accept the first completion for the word under the cursor, or indent
    /// when there is none.
    pub fn tab(&mut self, handle: &EditorHandle) {
        let Some(buf) = self.buffer_mut(handle) else {
            return;
        };
        let start = word_start(&buf.text, buf.cursor);
        match buf.completer.complete(buf.current_word()).into_iter().next() {
            Some(completion) => {
                buf.text.replace_range(start..buf.cursor, &completion);
                buf.cursor = start + completion.len();
            }
            None => {
                buf.text.insert_str(buf.cursor, INDENT);
                buf.cursor += INDENT.len();
            }
        }
    }

    /// Completion candidates for the word under the cursor of `mount`.
    pub fn completions(&self, mount: &MountId) -> Vec<String> {
        self.buffer_for(mount)
            .map(|buf| buf.completer.complete(buf.current_word()))
            .unwrap_or_default()
    }

    /// Draw the buffer bound to `mount`.
    pub fn draw(&self, frame: &mut Frame, area: Rect, mount: &MountId, editing: bool, theme: &Theme) {
        let Some(buf) = self.buffer_for(mount) else {
            let placeholder = Paragraph::new("Editor unavailable")
                .style(Style::default().add_modifier(Modifier::DIM))
                .block(Block::default().borders(Borders::ALL).title(format!(" {} ", mount)));
            frame.render_widget(placeholder, area);
            return;
        };

        let border = if editing { theme.highlight } else { theme.border };
        let block = Block::default()
            .title(format!(" {} ({}) ", mount, buf.dialect.name()))
            .borders(Borders::ALL)
            .border_type(theme.border_type)
            .border_style(Style::default().fg(border));

        let lines: Vec<Line> = buf.text.split('\n').map(|line| highlight(line, &buf.completer, theme)).collect();
        frame.render_widget(Paragraph::new(lines).block(block), area);

        if editing {
            let before = &buf.text[..buf.cursor];
            let row = before.matches('\n').count() as u16;
            let col = before.rsplit('\n').next().map(|l| l.chars().count()).unwrap_or(0) as u16;
            frame.set_cursor_position(Position::new(area.x + 1 + col, area.y + 1 + row));
        }
    }
}

/// Split a line into spans, styling SQL keywords.
fn highlight<'a>(line: &'a str, completer: &Completer, theme: &Theme) -> Line<'a> {
    let mut spans = Vec::new();
    let mut start = 0;
    for (i, c) in line.char_indices().chain(std::iter::once((line.len(), ' '))) {
        if c.is_alphanumeric() || c == '_' {
            continue;
        }
        if start < i {
            let word = &line[start..i];
            if completer.is_keyword(word) {
                spans.push(Span::styled(word, theme.keyword));
            } else {
                spans.push(Span::raw(word));
            }
        }
        if i < line.len() {
            spans.push(Span::raw(&line[i..i + c.len_utf8()]));
        }
        start = i + c.len_utf8();
    }
    Line::from(spans)
}

impl EditorBackend for BufferEditor {
    type Handle = EditorHandle;

    fn create(&mut self, mount: &MountId, config: EditorConfig) -> Result<EditorHandle, RenderError> {
        if self.buffer_for(mount).is_some() {
            return Err(RenderError::SurfaceInUse(mount.clone()));
        }
        self.next_id += 1;
        let cursor = config.doc.len();
        self.buffers.insert(
            self.next_id,
            Buffer {
                mount: mount.clone(),
                text: config.doc,
                cursor,
                dialect: config.dialect,
                completer: Completer::new(config.dialect, config.schema),
            },
        );
        Ok(EditorHandle(self.next_id))
    }

    fn document(&self, handle: &EditorHandle) -> String {
        self.buffers.get(&handle.0).map(|b| b.text.clone()).unwrap_or_default()
    }

    fn destroy(&mut self, handle: EditorHandle) {
        self.buffers.remove(&handle.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::Schema;

    fn editor(doc: &str) -> (BufferEditor, EditorHandle) {
        let mut editor = BufferEditor::new();
        let config = EditorConfig {
            doc: doc.to_string(),
            dialect: Dialect::PostgreSql,
            schema: Schema::parse(r#"{"users": ["id", "email"]}"#).unwrap(),
        };
        let handle = editor.create(&"query-editor".into(), config).unwrap();
        (editor, handle)
    }

    #[test]
    fn test_typing_and_backspace() {
        let (mut ed, h) = editor("select");
        ed.insert_char(&h, ' ');
        ed.insert_char(&h, '1');
        assert_eq!(ed.document(&h), "select 1");

        ed.backspace(&h);
        ed.backspace(&h);
        assert_eq!(ed.document(&h), "select");
    }

    #[test]
    fn test_cursor_movement_inserts_in_place() {
        let (mut ed, h) = editor("ac");
        ed.cursor_left(&h);
        ed.insert_char(&h, 'b');
        assert_eq!(ed.document(&h), "abc");

        ed.cursor_right(&h);
        ed.cursor_right(&h);
        ed.newline(&h);
        assert_eq!(ed.document(&h), "abc\n");
    }

    #[test]
    fn test_tab_accepts_first_completion() {
        let (mut ed, h) = editor("sel");
        ed.tab(&h);
        assert_eq!(ed.document(&h), "SELECT");

        let (mut ed, h) = editor("select users.em");
        ed.tab(&h);
        assert_eq!(ed.document(&h), "select users.email");
    }

    #[test]
    fn test_tab_indents_without_completion() {
        let (mut ed, h) = editor("select ");
        ed.tab(&h);
        assert_eq!(ed.document(&h), "select   ");
    }

    #[test]
    fn test_tab_on_complete_word_indents() {
        let (mut ed, h) = editor("select");
        ed.tab(&h);
        assert_eq!(ed.document(&h), "select  ");

        let (mut ed, h) = editor("users");
        ed.tab(&h);
        assert_eq!(ed.document(&h), "users  ");
    }

    #[test]
    fn test_completions_for_mount() {
        let (ed, _h) = editor("us");
        assert_eq!(ed.completions(&"query-editor".into()), vec!["users"]);
        assert!(ed.completions(&"other".into()).is_empty());
    }

    #[test]
    fn test_one_buffer_per_mount() {
        let (mut ed, h) = editor("");
        let config = EditorConfig {
            doc: String::new(),
            dialect: Dialect::Standard,
            schema: Schema::default(),
        };
        assert!(ed.create(&"query-editor".into(), config.clone()).is_err());

        ed.destroy(h);
        assert_eq!(ed.live(), 0);
        assert!(ed.create(&"query-editor".into(), config).is_ok());
    }

    #[test]
    fn test_highlight_splits_keywords() {
        let completer = Completer::new(Dialect::Standard, Schema::default());
        let line = highlight("select id from t", &completer, &Theme::dark());
        let keywords: Vec<&str> = line
            .spans
            .iter()
            .filter(|s| s.style == Theme::dark().keyword)
            .map(|s| s.content.as_ref())
            .collect();
        assert_eq!(keywords, vec!["select", "from"]);
    }
}
