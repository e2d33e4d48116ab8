//! Plain-text rendering of the list and the chat

use crate::runtime::SessionSnapshot;
use crate::todo::{TodoCollection, TodoItem};
use crate::transcript::Transcript;
use std::fmt::Write;

pub const EMPTY_TODOS_PLACEHOLDER: &str = "No todos yet. Start chatting to add some!";
pub const EMPTY_CHAT_PLACEHOLDER: &str = "Start chatting to manage your todo list!";

/// `[x] ~~text~~` when completed, `[ ] text` otherwise
pub fn render_item(item: &TodoItem) -> String {
    if item.completed {
        format!("[x] ~~{}~~", item.text)
    } else {
        format!("[ ] {}", item.text)
    }
}

pub fn render_todos(todos: &TodoCollection) -> String {
    if todos.is_empty() {
        return EMPTY_TODOS_PLACEHOLDER.to_string();
    }
    todos.iter().map(render_item).collect::<Vec<_>>().join("\n")
}

pub fn render_transcript(transcript: &Transcript) -> String {
    if transcript.is_empty() {
        return EMPTY_CHAT_PLACEHOLDER.to_string();
    }
    transcript.rendered().join("\n")
}

/// Both panes, list first
pub fn render_session(snapshot: &SessionSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Todos\n-----\n{}\n", render_todos(&snapshot.todos));
    let _ = write!(out, "Chat\n----\n{}", render_transcript(&snapshot.chat_history));
    if snapshot.busy {
        out.push_str("\n(thinking...)");
    }
    out.push('\n');
    out
}
