//! System prompt for intent extraction

use crate::todo::TodoCollection;

const REPLY_SHAPES: &str = r#"Respond with JSON in the following formats based on the user's intent:

1. For creating a new todo:
   { "action": "create", "item": "item text", "response": "Confirmation message" }

2. For reading/checking if an item exists:
   { "action": "read", "item": "item text", "response": "Yes/No response with details" }

3. For updating an existing todo:
   { "action": "update", "oldItem": "original text", "newItem": "new text", "response": "Confirmation message" }

4. For deleting a todo:
   { "action": "delete", "item": "item text", "response": "Confirmation message" }

5. For toggling completion status:
   { "action": "toggle", "item": "item text", "response": "Confirmation message" }

Analyze the user's message carefully to determine their intent. If they're asking if something is on the list,
use the "read" action. If they want to mark something as done/completed, use the "toggle" action.

Always respond with valid JSON that matches one of these formats."#;

/// Build the system prompt, embedding the current list as JSON
pub fn build_system_prompt(todos: &TodoCollection) -> String {
    let todos_json = serde_json::to_string(todos).unwrap_or_else(|_| "[]".to_string());
    format!(
        "You are a helpful assistant managing a todo list. Current todos: {todos_json}.\n\n{REPLY_SHAPES}"
    )
}
