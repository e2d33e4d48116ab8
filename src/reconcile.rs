//! Intent reconciliation
//!
//! Applies a parsed intent to the todo collection. Items are matched by
//! case-insensitive exact text, first match wins, and a miss leaves the
//! collection untouched. The model's confirmation text is shown either way.


use crate::intent::Intent;
use crate::todo::{IdGenerator, TodoCollection};

/// Compute the collection that results from applying `intent` to `todos`.
///
/// Never fails. `ids` is only consulted for `Create`.
pub fn reconcile(
    intent: &Intent,
    todos: TodoCollection,
    ids: &mut dyn IdGenerator,
) -> TodoCollection {
    match intent {
        Intent::Create { item } => {
            let id = fresh_unique_id(&todos, ids);
            todos.with_created(id, item.clone())
        }
        Intent::Read { .. } => todos,
        Intent::Update { old_item, new_item } => todos.with_renamed(old_item, new_item.clone()),
        Intent::Delete { item } => todos.without(item),
        Intent::Toggle { item } => todos.with_toggled(item),
    }
}

// Ids must never repeat within a collection, whatever the generator does
fn fresh_unique_id(todos: &TodoCollection, ids: &mut dyn IdGenerator) -> String {
    loop {
        let id = ids.fresh_id();
        if !todos.contains_id(&id) {
            return id;
        }
        tracing::warn!(id = %id, "Generated todo id already in use, drawing another");
    }
}
