use serde::{Deserialize, Serialize};

/// A task as returned by the Tasks API. Only the fields the bot shows are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskList {
    pub id: String,
    #[serde(default)]
    pub title: String,
}

/// Request body for inserting a task or a task list
#[derive(Debug, Clone, Serialize)]
pub(crate) struct NewItem<'a> {
    pub title: &'a str,
}

/// First page of `tasks.list`. `items` is omitted by the API when the list is empty.
#[derive(Debug, Deserialize)]
pub(crate) struct TasksPage {
    #[serde(default)]
    pub items: Vec<Task>,
}

/// First page of `tasklists.list`
#[derive(Debug, Deserialize)]
pub(crate) struct TaskListsPage {
    #[serde(default)]
    pub items: Vec<TaskList>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tasks_page_without_items_is_empty() {
        let page: TasksPage =
            serde_json::from_str(r#"{"kind":"tasks#tasks","etag":"\"x\""}"#).unwrap();
        assert!(page.items.is_empty());
    }

    #[test]
    fn task_ignores_unknown_fields() {
        let task: Task = serde_json::from_str(
            r#"{"kind":"tasks#task","id":"t1","title":"Buy milk","status":"needsAction","position":"000"}"#,
        )
        .unwrap();
        assert_eq!(
            task,
            Task {
                id: "t1".to_string(),
                title: "Buy milk".to_string()
            }
        );
    }

    #[test]
    fn new_item_serializes_title_only() {
        let body = serde_json::to_value(NewItem { title: "Groceries" }).unwrap();
        assert_eq!(body, serde_json::json!({ "title": "Groceries" }));
    }
}
