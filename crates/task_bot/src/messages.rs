//! Reply texts sent back to the chat.

use tasks_client::{Task, TaskList};

use crate::command::Command;

pub const NO_ACTIVE_LIST: &str = "Set an active task list first using /setlist.";
pub const SET_LIST_USAGE: &str = "Please provide a task list ID after the command.";
pub const NEW_TASK_USAGE: &str = "Please provide a task title after the command.";
pub const DELETE_TASK_USAGE: &str = "Usage: /deletetask <task ID>";
pub const CREATE_TASK_LIST_USAGE: &str = "Specify a name for the new task list after the command.";
pub const DELETE_TASK_LIST_USAGE: &str = "Specify the task list ID to delete after the command.";
pub const NO_TASKS: &str = "This task list has no tasks.";
pub const NO_TASK_LISTS: &str = "No task lists available.";
pub const TASK_DELETED: &str = "Task deleted.";
pub const GENERIC_ERROR: &str = "An error occurred, please try again.";

pub fn help() -> String {
    let mut text = String::from(
        "Hi! I manage your Google Tasks. Here is what I can do:\n",
    );
    for command in Command::ALL.into_iter().filter(|c| *c != Command::Start) {
        match command.usage() {
            Some(usage) => text.push_str(&format!(
                "/{} {} - {}\n",
                command.name(),
                usage,
                command.description()
            )),
            None => text.push_str(&format!(
                "/{} - {}\n",
                command.name(),
                command.description()
            )),
        }
    }
    text.push_str("Start by choosing an active task list with /setlist!");
    text
}

pub fn active_list_set(list_id: &str) -> String {
    format!("Active task list set: {list_id}")
}

pub fn task_created(title: &str, list_id: &str) -> String {
    format!("Task \"{title}\" created in list with ID {list_id}.")
}

pub fn task_list_created(list: &TaskList) -> String {
    format!("Task list '{}' created with ID {}.", list.title, list.id)
}

pub fn task_list_deleted(list_id: &str) -> String {
    format!("Task list with ID {list_id} deleted.")
}

fn item_line(title: &str, id: &str) -> String {
    format!("{title} (ID: {id})")
}

pub fn tasks_in_list(list_id: &str, tasks: &[Task]) -> String {
    let body = if tasks.is_empty() {
        NO_TASKS.to_string()
    } else {
        tasks
            .iter()
            .map(|task| item_line(&task.title, &task.id))
            .collect::<Vec<_>>()
            .join("\n")
    };
    format!("Tasks in list {list_id}:\n{body}")
}

pub fn available_task_lists(lists: &[TaskList]) -> String {
    let body = if lists.is_empty() {
        NO_TASK_LISTS.to_string()
    } else {
        lists
            .iter()
            .map(|list| item_line(&list.title, &list.id))
            .collect::<Vec<_>>()
            .join("\n")
    };
    format!("Available task lists:\n{body}")
}
