//! Bot commands and their argument parsing.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Start,
    SetList,
    NewTask,
    ListTasks,
    DeleteTask,
    CreateTaskList,
    ListTaskLists,
    DeleteTaskList,
}

impl Command {
    pub const ALL: [Command; 8] = [
        Command::Start,
        Command::SetList,
        Command::NewTask,
        Command::ListTasks,
        Command::DeleteTask,
        Command::CreateTaskList,
        Command::ListTaskLists,
        Command::DeleteTaskList,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::SetList => "setlist",
            Command::NewTask => "newtask",
            Command::ListTasks => "listtasks",
            Command::DeleteTask => "deletetask",
            Command::CreateTaskList => "createtasklist",
            Command::ListTaskLists => "listtasklists",
            Command::DeleteTaskList => "deletetasklist",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|command| command.name().eq_ignore_ascii_case(name))
    }

    /// Task-level commands operate on the user's active list.
    pub fn requires_active_list(&self) -> bool {
        matches!(
            self,
            Command::NewTask | Command::ListTasks | Command::DeleteTask
        )
    }

    /// Argument placeholder shown in help, if the command takes one
    pub fn usage(&self) -> Option<&'static str> {
        match self {
            Command::SetList => Some("<list ID>"),
            Command::NewTask => Some("<task title>"),
            Command::DeleteTask => Some("<task ID>"),
            Command::CreateTaskList => Some("<list name>"),
            Command::DeleteTaskList => Some("<list ID>"),
            Command::Start | Command::ListTasks | Command::ListTaskLists => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Command::Start => "Show this help.",
            Command::SetList => "Set the active task list.",
            Command::NewTask => "Create a new task in the active list.",
            Command::ListTasks => "Show all tasks in the active list.",
            Command::DeleteTask => "Delete a task from the active list.",
            Command::CreateTaskList => "Create a new task list.",
            Command::ListTaskLists => "Show all task lists.",
            Command::DeleteTaskList => "Delete a task list.",
        }
    }
}

/// A recognized command with its whitespace-split arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: Command,
    pub args: Vec<String>,
}

impl ParsedCommand {
    pub fn new(command: Command, args: &str) -> Self {
        ParsedCommand {
            command,
            args: args.split_whitespace().map(str::to_string).collect(),
        }
    }

    /// Parse `/name[@bot] args...`.
    ///
    /// Returns `None` for plain text, unknown commands, and commands
    /// addressed to a different bot.
    pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Self> {
        let text = text.trim_start();
        let rest = text.strip_prefix('/')?;
        let (head, args) = match rest.find(char::is_whitespace) {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, ""),
        };

        let name = match head.split_once('@') {
            Some((name, addressee)) => {
                if let Some(username) = bot_username {
                    if !addressee.eq_ignore_ascii_case(username) {
                        return None;
                    }
                }
                name
            }
            None => head,
        };

        let command = Command::from_name(name)?;
        Some(Self::new(command, args))
    }

    /// Free-text argument: all tokens re-joined with single spaces
    pub fn remainder(&self) -> String {
        self.args.join(" ")
    }

    /// Single-identifier argument: the first token only
    pub fn first_arg(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }
}
