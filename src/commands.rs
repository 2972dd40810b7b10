use std::fmt;
use std::str::FromStr;

/// Named keyboard commands the host forwards by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Forget consumed ids so every bookmark is eligible again.
    ShuffleSelection,
    OpenSettings,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::ShuffleSelection => "shuffle-selection",
            Command::OpenSettings => "open-settings",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown command `{0}`")]
pub struct UnknownCommand(pub String);

impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shuffle-selection" => Ok(Command::ShuffleSelection),
            "open-settings" => Ok(Command::OpenSettings),
            other => Err(UnknownCommand(other.to_string())),
        }
    }
}

/// Everything the event loop reacts to besides alarms and setting changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Toolbar button or equivalent single action.
    Activate,
    Command(Command),
}

impl From<Command> for Trigger {
    fn from(command: Command) -> Self {
        Trigger::Command(command)
    }
}
