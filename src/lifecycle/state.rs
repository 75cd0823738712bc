use strum_macros::Display;

/// Phase of an engine run. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
pub enum State {
    Configured,
    Loading,
    Injecting,
    Initializing,
    Starting,
    Running,
    ShuttingDown,
    Stopped,
    /// Startup aborted. Terminal, like `Stopped`.
    Failed,
}

impl State {
    pub fn is_terminal(self) -> bool {
        matches!(self, State::Stopped | State::Failed)
    }
}
