/// Summary information produced when a question input session exits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppExitInfo {
    /// How many payloads were handed to the send handler.
    pub submissions: usize,
    /// Why the session ended.
    pub exit_reason: ExitReason,
}

/// Reason why the question input session terminated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    /// The user pressed Ctrl+C, or Ctrl+D on an empty question.
    UserRequested,
    /// The terminal stopped delivering input.
    InputClosed,
}
