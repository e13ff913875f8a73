use question_input_protocol::SubmissionPayload;

/// Whether the send action is currently permitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendState {
    Idle,
    Blocked,
}

impl SendState {
    pub fn is_allowed(self) -> bool {
        self == SendState::Idle
    }
}

/// The gating predicate. Evaluated on demand (every render and every send attempt), never cached.
pub fn send_state(disabled: bool, question: &str) -> SendState {
    if disabled || question.trim().is_empty() {
        SendState::Blocked
    } else {
        SendState::Idle
    }
}

/// Receives finished submissions. Called exactly once per successful send.
pub trait SendHandler {
    fn on_send(&mut self, payload: SubmissionPayload);
}

impl<F> SendHandler for F
where
    F: FnMut(SubmissionPayload),
{
    fn on_send(&mut self, payload: SubmissionPayload) {
        self(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn whitespace_only_question_is_blocked() {
        for question in ["", " ", "\n", "\t  \r\n", "\u{3000}"] {
            assert_eq!(send_state(false, question), SendState::Blocked, "{question:?}");
        }
    }

    #[test]
    fn any_visible_text_allows_send() {
        for question in ["a", "  why?  ", "\nline\n", "你好"] {
            assert_eq!(send_state(false, question), SendState::Idle, "{question:?}");
        }
    }

    #[test]
    fn disabled_always_blocks() {
        for question in ["", "hello", "  ok  "] {
            assert_eq!(send_state(true, question), SendState::Blocked);
            assert!(!send_state(true, question).is_allowed());
        }
    }
}
