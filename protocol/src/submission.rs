use serde::Deserialize;
use serde::Serialize;

use crate::ConversationId;
use crate::DataUrl;

/// Everything the input widget hands to the host when the user sends a question.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SubmissionPayload {
    /// Question text exactly as typed (not trimmed).
    pub question: String,
    /// Present only when the host supplied a conversation identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<ConversationId>,
    /// Per-turn system instruction; empty when the user left the field blank.
    #[serde(default)]
    pub system_message: String,
    /// Snapshot of the decoded attachments at the moment of send, in completion order.
    #[serde(default)]
    pub attachments: Vec<DataUrl>,
}
