//! Types exchanged between the question input widget and its host.

mod conversation_id;
mod data_url;
mod submission;

pub use conversation_id::ConversationId;
pub use data_url::DataUrl;
pub use data_url::DataUrlError;
pub use submission::SubmissionPayload;
