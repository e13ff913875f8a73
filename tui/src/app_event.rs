//! Application-level events delivered to the UI loop from background work.

use crate::question_input::DecodeError;

#[derive(Debug)]
pub enum AppEvent {
    /// A background decode appended its data URL to the attachment list.
    ///
    /// `label` names the source (file name or clipboard item) for status messages.
    AttachmentDecoded { label: String },

    /// A background decode failed; the attachment never reaches the list.
    AttachmentFailed { label: String, error: DecodeError },
}
