// Forbid accidental stdout/stderr writes in the library portion of the TUI.
#![deny(clippy::print_stdout, clippy::print_stderr)]

mod exit;

mod app_event;
mod app_event_sender;
mod clipboard_paste;
mod key_hint;
mod question_input;
mod render;
mod run;
mod tui;

pub use app_event::AppEvent;
pub use app_event_sender::AppEventSender;
pub use clipboard_paste::PasteImageError;
pub use clipboard_paste::is_image_path;
pub use clipboard_paste::pasted_image_paths;
pub use exit::AppExitInfo;
pub use exit::ExitReason;
pub use question_input::AttachmentList;
pub use question_input::AttachmentPipeline;
pub use question_input::AttachmentSource;
pub use question_input::ClipboardData;
pub use question_input::ClipboardEvent;
pub use question_input::ClipboardItem;
pub use question_input::DecodeError;
pub use question_input::FileSelection;
pub use question_input::Focus;
pub use question_input::InputResult;
pub use question_input::KeyInput;
pub use question_input::QuestionInput;
pub use question_input::QuestionInputProps;
pub use question_input::SendHandler;
pub use question_input::SendState;
pub use question_input::TextField;
pub use question_input::decode_to_data_url;
pub use question_input::send_state;
pub use render::renderable::Renderable;
pub use run::run_question_input;
