//! The question input is the text-plus-attachments composer handed to a chat host.
//!
//! It is responsible for:
//!
//! - Capturing the question and the per-turn system message in two [`TextField`]s.
//! - Turning clipboard pastes and file selections into image attachments (see [`attachments`]).
//! - Deciding when a send is allowed and handing the finished [`SubmissionPayload`] to the host's
//!   [`SendHandler`].
//!
//! # Submission
//!
//! A send is triggered by <kbd>Enter</kbd> in either text field, by <kbd>Enter</kbd> or
//! <kbd>Space</kbd> on the focused send button, or by clicking the button. The gating predicate
//! ([`send_state`]) is evaluated at that moment; a blocked send is a no-op, but the Enter key is
//! still consumed so it never turns into a newline.
//!
//! The payload snapshots whatever attachments have finished decoding. Decodes still in flight
//! are not awaited. With clear-on-send enabled those in-flight decodes are cancelled together
//! with the reset, so they cannot leak into the next question either.
//!
//! # Newlines and composition
//!
//! <kbd>Shift</kbd>+<kbd>Enter</kbd> (or <kbd>Ctrl</kbd>+<kbd>J</kbd> on terminals that cannot
//! report Shift+Enter) inserts a newline. While an input method is composing a character, Enter
//! belongs to the input method and is ignored here.

mod attachments;
mod footer;
mod intake;
mod submission;
mod text_field;

pub use attachments::AttachmentList;
pub use attachments::AttachmentPipeline;
pub use attachments::AttachmentSource;
pub use attachments::DecodeError;
pub use attachments::decode_to_data_url;
pub use intake::ClipboardData;
pub use intake::ClipboardEvent;
pub use intake::ClipboardItem;
pub use intake::FileSelection;
pub use submission::SendHandler;
pub use submission::SendState;
pub use submission::send_state;
pub use text_field::TextField;

use std::cell::Cell;

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use crossterm::event::MouseButton;
use crossterm::event::MouseEvent;
use crossterm::event::MouseEventKind;
use question_input_protocol::ConversationId;
use question_input_protocol::DataUrl;
use question_input_protocol::SubmissionPayload;
use ratatui::buffer::Buffer;
use ratatui::layout::Position;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::style::Stylize;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use ratatui::widgets::WidgetRef;

use self::footer::AttachmentStatus;
use self::footer::FooterProps;
use self::footer::attachment_status_line;
use self::footer::render_footer;
use crate::app_event::AppEvent;
use crate::app_event_sender::AppEventSender;
use crate::clipboard_paste::paste_image_as_png;
use crate::clipboard_paste::pasted_image_paths;
use crate::key_hint::has_ctrl_or_alt;
use crate::render::Insets;
use crate::render::RectExt;
use crate::render::renderable::Renderable;

/// Columns reserved on the left of each field for its prompt glyph.
const PREFIX_COLS: u16 = 2;
/// Fields grow with their content up to this many rows, then scroll.
const MAX_FIELD_ROWS: u16 = 6;
const SYSTEM_MESSAGE_PLACEHOLDER: &str = "Type a system message...";

/// Host-controlled inputs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestionInputProps {
    /// Forces the blocked state regardless of the question text.
    pub disabled: bool,
    /// Display-only hint shown in the empty question field.
    pub placeholder: Option<String>,
    /// Reset the question and attachments after every successful send.
    pub clear_on_send: bool,
    /// Forwarded verbatim with every submission.
    pub conversation_id: Option<ConversationId>,
}

/// Result returned when the user interacts with the widget.
#[derive(Debug, PartialEq, Eq)]
pub enum InputResult {
    /// A payload was handed to the [`SendHandler`].
    Submitted,
    None,
}

/// A key press together with the input-method composition flag.
///
/// crossterm never reports composition, so events coming straight from the terminal convert with
/// `is_composing = false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub event: KeyEvent,
    pub is_composing: bool,
}

impl KeyInput {
    pub fn composing(event: KeyEvent) -> Self {
        Self {
            event,
            is_composing: true,
        }
    }
}

impl From<KeyEvent> for KeyInput {
    fn from(event: KeyEvent) -> Self {
        Self {
            event,
            is_composing: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Question,
    SystemMessage,
    SendButton,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Question => Focus::SystemMessage,
            Focus::SystemMessage => Focus::SendButton,
            Focus::SendButton => Focus::Question,
        }
    }

    fn prev(self) -> Self {
        match self {
            Focus::Question => Focus::SendButton,
            Focus::SystemMessage => Focus::Question,
            Focus::SendButton => Focus::SystemMessage,
        }
    }
}

struct LayoutAreas {
    question: Rect,
    system_message: Rect,
    status: Option<Rect>,
    footer: Rect,
}

pub struct QuestionInput {
    props: QuestionInputProps,
    question: TextField,
    system_message: TextField,
    focus: Focus,
    attachments: AttachmentPipeline,
    last_attachment_error: Option<String>,
    handler: Box<dyn SendHandler>,
    /// Set by every state change; the UI loop redraws and clears it.
    dirty: bool,
    /// Where the send affordance was last drawn, for click hit-testing.
    send_button_area: Cell<Rect>,
}

impl QuestionInput {
    pub fn new(
        props: QuestionInputProps,
        handler: Box<dyn SendHandler>,
        app_event_tx: AppEventSender,
    ) -> Self {
        Self {
            props,
            question: TextField::new(),
            system_message: TextField::new(),
            focus: Focus::Question,
            attachments: AttachmentPipeline::new(app_event_tx),
            last_attachment_error: None,
            handler,
            dirty: true,
            send_button_area: Cell::new(Rect::default()),
        }
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.props.disabled = disabled;
        self.dirty = true;
    }

    pub fn set_conversation_id(&mut self, conversation_id: Option<ConversationId>) {
        self.props.conversation_id = conversation_id;
    }

    pub fn question(&self) -> &str {
        self.question.text()
    }

    pub fn system_message(&self) -> &str {
        self.system_message.text()
    }

    /// Replace the question text (change notification from the question field).
    pub fn set_question(&mut self, value: Option<String>) {
        self.question.set_text(value.unwrap_or_default());
        self.dirty = true;
    }

    /// Replace the system message text (change notification from the system message field).
    pub fn set_system_message(&mut self, value: Option<String>) {
        self.system_message.set_text(value.unwrap_or_default());
        self.dirty = true;
    }

    /// Decoded attachments, in completion order.
    pub fn attachments(&self) -> Vec<DataUrl> {
        self.attachments.list().snapshot()
    }

    pub fn pending_attachments(&self) -> usize {
        self.attachments.pending()
    }

    pub fn last_attachment_error(&self) -> Option<&str> {
        self.last_attachment_error.as_deref()
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn send_state(&self) -> SendState {
        send_state(self.props.disabled, self.question.text())
    }

    /// Returns whether anything changed since the last call.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Run the send action: gate, hand the payload to the host, then apply clear-on-send.
    pub fn send(&mut self) -> InputResult {
        if !self.send_state().is_allowed() {
            tracing::debug!("send blocked");
            return InputResult::None;
        }

        let payload = SubmissionPayload {
            question: self.question.text().to_string(),
            // An empty id counts as not supplied.
            conversation_id: self
                .props
                .conversation_id
                .clone()
                .filter(|id| !id.as_str().is_empty()),
            system_message: self.system_message.text().to_string(),
            attachments: self.attachments.list().snapshot(),
        };
        let in_flight = self.attachments.pending();
        if in_flight > 0 {
            tracing::info!("sending while {in_flight} attachment(s) are still decoding");
        }
        tracing::info!(
            "sending question ({} chars, {} attachment(s))",
            payload.question.chars().count(),
            payload.attachments.len()
        );
        self.handler.on_send(payload);

        if self.props.clear_on_send {
            // The system message deliberately persists across sends.
            self.question.clear();
            self.attachments.reset();
            self.last_attachment_error = None;
        }
        self.dirty = true;
        InputResult::Submitted
    }

    /// Handle a key event coming from the UI loop.
    pub fn handle_key_event(&mut self, input: impl Into<KeyInput>) -> InputResult {
        let KeyInput {
            event,
            is_composing,
        } = input.into();
        if event.kind == KeyEventKind::Release {
            return InputResult::None;
        }

        match event {
            KeyEvent {
                code: KeyCode::Enter,
                ..
            } if is_composing => InputResult::None,
            KeyEvent {
                code: KeyCode::Enter,
                modifiers,
                ..
            } if modifiers.contains(KeyModifiers::SHIFT) && self.focus != Focus::SendButton => {
                self.insert_newline();
                InputResult::None
            }
            KeyEvent {
                code: KeyCode::Char('j'),
                modifiers: KeyModifiers::CONTROL,
                ..
            } => {
                self.insert_newline();
                InputResult::None
            }
            KeyEvent {
                code: KeyCode::Enter,
                ..
            } => self.send(),
            KeyEvent {
                code: KeyCode::Char(' '),
                ..
            } if self.focus == Focus::SendButton => self.send(),
            KeyEvent {
                code: KeyCode::Tab,
                modifiers: KeyModifiers::NONE,
                ..
            } => {
                self.focus = self.focus.next();
                self.dirty = true;
                InputResult::None
            }
            KeyEvent {
                code: KeyCode::BackTab,
                ..
            } => {
                self.focus = self.focus.prev();
                self.dirty = true;
                InputResult::None
            }
            KeyEvent {
                code: KeyCode::Char(c),
                modifiers,
                ..
            } if has_ctrl_or_alt(modifiers) && c.eq_ignore_ascii_case(&'v') => {
                self.paste_image_from_clipboard();
                InputResult::None
            }
            other => {
                if let Some(field) = self.focused_field_mut()
                    && field.input(other)
                {
                    self.dirty = true;
                }
                InputResult::None
            }
        }
    }

    /// Handle a bracketed paste from the terminal.
    ///
    /// Pastes made only of image paths (files dropped onto the terminal) are file selections;
    /// anything else is a plain-text clipboard item.
    pub fn handle_paste(&mut self, pasted: String) {
        if let Some(files) = pasted_image_paths(&pasted) {
            tracing::debug!("paste recognized as {} image path(s)", files.len());
            self.handle_file_selection(FileSelection::new(files));
        } else {
            self.handle_paste_event(ClipboardEvent::new(vec![ClipboardItem::text(pasted)]));
        }
    }

    /// Paste intake: image items go to the decode pipeline, text goes into the focused field.
    pub fn handle_paste_event(&mut self, event: ClipboardEvent) {
        if let Some(text) = event.text()
            && let Some(field) = self.focused_field_mut()
        {
            field.insert_str(&text);
        }

        for item in event.items {
            if !item.is_image() {
                continue;
            }
            match item.into_attachment_source() {
                Some(source) => self.attachments.submit(source),
                None => tracing::debug!("image clipboard item carried no file"),
            }
        }
        self.dirty = true;
    }

    /// File-picker intake: every file is submitted, in the order given.
    pub fn handle_file_selection(&mut self, selection: FileSelection) {
        if selection.files.is_empty() {
            return;
        }
        for path in selection.files {
            self.attachments.submit(AttachmentSource::File(path));
        }
        self.dirty = true;
    }

    /// Cancel in-flight decodes and drop every attachment.
    pub fn clear_attachments(&mut self) {
        self.attachments.reset();
        self.last_attachment_error = None;
        self.dirty = true;
    }

    pub fn handle_mouse_event(&mut self, event: MouseEvent) -> InputResult {
        if event.kind != MouseEventKind::Down(MouseButton::Left) {
            return InputResult::None;
        }
        let position = Position::new(event.column, event.row);
        if self.send_button_area.get().contains(position) {
            self.focus = Focus::SendButton;
            self.send()
        } else {
            InputResult::None
        }
    }

    /// Apply a background event (decode completion or failure).
    pub fn on_app_event(&mut self, event: &AppEvent) {
        match event {
            AppEvent::AttachmentDecoded { .. } => {
                self.last_attachment_error = None;
            }
            AppEvent::AttachmentFailed { error, .. } => {
                self.last_attachment_error = Some(error.to_string());
            }
        }
        self.dirty = true;
    }

    fn paste_image_from_clipboard(&mut self) {
        match paste_image_as_png() {
            Ok((png, info)) => {
                tracing::debug!("pasted image size={}x{}", info.width, info.height);
                self.handle_paste_event(ClipboardEvent::new(vec![ClipboardItem::image_bytes(
                    "image/png",
                    png,
                )]));
            }
            Err(err) => {
                tracing::warn!("failed to paste image: {err}");
                self.last_attachment_error = Some(format!("Failed to paste image: {err}"));
                self.dirty = true;
            }
        }
    }

    fn insert_newline(&mut self) {
        if let Some(field) = self.focused_field_mut() {
            field.insert_str("\n");
            self.dirty = true;
        }
    }

    fn focused_field_mut(&mut self) -> Option<&mut TextField> {
        match self.focus {
            Focus::Question => Some(&mut self.question),
            Focus::SystemMessage => Some(&mut self.system_message),
            Focus::SendButton => None,
        }
    }

    fn attachment_status(&self) -> AttachmentStatus<'_> {
        AttachmentStatus {
            attached: self.attachments.list().len(),
            pending: self.attachments.pending(),
            last_error: self.last_attachment_error.as_deref(),
        }
    }

    fn field_rows(field: &TextField, width: u16) -> u16 {
        field
            .desired_height(width.saturating_sub(PREFIX_COLS))
            .clamp(1, MAX_FIELD_ROWS)
    }

    fn layout_areas(&self, area: Rect) -> LayoutAreas {
        // One row for the top rule.
        let inner = area.inset(Insets::tlbr(1, 0, 0, 0));
        let question_rows = Self::field_rows(&self.question, inner.width);
        let system_rows = Self::field_rows(&self.system_message, inner.width);
        let has_status = self.attachment_status().is_visible();

        let mut y = inner.y;
        let mut take = |rows: u16| {
            let rows = rows.min(inner.bottom().saturating_sub(y));
            let rect = Rect::new(inner.x, y, inner.width, rows);
            y += rows;
            rect
        };
        let question = take(question_rows);
        let system_message = take(system_rows);
        let status = has_status.then(|| take(1));
        let footer = take(1);

        LayoutAreas {
            question: question.inset(Insets::tlbr(0, PREFIX_COLS, 0, 0)),
            system_message: system_message.inset(Insets::tlbr(0, PREFIX_COLS, 0, 0)),
            status,
            footer,
        }
    }

    fn render_prompt(&self, field_area: Rect, glyph: &'static str, focused: bool, buf: &mut Buffer) {
        if field_area.height == 0 || field_area.x < PREFIX_COLS {
            return;
        }
        let span = if focused { glyph.bold() } else { glyph.dim() };
        buf.set_span(field_area.x - PREFIX_COLS, field_area.y, &span, PREFIX_COLS);
    }
}

impl Renderable for QuestionInput {
    fn render(&self, area: Rect, buf: &mut Buffer) {
        let areas = self.layout_areas(area);

        Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().dim())
            .render_ref(area, buf);

        self.render_prompt(areas.question, "›", self.focus == Focus::Question, buf);
        let placeholder_style = Style::default().dim();
        self.question.render(
            areas.question,
            buf,
            self.props
                .placeholder
                .as_deref()
                .map(|placeholder| (placeholder, placeholder_style)),
        );

        self.render_prompt(
            areas.system_message,
            "»",
            self.focus == Focus::SystemMessage,
            buf,
        );
        self.system_message.render(
            areas.system_message,
            buf,
            Some((SYSTEM_MESSAGE_PLACEHOLDER, placeholder_style)),
        );

        if let Some(status_area) = areas.status {
            attachment_status_line(&self.attachment_status())
                .render_ref(status_area.inset(Insets::tlbr(0, PREFIX_COLS, 0, 0)), buf);
        }

        let button = render_footer(
            areas.footer,
            buf,
            FooterProps {
                send_state: self.send_state(),
                send_focused: self.focus == Focus::SendButton,
            },
        );
        self.send_button_area.set(button);
    }

    fn desired_height(&self, width: u16) -> u16 {
        let status_rows = u16::from(self.attachment_status().is_visible());
        1 + Self::field_rows(&self.question, width)
            + Self::field_rows(&self.system_message, width)
            + status_rows
            + 1
    }

    fn cursor_pos(&self, area: Rect) -> Option<(u16, u16)> {
        let areas = self.layout_areas(area);
        match self.focus {
            Focus::Question => self.question.cursor_pos(areas.question),
            Focus::SystemMessage => self.system_message.cursor_pos(areas.system_message),
            Focus::SendButton => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageBuffer;
    use image::Rgba;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use std::cell::RefCell;
    use std::path::Path;
    use std::path::PathBuf;
    use std::rc::Rc;
    use tempfile::tempdir;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio::sync::mpsc::unbounded_channel;

    type Sent = Rc<RefCell<Vec<SubmissionPayload>>>;

    fn widget(props: QuestionInputProps) -> (QuestionInput, Sent, UnboundedReceiver<AppEvent>) {
        let (tx, rx) = unbounded_channel();
        let sent: Sent = Rc::default();
        let sink = Rc::clone(&sent);
        let handler = move |payload: SubmissionPayload| sink.borrow_mut().push(payload);
        let input = QuestionInput::new(props, Box::new(handler), AppEventSender::new(tx));
        (input, sent, rx)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(input: &mut QuestionInput, s: &str) {
        for c in s.chars() {
            input.handle_key_event(key(KeyCode::Char(c)));
        }
    }

    fn png_bytes() -> Vec<u8> {
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_fn(2, 2, |_x, _y| Rgba([0, 128, 255, 255]));
        let mut png = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .expect("encode png");
        png
    }

    fn write_png(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, png_bytes()).expect("write png");
        path
    }

    async fn wait_for_decodes(
        input: &mut QuestionInput,
        rx: &mut UnboundedReceiver<AppEvent>,
        count: usize,
    ) {
        for _ in 0..count {
            let event = rx.recv().await.expect("decode event");
            input.on_app_event(&event);
        }
    }

    #[test]
    fn enter_sends_payload_with_conversation_id() {
        let (mut input, sent, _rx) = widget(QuestionInputProps {
            conversation_id: Some(ConversationId::from("abc")),
            ..Default::default()
        });
        input.set_question(Some("what is rust?".to_string()));
        input.set_system_message(Some("answer briefly".to_string()));

        assert_eq!(input.handle_key_event(key(KeyCode::Enter)), InputResult::Submitted);

        assert_eq!(
            *sent.borrow(),
            vec![SubmissionPayload {
                question: "what is rust?".to_string(),
                conversation_id: Some(ConversationId::from("abc")),
                system_message: "answer briefly".to_string(),
                attachments: Vec::new(),
            }]
        );
    }

    #[test]
    fn send_without_conversation_id_passes_none() {
        let (mut input, sent, _rx) = widget(QuestionInputProps::default());
        type_str(&mut input, "hello");

        input.send();

        let sent = sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].conversation_id, None);
        assert_eq!(sent[0].question, "hello");
    }

    #[test]
    fn empty_conversation_id_is_sent_as_none() {
        let (mut input, sent, _rx) = widget(QuestionInputProps::default());
        input.set_conversation_id(Some(ConversationId::from("")));
        input.set_question(Some("hello".to_string()));

        input.send();
        input.set_conversation_id(Some(ConversationId::from("c1")));
        input.send();

        let sent = sent.borrow();
        assert_eq!(sent[0].conversation_id, None);
        assert_eq!(sent[1].conversation_id, Some(ConversationId::from("c1")));
    }

    #[test]
    fn blocked_send_never_calls_handler() {
        let (mut input, sent, _rx) = widget(QuestionInputProps::default());
        type_str(&mut input, "   ");
        assert_eq!(input.send_state(), SendState::Blocked);
        assert_eq!(input.handle_key_event(key(KeyCode::Enter)), InputResult::None);
        // Enter was consumed without inserting a newline.
        assert_eq!(input.question(), "   ");

        input.set_question(Some("real question".to_string()));
        input.set_disabled(true);
        assert_eq!(input.send(), InputResult::None);

        assert!(sent.borrow().is_empty());
    }

    #[test]
    fn clear_on_send_resets_question_but_keeps_system_message() {
        let (mut input, sent, _rx) = widget(QuestionInputProps {
            clear_on_send: true,
            ..Default::default()
        });
        input.set_question(Some("first".to_string()));
        input.set_system_message(Some("you are terse".to_string()));

        input.send();

        assert_eq!(input.question(), "");
        assert_eq!(input.system_message(), "you are terse");
        assert!(input.attachments().is_empty());
        assert_eq!(sent.borrow().len(), 1);
        // Nothing left to send until the user types again.
        assert_eq!(input.send_state(), SendState::Blocked);
    }

    #[test]
    fn without_clear_on_send_state_is_unchanged() {
        let (mut input, sent, _rx) = widget(QuestionInputProps::default());
        input.set_question(Some("again".to_string()));
        input.set_system_message(Some("sys".to_string()));

        input.send();
        input.send();

        assert_eq!(input.question(), "again");
        assert_eq!(input.system_message(), "sys");
        assert_eq!(sent.borrow().len(), 2);
    }

    #[test]
    fn shift_enter_inserts_newline_without_sending() {
        let (mut input, sent, _rx) = widget(QuestionInputProps::default());
        type_str(&mut input, "line one");

        let result =
            input.handle_key_event(KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT));
        type_str(&mut input, "line two");

        assert_eq!(result, InputResult::None);
        assert_eq!(input.question(), "line one\nline two");
        assert!(sent.borrow().is_empty());
    }

    #[test]
    fn enter_while_composing_does_not_send() {
        let (mut input, sent, _rx) = widget(QuestionInputProps::default());
        type_str(&mut input, "こんにちは");

        let result = input.handle_key_event(KeyInput::composing(key(KeyCode::Enter)));

        assert_eq!(result, InputResult::None);
        assert_eq!(input.question(), "こんにちは");
        assert!(sent.borrow().is_empty());
    }

    #[test]
    fn enter_in_system_message_field_sends() {
        let (mut input, sent, _rx) = widget(QuestionInputProps::default());
        type_str(&mut input, "question");
        input.handle_key_event(key(KeyCode::Tab));
        assert_eq!(input.focus(), Focus::SystemMessage);
        type_str(&mut input, "system");

        assert_eq!(input.handle_key_event(key(KeyCode::Enter)), InputResult::Submitted);
        assert_eq!(sent.borrow()[0].system_message, "system");
    }

    #[test]
    fn space_on_send_button_sends() {
        let (mut input, sent, _rx) = widget(QuestionInputProps::default());
        type_str(&mut input, "question");
        input.handle_key_event(KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT));
        assert_eq!(input.focus(), Focus::SendButton);

        assert_eq!(
            input.handle_key_event(key(KeyCode::Char(' '))),
            InputResult::Submitted
        );
        assert_eq!(sent.borrow().len(), 1);
        assert_eq!(input.question(), "question");
    }

    #[test]
    fn shift_enter_on_send_button_sends() {
        let (mut input, sent, _rx) = widget(QuestionInputProps::default());
        type_str(&mut input, "question");
        input.handle_key_event(KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT));
        assert_eq!(input.focus(), Focus::SendButton);

        assert_eq!(
            input.handle_key_event(KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT)),
            InputResult::Submitted
        );
        assert_eq!(sent.borrow().len(), 1);
        assert_eq!(input.question(), "question");
    }

    #[test]
    fn key_release_is_ignored() {
        let (mut input, sent, _rx) = widget(QuestionInputProps::default());
        input.set_question(Some("q".to_string()));
        let mut release = key(KeyCode::Enter);
        release.kind = KeyEventKind::Release;

        assert_eq!(input.handle_key_event(release), InputResult::None);
        assert!(sent.borrow().is_empty());
    }

    #[test]
    fn text_paste_goes_into_focused_field() {
        let (mut input, _sent, _rx) = widget(QuestionInputProps::default());
        input.handle_key_event(key(KeyCode::Tab));

        input.handle_paste("be precise".to_string());

        assert_eq!(input.question(), "");
        assert_eq!(input.system_message(), "be precise");
        assert_eq!(input.pending_attachments(), 0);
    }

    #[tokio::test]
    async fn picked_image_becomes_one_data_url() {
        let dir = tempdir().expect("tempdir");
        let path = write_png(dir.path(), "photo.png");
        let (mut input, _sent, mut rx) = widget(QuestionInputProps::default());

        input.handle_file_selection(FileSelection::new(vec![path]));
        wait_for_decodes(&mut input, &mut rx, 1).await;

        let attachments = input.attachments();
        assert_eq!(attachments.len(), 1);
        assert!(attachments[0].as_str().starts_with("data:image/"));
    }

    #[tokio::test]
    async fn pasting_two_images_and_text_attaches_two() {
        let (mut input, _sent, mut rx) = widget(QuestionInputProps::default());

        input.handle_paste_event(ClipboardEvent::new(vec![
            ClipboardItem::image_bytes("image/png", png_bytes()),
            ClipboardItem::text("caption"),
            ClipboardItem::image_bytes("image/gif", b"GIF89a".to_vec()),
        ]));
        wait_for_decodes(&mut input, &mut rx, 2).await;

        let mut mime_types: Vec<String> = input
            .attachments()
            .iter()
            .map(|url| url.mime_type().to_string())
            .collect();
        mime_types.sort();
        assert_eq!(mime_types, vec!["image/gif", "image/png"]);
        assert_eq!(input.question(), "caption");
    }

    #[tokio::test]
    async fn dropped_paths_are_treated_as_file_selection() {
        let dir = tempdir().expect("tempdir");
        let path = write_png(dir.path(), "drop.png");
        let (mut input, _sent, mut rx) = widget(QuestionInputProps::default());

        input.handle_paste(path.display().to_string());
        wait_for_decodes(&mut input, &mut rx, 1).await;

        assert_eq!(input.question(), "");
        assert_eq!(input.attachments().len(), 1);
    }

    #[tokio::test]
    async fn send_includes_decoded_attachments_and_clears_them() {
        let dir = tempdir().expect("tempdir");
        let path = write_png(dir.path(), "chart.png");
        let (mut input, sent, mut rx) = widget(QuestionInputProps {
            clear_on_send: true,
            ..Default::default()
        });
        input.handle_file_selection(FileSelection::new(vec![path]));
        wait_for_decodes(&mut input, &mut rx, 1).await;
        input.set_question(Some("explain this chart".to_string()));

        input.send();

        let sent = sent.borrow();
        assert_eq!(sent[0].attachments.len(), 1);
        assert_eq!(sent[0].attachments[0].mime_type(), "image/png");
        assert!(input.attachments().is_empty());
    }

    #[tokio::test]
    async fn send_with_pending_decode_cancels_it_when_clearing() {
        let dir = tempdir().expect("tempdir");
        let slow = write_png(dir.path(), "slow.png");
        let next = write_png(dir.path(), "next.png");
        let (mut input, sent, mut rx) = widget(QuestionInputProps {
            clear_on_send: true,
            ..Default::default()
        });
        input.set_question(Some("first".to_string()));

        // The decode task has not run yet on this single-threaded runtime.
        input.handle_file_selection(FileSelection::new(vec![slow]));
        assert_eq!(input.pending_attachments(), 1);
        input.send();
        assert!(sent.borrow()[0].attachments.is_empty());

        input.handle_file_selection(FileSelection::new(vec![next]));
        wait_for_decodes(&mut input, &mut rx, 1).await;
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }

        assert_eq!(input.attachments().len(), 1);
        assert!(rx.try_recv().is_err());
        assert_eq!(input.pending_attachments(), 0);
    }

    #[tokio::test]
    async fn send_with_pending_decode_keeps_it_without_clearing() {
        let dir = tempdir().expect("tempdir");
        let path = write_png(dir.path(), "late.png");
        let (mut input, sent, mut rx) = widget(QuestionInputProps::default());
        input.set_question(Some("first".to_string()));

        input.handle_file_selection(FileSelection::new(vec![path]));
        input.send();
        assert!(sent.borrow()[0].attachments.is_empty());

        wait_for_decodes(&mut input, &mut rx, 1).await;

        assert_eq!(input.attachments().len(), 1);
        input.send();
        assert_eq!(sent.borrow()[1].attachments.len(), 1);
    }

    #[tokio::test]
    async fn clear_attachments_drops_decoded_and_pending() {
        let dir = tempdir().expect("tempdir");
        let done = write_png(dir.path(), "done.png");
        let pending = write_png(dir.path(), "pending.png");
        let notes = dir.path().join("notes.txt");
        std::fs::write(&notes, "not an image").expect("write");
        let (mut input, _sent, mut rx) = widget(QuestionInputProps::default());
        input.handle_file_selection(FileSelection::new(vec![done]));
        wait_for_decodes(&mut input, &mut rx, 1).await;
        input.handle_file_selection(FileSelection::new(vec![notes]));
        wait_for_decodes(&mut input, &mut rx, 1).await;
        assert_eq!(input.attachments().len(), 1);
        assert!(input.last_attachment_error().is_some());

        input.handle_file_selection(FileSelection::new(vec![pending]));
        input.take_dirty();
        input.clear_attachments();
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }

        assert!(input.take_dirty());
        assert!(input.attachments().is_empty());
        assert_eq!(input.last_attachment_error(), None);
        assert!(rx.try_recv().is_err());
        assert_eq!(input.pending_attachments(), 0);
    }

    #[tokio::test]
    async fn failed_decode_is_surfaced() {
        let dir = tempdir().expect("tempdir");
        let notes = dir.path().join("notes.txt");
        std::fs::write(&notes, "not an image").expect("write");
        let (mut input, _sent, mut rx) = widget(QuestionInputProps::default());

        input.handle_file_selection(FileSelection::new(vec![notes]));
        wait_for_decodes(&mut input, &mut rx, 1).await;

        assert!(input.attachments().is_empty());
        assert_eq!(
            input.last_attachment_error(),
            Some("notes.txt is not an image (text/plain)")
        );
    }

    #[test]
    fn empty_file_selection_is_ignored() {
        let (mut input, _sent, _rx) = widget(QuestionInputProps::default());
        input.take_dirty();

        input.handle_file_selection(FileSelection::default());

        assert!(!input.take_dirty());
        assert_eq!(input.pending_attachments(), 0);
    }

    #[test]
    fn render_shows_placeholders_and_send_affordance() {
        let (input, _sent, _rx) = widget(QuestionInputProps {
            placeholder: Some("Ask anything".to_string()),
            ..Default::default()
        });
        let height = input.desired_height(40);
        assert_eq!(height, 4);
        let mut terminal = Terminal::new(TestBackend::new(40, height)).expect("terminal");

        terminal
            .draw(|f| input.render(f.area(), f.buffer_mut()))
            .expect("draw");

        assert_snapshot!(terminal.backend(), @r#"
        "────────────────────────────────────────"
        "› Ask anything                          "
        "» Type a system message...              "
        "enter send  shift + enter newline ➤ Send"
        "#);
        assert_eq!(input.cursor_pos(Rect::new(0, 0, 40, height)), Some((2, 1)));
    }

    #[test]
    fn click_on_send_affordance_sends() {
        let (mut input, sent, _rx) = widget(QuestionInputProps::default());
        input.set_question(Some("clicked".to_string()));
        let area = Rect::new(0, 10, 60, input.desired_height(60));
        let mut buf = Buffer::empty(area);
        input.render(area, &mut buf);

        let click = |column, row| MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        };
        assert_eq!(input.handle_mouse_event(click(1, 11)), InputResult::None);
        assert_eq!(input.handle_mouse_event(click(57, 13)), InputResult::Submitted);
        assert_eq!(sent.borrow().len(), 1);
    }
}
