//! Rows rendered under the input fields: attachment status and the send/hint footer.
//!
//! Pure rendering. The owning [`super::QuestionInput`] computes the props (including the current
//! [`SendState`]) on every frame; nothing here caches state.

use crossterm::event::KeyCode;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::WidgetRef;

use super::submission::SendState;
use crate::key_hint;

const SEND_LABEL: &str = "➤ Send";

#[derive(Clone, Copy, Debug)]
pub(crate) struct FooterProps {
    pub send_state: SendState,
    pub send_focused: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct AttachmentStatus<'a> {
    pub attached: usize,
    pub pending: usize,
    pub last_error: Option<&'a str>,
}

impl AttachmentStatus<'_> {
    pub fn is_visible(&self) -> bool {
        self.attached > 0 || self.pending > 0 || self.last_error.is_some()
    }
}

/// Renders key hints on the left and the send affordance on the right. Returns the area occupied
/// by the affordance so clicks can be hit-tested against it.
pub(crate) fn render_footer(area: Rect, buf: &mut Buffer, props: FooterProps) -> Rect {
    let button = send_affordance(props);
    let button_width = u16::try_from(button.width())
        .unwrap_or(u16::MAX)
        .min(area.width);
    let button_area = Rect {
        x: area.right().saturating_sub(button_width),
        width: button_width,
        ..area
    };
    let hints_area = Rect {
        width: area.width.saturating_sub(button_width + 1),
        ..area
    };

    hint_line().render_ref(hints_area, buf);
    Line::from(button).render_ref(button_area, buf);
    button_area
}

fn send_affordance(props: FooterProps) -> Span<'static> {
    let span = match props.send_state {
        SendState::Idle => Span::from(SEND_LABEL).cyan().bold(),
        SendState::Blocked => Span::from(SEND_LABEL).dim(),
    };
    if props.send_focused {
        span.reversed()
    } else {
        span
    }
}

fn hint_line() -> Line<'static> {
    Line::from(vec![
        key_hint::plain(KeyCode::Enter).into(),
        " send  ".dim(),
        key_hint::shift(KeyCode::Enter).into(),
        " newline  ".dim(),
        key_hint::plain(KeyCode::Tab).into(),
        " next field  ".dim(),
        key_hint::ctrl(KeyCode::Char('v')).into(),
        " paste image".dim(),
    ])
}

pub(crate) fn attachment_status_line(status: &AttachmentStatus<'_>) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    if status.attached > 0 {
        let noun = if status.attached == 1 { "image" } else { "images" };
        spans.push(format!("{} {noun} attached", status.attached).into());
    }
    if status.pending > 0 {
        if !spans.is_empty() {
            spans.push(" · ".dim());
        }
        spans.push(Span::from(format!("decoding {}…", status.pending)).dim());
    }
    if let Some(error) = status.last_error {
        if !spans.is_empty() {
            spans.push(" · ".dim());
        }
        spans.push(Span::from(error.to_string()).red());
    }
    Line::from(spans)
}
