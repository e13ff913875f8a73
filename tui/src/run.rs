//! Interactive entry point: drive a [`QuestionInput`] from terminal events until the user exits.

use std::path::PathBuf;

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use ratatui::layout::Rect;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::unbounded_channel;
use tokio_stream::StreamExt;

use crate::app_event::AppEvent;
use crate::app_event_sender::AppEventSender;
use crate::exit::AppExitInfo;
use crate::exit::ExitReason;
use crate::question_input::FileSelection;
use crate::question_input::InputResult;
use crate::question_input::QuestionInput;
use crate::question_input::QuestionInputProps;
use crate::question_input::SendHandler;
use crate::render::renderable::Renderable;
use crate::tui;
use crate::tui::TuiEvent;

/// Tall enough for both fields at their maximum height plus the chrome rows.
const VIEWPORT_HEIGHT: u16 = 16;

/// Show the question input inline and feed every submission to `handler`.
///
/// `initial_files` are attached exactly as if they had been picked before the first keystroke.
pub async fn run_question_input(
    props: QuestionInputProps,
    handler: Box<dyn SendHandler>,
    initial_files: Vec<PathBuf>,
) -> anyhow::Result<AppExitInfo> {
    let (app_event_tx, mut app_event_rx) = unbounded_channel();
    let mut input = QuestionInput::new(props, handler, AppEventSender::new(app_event_tx));
    input.handle_file_selection(FileSelection::new(initial_files));

    let mut terminal = tui::init(VIEWPORT_HEIGHT)?;
    let result = run_loop(&mut terminal, &mut input, &mut app_event_rx).await;

    // Best-effort: clear the inline UI so the user's shell prompt is clean.
    let _ = tui::clear_inline_viewport_for_exit(&mut terminal);
    // Always attempt to restore the terminal, even if the loop failed.
    let _ = tui::restore();

    if let Ok(info) = &result {
        tracing::info!(
            "question input exited: {:?} after {} submission(s)",
            info.exit_reason,
            info.submissions
        );
    }
    result
}

async fn run_loop(
    terminal: &mut tui::Terminal,
    input: &mut QuestionInput,
    app_event_rx: &mut UnboundedReceiver<AppEvent>,
) -> anyhow::Result<AppExitInfo> {
    let events = tui::event_stream();
    tokio::pin!(events);

    let mut submissions = 0;
    let mut force_redraw = true;
    loop {
        if input.take_dirty() || std::mem::take(&mut force_redraw) {
            draw(terminal, input)?;
        }

        tokio::select! {
            event = events.next() => {
                let event = match event {
                    Some(event) => event?,
                    None => {
                        return Ok(AppExitInfo {
                            submissions,
                            exit_reason: ExitReason::InputClosed,
                        });
                    }
                };
                match event {
                    TuiEvent::Key(key_event) => {
                        if is_exit_key(key_event, input.question().is_empty()) {
                            return Ok(AppExitInfo {
                                submissions,
                                exit_reason: ExitReason::UserRequested,
                            });
                        }
                        if input.handle_key_event(key_event) == InputResult::Submitted {
                            submissions += 1;
                        }
                    }
                    TuiEvent::Paste(pasted) => {
                        // Many terminals send CR for newlines inside bracketed pastes.
                        input.handle_paste(pasted.replace("\r\n", "\n").replace('\r', "\n"));
                    }
                    TuiEvent::Mouse(mouse_event) => {
                        if input.handle_mouse_event(mouse_event) == InputResult::Submitted {
                            submissions += 1;
                        }
                    }
                    TuiEvent::Resize => {
                        terminal.autoresize()?;
                        force_redraw = true;
                    }
                }
            }
            Some(app_event) = app_event_rx.recv() => input.on_app_event(&app_event),
        }
    }
}

fn draw(terminal: &mut tui::Terminal, input: &QuestionInput) -> std::io::Result<()> {
    terminal.draw(|frame| {
        let viewport = frame.area();
        let area = Rect {
            height: input.desired_height(viewport.width).min(viewport.height),
            ..viewport
        };
        input.render(area, frame.buffer_mut());
        if let Some((x, y)) = input.cursor_pos(area) {
            frame.set_cursor_position((x, y));
        }
    })?;
    Ok(())
}

/// Ctrl+C always exits; Ctrl+D exits only when there is no question to lose.
fn is_exit_key(key_event: KeyEvent, question_is_empty: bool) -> bool {
    if key_event.kind == KeyEventKind::Release
        || !key_event.modifiers.contains(KeyModifiers::CONTROL)
    {
        return false;
    }
    match key_event.code {
        KeyCode::Char('c') => true,
        KeyCode::Char('d') => question_is_empty,
        _ => false,
    }
}
