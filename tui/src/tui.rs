//! Terminal setup and teardown for the inline question input.
//!
//! The widget draws into an inline viewport at the bottom of the shell rather than an alternate
//! screen, so whatever the user ran before stays visible above it.

use std::io::Result;
use std::io::Stdout;
use std::io::stdout;

use crossterm::event::DisableBracketedPaste;
use crossterm::event::DisableMouseCapture;
use crossterm::event::EnableBracketedPaste;
use crossterm::event::EnableMouseCapture;
use crossterm::event::Event;
use crossterm::event::EventStream;
use crossterm::event::KeyEvent;
use crossterm::event::KeyboardEnhancementFlags;
use crossterm::event::MouseEvent;
use crossterm::event::PopKeyboardEnhancementFlags;
use crossterm::event::PushKeyboardEnhancementFlags;
use ratatui::TerminalOptions;
use ratatui::Viewport;
use ratatui::backend::Backend;
use ratatui::backend::CrosstermBackend;
use ratatui::crossterm::execute;
use ratatui::crossterm::terminal::disable_raw_mode;
use ratatui::crossterm::terminal::enable_raw_mode;
use tokio_stream::Stream;
use tokio_stream::StreamExt;

pub type Terminal = ratatui::Terminal<CrosstermBackend<Stdout>>;

/// Terminal input the UI loop cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TuiEvent {
    Key(KeyEvent),
    Paste(String),
    Mouse(MouseEvent),
    Resize,
}

impl TuiEvent {
    fn from_crossterm(event: Event) -> Option<Self> {
        match event {
            Event::Key(key) => Some(TuiEvent::Key(key)),
            Event::Paste(pasted) => Some(TuiEvent::Paste(pasted)),
            Event::Mouse(mouse) => Some(TuiEvent::Mouse(mouse)),
            Event::Resize(..) => Some(TuiEvent::Resize),
            Event::FocusGained | Event::FocusLost => None,
        }
    }
}

/// Enter raw mode and create an inline viewport `height` rows tall.
pub fn init(height: u16) -> Result<Terminal> {
    set_modes()?;
    set_panic_hook();

    let backend = CrosstermBackend::new(stdout());
    ratatui::Terminal::with_options(
        backend,
        TerminalOptions {
            viewport: Viewport::Inline(height),
        },
    )
}

fn set_modes() -> Result<()> {
    execute!(stdout(), EnableBracketedPaste)?;
    enable_raw_mode()?;
    // Shift+Enter is only distinguishable from Enter with these flags. Terminals that do not
    // support them (legacy Windows consoles) fall back to Ctrl+J for newlines.
    let _ = execute!(
        stdout(),
        PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
                | KeyboardEnhancementFlags::REPORT_ALTERNATE_KEYS
        )
    );
    execute!(stdout(), EnableMouseCapture)?;
    Ok(())
}

fn set_panic_hook() {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore(); // ignore any errors as we are already failing
        hook(panic_info);
    }));
}

/// Restore the terminal to its original state.
pub fn restore() -> Result<()> {
    // Pop may fail on platforms that didn't support the push; ignore errors.
    let _ = execute!(stdout(), PopKeyboardEnhancementFlags);
    execute!(stdout(), DisableMouseCapture)?;
    execute!(stdout(), DisableBracketedPaste)?;
    disable_raw_mode()?;
    Ok(())
}

/// Terminal events, with read errors propagated and unneeded events filtered out.
pub fn event_stream() -> impl Stream<Item = Result<TuiEvent>> {
    EventStream::new().filter_map(|event| match event {
        Ok(event) => TuiEvent::from_crossterm(event).map(Ok),
        Err(err) => Some(Err(err)),
    })
}

/// Clears the current inline viewport so the shell prompt is clean after the widget exits.
pub fn clear_inline_viewport_for_exit<B>(terminal: &mut ratatui::Terminal<B>) -> Result<()>
where
    B: Backend,
{
    terminal.clear()?;
    terminal.backend_mut().flush()
}
