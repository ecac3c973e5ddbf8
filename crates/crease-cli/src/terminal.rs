//! Terminal rendering of the conversation
//!
//! Replies are printed as they grow. Finished lines are written once and
//! never touched again; on a TTY the unfinished last line is redrawn in
//! place, otherwise it is held back until the reply ends.

use parking_lot::Mutex;
use std::io::{self, IsTerminal, Write};

use crease_chat::{InputAffordance, MessageBody, MessageId, RenderSink, Role};
use crease_markup::to_plain_text;

/// Shown on a TTY while the assistant is composing
const COMPOSING: &str = "...";

/// Erase the current line and return to its start
const CLEAR_LINE: &str = "\r\x1b[K";

struct Screen<W> {
    out: W,
    reply: Option<MessageId>,
    /// Latest plain text of the reply
    text: String,
    /// Bytes of `text` already written as complete lines
    committed: usize,
    /// Unfinished line currently on screen (TTY only)
    shown: String,
}

impl<W: Write> Screen<W> {
    fn clear_shown(&mut self) {
        if !self.shown.is_empty() {
            write!(self.out, "{}", CLEAR_LINE).ok();
            self.shown.clear();
        }
    }

    fn start(&mut self, id: MessageId) {
        self.reply = Some(id);
        self.text.clear();
        self.committed = 0;
        self.shown.clear();
    }

    fn show_partial(&mut self, rest: &str) {
        if rest == self.shown {
            return;
        }
        if !self.shown.is_empty() && rest.starts_with(self.shown.as_str()) {
            write!(self.out, "{}", &rest[self.shown.len()..]).ok();
        } else {
            self.clear_shown();
            write!(self.out, "{}", rest).ok();
        }
        self.shown = rest.to_string();
    }

    fn update(&mut self, text: String, tty: bool) {
        if !text.starts_with(&self.text[..self.committed]) {
            // Replaced rather than grown: start over on a fresh line.
            self.clear_shown();
            if self.committed > 0 {
                writeln!(self.out).ok();
            }
            self.committed = 0;
        }

        let line_end = text.rfind('\n').map_or(0, |idx| idx + 1);
        if line_end > self.committed {
            self.clear_shown();
            write!(self.out, "{}", &text[self.committed..line_end]).ok();
            self.committed = line_end;
        }

        if tty {
            self.show_partial(&text[line_end..]);
        }
        self.text = text;
    }

    fn finish(&mut self, tty: bool) {
        if self.reply.take().is_none() {
            return;
        }
        if !tty {
            write!(self.out, "{}", &self.text[self.committed..]).ok();
        }
        writeln!(self.out).ok();
        self.text.clear();
        self.committed = 0;
        self.shown.clear();
    }
}

/// Prints assistant replies and stands in for the input box.
///
/// User messages are not echoed; the user typed them.
pub struct Terminal<W: Write + Send> {
    screen: Mutex<Screen<W>>,
    tty: bool,
    prompt: Option<String>,
}

impl Terminal<io::Stdout> {
    pub fn stdout() -> Self {
        let tty = io::stdout().is_terminal();
        Self::new(io::stdout(), tty)
    }
}

impl<W: Write + Send> Terminal<W> {
    pub fn new(out: W, tty: bool) -> Self {
        Self {
            screen: Mutex::new(Screen {
                out,
                reply: None,
                text: String::new(),
                committed: 0,
                shown: String::new(),
            }),
            tty,
            prompt: None,
        }
    }

    /// Print `prompt` whenever input is expected again
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }
}

impl<W: Write + Send> RenderSink for Terminal<W> {
    fn render_message(&self, id: MessageId, role: Role, body: &MessageBody) {
        if role == Role::User {
            return;
        }

        let mut screen = self.screen.lock();
        if screen.reply != Some(id) {
            screen.start(id);
        }

        match body {
            MessageBody::Composing => {
                if self.tty {
                    screen.show_partial(COMPOSING);
                }
            }
            MessageBody::Markup(markup) => screen.update(to_plain_text(markup), self.tty),
        }
    }
}

impl<W: Write + Send> InputAffordance for Terminal<W> {
    fn clear_input(&self) {}

    fn set_busy(&self, busy: bool) {
        if !busy {
            self.screen.lock().finish(self.tty);
        }
    }

    fn focus(&self) {
        if let Some(prompt) = &self.prompt {
            let mut screen = self.screen.lock();
            write!(screen.out, "\n{}", prompt).ok();
        }
    }

    fn scroll_to_latest(&self) {
        self.screen.lock().out.flush().ok();
    }
}
