//! services/planner/src/console.rs
//!
//! Terminal implementation of the `Confirmation` port.

use lesson_planner_core::ports::Confirmation;
use std::io::{BufRead, Write};
use std::sync::Mutex;

/// Asks a y/N question on `output` and reads the answer from `input`.
/// Anything other than "y" or "yes" declines.
pub struct PromptConfirmation<R, W> {
    io: Mutex<(R, W)>,
}

impl<R: BufRead, W: Write> PromptConfirmation<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            io: Mutex::new((input, output)),
        }
    }
}

impl PromptConfirmation<std::io::StdinLock<'static>, std::io::Stderr> {
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stderr())
    }
}

impl<R: BufRead, W: Write> Confirmation for PromptConfirmation<R, W> {
    fn confirm(&self, prompt: &str) -> bool {
        let Ok(mut guard) = self.io.lock() else {
            return false;
        };
        let (input, output) = &mut *guard;
        if write!(output, "{prompt} [y/N] ").and_then(|()| output.flush()).is_err() {
            return false;
        }
        let mut answer = String::new();
        match input.read_line(&mut answer) {
            Ok(0) | Err(_) => false,
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn answer(text: &str) -> (bool, String) {
        let confirm = PromptConfirmation::new(Cursor::new(text.to_string()), Vec::new());
        let agreed = confirm.confirm("Delete?");
        let (_, out) = confirm.io.into_inner().unwrap();
        (agreed, String::from_utf8(out).unwrap())
    }

    #[test]
    fn only_yes_confirms() {
        assert!(answer("y\n").0);
        assert!(answer("YES\n").0);
        assert!(!answer("n\n").0);
        assert!(!answer("\n").0);
        assert!(!answer("").0);
    }

    #[test]
    fn prompt_is_written_before_reading() {
        assert_eq!(answer("n\n").1, "Delete? [y/N] ");
    }
}
