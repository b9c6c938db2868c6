//! Operator confirmation for destructive table actions

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use tracing::debug;

/// Answers a yes/no question
pub trait Confirm {
    fn confirm(&mut self, question: &str) -> Result<bool>;
}

/// Prompts on stdout and reads one line; `y`/`yes` (any case) is yes.
pub struct ConsoleConfirm<R, W> {
    input: R,
    output: W,
}

impl ConsoleConfirm<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self {
            input: io::stdin().lock(),
            output: io::stdout(),
        }
    }
}

impl<R: BufRead, W: Write> ConsoleConfirm<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Confirm for ConsoleConfirm<R, W> {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        write!(self.output, "{} (y/n): ", question)?;
        self.output.flush()?;

        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        let answer = answer.trim().to_lowercase();
        Ok(answer == "y" || answer == "yes")
    }
}

/// What to do when the target table already exists, decided up front
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExistingTableAction {
    Drop,
    Append,
    Abort,
}

/// Non-interactive answers derived from an `ExistingTableAction`.
/// The first question is always "drop?", the second "append?".
pub struct PresetConfirm {
    action: ExistingTableAction,
    asked: usize,
}

impl PresetConfirm {
    pub fn new(action: ExistingTableAction) -> Self {
        Self { action, asked: 0 }
    }
}

impl Confirm for PresetConfirm {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        self.asked += 1;
        let answer = match (self.action, self.asked) {
            (ExistingTableAction::Drop, 1) => true,
            (ExistingTableAction::Append, 2) => true,
            _ => false,
        };
        debug!("{} -> {}", question, if answer { "yes" } else { "no" });
        Ok(answer)
    }
}

/// Replays a fixed queue of answers, recording every question asked.
/// An exhausted queue answers no.
#[derive(Default)]
pub struct ScriptedConfirm {
    answers: VecDeque<bool>,
    pub questions: Vec<String>,
}

impl ScriptedConfirm {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            questions: Vec::new(),
        }
    }
}

impl Confirm for ScriptedConfirm {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        self.questions.push(question.to_string());
        Ok(self.answers.pop_front().unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_reads_answer() {
        let mut out = Vec::new();
        let mut confirm = ConsoleConfirm::new("Yes\n".as_bytes(), &mut out);
        assert!(confirm.confirm("Drop table 'dataset'?").unwrap());
        assert_eq!(String::from_utf8(out).unwrap(), "Drop table 'dataset'? (y/n): ");

        let mut confirm = ConsoleConfirm::new("n\n".as_bytes(), Vec::new());
        assert!(!confirm.confirm("Append?").unwrap());

        let mut confirm = ConsoleConfirm::new("".as_bytes(), Vec::new());
        assert!(!confirm.confirm("Append?").unwrap());
    }

    #[test]
    fn test_preset_answers() {
        let mut drop = PresetConfirm::new(ExistingTableAction::Drop);
        assert!(drop.confirm("drop?").unwrap());

        let mut append = PresetConfirm::new(ExistingTableAction::Append);
        assert!(!append.confirm("drop?").unwrap());
        assert!(append.confirm("append?").unwrap());

        let mut abort = PresetConfirm::new(ExistingTableAction::Abort);
        assert!(!abort.confirm("drop?").unwrap());
        assert!(!abort.confirm("append?").unwrap());
    }

    #[test]
    fn test_scripted_records_questions() {
        let mut scripted = ScriptedConfirm::new([false]);
        assert!(!scripted.confirm("first").unwrap());
        assert!(!scripted.confirm("second").unwrap());
        assert_eq!(scripted.questions, vec!["first", "second"]);
    }
}
