use anyhow::Result;
use dialoguer::{Confirm, Input};
use std::io::{self, BufRead, IsTerminal};
use std::path::Path;

/// Ask before deleting a persisted index
pub fn confirm_rebuild(index_path: &Path) -> Result<bool> {
    let confirmed = Confirm::new()
        .with_prompt(format!("Delete the index at {} and rebuild it?", index_path.display()))
        .default(false)
        .interact()?;
    Ok(confirmed)
}

/// What the user typed at the chat prompt
#[derive(Debug, PartialEq, Eq)]
pub enum ChatInput {
    Question(String),
    Blank,
    Exit,
}

impl ChatInput {
    pub fn classify(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            ChatInput::Blank
        } else if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            ChatInput::Exit
        } else {
            ChatInput::Question(line.to_string())
        }
    }
}

/// Line source for the chat loop: a prompt on a terminal, plain lines otherwise
pub enum Prompter {
    Terminal,
    Piped(io::Lines<io::StdinLock<'static>>),
}

impl Prompter {
    pub fn detect() -> Self {
        let stdin = io::stdin();
        if stdin.is_terminal() {
            Prompter::Terminal
        } else {
            Prompter::Piped(stdin.lock().lines())
        }
    }

    /// Next input; end of input counts as exit
    pub fn next(&mut self) -> Result<ChatInput> {
        match self {
            Prompter::Terminal => {
                let line: String = Input::new().with_prompt("You").allow_empty(true).interact_text()?;
                Ok(ChatInput::classify(&line))
            }
            Prompter::Piped(lines) => match lines.next() {
                Some(line) => Ok(ChatInput::classify(&line?)),
                None => Ok(ChatInput::Exit),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_sentinels_are_case_insensitive() {
        assert_eq!(ChatInput::classify("exit"), ChatInput::Exit);
        assert_eq!(ChatInput::classify("  QUIT "), ChatInput::Exit);
        assert_eq!(ChatInput::classify("Exit"), ChatInput::Exit);
    }

    #[test]
    fn test_blank_and_questions() {
        assert_eq!(ChatInput::classify("   "), ChatInput::Blank);
        assert_eq!(
            ChatInput::classify(" exit strategy? "),
            ChatInput::Question("exit strategy?".to_string())
        );
    }
}
