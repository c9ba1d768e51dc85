use anyhow::Result;
use console::style;
use vidya_core::VidyaError;
use vidya_retrieval::{ConversationSession, Reply};

use crate::cli::Cli;
use crate::interactive::{ChatInput, Prompter};
use crate::output::OutputWriter;
use crate::startup::{resolve_config, start_session};

pub fn execute(cli: &Cli, output: &OutputWriter) -> Result<()> {
    let config = resolve_config(cli)?;
    let mut session = start_session(&config, output)?;

    if !output.is_json() {
        println!(
            "\n{} Ask about your documents. Type {} or {} to leave.\n",
            style("Vidya").cyan().bold(),
            style("exit").bold(),
            style("quit").bold()
        );
    }

    let mut prompter = Prompter::detect();
    loop {
        let question = match prompter.next()? {
            ChatInput::Exit => break,
            ChatInput::Blank => continue,
            ChatInput::Question(question) => question,
        };

        answer(&mut session, &question, output)?;
    }

    Ok(())
}

/// Run one turn and print it; turn failures are reported, not returned
fn answer(session: &mut ConversationSession, question: &str, output: &OutputWriter) -> Result<()> {
    match session.ask(question) {
        Ok(reply) if output.is_json() => output.data(&reply),
        Ok(reply) => {
            print_reply(&reply);
            Ok(())
        }
        Err(VidyaError::EmptyQuestion) => Ok(()),
        Err(error) => {
            output.warning(error);
            Ok(())
        }
    }
}

/// Answer text followed by its numbered sources
pub fn print_reply(reply: &Reply) {
    println!("\n{} {}", style("Vidya:").cyan().bold(), reply.text());

    if let Reply::Answer { sources, .. } = reply {
        if !sources.is_empty() {
            println!("{}", style("Sources:").dim());
            for (i, source) in sources.iter().enumerate() {
                println!(
                    "  {} {} ({}) {}",
                    style(format!("[{}]", i + 1)).dim(),
                    source.location,
                    source.file_type.as_str(),
                    style(format!("score {:.3}", source.score)).dim()
                );
            }
        }
    }
    println!();
}
