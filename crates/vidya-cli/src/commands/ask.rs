use anyhow::Result;

use super::chat::print_reply;
use crate::cli::{AskArgs, Cli};
use crate::output::OutputWriter;
use crate::startup::{resolve_config, start_session};

/// One question, one answer; a failed turn exits non-zero
pub fn execute(cli: &Cli, args: &AskArgs, output: &OutputWriter) -> Result<()> {
    let config = resolve_config(cli)?;
    let mut session = start_session(&config, output)?;

    let reply = session.ask(&args.question())?;

    if output.is_json() {
        output.result(&reply)?;
    } else {
        print_reply(&reply);
    }

    Ok(())
}
