//! Interactive loop: read a line, run a turn on the session's thread, repeat.
//!
//! Exits on EOF (Ctrl+D) or `quit`/`exit`/`/quit`. A failed turn is reported on stderr and
//! the loop continues on the same thread.

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};

use cli::{OutputMode, RunOptions, Session};

pub fn is_quit_command(line: &str) -> bool {
    matches!(line.trim(), "quit" | "exit" | "/quit" | "/exit")
}

pub async fn run_repl_loop(
    session: &Session,
    opts: &RunOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let prompt = opts.output == OutputMode::Text;
    let mut reader = BufReader::new(tokio::io::stdin()).lines();

    loop {
        if prompt {
            print!("> ");
            std::io::stdout().flush()?;
        }
        let line = match reader.next_line().await? {
            None => break,
            Some(s) if s.trim().is_empty() => continue,
            Some(s) if is_quit_command(&s) => break,
            Some(s) => s,
        };
        let mut out = std::io::stdout();
        let mut diag = std::io::stderr();
        if let Err(e) = session.run_turn(&line, opts, &mut out, &mut diag).await {
            eprintln!("error: {}", e);
        }
    }

    if prompt {
        println!("Bye.");
    }
    Ok(())
}
