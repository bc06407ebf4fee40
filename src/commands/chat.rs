use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::error;

use catan_rag::{AppContext, ChatSession};

use super::StatusLine;

enum Input<'a> {
    Question(&'a str),
    History,
    Clear,
    Exit,
    Unknown(&'a str),
    Blank,
}

fn parse_input(line: &str) -> Input<'_> {
    match line.trim() {
        "" => Input::Blank,
        "/history" => Input::History,
        "/clear" => Input::Clear,
        "/exit" | "/quit" => Input::Exit,
        cmd if cmd.starts_with('/') => Input::Unknown(cmd),
        question => Input::Question(question),
    }
}

/// Line-oriented conversation over stdin. A failed turn is reported and the
/// loop continues with the session history untouched.
pub async fn run(ctx: &AppContext) -> Result<()> {
    let mut session = ChatSession::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    eprintln!("Ask about Catan rules or the game state. Commands: /history, /clear, /exit");

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_input(&line) {
            Input::Blank => continue,
            Input::Exit => break,
            Input::Clear => {
                session.clear();
                eprintln!("History cleared");
            }
            Input::History => {
                if session.turns().is_empty() {
                    eprintln!("(no history)");
                }
                for turn in session.turns() {
                    println!("[{}] {}: {}", turn.at.format("%H:%M:%S"), turn.role, turn.content);
                }
            }
            Input::Unknown(cmd) => eprintln!("Unknown command: {}", cmd),
            Input::Question(question) => {
                match session.ask(&ctx.pipeline, question, &StatusLine).await {
                    Ok(outcome) => println!("{}\n", outcome.answer),
                    Err(e) => {
                        error!("Turn failed: {}", e);
                        eprintln!("Sorry, that question could not be answered: {}", e);
                    }
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        assert!(matches!(parse_input("  "), Input::Blank));
        assert!(matches!(parse_input("/history"), Input::History));
        assert!(matches!(parse_input("/clear\n"), Input::Clear));
        assert!(matches!(parse_input("/exit"), Input::Exit));
        assert!(matches!(parse_input("/roll"), Input::Unknown("/roll")));
        assert!(matches!(
            parse_input(" Who owns the most roads? "),
            Input::Question("Who owns the most roads?")
        ));
    }
}
