//! Terminal front end for a chat session
//!
//! Renders the transcript, a typing indicator fed by the exchange state and
//! the memory panel. Lines starting with `/` are commands; everything else is
//! sent to the assistant.

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::prompts_builtin;
use crate::conversation::{Message, Speaker};
use crate::core::{HttpGateway, SendOutcome, Session};

#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Say(&'a str),
    Memory,
    Forget(&'a str),
    Restart,
    Quit,
    Unknown(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    let trimmed = line.trim();
    let Some(command) = trimmed.strip_prefix('/') else {
        return Input::Say(line);
    };

    let (name, rest) = command
        .split_once(char::is_whitespace)
        .map(|(n, r)| (n, r.trim()))
        .unwrap_or((command, ""));

    match name {
        "memory" => Input::Memory,
        "forget" if !rest.is_empty() => Input::Forget(rest),
        "restart" => Input::Restart,
        "quit" | "exit" => Input::Quit,
        _ => Input::Unknown(trimmed),
    }
}

fn render(message: &Message) {
    let who = match message.role {
        Speaker::User => "🧑",
        Speaker::Model => "🤖",
    };
    println!("{} {}", who, message.content);
}

fn render_memory(session: &Session<HttpGateway>) {
    let memory = session.memory();
    println!("── الذاكرة المحفوظة ({}/{}) ──", memory.len(), memory.capacity());
    if memory.is_empty() {
        println!("{}", prompts_builtin::MEMORY_EMPTY);
        return;
    }
    for (key, value) in memory.entries() {
        println!("{}: {}", key, value);
    }
}

fn render_usage(session: &Session<HttpGateway>) {
    let (count, limit) = session.usage();
    println!("{}", prompts_builtin::usage_line(count, limit));
}

pub async fn run(mut session: Session<HttpGateway>) -> anyhow::Result<()> {
    tracing::info!(session = %session.id(), "Chat session started");

    let mut state = session.subscribe();
    let indicator = tokio::spawn(async move {
        let mut typing = false;
        while state.changed().await.is_ok() {
            let busy = state.borrow_and_update().is_busy();
            if busy && !typing {
                println!("🤖 {}", prompts_builtin::TYPING);
            }
            typing = busy;
        }
    });

    render(&session.start().await);
    render_usage(&session);
    if session.limit_reached() {
        println!("{}", prompts_builtin::INPUT_DISABLED);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_input(&line) {
            Input::Quit => break,
            Input::Memory => render_memory(&session),
            Input::Forget(key) => {
                if session.forget(key) {
                    println!("✓ {}", key);
                }
                render_memory(&session);
            }
            Input::Restart => render(&session.start().await),
            Input::Unknown(command) => println!("? {}", command),
            Input::Say(text) => {
                let before = session.transcript().len();
                match session.send(text).await {
                    SendOutcome::Ignored => continue,
                    SendOutcome::LimitReached => println!("{}", prompts_builtin::INPUT_DISABLED),
                    SendOutcome::Replied(reply) | SendOutcome::Failed(reply) => {
                        render(&Message::model(reply));
                        // the user turn and the reply; anything after is a notice
                        session.transcript()[before + 2..].iter().for_each(render);
                    }
                }
                render_usage(&session);
            }
        }
    }

    indicator.abort();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_sent() {
        assert_eq!(parse_input("احفظ اسمي أحمد"), Input::Say("احفظ اسمي أحمد"));
    }

    #[test]
    fn test_commands() {
        assert_eq!(parse_input("/memory"), Input::Memory);
        assert_eq!(parse_input("  /forget  تاريخ الميلاد "), Input::Forget("تاريخ الميلاد"));
        assert_eq!(parse_input("/restart"), Input::Restart);
        assert_eq!(parse_input("/exit"), Input::Quit);
    }

    #[test]
    fn test_forget_needs_a_key() {
        assert_eq!(parse_input("/forget"), Input::Unknown("/forget"));
        assert_eq!(parse_input("/dance"), Input::Unknown("/dance"));
    }
}
