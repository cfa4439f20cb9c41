use std::io::Write;

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::chat::{Chat, ChatError, TurnEvent};
use crate::core::AppConfig;
use crate::ollama::OllamaClient;

pub async fn run() -> Result<()> {
    let mut rl = DefaultEditor::new().expect("Editor failed");

    let config = AppConfig::default();
    let client = OllamaClient::new(&config);
    println!("Chatting with {} at {}", client.model(), config.ollama_url);

    let mut chat = Chat::new(client);

    loop {
        let readline = rl.readline(">>> ");
        match readline {
            Ok(line) => {
                match chat.submit(&line).await {
                    Ok(()) => {
                        // Accepted prompts become recallable with the arrow keys
                        let _ = rl.add_history_entry(line.as_str());
                    }
                    Err(ChatError::BlankPrompt) => continue,
                    Err(err) => {
                        println!("Error: {}", err);
                        continue;
                    }
                }
                stream_reply(&mut chat).await?;
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}

/// Print tokens as they arrive. Ctrl-C cancels the stream and keeps the
/// partial output as the final reply.
async fn stream_reply(chat: &mut Chat) -> Result<()> {
    let mut printed_any = false;
    while chat.is_streaming() {
        let mut cancelled = false;
        let mut event = None;

        tokio::select! {
            ev = chat.next_event() => {
                event = Some(ev);
            }
            _ = tokio::signal::ctrl_c() => {
                cancelled = true;
            }
        }

        if cancelled {
            chat.cancel();
            break;
        }

        match event {
            Some(TurnEvent::Token(token)) => {
                print!("{}", token);
                std::io::stdout().flush()?;
                printed_any = true;
            }
            Some(TurnEvent::Finished) => break,
            Some(TurnEvent::Failed) => {
                // Partial tokens were already printed; only an error
                // notice that replaced an empty reply needs printing
                if !printed_any {
                    if let Some(msg) = chat.transcript().last() {
                        println!("{}", msg.content);
                    }
                }
                break;
            }
            None => break,
        }
    }
    println!();

    Ok(())
}
