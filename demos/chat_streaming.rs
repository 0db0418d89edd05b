//! Streaming chat example.
//!
//! Run with:
//! ```bash
//! export DIFY_CHAT_API_KEY="app-your-api-key"
//! cargo run --example chat_streaming
//! ```

use dify_client::{ApiKind, ApiSecret, ChatRequest, ClientRegistry, DifyOptions, StreamEvent};
use futures::StreamExt;
use std::io::Write;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let api_key = std::env::var("DIFY_CHAT_API_KEY")
        .expect("DIFY_CHAT_API_KEY environment variable must be set");

    let registry = ClientRegistry::new(
        [ApiSecret::new("demo-chat", api_key, ApiKind::Chat)],
        DifyOptions::default(),
    )?;

    let chat = registry.chat("demo-chat")?;

    let request = ChatRequest::new(
        "Introduce yourself in one sentence.".to_string(),
        "demo-user".to_string(),
    );

    println!("Sending chat message...");
    let mut events = chat.send_chat_message_streaming(request).await?;
    let mut task_id = None;

    while let Some(event) = events.next().await {
        match event? {
            StreamEvent::Message(chunk) => {
                task_id.get_or_insert(chunk.task_id.clone());
                print!("{}", chunk.answer);
                std::io::stdout().flush()?;
            }
            StreamEvent::MessageEnd(chunk) => {
                println!();
                if let Some(metadata) = chunk.metadata {
                    if let Some(usage) = metadata.usage {
                        println!("usage: {usage}");
                    }
                }
            }
            StreamEvent::Error(chunk) => {
                eprintln!("stream error {}: {}", chunk.code, chunk.message);
                break;
            }
            StreamEvent::Ping => {}
            other => println!("[{}]", other.kind()),
        }
    }

    if let Some(task_id) = task_id {
        println!("task was {task_id}");
    }

    Ok(())
}
