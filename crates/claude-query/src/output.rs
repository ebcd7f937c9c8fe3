use std::io::Write;

use anyhow::Result;
use claude_code_sdk::{ContentBlock, Message, QueryOutcome, ResultMessage};
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Renders messages as they arrive.
pub struct StreamPrinter {
    json: bool,
    verbose: bool,
    result: Option<ResultMessage>,
}

impl StreamPrinter {
    pub fn new(json: bool, verbose: bool) -> Self {
        StreamPrinter {
            json,
            verbose,
            result: None,
        }
    }

    pub fn print(&mut self, msg: &Message) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string(msg)?);
        } else {
            self.print_text(msg);
        }
        if let Message::Result(r) = msg {
            self.result = Some(r.clone());
        }
        std::io::stdout().flush()?;
        Ok(())
    }

    fn print_text(&self, msg: &Message) {
        match msg {
            Message::Assistant(asst) => {
                for block in asst.blocks() {
                    match block {
                        Ok(ContentBlock::Text { text }) => print!("{text}"),
                        Ok(ContentBlock::ToolUse { name, .. }) => println!("\n[tool: {name}]"),
                        Ok(ContentBlock::ToolResult { .. }) => {}
                        Err(e) => tracing::debug!(error = %e, "skipping content block"),
                    }
                }
            }
            Message::System(sys) if self.verbose => eprintln!("[system: {}]", sys.subtype),
            Message::Result(r) => {
                println!();
                if let Some(cost) = r.total_cost() {
                    println!("cost: ${cost:.4}");
                }
            }
            _ => {}
        }
    }

    /// Fail when the session's result reported an error.
    pub fn finish(self) -> Result<()> {
        match self.result {
            Some(r) if r.is_error => anyhow::bail!("session ended with an error result"),
            _ => Ok(()),
        }
    }
}

#[derive(Serialize)]
struct Summary<'a> {
    message_count: usize,
    result: &'a ResultMessage,
}

pub fn print_outcome(outcome: &QueryOutcome, json: bool) -> Result<()> {
    if json {
        return print_json(&Summary {
            message_count: outcome.messages.len(),
            result: &outcome.result,
        });
    }

    println!("messages: {}", outcome.messages.len());
    println!("{}", outcome.text());
    if let Some(cost) = outcome.result.total_cost() {
        println!("cost: ${cost:.4}");
    }
    Ok(())
}
