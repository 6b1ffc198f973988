//! Interactive line-oriented front end for an [`Agent`].

use itertools::Itertools;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::agent::{Agent, Conversation};
use crate::client::Client;
use crate::model::ToolDescriptor;

pub const PROMPT: &str = "\nQuery: ";

/// Whether a line asks to leave the loop.
pub fn is_quit(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("quit")
}

/// The banner printed once the tool servers are connected.
pub fn connected_banner(tools: &[ToolDescriptor]) -> String {
    format!(
        "\nConnected to server with tools: [{}]",
        tools.iter().map(|t| format!("'{}'", t.name)).join(", ")
    )
}

/// Text shown for one answered query: a trace line per tool call, then the answer.
pub fn render_reply(conversation: &Conversation) -> String {
    conversation
        .transcript
        .tool_requests()
        .map(|req| format!("[Calling tool {} with args {}]", req.tool_name, req.arguments))
        .chain(std::iter::once(conversation.answer.clone()))
        .join("\n")
}

/// Read queries line by line until `quit` or end of input.
///
/// A failed query is reported as `Error: <message>` and the loop keeps going.
pub async fn chat_loop<C, R, W>(agent: &Agent<C>, input: R, output: &mut W) -> std::io::Result<()>
where
    C: Client,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    output
        .write_all(b"\nMCP Client Started!\nType your queries or 'quit' to exit.\n")
        .await?;

    let mut lines = input.lines();
    loop {
        output.write_all(PROMPT.as_bytes()).await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            debug!("Input closed");
            break;
        };
        if is_quit(&line) {
            break;
        }
        let query = line.trim();
        if query.is_empty() {
            continue;
        }

        let reply = match agent.run_with_transcript(query).await {
            Ok(conversation) => render_reply(&conversation),
            Err(e) => format!("Error: {}", e),
        };
        output.write_all(format!("\n{}\n", reply).as_bytes()).await?;
    }

    output.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quit_is_case_insensitive_and_trimmed() {
        assert!(is_quit("quit"));
        assert!(is_quit("  QUIT \n"));
        assert!(!is_quit("quit now"));
    }

    #[test]
    fn banner_lists_tool_names() {
        let tools = vec![
            ToolDescriptor::new("get_alerts", "", Default::default()),
            ToolDescriptor::new("get_forecast", "", Default::default()),
        ];
        assert_eq!(
            connected_banner(&tools),
            "\nConnected to server with tools: ['get_alerts', 'get_forecast']"
        );
    }
}
