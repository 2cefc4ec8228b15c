//! Slash commands for interactive mode

mod booking;
mod session;

pub use booking::{ApiRequest, BookingCommand};
pub use session::SessionCommand;

use crate::config::Settings;
use wayfare_chat::ChatSession;

/// Result of executing a slash command
#[derive(Debug, PartialEq)]
pub enum CommandResult {
    /// Start a new conversation
    Clear,
    /// Show a message to the user (not sent to agent)
    Message(String),
    /// Call the REST API
    Api(ApiRequest),
    /// Exit the application
    Exit,
    /// Unknown command
    Unknown(String),
}

/// Parse and execute a slash command
pub fn execute_command(
    input: &str,
    session: &ChatSession,
    settings: &Settings,
) -> Option<CommandResult> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let parts: Vec<&str> = rest.splitn(2, ' ').collect();
    let command = parts[0].to_lowercase();
    let args = parts.get(1).map(|s| s.trim()).unwrap_or("");

    Some(match command.as_str() {
        "help" | "h" | "?" => CommandResult::Message(help_message()),

        "new" | "clear" | "c" => CommandResult::Clear,

        "quit" | "exit" | "q" => CommandResult::Exit,

        "status" => CommandResult::Api(ApiRequest::Status),

        "flights" => CommandResult::Api(ApiRequest::Flights),

        "hotels" => CommandResult::Api(ApiRequest::Hotels),

        "book-flight" => BookingCommand::book_flight(args),

        "book-hotel" => BookingCommand::book_hotel(args),

        "ask" | "vibe" => BookingCommand::one_shot(&command, args),

        "session" | "s" => SessionCommand::execute(session, settings),

        _ => CommandResult::Unknown(command),
    })
}

fn help_message() -> String {
    r#"Available commands:
  /help, /h, /?              Show this help message
  /new, /clear, /c           Start a new conversation (new session id)
  /status                    Check that the REST API is up
  /flights                   List available flights
  /hotels                    List available hotels
  /book-flight FROM TO       Book a flight between two airports
  /book-hotel NAME           Book a hotel by name
  /ask QUERY                 One-shot question to the agent (no streaming, not in history)
  /vibe QUERY                One-shot question to the agent team
  /session, /s               Show session info
  /quit, /exit, /q           Exit wayfare

Press Ctrl-C while a reply is streaming to stop it.

Examples:
  /book-flight PVG NRT       Book a Shanghai to Tokyo flight
  /book-hotel Peace Hotel    Book the Peace Hotel"#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use wayfare_chat::{ChatConfig, HttpTransport};
    use wayfare_wire::AgentClient;

    fn session() -> ChatSession {
        let transport = Arc::new(HttpTransport::new(AgentClient::new("http://localhost:1")));
        ChatSession::new(transport, ChatConfig::default())
    }

    fn run(input: &str) -> Option<CommandResult> {
        execute_command(input, &session(), &Settings::default())
    }

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert_eq!(run("book me a hotel"), None);
    }

    #[test]
    fn test_new_and_clear_are_aliases() {
        assert_eq!(run("/new"), Some(CommandResult::Clear));
        assert_eq!(run("/clear"), Some(CommandResult::Clear));
    }

    #[test]
    fn test_api_commands() {
        assert_eq!(run("/flights"), Some(CommandResult::Api(ApiRequest::Flights)));
        assert_eq!(
            run("/book-flight PVG NRT"),
            Some(CommandResult::Api(ApiRequest::BookFlight {
                from: "PVG".into(),
                to: "NRT".into()
            }))
        );
        assert_eq!(
            run("/book-hotel  Peace Hotel "),
            Some(CommandResult::Api(ApiRequest::BookHotel {
                name: "Peace Hotel".into()
            }))
        );
    }

    #[test]
    fn test_one_shot_commands() {
        assert_eq!(run("/status"), Some(CommandResult::Api(ApiRequest::Status)));
        assert_eq!(
            run("/vibe 3 days in Chengdu"),
            Some(CommandResult::Api(ApiRequest::Vibe {
                query: "3 days in Chengdu".into()
            }))
        );
        assert_eq!(
            run("/ask"),
            Some(CommandResult::Message("Usage: /ask QUERY".into()))
        );
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(run("/Teleport"), Some(CommandResult::Unknown("teleport".into())));
    }

    #[test]
    fn test_session_info() {
        match run("/session") {
            Some(CommandResult::Message(text)) => assert!(text.contains("Session:")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
