//! /status, /flights, /hotels, /book-*, /ask and /vibe - direct REST calls

use super::CommandResult;
use serde_json::Value;
use wayfare_wire::TravelApi;

/// A REST call requested from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiRequest {
    Status,
    Flights,
    Hotels,
    BookFlight { from: String, to: String },
    BookHotel { name: String },
    /// One-shot question to the single agent
    Ask { query: String },
    /// One-shot question to the agent team
    Vibe { query: String },
}

pub struct BookingCommand;

impl BookingCommand {
    /// Parse `/book-flight FROM TO`
    pub fn book_flight(args: &str) -> CommandResult {
        let airports: Vec<&str> = args.split_whitespace().collect();
        match airports.as_slice() {
            [from, to] => CommandResult::Api(ApiRequest::BookFlight {
                from: from.to_string(),
                to: to.to_string(),
            }),
            _ => CommandResult::Message("Usage: /book-flight FROM TO".to_string()),
        }
    }

    /// Parse `/book-hotel NAME`
    pub fn book_hotel(args: &str) -> CommandResult {
        if args.is_empty() {
            return CommandResult::Message("Usage: /book-hotel NAME".to_string());
        }
        CommandResult::Api(ApiRequest::BookHotel {
            name: args.to_string(),
        })
    }

    /// Parse `/ask QUERY` and `/vibe QUERY`
    pub fn one_shot(command: &str, args: &str) -> CommandResult {
        if args.is_empty() {
            return CommandResult::Message(format!("Usage: /{} QUERY", command));
        }
        let query = args.to_string();
        CommandResult::Api(match command {
            "vibe" => ApiRequest::Vibe { query },
            _ => ApiRequest::Ask { query },
        })
    }

    /// Perform the call and format the response for display
    pub async fn run(api: &TravelApi, request: &ApiRequest) -> String {
        let result = match request {
            ApiRequest::Status => api.root().await,
            ApiRequest::Flights => api.flights().await,
            ApiRequest::Hotels => api.hotels().await,
            ApiRequest::BookFlight { from, to } => api.book_flight(from, to).await,
            ApiRequest::BookHotel { name } => api.book_hotel(name).await,
            ApiRequest::Ask { query } => api.agent(query).await,
            ApiRequest::Vibe { query } => api.vibe(query).await,
        };

        match result {
            Ok(value) => format_response(&value),
            Err(e) => {
                tracing::debug!("{:?} failed: {:?}", request, e);
                format!("Request failed: {}", e)
            }
        }
    }
}

/// Pretty-print a response; arrays become one block per entry
pub fn format_response(value: &Value) -> String {
    let pretty = |v: &Value| serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string());
    match value {
        Value::Array(items) if items.is_empty() => "No results.".to_string(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| format!("#{}\n{}", i + 1, pretty(item)))
            .collect::<Vec<_>>()
            .join("\n\n"),
        Value::String(s) => s.clone(),
        other => pretty(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_book_flight_needs_two_airports() {
        assert_eq!(
            BookingCommand::book_flight("PVG"),
            CommandResult::Message("Usage: /book-flight FROM TO".to_string())
        );
        assert_eq!(
            BookingCommand::book_flight("PVG NRT HND"),
            CommandResult::Message("Usage: /book-flight FROM TO".to_string())
        );
    }

    #[test]
    fn test_book_hotel_needs_name() {
        assert!(matches!(
            BookingCommand::book_hotel(""),
            CommandResult::Message(_)
        ));
    }

    #[test]
    fn test_one_shot_queries() {
        assert_eq!(
            BookingCommand::one_shot("vibe", "plan a weekend in Hangzhou"),
            CommandResult::Api(ApiRequest::Vibe {
                query: "plan a weekend in Hangzhou".into()
            })
        );
        assert_eq!(
            BookingCommand::one_shot("ask", "weather in Beijing"),
            CommandResult::Api(ApiRequest::Ask {
                query: "weather in Beijing".into()
            })
        );
        assert_eq!(
            BookingCommand::one_shot("ask", ""),
            CommandResult::Message("Usage: /ask QUERY".to_string())
        );
    }

    #[tokio::test]
    async fn test_unreachable_service_reports_failure() {
        let api = TravelApi::new("http://127.0.0.1:1");
        let text = BookingCommand::run(&api, &ApiRequest::Status).await;
        assert!(text.starts_with("Request failed: "));
    }

    #[test]
    fn test_format_list() {
        let text = format_response(&json!([{"name": "Hilton"}, {"name": "Peace Hotel"}]));
        assert!(text.starts_with("#1\n{"));
        assert!(text.contains("#2\n"));
        assert!(text.contains("\"Peace Hotel\""));
    }

    #[test]
    fn test_format_scalars() {
        assert_eq!(format_response(&json!([])), "No results.");
        assert_eq!(format_response(&json!("Booked")), "Booked");
        assert_eq!(format_response(&json!({"ok": true})), "{\n  \"ok\": true\n}");
    }
}
