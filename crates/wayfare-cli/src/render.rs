//! Line-mode rendering of chat events

use std::io::{self, Write};

use wayfare_chat::{ChatEvent, Locale, Notices, TurnOutcome, is_internal_tool};

/// Display name of a tool
pub fn tool_label(name: &str, locale: Locale) -> &str {
    match (locale, name) {
        (Locale::Zh, "book_flight") => "预订机票",
        (Locale::Zh, "book_hotel") => "预订酒店",
        (Locale::Zh, "book_ticket") => "预订门票",
        (Locale::Zh, "get_weather") => "查询天气",
        (Locale::Zh, "search_travel_guides") => "搜索旅游指南",
        (Locale::Zh, "query_flights") => "查询机票",
        (Locale::Zh, "query_hotels") => "查询酒店",
        (Locale::En, "book_flight") => "Booking flight",
        (Locale::En, "book_hotel") => "Booking hotel",
        (Locale::En, "book_ticket") => "Booking ticket",
        (Locale::En, "get_weather") => "Checking weather",
        (Locale::En, "search_travel_guides") => "Searching travel guides",
        (Locale::En, "query_flights") => "Searching flights",
        (Locale::En, "query_hotels") => "Searching hotels",
        _ => name,
    }
}

/// Display name of a sub-agent
pub fn agent_label(name: &str, locale: Locale) -> &str {
    match (locale, name) {
        (Locale::Zh, "flight_agent") => "机票助手",
        (Locale::Zh, "hotel_agent") => "酒店助手",
        (Locale::Zh, "ticket_agent") => "门票助手",
        (Locale::Zh, "planner_agent") => "规划师",
        (Locale::Zh, "query_agent") => "查询助手",
        (Locale::Zh, "booking_team") => "预订团队",
        (Locale::En, "flight_agent") => "Flight assistant",
        (Locale::En, "hotel_agent") => "Hotel assistant",
        (Locale::En, "ticket_agent") => "Ticket assistant",
        (Locale::En, "planner_agent") => "Planner",
        (Locale::En, "query_agent") => "Search assistant",
        (Locale::En, "booking_team") => "Booking team",
        _ => name,
    }
}

/// Prints one turn's events as they arrive
pub struct EventPrinter<W: Write> {
    out: W,
    locale: Locale,
    notices: Notices,
    /// Tool whose `[name...` bracket is still open on the current line
    open_tool: Option<String>,
    at_line_start: bool,
    /// Reply text was printed this turn
    has_text: bool,
}

impl<W: Write> EventPrinter<W> {
    pub fn new(out: W, locale: Locale) -> Self {
        Self {
            out,
            locale,
            notices: Notices::for_locale(locale),
            open_tool: None,
            at_line_start: true,
            has_text: false,
        }
    }

    /// Render an event
    pub fn handle(&mut self, event: &ChatEvent) -> io::Result<()> {
        match event {
            ChatEvent::TurnStarted { .. } => {
                self.open_tool = None;
                self.at_line_start = true;
                self.has_text = false;
            }
            ChatEvent::AgentIdentified { agent, .. } => {
                self.close_bracket("]")?;
                self.newline()?;
                write!(self.out, "[{}] ", agent_label(agent, self.locale))?;
                self.at_line_start = false;
            }
            ChatEvent::TextDelta { delta, .. } => {
                self.close_bracket("]")?;
                write!(self.out, "{}", delta)?;
                self.at_line_start = delta.ends_with('\n');
                self.has_text |= !delta.trim().is_empty();
            }
            ChatEvent::ToolCallStarted { name, .. } if !is_internal_tool(name) => {
                self.close_bracket("]")?;
                self.newline()?;
                write!(self.out, "[{}...", tool_label(name, self.locale))?;
                self.open_tool = Some(name.clone());
                self.at_line_start = false;
            }
            ChatEvent::ToolCallsResolved { names, .. } => {
                for name in names.iter().filter(|n| !is_internal_tool(n)) {
                    if self.open_tool.as_deref() == Some(name.as_str()) {
                        self.close_bracket(" done]")?;
                    } else {
                        self.close_bracket("]")?;
                        self.newline()?;
                        write!(self.out, "[{} done]", tool_label(name, self.locale))?;
                        self.at_line_start = false;
                    }
                }
                self.newline()?;
            }
            ChatEvent::TurnEnded { outcome, .. } => {
                self.close_bracket("]")?;
                match outcome {
                    TurnOutcome::AgentError(message) => {
                        self.newline()?;
                        write!(self.out, "{}", self.notices.agent_error_marker(message))?;
                        self.at_line_start = false;
                    }
                    // Partial text stays on screen, like in the transcript
                    TurnOutcome::TransportFailed(_) if !self.has_text => {
                        self.newline()?;
                        write!(self.out, "{}", self.notices.connection_failed)?;
                        self.at_line_start = false;
                    }
                    _ => {}
                }
                self.newline()?;
            }
            _ => {}
        }
        self.out.flush()
    }

    fn close_bracket(&mut self, tail: &str) -> io::Result<()> {
        if self.open_tool.take().is_some() {
            write!(self.out, "{}", tail)?;
        }
        Ok(())
    }

    fn newline(&mut self) -> io::Result<()> {
        if !self.at_line_start {
            writeln!(self.out)?;
            self.at_line_start = true;
        }
        Ok(())
    }

    /// Consume the printer and return the writer
    pub fn into_inner(self) -> W {
        self.out
    }
}
