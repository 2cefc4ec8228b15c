//! /session command - show session info

use super::CommandResult;
use crate::{config::Settings, utils::truncate_chars};
use wayfare_chat::ChatSession;

pub struct SessionCommand;

impl SessionCommand {
    pub fn execute(session: &ChatSession, settings: &Settings) -> CommandResult {
        let transcript = session.transcript();

        let mut output = String::from("Session Info\n");
        output.push_str(&"-".repeat(40));
        output.push('\n');

        output.push_str(&format!("Session:    {}\n", session.session_id()));
        output.push_str(&format!("Endpoint:   {}\n", settings.endpoint));
        output.push_str(&format!("History:    {:?}\n", settings.history));
        output.push_str(&format!("Dialect:    {:?}\n", settings.dialect));
        output.push('\n');

        let user_msgs = transcript
            .messages()
            .iter()
            .filter(|m| !m.is_assistant())
            .count();
        let replies = transcript
            .messages()
            .iter()
            .filter(|m| m.is_assistant() && !m.is_blank())
            .count();
        let tool_calls: usize = transcript
            .messages()
            .iter()
            .map(|m| m.visible_tools().count())
            .sum();
        output.push_str(&format!("Messages:   {} total\n", transcript.len()));
        output.push_str(&format!(
            "            {} user, {} replies, {} tool calls\n",
            user_msgs, replies, tool_calls
        ));

        if let Some(last) = transcript.last_assistant() {
            let preview = truncate_chars(&last.content.replace('\n', " "), 60);
            output.push_str(&format!("Last reply: {}\n", preview));
        }
        if let Some(pending) = session.pending_interaction() {
            output.push_str(&format!(
                "Waiting for your choice ({} options)\n",
                pending.interaction.options.len()
            ));
        }

        CommandResult::Message(output)
    }
}
