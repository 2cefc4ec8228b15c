//! Selectable answers to a pending interaction

use serde::{Deserialize, Serialize};
use serde_json::Value;
use wayfare_wire::{Interaction, InteractionKind};

use crate::config::Notices;

/// Value sent back to resume a turn after an approval request
pub const APPROVAL_VALUE: &str = "确认";

/// One answer the user can give
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionChoice {
    /// Sent to the agent service so it can resume the paused turn
    pub value: String,
    /// Shown in the transcript as the user's message
    pub label: String,
    /// One-line description of the option
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub summary: String,
}

impl InteractionChoice {
    /// Create a choice
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            summary: String::new(),
        }
    }

    fn with_summary(mut self, summary: String) -> Self {
        self.summary = summary;
        self
    }
}

/// The choices offered for an interaction, in option order
pub fn choices(interaction: &Interaction, notices: &Notices) -> Vec<InteractionChoice> {
    let chose = |what: &str| format!("{} {}", notices.chose, what);

    match interaction.kind {
        InteractionKind::Approval => {
            vec![InteractionChoice::new(APPROVAL_VALUE, notices.confirm.clone())]
        }
        InteractionKind::SelectPlan => interaction
            .options
            .iter()
            .enumerate()
            .map(|(i, opt)| {
                let name = field(opt, "name").unwrap_or_else(|| format!("#{}", i + 1));
                let summary = join_present(&[
                    Some(name.clone()),
                    field(opt, "price"),
                    field(opt, "details"),
                ]);
                InteractionChoice::new(format!("方案{}", i + 1), chose(&name)).with_summary(summary)
            })
            .collect(),
        InteractionKind::SelectFlight => interaction
            .options
            .iter()
            .enumerate()
            .map(|(i, opt)| {
                let flight = join_present(&[field(opt, "airline"), field(opt, "flight_number")]);
                let flight = if flight.is_empty() {
                    format!("#{}", i + 1)
                } else {
                    flight
                };
                let summary = join_present(&[Some(flight.clone()), field(opt, "price")]);
                InteractionChoice::new(format!("F{}", i + 1), chose(&flight)).with_summary(summary)
            })
            .collect(),
        InteractionKind::SelectHotel => interaction
            .options
            .iter()
            .enumerate()
            .map(|(i, opt)| {
                let name = field(opt, "name").unwrap_or_else(|| format!("#{}", i + 1));
                let summary = join_present(&[Some(name.clone()), field(opt, "price")]);
                InteractionChoice::new(format!("H{}", i + 1), chose(&name)).with_summary(summary)
            })
            .collect(),
        InteractionKind::Other => interaction
            .options
            .iter()
            .enumerate()
            .map(|(i, opt)| {
                let text = scalar(opt)
                    .or_else(|| field(opt, "name"))
                    .unwrap_or_else(|| opt.to_string());
                InteractionChoice::new((i + 1).to_string(), chose(&text)).with_summary(text)
            })
            .collect(),
    }
}

fn field(option: &Value, key: &str) -> Option<String> {
    option.get(key).and_then(scalar)
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn join_present(parts: &[Option<String>]) -> String {
    parts
        .iter()
        .flatten()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}
