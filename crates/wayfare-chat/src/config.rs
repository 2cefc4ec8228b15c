//! Session configuration and localized notices

use serde::{Deserialize, Serialize};
use wayfare_wire::Dialect;

/// Display language for notices the client writes into the transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Zh,
    En,
}

impl std::str::FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "zh" | "zh-cn" | "cn" => Ok(Locale::Zh),
            "en" | "en-us" | "en-gb" => Ok(Locale::En),
            other => Err(format!("unknown locale: {}", other)),
        }
    }
}

/// Text the client itself inserts into replies and choice labels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notices {
    /// Shown in place of an empty reply when the connection fails
    pub connection_failed: String,
    /// Prefix of the marker appended when the agent reports an error
    pub agent_error: String,
    /// Prefix of the label of a chosen option ("I chose")
    pub chose: String,
    /// Label of the approval confirmation choice
    pub confirm: String,
}

impl Notices {
    /// Notices for a locale
    pub fn for_locale(locale: Locale) -> Self {
        match locale {
            Locale::Zh => Self {
                connection_failed: "[连接异常，请重试]".to_string(),
                agent_error: "代理错误".to_string(),
                chose: "我选择了".to_string(),
                confirm: "确认并继续".to_string(),
            },
            Locale::En => Self {
                connection_failed: "[Connection problem, please try again]".to_string(),
                agent_error: "Agent error".to_string(),
                chose: "I chose".to_string(),
                confirm: "Confirm and continue".to_string(),
            },
        }
    }

    /// Marker recorded for an agent error frame
    pub fn agent_error_marker(&self, message: &str) -> String {
        format!("[{}: {}]", self.agent_error, message)
    }
}

impl Default for Notices {
    fn default() -> Self {
        Self::for_locale(Locale::default())
    }
}

/// Sentinel some agent deployments append to the final reply
pub const FINISH_MARKER: &str = "FINISH";

/// Chat session configuration
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Wire vocabulary of the agent service
    pub dialect: Dialect,
    /// Localized notices
    pub notices: Notices,
    /// Remove a trailing [`FINISH_MARKER`] when a reply closes
    pub strip_finish_marker: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::Auto,
            notices: Notices::default(),
            strip_finish_marker: true,
        }
    }
}

impl ChatConfig {
    /// Default configuration with notices for a locale
    pub fn with_locale(locale: Locale) -> Self {
        Self {
            notices: Notices::for_locale(locale),
            ..Self::default()
        }
    }
}
