//! Chat commands understood by the bot.

use serde::{Deserialize, Serialize};

/// Fixed set of commands a chat user can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    Payment,
    Delivery,
    Product,
}

impl CommandKind {
    /// All commands in registration order.
    pub const ALL: [CommandKind; 3] = [Self::Payment, Self::Delivery, Self::Product];

    /// Command code as typed in chat, including the leading slash.
    pub fn code(self) -> &'static str {
        match self {
            Self::Payment => "/payment",
            Self::Delivery => "/delivery",
            Self::Product => "/product",
        }
    }

    /// Bare command name as registered on the gateway.
    pub fn name(self) -> &'static str {
        self.code().trim_start_matches('/')
    }

    /// Localization key of the command description.
    pub fn description_key(self) -> &'static str {
        match self {
            Self::Payment => "get_payment",
            Self::Delivery => "get_delivery",
            Self::Product => "get_product",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    /// Codes of every command, as stored on a tenant record.
    pub fn all_codes() -> Vec<String> {
        Self::ALL.iter().map(|kind| kind.code().to_string()).collect()
    }
}

/// A recognized command with its free-text parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub kind: CommandKind,
    /// Product filter; always empty for payment and delivery.
    pub filter: String,
}
