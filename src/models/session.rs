use super::message::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Agent persona the backend answers as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Agent {
    #[default]
    Crow,
    Falcon,
    Owl,
    Phoenix,
}

impl Agent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Agent::Crow => "crow",
            Agent::Falcon => "falcon",
            Agent::Owl => "owl",
            Agent::Phoenix => "phoenix",
        }
    }
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Agent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "crow" => Ok(Agent::Crow),
            "falcon" => Ok(Agent::Falcon),
            "owl" => Ok(Agent::Owl),
            "phoenix" => Ok(Agent::Phoenix),
            other => Err(format!(
                "unknown agent '{}' (expected crow, falcon, owl or phoenix)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub agent: Agent,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Session {
    /// Next free message id within this session.
    pub fn next_message_id(&self) -> u64 {
        self.messages.iter().map(|m| m.id).max().map_or(1, |id| id + 1)
    }

    pub fn message_mut(&mut self, id: u64) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == id)
    }
}
