//! Overlay wire events.
//!
//! Everything arriving over the socket is normalized into the closed
//! [`ServerEvent`] set before it reaches the state managers. Unknown event
//! types and malformed payloads are dropped here and never surface further
//! in; outbound frames are the equally closed [`ClientCommand`] set.

use serde::{Deserialize, Serialize};

// ============================================================================
// Participants
// ============================================================================

/// Subscriber tier of a lottery participant.
///
/// The wire carries tiers as `"1000"`, `"2000"`, `"3000"` (string or
/// number); anything else maps to [`SubscriberTier::Unknown`], which earns
/// no tier coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubscriberTier {
    #[default]
    Unknown,
    Tier1,
    Tier2,
    Tier3,
}

impl SubscriberTier {
    /// Bonus coefficient used by the ticket weighting formula.
    pub fn coefficient(self) -> f64 {
        match self {
            SubscriberTier::Tier1 => 1.0,
            SubscriberTier::Tier2 => 1.1,
            SubscriberTier::Tier3 => 1.2,
            SubscriberTier::Unknown => 0.0,
        }
    }

    pub fn from_raw(raw: &str) -> Self {
        match raw.trim() {
            "1000" => SubscriberTier::Tier1,
            "2000" => SubscriberTier::Tier2,
            "3000" => SubscriberTier::Tier3,
            _ => SubscriberTier::Unknown,
        }
    }

    fn as_raw(self) -> &'static str {
        match self {
            SubscriberTier::Tier1 => "1000",
            SubscriberTier::Tier2 => "2000",
            SubscriberTier::Tier3 => "3000",
            SubscriberTier::Unknown => "unknown",
        }
    }
}

impl Serialize for SubscriberTier {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_raw())
    }
}

impl<'de> Deserialize<'de> for SubscriberTier {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // Accept both string and numeric tier encodings.
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(match value {
            serde_json::Value::String(s) => SubscriberTier::from_raw(&s),
            serde_json::Value::Number(n) => n
                .as_u64()
                .map(|n| SubscriberTier::from_raw(&n.to_string()))
                .unwrap_or_default(),
            _ => SubscriberTier::Unknown,
        })
    }
}

/// A lottery participant as delivered by the server.
///
/// Immutable from the overlay's point of view; the server replaces entries
/// via upsert or full-list events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    #[serde(default)]
    pub entry_count: u32,
    #[serde(default)]
    pub is_subscriber: bool,
    #[serde(default)]
    pub subscriber_tier: SubscriberTier,
    #[serde(default)]
    pub subscribed_months: u32,
}

// ============================================================================
// Inbound events
// ============================================================================

/// Every event type the overlay consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A speech fragment, provisional (`is_interim`) or committed.
    Transcript {
        #[serde(default)]
        id: Option<String>,
        text: String,
        #[serde(default)]
        is_interim: bool,
        #[serde(default)]
        timestamp_ms: Option<u64>,
        #[serde(default)]
        expected_translations: Option<u32>,
    },
    /// A translation addressed to an earlier transcript line.
    TranscriptTranslation {
        #[serde(default)]
        id: Option<String>,
        translation: String,
        #[serde(default)]
        target_language: Option<String>,
        #[serde(default)]
        source_language: Option<String>,
        #[serde(default)]
        slot_index: Option<u32>,
    },
    /// Upsert of a single participant by id.
    LotteryParticipantAdded { participant: Participant },
    /// Full participant list replacement, optionally with new ticket limits.
    LotteryParticipantsUpdated {
        #[serde(default)]
        participants: Vec<Participant>,
        #[serde(default)]
        base_tickets_limit: Option<u32>,
        #[serde(default)]
        final_tickets_limit: Option<u32>,
    },
    LotteryStarted,
    LotteryStopped,
    /// The server's authoritative draw result.
    LotteryWinner { winner: String },
    LotteryParticipantsCleared,
}

impl ServerEvent {
    /// Parses a raw socket frame; malformed or unknown payloads yield `None`.
    pub fn parse(text: &str) -> Option<ServerEvent> {
        match serde_json::from_str(text) {
            Ok(event) => Some(event),
            Err(err) => {
                tracing::debug!(%err, "dropping malformed overlay event");
                None
            }
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            ServerEvent::Transcript { .. } => EventKind::Transcript,
            ServerEvent::TranscriptTranslation { .. } => EventKind::TranscriptTranslation,
            ServerEvent::LotteryParticipantAdded { .. } => EventKind::LotteryParticipantAdded,
            ServerEvent::LotteryParticipantsUpdated { .. } => EventKind::LotteryParticipantsUpdated,
            ServerEvent::LotteryStarted => EventKind::LotteryStarted,
            ServerEvent::LotteryStopped => EventKind::LotteryStopped,
            ServerEvent::LotteryWinner { .. } => EventKind::LotteryWinner,
            ServerEvent::LotteryParticipantsCleared => EventKind::LotteryParticipantsCleared,
        }
    }
}

/// Event type tags used by the transport subscription registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Transcript,
    TranscriptTranslation,
    LotteryParticipantAdded,
    LotteryParticipantsUpdated,
    LotteryStarted,
    LotteryStopped,
    LotteryWinner,
    LotteryParticipantsCleared,
}

impl EventKind {
    /// All event kinds, for blanket subscriptions.
    pub fn all() -> &'static [EventKind] {
        &[
            EventKind::Transcript,
            EventKind::TranscriptTranslation,
            EventKind::LotteryParticipantAdded,
            EventKind::LotteryParticipantsUpdated,
            EventKind::LotteryStarted,
            EventKind::LotteryStopped,
            EventKind::LotteryWinner,
            EventKind::LotteryParticipantsCleared,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Transcript => "transcript",
            EventKind::TranscriptTranslation => "transcript_translation",
            EventKind::LotteryParticipantAdded => "lottery_participant_added",
            EventKind::LotteryParticipantsUpdated => "lottery_participants_updated",
            EventKind::LotteryStarted => "lottery_started",
            EventKind::LotteryStopped => "lottery_stopped",
            EventKind::LotteryWinner => "lottery_winner",
            EventKind::LotteryParticipantsCleared => "lottery_participants_cleared",
        }
    }
}

// ============================================================================
// Outbound commands
// ============================================================================

/// Frames the overlay sends back to the server.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Identification frame sent once per (re)connect.
    Hello { client: String, version: String },
}

impl ClientCommand {
    pub fn hello() -> Self {
        ClientCommand::Hello {
            client: "limelight".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
