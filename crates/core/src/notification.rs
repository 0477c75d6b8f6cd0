//! Notification events and the real-time wire format.
//!
//! A [`NotificationEvent`] is created at the moment of a state change (reveal,
//! new comment, view milestone) and is never persisted. [`NotificationEvent::deliveries`]
//! turns it into the concrete [`ServerMessage`]s pushed to each addressable
//! [`ChannelScope`].

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Channel scopes
// ---------------------------------------------------------------------------

/// An addressable real-time broadcast group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelScope {
    /// Everyone currently watching one artwork (anonymous viewers included).
    Artwork(DbId),
    /// One authenticated user's personal notification channel.
    User(DbId),
}

impl fmt::Display for ChannelScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Artwork(id) => write!(f, "artwork_{id}"),
            Self::User(id) => write!(f, "user_{id}"),
        }
    }
}

// ---------------------------------------------------------------------------
// NotificationEvent
// ---------------------------------------------------------------------------

/// Minimal display metadata about the artwork an event concerns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtworkRef {
    pub id: DbId,
    pub title: String,
    pub artist_id: DbId,
    pub artist_name: String,
}

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationKind {
    ArtworkRevealed,
    NewComment {
        comment_id: DbId,
        author_id: DbId,
        author_name: String,
    },
    ViewMilestone {
        view_count: i64,
    },
}

/// A transient notification, consumed by connected subscribers on delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub artwork: ArtworkRef,
    pub kind: NotificationKind,
    pub timestamp: Timestamp,
}

impl NotificationEvent {
    fn new(artwork: ArtworkRef, kind: NotificationKind) -> Self {
        Self {
            artwork,
            kind,
            timestamp: Utc::now(),
        }
    }

    pub fn artwork_revealed(artwork: ArtworkRef) -> Self {
        Self::new(artwork, NotificationKind::ArtworkRevealed)
    }

    pub fn new_comment(
        artwork: ArtworkRef,
        comment_id: DbId,
        author_id: DbId,
        author_name: impl Into<String>,
    ) -> Self {
        Self::new(
            artwork,
            NotificationKind::NewComment {
                comment_id,
                author_id,
                author_name: author_name.into(),
            },
        )
    }

    pub fn view_milestone(artwork: ArtworkRef, view_count: i64) -> Self {
        Self::new(artwork, NotificationKind::ViewMilestone { view_count })
    }

    /// Snake-case event name, used in logs.
    pub fn event_type(&self) -> &'static str {
        match self.kind {
            NotificationKind::ArtworkRevealed => "artwork_revealed",
            NotificationKind::NewComment { .. } => "new_comment",
            NotificationKind::ViewMilestone { .. } => "view_milestone",
        }
    }

    /// Resolve the messages to push and the scope each one goes to.
    ///
    /// Every event reaches the artwork scope. The artist's personal scope is
    /// included too, except for comments the artist wrote on their own work.
    pub fn deliveries(&self) -> Vec<Delivery> {
        let artwork = &self.artwork;
        let artwork_scope = ChannelScope::Artwork(artwork.id);
        let artist_scope = ChannelScope::User(artwork.artist_id);

        match &self.kind {
            NotificationKind::ArtworkRevealed => vec![
                Delivery {
                    scope: artwork_scope,
                    message: ServerMessage::ArtworkRevealed {
                        artwork: RevealedArtwork {
                            id: artwork.id,
                            title: artwork.title.clone(),
                            artist: artwork.artist_name.clone(),
                            is_revealed: true,
                        },
                    },
                },
                Delivery {
                    scope: artist_scope,
                    message: ServerMessage::Notification {
                        message: format!("Your artwork \"{}\" has been revealed!", artwork.title),
                        data: NotificationData::ArtworkRevealed {
                            artwork_id: artwork.id,
                        },
                    },
                },
            ],
            NotificationKind::NewComment {
                comment_id,
                author_id,
                author_name,
            } => {
                let data = NotificationData::NewComment {
                    artwork_id: artwork.id,
                    comment_id: *comment_id,
                    user: author_name.clone(),
                };
                let mut out = vec![Delivery {
                    scope: artwork_scope,
                    message: ServerMessage::Notification {
                        message: format!("New comment on \"{}\"", artwork.title),
                        data: data.clone(),
                    },
                }];
                if *author_id != artwork.artist_id {
                    out.push(Delivery {
                        scope: artist_scope,
                        message: ServerMessage::Notification {
                            message: format!("New comment on your artwork \"{}\"", artwork.title),
                            data,
                        },
                    });
                }
                out
            }
            NotificationKind::ViewMilestone { view_count } => {
                let data = NotificationData::ViewMilestone {
                    artwork_id: artwork.id,
                    view_count: *view_count,
                };
                vec![
                    Delivery {
                        scope: artwork_scope,
                        message: ServerMessage::Notification {
                            message: format!(
                                "\"{}\" has reached {view_count} views!",
                                artwork.title
                            ),
                            data: data.clone(),
                        },
                    },
                    Delivery {
                        scope: artist_scope,
                        message: ServerMessage::Notification {
                            message: format!(
                                "Your artwork \"{}\" has reached {view_count} views!",
                                artwork.title
                            ),
                            data,
                        },
                    },
                ]
            }
        }
    }
}

/// One message addressed to one scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub scope: ChannelScope,
    pub message: ServerMessage,
}

// ---------------------------------------------------------------------------
// Wire messages
// ---------------------------------------------------------------------------

/// `artwork` payload of an `artwork_status` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtworkStatusInfo {
    pub id: DbId,
    pub title: String,
}

/// `artwork` payload of an `artwork_revealed` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealedArtwork {
    pub id: DbId,
    pub title: String,
    /// Artist username.
    pub artist: String,
    pub is_revealed: bool,
}

/// Typed payload nested inside a `notification` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationData {
    NewComment {
        artwork_id: DbId,
        comment_id: DbId,
        user: String,
    },
    ViewMilestone {
        artwork_id: DbId,
        view_count: i64,
    },
    ArtworkRevealed {
        artwork_id: DbId,
    },
}

/// Server → client message, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Current state, sent on connect and on `check_status`.
    ArtworkStatus {
        is_revealed: bool,
        artwork: ArtworkStatusInfo,
    },
    /// Hidden → revealed transition.
    ArtworkRevealed { artwork: RevealedArtwork },
    /// Generic personal or per-artwork notification.
    Notification {
        message: String,
        data: NotificationData,
    },
    /// Greeting on the personal notification channel.
    Welcome { message: String },
}

impl ServerMessage {
    pub fn artwork_status(id: DbId, title: impl Into<String>, is_revealed: bool) -> Self {
        Self::ArtworkStatus {
            is_revealed,
            artwork: ArtworkStatusInfo {
                id,
                title: title.into(),
            },
        }
    }

    pub fn welcome() -> Self {
        Self::Welcome {
            message: "Connected to notification service".into(),
        }
    }

    /// Serialize to the JSON text frame sent over the socket.
    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Client → server message on the artwork channel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    CheckStatus,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;

    fn artwork() -> ArtworkRef {
        ArtworkRef {
            id: 7,
            title: "Night Field".into(),
            artist_id: 3,
            artist_name: "alice".into(),
        }
    }

    fn to_value(message: &ServerMessage) -> Value {
        serde_json::from_str(&message.to_text().unwrap()).unwrap()
    }

    #[test]
    fn scope_names() {
        assert_eq!(ChannelScope::Artwork(7).to_string(), "artwork_7");
        assert_eq!(ChannelScope::User(3).to_string(), "user_3");
    }

    #[test]
    fn reveal_goes_to_artwork_and_artist() {
        let deliveries = NotificationEvent::artwork_revealed(artwork()).deliveries();
        assert_eq!(deliveries.len(), 2);

        assert_eq!(deliveries[0].scope, ChannelScope::Artwork(7));
        assert_eq!(
            to_value(&deliveries[0].message),
            json!({
                "type": "artwork_revealed",
                "artwork": {"id": 7, "title": "Night Field", "artist": "alice", "is_revealed": true}
            })
        );

        assert_eq!(deliveries[1].scope, ChannelScope::User(3));
        let personal = to_value(&deliveries[1].message);
        assert_eq!(personal["type"], "notification");
        assert_eq!(personal["data"], json!({"type": "artwork_revealed", "artwork_id": 7}));
    }

    #[test]
    fn comment_by_other_user_notifies_artist() {
        let deliveries = NotificationEvent::new_comment(artwork(), 11, 5, "bob").deliveries();
        let scopes: Vec<_> = deliveries.iter().map(|d| d.scope).collect();
        assert_eq!(scopes, vec![ChannelScope::Artwork(7), ChannelScope::User(3)]);

        let personal = to_value(&deliveries[1].message);
        assert_eq!(
            personal["data"],
            json!({"type": "new_comment", "artwork_id": 7, "comment_id": 11, "user": "bob"})
        );
    }

    #[test]
    fn comment_by_artist_skips_personal_scope() {
        let deliveries = NotificationEvent::new_comment(artwork(), 12, 3, "alice").deliveries();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].scope, ChannelScope::Artwork(7));
    }

    #[test]
    fn milestone_payload_carries_count() {
        let deliveries = NotificationEvent::view_milestone(artwork(), 50).deliveries();
        assert_eq!(deliveries.len(), 2);
        let personal = to_value(&deliveries[1].message);
        assert_eq!(
            personal["data"],
            json!({"type": "view_milestone", "artwork_id": 7, "view_count": 50})
        );
        assert!(personal["message"].as_str().unwrap().contains("50 views"));
    }

    #[test]
    fn status_and_welcome_shapes() {
        assert_eq!(
            to_value(&ServerMessage::artwork_status(7, "Night Field", false)),
            json!({"type": "artwork_status", "is_revealed": false, "artwork": {"id": 7, "title": "Night Field"}})
        );
        assert_eq!(to_value(&ServerMessage::welcome())["type"], "welcome");
    }

    #[test]
    fn client_check_status_parses() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"check_status"}"#).unwrap();
        assert_eq!(msg, ClientMessage::CheckStatus);
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"dance"}"#).is_err());
    }

    #[test]
    fn event_type_names() {
        assert_eq!(
            NotificationEvent::artwork_revealed(artwork()).event_type(),
            "artwork_revealed"
        );
        assert_eq!(
            NotificationEvent::view_milestone(artwork(), 10).event_type(),
            "view_milestone"
        );
    }
}
