//! Strongly-typed identifiers for sessions and messages.
//!
//! Identifiers are ULIDs, so they are unique without coordination and sort
//! by creation time. Callers treat them as opaque strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// A session or message id that is not a ULID, with or without its tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// `SessionId` or `MessageId`.
    pub id_type: &'static str,
    pub reason: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {}", self.id_type, self.reason)
    }
}

impl std::error::Error for ParseIdError {}

/// Declares an id newtype that chat clients see as `{prefix}_{ulid}`.
///
/// Parsing accepts the bare ULID too, so ids pasted without their prefix
/// still resolve to the same session or message.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Ulid);

        impl $name {
            /// Mints a fresh id. Ids minted in a later millisecond sort after
            /// this one.
            #[must_use]
            pub fn new() -> Self {
                Self(Ulid::new())
            }

            #[must_use]
            pub const fn as_ulid(&self) -> Ulid {
                self.0
            }

            /// Tag written before the ULID, such as `sess` or `msg`.
            #[must_use]
            pub const fn prefix() -> &'static str {
                $prefix
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}_{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s.trim();
                let ulid_str = raw
                    .strip_prefix(concat!($prefix, "_"))
                    .unwrap_or(raw);

                Ulid::from_str(ulid_str)
                    .map(Self)
                    .map_err(|e| ParseIdError {
                        id_type: stringify!($name),
                        reason: e.to_string(),
                    })
            }
        }

        impl From<Ulid> for $name {
            fn from(ulid: Ulid) -> Self {
                Self(ulid)
            }
        }
    };
}

define_id!(
    /// Unique identifier for a conversation session.
    SessionId,
    "sess"
);

define_id!(
    /// Unique identifier for a transcript message.
    MessageId,
    "msg"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_display_format() {
        let id = SessionId::new();
        assert!(id.to_string().starts_with("sess_"));
    }

    #[test]
    fn message_id_display_format() {
        let id = MessageId::new();
        assert!(id.to_string().starts_with("msg_"));
    }

    #[test]
    fn parse_with_prefix() {
        let id = SessionId::new();
        let parsed: SessionId = id.to_string().parse().expect("should parse");
        assert_eq!(id, parsed);
    }

    #[test]
    fn parse_bare_ulid_and_surrounding_whitespace() {
        let ulid = Ulid::new();
        let id: SessionId = format!("  {ulid} ").parse().expect("should parse");
        assert_eq!(id.as_ulid(), ulid);
    }

    #[test]
    fn parse_rejects_foreign_prefix() {
        let msg = MessageId::new().to_string();
        let err = msg.parse::<SessionId>().unwrap_err();
        assert_eq!(err.id_type, "SessionId");
    }

    #[test]
    fn prefix_is_the_display_tag() {
        assert_eq!(SessionId::prefix(), "sess");
        assert_eq!(MessageId::prefix(), "msg");

        let id = MessageId::new();
        assert_eq!(id.to_string(), format!("msg_{}", id.as_ulid()));
    }

    #[test]
    fn parse_error_names_the_id_type() {
        let err = "sess_not-a-ulid".parse::<SessionId>().unwrap_err();
        assert!(err.to_string().starts_with("invalid SessionId: "));
    }

    #[test]
    fn ids_are_unique() {
        use std::collections::HashSet;

        let ids: HashSet<SessionId> = (0..64).map(|_| SessionId::new()).collect();
        assert_eq!(ids.len(), 64);
    }

    #[test]
    fn serializes_as_bare_ulid() {
        let id = SessionId::new();
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, format!("\"{}\"", id.as_ulid()));
    }
}
