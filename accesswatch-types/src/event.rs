//! Badge read events.

use std::fmt;
use std::str::FromStr;

/// Outcome of a badge read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum AccessStatus {
    /// The badge was accepted.
    #[cfg_attr(feature = "serde", serde(alias = "granted"))]
    Granted,
    /// The badge was rejected.
    #[cfg_attr(feature = "serde", serde(alias = "denied"))]
    Denied,
}

impl AccessStatus {
    /// Every status, in display order.
    pub const ALL: [AccessStatus; 2] = [AccessStatus::Granted, AccessStatus::Denied];

    /// The canonical wire form.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessStatus::Granted => "GRANTED",
            AccessStatus::Denied => "DENIED",
        }
    }
}

impl fmt::Display for AccessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a known [`AccessStatus`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError(String);

impl fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown access status '{}' (expected GRANTED or DENIED)", self.0)
    }
}

impl std::error::Error for ParseStatusError {}

impl FromStr for AccessStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GRANTED" => Ok(AccessStatus::Granted),
            "DENIED" => Ok(AccessStatus::Denied),
            _ => Err(ParseStatusError(s.to_string())),
        }
    }
}

/// A single access-control decision recorded by the backend.
///
/// Events are immutable once the server has assigned an `id`; the id is the
/// only stable identity key. `timestamp` is the time the badge was read, not
/// the time the event reached the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Event {
    /// Server-assigned identifier. The backend emits it as `_id`.
    #[cfg_attr(feature = "serde", serde(alias = "_id"))]
    pub id: String,

    /// Badge identifier as read from the card.
    pub uid: String,

    /// Decision taken for this read.
    pub status: AccessStatus,

    /// Seconds since the Unix epoch.
    #[cfg_attr(
        feature = "serde",
        serde(deserialize_with = "crate::timestamp::deserialize_seconds")
    )]
    pub timestamp: i64,
}

impl Event {
    /// Whether access was granted.
    pub fn is_granted(&self) -> bool {
        self.status == AccessStatus::Granted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_str_is_case_insensitive() {
        assert_eq!("GRANTED".parse::<AccessStatus>(), Ok(AccessStatus::Granted));
        assert_eq!("denied".parse::<AccessStatus>(), Ok(AccessStatus::Denied));
        assert_eq!(" Granted ".parse::<AccessStatus>(), Ok(AccessStatus::Granted));
        assert!("maybe".parse::<AccessStatus>().is_err());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(AccessStatus::Granted.to_string(), "GRANTED");
        assert_eq!(AccessStatus::Denied.to_string(), "DENIED");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_event_accepts_backend_document() {
        let json = r#"{"_id":"65f0c1","uid":"A1B2C3D4","status":"GRANTED","timestamp":1234567890.75}"#;
        let event: Event = serde_json::from_str(json).unwrap();

        assert_eq!(event.id, "65f0c1");
        assert_eq!(event.uid, "A1B2C3D4");
        assert!(event.is_granted());
        assert_eq!(event.timestamp, 1_234_567_890);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_event_accepts_canonical_document() {
        let json = r#"{"id":"2","uid":"DEADBEEF","status":"denied","timestamp":1234567891}"#;
        let event: Event = serde_json::from_str(json).unwrap();

        assert_eq!(event.id, "2");
        assert_eq!(event.status, AccessStatus::Denied);
        assert_eq!(event.timestamp, 1_234_567_891);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_event_rejects_unknown_status() {
        let json = r#"{"id":"1","uid":"X","status":"PENDING","timestamp":1}"#;
        assert!(serde_json::from_str::<Event>(json).is_err());
    }
}
