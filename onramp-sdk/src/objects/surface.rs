//! Messages posted by the embedded payment page.
//!
//! Each message is a JSON object:
//!
//! ```text
//! { "eventName": "onramp_api.load_success", "data": { "errorCode": "...", "errorMessage": "..." } }
//! ```
//!
//! The hosted page namespaces its event names with `onramp_api.`; bare
//! names are accepted as well. Only `eventName` is required: error fields of
//! any JSON type are rendered as text, and a `data` that is not an object is
//! treated as absent.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Namespace prefix the hosted page puts in front of every event name.
pub const EVENT_NAMESPACE: &str = "onramp_api.";

/// Optional error details attached to an event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceEventData {
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub error_code: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub error_message: Option<String>,
}

impl SurfaceEventData {
    /// The most descriptive error text available: the message, then the
    /// code. Blank strings are skipped.
    pub fn error_text(&self) -> Option<&str> {
        [&self.error_message, &self.error_code]
            .into_iter()
            .flatten()
            .map(|s| s.as_str())
            .find(|s| !s.trim().is_empty())
    }
}

/// A raw message from the embedded payment page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceMessage {
    pub event_name: String,
    #[serde(
        default,
        deserialize_with = "lenient_data",
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Option<SurfaceEventData>,
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn lenient_data<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<SurfaceEventData>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(value @ Value::Object(_)) => serde_json::from_value(value).ok(),
        _ => None,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum SurfaceMessageError {
    #[error("malformed payment page message: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl SurfaceMessage {
    /// Parse a message as delivered by the embedded browser view.
    pub fn parse(raw: &str) -> Result<Self, SurfaceMessageError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn event(&self) -> SurfaceEvent {
        SurfaceEvent::from_name(&self.event_name)
    }
}

/// Lifecycle events of the embedded payment page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SurfaceEvent {
    LoadPending,
    LoadSuccess,
    LoadError,
    CommitSuccess,
    CommitError,
    Cancel,
    PollingStart,
    PollingSuccess,
    PollingError,
    /// Anything this client does not know about yet.
    Unknown(String),
}

impl SurfaceEvent {
    pub fn from_name(name: &str) -> Self {
        let bare = name.strip_prefix(EVENT_NAMESPACE).unwrap_or(name);
        match bare {
            "load_pending" => Self::LoadPending,
            "load_success" => Self::LoadSuccess,
            "load_error" => Self::LoadError,
            "commit_success" => Self::CommitSuccess,
            "commit_error" => Self::CommitError,
            "cancel" => Self::Cancel,
            "polling_start" => Self::PollingStart,
            "polling_success" => Self::PollingSuccess,
            "polling_error" => Self::PollingError,
            _ => Self::Unknown(name.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::LoadPending => "load_pending",
            Self::LoadSuccess => "load_success",
            Self::LoadError => "load_error",
            Self::CommitSuccess => "commit_success",
            Self::CommitError => "commit_error",
            Self::Cancel => "cancel",
            Self::PollingStart => "polling_start",
            Self::PollingSuccess => "polling_success",
            Self::PollingError => "polling_error",
            Self::Unknown(name) => name,
        }
    }
}

impl std::fmt::Display for SurfaceEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_message_with_error_data() {
        let msg = SurfaceMessage::parse(
            r#"{"eventName":"load_error","data":{"errorMessage":"timeout"}}"#,
        )
        .unwrap();
        assert_eq!(msg.event(), SurfaceEvent::LoadError);
        assert_eq!(msg.data.unwrap().error_text(), Some("timeout"));
    }

    #[test]
    fn test_namespaced_and_bare_names() {
        assert_eq!(
            SurfaceEvent::from_name("onramp_api.commit_success"),
            SurfaceEvent::CommitSuccess
        );
        assert_eq!(SurfaceEvent::from_name("cancel"), SurfaceEvent::Cancel);
        assert_eq!(
            SurfaceEvent::from_name("onramp_api.something_new"),
            SurfaceEvent::Unknown("onramp_api.something_new".to_string())
        );
    }

    #[test]
    fn test_non_string_error_fields_become_text() {
        let msg = SurfaceMessage::parse(
            r#"{"eventName":"onramp_api.load_error","data":{"errorCode":500,"errorMessage":null}}"#,
        )
        .unwrap();
        assert_eq!(msg.event(), SurfaceEvent::LoadError);
        let data = msg.data.unwrap();
        assert_eq!(data.error_code.as_deref(), Some("500"));
        assert_eq!(data.error_message, None);
        assert_eq!(data.error_text(), Some("500"));
    }

    #[test]
    fn test_non_object_data_is_dropped() {
        for raw in [
            r#"{"eventName":"onramp_api.commit_error","data":"declined"}"#,
            r#"{"eventName":"onramp_api.commit_error","data":[1,2]}"#,
            r#"{"eventName":"onramp_api.commit_error","data":null}"#,
        ] {
            let msg = SurfaceMessage::parse(raw).unwrap();
            assert_eq!(msg.event(), SurfaceEvent::CommitError);
            assert_eq!(msg.data, None);
        }
    }

    #[test]
    fn test_malformed_message() {
        assert!(SurfaceMessage::parse("not json").is_err());
        assert!(SurfaceMessage::parse(r#"{"data":{}}"#).is_err());
        assert!(SurfaceMessage::parse(r#"{"eventName":42}"#).is_err());
    }

    #[test]
    fn test_error_text_falls_back_to_code() {
        let data = SurfaceEventData {
            error_code: Some("ERROR_CODE_GUEST_CARD_SOFT_DECLINED".to_string()),
            error_message: Some("  ".to_string()),
        };
        assert_eq!(data.error_text(), Some("ERROR_CODE_GUEST_CARD_SOFT_DECLINED"));
        assert_eq!(SurfaceEventData::default().error_text(), None);
    }
}
