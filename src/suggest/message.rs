//! Suggestion service payloads

use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ServiceReply {
    #[serde(default)]
    corrected_sentence: Option<String>,
}

/// What an inbound frame means to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// The service's correction for the oldest outstanding request
    Corrected(String),
    /// Valid JSON without a correction; still answers the oldest request
    Other,
    /// Not JSON at all
    Malformed(String),
}

pub fn parse_inbound(payload: &str) -> Inbound {
    match serde_json::from_str::<ServiceReply>(payload) {
        Ok(ServiceReply {
            corrected_sentence: Some(corrected),
        }) if !corrected.is_empty() => Inbound::Corrected(corrected),
        Ok(_) => Inbound::Other,
        Err(e) => Inbound::Malformed(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corrected_sentence() {
        assert_eq!(
            parse_inbound(r#"{"corrected_sentence": "Kesimpta dosage"}"#),
            Inbound::Corrected("Kesimpta dosage".to_string())
        );
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        assert_eq!(
            parse_inbound(r#"{"corrected_sentence": "ok", "score": 0.9, "sources": []}"#),
            Inbound::Corrected("ok".to_string())
        );
    }

    #[test]
    fn test_json_without_correction() {
        assert_eq!(parse_inbound(r#"{"status": "thinking"}"#), Inbound::Other);
        assert_eq!(parse_inbound(r#"{"corrected_sentence": ""}"#), Inbound::Other);
        assert_eq!(parse_inbound(r#"{"corrected_sentence": null}"#), Inbound::Other);
    }

    #[test]
    fn test_non_json_is_malformed() {
        assert!(matches!(parse_inbound("hello"), Inbound::Malformed(_)));
    }

    #[test]
    fn test_wrong_field_type_is_malformed() {
        assert!(matches!(
            parse_inbound(r#"{"corrected_sentence": 5}"#),
            Inbound::Malformed(_)
        ));
    }
}
