/// Game params, snapshots and session events.
pub mod game;
/// Health check payloads.
pub mod health;
pub mod rpc;

/// Serde helpers rendering [`time::OffsetDateTime`] as RFC 3339 strings.
pub(crate) mod timestamp {
    use serde::Serializer;
    use time::{OffsetDateTime, format_description::well_known::Rfc3339};

    fn format(value: &OffsetDateTime) -> String {
        value
            .format(&Rfc3339)
            .unwrap_or_else(|_| "invalid-timestamp".into())
    }

    pub fn serialize<S: Serializer>(
        value: &OffsetDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(value))
    }

    pub fn serialize_option<S: Serializer>(
        value: &Option<OffsetDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => serializer.serialize_some(&format(value)),
            None => serializer.serialize_none(),
        }
    }
}
