//! # Payload Builder
//!
//! Builds the string that gets hidden inside the cover image, computes its
//! integrity hash, and parses it back out.
//!
//! ## Canonical encoding
//!
//! The hash is SHA-256 over a canonical JSON rendering of the four base fields:
//!
//! ```text
//! {"device_id": "deviceA", "recipient": "deviceB", "secret": "...", "timestamp": "..."}
//! ```
//!
//! - keys sorted lexicographically, so field order never matters
//! - `", "` between members, `": "` between key and value
//! - everything outside printable ASCII escaped as `\uXXXX` (UTF-16 surrogate
//!   pairs above the BMP)
//!
//! The exact bytes matter: ledgers written by earlier deployments hash this same
//! form, and their records must keep verifying.

use std::collections::BTreeMap;
use std::io::{self, Write};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::ser::{Formatter, Serializer};
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// The four base fields covered by the integrity hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageFields {
    pub recipient: String,
    pub device_id: String,
    pub secret: String,
    pub timestamp: String,
}

/// The payload as recovered from an image: base fields plus the carried hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedPayload {
    pub fields: MessageFields,
    pub hash: String,
}

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("payload carries no hash")]
    MissingHash,

    #[error("payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Render an issuance time the way it is stored: UTC, microseconds, trailing `Z`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// JSON formatter with spaced separators and ASCII-only output.
struct CanonicalFormatter;

impl Formatter for CanonicalFormatter {
    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        writer.write_all(b": ")
    }

    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        for c in fragment.chars() {
            if (' '..='~').contains(&c) {
                writer.write_all(&[c as u8])?;
            } else {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

/// Canonical byte encoding of the base fields (see module docs).
pub fn canonical_bytes(fields: &MessageFields) -> Result<Vec<u8>, PayloadError> {
    let sorted: BTreeMap<&str, &str> = [
        ("recipient", fields.recipient.as_str()),
        ("device_id", fields.device_id.as_str()),
        ("secret", fields.secret.as_str()),
        ("timestamp", fields.timestamp.as_str()),
    ]
    .into_iter()
    .collect();

    let mut out = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut out, CanonicalFormatter);
    sorted.serialize(&mut serializer)?;
    Ok(out)
}

/// SHA-256 of the canonical encoding, as 64 lowercase hex characters.
pub fn compute_hash(fields: &MessageFields) -> Result<String, PayloadError> {
    let bytes = canonical_bytes(fields)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

#[derive(Serialize)]
struct PayloadRef<'a> {
    recipient: &'a str,
    device_id: &'a str,
    secret: &'a str,
    timestamp: &'a str,
    hash: &'a str,
}

/// Merge the base fields and their hash into the JSON object that gets embedded.
pub fn build_payload(fields: &MessageFields, hash: &str) -> Result<String, PayloadError> {
    Ok(serde_json::to_string(&PayloadRef {
        recipient: &fields.recipient,
        device_id: &fields.device_id,
        secret: &fields.secret,
        timestamp: &fields.timestamp,
        hash,
    })?)
}

/// Inverse of [`build_payload`].
///
/// # Errors
/// - `PayloadError::Malformed`: not a JSON object, or a base field is missing or not a string
/// - `PayloadError::MissingHash`: `hash` is absent, empty, or not a string
pub fn parse_payload(raw: &str) -> Result<EmbeddedPayload, PayloadError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| PayloadError::Malformed(e.to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| PayloadError::Malformed("payload is not a JSON object".to_string()))?;

    let field = |name: &str| -> Result<String, PayloadError> {
        object
            .get(name)
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| PayloadError::Malformed(format!("missing or non-string field `{name}`")))
    };

    let fields = MessageFields {
        recipient: field("recipient")?,
        device_id: field("device_id")?,
        secret: field("secret")?,
        timestamp: field("timestamp")?,
    };

    let hash = object
        .get("hash")
        .and_then(Value::as_str)
        .filter(|h| !h.is_empty())
        .ok_or(PayloadError::MissingHash)?
        .to_owned();

    Ok(EmbeddedPayload { fields, hash })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn fields(secret: &str) -> MessageFields {
        MessageFields {
            recipient: "deviceB".into(),
            device_id: "deviceA".into(),
            secret: secret.into(),
            timestamp: "2024-01-01T00:00:00.000000Z".into(),
        }
    }

    #[test]
    fn canonical_form_sorts_keys_and_spaces_separators() {
        let bytes = canonical_bytes(&fields("meet at dawn")).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"device_id": "deviceA", "recipient": "deviceB", "secret": "meet at dawn", "timestamp": "2024-01-01T00:00:00.000000Z"}"#
        );
    }

    #[test]
    fn hash_matches_known_digest() {
        assert_eq!(
            compute_hash(&fields("meet at dawn")).unwrap(),
            "33bb39638df254f1618f9530e091413784637ff9d297e0da50505232008ccd97"
        );
    }

    #[test]
    fn non_ascii_is_escaped_as_utf16_units() {
        let f = fields("café ☕ 😀 \u{7f}\n\"q\"");
        let canonical = String::from_utf8(canonical_bytes(&f).unwrap()).unwrap();
        assert!(canonical.contains(r#""secret": "caf\u00e9 \u2615 \ud83d\ude00 \u007f\n\"q\"""#));
        assert_eq!(
            compute_hash(&f).unwrap(),
            "34cd347248a0d7eeb08985488e444b6dd61ab15ffc5dda5ab8fd16b9449a943d"
        );
    }

    #[test]
    fn payload_round_trips() {
        let f = fields("meet at dawn");
        let hash = compute_hash(&f).unwrap();
        let raw = build_payload(&f, &hash).unwrap();
        let parsed = parse_payload(&raw).unwrap();
        assert_eq!(parsed.fields, f);
        assert_eq!(parsed.hash, hash);
    }

    #[test]
    fn empty_fields_are_allowed() {
        let f = MessageFields {
            recipient: String::new(),
            device_id: String::new(),
            secret: String::new(),
            timestamp: String::new(),
        };
        let hash = compute_hash(&f).unwrap();
        assert_eq!(hash.len(), 64);
        assert_eq!(parse_payload(&build_payload(&f, &hash).unwrap()).unwrap().fields, f);
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(matches!(parse_payload("not json"), Err(PayloadError::Malformed(_))));
        assert!(matches!(parse_payload("[1, 2]"), Err(PayloadError::Malformed(_))));
        assert!(matches!(
            parse_payload(r#"{"recipient": "b", "device_id": "a", "timestamp": "t", "hash": "h"}"#),
            Err(PayloadError::Malformed(_))
        ));
        assert!(matches!(
            parse_payload(r#"{"recipient": 7, "device_id": "a", "secret": "s", "timestamp": "t", "hash": "h"}"#),
            Err(PayloadError::Malformed(_))
        ));
    }

    #[test]
    fn parse_reports_missing_hash() {
        let base = r#""recipient": "b", "device_id": "a", "secret": "s", "timestamp": "t""#;
        for raw in [
            format!("{{{base}}}"),
            format!(r#"{{{base}, "hash": ""}}"#),
            format!(r#"{{{base}, "hash": null}}"#),
        ] {
            assert!(matches!(parse_payload(&raw), Err(PayloadError::MissingHash)), "{raw}");
        }
    }

    #[test]
    fn timestamps_are_fixed_width() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(format_timestamp(at), "2024-05-01T12:00:00.000000Z");
    }

    proptest! {
        #[test]
        fn hash_ignores_field_order(
            recipient in ".*",
            device_id in ".*",
            secret in ".*",
            timestamp in ".*",
        ) {
            let f = MessageFields { recipient, device_id, secret, timestamp };

            // Same logical record arriving with keys in a different order.
            let shuffled = format!(
                r#"{{"timestamp": {}, "secret": {}, "device_id": {}, "recipient": {}, "hash": "x"}}"#,
                serde_json::to_string(&f.timestamp).unwrap(),
                serde_json::to_string(&f.secret).unwrap(),
                serde_json::to_string(&f.device_id).unwrap(),
                serde_json::to_string(&f.recipient).unwrap(),
            );
            let reparsed = parse_payload(&shuffled).unwrap().fields;

            prop_assert_eq!(compute_hash(&f).unwrap(), compute_hash(&reparsed).unwrap());
            prop_assert_eq!(compute_hash(&f).unwrap(), compute_hash(&f.clone()).unwrap());
        }
    }
}
