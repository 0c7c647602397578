//! Document Module Tests
//!
//! Codec behavior (round trip, schema mismatch, custom decoders), the envelope
//! accessors, and document id validation.

#[cfg(test)]
mod tests {
    use crate::document::codec::{decode, decode_wrapper, encode, encode_wrapper};
    use crate::document::*;
    use crate::error::ErrorKind;
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::collections::BTreeMap;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Note {
        text: String,
        #[serde(default)]
        tags: Vec<String>,
    }

    // ============================================================
    // CODEC
    // ============================================================

    #[test]
    fn test_round_trip_preserves_document() {
        let note = Note {
            text: "hi".to_string(),
            tags: vec!["a".to_string(), "b".to_string()],
        };

        let encoded = encode(&note).unwrap();
        assert_eq!(encoded, json!({"text": "hi", "tags": ["a", "b"]}));

        let decoded = decode(encoded, &DocumentType::<Note>::new()).unwrap();
        assert_eq!(decoded, note);
    }

    #[test]
    fn test_decode_mismatch_keeps_raw_payload() {
        let payload = json!({"title": 17});

        let err = decode(payload.clone(), &DocumentType::<Note>::new()).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::DeserializationError);
        assert_eq!(err.payload(), Some(&payload));
    }

    #[test]
    fn test_encode_non_json_representable_fails() {
        // JSON object keys must be strings
        let mut grid: BTreeMap<(u8, u8), u8> = BTreeMap::new();
        grid.insert((1, 2), 3);

        let err = encode(&grid).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SerializationError);
    }

    #[test]
    fn test_custom_decoder_is_used() {
        fn legacy_note(value: &serde_json::Value) -> serde_json::Result<Note> {
            // Older clients stored the note as a bare string
            match value.as_str() {
                Some(text) => Ok(Note {
                    text: text.to_string(),
                    tags: vec![],
                }),
                None => Note::deserialize(value),
            }
        }

        let document_type = DocumentType::with_decoder(legacy_note);

        let old = decode(json!("plain"), &document_type).unwrap();
        assert_eq!(old.text, "plain");

        let new = decode(json!({"text": "structured"}), &document_type).unwrap();
        assert_eq!(new.text, "structured");
    }

    #[test]
    fn test_wrapper_round_trip_carries_coordinates() {
        let note = Note {
            text: "hi".to_string(),
            tags: vec![],
        };
        let mut payload = encode_wrapper("user-42", "note1", &note).unwrap();
        assert_eq!(payload["partition"], "user-42");
        assert_eq!(payload["id"], "note1");
        assert!(payload.get("_etag").is_none());

        // Store adds metadata
        payload["_etag"] = json!("\"v1\"");
        payload["_ts"] = json!(1_700_000_000);

        let stored = decode_wrapper(payload, &DocumentType::<Note>::new()).unwrap();
        assert_eq!(stored.value, note);
        assert_eq!(stored.partition, "user-42");
        assert_eq!(stored.id, "note1");
        assert_eq!(stored.etag.as_deref(), Some("\"v1\""));
        assert_eq!(stored.last_updated, Some(1_700_000_000));
    }

    #[test]
    fn test_decode_wrapper_reports_inner_document_on_type_mismatch() {
        let payload = json!({
            "id": "n1",
            "partition": "p",
            "document": {"text": ["not", "a", "string"]}
        });

        let err = decode_wrapper(payload, &DocumentType::<Note>::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DeserializationError);
        assert_eq!(err.payload(), Some(&json!({"text": ["not", "a", "string"]})));
    }

    #[test]
    fn test_decode_wrapper_rejects_non_document_payload() {
        let payload = json!({"unexpected": true});
        let err = decode_wrapper(payload.clone(), &DocumentType::<Note>::new()).unwrap_err();
        assert_eq!(err.payload(), Some(&payload));
    }

    // ============================================================
    // ENVELOPES
    // ============================================================

    fn stored_note(id: &str) -> StoredDocument<Note> {
        StoredDocument {
            value: Note {
                text: format!("text of {}", id),
                tags: vec![],
            },
            partition: "p".to_string(),
            id: id.to_string(),
            etag: Some("\"e\"".to_string()),
            last_updated: None,
        }
    }

    #[test]
    fn test_success_envelope_exposes_payload_only() {
        let document = Document::ok(stored_note("a"));

        assert!(document.is_ok());
        assert_eq!(document.id(), Some("a"));
        assert_eq!(document.partition(), Some("p"));
        assert_eq!(document.etag(), Some("\"e\""));
        assert!(document.error().is_none());
        assert!(document.error_kind().is_none());
    }

    #[test]
    fn test_error_envelope_exposes_error_only() {
        let document: Document<Note> = Document::err(crate::error::DataStorageError::NotFound {
            partition: "p".to_string(),
            id: "a".to_string(),
        });

        assert!(document.is_err());
        assert!(document.value().is_none());
        assert!(document.etag().is_none());
        assert_eq!(document.error_kind(), Some(ErrorKind::NotFound));
        assert!(document.into_value().is_err());
    }

    #[test]
    fn test_map_keeps_metadata() {
        let document = Document::ok(stored_note("a")).map(|note| note.text.len());
        assert_eq!(document.value(), Some(&"text of a".len()));
        assert_eq!(document.id(), Some("a"));
    }

    #[test]
    fn test_page_next_options() {
        let last: Page<Note> = Page {
            items: vec![Document::ok(stored_note("a"))],
            continuation_token: None,
        };
        assert!(!last.has_more());
        assert!(last.next_options(Some(10)).is_none());

        let first: Page<Note> = Page {
            items: vec![Document::ok(stored_note("a")), Document::ok(stored_note("b"))],
            continuation_token: Some("b".to_string()),
        };
        assert_eq!(
            first.next_options(Some(2)),
            Some(ListOptions {
                page_size: Some(2),
                continuation_token: Some("b".to_string()),
            })
        );
        assert_eq!(first.values().count(), 2);
    }

    // ============================================================
    // DOCUMENT IDS
    // ============================================================

    #[test]
    fn test_document_id_validation() {
        for ok in ["note1", "a b", "ünïcode", "with-dash_and.dot", "42"] {
            assert!(validate_document_id(ok).is_ok(), "{} should be valid", ok);
        }
        for bad in ["", "a/b", "a\\b", "what?", "#tag"] {
            let err = validate_document_id(bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "{} should be invalid", bad);
        }
        assert!(validate_document_id(&"x".repeat(MAX_DOCUMENT_ID_LEN)).is_ok());
        assert!(validate_document_id(&"x".repeat(MAX_DOCUMENT_ID_LEN + 1)).is_err());
    }
}
