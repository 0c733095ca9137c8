use nostr_sdk::prelude::*;

/// NIP-01 id of an event, recomputed from its canonical fields
pub fn event_hash(event: &Event) -> EventId {
    EventId::new(
        &event.pubkey,
        &event.created_at,
        &event.kind,
        &event.tags,
        &event.content,
    )
}

/// True only if the id matches the content and the signature matches the declared author.
pub fn verify(event: &Event) -> bool {
    if event_hash(event) != event.id {
        tracing::debug!(id = %event.id, "event id does not match its content");
        return false;
    }
    event.verify().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_note(content: &str) -> Event {
        let keys = Keys::generate();
        EventBuilder::new(Kind::TextNote, content)
            .tag(Tag::public_key(Keys::generate().public_key()))
            .sign_with_keys(&keys)
            .expect("Failed to sign event")
    }

    fn tamper(event: &Event, field: &str, value: serde_json::Value) -> Event {
        let mut json: serde_json::Value = serde_json::from_str(&event.as_json()).unwrap();
        json[field] = value;
        Event::from_json(json.to_string()).expect("Failed to parse tampered event")
    }

    #[test]
    fn test_event_hash_matches_signed_id() {
        let event = signed_note("list");
        assert_eq!(event_hash(&event), event.id);
        assert!(verify(&event));
    }

    #[test]
    fn test_tampered_content_is_rejected() {
        let event = signed_note("add milk");
        let forged = tamper(&event, "content", serde_json::json!("delete 1"));
        assert!(!verify(&forged));
    }

    #[test]
    fn test_swapped_author_is_rejected() {
        let event = signed_note("list");
        let other = Keys::generate().public_key().to_hex();
        let forged = tamper(&event, "pubkey", serde_json::json!(other));
        assert!(!verify(&forged));
    }

    #[test]
    fn test_recomputed_id_with_foreign_signature_is_rejected() {
        let event = signed_note("list");
        let other = signed_note("something else");
        let forged = tamper(&event, "sig", serde_json::json!(other.sig.to_string()));
        assert!(!verify(&forged));
    }
}
