use lgc_types::ObjectId;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag that is prepended to every hash
/// computation, so bytes hashed under one domain never collide with the same
/// bytes hashed under another.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for serialized object nodes.
    pub const NODE: Self = Self {
        domain: "lgc-node-v1",
    };

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> ObjectId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        ObjectId::from_hash(*hasher.finalize().as_bytes())
    }

    /// Verify that data produces the expected object ID.
    pub fn verify(&self, data: &[u8], expected: &ObjectId) -> bool {
        self.hash(data) == *expected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let data = br#"{"kind":"Opening"}"#;
        assert_eq!(ContentHasher::NODE.hash(data), ContentHasher::NODE.hash(data));
    }

    #[test]
    fn different_domains_produce_different_hashes() {
        let data = b"same content";
        assert_ne!(
            ContentHasher::NODE.hash(data),
            ContentHasher {
                domain: "lgc-other-v1"
            }
            .hash(data)
        );
        assert_ne!(ContentHasher::NODE.hash(data), ObjectId::from_bytes(data));
    }

    #[test]
    fn verify_detects_tampering() {
        let id = ContentHasher::NODE.hash(b"original");
        assert!(ContentHasher::NODE.verify(b"original", &id));
        assert!(!ContentHasher::NODE.verify(b"tampered", &id));
    }

    #[test]
    fn json_key_order_does_not_change_the_hash() {
        let a = serde_json::json!({"b": 1, "a": 2});
        let mut map = serde_json::Map::new();
        map.insert("a".into(), 2.into());
        map.insert("b".into(), 1.into());
        let b = serde_json::Value::Object(map);
        assert_eq!(
            ContentHasher::NODE.hash(&serde_json::to_vec(&a).unwrap()),
            ContentHasher::NODE.hash(&serde_json::to_vec(&b).unwrap())
        );
    }
}
