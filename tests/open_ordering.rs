//! Open must run its checks in a fixed order, and sealing must never repeat
//! key material.

mod common;

use std::collections::HashSet;

use strongbox::{codec, hasher, IntegrityFailure, VaultError};

#[test]
fn test_aead_failure_precedes_hash_and_signature() {
    // Ciphertext, digest and signature are all wrong: only the AEAD
    // failure may surface.
    let (_root, _config, pipeline) = common::pipeline();
    let mut record = pipeline.seal(b"first").unwrap();
    let other = pipeline.seal(b"second").unwrap();

    record.ciphertext_b64 = other.ciphertext_b64;
    record.content_digest_hex = hasher::digest(b"third");
    record.signature_b64 = codec::encode(&[0u8; 256]);

    assert!(matches!(pipeline.open(&record), Err(VaultError::Authentication)));
}

#[test]
fn test_hash_check_precedes_signature_check() {
    let (_root, _config, pipeline) = common::pipeline();
    let mut record = pipeline.seal(b"content").unwrap();
    record.content_digest_hex = hasher::digest(b"not the content");
    record.signature_b64 = codec::encode(b"garbage signature");

    assert!(matches!(
        pipeline.open(&record),
        Err(VaultError::Integrity(IntegrityFailure::HashMismatch))
    ));
}

#[test]
fn test_whole_record_swap_still_opens() {
    // All four fields travel together; a full replacement is a valid record.
    let (_root, _config, pipeline) = common::pipeline();
    let record = pipeline.seal(b"original").unwrap();
    let replacement = pipeline.seal(b"replacement").unwrap();

    assert_eq!(pipeline.open(&record).unwrap(), b"original");
    assert_eq!(pipeline.open(&replacement).unwrap(), b"replacement");
}

#[test]
fn test_keys_and_nonces_are_never_reused() {
    let (_root, _config, pipeline) = common::pipeline();
    let mut keys = HashSet::new();
    let mut nonces = HashSet::new();

    for _ in 0..32 {
        let record = pipeline.seal(b"identical plaintext").unwrap();
        assert!(keys.insert(record.key_b64), "record key repeated");
        assert!(nonces.insert(record.nonce_b64), "nonce repeated");
    }
}

#[test]
fn test_roundtrip_over_assorted_payloads() {
    let (_root, _config, pipeline) = common::pipeline();
    let payloads: Vec<Vec<u8>> = vec![
        Vec::new(),
        vec![0],
        (0..=255).collect(),
        "naïve façade 🔐".as_bytes().to_vec(),
        vec![0xA5; 64 * 1024],
    ];
    for payload in payloads {
        let record = pipeline.seal(&payload).unwrap();
        assert_eq!(pipeline.open(&record).unwrap(), payload);
    }
}
