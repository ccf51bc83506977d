use super::*;
use crate::error::error_codes;
use crate::pqc::PqcAlgorithm;
use crate::registry::lookup;

#[test]
fn test_p256_mlkem768_public_layout() {
    let key = CompositeKey::generate("p256_mlkem768").unwrap();
    let pk_len = PqcAlgorithm::MlKem768.engine().unwrap().public_key_len();
    let public = key.public_bytes().unwrap();

    assert_eq!(public.len(), 4 + 65 + pk_len);
    assert_eq!(&public[..4], &[0, 0, 0, 65]);
    assert_eq!(key.comp_pub(0).unwrap(), &public[4..69]);
    assert_eq!(key.comp_pub(1).unwrap(), &public[69..]);
    assert_eq!(key.numkeys(), 2);
    assert_eq!(key.security_bits(), 128);
}

#[test]
fn test_hybrid_private_layout_has_prefix() {
    let key = CompositeKey::generate("x25519_mlkem512").unwrap();
    let private = key.private_bytes().unwrap();
    let sk_len = PqcAlgorithm::MlKem512.engine().unwrap().secret_key_len();
    assert_eq!(private.len(), 4 + 32 + sk_len);
    assert_eq!(&private[..4], &[0, 0, 0, 32]);
    assert_eq!(key.comp_priv(0).unwrap(), &private[4..36]);
}

#[test]
fn test_composite_layout_has_no_prefix() {
    let key = CompositeKey::generate("mldsa44_ed25519").unwrap();
    let engine = PqcAlgorithm::MlDsa44.engine().unwrap();
    let public = key.public_bytes().unwrap();
    assert_eq!(public.len(), engine.public_key_len() + 32);
    assert_eq!(key.comp_pub(0).unwrap(), &public[..engine.public_key_len()]);
    assert_eq!(key.comp_pub(1).unwrap().len(), 32);
}

#[test]
fn test_wire_layout_per_kind() {
    assert_eq!(WireLayout::of(lookup("x25519_mlkem768").unwrap().kind), WireLayout::Hybrid);
    assert_eq!(WireLayout::of(lookup("p256_falcon512").unwrap().kind), WireLayout::Hybrid);
    assert_eq!(WireLayout::of(lookup("mldsa44_p256").unwrap().kind), WireLayout::Composite);
    assert_eq!(WireLayout::of(lookup("mlkem768").unwrap().kind), WireLayout::Plain);
}

#[test]
fn test_compose_decompose_roundtrip() {
    let desc = lookup("mldsa65_p256").unwrap();
    let key = CompositeKey::generate(desc.name).unwrap();
    for part in [KeyPart::Public, KeyPart::Private] {
        let flat = match part {
            KeyPart::Public => key.public_bytes().unwrap(),
            KeyPart::Private => key.private_bytes().unwrap(),
        };
        let components = decompose_wire_key(desc, part, flat).unwrap();
        assert_eq!(components.len(), 2);
        let rebuilt = compose_wire_key(desc, part, &components).unwrap();
        assert_eq!(rebuilt.as_bytes(), flat);
    }
}

#[test]
fn test_allocate_uses_declared_maximum() {
    let desc = lookup("p256_mldsa44").unwrap();
    let engine = PqcAlgorithm::MlDsa44.engine().unwrap();
    let buffer = allocate(desc, KeyPart::Private).unwrap();
    assert_eq!(buffer.len(), 4 + 121 + engine.secret_key_len());
    assert!(buffer.as_bytes().iter().all(|&b| b == 0));

    let plain = allocate(lookup("mlkem768").unwrap(), KeyPart::Public).unwrap();
    assert_eq!(plain.len(), 1184);
}

#[test]
fn test_compose_into_small_buffer() {
    let desc = lookup("x25519_mlkem768").unwrap();
    let key = CompositeKey::generate(desc.name).unwrap();
    let components = decompose_wire_key(desc, KeyPart::Public, key.public_bytes().unwrap()).unwrap();

    let needed = compose_wire_key_into(desc, KeyPart::Public, &components, None).unwrap();
    let mut small = vec![0u8; needed - 1];
    let err = compose_wire_key_into(desc, KeyPart::Public, &components, Some(&mut small)).unwrap_err();
    assert_eq!(err.error_type(), "BufferTooSmall");
}

#[test]
fn test_hybrid_prefix_out_of_bounds() {
    let desc = lookup("p256_mlkem768").unwrap();
    let key = CompositeKey::generate(desc.name).unwrap();
    let mut public = key.public_bytes().unwrap().to_vec();

    // a P-256 point is exactly 65 bytes
    public[3] = 66;
    let err = component_ranges(desc, KeyPart::Public, &public).unwrap_err();
    assert_eq!(err.error_code(), error_codes::MALFORMED_KEY);

    public[0] = 0xFF;
    assert!(component_ranges(desc, KeyPart::Public, &public).is_err());
    assert!(component_ranges(desc, KeyPart::Public, &public[..3]).is_err());
}

#[test]
fn test_wrong_pqc_length_is_encoding_error() {
    let desc = lookup("p256_mlkem768").unwrap();
    let key = CompositeKey::generate(desc.name).unwrap();
    let public = key.public_bytes().unwrap();

    let err = CompositeKey::from_public_bytes(desc.name, &public[..public.len() - 1]).unwrap_err();
    assert_eq!(err.error_type(), "EncodingError");

    let mut longer = public.to_vec();
    longer.push(0);
    assert!(CompositeKey::from_public_bytes(desc.name, &longer).is_err());
}

#[test]
fn test_private_import_rederives_classical_public() {
    let original = CompositeKey::generate("p384_mldsa65").unwrap();
    let mut restored =
        CompositeKey::from_private_bytes("p384_mldsa65", original.private_bytes().unwrap()).unwrap();
    assert!(restored.has_private());
    assert!(!restored.has_public());
    assert_eq!(restored.comp_pub(0), original.comp_pub(0));
    assert!(restored.comp_pub(1).is_none());

    restored.fill_public(original.public_bytes().unwrap()).unwrap();
    assert_eq!(restored.public_bytes(), original.public_bytes());

    let err = restored.fill_public(original.public_bytes().unwrap()).unwrap_err();
    assert_eq!(err.error_code(), error_codes::PUBLIC_KEY_ALREADY_SET);
}

#[test]
fn test_private_import_rederives_kem_public_key() {
    for name in ["p256_mlkem768", "x25519_kyber768", "mlkem1024"] {
        let original = CompositeKey::generate(name).unwrap();
        let restored = CompositeKey::from_private_bytes(name, original.private_bytes().unwrap()).unwrap();
        assert!(restored.has_public(), "{}", name);
        assert_eq!(restored.public_bytes(), original.public_bytes(), "{}", name);
        for index in 0..original.numkeys() {
            assert_eq!(restored.comp_pub(index), original.comp_pub(index), "{} slot {}", name, index);
        }
    }
}

#[test]
fn test_keypair_import_checks_rederived_public_key() {
    let original = CompositeKey::generate("p256_mlkem768").unwrap();
    let key = CompositeKey::from_keypair_bytes(
        "p256_mlkem768",
        original.private_bytes().unwrap(),
        original.public_bytes().unwrap(),
    )
    .unwrap();
    assert_eq!(key.public_bytes(), original.public_bytes());

    // same classical half, foreign ML-KEM half
    let other = CompositeKey::generate("p256_mlkem768").unwrap();
    let mut mixed = original.public_bytes().unwrap()[..69].to_vec();
    mixed.extend_from_slice(other.comp_pub(1).unwrap());
    let err = CompositeKey::from_keypair_bytes("p256_mlkem768", original.private_bytes().unwrap(), &mixed)
        .unwrap_err();
    assert_eq!(err.error_code(), error_codes::PUBLIC_KEY_MISMATCH);
    assert_eq!(err.technical_details()["slot"], "1");
}

#[test]
fn test_fill_public_rejects_foreign_classical_key() {
    let ours = CompositeKey::generate("x25519_kyber768").unwrap();
    let theirs = CompositeKey::generate("x25519_kyber768").unwrap();
    let err = CompositeKey::from_keypair_bytes(
        "x25519_kyber768",
        ours.private_bytes().unwrap(),
        theirs.public_bytes().unwrap(),
    )
    .unwrap_err();
    assert_eq!(err.error_code(), error_codes::PUBLIC_KEY_MISMATCH);
}

#[test]
fn test_recreate_classical_key_errors() {
    let desc = lookup("p256_mlkem512").unwrap();
    let err = recreate_classical_key(desc, KeyPart::Public, &[0x04; 65]).unwrap_err();
    assert_eq!(err.error_type(), "KeyRecreateError");

    let plain = lookup("mlkem512").unwrap();
    let err = recreate_classical_key(plain, KeyPart::Public, &[0x04; 65]).unwrap_err();
    assert_eq!(err.error_type(), "ConfigurationError");
}

#[test]
fn test_shared_key_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>(_: &T) {}
    let shared = CompositeKey::generate("mlkem512").unwrap().into_shared();
    assert_send_sync(&shared);
    let clone = shared.clone();
    assert_eq!(clone.name(), "mlkem512");
}

#[test]
fn test_signature_codec_encoding() {
    let der = codec::encode(&[1, 2, 3], &[4]).unwrap();
    assert_eq!(hex::encode(&der), "300a03040001020303020004");
    assert_eq!(codec::max_encoded_len(3, 1), der.len());
    let (first, second) = codec::decode(&der).unwrap();
    assert_eq!(first, vec![1, 2, 3]);
    assert_eq!(second, vec![4]);
}

#[test]
fn test_signature_codec_size_is_exact_for_long_components() {
    let der = codec::encode(&[0xAA; 2420], &[0x55; 72]).unwrap();
    assert_eq!(codec::max_encoded_len(2420, 72), der.len());
}

#[test]
fn test_signature_codec_rejects_malformed() {
    let malformed = [
        // non-zero unused bits
        "30080302010203020004",
        // three elements
        "300c030200010302000203020003",
        // OCTET STRING element
        "30080402000103020002",
        // one element
        "300403020001",
        // trailing data
        "300a0304000102030302000400",
        "",
    ];
    for case in malformed {
        let err = codec::decode(&hex::decode(case).unwrap()).unwrap_err();
        assert_eq!(err.error_type(), "EncodingError", "case {}", case);
    }
}

#[test]
fn test_component_sequence_roundtrip() {
    let key = CompositeKey::generate("mldsa44_p256").unwrap();

    let public_seq = key.to_component_sequence(KeyPart::Public).unwrap();
    let imported = CompositeKey::from_component_sequence("mldsa44_p256", KeyPart::Public, public_seq.as_bytes())
        .unwrap();
    assert_eq!(imported.public_bytes(), key.public_bytes());

    let private_seq = key.to_component_sequence(KeyPart::Private).unwrap();
    let imported = CompositeKey::from_component_sequence("mldsa44_p256", KeyPart::Private, private_seq.as_bytes())
        .unwrap();
    assert_eq!(imported.private_bytes(), key.private_bytes());
}

#[test]
fn test_key_sequence_part_mismatch() {
    let public_seq = codec::encode_key_sequence(KeyPart::Public, &[&[1, 2], &[3]]).unwrap();
    let err = codec::decode_key_sequence(KeyPart::Private, public_seq.as_bytes()).unwrap_err();
    assert_eq!(err.error_type(), "EncodingError");
    assert_eq!(err.error_code(), error_codes::DER_DECODE_FAILED);
    let decoded = codec::decode_key_sequence(KeyPart::Public, public_seq.as_bytes()).unwrap();
    assert_eq!(decoded[0].as_bytes(), &[1, 2]);
}
