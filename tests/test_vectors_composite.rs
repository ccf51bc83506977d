// Fixed vectors for the composite wire formats

use qasa_composite::composite::{codec, KeyPart};
use qasa_composite::hybrid::composite_message;
use qasa_composite::registry::{self, AlgorithmInfo, KeyKind};
use qasa_composite::utils::DigestAlgorithm;

const COMPOSITE_OIDS: &[(&str, &str)] = &[
    ("mldsa44_pss2048", "060b6086480186fa6b50080101"),
    ("mldsa44_rsa2048", "060b6086480186fa6b50080102"),
    ("mldsa44_ed25519", "060b6086480186fa6b50080103"),
    ("mldsa44_p256", "060b6086480186fa6b50080104"),
    ("mldsa65_pss3072", "060b6086480186fa6b50080106"),
    ("mldsa65_rsa3072", "060b6086480186fa6b50080107"),
    ("mldsa65_p256", "060b6086480186fa6b50080108"),
    ("mldsa65_ed25519", "060b6086480186fa6b5008010a"),
    ("mldsa87_p384", "060b6086480186fa6b5008010b"),
    ("falcon512_p256", "060b6086480186fa6b5008010e"),
    ("falcon512_ed25519", "060b6086480186fa6b50080110"),
];

#[test]
fn composite_oid_prefixes() {
    for (name, expected) in COMPOSITE_OIDS {
        let desc = registry::lookup(name).unwrap();
        assert_eq!(hex::encode(desc.composite_oid().unwrap()), *expected, "{}", name);
    }
    assert_eq!(
        registry::algorithms_of_kind(KeyKind::CompositeSig).count(),
        COMPOSITE_OIDS.len()
    );
}

#[test]
fn composite_message_is_oid_then_digest() {
    let desc = registry::lookup("mldsa44_p256").unwrap();
    let prefixed = composite_message(desc, b"abc").unwrap();
    assert_eq!(
        hex::encode(&prefixed),
        concat!(
            "060b6086480186fa6b50080104",
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        )
    );

    let desc = registry::lookup("mldsa44_ed25519").unwrap();
    let prefixed = composite_message(desc, b"abc").unwrap();
    assert_eq!(prefixed.len(), 13 + 64);
    assert_eq!(&prefixed[13..], DigestAlgorithm::Sha512.digest(b"abc").as_slice());

    assert!(composite_message(registry::lookup("p256_mldsa44").unwrap(), b"abc").is_err());
}

#[test]
fn composite_signature_der_vector() {
    let der = codec::encode(&hex::decode("deadbeef").unwrap(), &hex::decode("0102").unwrap()).unwrap();
    assert_eq!(hex::encode(&der), "300c030500deadbeef0303000102");
    let (first, second) = codec::decode(&der).unwrap();
    assert_eq!(hex::encode(first), "deadbeef");
    assert_eq!(hex::encode(second), "0102");
}

#[test]
fn long_form_der_lengths() {
    // 2420-byte ML-DSA-44 signature and a 72-byte ECDSA signature
    let der = codec::encode(&[0u8; 2420], &[0u8; 72]).unwrap();
    assert_eq!(&der[..4], &[0x30, 0x82, 0x09, 0xc4]);
    assert_eq!(&der[4..9], &[0x03, 0x82, 0x09, 0x75, 0x00]);
    assert_eq!(codec::max_encoded_len(2420, 72), der.len());
}

#[test]
fn key_sequence_vectors() {
    let public = codec::encode_key_sequence(KeyPart::Public, &[&[0xAA, 0xBB], &[0xCC]]).unwrap();
    assert_eq!(hex::encode(public.as_bytes()), "3009030300aabb030200cc");

    let private = codec::encode_key_sequence(KeyPart::Private, &[&[0xAA, 0xBB], &[0xCC]]).unwrap();
    assert_eq!(hex::encode(private.as_bytes()), "30070402aabb0401cc");
}

#[test]
fn algorithm_info_json() {
    let info = registry::lookup("p256_mlkem768").unwrap().info();
    let json: serde_json::Value = serde_json::to_value(&info).unwrap();
    assert_eq!(json["name"], "p256_mlkem768");
    assert_eq!(json["kind"], "HybridKem");
    assert_eq!(json["security_bits"], 128);
    assert!(json["composite_oid"].is_null());

    let back: AlgorithmInfo = serde_json::from_value(json).unwrap();
    assert_eq!(back, info);
}
