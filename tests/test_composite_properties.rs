// Property tests for hybrid and composite keys, KEMs and signatures

use once_cell::sync::Lazy;
use proptest::prelude::*;
use qasa_composite::composite::{self, CompositeKey, KeyPart, SharedCompositeKey};
use qasa_composite::hybrid::{KemContext, SignatureContext};
use qasa_composite::pqc::PqcAlgorithm;
use qasa_composite::registry::{self, KeyKind};

static SIGNERS: Lazy<Vec<SignatureContext>> = Lazy::new(|| {
    ["mldsa44", "p256_mldsa44", "p256_falcon512", "mldsa44_ed25519", "mldsa65_p256", "falcon512_ed25519"]
        .iter()
        .map(|name| SignatureContext::new(shared(name)).unwrap())
        .collect()
});

fn shared(name: &str) -> SharedCompositeKey {
    CompositeKey::generate(name).unwrap().into_shared()
}

#[test]
fn wire_keys_roundtrip_for_every_algorithm() {
    for desc in registry::algorithms() {
        let key = CompositeKey::generate(desc.name).unwrap();
        for (part, flat) in [
            (KeyPart::Public, key.public_bytes().unwrap()),
            (KeyPart::Private, key.private_bytes().unwrap()),
        ] {
            let components = composite::decompose_wire_key(desc, part, flat).unwrap();
            assert_eq!(components.len(), desc.numkeys(), "{}", desc.name);
            let rebuilt = composite::compose_wire_key(desc, part, &components).unwrap();
            assert_eq!(rebuilt.as_bytes(), flat, "{} {}", desc.name, part);
        }

        let reimported =
            CompositeKey::from_keypair_bytes(desc.name, key.private_bytes().unwrap(), key.public_bytes().unwrap())
                .unwrap();
        assert_eq!(reimported.public_bytes(), key.public_bytes());
    }
}

#[test]
fn kem_size_query_matches_real_call() {
    for desc in registry::algorithms_of_kind(KeyKind::HybridKem) {
        let mut ctx = KemContext::with_key(shared(desc.name)).unwrap();
        let (ct_len, ss_len) = ctx.encapsulate(None, None).unwrap();
        let (ciphertext, secret) = ctx.encapsulate_to_vec().unwrap();
        assert_eq!(ct_len, ciphertext.len(), "{}", desc.name);
        assert_eq!(ss_len, secret.len(), "{}", desc.name);
        assert_eq!(ctx.decapsulate_to_vec(&ciphertext).unwrap(), secret);
    }
}

#[test]
fn signature_query_bounds_real_call() {
    for desc in registry::algorithms().filter(|d| !d.kind.is_kem()) {
        let ctx = SignatureContext::new(shared(desc.name)).unwrap();
        let required = ctx.sign(b"size query", None).unwrap();
        let signature = ctx.sign_to_vec(b"size query").unwrap();
        assert!(signature.len() <= required, "{}", desc.name);

        let fixed = matches!(desc.pqc, PqcAlgorithm::MlDsa44 | PqcAlgorithm::MlDsa65 | PqcAlgorithm::MlDsa87)
            && desc.classical.map_or(true, |c| c.fixed_signature_len());
        if fixed {
            assert_eq!(signature.len(), required, "{}", desc.name);
        }
        ctx.verify(b"size query", &signature).unwrap();
    }
}

#[test]
fn p256_mlkem768_layout_and_symmetry() {
    let engine = PqcAlgorithm::MlKem768.engine().unwrap();
    let key = CompositeKey::generate("p256_mlkem768").unwrap();
    let public = key.public_bytes().unwrap();

    assert_eq!(public.len(), 4 + 65 + engine.public_key_len());
    assert_eq!(key.comp_pub(0).unwrap(), &public[4..69]);
    assert_eq!(key.comp_pub(1).unwrap(), &public[69..]);

    let peer = CompositeKey::from_public_bytes("p256_mlkem768", public).unwrap();
    let mut sender = KemContext::with_key(peer.into_shared()).unwrap();
    let (ciphertext, sent) = sender.encapsulate_to_vec().unwrap();
    assert_eq!(sent.len(), 32 + engine.shared_secret_len());

    let mut receiver = KemContext::with_key(key.into_shared()).unwrap();
    assert_eq!(receiver.decapsulate_to_vec(&ciphertext).unwrap(), sent);
}

#[test]
fn composite_signatures_are_domain_separated() {
    let signer = CompositeKey::generate("mldsa65_p256").unwrap();
    let pqc_public = signer.comp_pub(0).unwrap().to_vec();
    let signature = SignatureContext::new(signer.into_shared())
        .unwrap()
        .sign_to_vec(b"domain")
        .unwrap();

    for other in ["mldsa65_ed25519", "mldsa65_rsa3072"] {
        let donor = CompositeKey::generate(other).unwrap();
        let mut public = pqc_public.clone();
        public.extend_from_slice(donor.comp_pub(1).unwrap());
        let key = CompositeKey::from_public_bytes(other, &public).unwrap();
        let err = SignatureContext::new(key.into_shared())
            .unwrap()
            .verify(b"domain", &signature)
            .unwrap_err();
        assert!(
            matches!(err.error_type(), "CompositeVerifyFailure" | "EncodingError"),
            "{}: {}",
            other,
            err
        );
    }
}

#[test]
fn signatures_at_digest_block_boundaries() {
    for len in [0usize, 63, 64, 65, 127, 128, 129] {
        let message = vec![0x5Au8; len];
        for ctx in SIGNERS.iter() {
            let signature = ctx.sign_to_vec(&message).unwrap();
            ctx.verify(&message, &signature).unwrap();
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn signatures_verify_for_random_messages(message in proptest::collection::vec(any::<u8>(), 0..512)) {
        for ctx in SIGNERS.iter() {
            let signature = ctx.sign_to_vec(&message).unwrap();
            prop_assert!(ctx.verify(&message, &signature).is_ok());
        }
    }

    #[test]
    fn signatures_reject_altered_messages(
        message in proptest::collection::vec(any::<u8>(), 1..256),
        index in any::<prop::sample::Index>(),
    ) {
        let mut altered = message.clone();
        let i = index.index(altered.len());
        altered[i] ^= 0x01;
        for ctx in SIGNERS.iter() {
            let signature = ctx.sign_to_vec(&message).unwrap();
            let err = ctx.verify(&altered, &signature).unwrap_err();
            prop_assert_eq!(err.error_type(), "CompositeVerifyFailure");
        }
    }

    #[test]
    fn hybrid_key_decoding_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..1400)) {
        let _ = CompositeKey::from_public_bytes("x25519_mlkem768", &bytes);
        let _ = CompositeKey::from_private_bytes("mldsa44_p256", &bytes);
    }
}
