#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use once_cell::sync::Lazy;
use qasa_composite::composite::CompositeKey;
use qasa_composite::hybrid::{split_hybrid_signature, SignatureContext};

static VERIFIERS: Lazy<Vec<SignatureContext>> = Lazy::new(|| {
    ["p256_mldsa44", "p256_falcon512", "mldsa44_ed25519", "mldsa65_p256"]
        .iter()
        .map(|name| {
            let key = CompositeKey::generate(name).expect("key generation");
            SignatureContext::new(key.into_shared()).expect("signature context")
        })
        .collect()
});

#[derive(Arbitrary, Debug)]
struct SignatureFuzzInput {
    verifier: u8,
    message: Vec<u8>,
    signature: Vec<u8>,
}

fuzz_target!(|input: SignatureFuzzInput| {
    let ctx = &VERIFIERS[input.verifier as usize % VERIFIERS.len()];

    let _ = split_hybrid_signature(ctx.key().descriptor(), &input.signature);

    // Forged signatures must never verify
    assert!(ctx.verify(&input.message, &input.signature).is_err());
});
