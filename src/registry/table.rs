use super::registry::{AlgorithmDescriptor, KeyKind};
use crate::classical::ClassicalAlgorithm::{self, *};
use crate::pqc::PqcAlgorithm::{self, *};

const fn plain(name: &'static str, kind: KeyKind, pqc: PqcAlgorithm) -> AlgorithmDescriptor {
    AlgorithmDescriptor {
        name,
        kind,
        pqc,
        classical: None,
        pqc_level: pqc.nist_level(),
        composite_arc: None,
    }
}

const fn hybrid(
    name: &'static str,
    kind: KeyKind,
    classical: ClassicalAlgorithm,
    pqc: PqcAlgorithm,
) -> AlgorithmDescriptor {
    AlgorithmDescriptor {
        name,
        kind,
        pqc,
        classical: Some(classical),
        pqc_level: pqc.nist_level(),
        composite_arc: None,
    }
}

const fn composite(
    name: &'static str,
    pqc: PqcAlgorithm,
    classical: ClassicalAlgorithm,
    arc: u8,
) -> AlgorithmDescriptor {
    AlgorithmDescriptor {
        name,
        kind: KeyKind::CompositeSig,
        pqc,
        classical: Some(classical),
        pqc_level: pqc.nist_level(),
        composite_arc: Some(arc),
    }
}

pub(super) static ALGORITHMS: &[AlgorithmDescriptor] = &[
    plain("mlkem512", KeyKind::PlainKem, MlKem512),
    plain("mlkem768", KeyKind::PlainKem, MlKem768),
    plain("mlkem1024", KeyKind::PlainKem, MlKem1024),
    plain("kyber768", KeyKind::PlainKem, Kyber768),
    plain("mldsa44", KeyKind::PlainSig, MlDsa44),
    plain("mldsa65", KeyKind::PlainSig, MlDsa65),
    plain("mldsa87", KeyKind::PlainSig, MlDsa87),
    plain("falcon512", KeyKind::PlainSig, Falcon512),
    plain("falcon1024", KeyKind::PlainSig, Falcon1024),
    plain("sphincssha2128fsimple", KeyKind::PlainSig, SphincsSha2128fSimple),
    hybrid("p256_mlkem512", KeyKind::HybridKem, P256, MlKem512),
    hybrid("x25519_mlkem512", KeyKind::HybridKem, X25519, MlKem512),
    hybrid("p256_mlkem768", KeyKind::HybridKem, P256, MlKem768),
    hybrid("x25519_mlkem768", KeyKind::HybridKem, X25519, MlKem768),
    hybrid("p384_mlkem768", KeyKind::HybridKem, P384, MlKem768),
    hybrid("p384_mlkem1024", KeyKind::HybridKem, P384, MlKem1024),
    hybrid("p256_kyber768", KeyKind::HybridKem, P256, Kyber768),
    hybrid("x25519_kyber768", KeyKind::HybridKem, X25519, Kyber768),
    hybrid("p256_mldsa44", KeyKind::HybridSig, P256, MlDsa44),
    hybrid("rsa3072_mldsa44", KeyKind::HybridSig, Rsa3072, MlDsa44),
    hybrid("p384_mldsa65", KeyKind::HybridSig, P384, MlDsa65),
    hybrid("p256_falcon512", KeyKind::HybridSig, P256, Falcon512),
    hybrid("rsa3072_falcon512", KeyKind::HybridSig, Rsa3072, Falcon512),
    hybrid("p256_sphincssha2128fsimple", KeyKind::HybridSig, P256, SphincsSha2128fSimple),
    composite("mldsa44_pss2048", MlDsa44, RsaPss2048, 1),
    composite("mldsa44_rsa2048", MlDsa44, Rsa2048, 2),
    composite("mldsa44_ed25519", MlDsa44, Ed25519, 3),
    composite("mldsa44_p256", MlDsa44, P256, 4),
    composite("mldsa65_pss3072", MlDsa65, RsaPss3072, 6),
    composite("mldsa65_rsa3072", MlDsa65, Rsa3072, 7),
    composite("mldsa65_p256", MlDsa65, P256, 8),
    composite("mldsa65_ed25519", MlDsa65, Ed25519, 10),
    composite("mldsa87_p384", MlDsa87, P384, 11),
    composite("falcon512_p256", Falcon512, P256, 14),
    composite("falcon512_ed25519", Falcon512, Ed25519, 16),
];
