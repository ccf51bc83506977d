#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use qasa_composite::composite::{CompositeKey, KeyPart};
use qasa_composite::registry;

#[derive(Arbitrary, Debug)]
struct KeyImportInput {
    algorithm: u8,
    private: bool,
    sequence: bool,
    bytes: Vec<u8>,
}

fuzz_target!(|input: KeyImportInput| {
    let names: Vec<&str> = registry::algorithms().map(|d| d.name).collect();
    let name = names[input.algorithm as usize % names.len()];
    let part = if input.private { KeyPart::Private } else { KeyPart::Public };

    let imported = match (input.sequence, part) {
        (true, part) => CompositeKey::from_component_sequence(name, part, &input.bytes),
        (false, KeyPart::Public) => CompositeKey::from_public_bytes(name, &input.bytes),
        (false, KeyPart::Private) => CompositeKey::from_private_bytes(name, &input.bytes),
    };

    // Accepted keys must survive a round trip through their own encoding
    if let Ok(key) = imported {
        let flat = match part {
            KeyPart::Public => key.public_bytes(),
            KeyPart::Private => key.private_bytes(),
        };
        if let Some(flat) = flat {
            let again = match part {
                KeyPart::Public => CompositeKey::from_public_bytes(name, flat),
                KeyPart::Private => CompositeKey::from_private_bytes(name, flat),
            };
            assert!(again.is_ok());
        }
    }
});
