#![no_main]

use libfuzzer_sys::fuzz_target;
use qasa_composite::composite::{codec, KeyPart};

fuzz_target!(|data: &[u8]| {
    // Anything that decodes must re-encode to the same bytes
    if let Ok((first, second)) = codec::decode(data) {
        let encoded = codec::encode(&first, &second).expect("re-encoding a decoded signature");
        assert_eq!(encoded, data);
        assert_eq!(codec::max_encoded_len(first.len(), second.len()), data.len());
    }

    let _ = codec::decode_key_sequence(KeyPart::Public, data);
    let _ = codec::decode_key_sequence(KeyPart::Private, data);
});
