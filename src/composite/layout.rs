//! Wire layouts for multi-slot keys
//!
//! A hybrid key puts a 4-byte big-endian length in front of each classical
//! slot. A composite key concatenates the slot encodings with no framing at
//! all; every slot but the last has a fixed length and the last one takes
//! whatever remains. Plain keys are the post-quantum bytes verbatim.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

use crate::classical::ClassicalKey;
use crate::error::{error_codes, CryptoError, CryptoResult};
use crate::registry::{AlgorithmDescriptor, KeyKind, SlotAlgorithm};
use crate::secure_memory::SecureBytes;
use crate::utils::{self, LENGTH_PREFIX_SIZE};

/// Which half of a key pair a buffer holds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyPart {
    Public,
    Private,
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::Public => write!(f, "public key"),
            KeyPart::Private => write!(f, "private key"),
        }
    }
}

/// Byte layout used for a key kind
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WireLayout {
    Plain,
    Hybrid,
    Composite,
}

impl WireLayout {
    pub fn of(kind: KeyKind) -> Self {
        if kind.is_hybrid() {
            WireLayout::Hybrid
        } else if kind == KeyKind::CompositeSig {
            WireLayout::Composite
        } else {
            WireLayout::Plain
        }
    }
}

/// Declared length of one slot's encoding
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotLength {
    /// Exact length when `fixed`, otherwise the family maximum
    pub max: usize,
    pub fixed: bool,
}

impl SlotLength {
    pub fn accepts(&self, len: usize) -> bool {
        if self.fixed {
            len == self.max
        } else {
            len > 0 && len <= self.max
        }
    }
}

/// Declared length of slot `index` for one key part
pub fn slot_length(descriptor: &AlgorithmDescriptor, index: usize, part: KeyPart) -> CryptoResult<SlotLength> {
    let length = match descriptor.slot(index) {
        Some(SlotAlgorithm::Pqc(pqc)) => {
            let engine = pqc.engine()?;
            let max = match part {
                KeyPart::Public => engine.public_key_len(),
                KeyPart::Private => engine.secret_key_len(),
            };
            SlotLength { max, fixed: true }
        }
        Some(SlotAlgorithm::Classical(classical)) => match part {
            KeyPart::Public => SlotLength {
                max: classical.public_key_len(),
                fixed: classical.fixed_public_len(),
            },
            KeyPart::Private => SlotLength {
                max: classical.private_key_len(),
                fixed: classical.fixed_private_len(),
            },
        },
        None => {
            return Err(CryptoError::allocation(
                descriptor.name,
                &format!("slot {} does not exist", index),
                error_codes::UNKNOWN_SLOT_LENGTH,
            ))
        }
    };
    if length.max == 0 {
        return Err(CryptoError::allocation(
            descriptor.name,
            &format!("slot {} has no declared {} length", index, part),
            error_codes::UNKNOWN_SLOT_LENGTH,
        ));
    }
    Ok(length)
}

/// Declared lengths of every slot, in wire order
pub fn slot_lengths(descriptor: &AlgorithmDescriptor, part: KeyPart) -> CryptoResult<Vec<SlotLength>> {
    (0..descriptor.numkeys())
        .map(|index| slot_length(descriptor, index, part))
        .collect()
}

fn is_prefixed(descriptor: &AlgorithmDescriptor, index: usize) -> bool {
    WireLayout::of(descriptor.kind) == WireLayout::Hybrid && descriptor.classical_index() == Some(index)
}

/// Maximum size of a flat key buffer, length prefixes included
pub fn max_wire_len(descriptor: &AlgorithmDescriptor, part: KeyPart) -> CryptoResult<usize> {
    let lengths = slot_lengths(descriptor, part)?;
    let prefixes = (0..descriptor.numkeys())
        .filter(|&index| is_prefixed(descriptor, index))
        .count();
    Ok(lengths.iter().map(|l| l.max).sum::<usize>() + prefixes * LENGTH_PREFIX_SIZE)
}

/// Zero-filled buffer large enough for any key of this algorithm
pub fn allocate(descriptor: &AlgorithmDescriptor, part: KeyPart) -> CryptoResult<SecureBytes> {
    let len = max_wire_len(descriptor, part)?;
    #[cfg(feature = "debug")]
    log::trace!("allocating {} bytes for a {} {}", len, descriptor.name, part);
    Ok(SecureBytes::zeroed(len))
}

/// Lay out per-slot encodings into `out`, returning the number of bytes used.
///
/// With no buffer this only validates the components and reports the size.
pub fn compose_wire_key_into(
    descriptor: &AlgorithmDescriptor,
    part: KeyPart,
    components: &[&[u8]],
    out: Option<&mut [u8]>,
) -> CryptoResult<usize> {
    let what = format!("{} {}", descriptor.name, part);
    if components.len() != descriptor.numkeys() {
        return Err(CryptoError::encoding(
            &what,
            &format!("{} components for {} slots", components.len(), descriptor.numkeys()),
            error_codes::MALFORMED_KEY,
        ));
    }
    let lengths = slot_lengths(descriptor, part)?;
    let mut total = 0;
    for (index, (component, length)) in components.iter().zip(&lengths).enumerate() {
        if !length.accepts(component.len()) {
            return Err(CryptoError::encoding(
                &what,
                &format!("slot {} is {} bytes, declared {}", index, component.len(), length.max),
                error_codes::MALFORMED_KEY,
            ));
        }
        if is_prefixed(descriptor, index) {
            total += LENGTH_PREFIX_SIZE;
        }
        total += component.len();
    }
    utils::check_output(&out, total, &what)?;

    if let Some(out) = out {
        let mut offset = 0;
        for (index, component) in components.iter().enumerate() {
            if is_prefixed(descriptor, index) {
                let prefix = utils::length_prefix(component.len(), &what)?;
                out[offset..offset + LENGTH_PREFIX_SIZE].copy_from_slice(&prefix);
                offset += LENGTH_PREFIX_SIZE;
            }
            out[offset..offset + component.len()].copy_from_slice(component);
            offset += component.len();
        }
    }
    Ok(total)
}

/// Lay out per-slot encodings into a fresh buffer
pub fn compose_wire_key(descriptor: &AlgorithmDescriptor, part: KeyPart, components: &[&[u8]]) -> CryptoResult<SecureBytes> {
    let len = compose_wire_key_into(descriptor, part, components, None)?;
    let mut buffer = SecureBytes::zeroed(len);
    compose_wire_key_into(descriptor, part, components, Some(buffer.as_mut_bytes()))?;
    Ok(buffer)
}

/// Byte range of every slot inside a flat key buffer.
///
/// Hybrid slot lengths are read back from their prefixes and bounds-checked;
/// composite slots are split using the declared lengths.
pub fn component_ranges(
    descriptor: &AlgorithmDescriptor,
    part: KeyPart,
    bytes: &[u8],
) -> CryptoResult<Vec<Range<usize>>> {
    let what = format!("{} {}", descriptor.name, part);
    let malformed = |cause: String| CryptoError::encoding(&what, &cause, error_codes::MALFORMED_KEY);
    let lengths = slot_lengths(descriptor, part)?;
    let last = lengths.len() - 1;
    let mut ranges = Vec::with_capacity(lengths.len());
    let mut offset = 0;

    for (index, length) in lengths.iter().enumerate() {
        let len = if is_prefixed(descriptor, index) {
            let len = utils::read_length_prefix(&bytes[offset..], &what, error_codes::MALFORMED_KEY)?;
            offset += LENGTH_PREFIX_SIZE;
            len
        } else if index == last {
            bytes.len() - offset
        } else if length.fixed {
            length.max
        } else {
            return Err(CryptoError::allocation(
                &what,
                &format!("slot {} has no fixed length", index),
                error_codes::UNKNOWN_SLOT_LENGTH,
            ));
        };
        if !length.accepts(len) {
            return Err(malformed(format!(
                "slot {} is {} bytes, declared {}",
                index, len, length.max
            )));
        }
        let end = offset
            .checked_add(len)
            .filter(|&end| end <= bytes.len())
            .ok_or_else(|| malformed(format!("slot {} runs past the end", index)))?;
        ranges.push(offset..end);
        offset = end;
    }

    if offset != bytes.len() {
        return Err(malformed(format!("{} trailing bytes", bytes.len() - offset)));
    }
    Ok(ranges)
}

/// Split a flat key buffer into per-slot encodings
pub fn decompose_wire_key<'a>(
    descriptor: &AlgorithmDescriptor,
    part: KeyPart,
    bytes: &'a [u8],
) -> CryptoResult<Vec<&'a [u8]>> {
    Ok(component_ranges(descriptor, part, bytes)?
        .into_iter()
        .map(|range| &bytes[range])
        .collect())
}

/// Rebuild the classical key object from its slot encoding
pub fn recreate_classical_key(
    descriptor: &AlgorithmDescriptor,
    part: KeyPart,
    component: &[u8],
) -> CryptoResult<ClassicalKey> {
    let (index, classical) = match (descriptor.classical_index(), descriptor.classical) {
        (Some(index), Some(classical)) => (index, classical),
        _ => {
            return Err(CryptoError::configuration(
                descriptor.name,
                "key has no classical slot",
                error_codes::WRONG_KEY_KIND,
            ))
        }
    };
    match part {
        KeyPart::Public => classical.decode_public(component, index),
        KeyPart::Private => classical.decode_private(component, index),
    }
}
