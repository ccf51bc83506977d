/*!
 * Composite key material
 *
 * Owns the `CompositeKey` entity and everything needed to move it in and out
 * of bytes: the hybrid and composite wire layouts, per-slot range
 * computation, classical key re-hydration and the DER codec for composite
 * signatures and component key sequences.
 */

pub mod codec;
pub mod layout;
mod key;

pub use key::{CompositeKey, SharedCompositeKey};
pub use layout::{
    allocate, component_ranges, compose_wire_key, compose_wire_key_into, decompose_wire_key,
    recreate_classical_key, KeyPart, SlotLength, WireLayout,
};

#[cfg(test)]
mod tests;
