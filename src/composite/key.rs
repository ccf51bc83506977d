use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use super::codec;
use super::layout::{self, KeyPart};
use crate::classical::ClassicalKey;
use crate::error::{error_codes, CryptoError, CryptoResult};
use crate::pqc::PqcEngine;
use crate::registry::{self, AlgorithmDescriptor, KeyKind, SlotAlgorithm};
use crate::secure_memory::SecureBytes;

/// A composite key shared between concurrent read-only operations.
///
/// Private material is zeroized when the last reference is dropped.
pub type SharedCompositeKey = Arc<CompositeKey>;

/// A key made of one post-quantum slot and at most one classical slot.
///
/// The flat public and private buffers are kept in their wire layout; the
/// per-slot ranges into them are computed once when the buffer is set. The
/// classical slot is also held as a decoded key object so the protocols
/// never re-parse it.
///
/// # Example
///
/// ```no_run
/// use qasa_composite::composite::CompositeKey;
///
/// let key = CompositeKey::generate("p256_mlkem768").unwrap();
/// let public = key.public_bytes().unwrap();
/// let peer = CompositeKey::from_public_bytes("p256_mlkem768", public).unwrap();
/// assert!(!peer.has_private());
/// ```
pub struct CompositeKey {
    descriptor: &'static AlgorithmDescriptor,
    pqc: PqcEngine,
    classical: Option<ClassicalKey>,
    classical_public: Vec<u8>,
    public: Vec<u8>,
    public_ranges: Vec<Range<usize>>,
    private: Option<SecureBytes>,
    private_ranges: Vec<Range<usize>>,
}

impl fmt::Debug for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeKey")
            .field("name", &self.descriptor.name)
            .field("kind", &self.descriptor.kind)
            .field("has_public", &self.has_public())
            .field("has_private", &self.has_private())
            .finish()
    }
}

impl CompositeKey {
    /// Generate a fresh key pair for a registered algorithm name
    pub fn generate(name: &str) -> CryptoResult<Self> {
        let descriptor = registry::lookup(name)?;
        let pqc = descriptor.pqc.engine()?;
        let (pqc_public, pqc_private) = pqc.keypair()?;
        let classical = descriptor.classical.map(|c| c.generate()).transpose()?;

        let classical_public = classical.as_ref().map(|k| k.encode_public()).transpose()?;
        let classical_private = classical.as_ref().map(|k| k.encode_private()).transpose()?;

        let public_components =
            slot_components(descriptor, &pqc_public, classical_public.as_deref().unwrap_or_default());
        let private_components = slot_components(
            descriptor,
            pqc_private.as_bytes(),
            classical_private.as_ref().map(|p| p.as_bytes()).unwrap_or_default(),
        );

        let public = layout::compose_wire_key(descriptor, KeyPart::Public, &public_components)?;
        let mut private = layout::allocate(descriptor, KeyPart::Private)?;
        let used = layout::compose_wire_key_into(
            descriptor,
            KeyPart::Private,
            &private_components,
            Some(private.as_mut_bytes()),
        )?;
        private.truncate(used);

        log::debug!("generated {} key ({})", descriptor.name, descriptor.kind);
        Self::assemble(descriptor, pqc, classical, public.as_bytes().to_vec(), Some(private))
    }

    /// Import a public key from its wire encoding
    pub fn from_public_bytes(name: &str, public: &[u8]) -> CryptoResult<Self> {
        let descriptor = registry::lookup(name)?;
        let ranges = layout::component_ranges(descriptor, KeyPart::Public, public)?;
        let classical = match descriptor.classical_index() {
            Some(index) => Some(layout::recreate_classical_key(
                descriptor,
                KeyPart::Public,
                &public[ranges[index].clone()],
            )?),
            None => None,
        };
        log::debug!("imported {} public key", descriptor.name);
        Self::assemble(descriptor, descriptor.pqc.engine()?, classical, public.to_vec(), None)
    }

    /// Import a private key from its wire encoding.
    ///
    /// The public key is re-derived when every slot allows it: the classical
    /// half always can be, and ML-KEM/Kyber secret keys embed their public
    /// key. Signature schemes do not, so for those only the classical
    /// component is available through [`CompositeKey::comp_pub`] and the
    /// public buffer stays empty until [`CompositeKey::fill_public`].
    pub fn from_private_bytes(name: &str, private: &[u8]) -> CryptoResult<Self> {
        let descriptor = registry::lookup(name)?;
        let ranges = layout::component_ranges(descriptor, KeyPart::Private, private)?;
        let classical = match descriptor.classical_index() {
            Some(index) => Some(layout::recreate_classical_key(
                descriptor,
                KeyPart::Private,
                &private[ranges[index].clone()],
            )?),
            None => None,
        };
        let pqc = descriptor.pqc.engine()?;

        let public = match pqc.public_from_secret(&private[ranges[descriptor.pqc_index()].clone()]) {
            Some(pqc_public) => {
                let classical_public = classical.as_ref().map(|k| k.encode_public()).transpose()?;
                let components =
                    slot_components(descriptor, &pqc_public, classical_public.as_deref().unwrap_or_default());
                layout::compose_wire_key(descriptor, KeyPart::Public, &components)?
                    .as_bytes()
                    .to_vec()
            }
            None => Vec::new(),
        };

        log::debug!(
            "imported {} private key (public key {})",
            descriptor.name,
            if public.is_empty() { "pending" } else { "re-derived" }
        );
        Self::assemble(descriptor, pqc, classical, public, Some(SecureBytes::new(private)))
    }

    /// Import a full key pair.
    ///
    /// Any public component that could be re-derived from the private key
    /// must match the supplied one.
    pub fn from_keypair_bytes(name: &str, private: &[u8], public: &[u8]) -> CryptoResult<Self> {
        let mut key = Self::from_private_bytes(name, private)?;
        if key.has_public() {
            key.check_public(public)?;
        } else {
            key.fill_public(public)?;
        }
        Ok(key)
    }

    /// Supply the public buffer of a key imported from private bytes only.
    ///
    /// The classical component must match the one re-derived from the private key.
    pub fn fill_public(&mut self, public: &[u8]) -> CryptoResult<()> {
        if self.has_public() {
            return Err(CryptoError::configuration(
                self.descriptor.name,
                "public key is already set",
                error_codes::PUBLIC_KEY_ALREADY_SET,
            ));
        }
        let ranges = self.check_public(public)?;
        self.public = public.to_vec();
        self.public_ranges = ranges;
        Ok(())
    }

    // Every component this key already knows must equal the one in `public`
    fn check_public(&self, public: &[u8]) -> CryptoResult<Vec<Range<usize>>> {
        let ranges = layout::component_ranges(self.descriptor, KeyPart::Public, public)?;
        for (index, range) in ranges.iter().enumerate() {
            if let Some(known) = self.comp_pub(index) {
                if known != &public[range.clone()] {
                    return Err(CryptoError::key_recreate(
                        index,
                        "public component does not match the private key",
                        error_codes::PUBLIC_KEY_MISMATCH,
                    ));
                }
            }
        }
        Ok(ranges)
    }

    fn assemble(
        descriptor: &'static AlgorithmDescriptor,
        pqc: PqcEngine,
        classical: Option<ClassicalKey>,
        public: Vec<u8>,
        private: Option<SecureBytes>,
    ) -> CryptoResult<Self> {
        let public_ranges = if public.is_empty() {
            Vec::new()
        } else {
            layout::component_ranges(descriptor, KeyPart::Public, &public)?
        };
        let private_ranges = match &private {
            Some(private) => layout::component_ranges(descriptor, KeyPart::Private, private.as_bytes())?,
            None => Vec::new(),
        };
        let classical_public = match &classical {
            Some(classical) => classical.encode_public()?,
            None => Vec::new(),
        };
        Ok(Self {
            descriptor,
            pqc,
            classical,
            classical_public,
            public,
            public_ranges,
            private,
            private_ranges,
        })
    }

    /// Flat public key in its wire layout
    pub fn public_bytes(&self) -> Option<&[u8]> {
        if self.public.is_empty() {
            None
        } else {
            Some(&self.public)
        }
    }

    /// Flat private key in its wire layout
    pub fn private_bytes(&self) -> Option<&[u8]> {
        self.private.as_ref().map(|p| p.as_bytes())
    }

    /// Public encoding of slot `index`.
    ///
    /// The classical slot is always available, even before the full public
    /// buffer is known.
    pub fn comp_pub(&self, index: usize) -> Option<&[u8]> {
        match self.public_ranges.get(index) {
            Some(range) => Some(&self.public[range.clone()]),
            None if self.descriptor.classical_index() == Some(index) && !self.classical_public.is_empty() => {
                Some(self.classical_public.as_slice())
            }
            None => None,
        }
    }

    /// Private encoding of slot `index`
    pub fn comp_priv(&self, index: usize) -> Option<&[u8]> {
        let range = self.private_ranges.get(index)?;
        self.private.as_ref()?.slice(range.clone())
    }

    pub fn kind(&self) -> KeyKind {
        self.descriptor.kind
    }

    pub fn numkeys(&self) -> usize {
        self.descriptor.numkeys()
    }

    pub fn security_bits(&self) -> u32 {
        self.descriptor.security_bits()
    }

    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }

    pub fn descriptor(&self) -> &'static AlgorithmDescriptor {
        self.descriptor
    }

    pub fn has_private(&self) -> bool {
        self.private.is_some()
    }

    pub fn has_public(&self) -> bool {
        !self.public.is_empty()
    }

    pub fn into_shared(self) -> SharedCompositeKey {
        Arc::new(self)
    }

    pub(crate) fn pqc_engine(&self) -> &PqcEngine {
        &self.pqc
    }

    pub(crate) fn pqc_public(&self) -> CryptoResult<&[u8]> {
        self.comp_pub(self.descriptor.pqc_index())
            .ok_or_else(|| self.missing("post-quantum public key"))
    }

    pub(crate) fn pqc_private(&self) -> CryptoResult<&[u8]> {
        self.comp_priv(self.descriptor.pqc_index())
            .ok_or_else(|| self.missing("post-quantum private key"))
    }

    /// Decoded classical key; plain keys have none
    pub(crate) fn classical_slot(&self) -> CryptoResult<&ClassicalKey> {
        self.classical.as_ref().ok_or_else(|| {
            CryptoError::configuration(
                self.descriptor.name,
                "key has no classical slot",
                error_codes::WRONG_KEY_KIND,
            )
        })
    }

    fn missing(&self, what: &str) -> CryptoError {
        CryptoError::configuration(
            self.descriptor.name,
            &format!("{} is not present", what),
            error_codes::MISSING_KEY_MATERIAL,
        )
    }

    /// Wrap the per-slot encodings of one key part in a DER `SEQUENCE OF`
    pub fn to_component_sequence(&self, part: KeyPart) -> CryptoResult<SecureBytes> {
        let components: Option<Vec<&[u8]>> = match part {
            KeyPart::Public => (0..self.numkeys()).map(|i| self.comp_pub(i)).collect(),
            KeyPart::Private => (0..self.numkeys()).map(|i| self.comp_priv(i)).collect(),
        };
        let components = components.ok_or_else(|| self.missing(&part.to_string()))?;
        codec::encode_key_sequence(part, &components)
    }

    /// Import one key part from a DER `SEQUENCE OF` per-slot encodings
    pub fn from_component_sequence(name: &str, part: KeyPart, der: &[u8]) -> CryptoResult<Self> {
        let descriptor = registry::lookup(name)?;
        let components = codec::decode_key_sequence(part, der)?;
        let slices: Vec<&[u8]> = components.iter().map(|c| c.as_bytes()).collect();
        let flat = layout::compose_wire_key(descriptor, part, &slices)?;
        match part {
            KeyPart::Public => Self::from_public_bytes(name, flat.as_bytes()),
            KeyPart::Private => Self::from_private_bytes(name, flat.as_bytes()),
        }
    }
}

// Order per-slot encodings the way the descriptor lays them out
fn slot_components<'a>(descriptor: &AlgorithmDescriptor, pqc: &'a [u8], classical: &'a [u8]) -> Vec<&'a [u8]> {
    descriptor
        .slots()
        .into_iter()
        .map(|slot| match slot {
            SlotAlgorithm::Pqc(_) => pqc,
            SlotAlgorithm::Classical(_) => classical,
        })
        .collect()
}
