//! Data signing.
//!
//! A [`KeyChain`] holds Ed25519 identities: a generated default plus any
//! named identities the operator creates. The [`Signer`] applies the
//! catalog's signing policy (the default key when no identity is
//! configured, otherwise the configured identity's default certificate)
//! and is safe to share across worker tasks.

use std::collections::HashMap;

use ed25519_dalek::{Signer as _, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use stratus_ndn::{Component, Data, Name, SignatureInfo, SIGNATURE_ED25519};

use crate::error::SignError;

/// Identity the keychain signs with when none is configured.
const DEFAULT_IDENTITY: &str = "/localhost/operator";

pub struct Identity {
    name: Name,
    key: SigningKey,
    cert_name: Name,
}

impl Identity {
    fn generate(name: Name) -> Self {
        let key = SigningKey::generate(&mut OsRng);
        let cert_name = name
            .clone()
            .appended("KEY")
            .appended(key_id(&key.verifying_key()))
            .appended("self")
            .appended(Component::from_version(1));
        Self {
            name,
            key,
            cert_name,
        }
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Name of this identity's default (self-signed) certificate.
    pub fn cert_name(&self) -> &Name {
        &self.cert_name
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.key.verifying_key()
    }
}

/// First eight bytes of the public key digest, hex-encoded.
fn key_id(key: &VerifyingKey) -> String {
    let digest = Sha256::digest(key.as_bytes());
    digest[..8].iter().map(|byte| format!("{byte:02x}")).collect()
}

pub struct KeyChain {
    default_identity: Identity,
    identities: HashMap<Name, Identity>,
}

impl KeyChain {
    pub fn new() -> Self {
        let default_name = Name::from_uri(DEFAULT_IDENTITY).unwrap_or_default();
        Self {
            default_identity: Identity::generate(default_name),
            identities: HashMap::new(),
        }
    }

    /// Create (or replace) a named identity with a fresh key.
    pub fn create_identity(&mut self, name: Name) -> &Identity {
        use std::collections::hash_map::Entry;
        match self.identities.entry(name.clone()) {
            Entry::Occupied(mut occupied) => {
                occupied.insert(Identity::generate(name));
                occupied.into_mut()
            }
            Entry::Vacant(vacant) => vacant.insert(Identity::generate(name)),
        }
    }

    pub fn identity(&self, name: &Name) -> Option<&Identity> {
        self.identities.get(name)
    }

    pub fn default_identity(&self) -> &Identity {
        &self.default_identity
    }

    fn sign_with(identity: &Identity, data: &mut Data) {
        data.set_signature_info(SignatureInfo {
            signature_type: SIGNATURE_ED25519,
            key_locator: Some(identity.cert_name.clone()),
        });
        let signature = identity.key.sign(&data.signed_portion());
        data.set_signature_value(signature.to_bytes().to_vec());
    }
}

impl Default for KeyChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Check a Data signature against a verifying key.
pub fn verify(data: &Data, key: &VerifyingKey) -> bool {
    let Ok(signature) = ed25519_dalek::Signature::from_slice(data.signature_value()) else {
        return false;
    };
    key.verify_strict(&data.signed_portion(), &signature).is_ok()
}

/// The catalog's signing policy over a keychain.
pub struct Signer {
    keychain: KeyChain,
    signing_id: Option<Name>,
}

impl Signer {
    pub fn new(keychain: KeyChain, signing_id: Option<Name>) -> Self {
        Self {
            keychain,
            signing_id,
        }
    }

    /// Sign `data` in place with the effective identity.
    pub fn sign(&self, data: &mut Data) -> Result<(), SignError> {
        KeyChain::sign_with(self.effective_identity()?, data);
        Ok(())
    }

    /// The key outbound Data verifies under, if the configured identity
    /// exists.
    pub fn verifying_key(&self) -> Option<VerifyingKey> {
        self.effective_identity().ok().map(Identity::verifying_key)
    }

    fn effective_identity(&self) -> Result<&Identity, SignError> {
        match &self.signing_id {
            None => Ok(self.keychain.default_identity()),
            Some(name) => self
                .keychain
                .identity(name)
                .ok_or_else(|| SignError::UnknownIdentity(name.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_data() -> Data {
        let mut data = Data::new(Name::from_uri("/catalog/lap/query-results/x").unwrap());
        data.set_content(b"{\"results\":[\"a\"]}\0".to_vec());
        data
    }

    #[test]
    fn test_default_key_signature_verifies() {
        let signer = Signer::new(KeyChain::new(), None);
        let mut data = sample_data();
        signer.sign(&mut data).unwrap();

        let key = signer.verifying_key().unwrap();
        assert!(verify(&data, &key));
        assert_eq!(
            data.signature_info().unwrap().signature_type,
            SIGNATURE_ED25519
        );
    }

    #[test]
    fn test_configured_identity_signs_with_its_certificate() {
        let id = Name::from_uri("/catalog/lap/operator").unwrap();
        let mut keychain = KeyChain::new();
        keychain.create_identity(id.clone());
        let signer = Signer::new(keychain, Some(id.clone()));

        let mut data = sample_data();
        signer.sign(&mut data).unwrap();

        let locator = data.signature_info().unwrap().key_locator.clone().unwrap();
        assert!(id.is_prefix_of(&locator));
        assert!(verify(&data, &signer.verifying_key().unwrap()));
    }

    #[test]
    fn test_unknown_identity_is_an_error() {
        let missing = Name::from_uri("/nobody").unwrap();
        let signer = Signer::new(KeyChain::new(), Some(missing.clone()));
        let mut data = sample_data();
        assert!(matches!(
            signer.sign(&mut data),
            Err(SignError::UnknownIdentity(name)) if name == missing
        ));
        assert!(data.signature_value().is_empty());
    }

    #[test]
    fn test_tampered_content_fails_verification() {
        let signer = Signer::new(KeyChain::new(), None);
        let mut data = sample_data();
        signer.sign(&mut data).unwrap();
        data.set_content(b"{\"results\":[\"b\"]}\0".to_vec());
        assert!(!verify(&data, &signer.verifying_key().unwrap()));
    }

    #[test]
    fn test_wrong_key_fails_verification() {
        let signer = Signer::new(KeyChain::new(), None);
        let other = Signer::new(KeyChain::new(), None);
        let mut data = sample_data();
        signer.sign(&mut data).unwrap();
        assert!(!verify(&data, &other.verifying_key().unwrap()));
    }
}
