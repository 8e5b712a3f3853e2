//! Interest and Data packets.
//!
//! Only the fields the catalog core touches are modeled. A Data packet
//! knows its signed portion (Name, MetaInfo, Content, SignatureInfo TLVs)
//! so a signer can produce the signature and a consumer can check it.

use crate::name::{Component, Name};
use crate::tlv;

/// Ed25519 signature type code.
pub const SIGNATURE_ED25519: u64 = 5;

/// A consumer request for named data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interest {
    name: Name,
}

impl Interest {
    pub fn new(name: Name) -> Self {
        Self { name }
    }

    pub fn name(&self) -> &Name {
        &self.name
    }
}

/// Describes how a Data packet is signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureInfo {
    pub signature_type: u64,
    /// Name of the certificate the signature was made with.
    pub key_locator: Option<Name>,
}

/// A signed, named unit of data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Data {
    name: Name,
    freshness_period_ms: Option<u64>,
    final_block_id: Option<Component>,
    content: Vec<u8>,
    signature_info: Option<SignatureInfo>,
    signature_value: Vec<u8>,
}

impl Data {
    pub fn new(name: Name) -> Self {
        Self {
            name,
            freshness_period_ms: None,
            final_block_id: None,
            content: Vec::new(),
            signature_info: None,
            signature_value: Vec::new(),
        }
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn set_content(&mut self, content: Vec<u8>) {
        self.content = content;
    }

    pub fn freshness_period_ms(&self) -> Option<u64> {
        self.freshness_period_ms
    }

    pub fn set_freshness_period_ms(&mut self, millis: u64) {
        self.freshness_period_ms = Some(millis);
    }

    pub fn final_block_id(&self) -> Option<&Component> {
        self.final_block_id.as_ref()
    }

    pub fn set_final_block_id(&mut self, component: Component) {
        self.final_block_id = Some(component);
    }

    /// True when FinalBlockId equals the packet's last name component,
    /// marking this Data as the terminal segment of its stream.
    pub fn is_final_block(&self) -> bool {
        match (&self.final_block_id, self.name.components().last()) {
            (Some(final_id), Some(last)) => final_id == last,
            _ => false,
        }
    }

    pub fn signature_info(&self) -> Option<&SignatureInfo> {
        self.signature_info.as_ref()
    }

    pub fn set_signature_info(&mut self, info: SignatureInfo) {
        self.signature_info = Some(info);
    }

    pub fn signature_value(&self) -> &[u8] {
        &self.signature_value
    }

    pub fn set_signature_value(&mut self, value: Vec<u8>) {
        self.signature_value = value;
    }

    fn encode_meta_info(&self, out: &mut Vec<u8>) {
        if self.freshness_period_ms.is_none() && self.final_block_id.is_none() {
            return;
        }
        let mut payload = Vec::new();
        if let Some(millis) = self.freshness_period_ms {
            tlv::write_non_negative_element(tlv::FRESHNESS_PERIOD, millis, &mut payload);
        }
        if let Some(final_id) = &self.final_block_id {
            let mut inner = Vec::new();
            tlv::write_element(tlv::COMPONENT, final_id.value(), &mut inner);
            tlv::write_element(tlv::FINAL_BLOCK_ID, &inner, &mut payload);
        }
        tlv::write_element(tlv::META_INFO, &payload, out);
    }

    fn encode_signature_info(&self, out: &mut Vec<u8>) {
        let Some(info) = &self.signature_info else {
            return;
        };
        let mut payload = Vec::new();
        tlv::write_non_negative_element(tlv::SIGNATURE_TYPE, info.signature_type, &mut payload);
        if let Some(locator) = &info.key_locator {
            tlv::write_element(tlv::KEY_LOCATOR, &locator.to_wire(), &mut payload);
        }
        tlv::write_element(tlv::SIGNATURE_INFO, &payload, out);
    }

    /// The byte range a signature covers: Name, MetaInfo, Content and
    /// SignatureInfo. The SignatureInfo must be set before signing.
    pub fn signed_portion(&self) -> Vec<u8> {
        let mut out = self.name.to_wire();
        self.encode_meta_info(&mut out);
        tlv::write_element(tlv::CONTENT, &self.content, &mut out);
        self.encode_signature_info(&mut out);
        out
    }

    /// Full wire form: the signed portion followed by the SignatureValue,
    /// framed as a Data element.
    pub fn to_wire(&self) -> Vec<u8> {
        let mut payload = self.signed_portion();
        tlv::write_element(tlv::SIGNATURE_VALUE, &self.signature_value, &mut payload);
        let mut out = Vec::new();
        tlv::write_element(tlv::DATA, &payload, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_data() -> Data {
        let mut data = Data::new(
            Name::from_uri("/catalog/lap/query-results")
                .unwrap()
                .appended(Component::from_version(9))
                .appended(Component::from_segment(0)),
        );
        data.set_content(b"{\"results\":[]}\0".to_vec());
        data.set_freshness_period_ms(10_000);
        data
    }

    #[test]
    fn test_final_block_matches_own_segment() {
        let mut data = sample_data();
        assert!(!data.is_final_block());
        data.set_final_block_id(Component::from_segment(0));
        assert!(data.is_final_block());
    }

    #[test]
    fn test_final_block_of_other_segment_is_not_terminal() {
        let mut data = sample_data();
        data.set_final_block_id(Component::from_segment(3));
        assert!(!data.is_final_block());
    }

    #[test]
    fn test_signed_portion_covers_content() {
        let mut data = sample_data();
        let before = data.signed_portion();
        data.set_content(b"{\"results\":[\"a\"]}\0".to_vec());
        assert_ne!(data.signed_portion(), before);
    }

    #[test]
    fn test_signed_portion_covers_signature_info() {
        let mut data = sample_data();
        let before = data.signed_portion();
        data.set_signature_info(SignatureInfo {
            signature_type: SIGNATURE_ED25519,
            key_locator: Some(Name::from_uri("/operator/KEY/1").unwrap()),
        });
        assert_ne!(data.signed_portion(), before);
    }

    #[test]
    fn test_wire_form_appends_signature_value() {
        let mut data = sample_data();
        data.set_signature_info(SignatureInfo {
            signature_type: SIGNATURE_ED25519,
            key_locator: None,
        });
        data.set_signature_value(vec![0xAA; 64]);
        let wire = data.to_wire();
        assert_eq!(wire[0], 0x06);
        assert!(wire.len() > data.signed_portion().len());
    }

    #[test]
    fn test_ack_shape_has_empty_content() {
        let data = Data::new(Name::from_uri("/catalog/lap/query").unwrap().appended("OK"));
        assert!(data.content().is_empty());
        assert_eq!(data.freshness_period_ms(), None);
    }
}
