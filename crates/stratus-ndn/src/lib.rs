//! # stratus-ndn: names, packets, and the face
//!
//! The protocol atoms of the stratus catalog: hierarchical [`Name`]s with
//! marker-convention version/segment components, [`Interest`]/[`Data`]
//! packets with a signable wire form, and the [`Face`] abstraction the
//! serving core talks to the forwarder through.

pub mod face;
pub mod name;
pub mod packet;
pub mod tlv;

pub use face::{ChannelFace, Face, FaceError, FilterHandle, FilterId};
pub use name::{Component, Name, NameError};
pub use packet::{Data, Interest, SignatureInfo, SIGNATURE_ED25519};
