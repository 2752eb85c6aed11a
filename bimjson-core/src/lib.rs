// Core types for the BIMserver JSON API:
// - the request/response envelope and its codec
// - the discovery metadata reported by the server's meta-interface
// - the shared error type

pub mod envelope;
pub mod error;
pub mod meta;

pub use envelope::{decode_response, encode_request, RequestBody, RequestEnvelope};
pub use error::RpcError;
pub use meta::{
    InterfaceDescriptor, MethodDescriptor, ParameterDescriptor, ServerInfo, ServerVersion, TypeRef,
};
