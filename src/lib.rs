//! Apicurio Registry SDK
//!
//! Facade over the `registry-client` crate. Most users only need
//! [`RegistryClient`] and [`ClientConfig`].

#![warn(missing_docs)]

pub use registry_client::*;
