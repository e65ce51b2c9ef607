//! # dashboard
//!
//! Blocking client for the Meraki Dashboard API endpoints that Systems
//! Manager tagging needs.
//!
//! This crate provides:
//! - Organization and network lookup, fully paginated
//! - Systems Manager device inventory with cellular identifiers and tags
//! - Batched tag mutations (`modifyTags`, at most [`MAX_TAG_BATCH`] devices per call)
//! - Transparent wait-and-retry on `429 Too Many Requests`
//!
//! ## Example
//!
//! ```no_run
//! use dashboard::backend::Backend;
//! use dashboard::backend::meraki::MerakiBackend;
//! use dashboard::{DEVICE_FIELDS, ProductType};
//!
//! let backend = MerakiBackend::new("api-key");
//!
//! let orgs = backend.list_organizations().expect("request failed");
//! let networks = backend
//!     .list_networks(&orgs[0].id, ProductType::SystemsManager)
//!     .expect("request failed");
//! let devices = backend
//!     .list_managed_devices(&networks[0].id, DEVICE_FIELDS)
//!     .expect("request failed");
//!
//! println!("{} managed devices", devices.len());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod types;

pub use backend::{Backend, MockBackend, TagCall};
pub use error::{Error, ErrorCategory, Result};
pub use types::{
    DEVICE_FIELDS, DeviceSnapshot, MAX_TAG_BATCH, Network, Organization, ProductType, TagAction,
};
