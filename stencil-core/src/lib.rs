//! Stencil core library — domain types, ledger persistence, configuration, errors.
//!
//! - [`types`] — newtypes and tracking records
//! - [`ledger`] — load / save / prune of the sync ledger
//! - [`config`] — `.stencil/config.yaml` and the resolved [`Layout`]
//! - [`error`] — [`CoreError`]

pub mod config;
pub mod error;
pub mod ledger;
pub mod types;

pub use config::{Layout, StencilConfig};
pub use error::CoreError;
pub use ledger::Ledger;
pub use types::{
    ArtifactRecord, BlueprintId, ContainerLocator, ContentHash, ParameterSet, ADHOC_SENTINEL,
};
