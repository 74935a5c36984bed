//! CLI command implementations

pub(crate) mod common;
pub(crate) mod inspect;
pub(crate) mod migrate;
pub(crate) mod repair;
pub(crate) mod status;
