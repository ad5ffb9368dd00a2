#![cfg_attr(doc, doc = include_str!("../README.md"))]

pub mod endpoint;
pub mod error;
#[cfg(any(feature = "spot", feature = "usdm", feature = "coinm"))]
pub mod market;
#[cfg(feature = "coinm")]
pub mod delivery;
#[cfg(feature = "usdm")]
pub mod futures;
pub(crate) mod serde_helpers;
#[cfg(feature = "spot")]
pub mod spot;
pub mod types;
pub mod ws;

use crate::error::Error;

pub type Result<T> = std::result::Result<T, Error>;
