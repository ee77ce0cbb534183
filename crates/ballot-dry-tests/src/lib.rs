// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for ballot crates.
//!
//! # Modules
//!
//! - [`config`] - In-memory config store fake for testing without filesystem
//! - [`records`] - Poll, vote and profile record builders with stable ids
//! - [`signer`] - Fake signer with accept/reject/unavailable/unsigned modes
//! - [`source`] - Scripted event source with timed steps and a query log
//! - [`view`] - Poll view that records every call
#![forbid(unsafe_code)]

pub mod config;
pub mod records;
pub mod signer;
pub mod source;
pub mod view;

pub use config::InMemoryConfigStore;
pub use records::{hex_id, RecordBuilder};
pub use signer::{FakeSigner, SignerMode};
pub use source::{AckStep, ScriptedSource, Step};
pub use view::{RecordingView, ViewEvent};
