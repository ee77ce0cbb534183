// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared application services for ballot tools (config, status indicator).
//! Keeps front-ends thin and transport-agnostic.

pub mod config;
pub mod status;
