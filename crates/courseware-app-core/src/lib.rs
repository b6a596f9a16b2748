// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared application services for the courseware player (config, prefs).
//! Keeps the navigation engine and its hosts free of storage details.

pub mod config;
pub mod config_port;
pub mod prefs;
