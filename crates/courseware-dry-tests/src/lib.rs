// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for courseware crates.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`config`] - In-memory config store fake for testing without filesystem
//! - [`course`] - Course hierarchy builder for sandbox worlds and loaded stores

pub mod config;
pub mod course;

pub use config::InMemoryConfigStore;
pub use course::{CourseFixture, DEFAULT_START};
