// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! CLI entry point for courseware navigation.

use anyhow::Result;
use courseware_cli::entrypoint;

fn main() -> Result<()> {
    entrypoint()
}
