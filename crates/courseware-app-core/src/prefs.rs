// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Player preferences consumed by the navigation engine.

use serde::{Deserialize, Serialize};

/// How a course start date is rendered into the "not live yet" redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DateStyle {
    /// `2/5/2013` (en-US numeric).
    #[default]
    MonthDayYear,
    /// `5/2/2013`.
    DayMonthYear,
    /// `2013-02-05`.
    Iso,
}

/// Saved settings for the courseware player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerPrefs {
    /// Prefix of the in-app redirect routes used for access denials.
    pub redirect_prefix: String,
    /// Date rendering for `course_not_started` denials.
    pub start_date_style: DateStyle,
    /// Persist the active unit back to the server when the sequence allows it.
    pub persist_positions: bool,
    /// Fire the first-section celebration when the course enables it.
    pub celebrations_enabled: bool,
    /// Upper bound on evaluation passes when a host settles a route.
    pub max_settle_passes: usize,
}

impl Default for PlayerPrefs {
    fn default() -> Self {
        Self {
            redirect_prefix: "/redirect".into(),
            start_date_style: DateStyle::MonthDayYear,
            persist_positions: true,
            celebrations_enabled: true,
            max_settle_passes: 16,
        }
    }
}
