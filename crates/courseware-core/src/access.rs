// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Access-denial resolution.
//!
//! A denied course never reaches the position rules: the backend error code
//! is mapped through a fixed table to an in-app redirect route, which the
//! engine applies as a history replace.

use std::fmt;

use courseware_app_core::prefs::{DateStyle, PlayerPrefs};
use serde::{Deserialize, Serialize};
use time::format_description::{self, well_known::Rfc3339};
use time::{Date, OffsetDateTime, UtcOffset};

use crate::ids::{CourseId, UnitId};
use crate::model::{Access, Course};

/// Backend reason for refusing courseware access.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DenialCode {
    /// Audit access window has closed.
    AuditExpired,
    /// Course start date is in the future.
    CourseNotStarted,
    /// Entrance survey must be completed.
    SurveyRequired,
    /// Prerequisite milestones are not met.
    UnfulfilledMilestones,
    /// Course is still served by the legacy frontend.
    MicrofrontendDisabled,
    /// Learner is not signed in.
    AuthenticationRequired,
    /// Learner is not enrolled.
    EnrollmentRequired,
    /// Code this player does not know.
    Unknown(String),
}

impl DenialCode {
    /// Parse a backend error code.
    pub fn from_code(code: &str) -> Self {
        match code {
            "audit_expired" => Self::AuditExpired,
            "course_not_started" => Self::CourseNotStarted,
            "survey_required" => Self::SurveyRequired,
            "unfulfilled_milestones" => Self::UnfulfilledMilestones,
            "microfrontend_disabled" => Self::MicrofrontendDisabled,
            "authentication_required" => Self::AuthenticationRequired,
            "enrollment_required" => Self::EnrollmentRequired,
            other => Self::Unknown(other.to_owned()),
        }
    }

    /// Backend spelling of the code.
    pub fn as_code(&self) -> &str {
        match self {
            Self::AuditExpired => "audit_expired",
            Self::CourseNotStarted => "course_not_started",
            Self::SurveyRequired => "survey_required",
            Self::UnfulfilledMilestones => "unfulfilled_milestones",
            Self::MicrofrontendDisabled => "microfrontend_disabled",
            Self::AuthenticationRequired => "authentication_required",
            Self::EnrollmentRequired => "enrollment_required",
            Self::Unknown(code) => code,
        }
    }
}

impl From<String> for DenialCode {
    fn from(code: String) -> Self {
        Self::from_code(&code)
    }
}

impl From<DenialCode> for String {
    fn from(code: DenialCode) -> Self {
        code.as_code().to_owned()
    }
}

impl fmt::Display for DenialCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

/// Redirect route for a denied course.
///
/// `course` may be absent when the fetch reported denial without metadata;
/// that lands on the course home like any unrecognized code.
pub fn denial_redirect(
    course_id: &CourseId,
    course: Option<&Course>,
    route_unit: Option<&UnitId>,
    prefs: &PlayerPrefs,
) -> String {
    let base = prefs.redirect_prefix.trim_end_matches('/');
    let course_home = format!("{base}/course-home/{course_id}");
    let Some(course) = course else {
        return course_home;
    };
    let Access::Denied { code, message } = &course.access else {
        return course_home;
    };
    match code {
        DenialCode::AuditExpired => format!(
            "{base}/dashboard?access_response_error={}",
            urlencoding::encode(message.as_deref().unwrap_or_default())
        ),
        DenialCode::CourseNotStarted => {
            let start = course
                .start
                .as_deref()
                .map(|raw| format_start_date(raw, prefs.start_date_style))
                .unwrap_or_default();
            format!("{base}/dashboard?notlive={start}")
        }
        DenialCode::SurveyRequired | DenialCode::UnfulfilledMilestones => {
            format!("{base}/dashboard")
        }
        DenialCode::MicrofrontendDisabled => match route_unit {
            Some(unit) => format!("{base}/courseware/{course_id}/unit/{unit}"),
            None => format!("{base}/courseware/{course_id}"),
        },
        DenialCode::AuthenticationRequired
        | DenialCode::EnrollmentRequired
        | DenialCode::Unknown(_) => course_home,
    }
}

/// Render a start timestamp as a calendar date (UTC).
///
/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates, the latter read as
/// UTC midnight. Anything else is returned verbatim.
pub fn format_start_date(raw: &str, style: DateStyle) -> String {
    let Some(date) = parse_start_date(raw) else {
        return raw.to_owned();
    };
    let (year, month, day) = (date.year(), u8::from(date.month()), date.day());
    match style {
        DateStyle::MonthDayYear => format!("{month}/{day}/{year}"),
        DateStyle::DayMonthYear => format!("{day}/{month}/{year}"),
        DateStyle::Iso => format!("{year:04}-{month:02}-{day:02}"),
    }
}

fn parse_start_date(raw: &str) -> Option<Date> {
    if let Ok(at) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(at.to_offset(UtcOffset::UTC).date());
    }
    let calendar = format_description::parse("[year]-[month]-[day]").ok()?;
    Date::parse(raw, &calendar).ok()
}
