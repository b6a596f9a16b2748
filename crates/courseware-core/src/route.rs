// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Navigational references and their path form.
//!
//! The routing layer hands the engine `/course/{course}[/{block}[/{unit}]]`.
//! Only the three-segment form is canonical; the shorter ones are transient
//! inputs the resolver rewrites away.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::{BlockId, CourseId, SequenceId, UnitId};

/// Leading path segment of every courseware route.
pub const COURSE_SEGMENT: &str = "course";

/// Errors raised while parsing a courseware path.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    /// Path does not start with `/course/`.
    #[error("not a courseware path: {0:?}")]
    NotCourseware(String),
    /// `/course/` with no course id after it.
    #[error("courseware path has no course id")]
    MissingCourse,
    /// More than course/block/unit segments.
    #[error("courseware path has {0} id segments (max 3)")]
    TooManySegments(usize),
}

/// `(courseId, sequenceOrSectionId?, unitId?)` taken from the current URL.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoursewareRef {
    course_id: CourseId,
    block_id: Option<BlockId>,
    unit_id: Option<UnitId>,
}

impl CoursewareRef {
    /// Bare course reference (`/course/{c}`).
    pub fn course(course_id: impl Into<CourseId>) -> Self {
        Self {
            course_id: course_id.into(),
            block_id: None,
            unit_id: None,
        }
    }

    /// Course + block reference (`/course/{c}/{b}`).
    pub fn block(course_id: impl Into<CourseId>, block_id: impl Into<BlockId>) -> Self {
        Self {
            course_id: course_id.into(),
            block_id: Some(block_id.into()),
            unit_id: None,
        }
    }

    /// Fully specified reference (`/course/{c}/{b}/{u}`).
    pub fn unit(
        course_id: impl Into<CourseId>,
        block_id: impl Into<BlockId>,
        unit_id: impl Into<UnitId>,
    ) -> Self {
        Self {
            course_id: course_id.into(),
            block_id: Some(block_id.into()),
            unit_id: Some(unit_id.into()),
        }
    }

    /// Sequence reference, optionally down to a unit.
    pub fn sequence(
        course_id: &CourseId,
        sequence_id: &SequenceId,
        unit_id: Option<&UnitId>,
    ) -> Self {
        Self {
            course_id: course_id.clone(),
            block_id: Some(BlockId::from(sequence_id)),
            unit_id: unit_id.cloned(),
        }
    }

    /// Parse a routed path.
    pub fn parse(path: &str) -> Result<Self, RouteError> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        if segments.next() != Some(COURSE_SEGMENT) {
            return Err(RouteError::NotCourseware(path.to_owned()));
        }
        let ids: Vec<&str> = segments.collect();
        match ids.as_slice() {
            [] => Err(RouteError::MissingCourse),
            [course] => Ok(Self::course(*course)),
            [course, block] => Ok(Self::block(*course, *block)),
            [course, block, unit] => Ok(Self::unit(*course, *block, *unit)),
            more => Err(RouteError::TooManySegments(more.len())),
        }
    }

    /// Course component.
    pub fn course_id(&self) -> &CourseId {
        &self.course_id
    }

    /// Second component, not yet classified.
    pub fn block_id(&self) -> Option<&BlockId> {
        self.block_id.as_ref()
    }

    /// Unit component.
    pub fn unit_id(&self) -> Option<&UnitId> {
        self.unit_id.as_ref()
    }

    /// Second component read as a sequence id.
    pub fn sequence_id(&self) -> Option<SequenceId> {
        self.block_id.as_ref().map(BlockId::as_sequence)
    }

    /// True when all three components are present.
    pub fn is_complete(&self) -> bool {
        self.block_id.is_some() && self.unit_id.is_some()
    }
}

impl fmt::Display for CoursewareRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{COURSE_SEGMENT}/{}", self.course_id)?;
        if let Some(block) = &self.block_id {
            write!(f, "/{block}")?;
            if let Some(unit) = &self.unit_id {
                write!(f, "/{unit}")?;
            }
        }
        Ok(())
    }
}

impl FromStr for CoursewareRef {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn parses_every_shape() {
        assert_eq!(
            CoursewareRef::parse("/course/C").unwrap(),
            CoursewareRef::course("C")
        );
        assert_eq!(
            CoursewareRef::parse("/course/C/SEQ1/").unwrap(),
            CoursewareRef::block("C", "SEQ1")
        );
        assert_eq!(
            CoursewareRef::parse("course/C/SEQ1/U2").unwrap(),
            CoursewareRef::unit("C", "SEQ1", "U2")
        );
    }

    #[test]
    fn rejects_foreign_and_overlong_paths() {
        assert!(matches!(
            CoursewareRef::parse("/redirect/dashboard"),
            Err(RouteError::NotCourseware(_))
        ));
        assert_eq!(CoursewareRef::parse("/course/"), Err(RouteError::MissingCourse));
        assert_eq!(
            CoursewareRef::parse("/course/C/S/U/extra"),
            Err(RouteError::TooManySegments(4))
        );
    }

    #[test]
    fn display_renders_the_path_shape() {
        let key = "course-v1:edX+DemoX+Demo_Course";
        let r = CoursewareRef::unit(key, "block-v1:seq", "block-v1:unit");
        let rendered = r.to_string();
        assert_eq!(
            rendered,
            "/course/course-v1:edX+DemoX+Demo_Course/block-v1:seq/block-v1:unit"
        );
        assert_eq!(CoursewareRef::parse(&rendered).unwrap(), r);
        assert!(r.is_complete());
        assert!(!CoursewareRef::course(key).is_complete());
    }
}
