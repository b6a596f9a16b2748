// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! String identifiers for courseware blocks.
//!
//! Each level of the hierarchy gets its own newtype so a section id cannot be
//! handed to a sequence lookup by accident. [`BlockId`] is the odd one out: it
//! is the second path component, which stays ambiguous (section, sequence or
//! unit) until the resolver has looked it up.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! block_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw id.
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// Borrow the raw id.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

block_id!(
    /// Course key, e.g. `course-v1:edX+DemoX+Demo_Course`.
    CourseId
);
block_id!(
    /// Section (chapter) usage key.
    SectionId
);
block_id!(
    /// Sequence (subsection) usage key.
    SequenceId
);
block_id!(
    /// Unit (vertical) usage key.
    UnitId
);
block_id!(
    /// Second path component before it has been classified.
    BlockId
);

impl BlockId {
    /// Read the component as a sequence id.
    pub fn as_sequence(&self) -> SequenceId {
        SequenceId(self.0.clone())
    }

    /// Read the component as a section id.
    pub fn as_section(&self) -> SectionId {
        SectionId(self.0.clone())
    }

    /// Read the component as a unit id.
    pub fn as_unit(&self) -> UnitId {
        UnitId(self.0.clone())
    }
}

impl From<SequenceId> for BlockId {
    fn from(id: SequenceId) -> Self {
        Self(id.0)
    }
}

impl From<&SequenceId> for BlockId {
    fn from(id: &SequenceId) -> Self {
        Self(id.0.clone())
    }
}

impl From<SectionId> for BlockId {
    fn from(id: SectionId) -> Self {
        Self(id.0)
    }
}

impl From<&SectionId> for BlockId {
    fn from(id: &SectionId) -> Self {
        Self(id.0.clone())
    }
}

impl From<&UnitId> for BlockId {
    fn from(id: &UnitId) -> Self {
        Self(id.0.clone())
    }
}
