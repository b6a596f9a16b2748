// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Hierarchy Store: read port for the engine plus an in-memory implementation.
//!
//! The engine only reads. Fetch collaborators own the writer half on
//! [`MemoryStore`]; each evaluation pass sees one consistent snapshot because
//! nothing writes while a pass runs.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::{CourseId, SectionId, SequenceId, UnitId};
use crate::model::{Course, CourseStatus, LoadStatus, Section, Sequence, Unit};

/// Read-only view over cached hierarchy records.
pub trait HierarchyStore {
    /// Status of the course fetch; unknown courses are `Loading`.
    fn course_status(&self, id: &CourseId) -> CourseStatus;
    /// Status of the sequence fetch keyed by the id it was issued for.
    fn sequence_status(&self, id: &SequenceId) -> LoadStatus;
    /// Course record.
    fn course(&self, id: &CourseId) -> Option<&Course>;
    /// Section record.
    fn section(&self, id: &SectionId) -> Option<&Section>;
    /// Sequence record.
    fn sequence(&self, id: &SequenceId) -> Option<&Sequence>;
    /// Unit record.
    fn unit(&self, id: &UnitId) -> Option<&Unit>;

    /// All sequence ids of a loaded course, flattened in outline order.
    fn course_sequence_ids(&self, id: &CourseId) -> Vec<SequenceId> {
        if self.course_status(id) != CourseStatus::Loaded {
            return Vec::new();
        }
        let Some(course) = self.course(id) else {
            return Vec::new();
        };
        course
            .section_ids
            .iter()
            .filter_map(|sid| self.section(sid))
            .flat_map(|section| section.sequence_ids.iter().cloned())
            .collect()
    }

    /// First sequence of a loaded course, skipping empty sections.
    fn first_sequence_id(&self, id: &CourseId) -> Option<SequenceId> {
        self.course_sequence_ids(id).into_iter().next()
    }

    /// Section that lists `sequence` in the course outline.
    fn section_of_sequence(&self, course: &CourseId, sequence: &SequenceId) -> Option<SectionId> {
        let course = self.course(course)?;
        course
            .section_ids
            .iter()
            .filter_map(|sid| self.section(sid))
            .find(|section| section.sequence_ids.contains(sequence))
            .map(|section| section.id.clone())
            .or_else(|| self.sequence(sequence).map(|seq| seq.section_id.clone()))
    }
}

/// Errors raised when a snapshot violates the hierarchy invariants.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnapshotError {
    /// A child id list repeats an id.
    #[error("{parent} lists {child} more than once")]
    DuplicateChild {
        /// Parent block.
        parent: String,
        /// Repeated child.
        child: String,
    },
}

/// Serializable picture of the store (fixtures, CLI input).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchySnapshot {
    /// Course records.
    pub courses: Vec<Course>,
    /// Section records.
    pub sections: Vec<Section>,
    /// Sequence records.
    pub sequences: Vec<Sequence>,
    /// Unit records.
    pub units: Vec<Unit>,
    /// Course fetch statuses.
    pub course_status: FxHashMap<CourseId, CourseStatus>,
    /// Sequence fetch statuses.
    pub sequence_status: FxHashMap<SequenceId, LoadStatus>,
}

/// In-memory [`HierarchyStore`] written by fetch handlers.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    courses: FxHashMap<CourseId, Course>,
    sections: FxHashMap<SectionId, Section>,
    sequences: FxHashMap<SequenceId, Sequence>,
    units: FxHashMap<UnitId, Unit>,
    course_status: FxHashMap<CourseId, CourseStatus>,
    sequence_status: FxHashMap<SequenceId, LoadStatus>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a snapshot after checking its invariants.
    pub fn from_snapshot(snapshot: HierarchySnapshot) -> Result<Self, SnapshotError> {
        validate(&snapshot)?;
        let mut store = Self::new();
        for course in snapshot.courses {
            store.insert_course(course);
        }
        for section in snapshot.sections {
            store.insert_section(section);
        }
        for sequence in snapshot.sequences {
            store.insert_sequence(sequence);
        }
        for unit in snapshot.units {
            store.insert_unit(unit);
        }
        store.course_status.extend(snapshot.course_status);
        store.sequence_status.extend(snapshot.sequence_status);
        Ok(store)
    }

    /// Export the current contents (ordering by id for stable output).
    pub fn to_snapshot(&self) -> HierarchySnapshot {
        fn sorted<K: Ord + Clone, V: Clone>(map: &FxHashMap<K, V>) -> Vec<V> {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            entries.into_iter().map(|(_, v)| v.clone()).collect()
        }
        HierarchySnapshot {
            courses: sorted(&self.courses),
            sections: sorted(&self.sections),
            sequences: sorted(&self.sequences),
            units: sorted(&self.units),
            course_status: self.course_status.clone(),
            sequence_status: self.sequence_status.clone(),
        }
    }

    /// Insert or overwrite a course record.
    pub fn insert_course(&mut self, course: Course) {
        self.courses.insert(course.id.clone(), course);
    }

    /// Insert or overwrite a section record.
    pub fn insert_section(&mut self, section: Section) {
        self.sections.insert(section.id.clone(), section);
    }

    /// Insert or overwrite a sequence record.
    pub fn insert_sequence(&mut self, sequence: Sequence) {
        self.sequences.insert(sequence.id.clone(), sequence);
    }

    /// Insert or overwrite a unit record.
    pub fn insert_unit(&mut self, unit: Unit) {
        self.units.insert(unit.id.clone(), unit);
    }

    /// Record a course fetch outcome.
    pub fn set_course_status(&mut self, id: CourseId, status: CourseStatus) {
        self.course_status.insert(id, status);
    }

    /// Record a sequence fetch outcome.
    pub fn set_sequence_status(&mut self, id: SequenceId, status: LoadStatus) {
        self.sequence_status.insert(id, status);
    }

    /// Mutable access to a stored sequence (position updates after a save).
    pub fn sequence_mut(&mut self, id: &SequenceId) -> Option<&mut Sequence> {
        self.sequences.get_mut(id)
    }
}

impl HierarchyStore for MemoryStore {
    fn course_status(&self, id: &CourseId) -> CourseStatus {
        self.course_status.get(id).copied().unwrap_or_default()
    }

    fn sequence_status(&self, id: &SequenceId) -> LoadStatus {
        self.sequence_status.get(id).copied().unwrap_or_default()
    }

    fn course(&self, id: &CourseId) -> Option<&Course> {
        self.courses.get(id)
    }

    fn section(&self, id: &SectionId) -> Option<&Section> {
        self.sections.get(id)
    }

    fn sequence(&self, id: &SequenceId) -> Option<&Sequence> {
        self.sequences.get(id)
    }

    fn unit(&self, id: &UnitId) -> Option<&Unit> {
        self.units.get(id)
    }
}

fn validate(snapshot: &HierarchySnapshot) -> Result<(), SnapshotError> {
    fn unique<T: PartialEq + std::fmt::Display>(
        parent: &str,
        ids: &[T],
    ) -> Result<(), SnapshotError> {
        for (i, id) in ids.iter().enumerate() {
            if ids[..i].contains(id) {
                return Err(SnapshotError::DuplicateChild {
                    parent: parent.to_owned(),
                    child: id.to_string(),
                });
            }
        }
        Ok(())
    }
    for course in &snapshot.courses {
        unique(course.id.as_str(), &course.section_ids)?;
    }
    for section in &snapshot.sections {
        unique(section.id.as_str(), &section.sequence_ids)?;
    }
    for sequence in &snapshot.sequences {
        unique(sequence.id.as_str(), &sequence.unit_ids)?;
    }
    Ok(())
}
