// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Course hierarchy builder for tests.

use courseware_core::{
    Access, Course, CourseId, CourseStatus, DenialCode, HierarchySnapshot, LoadStatus,
    MemoryStore, ResumePoint, Section, SectionId, Sequence, SequenceId, Unit, UnitId,
    WorldFixture,
};
use rustc_hash::FxHashMap;

/// Start timestamp given to fixture courses (matches the demo course).
pub const DEFAULT_START: &str = "2013-02-05T05:00:00Z";

/// Builder for a single-course hierarchy.
///
/// Sequences attach to the most recently added section; one named
/// `{course}-section` is created on demand.
///
/// # Example
///
/// ```
/// use courseware_dry_tests::CourseFixture;
/// use courseware_core::HierarchyStore;
///
/// let store = CourseFixture::new("C")
///     .section("SEC1")
///     .sequence("SEQ1", &["U1", "U2"])
///     .loaded_store();
///
/// assert_eq!(store.first_sequence_id(&"C".into()), Some("SEQ1".into()));
/// ```
#[derive(Debug, Clone)]
pub struct CourseFixture {
    course: Course,
    sections: Vec<Section>,
    sequences: Vec<Sequence>,
    failed_sequences: Vec<SequenceId>,
    status: CourseStatus,
    resume: Option<ResumePoint>,
}

impl CourseFixture {
    /// Empty course with [`DEFAULT_START`].
    pub fn new(course_id: &str) -> Self {
        let mut course = Course::new(course_id, Vec::new());
        course.start = Some(DEFAULT_START.to_owned());
        Self {
            course,
            sections: Vec::new(),
            sequences: Vec::new(),
            failed_sequences: Vec::new(),
            status: CourseStatus::Loaded,
            resume: None,
        }
    }

    /// Course id.
    pub fn course_id(&self) -> &CourseId {
        &self.course.id
    }

    /// Append a section.
    pub fn section(mut self, id: &str) -> Self {
        self.course.section_ids.push(SectionId::from(id));
        self.sections.push(Section {
            id: id.into(),
            sequence_ids: Vec::new(),
        });
        self
    }

    /// Append a sequence with `units` to the current section.
    pub fn sequence(mut self, id: &str, units: &[&str]) -> Self {
        if self.sections.is_empty() {
            let default = format!("{}-section", self.course.id);
            self = self.section(&default);
        }
        let units = units.iter().copied().map(UnitId::from).collect();
        if let Some(section) = self.sections.last_mut() {
            section.sequence_ids.push(id.into());
            self.sequences
                .push(Sequence::new(id, section.id.clone(), units));
        }
        self
    }

    /// Set the stored position of a sequence.
    pub fn active_index(self, sequence: &str, index: usize) -> Self {
        self.with_sequence(sequence, |s| s.active_unit_index = Some(index))
    }

    /// Turn a sequence into a timed exam served at `url`.
    pub fn exam(self, sequence: &str, url: &str) -> Self {
        self.with_sequence(sequence, |s| {
            s.is_time_limited = true;
            s.exam_url = Some(url.to_owned());
        })
    }

    /// Mark a sequence as gated.
    pub fn gated(self, sequence: &str) -> Self {
        self.with_sequence(sequence, |s| s.gated = true)
    }

    /// Disable position saving for a sequence.
    pub fn no_position_saving(self, sequence: &str) -> Self {
        self.with_sequence(sequence, |s| s.save_unit_position = false)
    }

    /// Make the backend fail to load a sequence even though it exists.
    pub fn failing_sequence(mut self, sequence: &str) -> Self {
        self.failed_sequences.push(sequence.into());
        self
    }

    /// Deny access with a backend error code.
    pub fn denied(mut self, code: &str, message: Option<&str>) -> Self {
        self.course.access = Access::Denied {
            code: DenialCode::from_code(code),
            message: message.map(str::to_owned),
        };
        self.status = CourseStatus::Denied;
        self
    }

    /// Override the course start timestamp.
    pub fn start(mut self, start: Option<&str>) -> Self {
        self.course.start = start.map(str::to_owned);
        self
    }

    /// Enable the first-section celebration.
    pub fn celebrate_first_section(mut self) -> Self {
        self.course.celebrations.first_section = true;
        self
    }

    /// Resume point the backend reports.
    pub fn resume(mut self, point: ResumePoint) -> Self {
        self.resume = Some(point);
        self
    }

    /// Backend contents for a sandbox host.
    pub fn world(&self) -> WorldFixture {
        let mut hierarchy = HierarchySnapshot {
            courses: vec![self.course.clone()],
            sections: self.sections.clone(),
            sequences: self.sequences.clone(),
            units: self.units(),
            ..HierarchySnapshot::default()
        };
        hierarchy
            .course_status
            .insert(self.course.id.clone(), self.status);
        for id in &self.failed_sequences {
            hierarchy.sequence_status.insert(id.clone(), LoadStatus::Failed);
        }
        let mut resume = FxHashMap::default();
        if let Some(point) = &self.resume {
            resume.insert(self.course.id.clone(), point.clone());
        }
        WorldFixture { hierarchy, resume }
    }

    /// A store in which every fetch has already completed.
    ///
    /// Failing sequences are absent and marked failed, as a real fetch
    /// would have left them.
    pub fn loaded_store(&self) -> MemoryStore {
        let mut store = MemoryStore::new();
        store.insert_course(self.course.clone());
        store.set_course_status(self.course.id.clone(), self.status);
        for section in &self.sections {
            store.insert_section(section.clone());
        }
        for unit in self.units() {
            store.insert_unit(unit);
        }
        for sequence in &self.sequences {
            if self.failed_sequences.contains(&sequence.id) {
                continue;
            }
            store.insert_sequence(sequence.clone());
            store.set_sequence_status(sequence.id.clone(), LoadStatus::Loaded);
        }
        for id in &self.failed_sequences {
            store.set_sequence_status(id.clone(), LoadStatus::Failed);
        }
        store
    }

    fn units(&self) -> Vec<Unit> {
        self.sequences
            .iter()
            .flat_map(|seq| {
                seq.unit_ids
                    .iter()
                    .map(|u| Unit::new(u.clone(), seq.id.clone()))
            })
            .collect()
    }

    fn with_sequence(mut self, id: &str, edit: impl FnOnce(&mut Sequence)) -> Self {
        if let Some(seq) = self.sequences.iter_mut().find(|s| s.id.as_str() == id) {
            edit(seq);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courseware_core::HierarchyStore;

    #[test]
    fn sequences_attach_to_latest_section() {
        let fixture = CourseFixture::new("C")
            .section("SEC1")
            .sequence("SEQ1", &["U1"])
            .section("SEC2")
            .sequence("SEQ2", &[]);
        let store = fixture.loaded_store();
        let c = CourseId::from("C");
        assert_eq!(
            store.section_of_sequence(&c, &"SEQ2".into()),
            Some("SEC2".into())
        );
        assert_eq!(store.unit(&"U1".into()).map(|u| u.sequence_id.as_str()), Some("SEQ1"));
    }

    #[test]
    fn implicit_section_is_created() {
        let store = CourseFixture::new("C").sequence("SEQ1", &[]).loaded_store();
        assert!(store.section(&"C-section".into()).is_some());
    }

    #[test]
    fn failing_sequence_is_marked_failed() {
        let fixture = CourseFixture::new("C")
            .sequence("SEQ1", &["U1"])
            .failing_sequence("SEQ1");
        let store = fixture.loaded_store();
        assert_eq!(store.sequence_status(&"SEQ1".into()), LoadStatus::Failed);
        assert!(store.sequence(&"SEQ1".into()).is_none());
        let world = fixture.world();
        assert_eq!(
            world.hierarchy.sequence_status.get(&SequenceId::from("SEQ1")),
            Some(&LoadStatus::Failed)
        );
    }
}
