//! Slot status tracking.

use std::collections::HashMap;

use edge_streaming::Slot;

/// Status of a slot in the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionStatus {
    /// Placeholder sent, data not yet resolved.
    Pending,
    /// Filled with rendered content.
    Completed,
    /// Filled with a fallback after a failure.
    Failed(String),
    /// Left for the browser to load.
    Deferred,
}

impl SectionStatus {
    /// Whether nothing more will be streamed for this slot.
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// A slot being tracked by the scheduler.
#[derive(Debug)]
pub struct ScheduledSection {
    /// The slot definition.
    pub slot: Slot,
    /// Current status.
    pub status: SectionStatus,
}

/// Tracks every slot of a page from placeholder to fill.
#[derive(Debug, Default)]
pub struct SectionScheduler {
    sections: HashMap<String, ScheduledSection>,
    /// Declaration order.
    order: Vec<String>,
}

impl SectionScheduler {
    /// Create a new scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a slot. Re-adding a name replaces the earlier slot.
    pub fn add_slot(&mut self, slot: Slot) {
        let name = slot.name.clone();
        if !self.order.contains(&name) {
            self.order.push(name.clone());
        }
        self.sections.insert(
            name,
            ScheduledSection {
                slot,
                status: SectionStatus::Pending,
            },
        );
    }

    /// Mark a slot as filled.
    pub fn complete_section(&mut self, name: &str) {
        self.set_status(name, SectionStatus::Completed);
    }

    /// Mark a slot as failed.
    pub fn fail_section(&mut self, name: &str, error: impl Into<String>) {
        self.set_status(name, SectionStatus::Failed(error.into()));
    }

    /// Mark a slot as left to the browser.
    pub fn defer_section(&mut self, name: &str) {
        self.set_status(name, SectionStatus::Deferred);
    }

    /// Slots in declaration order.
    pub fn slots(&self) -> impl Iterator<Item = &Slot> {
        self.order
            .iter()
            .filter_map(|name| self.sections.get(name))
            .map(|s| &s.slot)
    }

    /// Names of slots still pending, in declaration order.
    pub fn pending_sections(&self) -> Vec<&str> {
        self.order
            .iter()
            .filter(|name| {
                self.sections
                    .get(*name)
                    .is_some_and(|s| s.status == SectionStatus::Pending)
            })
            .map(String::as_str)
            .collect()
    }

    /// Check if every slot is settled.
    pub fn is_complete(&self) -> bool {
        self.sections.values().all(|s| s.status.is_settled())
    }

    /// Get slot status by name.
    pub fn status(&self, name: &str) -> Option<&SectionStatus> {
        self.sections.get(name).map(|s| &s.status)
    }

    /// Number of failed slots.
    pub fn failed_count(&self) -> usize {
        self.sections
            .values()
            .filter(|s| matches!(s.status, SectionStatus::Failed(_)))
            .count()
    }

    fn set_status(&mut self, name: &str, status: SectionStatus) {
        if let Some(s) = self.sections.get_mut(name) {
            s.status = status;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> SectionScheduler {
        let mut s = SectionScheduler::new();
        s.add_slot(Slot::new("sizes"));
        s.add_slot(Slot::new("recommended"));
        s.add_slot(Slot::new("reviews"));
        s
    }

    #[test]
    fn test_tracks_status_transitions() {
        let mut s = scheduler();
        assert_eq!(s.pending_sections(), vec!["sizes", "recommended", "reviews"]);

        s.complete_section("reviews");
        s.fail_section("sizes", "HTTP 503");
        assert_eq!(s.pending_sections(), vec!["recommended"]);
        assert_eq!(s.failed_count(), 1);
        assert!(!s.is_complete());

        s.defer_section("recommended");
        assert!(s.is_complete());
        assert_eq!(s.status("recommended"), Some(&SectionStatus::Deferred));
    }

    #[test]
    fn test_slots_keep_declaration_order() {
        let mut s = scheduler();
        s.add_slot(Slot::new("sizes").with_placeholder("x"));

        let names: Vec<&str> = s.slots().map(|slot| slot.name.as_str()).collect();
        assert_eq!(names, vec!["sizes", "recommended", "reviews"]);
        assert_eq!(s.slots().next().map(|slot| slot.placeholder.as_str()), Some("x"));
    }

    #[test]
    fn test_unknown_names_are_ignored() {
        let mut s = scheduler();
        s.complete_section("banner");
        assert_eq!(s.status("banner"), None);
        assert_eq!(s.pending_sections().len(), 3);
    }
}
