//! # Aggregates
//!
//! Caller-facing wrappers returned by relationship queries
//! (`get_events_from_pub`, `get_pubs_from_event`, `get_favorites_from_user`).
//!
//! An aggregate is never absent: "no matches" is an empty aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Event, Pub};

// =============================================================================
// PubList
// =============================================================================

/// An ordered collection of pubs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PubList {
    pubs: Vec<Pub>,
}

impl PubList {
    pub fn new(pubs: Vec<Pub>) -> Self {
        PubList { pubs }
    }

    pub fn len(&self) -> usize {
        self.pubs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pubs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Pub> {
        self.pubs.iter()
    }

    /// Finds a pub by id.
    pub fn get(&self, id: &str) -> Option<&Pub> {
        self.pubs.iter().find(|p| p.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Ids in list order.
    pub fn ids(&self) -> Vec<&str> {
        self.pubs.iter().map(Pub::id).collect()
    }

    pub fn into_vec(self) -> Vec<Pub> {
        self.pubs
    }
}

impl FromIterator<Pub> for PubList {
    fn from_iter<I: IntoIterator<Item = Pub>>(iter: I) -> Self {
        PubList::new(iter.into_iter().collect())
    }
}

impl IntoIterator for PubList {
    type Item = Pub;
    type IntoIter = std::vec::IntoIter<Pub>;

    fn into_iter(self) -> Self::IntoIter {
        self.pubs.into_iter()
    }
}

impl<'a> IntoIterator for &'a PubList {
    type Item = &'a Pub;
    type IntoIter = std::slice::Iter<'a, Pub>;

    fn into_iter(self) -> Self::IntoIter {
        self.pubs.iter()
    }
}

// =============================================================================
// EventList
// =============================================================================

/// An ordered collection of events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventList {
    events: Vec<Event>,
}

impl EventList {
    pub fn new(events: Vec<Event>) -> Self {
        EventList { events }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    /// Finds an event by id.
    pub fn get(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.events.iter().map(Event::id).collect()
    }

    /// Events that are not finished at `now`, keeping the list order.
    pub fn upcoming(&self, now: DateTime<Utc>) -> EventList {
        self.events
            .iter()
            .filter(|e| !e.is_finished(now))
            .cloned()
            .collect()
    }

    pub fn into_vec(self) -> Vec<Event> {
        self.events
    }
}

impl FromIterator<Event> for EventList {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        EventList::new(iter.into_iter().collect())
    }
}

impl IntoIterator for EventList {
    type Item = Event;
    type IntoIter = std::vec::IntoIter<Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

impl<'a> IntoIterator for &'a EventList {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_pub_list_lookup() {
        let list: PubList = ["1111", "2222"]
            .into_iter()
            .map(|id| Pub::builder(id, format!("Pub {id}")).build().unwrap())
            .collect();

        assert_eq!(list.len(), 2);
        assert_eq!(list.ids(), vec!["1111", "2222"]);
        assert!(list.contains("2222"));
        assert!(list.get("3333").is_none());
        assert!(PubList::default().is_empty());
    }

    #[test]
    fn test_event_list_upcoming() {
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap();
        let past = Event::builder("past", "Yesterday's Quiz", now - Duration::days(1))
            .ends_at(now - Duration::hours(20))
            .build()
            .unwrap();
        let running = Event::builder("running", "All-day Fest", now - Duration::hours(2))
            .ends_at(now + Duration::hours(6))
            .build()
            .unwrap();
        let next = Event::builder("next", "Live Music", now + Duration::days(2))
            .build()
            .unwrap();

        let list = EventList::new(vec![past, running, next]);
        let upcoming = list.upcoming(now);
        assert_eq!(upcoming.ids(), vec!["running", "next"]);
    }
}
