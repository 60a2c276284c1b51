//! Track ("Schiene") model.

use serde::{Deserialize, Serialize};

use super::TrackId;

/// A parallel timetable slot.
///
/// Courses placed in the same track run at the same time, so a student
/// enrolled in two courses of one track has a collision.
/// Numbers of a valid blocking form the contiguous range `1..=N`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Unique identifier (non-negative).
    pub id: TrackId,
    /// Display number, 1-based.
    pub number: i32,
    /// Optional label.
    pub name: String,
}

impl Track {
    /// Creates a track with the given id and number.
    pub fn new(id: TrackId, number: i32) -> Self {
        Self {
            id,
            number,
            name: String::new(),
        }
    }

    /// Sets the label.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_builder() {
        let t = Track::new(10, 3).with_name("Block C");
        assert_eq!(t.id, 10);
        assert_eq!(t.number, 3);
        assert_eq!(t.name, "Block C");
    }
}
