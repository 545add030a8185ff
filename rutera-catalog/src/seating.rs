use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A physical seat in a published bus layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seat {
    pub id: Uuid,
    pub bus_id: Uuid,
    pub row_number: i32,
    pub column_number: i32,
    pub is_active: bool,
}

/// The published seat layout of one bus.
///
/// A layout is immutable once published; deactivating a seat is the only
/// mutation it admits. Deactivated seats are excluded from new holds and
/// bookings but historical rows referencing them are untouched.
pub struct SeatLayout {
    bus_id: Uuid,
    seats: HashMap<Uuid, Seat>,
}

impl SeatLayout {
    pub fn new(bus_id: Uuid, seats: Vec<Seat>) -> Result<Self, SeatingError> {
        let mut by_id = HashMap::new();
        let mut positions = HashMap::new();

        for seat in seats {
            if seat.bus_id != bus_id {
                return Err(SeatingError::ForeignSeat {
                    seat_id: seat.id,
                    expected: bus_id,
                    actual: seat.bus_id,
                });
            }
            if let Some(other) = positions.insert((seat.row_number, seat.column_number), seat.id) {
                return Err(SeatingError::DuplicatePosition {
                    row: seat.row_number,
                    column: seat.column_number,
                    first: other,
                    second: seat.id,
                });
            }
            by_id.insert(seat.id, seat);
        }

        Ok(Self {
            bus_id,
            seats: by_id,
        })
    }

    pub fn bus_id(&self) -> Uuid {
        self.bus_id
    }

    pub fn get(&self, seat_id: Uuid) -> Option<&Seat> {
        self.seats.get(&seat_id)
    }

    /// All seats, active or not, in (row, column) order for rendering.
    pub fn seats(&self) -> Vec<&Seat> {
        let mut seats: Vec<&Seat> = self.seats.values().collect();
        seats.sort_by_key(|s| (s.row_number, s.column_number));
        seats
    }

    /// Seats still eligible for new holds and bookings.
    pub fn active_seats(&self) -> Vec<&Seat> {
        self.seats()
            .into_iter()
            .filter(|s| s.is_active)
            .collect()
    }

    /// The only mutation a published layout admits.
    pub fn deactivate(&mut self, seat_id: Uuid) -> Result<(), SeatingError> {
        let seat = self
            .seats
            .get_mut(&seat_id)
            .ok_or(SeatingError::UnknownSeat(seat_id))?;
        seat.is_active = false;
        Ok(())
    }

    pub fn seat_count(&self) -> usize {
        self.seats.len()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SeatingError {
    #[error("Seat not found: {0}")]
    UnknownSeat(Uuid),

    #[error("Seat {seat_id} belongs to bus {actual}, not bus {expected}")]
    ForeignSeat {
        seat_id: Uuid,
        expected: Uuid,
        actual: Uuid,
    },

    #[error("Seats {first} and {second} share position row {row} column {column}")]
    DuplicatePosition {
        row: i32,
        column: i32,
        first: Uuid,
        second: Uuid,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seat(bus_id: Uuid, row: i32, column: i32) -> Seat {
        Seat {
            id: Uuid::new_v4(),
            bus_id,
            row_number: row,
            column_number: column,
            is_active: true,
        }
    }

    #[test]
    fn test_layout_ordering_and_deactivation() {
        let bus_id = Uuid::new_v4();
        let seats = vec![seat(bus_id, 2, 1), seat(bus_id, 1, 2), seat(bus_id, 1, 1)];
        let target = seats[2].id;

        let mut layout = SeatLayout::new(bus_id, seats).unwrap();
        assert_eq!(layout.seat_count(), 3);
        assert_eq!(
            layout
                .seats()
                .iter()
                .map(|s| (s.row_number, s.column_number))
                .collect::<Vec<_>>(),
            vec![(1, 1), (1, 2), (2, 1)]
        );

        layout.deactivate(target).unwrap();
        assert_eq!(layout.active_seats().len(), 2);
        // Still present for historical rendering
        assert!(layout.get(target).is_some());
        assert!(!layout.get(target).unwrap().is_active);
    }

    #[test]
    fn test_duplicate_position_rejected() {
        let bus_id = Uuid::new_v4();
        let seats = vec![seat(bus_id, 1, 1), seat(bus_id, 1, 1)];

        assert!(matches!(
            SeatLayout::new(bus_id, seats),
            Err(SeatingError::DuplicatePosition { .. })
        ));
    }

    #[test]
    fn test_deactivate_unknown_seat() {
        let bus_id = Uuid::new_v4();
        let mut layout = SeatLayout::new(bus_id, vec![seat(bus_id, 1, 1)]).unwrap();

        assert!(matches!(
            layout.deactivate(Uuid::new_v4()),
            Err(SeatingError::UnknownSeat(_))
        ));
    }
}
