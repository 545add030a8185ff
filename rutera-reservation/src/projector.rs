use serde::Serialize;

use crate::occupancy::SegmentStatus;
use rutera_catalog::Seat;

/// Display status of one seat for one viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatDisplayStatus {
    Available,
    Selected,
    Reserved,
    Booked,
}

impl From<SegmentStatus> for SeatDisplayStatus {
    fn from(status: SegmentStatus) -> Self {
        match status {
            SegmentStatus::Free => SeatDisplayStatus::Available,
            SegmentStatus::SelectedByViewer => SeatDisplayStatus::Selected,
            SegmentStatus::ReservedByOther => SeatDisplayStatus::Reserved,
            SegmentStatus::Booked => SeatDisplayStatus::Booked,
        }
    }
}

/// One seat in the rendered seat map.
#[derive(Debug, Clone, Serialize)]
pub struct SeatDisplay {
    pub seat: Seat,
    pub status: SeatDisplayStatus,
    pub is_selectable: bool,
}

/// Project one seat's occupancy classification onto its display record.
/// Deactivated seats keep their occupancy status for rendering but are never
/// selectable.
pub fn project_seat(seat: Seat, status: SegmentStatus) -> SeatDisplay {
    let status = SeatDisplayStatus::from(status);
    let is_selectable = seat.is_active
        && matches!(
            status,
            SeatDisplayStatus::Available | SeatDisplayStatus::Selected
        );
    SeatDisplay {
        seat,
        status,
        is_selectable,
    }
}

/// Pure projection of the whole bus layout. Recomputed on every poll or
/// change notification; never persisted.
pub fn project_seat_map(entries: Vec<(Seat, SegmentStatus)>) -> Vec<SeatDisplay> {
    entries
        .into_iter()
        .map(|(seat, status)| project_seat(seat, status))
        .collect()
}
