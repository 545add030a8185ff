pub mod finalize;
pub mod holds;
pub mod occupancy;
pub mod projector;
pub mod segment;

pub use finalize::FinalizeCoordinator;
pub use holds::{HoldManager, HoldPolicy, DEFAULT_HOLD_TTL_SECONDS};
pub use occupancy::{classify_segment, OccupancyIndex, SegmentStatus};
pub use projector::{project_seat, project_seat_map, SeatDisplay, SeatDisplayStatus};
pub use segment::Segment;
