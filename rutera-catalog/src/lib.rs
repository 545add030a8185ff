pub mod route;
pub mod seating;
pub mod trip;

pub use route::{CatalogError, Stop, StopSequence};
pub use seating::{Seat, SeatLayout, SeatingError};
pub use trip::Trip;
