use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A scheduled stop on a bus route. `stop_order` is unique and strictly
/// increasing per route, so the stops of a route form a total order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stop {
    pub id: Uuid,
    pub route_id: Uuid,
    pub stop_order: i32,
}

/// The validated, ordered stop sequence of a single route.
///
/// Resolves passenger itineraries (origin stop, destination stop) into the
/// half-open stop-order pairs the reservation core works with.
pub struct StopSequence {
    route_id: Uuid,
    stops: Vec<Stop>,
}

impl StopSequence {
    pub fn new(route_id: Uuid, mut stops: Vec<Stop>) -> Result<Self, CatalogError> {
        for stop in &stops {
            if stop.route_id != route_id {
                return Err(CatalogError::ForeignStop {
                    stop_id: stop.id,
                    expected: route_id,
                    actual: stop.route_id,
                });
            }
        }

        stops.sort_by_key(|s| s.stop_order);
        for pair in stops.windows(2) {
            if pair[0].stop_order == pair[1].stop_order {
                return Err(CatalogError::DuplicateStopOrder {
                    route_id,
                    stop_order: pair[1].stop_order,
                });
            }
        }

        Ok(Self { route_id, stops })
    }

    pub fn route_id(&self) -> Uuid {
        self.route_id
    }

    /// Stops in boarding order.
    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    pub fn order_of(&self, stop_id: Uuid) -> Option<i32> {
        self.stops
            .iter()
            .find(|s| s.id == stop_id)
            .map(|s| s.stop_order)
    }

    /// Resolve two stop ids into (boarding order, alighting order).
    /// The origin must precede the destination.
    pub fn segment_orders(
        &self,
        origin_stop: Uuid,
        destination_stop: Uuid,
    ) -> Result<(i32, i32), CatalogError> {
        let origin = self
            .order_of(origin_stop)
            .ok_or(CatalogError::UnknownStop(origin_stop))?;
        let destination = self
            .order_of(destination_stop)
            .ok_or(CatalogError::UnknownStop(destination_stop))?;

        if origin >= destination {
            return Err(CatalogError::InvalidSegment {
                origin,
                destination,
            });
        }

        Ok((origin, destination))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Stop not found: {0}")]
    UnknownStop(Uuid),

    #[error("Stop {stop_id} belongs to route {actual}, not route {expected}")]
    ForeignStop {
        stop_id: Uuid,
        expected: Uuid,
        actual: Uuid,
    },

    #[error("Duplicate stop_order {stop_order} on route {route_id}")]
    DuplicateStopOrder { route_id: Uuid, stop_order: i32 },

    #[error("Invalid segment: origin order {origin} must precede destination order {destination}")]
    InvalidSegment { origin: i32, destination: i32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop(route_id: Uuid, order: i32) -> Stop {
        Stop {
            id: Uuid::new_v4(),
            route_id,
            stop_order: order,
        }
    }

    #[test]
    fn test_segment_resolution() {
        let route_id = Uuid::new_v4();
        let stops = vec![stop(route_id, 2), stop(route_id, 0), stop(route_id, 1)];
        let origin_id = stops[1].id;
        let destination_id = stops[0].id;

        let seq = StopSequence::new(route_id, stops).unwrap();

        // Sorted on construction regardless of input order
        assert_eq!(
            seq.stops().iter().map(|s| s.stop_order).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );

        let (origin, destination) = seq.segment_orders(origin_id, destination_id).unwrap();
        assert_eq!((origin, destination), (0, 2));
    }

    #[test]
    fn test_backwards_segment_rejected() {
        let route_id = Uuid::new_v4();
        let stops = vec![stop(route_id, 0), stop(route_id, 1)];
        let first = stops[0].id;
        let second = stops[1].id;

        let seq = StopSequence::new(route_id, stops).unwrap();

        assert!(matches!(
            seq.segment_orders(second, first),
            Err(CatalogError::InvalidSegment { .. })
        ));
        // Zero-length segment is just as invalid
        assert!(matches!(
            seq.segment_orders(first, first),
            Err(CatalogError::InvalidSegment { .. })
        ));
    }

    #[test]
    fn test_duplicate_stop_order_rejected() {
        let route_id = Uuid::new_v4();
        let stops = vec![stop(route_id, 0), stop(route_id, 1), stop(route_id, 1)];

        assert!(matches!(
            StopSequence::new(route_id, stops),
            Err(CatalogError::DuplicateStopOrder { .. })
        ));
    }

    #[test]
    fn test_foreign_stop_rejected() {
        let route_id = Uuid::new_v4();
        let stops = vec![stop(route_id, 0), stop(Uuid::new_v4(), 1)];

        assert!(matches!(
            StopSequence::new(route_id, stops),
            Err(CatalogError::ForeignStop { .. })
        ));
    }

    #[test]
    fn test_unknown_stop() {
        let route_id = Uuid::new_v4();
        let stops = vec![stop(route_id, 0), stop(route_id, 1)];
        let known = stops[0].id;

        let seq = StopSequence::new(route_id, stops).unwrap();

        assert!(matches!(
            seq.segment_orders(known, Uuid::new_v4()),
            Err(CatalogError::UnknownStop(_))
        ));
    }
}
