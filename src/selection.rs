// Component selections and the per-build selection set
// The set is an owned value: resolvers produce candidates, the controller commits them

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

// Schema-level problems with a proposed selection set. A failing candidate is
// discarded wholesale; the last-known-good set stays in place.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("traveler count {count} outside allowed range 1..={max}")]
    TravelerCountOutOfRange { count: u32, max: u32 },

    #[error("{kind} selection '{id}' has zero quantity")]
    ZeroQuantity { kind: &'static str, id: String },

    #[error("{kind} selection has an empty component reference")]
    EmptyComponentRef { kind: &'static str },

    #[error("room selection '{id}' has an empty hotel reference")]
    MissingHotelRef { id: String },

    #[error("{kind} selection '{id}' references hotel '{hotel_id}' outside the active hotel set")]
    ForeignHotelRef {
        kind: &'static str,
        id: String,
        hotel_id: String,
    },

    #[error("room selection '{id}' check-out {check_out} precedes check-in {check_in}")]
    InvertedStayDates {
        id: String,
        check_in: NaiveDate,
        check_out: NaiveDate,
    },
}

// Direction of an airport transfer. `Both` doubles price and covered capacity
// at total-computation time only; stored quantity is always one-way vehicles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferDirection {
    Outbound,
    Return,
    Both,
}

impl TransferDirection {
    pub fn multiplier(&self) -> u32 {
        match self {
            TransferDirection::Both => 2,
            TransferDirection::Outbound | TransferDirection::Return => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketSelection {
    pub ticket_id: String,
    pub quantity: u32,
    // Unit price cached at selection time
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSelection {
    pub room_id: String,
    pub hotel_id: String,
    pub quantity: u32,
    pub price: f64,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitTransferSelection {
    pub transfer_id: String,
    // Legacy rows may lack the hotel reference; the migration pass backfills it
    pub hotel_id: Option<String>,
    pub quantity: u32,
    // Per seat
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirportTransferSelection {
    pub transfer_id: String,
    pub hotel_id: Option<String>,
    pub quantity: u32,
    // Per vehicle, one direction
    pub price: f64,
    pub direction: TransferDirection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoungePassSelection {
    pub pass_id: String,
    pub quantity: u32,
    pub price: f64,
}

// The complete, ordered set of chosen components for one package build
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SelectionSet {
    pub tier_id: Option<String>,
    pub tickets: Vec<TicketSelection>,
    pub hotel_rooms: Vec<RoomSelection>,
    pub circuit_transfers: Vec<CircuitTransferSelection>,
    pub airport_transfers: Vec<AirportTransferSelection>,
    pub lounge_pass: Option<LoungePassSelection>,
}

// Per-component and grand-total prices for one selection set
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SelectionTotals {
    pub tickets: f64,
    pub rooms: f64,
    pub circuit_transfers: f64,
    pub airport_transfers: f64,
    pub lounge_pass: f64,
    pub total: f64,
}

impl SelectionSet {
    // A cleared set bound to a tier; produced on every tier change
    pub fn empty_for_tier(tier_id: &str) -> Self {
        SelectionSet {
            tier_id: Some(tier_id.to_string()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
            && self.hotel_rooms.is_empty()
            && self.circuit_transfers.is_empty()
            && self.airport_transfers.is_empty()
            && self.lounge_pass.is_none()
    }

    // Hotels implied by the current room selections. Derived on demand, never stored.
    pub fn active_hotel_set(&self) -> BTreeSet<String> {
        self.hotel_rooms
            .iter()
            .map(|r| r.hotel_id.clone())
            .collect()
    }

    pub fn totals(&self) -> SelectionTotals {
        let tickets: f64 = self
            .tickets
            .iter()
            .map(|t| t.price * t.quantity as f64)
            .sum();
        let rooms: f64 = self
            .hotel_rooms
            .iter()
            .map(|r| r.price * r.quantity as f64)
            .sum();
        let circuit: f64 = self
            .circuit_transfers
            .iter()
            .map(|t| t.price * t.quantity as f64)
            .sum();
        // The direction multiplier applies here and only here
        let airport: f64 = self
            .airport_transfers
            .iter()
            .map(|t| t.price * t.quantity as f64 * t.direction.multiplier() as f64)
            .sum();
        let lounge = self
            .lounge_pass
            .as_ref()
            .map(|p| p.price * p.quantity as f64)
            .unwrap_or(0.0);

        SelectionTotals {
            tickets,
            rooms,
            circuit_transfers: circuit,
            airport_transfers: airport,
            lounge_pass: lounge,
            total: tickets + rooms + circuit + airport + lounge,
        }
    }
}

// Schema check run by the controller before every commit. Covers quantity
// sanity, component references, stay dates, and the hotel-set invariant for
// transfer selections.
pub fn validate_selection_set(set: &SelectionSet) -> Result<(), ValidationError> {
    for ticket in &set.tickets {
        if ticket.ticket_id.is_empty() {
            return Err(ValidationError::EmptyComponentRef { kind: "ticket" });
        }
        if ticket.quantity == 0 {
            return Err(ValidationError::ZeroQuantity {
                kind: "ticket",
                id: ticket.ticket_id.clone(),
            });
        }
    }

    for room in &set.hotel_rooms {
        if room.room_id.is_empty() {
            return Err(ValidationError::EmptyComponentRef { kind: "room" });
        }
        if room.hotel_id.is_empty() {
            return Err(ValidationError::MissingHotelRef {
                id: room.room_id.clone(),
            });
        }
        if room.quantity == 0 {
            return Err(ValidationError::ZeroQuantity {
                kind: "room",
                id: room.room_id.clone(),
            });
        }
        if room.check_out < room.check_in {
            return Err(ValidationError::InvertedStayDates {
                id: room.room_id.clone(),
                check_in: room.check_in,
                check_out: room.check_out,
            });
        }
    }

    let active_hotels = set.active_hotel_set();

    for transfer in &set.circuit_transfers {
        if transfer.transfer_id.is_empty() {
            return Err(ValidationError::EmptyComponentRef {
                kind: "circuit transfer",
            });
        }
        if transfer.quantity == 0 {
            return Err(ValidationError::ZeroQuantity {
                kind: "circuit transfer",
                id: transfer.transfer_id.clone(),
            });
        }
        if let Some(hotel_id) = &transfer.hotel_id {
            if !active_hotels.contains(hotel_id) {
                return Err(ValidationError::ForeignHotelRef {
                    kind: "circuit transfer",
                    id: transfer.transfer_id.clone(),
                    hotel_id: hotel_id.clone(),
                });
            }
        }
    }

    for transfer in &set.airport_transfers {
        if transfer.transfer_id.is_empty() {
            return Err(ValidationError::EmptyComponentRef {
                kind: "airport transfer",
            });
        }
        if transfer.quantity == 0 {
            return Err(ValidationError::ZeroQuantity {
                kind: "airport transfer",
                id: transfer.transfer_id.clone(),
            });
        }
        if let Some(hotel_id) = &transfer.hotel_id {
            if !active_hotels.contains(hotel_id) {
                return Err(ValidationError::ForeignHotelRef {
                    kind: "airport transfer",
                    id: transfer.transfer_id.clone(),
                    hotel_id: hotel_id.clone(),
                });
            }
        }
    }

    if let Some(pass) = &set.lounge_pass {
        if pass.pass_id.is_empty() {
            return Err(ValidationError::EmptyComponentRef { kind: "lounge pass" });
        }
        if pass.quantity == 0 {
            return Err(ValidationError::ZeroQuantity {
                kind: "lounge pass",
                id: pass.pass_id.clone(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn room_selection(room_id: &str, hotel_id: &str) -> RoomSelection {
        RoomSelection {
            room_id: room_id.to_string(),
            hotel_id: hotel_id.to_string(),
            quantity: 1,
            price: 100.0,
            check_in: date("2025-06-05"),
            check_out: date("2025-06-09"),
        }
    }

    #[test]
    fn test_active_hotel_set_is_distinct() {
        let set = SelectionSet {
            hotel_rooms: vec![
                room_selection("r1", "h1"),
                room_selection("r2", "h1"),
                room_selection("r3", "h2"),
            ],
            ..Default::default()
        };

        let hotels = set.active_hotel_set();
        assert_eq!(hotels.len(), 2);
        assert!(hotels.contains("h1"));
        assert!(hotels.contains("h2"));
    }

    #[test]
    fn test_direction_price_law() {
        // Identical quantity and per-unit price; only the direction differs
        let one_way = SelectionSet {
            hotel_rooms: vec![room_selection("r1", "h1")],
            airport_transfers: vec![AirportTransferSelection {
                transfer_id: "at1".to_string(),
                hotel_id: Some("h1".to_string()),
                quantity: 3,
                price: 55.0,
                direction: TransferDirection::Outbound,
            }],
            ..Default::default()
        };
        let mut both_ways = one_way.clone();
        both_ways.airport_transfers[0].direction = TransferDirection::Both;

        let one_way_total = one_way.totals().airport_transfers;
        let both_ways_total = both_ways.totals().airport_transfers;
        assert_eq!(both_ways_total, 2.0 * one_way_total);

        // The multiplier never reaches the stored quantity
        assert_eq!(both_ways.airport_transfers[0].quantity, 3);
    }

    #[test]
    fn test_totals_sum_all_components() {
        let set = SelectionSet {
            tickets: vec![TicketSelection {
                ticket_id: "t1".to_string(),
                quantity: 4,
                price: 100.0,
            }],
            hotel_rooms: vec![room_selection("r1", "h1")],
            circuit_transfers: vec![CircuitTransferSelection {
                transfer_id: "ct1".to_string(),
                hotel_id: Some("h1".to_string()),
                quantity: 4,
                price: 25.0,
            }],
            airport_transfers: vec![],
            lounge_pass: Some(LoungePassSelection {
                pass_id: "lp1".to_string(),
                quantity: 2,
                price: 60.0,
            }),
            ..Default::default()
        };

        let totals = set.totals();
        assert_eq!(totals.tickets, 400.0);
        assert_eq!(totals.rooms, 100.0);
        assert_eq!(totals.circuit_transfers, 100.0);
        assert_eq!(totals.lounge_pass, 120.0);
        assert_eq!(totals.total, 720.0);
    }

    #[test]
    fn test_validate_rejects_zero_quantity() {
        let set = SelectionSet {
            tickets: vec![TicketSelection {
                ticket_id: "t1".to_string(),
                quantity: 0,
                price: 100.0,
            }],
            ..Default::default()
        };

        let err = validate_selection_set(&set).unwrap_err();
        assert!(matches!(err, ValidationError::ZeroQuantity { kind: "ticket", .. }));
    }

    #[test]
    fn test_validate_rejects_foreign_hotel_transfer() {
        let set = SelectionSet {
            hotel_rooms: vec![room_selection("r1", "h1")],
            circuit_transfers: vec![CircuitTransferSelection {
                transfer_id: "ct1".to_string(),
                hotel_id: Some("h2".to_string()),
                quantity: 2,
                price: 40.0,
            }],
            ..Default::default()
        };

        let err = validate_selection_set(&set).unwrap_err();
        assert!(matches!(err, ValidationError::ForeignHotelRef { .. }));
    }

    #[test]
    fn test_validate_allows_legacy_transfer_without_hotel() {
        // A hotel-less transfer row is tolerated; the migration pass fixes it up
        let set = SelectionSet {
            hotel_rooms: vec![room_selection("r1", "h1")],
            circuit_transfers: vec![CircuitTransferSelection {
                transfer_id: "ct1".to_string(),
                hotel_id: None,
                quantity: 2,
                price: 40.0,
            }],
            ..Default::default()
        };

        assert!(validate_selection_set(&set).is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_dates() {
        let mut bad_room = room_selection("r1", "h1");
        bad_room.check_in = date("2025-06-09");
        bad_room.check_out = date("2025-06-05");
        let set = SelectionSet {
            hotel_rooms: vec![bad_room],
            ..Default::default()
        };

        let err = validate_selection_set(&set).unwrap_err();
        assert!(matches!(err, ValidationError::InvertedStayDates { .. }));
    }

    #[test]
    fn test_empty_for_tier_clears_everything() {
        let set = SelectionSet::empty_for_tier("gold");
        assert!(set.is_empty());
        assert_eq!(set.tier_id.as_deref(), Some("gold"));
    }
}
