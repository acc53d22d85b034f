// Traveler allocation: distributes the party across selected rooms in list order
// Greedy and order-dependent on purpose; the result is deterministic and explainable,
// not a bin-packing optimum

use tracing::debug;

use crate::catalog::CatalogSnapshot;
use crate::selection::{RoomSelection, TicketSelection};

// Recompute room quantities so total covered occupancy reaches the traveler
// count where availability allows. Pure function of its inputs: re-running on
// an unchanged snapshot returns an identical vector.
//
// Rules, applied per selection in list order:
//   - provisional stock books at most 1 unit; unknown availability counts as 1
//   - unknown occupancy counts as 1 guest per unit (under-allocate, never over)
//   - a selected room is never driven to zero, even once the party is covered
//   - a room type missing from the catalog keeps its current quantity
pub fn allocate_rooms(
    travelers: u32,
    rooms: &[RoomSelection],
    catalog: &CatalogSnapshot,
) -> Vec<RoomSelection> {
    if rooms.is_empty() {
        return Vec::new();
    }

    let mut remaining = travelers as i64;
    let mut out = Vec::with_capacity(rooms.len());

    for selection in rooms {
        let mut updated = selection.clone();
        match catalog.room_type(&selection.room_id) {
            Some(room_type) => {
                let max_qty = room_type.max_quantity() as i64;
                let occupancy = room_type.occupancy() as i64;
                let quantity = if remaining > 0 {
                    div_ceil(remaining, occupancy).min(max_qty).max(1)
                } else {
                    1
                };
                updated.quantity = quantity as u32;
                remaining -= quantity * occupancy;
            }
            None => {
                // Capacity data not loaded yet: keep the current quantity and
                // count its coverage at one guest per unit
                debug!(room_id = %selection.room_id, "room type not in catalog, quantity left as-is");
                remaining -= updated.quantity as i64;
            }
        }
        out.push(updated);
    }

    out
}

// Ticket quantities track the traveler count, capped by availability. A ticket
// type not yet in the catalog keeps its current quantity. The result always
// lands in [1, min(travelers, available)].
pub fn resolve_ticket_quantities(
    travelers: u32,
    tickets: &[TicketSelection],
    catalog: &CatalogSnapshot,
) -> Vec<TicketSelection> {
    tickets
        .iter()
        .map(|selection| {
            let mut updated = selection.clone();
            if let Some(ticket_type) = catalog.ticket_type(&selection.ticket_id) {
                let capped = match ticket_type.effective_availability() {
                    Some(available) => travelers.min(available),
                    None => travelers,
                };
                updated.quantity = capped.max(1);
            }
            updated
        })
        .collect()
}

fn div_ceil(n: i64, d: i64) -> i64 {
    debug_assert!(d > 0);
    if n <= 0 {
        0
    } else {
        (n + d - 1) / d
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogSlice, RoomType, TicketType};
    use test_case::test_case;

    fn catalog_with_rooms(rooms: Vec<RoomType>) -> CatalogSnapshot {
        let mut snapshot = CatalogSnapshot::new();
        snapshot.absorb(CatalogSlice::RoomTypes(rooms));
        snapshot
    }

    fn room_type(id: &str, max_people: Option<u32>, available: Option<u32>) -> RoomType {
        RoomType {
            id: id.to_string(),
            hotel_id: "h1".to_string(),
            name: format!("Room {}", id),
            max_people,
            quantity_available: available,
            provisional: false,
            price: 100.0,
            check_in: None,
            check_out: None,
        }
    }

    fn room_selection(room_id: &str, quantity: u32) -> RoomSelection {
        RoomSelection {
            room_id: room_id.to_string(),
            hotel_id: "h1".to_string(),
            quantity,
            price: 100.0,
            check_in: "2025-06-05".parse().unwrap(),
            check_out: "2025-06-09".parse().unwrap(),
        }
    }

    #[test_case(3, 2, 5, 2; "three travelers in doubles needs two rooms")]
    #[test_case(4, 2, 5, 2; "four travelers in doubles needs two rooms")]
    #[test_case(1, 2, 5, 1; "single traveler takes one room")]
    #[test_case(7, 2, 3, 3; "availability caps the allocation")]
    #[test_case(5, 4, 10, 2; "quads round up")]
    fn test_single_room_allocation(travelers: u32, max_people: u32, available: u32, expected: u32) {
        let catalog = catalog_with_rooms(vec![room_type("r1", Some(max_people), Some(available))]);
        let rooms = vec![room_selection("r1", 1)];

        let resolved = allocate_rooms(travelers, &rooms, &catalog);
        assert_eq!(resolved[0].quantity, expected);
    }

    #[test]
    fn test_allocation_is_greedy_in_list_order() {
        let catalog = catalog_with_rooms(vec![
            room_type("big", Some(4), Some(10)),
            room_type("small", Some(2), Some(10)),
        ]);
        let rooms = vec![room_selection("big", 1), room_selection("small", 1)];

        // Five travelers: the first-listed room absorbs as many as it can
        let resolved = allocate_rooms(5, &rooms, &catalog);
        assert_eq!(resolved[0].quantity, 2); // ceil(5/4)
        // Party already covered, but a selected room never drops to zero
        assert_eq!(resolved[1].quantity, 1);
    }

    #[test]
    fn test_covered_rooms_keep_minimum_quantity() {
        let catalog = catalog_with_rooms(vec![
            room_type("r1", Some(2), Some(5)),
            room_type("r2", Some(2), Some(5)),
            room_type("r3", Some(2), Some(5)),
        ]);
        let rooms = vec![
            room_selection("r1", 1),
            room_selection("r2", 1),
            room_selection("r3", 1),
        ];

        let resolved = allocate_rooms(2, &rooms, &catalog);
        assert_eq!(resolved[0].quantity, 1);
        assert_eq!(resolved[1].quantity, 1);
        assert_eq!(resolved[2].quantity, 1);
    }

    #[test]
    fn test_provisional_room_books_one_unit() {
        let mut provisional = room_type("r1", Some(2), Some(5));
        provisional.provisional = true;
        let catalog = catalog_with_rooms(vec![provisional]);
        let rooms = vec![room_selection("r1", 1)];

        let resolved = allocate_rooms(10, &rooms, &catalog);
        assert_eq!(resolved[0].quantity, 1);
    }

    #[test]
    fn test_missing_capacity_fields_default_to_one() {
        let catalog = catalog_with_rooms(vec![room_type("r1", None, None)]);
        let rooms = vec![room_selection("r1", 1)];

        // Unknown occupancy and availability both count as 1: allocation fails
        // toward under-covering the party rather than over-booking
        let resolved = allocate_rooms(6, &rooms, &catalog);
        assert_eq!(resolved[0].quantity, 1);
    }

    #[test]
    fn test_room_absent_from_catalog_left_untouched() {
        let catalog = catalog_with_rooms(vec![room_type("known", Some(2), Some(5))]);
        let rooms = vec![room_selection("unknown", 3), room_selection("known", 1)];

        let resolved = allocate_rooms(5, &rooms, &catalog);
        assert_eq!(resolved[0].quantity, 3);
        // Three guests assumed covered by the untouched row, two remain
        assert_eq!(resolved[1].quantity, 1);
    }

    #[test]
    fn test_empty_selection_is_noop() {
        let catalog = CatalogSnapshot::new();
        assert!(allocate_rooms(4, &[], &catalog).is_empty());
    }

    #[test]
    fn test_allocation_idempotent() {
        let catalog = catalog_with_rooms(vec![
            room_type("r1", Some(3), Some(4)),
            room_type("r2", Some(2), Some(2)),
        ]);
        let rooms = vec![room_selection("r1", 1), room_selection("r2", 1)];

        let once = allocate_rooms(9, &rooms, &catalog);
        let twice = allocate_rooms(9, &once, &catalog);
        assert_eq!(once, twice);
    }

    fn catalog_with_ticket(available: Option<u32>, provisional: bool) -> CatalogSnapshot {
        let mut snapshot = CatalogSnapshot::new();
        snapshot.absorb(CatalogSlice::Tickets(vec![TicketType {
            id: "t1".to_string(),
            name: "Grandstand".to_string(),
            quantity_available: available,
            provisional,
            price: 250.0,
        }]));
        snapshot
    }

    fn ticket_selection(quantity: u32) -> TicketSelection {
        TicketSelection {
            ticket_id: "t1".to_string(),
            quantity,
            price: 250.0,
        }
    }

    #[test_case(4, Some(100), 4; "plenty available tracks the party")]
    #[test_case(8, Some(3), 3; "availability caps the quantity")]
    #[test_case(1, Some(100), 1; "single traveler")]
    #[test_case(5, None, 5; "unknown availability places no cap")]
    fn test_ticket_quantity_tracks_travelers(travelers: u32, available: Option<u32>, expected: u32) {
        let catalog = catalog_with_ticket(available, false);
        let resolved = resolve_ticket_quantities(travelers, &[ticket_selection(1)], &catalog);
        assert_eq!(resolved[0].quantity, expected);

        // Invariant: quantity in [1, min(travelers, available)]
        assert!(resolved[0].quantity >= 1);
        assert!(resolved[0].quantity <= travelers.min(available.unwrap_or(travelers)));
    }

    #[test]
    fn test_provisional_ticket_caps_at_one() {
        let catalog = catalog_with_ticket(Some(40), true);
        let resolved = resolve_ticket_quantities(6, &[ticket_selection(6)], &catalog);
        assert_eq!(resolved[0].quantity, 1);
    }

    #[test]
    fn test_unknown_ticket_type_left_untouched() {
        let catalog = CatalogSnapshot::new();
        let resolved = resolve_ticket_quantities(6, &[ticket_selection(2)], &catalog);
        assert_eq!(resolved[0].quantity, 2);
    }
}
