// Default selection picking: seeds a freshly-reset selection set from the
// tier's package definition. Seeding only ever fills an empty set; an
// operator's edits are never overwritten.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::catalog::{
    AirportTransferOffering, CatalogKind, CatalogSnapshot, CircuitTransferOffering,
};
use crate::selection::{
    AirportTransferSelection, CircuitTransferSelection, LoungePassSelection, RoomSelection,
    SelectionSet, TicketSelection, TransferDirection,
};
use crate::transfers::vehicles_needed;

// One package-defined default component for a tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDefault {
    pub kind: CatalogKind,
    pub component_id: String,
}

// Operator toggles and remembered choices that gate transfer/lounge seeding.
// A declined flag records an explicit "none" choice, which seeding respects.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferPrefs {
    pub circuit_enabled: bool,
    pub airport_enabled: bool,
    pub circuit_declined: bool,
    pub airport_declined: bool,
    pub lounge_pass_choice: Option<String>,
}

impl Default for TransferPrefs {
    fn default() -> Self {
        Self {
            circuit_enabled: true,
            airport_enabled: true,
            circuit_declined: false,
            airport_declined: false,
            lounge_pass_choice: None,
        }
    }
}

// Transfer sub-types the operator has used before, per hotel. Fed from
// committed selections; lets a reseed recover "the same kind of transfer"
// instead of silently switching products.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferHistory {
    pub circuit_by_hotel: HashMap<String, String>,
    pub airport_by_hotel: HashMap<String, String>,
}

// Whether every ticket/room default can be resolved against the loaded
// catalog. Transfer and lounge picks are preference-driven and do not gate.
pub fn defaults_ready(defaults: &[ComponentDefault], catalog: &CatalogSnapshot) -> bool {
    defaults.iter().all(|d| match d.kind {
        CatalogKind::Tickets => catalog.ticket_type(&d.component_id).is_some(),
        CatalogKind::RoomTypes => catalog.room_type(&d.component_id).is_some(),
        // Transfers and lounge passes are picked by preference, not by id
        CatalogKind::CircuitTransfers
        | CatalogKind::AirportTransfers
        | CatalogKind::LoungePasses => true,
    })
}

// Build the seeded selection set for a tier. Pure function; the controller
// decides when to call it (empty set, defaults ready) and commits the result.
pub fn seed_defaults(
    tier_id: &str,
    defaults: &[ComponentDefault],
    catalog: &CatalogSnapshot,
    travelers: u32,
    prefs: &TransferPrefs,
    history: &TransferHistory,
    fallback_dates: (NaiveDate, NaiveDate),
) -> SelectionSet {
    let mut set = SelectionSet::empty_for_tier(tier_id);

    for default in defaults {
        match default.kind {
            CatalogKind::Tickets => {
                if let Some(ticket_type) = catalog.ticket_type(&default.component_id) {
                    let available = ticket_type.effective_availability().unwrap_or(travelers);
                    set.tickets.push(TicketSelection {
                        ticket_id: ticket_type.id.clone(),
                        quantity: travelers.min(available).max(1),
                        price: ticket_type.price,
                    });
                }
            }
            CatalogKind::RoomTypes => {
                if let Some(room_type) = catalog.room_type(&default.component_id) {
                    let (fallback_in, fallback_out) = fallback_dates;
                    set.hotel_rooms.push(RoomSelection {
                        room_id: room_type.id.clone(),
                        hotel_id: room_type.hotel_id.clone(),
                        quantity: 1,
                        price: room_type.price,
                        check_in: room_type.check_in.unwrap_or(fallback_in),
                        check_out: room_type.check_out.unwrap_or(fallback_out),
                    });
                }
            }
            CatalogKind::CircuitTransfers
            | CatalogKind::AirportTransfers
            | CatalogKind::LoungePasses => {
                // Picked below from the seeded hotels and remembered choices
            }
        }
    }

    let active_hotels = set.active_hotel_set();

    if prefs.circuit_enabled && !prefs.circuit_declined {
        for hotel_id in &active_hotels {
            if let Some(offering) = pick_circuit_offering(catalog, hotel_id, history) {
                set.circuit_transfers.push(CircuitTransferSelection {
                    transfer_id: offering.id.clone(),
                    hotel_id: Some(offering.hotel_id.clone()),
                    quantity: travelers,
                    price: offering.price,
                });
            }
        }
    }

    if prefs.airport_enabled && !prefs.airport_declined {
        for hotel_id in &active_hotels {
            if let Some(offering) = pick_airport_offering(catalog, hotel_id, history) {
                set.airport_transfers.push(AirportTransferSelection {
                    transfer_id: offering.id.clone(),
                    hotel_id: Some(offering.hotel_id.clone()),
                    quantity: vehicles_needed(travelers, offering.max_capacity),
                    price: offering.price,
                    // Packages book the round trip unless the operator narrows it
                    direction: TransferDirection::Both,
                });
            }
        }
    }

    if let Some(pass_id) = &prefs.lounge_pass_choice {
        if let Some(pass) = catalog.lounge_pass(pass_id) {
            let available = pass.quantity_available.unwrap_or(travelers);
            set.lounge_pass = Some(LoungePassSelection {
                pass_id: pass.id.clone(),
                quantity: travelers.min(available).max(1),
                price: pass.price,
            });
        }
    }

    debug!(
        tier_id,
        tickets = set.tickets.len(),
        rooms = set.hotel_rooms.len(),
        circuit_transfers = set.circuit_transfers.len(),
        airport_transfers = set.airport_transfers.len(),
        "seeded selection set from package defaults"
    );
    set
}

// Same sub-type as the remembered choice for this hotel, else cheapest.
// Offerings arrive ordered by id, so ties resolve deterministically.
fn pick_circuit_offering<'a>(
    catalog: &'a CatalogSnapshot,
    hotel_id: &str,
    history: &TransferHistory,
) -> Option<&'a CircuitTransferOffering> {
    let offerings = catalog.circuit_transfers_for_hotel(hotel_id);
    if offerings.is_empty() {
        return None;
    }
    if let Some(remembered) = history.circuit_by_hotel.get(hotel_id) {
        if let Some(same_type) = offerings
            .iter()
            .copied()
            .find(|o| o.transport_type == *remembered)
        {
            return Some(same_type);
        }
    }
    cheapest(&offerings, |o| o.price)
}

fn pick_airport_offering<'a>(
    catalog: &'a CatalogSnapshot,
    hotel_id: &str,
    history: &TransferHistory,
) -> Option<&'a AirportTransferOffering> {
    let offerings = catalog.airport_transfers_for_hotel(hotel_id);
    if offerings.is_empty() {
        return None;
    }
    if let Some(remembered) = history.airport_by_hotel.get(hotel_id) {
        if let Some(same_type) = offerings
            .iter()
            .copied()
            .find(|o| o.transfer_type == *remembered)
        {
            return Some(same_type);
        }
    }
    cheapest(&offerings, |o| o.price)
}

// First strictly-cheapest entry; input order breaks ties
fn cheapest<'a, T>(items: &[&'a T], price: impl Fn(&T) -> f64) -> Option<&'a T> {
    let mut best: Option<&'a T> = None;
    for item in items.iter().copied() {
        match best {
            Some(current) if price(item) >= price(current) => {}
            _ => best = Some(item),
        }
    }
    best
}
