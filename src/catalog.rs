// Catalog snapshot: immutable-for-session reference data describing purchasable offerings
// Slices arrive from the supplier feed layer and are merged into the per-session snapshot

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// Kinds of catalog data the engine can load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CatalogKind {
    RoomTypes,
    CircuitTransfers,
    AirportTransfers,
    Tickets,
    LoungePasses,
}

impl CatalogKind {
    // Stable name used for cache keys and log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogKind::RoomTypes => "room_types",
            CatalogKind::CircuitTransfers => "circuit_transfers",
            CatalogKind::AirportTransfers => "airport_transfers",
            CatalogKind::Tickets => "tickets",
            CatalogKind::LoungePasses => "lounge_passes",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomType {
    pub id: String,
    pub hotel_id: String,
    pub name: String,
    pub max_people: Option<u32>,
    pub quantity_available: Option<u32>,
    #[serde(default)]
    pub provisional: bool,
    pub price: f64,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
}

impl RoomType {
    // Bookable units of this room type; provisional stock is capped at a single unit
    pub fn max_quantity(&self) -> u32 {
        if self.provisional {
            1
        } else {
            self.quantity_available.unwrap_or(1)
        }
    }

    // Guests one unit sleeps; unknown occupancy counts as 1 so we never over-allocate
    pub fn occupancy(&self) -> u32 {
        self.max_people.unwrap_or(1).max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitTransferOffering {
    pub id: String,
    pub hotel_id: String,
    // Sub-type used for same-kind recovery when reseeding (e.g. "shared_coach", "mpv")
    pub transport_type: String,
    // Informational only; seats are sold per traveler, never divided by coach size
    pub coach_capacity: Option<u32>,
    #[serde(default)]
    pub provisional: bool,
    // Per seat
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirportTransferOffering {
    pub id: String,
    pub hotel_id: String,
    pub transfer_type: String,
    // Passengers one vehicle carries
    pub max_capacity: Option<u32>,
    #[serde(default)]
    pub provisional: bool,
    // Per vehicle, one direction
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketType {
    pub id: String,
    pub name: String,
    pub quantity_available: Option<u32>,
    #[serde(default)]
    pub provisional: bool,
    pub price: f64,
}

impl TicketType {
    // None means no cap is known yet
    pub fn effective_availability(&self) -> Option<u32> {
        if self.provisional {
            Some(1)
        } else {
            self.quantity_available
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoungePassOffering {
    pub id: String,
    pub name: String,
    pub quantity_available: Option<u32>,
    pub price: f64,
}

// One unit of catalog loading: a typed batch of items of a single kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CatalogSlice {
    RoomTypes(Vec<RoomType>),
    CircuitTransfers(Vec<CircuitTransferOffering>),
    AirportTransfers(Vec<AirportTransferOffering>),
    Tickets(Vec<TicketType>),
    LoungePasses(Vec<LoungePassOffering>),
}

impl CatalogSlice {
    pub fn kind(&self) -> CatalogKind {
        match self {
            CatalogSlice::RoomTypes(_) => CatalogKind::RoomTypes,
            CatalogSlice::CircuitTransfers(_) => CatalogKind::CircuitTransfers,
            CatalogSlice::AirportTransfers(_) => CatalogKind::AirportTransfers,
            CatalogSlice::Tickets(_) => CatalogKind::Tickets,
            CatalogSlice::LoungePasses(_) => CatalogKind::LoungePasses,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            CatalogSlice::RoomTypes(items) => items.len(),
            CatalogSlice::CircuitTransfers(items) => items.len(),
            CatalogSlice::AirportTransfers(items) => items.len(),
            CatalogSlice::Tickets(items) => items.len(),
            CatalogSlice::LoungePasses(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// Per-session catalog store. Stale or partial data is expected: lookups return
// Option and callers fall back to the quantity-untouched policy on a miss.
#[derive(Debug, Default, Clone)]
pub struct CatalogSnapshot {
    room_types: HashMap<String, RoomType>,
    circuit_transfers: HashMap<String, CircuitTransferOffering>,
    airport_transfers: HashMap<String, AirportTransferOffering>,
    tickets: HashMap<String, TicketType>,
    lounge_passes: HashMap<String, LoungePassOffering>,
}

impl CatalogSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    // Merge a loaded slice into the snapshot. Later loads replace earlier
    // entries with the same id (refreshed capacity data wins). Returns the
    // number of items merged.
    pub fn absorb(&mut self, slice: CatalogSlice) -> usize {
        let merged = slice.len();
        match slice {
            CatalogSlice::RoomTypes(items) => {
                for item in items {
                    self.room_types.insert(item.id.clone(), item);
                }
            }
            CatalogSlice::CircuitTransfers(items) => {
                for item in items {
                    self.circuit_transfers.insert(item.id.clone(), item);
                }
            }
            CatalogSlice::AirportTransfers(items) => {
                for item in items {
                    self.airport_transfers.insert(item.id.clone(), item);
                }
            }
            CatalogSlice::Tickets(items) => {
                for item in items {
                    self.tickets.insert(item.id.clone(), item);
                }
            }
            CatalogSlice::LoungePasses(items) => {
                for item in items {
                    self.lounge_passes.insert(item.id.clone(), item);
                }
            }
        }
        merged
    }

    pub fn room_type(&self, id: &str) -> Option<&RoomType> {
        self.room_types.get(id)
    }

    pub fn circuit_transfer(&self, id: &str) -> Option<&CircuitTransferOffering> {
        self.circuit_transfers.get(id)
    }

    pub fn airport_transfer(&self, id: &str) -> Option<&AirportTransferOffering> {
        self.airport_transfers.get(id)
    }

    pub fn ticket_type(&self, id: &str) -> Option<&TicketType> {
        self.tickets.get(id)
    }

    pub fn lounge_pass(&self, id: &str) -> Option<&LoungePassOffering> {
        self.lounge_passes.get(id)
    }

    // Offerings for one hotel, ordered by id so downstream picks are deterministic
    pub fn circuit_transfers_for_hotel(&self, hotel_id: &str) -> Vec<&CircuitTransferOffering> {
        let mut found: Vec<_> = self
            .circuit_transfers
            .values()
            .filter(|t| t.hotel_id == hotel_id)
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        found
    }

    pub fn airport_transfers_for_hotel(&self, hotel_id: &str) -> Vec<&AirportTransferOffering> {
        let mut found: Vec<_> = self
            .airport_transfers
            .values()
            .filter(|t| t.hotel_id == hotel_id)
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        found
    }

    // Whether any data of this kind has been loaded; gates partial-catalog seeding
    pub fn has_kind(&self, kind: CatalogKind) -> bool {
        match kind {
            CatalogKind::RoomTypes => !self.room_types.is_empty(),
            CatalogKind::CircuitTransfers => !self.circuit_transfers.is_empty(),
            CatalogKind::AirportTransfers => !self.airport_transfers.is_empty(),
            CatalogKind::Tickets => !self.tickets.is_empty(),
            CatalogKind::LoungePasses => !self.lounge_passes.is_empty(),
        }
    }
}
