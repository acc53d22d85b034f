// Compatibility filter: a transfer is only valid while its hotel is still part
// of the build. Pure filter; requantifying survivors is the capacity resolver's job.

use std::collections::BTreeSet;
use tracing::{debug, info};

use crate::catalog::CatalogSnapshot;
use crate::selection::{AirportTransferSelection, CircuitTransferSelection, SelectionSet};

// Hotel a circuit transfer is effectively bound to: the selection's own
// reference wins, else the catalog item's owning hotel.
fn circuit_effective_hotel(
    selection: &CircuitTransferSelection,
    catalog: &CatalogSnapshot,
) -> Option<String> {
    selection.hotel_id.clone().or_else(|| {
        catalog
            .circuit_transfer(&selection.transfer_id)
            .map(|offering| offering.hotel_id.clone())
    })
}

fn airport_effective_hotel(
    selection: &AirportTransferSelection,
    catalog: &CatalogSnapshot,
) -> Option<String> {
    selection.hotel_id.clone().or_else(|| {
        catalog
            .airport_transfer(&selection.transfer_id)
            .map(|offering| offering.hotel_id.clone())
    })
}

// Drop circuit transfers bound to hotels outside the active set. A selection
// whose hotel cannot be determined from either source is kept; the migration
// pass may resolve it later. Survivors pass through untouched.
pub fn prune_circuit_transfers(
    transfers: &[CircuitTransferSelection],
    active_hotels: &BTreeSet<String>,
    catalog: &CatalogSnapshot,
) -> (Vec<CircuitTransferSelection>, usize) {
    let mut retained = Vec::with_capacity(transfers.len());
    let mut removed = 0;
    for selection in transfers {
        match circuit_effective_hotel(selection, catalog) {
            Some(hotel_id) if !active_hotels.contains(&hotel_id) => {
                info!(transfer_id = %selection.transfer_id, hotel_id = %hotel_id,
                    "removing circuit transfer, hotel no longer selected");
                removed += 1;
            }
            _ => retained.push(selection.clone()),
        }
    }
    (retained, removed)
}

pub fn prune_airport_transfers(
    transfers: &[AirportTransferSelection],
    active_hotels: &BTreeSet<String>,
    catalog: &CatalogSnapshot,
) -> (Vec<AirportTransferSelection>, usize) {
    let mut retained = Vec::with_capacity(transfers.len());
    let mut removed = 0;
    for selection in transfers {
        match airport_effective_hotel(selection, catalog) {
            Some(hotel_id) if !active_hotels.contains(&hotel_id) => {
                info!(transfer_id = %selection.transfer_id, hotel_id = %hotel_id,
                    "removing airport transfer, hotel no longer selected");
                removed += 1;
            }
            _ => retained.push(selection.clone()),
        }
    }
    (retained, removed)
}

// Filter a whole candidate set in place. Returns the number of removals so the
// controller can record them.
pub fn prune_incompatible_transfers(set: &mut SelectionSet, catalog: &CatalogSnapshot) -> usize {
    let active_hotels = set.active_hotel_set();
    let (circuit, removed_circuit) =
        prune_circuit_transfers(&set.circuit_transfers, &active_hotels, catalog);
    let (airport, removed_airport) =
        prune_airport_transfers(&set.airport_transfers, &active_hotels, catalog);
    set.circuit_transfers = circuit;
    set.airport_transfers = airport;
    removed_circuit + removed_airport
}

// Migration for selection sets persisted before transfers carried a hotel
// reference: when exactly one hotel is selected, the reference is unambiguous
// and gets backfilled. Idempotent; an existing reference is never overwritten.
// Returns the number of rows patched.
pub fn backfill_hotel_refs(set: &mut SelectionSet) -> usize {
    let active_hotels = set.active_hotel_set();
    if active_hotels.len() != 1 {
        return 0;
    }
    let sole_hotel = match active_hotels.iter().next() {
        Some(hotel_id) => hotel_id.clone(),
        None => return 0,
    };

    let mut patched = 0;
    for transfer in &mut set.circuit_transfers {
        if transfer.hotel_id.is_none() {
            transfer.hotel_id = Some(sole_hotel.clone());
            patched += 1;
        }
    }
    for transfer in &mut set.airport_transfers {
        if transfer.hotel_id.is_none() {
            transfer.hotel_id = Some(sole_hotel.clone());
            patched += 1;
        }
    }
    if patched > 0 {
        debug!(hotel_id = %sole_hotel, patched, "backfilled legacy transfer hotel references");
    }
    patched
}
