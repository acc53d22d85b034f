// Transfer capacity: two policies that must not be merged.
// Circuit transfers sell seats (one per traveler); airport transfers sell
// vehicles (party size divided by vehicle capacity).

use tracing::debug;

use crate::catalog::{AirportTransferOffering, CatalogSnapshot};
use crate::selection::{AirportTransferSelection, CircuitTransferSelection};

// Circuit transfers: one seat per traveler, always. Coach capacity is
// informational and never divides into the quantity.
pub fn resolve_circuit_quantities(
    travelers: u32,
    transfers: &[CircuitTransferSelection],
) -> Vec<CircuitTransferSelection> {
    transfers
        .iter()
        .map(|selection| {
            let mut updated = selection.clone();
            updated.quantity = travelers;
            updated
        })
        .collect()
}

// Airport transfers: whole vehicles. An offering not yet in the catalog keeps
// its current quantity until the capacity data arrives.
pub fn resolve_airport_quantities(
    travelers: u32,
    transfers: &[AirportTransferSelection],
    catalog: &CatalogSnapshot,
) -> Vec<AirportTransferSelection> {
    transfers
        .iter()
        .map(|selection| {
            let mut updated = selection.clone();
            match catalog.airport_transfer(&selection.transfer_id) {
                Some(offering) => {
                    updated.quantity = vehicles_needed(travelers, offering.max_capacity);
                }
                None => {
                    debug!(
                        transfer_id = %selection.transfer_id,
                        "airport transfer not in catalog, quantity left as-is"
                    );
                }
            }
            updated
        })
        .collect()
}

// ceil(travelers / capacity), at least one vehicle. A missing or zero capacity
// falls back to one vehicle per traveler rather than dividing by zero.
pub fn vehicles_needed(travelers: u32, max_capacity: Option<u32>) -> u32 {
    match max_capacity {
        Some(capacity) if capacity > 0 => ((travelers + capacity - 1) / capacity).max(1),
        _ => travelers.max(1),
    }
}

// Price of one airport transfer line. The direction multiplier applies here,
// never to the stored quantity.
pub fn airport_leg_price(selection: &AirportTransferSelection) -> f64 {
    selection.price * selection.quantity as f64 * selection.direction.multiplier() as f64
}

// Seats this line covers across its legs
pub fn airport_covered_capacity(
    selection: &AirportTransferSelection,
    offering: &AirportTransferOffering,
) -> u32 {
    selection.quantity * offering.max_capacity.unwrap_or(0) * selection.direction.multiplier()
}
