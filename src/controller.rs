// Change propagation controller: one owner for the selection set, one commit
// path, and a fixed resolver sequence per input class. The structural-equality
// guard at commit time is what keeps propagation from ever looping: a pass
// either changes the set once or it is a no-op.

use chrono::NaiveDate;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::allocation::{allocate_rooms, resolve_ticket_quantities};
use crate::catalog::{CatalogSlice, CatalogSnapshot};
use crate::compat::{backfill_hotel_refs, prune_incompatible_transfers};
use crate::defaults::{
    defaults_ready, seed_defaults, ComponentDefault, TransferHistory, TransferPrefs,
};
use crate::selection::{
    validate_selection_set, RoomSelection, SelectionSet, SelectionTotals, ValidationError,
};
use crate::transfers::{resolve_airport_quantities, resolve_circuit_quantities};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("selection validation failed: {0}")]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub initial_travelers: u32,
    pub max_travelers: u32,
    // Stay dates used when a seeded room type carries none
    pub fallback_check_in: NaiveDate,
    pub fallback_check_out: NaiveDate,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_travelers: 2,
            max_travelers: 20,
            fallback_check_in: NaiveDate::default(),
            fallback_check_out: NaiveDate::default(),
        }
    }
}

// Counters over the life of one build session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineStats {
    pub events_processed: usize,
    pub commits: usize,
    pub noop_events: usize,
    pub validation_failures: usize,
    pub transfers_pruned: usize,
    pub defaults_seeded: usize,
    pub legacy_refs_migrated: usize,
}

// What a controller pass did with its candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    Unchanged,
}

// The engine owns the selection set exclusively; everything else reads it
// through `current_selection_set`. All entry points are synchronous and run
// to completion before the next event is processed.
pub struct PackageEngine {
    config: EngineConfig,
    catalog: CatalogSnapshot,
    selections: SelectionSet,
    travelers: u32,
    prefs: TransferPrefs,
    history: TransferHistory,
    package_defaults: HashMap<String, Vec<ComponentDefault>>,
    stats: EngineStats,
}

impl PackageEngine {
    pub fn new(config: EngineConfig) -> Self {
        let travelers = config.initial_travelers.clamp(1, config.max_travelers);
        Self {
            config,
            catalog: CatalogSnapshot::new(),
            selections: SelectionSet::default(),
            travelers,
            prefs: TransferPrefs::default(),
            history: TransferHistory::default(),
            package_defaults: HashMap::new(),
            stats: EngineStats::default(),
        }
    }

    pub fn current_selection_set(&self) -> &SelectionSet {
        &self.selections
    }

    pub fn totals(&self) -> SelectionTotals {
        self.selections.totals()
    }

    pub fn travelers(&self) -> u32 {
        self.travelers
    }

    pub fn stats(&self) -> EngineStats {
        self.stats.clone()
    }

    pub fn catalog(&self) -> &CatalogSnapshot {
        &self.catalog
    }

    // Operator toggles read by the next seeding pass
    pub fn set_transfer_prefs(&mut self, prefs: TransferPrefs) {
        self.prefs = prefs;
    }

    // Resume a persisted build session: run the legacy hotel-reference
    // migration, drop transfers that no longer fit the restored hotels, then
    // commit through the usual validation path.
    pub fn restore(&mut self, mut set: SelectionSet) -> Result<CommitOutcome, EngineError> {
        let patched = backfill_hotel_refs(&mut set);
        let pruned = prune_incompatible_transfers(&mut set, &self.catalog);
        let outcome = self.commit(set)?;
        if outcome == CommitOutcome::Committed {
            self.stats.legacy_refs_migrated += patched;
            self.stats.transfers_pruned += pruned;
        }
        Ok(outcome)
    }

    // Tier change: the whole set is rebuilt from the tier's defaults. An
    // unchanged tier is a no-op so a double click cannot wipe operator edits.
    pub fn on_tier_changed(&mut self, tier_id: &str) -> Result<CommitOutcome, EngineError> {
        self.stats.events_processed += 1;
        if self.selections.tier_id.as_deref() == Some(tier_id) {
            self.stats.noop_events += 1;
            return Ok(CommitOutcome::Unchanged);
        }

        let (candidate, seeded) = match self.seeded_candidate(tier_id) {
            Some(set) => (set, true),
            None => (SelectionSet::empty_for_tier(tier_id), false),
        };
        let outcome = self.commit(candidate)?;
        if seeded && outcome == CommitOutcome::Committed {
            self.stats.defaults_seeded += 1;
        }
        Ok(outcome)
    }

    // Traveler count change: rooms reallocate, both transfer kinds requantify,
    // tickets follow the new count capped by availability.
    pub fn on_traveler_count_changed(&mut self, count: u32) -> Result<CommitOutcome, EngineError> {
        self.stats.events_processed += 1;
        if count < 1 || count > self.config.max_travelers {
            self.stats.validation_failures += 1;
            let err = ValidationError::TravelerCountOutOfRange {
                count,
                max: self.config.max_travelers,
            };
            warn!(error = %err, "rejecting traveler count change");
            return Err(EngineError::Validation(err));
        }
        if count == self.travelers {
            self.stats.noop_events += 1;
            return Ok(CommitOutcome::Unchanged);
        }
        self.travelers = count;

        let mut candidate = self.selections.clone();
        candidate.hotel_rooms = allocate_rooms(count, &candidate.hotel_rooms, &self.catalog);
        candidate.circuit_transfers =
            resolve_circuit_quantities(count, &candidate.circuit_transfers);
        candidate.airport_transfers =
            resolve_airport_quantities(count, &candidate.airport_transfers, &self.catalog);
        candidate.tickets = resolve_ticket_quantities(count, &candidate.tickets, &self.catalog);
        self.commit(candidate)
    }

    // Hotel selection change: the operator's room list replaces the current
    // one, transfers for dropped hotels are pruned, and survivors requantify.
    pub fn on_hotel_selection_changed(
        &mut self,
        rooms: Vec<RoomSelection>,
    ) -> Result<CommitOutcome, EngineError> {
        self.stats.events_processed += 1;

        let mut candidate = self.selections.clone();
        candidate.hotel_rooms = rooms;
        let pruned = prune_incompatible_transfers(&mut candidate, &self.catalog);
        candidate.circuit_transfers =
            resolve_circuit_quantities(self.travelers, &candidate.circuit_transfers);
        candidate.airport_transfers =
            resolve_airport_quantities(self.travelers, &candidate.airport_transfers, &self.catalog);

        let outcome = self.commit(candidate)?;
        if outcome == CommitOutcome::Committed {
            self.stats.transfers_pruned += pruned;
        }
        Ok(outcome)
    }

    // Catalog data arrived. Either the initial seed becomes possible, or
    // fresh capacity figures mean transfer quantities may need recomputing.
    pub fn on_catalog_loaded(&mut self, slice: CatalogSlice) -> Result<CommitOutcome, EngineError> {
        self.stats.events_processed += 1;
        let kind = slice.kind();
        let merged = self.catalog.absorb(slice);
        debug!(kind = kind.as_str(), merged, "catalog slice absorbed");

        if self.selections.is_empty() {
            if let Some(tier_id) = self.selections.tier_id.clone() {
                if let Some(candidate) = self.seeded_candidate(&tier_id) {
                    let outcome = self.commit(candidate)?;
                    if outcome == CommitOutcome::Committed {
                        self.stats.defaults_seeded += 1;
                    }
                    return Ok(outcome);
                }
            }
            self.stats.noop_events += 1;
            return Ok(CommitOutcome::Unchanged);
        }

        let mut candidate = self.selections.clone();
        candidate.circuit_transfers =
            resolve_circuit_quantities(self.travelers, &candidate.circuit_transfers);
        candidate.airport_transfers =
            resolve_airport_quantities(self.travelers, &candidate.airport_transfers, &self.catalog);
        self.commit(candidate)
    }

    // Package defaults arrived for a tier. Stored for later tier changes; if
    // they are for the current tier and nothing is selected yet, seed now.
    pub fn on_package_defaults_loaded(
        &mut self,
        tier_id: &str,
        defaults: Vec<ComponentDefault>,
    ) -> Result<CommitOutcome, EngineError> {
        self.stats.events_processed += 1;
        self.package_defaults.insert(tier_id.to_string(), defaults);

        if self.selections.tier_id.as_deref() == Some(tier_id) && self.selections.is_empty() {
            if let Some(candidate) = self.seeded_candidate(tier_id) {
                let outcome = self.commit(candidate)?;
                if outcome == CommitOutcome::Committed {
                    self.stats.defaults_seeded += 1;
                }
                return Ok(outcome);
            }
        }
        self.stats.noop_events += 1;
        Ok(CommitOutcome::Unchanged)
    }

    // Seeded set for a tier, when its defaults are known and resolvable
    fn seeded_candidate(&self, tier_id: &str) -> Option<SelectionSet> {
        let defaults = self.package_defaults.get(tier_id)?;
        if !defaults_ready(defaults, &self.catalog) {
            debug!(tier_id, "defaults not resolvable yet, seed deferred");
            return None;
        }
        Some(seed_defaults(
            tier_id,
            defaults,
            &self.catalog,
            self.travelers,
            &self.prefs,
            &self.history,
            (self.config.fallback_check_in, self.config.fallback_check_out),
        ))
    }

    // The single commit path: schema validation, then the structural-equality
    // guard. A candidate that fails validation is discarded wholesale and the
    // last-known-good set stays.
    fn commit(&mut self, candidate: SelectionSet) -> Result<CommitOutcome, EngineError> {
        if let Err(err) = validate_selection_set(&candidate) {
            self.stats.validation_failures += 1;
            warn!(error = %err, "discarding candidate selection set");
            return Err(EngineError::Validation(err));
        }
        if candidate == self.selections {
            self.stats.noop_events += 1;
            return Ok(CommitOutcome::Unchanged);
        }

        self.remember_transfer_choices(&candidate);
        info!(
            tier = candidate.tier_id.as_deref().unwrap_or("-"),
            tickets = candidate.tickets.len(),
            rooms = candidate.hotel_rooms.len(),
            circuit_transfers = candidate.circuit_transfers.len(),
            airport_transfers = candidate.airport_transfers.len(),
            "selection set committed"
        );
        self.selections = candidate;
        self.stats.commits += 1;
        Ok(CommitOutcome::Committed)
    }

    // Record committed transfer sub-types per hotel so a later reseed can
    // recover the same kind of product.
    fn remember_transfer_choices(&mut self, set: &SelectionSet) {
        for transfer in &set.circuit_transfers {
            if let (Some(hotel_id), Some(offering)) = (
                &transfer.hotel_id,
                self.catalog.circuit_transfer(&transfer.transfer_id),
            ) {
                self.history
                    .circuit_by_hotel
                    .insert(hotel_id.clone(), offering.transport_type.clone());
            }
        }
        for transfer in &set.airport_transfers {
            if let (Some(hotel_id), Some(offering)) = (
                &transfer.hotel_id,
                self.catalog.airport_transfer(&transfer.transfer_id),
            ) {
                self.history
                    .airport_by_hotel
                    .insert(hotel_id.clone(), offering.transfer_type.clone());
            }
        }
    }
}
