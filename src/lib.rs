// Package component consistency engine: keeps every selected component of a
// multi-part travel package (tickets, rooms, transfers, lounge passes)
// consistent as the traveler count, tier, or hotel changes.

pub mod allocation;
pub mod cache;
pub mod catalog;
pub mod compat;
pub mod controller;
pub mod defaults;
pub mod feed;
pub mod selection;
pub mod session;
pub mod transfers;

// Re-export key types for convenience
pub use cache::{CacheConfig, CacheStatsReport, CatalogCache};
pub use catalog::{
    AirportTransferOffering, CatalogKind, CatalogSlice, CatalogSnapshot, CircuitTransferOffering,
    LoungePassOffering, RoomType, TicketType,
};
pub use controller::{CommitOutcome, EngineConfig, EngineError, EngineStats, PackageEngine};
pub use defaults::{ComponentDefault, TransferHistory, TransferPrefs};
pub use feed::{CatalogFeedParser, FeedError};
pub use selection::{
    AirportTransferSelection, CircuitTransferSelection, LoungePassSelection, RoomSelection,
    SelectionSet, SelectionTotals, TicketSelection, TransferDirection, ValidationError,
};
pub use session::{
    CatalogSource, PackageSession, RetryConfig, SessionConfig, SessionError, SourceError,
};
