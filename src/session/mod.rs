//! Session subsystem.
//!
//! # Data Flow
//! ```text
//! session owner (host app)
//!     → store.rs (TokenStore registered into the TokenSlot)
//!
//! request interceptor / 401 handling
//!     → refresh.rs (single-flight POST /auth/refresh)
//!         → single_flight.rs (shared outcome for every waiter)
//!         → TokenSlot (set on success, cleared on failure)
//!
//! fetch_me_once
//!     → profile.rs (coalesced GET /me per mode)
//! ```
//!
//! # Design Decisions
//! - The token lives only in memory; the refresh cookie is the durable credential
//! - At most one refresh flight exists process-wide

pub mod profile;
pub mod refresh;
pub mod single_flight;
pub mod store;

pub use profile::{MeOutcome, ProfileFlights};
pub use refresh::RefreshPipeline;
pub use single_flight::SingleFlight;
pub use store::{FnTokenStore, InMemoryTokenStore, TokenSlot, TokenStore};
