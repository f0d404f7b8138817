//! Coalesced current-user lookups.

use crate::api::types::MeDto;
use crate::http::error::ClientResult;
use crate::session::single_flight::SingleFlight;

/// Outcome shared by every caller of one `/me` flight.
pub type MeOutcome = ClientResult<Option<MeDto>>;

/// One flight per mode: a strict lookup and an anonymous-tolerant one never
/// share a result, since only the strict one refreshes first.
#[derive(Default)]
pub struct ProfileFlights {
    strict: SingleFlight<MeOutcome>,
    anonymous: SingleFlight<MeOutcome>,
}

impl ProfileFlights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flight(&self, allow_anonymous: bool) -> &SingleFlight<MeOutcome> {
        if allow_anonymous {
            &self.anonymous
        } else {
            &self.strict
        }
    }

    pub fn in_flight(&self) -> bool {
        self.strict.in_flight() || self.anonymous.in_flight()
    }
}

impl std::fmt::Debug for ProfileFlights {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileFlights")
            .field("strict", &self.strict.in_flight())
            .field("anonymous", &self.anonymous.in_flight())
            .finish()
    }
}
