//! Public API surface.
//!
//! Domain-shaped calls on [`ApiClient`](crate::http::ApiClient). Each one only
//! declares its policy (group, retry, timeout, anonymity); the pipeline does
//! the rest.
//!
//! | Call | Policy |
//! |------|--------|
//! | `get_survey` | anonymous, group `survey`, retry 2, 8s |
//! | `submit_survey_responses` | anonymous, group `survey-submit`, 10s |
//! | `my_teams`, `list_teams_admin`, `list_my_*` | own group, retry 2, 8s |
//! | mutations | no retry |
//! | `/auth/*` | no bearer |

pub mod auth;
pub mod surveys;
pub mod teams;
pub mod types;

pub use surveys::build_survey_invite_link;
pub use types::*;
