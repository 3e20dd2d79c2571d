//! Remote creation of team battles.
//!
//! This module provides:
//! - Syntactic validation of the API credential
//! - [`ArenaClient`], the HTTP client that creates one battle per call
//! - Dry-run rehearsal that never touches the network
//! - Paced, strictly sequential creation of a whole batch

pub mod client;
pub mod credential;
pub mod errors;
pub mod pacing;

pub use client::{ArenaClient, CreatedTournament, TournamentCreator};
pub use credential::{CredentialProblem, MIN_CREDENTIAL_LEN, validate_credential};
pub use errors::{CreationError, CreationResult};
pub use pacing::{BatchOutcome, PACING_DELAY, Pacer, SlotFailure, TokioPacer, create_paced};
