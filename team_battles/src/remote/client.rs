//! HTTP client for creating team battles on the remote service.

use super::credential::validate_credential;
use super::errors::{CreationError, CreationResult};
use crate::config::BattleConfig;
use crate::schedule::{SequenceNumber, SlotKind, TournamentSlot};
use async_trait::async_trait;
use chrono::SecondsFormat;
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Anything that can create one battle for a slot
#[async_trait]
pub trait TournamentCreator: Send + Sync {
    /// Create the battle for `slot`
    async fn create(&self, slot: &TournamentSlot) -> CreationResult<CreatedTournament>;
}

/// A battle that was created (or rehearsed in dry-run)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedTournament {
    /// Remote identifier
    pub id: String,
    /// Canonical URL of the battle
    pub url: String,
    pub sequence_number: SequenceNumber,
    pub kind: SlotKind,
    /// True when nothing was sent to the remote service
    pub dry_run: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateBattleRequest<'a> {
    name: &'a str,
    description: &'a str,
    clock_time: f64,
    clock_increment: u32,
    minutes: u32,
    rated: bool,
    variant: &'a str,
    start_date: String,
    team_battle_by_team: &'a str,
    teams: String,
}

#[derive(Debug, Deserialize)]
struct CreateBattleResponse {
    id: String,
}

/// API client for the remote tournament service
pub struct ArenaClient {
    config: BattleConfig,
    client: reqwest::Client,
    token: String,
}

impl ArenaClient {
    /// Create a new API client
    ///
    /// # Errors
    ///
    /// Returns [`CreationError::Network`] if the HTTP client cannot be built
    pub fn new(config: BattleConfig, token: String) -> CreationResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            config,
            client,
            token,
        })
    }

    /// Canonical URL for a remote battle id
    pub fn tournament_url(&self, id: &str) -> String {
        format!("{}/tournament/{}", self.config.server_url, id)
    }

    fn request_for<'a>(&'a self, slot: &'a TournamentSlot) -> CreateBattleRequest<'a> {
        let battle = &self.config.battle;
        CreateBattleRequest {
            name: slot.display_name(),
            description: slot.description(),
            clock_time: battle.clock_minutes,
            clock_increment: battle.clock_increment_secs,
            minutes: battle.duration_minutes,
            rated: battle.rated,
            variant: &battle.variant,
            start_date: slot
                .scheduled_start()
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            team_battle_by_team: &battle.host_team,
            teams: battle.invited_excluding_host().join(","),
        }
    }

    fn rehearse(&self, slot: &TournamentSlot) -> CreatedTournament {
        if let Err(problem) = validate_credential(&self.token) {
            warn!("Dry run: credential would be rejected ({})", problem);
        }

        let request = self.request_for(slot);
        info!(
            "Dry run: would create {} starting {} hosted by {} with teams [{}]",
            request.name, request.start_date, request.team_battle_by_team, request.teams
        );

        let id = format!("dry-run-{}-{}", slot.sequence_number(), slot.kind().label());
        CreatedTournament {
            url: self.tournament_url(&id),
            id,
            sequence_number: slot.sequence_number(),
            kind: slot.kind(),
            dry_run: true,
        }
    }
}

#[async_trait]
impl TournamentCreator for ArenaClient {
    async fn create(&self, slot: &TournamentSlot) -> CreationResult<CreatedTournament> {
        if self.config.dry_run {
            return Ok(self.rehearse(slot));
        }

        validate_credential(&self.token)?;

        let response = self
            .client
            .post(format!("{}/api/tournament", self.config.server_url))
            .bearer_auth(&self.token)
            .form(&self.request_for(slot))
            .send()
            .await?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|e| format!("Failed to read response body: {}", e));

        if !status.is_success() {
            return Err(CreationError::RemoteRequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        let created: CreateBattleResponse = serde_json::from_str(&body)
            .map_err(|e| CreationError::InvalidResponse(format!("{}: {}", e, body)))?;

        Ok(CreatedTournament {
            url: self.tournament_url(&created.id),
            id: created.id,
            sequence_number: slot.sequence_number(),
            kind: slot.kind(),
            dry_run: false,
        })
    }
}
