use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use futures::channel::mpsc;
use serde::Serialize;
use serde::de::DeserializeOwned;

use arena_core::participant::{ParticipantPatch, RoomParticipant};
use arena_core::player::{Player, PlayerStats};
use arena_core::room::RoomStatus;
use arena_core::store::{ChangeSubscription, RemoteStore, ScoreRecord, StoreError, SubscriptionId};
use arena_core::{ParticipantId, PlayerId, RoomId};

use crate::config::RestStoreConfig;
use crate::rows::{
    ParticipantPatchBody, ParticipantRow, PlayerRow, RoomStatusBody, ScoreRow, StatsBody,
};
use crate::watch::Watch;

/// `RemoteStore` over the hosted backend's `/rest/v1/<table>` endpoints.
///
/// Change subscriptions are emulated by polling: [`poll_changes`](Self::poll_changes)
/// re-reads every watched room and feeds the differences into each
/// subscription's queue.
pub struct RestStore {
    config: RestStoreConfig,
    client: reqwest::Client,
    watches: Mutex<Vec<Watch>>,
    next_subscription: AtomicU64,
}

fn network(e: reqwest::Error) -> StoreError {
    StoreError::Network(e.to_string())
}

impl RestStore {
    pub fn new(config: RestStoreConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder().build().map_err(network)?;
        Ok(Self {
            config,
            client,
            watches: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &RestStoreConfig {
        &self.config
    }

    fn watches(&self) -> MutexGuard<'_, Vec<Watch>> {
        self.watches.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn request(&self, method: reqwest::Method, table: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.config.table_url(table))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(self.config.bearer())
    }

    /// Map non-success statuses to `Rejected`, keeping the response body as
    /// the message.
    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let message = resp.text().await.unwrap_or_default();
        Err(StoreError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, StoreError> {
        let resp = self
            .request(reqwest::Method::GET, table)
            .query(query)
            .send()
            .await
            .map_err(network)?;
        Self::check(resp)
            .await?
            .json::<Vec<T>>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn write<B: Serialize + ?Sized>(
        &self,
        method: reqwest::Method,
        table: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<(), StoreError> {
        let mut req = self
            .request(method, table)
            .query(query)
            .header("Prefer", "return=minimal");
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req.send().await.map_err(network)?;
        Self::check(resp).await.map(|_| ())
    }

    async fn patch<B: Serialize + ?Sized>(
        &self,
        table: &str,
        id: uuid::Uuid,
        body: &B,
    ) -> Result<(), StoreError> {
        self.write(
            reqwest::Method::PATCH,
            table,
            &[("id", format!("eq.{id}"))],
            Some(body),
        )
        .await
    }

    /// Re-read every watched room once and deliver the differences. Watches
    /// whose receiver was dropped are removed. Returns how many changes were
    /// delivered.
    pub async fn poll_changes(&self) -> Result<usize, StoreError> {
        let mut rooms: Vec<RoomId> = {
            let mut watches = self.watches();
            watches.retain(|w| !w.is_closed());
            watches.iter().map(|w| w.room_id).collect()
        };
        rooms.sort();
        rooms.dedup();

        let mut delivered = 0;
        for room_id in rooms {
            let snapshot = self.read_participants(room_id).await?;
            let mut watches = self.watches();
            watches.retain_mut(|w| {
                if w.room_id != room_id {
                    return true;
                }
                match w.advance(&snapshot) {
                    Some(n) => {
                        delivered += n;
                        true
                    },
                    None => {
                        tracing::debug!(subscription = w.id.0, "Dropping closed room watch");
                        false
                    },
                }
            });
        }
        Ok(delivered)
    }

    #[cfg(test)]
    fn watch_count(&self) -> usize {
        self.watches().len()
    }
}

impl RemoteStore for RestStore {
    async fn read_participants(
        &self,
        room_id: RoomId,
    ) -> Result<Vec<RoomParticipant>, StoreError> {
        let rows: Vec<ParticipantRow> = self
            .select(
                &self.config.participants_table,
                &[
                    ("room_id", format!("eq.{room_id}")),
                    ("order", "joined_at.asc".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(RoomParticipant::from).collect())
    }

    async fn read_players(&self, player_ids: &[PlayerId]) -> Result<Vec<Player>, StoreError> {
        if player_ids.is_empty() {
            return Ok(Vec::new());
        }
        let list = player_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let rows: Vec<PlayerRow> = self
            .select(&self.config.players_table, &[("id", format!("in.({list})"))])
            .await?;
        Ok(rows.into_iter().map(Player::from).collect())
    }

    async fn read_player(&self, player_id: PlayerId) -> Result<Player, StoreError> {
        let rows: Vec<PlayerRow> = self
            .select(
                &self.config.players_table,
                &[("id", format!("eq.{player_id}"))],
            )
            .await?;
        rows.into_iter()
            .next()
            .map(Player::from)
            .ok_or_else(|| StoreError::NotFound(format!("player {player_id}")))
    }

    fn subscribe_participant_changes(
        &self,
        room_id: RoomId,
    ) -> Result<ChangeSubscription, StoreError> {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed) + 1);
        let (tx, events) = mpsc::unbounded();
        self.watches().push(Watch::new(id, room_id, tx));
        tracing::debug!(%room_id, subscription = id.0, "Watching room participants");
        Ok(ChangeSubscription { id, events })
    }

    fn unsubscribe(&self, subscription: SubscriptionId) {
        self.watches().retain(|w| w.id != subscription);
    }

    async fn update_participant(
        &self,
        participant_id: ParticipantId,
        patch: &ParticipantPatch,
    ) -> Result<(), StoreError> {
        self.patch(
            &self.config.participants_table,
            participant_id,
            &ParticipantPatchBody::from(patch),
        )
        .await
    }

    async fn delete_participant(&self, participant_id: ParticipantId) -> Result<(), StoreError> {
        self.write::<()>(
            reqwest::Method::DELETE,
            &self.config.participants_table,
            &[("id", format!("eq.{participant_id}"))],
            None,
        )
        .await
    }

    async fn insert_score_record(&self, record: &ScoreRecord) -> Result<(), StoreError> {
        self.write(
            reqwest::Method::POST,
            &self.config.scores_table,
            &[],
            Some(&ScoreRow::from(record)),
        )
        .await
    }

    async fn update_player_stats(
        &self,
        player_id: PlayerId,
        stats: &PlayerStats,
    ) -> Result<(), StoreError> {
        self.patch(&self.config.players_table, player_id, &StatsBody::from(stats))
            .await
    }

    async fn update_room_status(
        &self,
        room_id: RoomId,
        status: RoomStatus,
    ) -> Result<(), StoreError> {
        self.patch(&self.config.rooms_table, room_id, &RoomStatusBody { status })
            .await
    }
}

/// Poll watched rooms forever at the configured interval, logging failures.
#[cfg(not(target_arch = "wasm32"))]
pub async fn run_poller(store: std::sync::Arc<RestStore>) {
    let interval = std::time::Duration::from_millis(store.config.poll_interval_ms);
    loop {
        if let Err(e) = store.poll_changes().await {
            tracing::warn!(error = %e, "Failed to poll room participants");
        }
        tokio::time::sleep(interval).await;
    }
}
