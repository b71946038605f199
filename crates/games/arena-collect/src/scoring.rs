use std::cmp::Ordering;

use arena_core::participant::RoomParticipant;
use arena_core::{ParticipantId, PlayerId};

/// One participant's final placing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    pub participant_id: ParticipantId,
    pub player_id: PlayerId,
    pub score: u32,
    pub joined_at: u64,
    /// 1-based.
    pub rank: usize,
}

/// Order two participants for the final table: higher score first, then the
/// earlier joiner, then participant id so every client agrees on the result.
fn placing(a: &Standing, b: &Standing) -> Ordering {
    b.score
        .cmp(&a.score)
        .then(a.joined_at.cmp(&b.joined_at))
        .then(a.participant_id.cmp(&b.participant_id))
}

/// Rank every participant, substituting `local_score` for the local
/// participant's mirrored score. Ranks are distinct positions 1..=n.
pub fn standings(
    participants: &[RoomParticipant],
    local_id: ParticipantId,
    local_score: u32,
) -> Vec<Standing> {
    let mut table: Vec<Standing> = participants
        .iter()
        .map(|p| Standing {
            participant_id: p.id,
            player_id: p.player_id,
            score: if p.id == local_id { local_score } else { p.score },
            joined_at: p.joined_at,
            rank: 0,
        })
        .collect();
    table.sort_by(placing);
    for (i, s) in table.iter_mut().enumerate() {
        s.rank = i + 1;
    }
    table
}

/// Rank of the local participant. A local participant missing from the list
/// (already removed remotely) is ranked behind everyone else.
pub fn local_rank(participants: &[RoomParticipant], local_id: ParticipantId, local_score: u32) -> usize {
    let table = standings(participants, local_id, local_score);
    table
        .iter()
        .find(|s| s.participant_id == local_id)
        .map(|s| s.rank)
        .unwrap_or(table.len() + 1)
}
