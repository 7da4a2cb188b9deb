use serde::{Deserialize, Serialize};

// --- WIRE TYPES ---

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub angle: f64,
    #[serde(default)]
    pub is_alive: bool,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub trail: Vec<[f64; 2]>,
    #[serde(default)]
    pub territory: Vec<Vec<[f64; 2]>>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct LeaderboardEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub score: f64,
}

// Canonical per-frame world view. Replaced wholesale on every world message.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub timestamp: i64,
    pub players: Vec<PlayerView>,
    pub all_players_count: usize,
    pub leaderboard: Vec<LeaderboardEntry>,
}

// Outbound pointer target, world coordinates.
#[derive(Serialize, Debug)]
pub struct InputPacket {
    pub x: f64,
    pub y: f64,
}

// GET /api/stats payload shown on the lobby screen.
#[derive(Deserialize, Debug, Clone, Copy)]
pub struct ServerStats {
    pub players: u32,
    pub rooms: u32,
}

// --- INBOUND DECODING ---

#[derive(Deserialize)]
struct InitPacket {
    #[serde(rename = "type")]
    kind: String,
    #[serde(rename = "playerId")]
    player_id: String,
}

// Raw world message. Two generations of the wire format exist: newer servers
// send the visibility-culled list as `visiblePlayers`, older ones as
// `players`. Every field is optional; defaults fill the gaps.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawWorldState {
    #[serde(default)]
    timestamp: i64,
    #[serde(default)]
    players: Vec<PlayerView>,
    #[serde(default)]
    visible_players: Vec<PlayerView>,
    #[serde(default)]
    all_players: Option<usize>,
    #[serde(default)]
    leaderboard: Vec<LeaderboardEntry>,
}

impl RawWorldState {
    fn normalize(self) -> Snapshot {
        let players = if !self.visible_players.is_empty() {
            self.visible_players
        } else {
            self.players
        };
        Snapshot {
            timestamp: self.timestamp,
            all_players_count: self.all_players.unwrap_or(players.len()),
            players,
            leaderboard: self.leaderboard,
        }
    }
}

pub enum Inbound {
    Init { player_id: String },
    World(Snapshot),
}

// Single boundary between the duck-typed wire shapes and the canonical
// snapshot. Everything downstream sees `Inbound` only.
pub fn decode(text: &str) -> Result<Inbound, serde_json::Error> {
    if let Ok(init) = serde_json::from_str::<InitPacket>(text) {
        if init.kind == "INIT" {
            return Ok(Inbound::Init {
                player_id: init.player_id,
            });
        }
    }
    let raw: RawWorldState = serde_json::from_str(text)?;
    Ok(Inbound::World(raw.normalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_packet_yields_identity_not_snapshot() {
        match decode(r#"{"type":"INIT","playerId":"s-42"}"#).unwrap() {
            Inbound::Init { player_id } => assert_eq!(player_id, "s-42"),
            Inbound::World(_) => panic!("INIT decoded as world state"),
        }
    }

    #[test]
    fn players_only_message_counts_visible_players() {
        let text = r#"{"players":[
            {"id":"a","x":1.0,"y":2.0,"isAlive":true},
            {"id":"b","x":3.0,"y":4.0,"isAlive":false}
        ]}"#;
        let Ok(Inbound::World(snap)) = decode(text) else {
            panic!("expected world state")
        };
        assert_eq!(snap.players.len(), 2);
        assert_eq!(snap.all_players_count, 2);
        assert!(snap.leaderboard.is_empty());
    }

    #[test]
    fn populated_visible_players_wins_over_players() {
        let text = r#"{
            "players":[{"id":"old","x":0.0,"y":0.0}],
            "visiblePlayers":[{"id":"new","x":0.0,"y":0.0}],
            "allPlayers":7
        }"#;
        let Ok(Inbound::World(snap)) = decode(text) else {
            panic!("expected world state")
        };
        assert_eq!(snap.players.len(), 1);
        assert_eq!(snap.players[0].id, "new");
        assert_eq!(snap.all_players_count, 7);
    }

    #[test]
    fn empty_visible_players_falls_back_to_players() {
        let text = r#"{"visiblePlayers":[],"players":[{"id":"a","x":0.0,"y":0.0}]}"#;
        let Ok(Inbound::World(snap)) = decode(text) else {
            panic!("expected world state")
        };
        assert_eq!(snap.players[0].id, "a");
        assert_eq!(snap.all_players_count, 1);
    }

    #[test]
    fn empty_object_normalizes_to_empty_snapshot() {
        let Ok(Inbound::World(snap)) = decode("{}") else {
            panic!("expected world state")
        };
        assert!(snap.players.is_empty());
        assert_eq!(snap.all_players_count, 0);
        assert_eq!(snap.timestamp, 0);
    }

    #[test]
    fn full_world_message_round_trip() {
        let text = r#"{
            "timestamp": 1700000000000,
            "players": [{
                "id":"p1","name":"A","color":"red",
                "x":100.0,"y":100.0,"isAlive":true,"score":42,
                "trail":[[90,90],[95,95]],
                "territory":[]
            }],
            "leaderboard": [{"name":"A","score":42,"color":"red"}]
        }"#;
        let Ok(Inbound::World(snap)) = decode(text) else {
            panic!("expected world state")
        };
        assert_eq!(snap.timestamp, 1700000000000);
        let p = &snap.players[0];
        assert_eq!(p.id, "p1");
        assert!(p.is_alive);
        assert_eq!(p.score, 42.0);
        assert_eq!(p.angle, 0.0);
        assert_eq!(p.trail, vec![[90.0, 90.0], [95.0, 95.0]]);
        assert!(p.territory.is_empty());
        assert_eq!(snap.leaderboard.len(), 1);
        assert_eq!(snap.leaderboard[0].name, "A");
    }

    #[test]
    fn garbage_is_an_error_not_a_panic() {
        assert!(decode("not json at all").is_err());
    }

    #[test]
    fn input_packet_serializes_flat() {
        let json = serde_json::to_string(&InputPacket { x: 12.5, y: -3.0 }).unwrap();
        assert_eq!(json, r#"{"x":12.5,"y":-3.0}"#);
    }
}
