// Wire protocol DTOs and conversions for the public WebSocket and HTTP surface.
// Every frame is `{"type": <event>, "data": <payload>}` with camelCase event names.

use crate::domain::{
    Color, ConnectionId, Direction, EnemySnapshot, Facing, LobbyId, LobbyPhase, Player,
};
use crate::use_cases::{LobbySummary, MoveRequest, SessionEvent};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    // Transport-assigned identity, sent once right after the upgrade.
    Identity { id: String },
    // Lobby membership in join order.
    LobbyUpdate(Vec<String>),
    UpdatePositions(BTreeMap<String, PlayerStateDto>),
    StartGame(BTreeMap<String, PlayerStateDto>),
    PlayerMoved(PlayerMovedDto),
    UpdateEnemy(EnemyStateDto),
    // One-way rejection notice for the requesting client.
    Error(String),
}

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    JoinLobby(String),
    PlayerReady(String),
    Move(MovePayload),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovePayload {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub direction: DirectionDto,
    #[serde(default)]
    pub lobby_id: Option<String>,
}

impl From<MovePayload> for MoveRequest {
    fn from(payload: MovePayload) -> Self {
        Self {
            id: ConnectionId::from(payload.id),
            x: payload.x,
            y: payload.y,
            direction: payload.direction.into(),
            lobby_id: payload.lobby_id.map(LobbyId::from),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorDto {
    Red,
    Blue,
}

impl From<Color> for ColorDto {
    fn from(color: Color) -> Self {
        match color {
            Color::Red => ColorDto::Red,
            Color::Blue => ColorDto::Blue,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectionDto {
    Up,
    Down,
    Left,
    Right,
}

impl From<Direction> for DirectionDto {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Up => DirectionDto::Up,
            Direction::Down => DirectionDto::Down,
            Direction::Left => DirectionDto::Left,
            Direction::Right => DirectionDto::Right,
        }
    }
}

impl From<DirectionDto> for Direction {
    fn from(direction: DirectionDto) -> Self {
        match direction {
            DirectionDto::Up => Direction::Up,
            DirectionDto::Down => Direction::Down,
            DirectionDto::Left => Direction::Left,
            DirectionDto::Right => Direction::Right,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingDto {
    Left,
    Right,
    Front,
    Back,
}

impl From<Facing> for FacingDto {
    fn from(facing: Facing) -> Self {
        match facing {
            Facing::Left => FacingDto::Left,
            Facing::Right => FacingDto::Right,
            Facing::Front => FacingDto::Front,
            Facing::Back => FacingDto::Back,
        }
    }
}

/// Full player state as carried by `updatePositions` and `startGame`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerStateDto {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub color: ColorDto,
    pub direction: DirectionDto,
}

impl From<&Player> for PlayerStateDto {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id.to_string(),
            x: player.x,
            y: player.y,
            color: player.color.into(),
            direction: player.direction.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerMovedDto {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub direction: DirectionDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemyStateDto {
    pub x: f64,
    pub y: f64,
    pub facing_direction: FacingDto,
}

impl From<&EnemySnapshot> for EnemyStateDto {
    fn from(enemy: &EnemySnapshot) -> Self {
        Self {
            x: enemy.x,
            y: enemy.y,
            facing_direction: enemy.facing.into(),
        }
    }
}

fn players_by_id<'a>(
    players: impl IntoIterator<Item = (&'a ConnectionId, &'a Player)>,
) -> BTreeMap<String, PlayerStateDto> {
    players
        .into_iter()
        .map(|(id, player)| (id.to_string(), PlayerStateDto::from(player)))
        .collect()
}

impl From<&SessionEvent> for ServerMessage {
    fn from(event: &SessionEvent) -> Self {
        match event {
            SessionEvent::LobbyUpdate { members } => {
                ServerMessage::LobbyUpdate(members.iter().map(ToString::to_string).collect())
            }
            SessionEvent::UpdatePositions(snapshot) => {
                ServerMessage::UpdatePositions(players_by_id(snapshot))
            }
            SessionEvent::StartGame(snapshot) => ServerMessage::StartGame(players_by_id(snapshot)),
            SessionEvent::PlayerMoved {
                id,
                x,
                y,
                direction,
            } => ServerMessage::PlayerMoved(PlayerMovedDto {
                id: id.to_string(),
                x: *x,
                y: *y,
                direction: (*direction).into(),
            }),
            SessionEvent::UpdateEnemy(enemy) => ServerMessage::UpdateEnemy(enemy.into()),
            SessionEvent::Error { message } => ServerMessage::Error(message.clone()),
        }
    }
}

/// Lobby entry returned by `GET /lobbies`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LobbySummaryDto {
    pub lobby_id: String,
    pub members: Vec<String>,
    pub ready: usize,
    pub started: bool,
}

impl From<LobbySummary> for LobbySummaryDto {
    fn from(summary: LobbySummary) -> Self {
        Self {
            lobby_id: summary.lobby_id.to_string(),
            members: summary.members.iter().map(ToString::to_string).collect(),
            ready: summary.ready,
            started: summary.phase == LobbyPhase::Started,
        }
    }
}
