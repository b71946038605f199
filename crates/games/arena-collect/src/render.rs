use std::collections::HashMap;
use std::f32::consts::PI;

use arena_core::participant::{Position, RoomParticipant};
use arena_core::player::{Player, PlayerColor};
use arena_core::{ParticipantId, PlayerId};

use crate::collectible::{Collectible, CollectibleField, CollectibleKind};
use crate::config::CollectConfig;
use crate::physics::clamp_to_arena;
use crate::scoring;

/// RGBA color. Alpha is 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BACKGROUND: Color = Color::rgb(26, 26, 46);
    pub const GRID: Color = Color::rgba(255, 255, 255, 0.06);
    pub const BORDER: Color = Color::rgb(62, 62, 96);
    pub const COIN: Color = Color::rgb(255, 215, 0);
    pub const GEM: Color = Color::rgb(0, 206, 209);
    pub const STAR: Color = Color::rgb(255, 105, 180);
    pub const HUD_TEXT: Color = Color::rgb(230, 230, 240);
    pub const HUD_MUTED: Color = Color::rgb(150, 150, 170);
    pub const BANNER_BG: Color = Color::rgba(0, 0, 0, 0.6);

    /// CSS color string for canvas fill and stroke styles.
    pub fn to_css(&self) -> String {
        if self.a >= 1.0 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("rgba({},{},{},{})", self.r, self.g, self.b, self.a)
        }
    }
}

impl From<PlayerColor> for Color {
    fn from(c: PlayerColor) -> Self {
        Color::rgb(c.r, c.g, c.b)
    }
}

/// Geometry of a filled or stroked primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    Circle {
        center: Position,
        radius: f32,
    },
    /// Closed polygon through the given vertices.
    Polygon(Vec<Position>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        }
    }
}

/// One canvas drawing operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Fill {
        shape: Shape,
        color: Color,
    },
    Stroke {
        shape: Shape,
        color: Color,
        width: f32,
    },
    Line {
        from: Position,
        to: Position,
        color: Color,
        width: f32,
    },
    Text {
        text: String,
        at: Position,
        size: f32,
        color: Color,
        align: TextAlign,
        bold: bool,
    },
}

/// A composed frame: draw commands in paint order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub width: f32,
    pub height: f32,
    pub commands: Vec<DrawCommand>,
}

impl Frame {
    /// All text drawn in the frame, in order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Read-only view of everything a frame depends on.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pub config: &'a CollectConfig,
    pub field: &'a CollectibleField,
    pub participants: &'a [RoomParticipant],
    pub profiles: &'a HashMap<PlayerId, Player>,
    pub local_id: ParticipantId,
    pub local_position: Position,
    pub local_score: u32,
    pub remaining_secs: u32,
    pub finished: bool,
}

impl FrameView<'_> {
    /// Position and score to draw for a participant. The local participant
    /// always uses the locally computed values. Remote positions are clamped
    /// for display only; the mirror keeps what the store sent.
    fn displayed(&self, p: &RoomParticipant) -> (Position, u32) {
        if p.id == self.local_id {
            (self.local_position, self.local_score)
        } else {
            (clamp_to_arena(p.position, self.config), p.score)
        }
    }

    fn label(&self, player_id: PlayerId) -> (char, String, Color) {
        match self.profiles.get(&player_id) {
            Some(player) => (player.initial(), player.username.clone(), player.color.into()),
            None => ('?', "...".to_string(), PlayerColor::PLACEHOLDER.into()),
        }
    }
}

/// Build the frame for the current state. Pure: nothing in `view` is mutated.
pub fn compose(view: &FrameView<'_>) -> Frame {
    let config = view.config;
    let mut commands = Vec::with_capacity(64 + view.field.items().len() * 2);

    draw_arena(&mut commands, config);
    for item in view.field.active() {
        commands.push(collectible_command(item, config.item_radius));
    }
    for p in view.participants {
        draw_participant(&mut commands, view, p);
    }
    draw_hud(&mut commands, view);

    Frame {
        width: config.arena_width,
        height: config.arena_height,
        commands,
    }
}

fn draw_arena(commands: &mut Vec<DrawCommand>, config: &CollectConfig) {
    commands.push(DrawCommand::Fill {
        shape: Shape::Rect {
            x: 0.0,
            y: 0.0,
            width: config.arena_width,
            height: config.arena_height,
        },
        color: Color::BACKGROUND,
    });

    if config.grid_spacing > 0.0 {
        let mut x = config.grid_spacing;
        while x < config.arena_width {
            commands.push(DrawCommand::Line {
                from: Position::new(x, 0.0),
                to: Position::new(x, config.arena_height),
                color: Color::GRID,
                width: 1.0,
            });
            x += config.grid_spacing;
        }
        let mut y = config.grid_spacing;
        while y < config.arena_height {
            commands.push(DrawCommand::Line {
                from: Position::new(0.0, y),
                to: Position::new(config.arena_width, y),
                color: Color::GRID,
                width: 1.0,
            });
            y += config.grid_spacing;
        }
    }

    commands.push(DrawCommand::Stroke {
        shape: Shape::Rect {
            x: config.margin,
            y: config.margin,
            width: config.arena_width - 2.0 * config.margin,
            height: config.arena_height - 2.0 * config.margin,
        },
        color: Color::BORDER,
        width: 2.0,
    });
}

fn diamond(center: Position, radius: f32) -> Vec<Position> {
    vec![
        Position::new(center.x, center.y - radius),
        Position::new(center.x + radius, center.y),
        Position::new(center.x, center.y + radius),
        Position::new(center.x - radius, center.y),
    ]
}

/// Five-pointed star, first point straight up.
fn star(center: Position, outer: f32, inner: f32) -> Vec<Position> {
    (0..10)
        .map(|i| {
            let r = if i % 2 == 0 { outer } else { inner };
            let angle = -PI / 2.0 + i as f32 * PI / 5.0;
            Position::new(center.x + r * angle.cos(), center.y + r * angle.sin())
        })
        .collect()
}

fn collectible_command(item: &Collectible, radius: f32) -> DrawCommand {
    let (shape, color) = match item.kind {
        CollectibleKind::Coin => (
            Shape::Circle {
                center: item.position,
                radius: radius * 0.7,
            },
            Color::COIN,
        ),
        CollectibleKind::Gem => (Shape::Polygon(diamond(item.position, radius)), Color::GEM),
        CollectibleKind::Star => (
            Shape::Polygon(star(item.position, radius, radius * 0.45)),
            Color::STAR,
        ),
    };
    DrawCommand::Fill { shape, color }
}

fn draw_participant(commands: &mut Vec<DrawCommand>, view: &FrameView<'_>, p: &RoomParticipant) {
    let radius = view.config.player_radius;
    let (position, _) = view.displayed(p);
    let (initial, name, color) = view.label(p.player_id);
    let body = Shape::Circle {
        center: position,
        radius,
    };

    commands.push(DrawCommand::Fill {
        shape: body.clone(),
        color,
    });
    if p.id == view.local_id {
        commands.push(DrawCommand::Stroke {
            shape: body,
            color: Color::WHITE,
            width: 3.0,
        });
    }
    commands.push(DrawCommand::Text {
        text: initial.to_string(),
        at: Position::new(position.x, position.y + 6.0),
        size: 16.0,
        color: Color::WHITE,
        align: TextAlign::Center,
        bold: true,
    });
    commands.push(DrawCommand::Text {
        text: name,
        at: Position::new(position.x, position.y + radius + 14.0),
        size: 12.0,
        color: Color::HUD_TEXT,
        align: TextAlign::Center,
        bold: false,
    });
}

fn draw_hud(commands: &mut Vec<DrawCommand>, view: &FrameView<'_>) {
    let config = view.config;
    commands.push(DrawCommand::Text {
        text: format!("Time: {}s", view.remaining_secs),
        at: Position::new(12.0, 16.0),
        size: 16.0,
        color: Color::HUD_TEXT,
        align: TextAlign::Left,
        bold: true,
    });
    commands.push(DrawCommand::Text {
        text: format!("Score: {}", view.local_score),
        at: Position::new(config.arena_width / 2.0, 16.0),
        size: 16.0,
        color: Color::COIN,
        align: TextAlign::Center,
        bold: true,
    });

    let table = scoring::standings(view.participants, view.local_id, view.local_score);
    let right = config.arena_width - 12.0;
    for (i, standing) in table.iter().enumerate() {
        let (_, name, _) = view.label(standing.player_id);
        let color = if standing.participant_id == view.local_id {
            Color::HUD_TEXT
        } else {
            Color::HUD_MUTED
        };
        commands.push(DrawCommand::Text {
            text: format!("{}. {} {}", standing.rank, name, standing.score),
            at: Position::new(right, 16.0 + 16.0 * i as f32),
            size: 12.0,
            color,
            align: TextAlign::Right,
            bold: false,
        });
    }

    if view.finished {
        commands.push(DrawCommand::Fill {
            shape: Shape::Rect {
                x: 0.0,
                y: config.arena_height / 2.0 - 40.0,
                width: config.arena_width,
                height: 80.0,
            },
            color: Color::BANNER_BG,
        });
        commands.push(DrawCommand::Text {
            text: "Time's up!".to_string(),
            at: Position::new(config.arena_width / 2.0, config.arena_height / 2.0 + 12.0),
            size: 36.0,
            color: Color::WHITE,
            align: TextAlign::Center,
            bold: true,
        });
    }
}

#[cfg(test)]
mod tests {
    use arena_core::test_helpers::{make_participants, make_players};
    use uuid::Uuid;

    use super::*;

    struct Fixture {
        config: CollectConfig,
        field: CollectibleField,
        participants: Vec<RoomParticipant>,
        profiles: HashMap<PlayerId, Player>,
    }

    impl Fixture {
        fn new(n: usize) -> Self {
            let players = make_players(n);
            let participants = make_participants(Uuid::new_v4(), &players);
            Self {
                config: CollectConfig::default(),
                field: CollectibleField::from_items(vec![
                    Collectible {
                        id: 0,
                        position: Position::new(200.0, 200.0),
                        kind: CollectibleKind::Coin,
                        collected: false,
                    },
                    Collectible {
                        id: 1,
                        position: Position::new(400.0, 200.0),
                        kind: CollectibleKind::Gem,
                        collected: true,
                    },
                    Collectible {
                        id: 2,
                        position: Position::new(600.0, 200.0),
                        kind: CollectibleKind::Star,
                        collected: false,
                    },
                ]),
                participants,
                profiles: players.into_iter().map(|p| (p.id, p)).collect(),
            }
        }

        fn view(&self) -> FrameView<'_> {
            FrameView {
                config: &self.config,
                field: &self.field,
                participants: &self.participants,
                profiles: &self.profiles,
                local_id: self.participants[0].id,
                local_position: Position::new(321.0, 123.0),
                local_score: 35,
                remaining_secs: 42,
                finished: false,
            }
        }
    }

    fn index_of(frame: &Frame, pred: impl Fn(&DrawCommand) -> bool) -> usize {
        frame.commands.iter().position(pred).unwrap()
    }

    #[test]
    fn paint_order_is_arena_items_players_hud() {
        let fx = Fixture::new(2);
        let frame = compose(&fx.view());

        assert!(matches!(
            &frame.commands[0],
            DrawCommand::Fill { shape: Shape::Rect { .. }, color } if *color == Color::BACKGROUND
        ));
        let coin = index_of(&frame, |c| matches!(c, DrawCommand::Fill { color, .. } if *color == Color::COIN));
        let first_player = index_of(&frame, |c| {
            matches!(c, DrawCommand::Fill { shape: Shape::Circle { radius, .. }, .. } if *radius == 20.0)
        });
        let hud = index_of(&frame, |c| matches!(c, DrawCommand::Text { text, .. } if text.starts_with("Time:")));
        let last_grid = frame
            .commands
            .iter()
            .rposition(|c| matches!(c, DrawCommand::Line { .. }))
            .unwrap();
        assert!(last_grid < coin);
        assert!(coin < first_player);
        assert!(first_player < hud);
    }

    #[test]
    fn collected_items_are_not_drawn() {
        let fx = Fixture::new(1);
        let frame = compose(&fx.view());
        let gem = frame
            .commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Fill { color, .. } if *color == Color::GEM))
            .count();
        let star = frame
            .commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Fill { color, .. } if *color == Color::STAR))
            .count();
        assert_eq!(gem, 0);
        assert_eq!(star, 1);
    }

    #[test]
    fn only_local_player_is_outlined_at_local_position() {
        let fx = Fixture::new(3);
        let frame = compose(&fx.view());
        let outlines: Vec<&DrawCommand> = frame
            .commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Stroke { color, .. } if *color == Color::WHITE))
            .collect();
        assert_eq!(outlines.len(), 1);
        match outlines[0] {
            DrawCommand::Stroke {
                shape: Shape::Circle { center, .. },
                ..
            } => assert_eq!(*center, Position::new(321.0, 123.0)),
            other => panic!("unexpected outline {other:?}"),
        }
    }

    #[test]
    fn remote_outside_margin_is_drawn_inside_it() {
        let mut fx = Fixture::new(2);
        fx.participants[1].position = Position::new(-50.0, 5_000.0);
        let frame = compose(&fx.view());

        let color: Color = fx.profiles[&fx.participants[1].player_id].color.into();
        let center = frame
            .commands
            .iter()
            .find_map(|c| match c {
                DrawCommand::Fill {
                    shape: Shape::Circle { center, .. },
                    color: fill,
                } if *fill == color => Some(*center),
                _ => None,
            })
            .unwrap();
        assert_eq!(center, Position::new(20.0, 580.0));
        assert_eq!(fx.participants[1].position, Position::new(-50.0, 5_000.0));
    }

    #[test]
    fn missing_profile_uses_placeholder() {
        let mut fx = Fixture::new(2);
        let remote_player = fx.participants[1].player_id;
        fx.profiles.remove(&remote_player);
        let frame = compose(&fx.view());

        let placeholder: Color = PlayerColor::PLACEHOLDER.into();
        assert!(frame.commands.iter().any(|c| matches!(
            c,
            DrawCommand::Fill { shape: Shape::Circle { .. }, color } if *color == placeholder
        )));
        assert!(frame.texts().any(|t| t == "?"));
        assert!(frame.texts().any(|t| t == "P"));
        assert!(frame.texts().any(|t| t == "player1"));
    }

    #[test]
    fn hud_shows_time_score_and_table() {
        let fx = Fixture::new(2);
        let frame = compose(&fx.view());
        let texts: Vec<&str> = frame.texts().collect();
        assert!(texts.contains(&"Time: 42s"));
        assert!(texts.contains(&"Score: 35"));
        assert!(texts.contains(&"1. player1 35"));
        assert!(texts.contains(&"2. player2 0"));
        assert!(!texts.contains(&"Time's up!"));
    }

    #[test]
    fn banner_after_finish() {
        let fx = Fixture::new(1);
        let mut view = fx.view();
        view.finished = true;
        view.remaining_secs = 0;
        let frame = compose(&view);
        assert_eq!(frame.texts().last(), Some("Time's up!"));
    }

    #[test]
    fn star_has_ten_vertices_pointing_up() {
        let points = star(Position::new(0.0, 0.0), 10.0, 4.0);
        assert_eq!(points.len(), 10);
        assert!((points[0].x).abs() < 1e-4);
        assert!((points[0].y + 10.0).abs() < 1e-4);
    }

    #[test]
    fn css_colors() {
        assert_eq!(Color::COIN.to_css(), "#ffd700");
        assert_eq!(Color::rgba(0, 0, 0, 0.5).to_css(), "rgba(0,0,0,0.5)");
    }
}
