//! Game session and state machine
//!
//! A session owns everything a running game needs: the scene, the physics
//! world, the stack and the camera. Hosts feed it input events and call
//! [`GameSession::frame`] once per display refresh.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::backend::{PhysicsBackend, SceneBackend};
use super::cut::{CutResult, apply_cut};
use super::factory::BoxFactory;
use super::state::Stack;
use super::sync::step_physics;
use crate::settings::Settings;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for the first click; nothing moves
    Idle,
    /// Top layer sliding, clicks cut
    Running,
    /// Missed; debris keeps falling until reset
    GameOver,
}

/// Notifications for the presentation layer (score text, announcement)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    Started,
    ScoreChanged(u32),
    GameOver { score: u32, message: String },
    Reset,
}

/// Camera state mirrored into the scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
}

pub struct GameSession<S, P> {
    settings: Settings,
    factory: BoxFactory<S, P>,
    stack: Stack,
    camera: Camera,
    phase: GamePhase,
    score: u32,
    events: Vec<GameEvent>,
}

impl<S: SceneBackend, P: PhysicsBackend> GameSession<S, P> {
    /// Build a session with the canonical two-layer stack
    pub fn new(scene: S, physics: P, settings: Settings, seed: u64) -> Self {
        let settings = settings.sanitized();
        let factory = BoxFactory::new(scene, physics, &settings, seed);
        let camera = Camera {
            position: settings.camera_start,
            target: settings.camera_target,
        };

        let mut session = Self {
            settings,
            factory,
            stack: Stack::new(),
            camera,
            phase: GamePhase::Idle,
            score: 0,
            events: Vec::new(),
        };
        session.rebuild();

        log::info!("Session created (seed {})", seed);
        session
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn scene(&self) -> &S {
        &self.factory.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.factory.scene
    }

    pub fn physics(&self) -> &P {
        &self.factory.physics
    }

    /// Take all events raised since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Primary input: starts the game, then drops the moving layer
    pub fn on_click(&mut self) -> Option<CutResult> {
        match self.phase {
            GamePhase::Idle => {
                self.phase = GamePhase::Running;
                self.events.push(GameEvent::Started);
                log::info!("Game started");
                None
            }
            GamePhase::Running => {
                let result = apply_cut(&mut self.stack, &mut self.factory, &self.settings);
                match result {
                    CutResult::Placed { score, .. } => {
                        self.score = score;
                        self.events.push(GameEvent::ScoreChanged(score));
                    }
                    CutResult::GameOver { score } => {
                        self.score = score;
                        self.phase = GamePhase::GameOver;
                        self.events.push(GameEvent::GameOver {
                            score,
                            message: game_over_message(score),
                        });
                    }
                }
                Some(result)
            }
            GamePhase::GameOver => {
                log::warn!("Click ignored after game over; reset to play again");
                None
            }
        }
    }

    /// Restart input: immediate teardown and rebuild, back to idle
    pub fn on_reset(&mut self) {
        self.rebuild();
        self.phase = GamePhase::Idle;
        self.score = 0;
        self.events.push(GameEvent::Reset);
        self.events.push(GameEvent::ScoreChanged(0));
        log::info!("Game reset");
    }

    pub fn on_resize(&mut self, width: u32, height: u32) {
        self.factory.scene.resize(width, height);
    }

    /// Per-frame update: game logic, then physics, then render
    pub fn frame(&mut self) {
        match self.phase {
            GamePhase::Running => {
                self.advance_top_layer();
                self.raise_camera();
                step_physics(&self.stack, &mut self.factory, self.settings.physics_dt);
            }
            GamePhase::GameOver => {
                step_physics(&self.stack, &mut self.factory, self.settings.physics_dt);
            }
            GamePhase::Idle => {}
        }
        self.factory.scene.render_frame();
    }

    fn rebuild(&mut self) {
        self.stack.reset(&mut self.factory, &self.settings);
        self.camera = Camera {
            position: self.settings.camera_start,
            target: self.settings.camera_target,
        };
        self.factory.scene.set_camera_position(self.camera.position);
        self.factory.scene.look_at(self.camera.target);
    }

    /// Slide the top layer along its axis in both worlds
    fn advance_top_layer(&mut self) {
        let speed = self.settings.layer_speed;
        let Some(top) = self.stack.top_mut() else {
            return;
        };
        let Some(axis) = top.axis else {
            return;
        };

        top.body.position += axis.unit() * speed;
        self.factory.scene.set_position(top.body.visual, top.body.position);
        self.factory.physics.set_position(top.body.physical, top.body.position);
    }

    /// Keep the camera a fixed margin above the tower
    fn raise_camera(&mut self) {
        let target_height = self.settings.box_height * (self.stack.len() as f32 - 2.0)
            + self.settings.camera_height_margin;
        if self.camera.position.y < target_height {
            self.camera.position.y += self.settings.layer_speed;
            self.factory.scene.set_camera_position(self.camera.position);
        }
    }
}

/// Announcement text shown when the game ends
pub fn game_over_message(score: u32) -> String {
    format!("GAME OVER!\nYOUR SCORE: {}\nRight-click to restart", score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::CAMERA_START;
    use crate::physics::RapierWorld;
    use crate::renderer::SceneGraph;
    use crate::sim::state::Axis;

    fn session() -> GameSession<SceneGraph, RapierWorld> {
        let settings = Settings::default();
        let physics = RapierWorld::new(settings.gravity);
        GameSession::new(SceneGraph::new(800, 600), physics, settings, 12345)
    }

    /// Run frames until the top layer is aligned with the reference layer
    fn frames_until_aligned(session: &mut GameSession<SceneGraph, RapierWorld>) {
        let axis = session.stack().top().unwrap().axis.unwrap();
        let target = axis.of(session.stack().reference().unwrap().position());
        while axis.of(session.stack().top().unwrap().position()) < target {
            session.frame();
        }
    }

    #[test]
    fn test_idle_to_running() {
        let mut s = session();
        assert_eq!(s.phase(), GamePhase::Idle);
        let start = s.stack().top().unwrap().position();

        // Idle frames render but do not move anything
        s.frame();
        assert_eq!(s.stack().top().unwrap().position(), start);
        assert_eq!(s.scene().frames_rendered(), 1);

        assert_eq!(s.on_click(), None);
        assert_eq!(s.phase(), GamePhase::Running);
        assert_eq!(s.drain_events(), vec![GameEvent::Started]);

        s.frame();
        let moved = s.stack().top().unwrap().position();
        assert!((moved.x - (start.x + 0.05)).abs() < 1e-6);
        assert_eq!(moved.z, start.z);
        assert_eq!(s.scene().frames_rendered(), 2);
    }

    #[test]
    fn test_moving_layer_keeps_both_worlds_in_step() {
        let mut s = session();
        s.on_click();
        for _ in 0..10 {
            s.frame();
        }
        let top = s.stack().top().unwrap();
        let node = s.scene().node(top.body.visual).unwrap();
        assert_eq!(node.position, top.position());
        assert_eq!(s.physics().transform(top.body.physical).unwrap().0, top.position());
    }

    #[test]
    fn test_click_places_and_scores() {
        let mut s = session();
        s.on_click();
        s.drain_events();
        frames_until_aligned(&mut s);

        let result = s.on_click().unwrap();
        assert!(matches!(result, CutResult::Placed { score: 1, .. }));
        assert_eq!(s.phase(), GamePhase::Running);
        assert_eq!(s.score(), 1);
        assert_eq!(s.stack().len(), 3);
        assert_eq!(s.stack().top().unwrap().axis, Some(Axis::Z));
        assert_eq!(s.drain_events(), vec![GameEvent::ScoreChanged(1)]);
    }

    #[test]
    fn test_miss_ends_game() {
        let mut s = session();
        s.on_click();
        s.drain_events();
        // Dropped straight away at the spawn offset: nowhere near the tower
        let result = s.on_click().unwrap();
        assert_eq!(result, CutResult::GameOver { score: 0 });
        assert_eq!(s.phase(), GamePhase::GameOver);
        assert_eq!(s.stack().len(), 1);
        assert_eq!(s.stack().overhangs.len(), 1);

        let events = s.drain_events();
        assert_eq!(
            events,
            vec![GameEvent::GameOver {
                score: 0,
                message: game_over_message(0),
            }]
        );

        // Further clicks are ignored
        assert_eq!(s.on_click(), None);
        assert_eq!(s.phase(), GamePhase::GameOver);
    }

    #[test]
    fn test_debris_keeps_falling_after_game_over() {
        let mut s = session();
        s.on_click();
        s.on_click();
        let fallen = s.stack().overhangs[0].body.clone();
        for _ in 0..30 {
            s.frame();
        }
        let node = s.scene().node(fallen.visual).unwrap();
        assert!(node.position.y < fallen.position.y);
    }

    #[test]
    fn test_reset_returns_to_canonical_idle() {
        let mut s = session();
        s.on_click();
        frames_until_aligned(&mut s);
        s.on_click();
        for _ in 0..200 {
            s.frame();
        }
        s.on_click();
        s.on_reset();
        s.on_reset();

        assert_eq!(s.phase(), GamePhase::Idle);
        assert_eq!(s.score(), 0);
        assert_eq!(s.stack().len(), 2);
        assert!(s.stack().overhangs.is_empty());
        assert_eq!(s.stack().top().unwrap().position(), Vec3::new(-10.0, 1.0, 0.0));
        assert_eq!(s.camera().position, CAMERA_START);
        assert_eq!(s.scene().camera_position(), CAMERA_START);
        assert_eq!(s.scene().len(), 2);
        assert_eq!(s.physics().body_count(), 2);

        let events = s.drain_events();
        assert!(events.ends_with(&[GameEvent::Reset, GameEvent::ScoreChanged(0)]));
    }

    #[test]
    fn test_camera_rises_with_the_tower() {
        let mut s = session();
        s.on_click();
        for _ in 0..4 {
            frames_until_aligned(&mut s);
            assert!(matches!(s.on_click(), Some(CutResult::Placed { .. })));
        }
        // Target is box height * (6 - 2) + 4 = 8
        for _ in 0..200 {
            s.frame();
        }
        let y = s.camera().position.y;
        assert!(y >= 8.0 && y < 8.0 + 0.05 + 1e-4, "camera y = {}", y);
        assert_eq!(s.scene().camera_position().y, y);
    }

    #[test]
    fn test_tall_tower_stays_in_view() {
        let settings = Settings::default();
        let physics = RapierWorld::new(settings.gravity);
        let mut s = GameSession::new(SceneGraph::new(1280, 720), physics, settings, 99);
        s.on_click();
        for _ in 0..30 {
            frames_until_aligned(&mut s);
            let top = s.stack().top().unwrap().position();
            let clip = s.scene().view_projection() * top.extend(1.0);
            let ndc = clip.truncate() / clip.w;
            assert!(
                ndc.x.abs() <= 1.0 && ndc.y.abs() <= 1.0,
                "layer {} off screen at {:?}",
                s.stack().len(),
                ndc
            );
            assert!(matches!(s.on_click(), Some(CutResult::Placed { .. })));
        }
        assert_eq!(s.score(), 30);
    }

    #[test]
    fn test_drain_empties_event_queue() {
        let mut s = session();
        s.on_click();
        frames_until_aligned(&mut s);
        s.on_click();
        assert_eq!(
            s.drain_events(),
            vec![GameEvent::Started, GameEvent::ScoreChanged(1)]
        );
        assert!(s.drain_events().is_empty());
        for _ in 0..10 {
            s.frame();
        }
        assert!(s.drain_events().is_empty());
    }

    #[test]
    fn test_camera_still_when_idle() {
        let mut s = session();
        for _ in 0..10 {
            s.frame();
        }
        assert_eq!(s.camera().position, CAMERA_START);
    }

    #[test]
    fn test_resize_reaches_scene() {
        let mut s = session();
        s.on_resize(1920, 1080);
        assert_eq!(s.scene().viewport(), (1920, 1080));
    }
}
