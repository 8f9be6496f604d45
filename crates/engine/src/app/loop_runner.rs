use std::env;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Fullscreen, WindowBuilder};

use crate::sim::{GameSession, MapLoadError, MoveIntent, SimEvent, StateKind, TileMap, Vec2};
use crate::StartupError;

use super::input::ActionStates;
use super::metrics::MetricsAccumulator;
use super::{screen_to_world_px, InputAction, Renderer, Viewport};

pub const SLOW_FRAME_ENV_VAR: &str = "SPACESHIP_SLOW_FRAME_MS";

const DEFAULT_TICK_DURATION: Duration = Duration::from_millis(20);

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub tick_duration: Duration,
    /// Longest frame time fed to the accumulator. `None` keeps the full delta.
    pub max_frame_delta: Option<Duration>,
    /// Catch-up cap per frame. `None` runs every owed tick.
    pub max_ticks_per_frame: Option<u32>,
    pub metrics_log_interval: Duration,
    pub simulated_slow_frame_ms: u64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Spaceship".to_string(),
            window_width: 640,
            window_height: 480,
            tick_duration: DEFAULT_TICK_DURATION,
            max_frame_delta: None,
            max_ticks_per_frame: None,
            metrics_log_interval: Duration::from_secs(1),
            simulated_slow_frame_ms: 0,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    MapLoad(#[from] MapLoadError),
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// Opens the window and drives `session` until the window closes.
pub fn run_app(config: LoopConfig, mut session: GameSession) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(window_title_for(&config.window_title, session.state().kind()))
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut renderer = Renderer::new(Arc::clone(&window)).map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let tick_duration = normalize_non_zero_duration(config.tick_duration, DEFAULT_TICK_DURATION);
    let max_frame_delta = config.max_frame_delta.filter(|delta| !delta.is_zero());
    let max_ticks_per_frame = config.max_ticks_per_frame.map(|cap| cap.max(1));
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let slow_frame_delay = resolve_slow_frame_delay(config.simulated_slow_frame_ms);
    info!(
        tick_ms = tick_duration.as_millis() as u64,
        max_frame_delta_ms = %format_optional_ms(max_frame_delta),
        max_ticks_per_frame = %format_optional_cap(max_ticks_per_frame),
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        slow_frame_delay_ms = slow_frame_delay.as_millis() as u64,
        "loop_config"
    );

    let mut input_collector = InputCollector::default();
    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);
    let mut shown_state = session.state().kind();
    let mut fullscreen = false;

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let size = window.inner_size();
                    if let Err(error) = renderer.resize(size.width, size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::CursorMoved { position, .. } => {
                    input_collector.set_cursor_position_px(position.x as f32, position.y as f32);
                }
                WindowEvent::CursorLeft { .. } => {
                    input_collector.clear_cursor_position();
                }
                WindowEvent::MouseInput { state, button, .. } => {
                    input_collector.handle_mouse_input(button, state);
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    input_collector.handle_key(event.physical_key, event.state);
                }
                WindowEvent::RedrawRequested => {
                    if slow_frame_delay > Duration::ZERO {
                        // Debug perturbation only.
                        thread::sleep(slow_frame_delay);
                    }

                    if input_collector.take_fullscreen_toggle_pressed() {
                        fullscreen = !fullscreen;
                        window.set_fullscreen(fullscreen.then_some(Fullscreen::Borderless(None)));
                        info!(fullscreen, "fullscreen_toggled");
                    }

                    let events = input_collector.drain_events(session.map(), renderer.viewport());
                    for event in events {
                        let _ = session.handle_event(event);
                    }
                    if input_collector.take_dump_pressed() {
                        dump_session_state(&session);
                    }

                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;
                    accumulator = accumulator.saturating_add(clamp_frame_delta(
                        raw_frame_dt,
                        max_frame_delta,
                    ));

                    let step_plan = plan_sim_steps(accumulator, tick_duration, max_ticks_per_frame);
                    for _ in 0..step_plan.ticks_to_run {
                        session.tick(input_collector.move_intent());
                        metrics_accumulator.record_tick();
                    }
                    accumulator = step_plan.remaining_accumulator;

                    if step_plan.dropped_backlog > Duration::ZERO {
                        warn!(
                            dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                            max_ticks_per_frame = %format_optional_cap(max_ticks_per_frame),
                            "sim_clamp_triggered"
                        );
                    }

                    if step_plan.ticks_to_run > 0 {
                        let cursor = input_collector.cursor_position_px();
                        if let Err(error) = renderer.render_session(&session, cursor) {
                            warn!(error = %error, "renderer_draw_failed");
                            window_target.exit();
                        }
                        metrics_accumulator.record_frame(raw_frame_dt);
                    } else {
                        metrics_accumulator.record_idle_frame();
                    }

                    let state = session.state().kind();
                    if state != shown_state {
                        window.set_title(&window_title_for(&config.window_title, state));
                        shown_state = state;
                    }

                    if let Some(snapshot) = metrics_accumulator.maybe_snapshot(now) {
                        info!(
                            fps = snapshot.fps,
                            tps = snapshot.tps,
                            frame_time_ms = snapshot.frame_time_ms,
                            idle_frames = snapshot.idle_frames,
                            naut_count = session.nauts().len(),
                            state = ?state,
                            "loop_metrics"
                        );
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                info!(tick = session.tick_count(), "shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

fn dump_session_state(session: &GameSession) {
    match serde_json::to_string(&session.snapshot()) {
        Ok(json) => info!(snapshot = %json, "state_dump"),
        Err(error) => warn!(error = %error, "state_dump_failed"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PendingInput {
    ClickAt(Vec2),
    Cancel,
}

#[derive(Debug, Default)]
struct InputCollector {
    action_states: ActionStates,
    cursor_position_px: Option<Vec2>,
    left_mouse_is_down: bool,
    escape_is_down: bool,
    dump_key_is_down: bool,
    dump_pressed_edge: bool,
    alt_is_down: bool,
    enter_is_down: bool,
    fullscreen_toggle_pressed_edge: bool,
    pending: Vec<PendingInput>,
}

impl InputCollector {
    fn handle_key(&mut self, key: PhysicalKey, state: ElementState) {
        let is_pressed = state == ElementState::Pressed;
        let PhysicalKey::Code(code) = key else {
            return;
        };
        match code {
            KeyCode::KeyW | KeyCode::ArrowUp => {
                self.action_states.set(InputAction::MoveUp, is_pressed)
            }
            KeyCode::KeyS | KeyCode::ArrowDown => {
                self.action_states.set(InputAction::MoveDown, is_pressed)
            }
            KeyCode::KeyA | KeyCode::ArrowLeft => {
                self.action_states.set(InputAction::MoveLeft, is_pressed)
            }
            KeyCode::KeyD | KeyCode::ArrowRight => {
                self.action_states.set(InputAction::MoveRight, is_pressed)
            }
            KeyCode::Escape => {
                if is_pressed && !self.escape_is_down {
                    self.pending.push(PendingInput::Cancel);
                }
                self.escape_is_down = is_pressed;
            }
            KeyCode::F1 => {
                if is_pressed && !self.dump_key_is_down {
                    self.dump_pressed_edge = true;
                }
                self.dump_key_is_down = is_pressed;
            }
            KeyCode::AltLeft | KeyCode::AltRight => self.alt_is_down = is_pressed,
            KeyCode::Enter => {
                if is_pressed && !self.enter_is_down && self.alt_is_down {
                    self.fullscreen_toggle_pressed_edge = true;
                }
                self.enter_is_down = is_pressed;
            }
            _ => {}
        }
    }

    fn handle_mouse_input(&mut self, button: MouseButton, state: ElementState) {
        if button != MouseButton::Left {
            return;
        }
        match state {
            ElementState::Pressed => {
                if !self.left_mouse_is_down {
                    if let Some(cursor) = self.cursor_position_px {
                        self.pending.push(PendingInput::ClickAt(cursor));
                    }
                }
                self.left_mouse_is_down = true;
            }
            ElementState::Released => self.left_mouse_is_down = false,
        }
    }

    fn set_cursor_position_px(&mut self, x: f32, y: f32) {
        self.cursor_position_px = Some(Vec2 { x, y });
    }

    fn clear_cursor_position(&mut self) {
        self.cursor_position_px = None;
    }

    fn cursor_position_px(&self) -> Option<Vec2> {
        self.cursor_position_px
    }

    fn move_intent(&self) -> MoveIntent {
        self.action_states.move_intent()
    }

    /// Converts queued clicks into world pixels against the current view, in arrival order.
    fn drain_events(&mut self, map: &TileMap, viewport: Viewport) -> Vec<SimEvent> {
        self.pending
            .drain(..)
            .map(|input| match input {
                PendingInput::ClickAt(screen) => SimEvent::Click {
                    world: screen_to_world_px(screen, map, viewport),
                },
                PendingInput::Cancel => SimEvent::Cancel,
            })
            .collect()
    }

    fn take_dump_pressed(&mut self) -> bool {
        std::mem::take(&mut self.dump_pressed_edge)
    }

    fn take_fullscreen_toggle_pressed(&mut self) -> bool {
        std::mem::take(&mut self.fullscreen_toggle_pressed_edge)
    }
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: Option<u32>,
) -> StepPlan {
    let mut ticks_to_run = 0u32;
    let under_cap = |ticks: u32| max_ticks_per_frame.map_or(true, |cap| ticks < cap);

    while accumulator >= fixed_dt && under_cap(ticks_to_run) {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Option<Duration>) -> Duration {
    match max_frame_delta {
        Some(max) => frame_dt.min(max),
        None => frame_dt,
    }
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn window_title_for(base: &str, state: StateKind) -> String {
    let scene = match state {
        StateKind::Interior | StateKind::InteractionAnimation => "Ship Interior",
        StateKind::SecondaryMode => "Galaxy",
    };
    format!("{base} - {scene}")
}

fn format_optional_cap(cap: Option<u32>) -> String {
    match cap {
        Some(value) => value.to_string(),
        None => "off".to_string(),
    }
}

fn format_optional_ms(value: Option<Duration>) -> String {
    match value {
        Some(duration) => duration.as_millis().to_string(),
        None => "off".to_string(),
    }
}

fn resolve_slow_frame_delay(config_slow_frame_ms: u64) -> Duration {
    match env::var(SLOW_FRAME_ENV_VAR) {
        Ok(value) => match value.parse::<u64>() {
            Ok(ms) => Duration::from_millis(ms),
            Err(_) => {
                warn!(
                    env_var = SLOW_FRAME_ENV_VAR,
                    value = value.as_str(),
                    "invalid slow-frame env var value; falling back to config"
                );
                Duration::from_millis(config_slow_frame_ms)
            }
        },
        Err(env::VarError::NotPresent) => Duration::from_millis(config_slow_frame_ms),
        Err(err) => {
            warn!(
                env_var = SLOW_FRAME_ENV_VAR,
                error = %err,
                "unable to read slow-frame env var; falling back to config"
            );
            Duration::from_millis(config_slow_frame_ms)
        }
    }
}
