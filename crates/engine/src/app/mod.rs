mod input;
mod loop_runner;
mod metrics;
mod rendering;

pub use input::InputAction;
pub use loop_runner::{run_app, AppError, LoopConfig, SLOW_FRAME_ENV_VAR};
pub use metrics::LoopMetricsSnapshot;
pub use rendering::{
    map_view_offset_px, screen_to_world_px, world_to_screen_px, Renderer, Viewport,
};
