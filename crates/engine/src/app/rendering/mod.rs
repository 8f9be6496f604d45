mod renderer;
mod transform;

pub use renderer::Renderer;
pub use transform::{map_view_offset_px, screen_to_world_px, world_to_screen_px, Viewport};
