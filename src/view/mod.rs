// View layer: one state value, changed by events, rendered as a whole.
mod render;
mod state;

pub use render::*;
pub use state::*;
