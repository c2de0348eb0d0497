mod shaders;
mod state;

pub use state::ViewerState;
