//! Entity systems, in the order the driver registers them
//!
//! Logic systems come first; render sync runs after them so it sees the
//! state they produced.

pub mod cursor_damage;
pub mod falling;
pub mod movement;
pub mod player;
pub mod render_sync;
pub mod status_sync;
pub mod timing;
pub mod visual;

pub use cursor_damage::CursorDamageSystem;
pub use falling::FallingObjectSystem;
pub use movement::{drift_position, MovementSystem};
pub use player::{PlayerSmoothing, PlayerSystem};
pub use render_sync::RenderSyncSystem;
pub use status_sync::StatusSyncSystem;
pub use timing::TimingSystem;
pub use visual::{VisualSystem, VisualTuning};
