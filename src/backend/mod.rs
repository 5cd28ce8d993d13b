pub mod traits;

pub use traits::{
    BackendFactory, PlaybackChange, PlayerBackend, PlayerEvent, PlayerOptions, TargetId,
};
