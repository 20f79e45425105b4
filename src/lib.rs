#![forbid(unsafe_code)]

pub mod clock;
pub mod compile;
pub mod core;
pub mod error;
pub mod export;
pub mod metaballs;
pub mod rng;
pub mod scene;
pub mod settings;
pub mod suggest;
pub mod svg;

pub use clock::AnimationClock;
pub use compile::{BufferId, BufferLabel, FilterGraph, FilterStage, StageOp, compile};
pub use core::{Canvas, Rgba8};
pub use error::{LiquitypeError, LiquitypeResult};
pub use metaballs::{MetaballAnchor, animated_position, derive_anchors};
pub use scene::{FrameScene, compose_frame};
pub use settings::{
    FontFamily, MorphOperator, NoiseKind, SettingsPatch, TextureMode, TypeSettings,
};
pub use suggest::{SuggestionProvider, apply_suggestion};
