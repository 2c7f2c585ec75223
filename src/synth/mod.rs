//! Deterministic synthesis module
//!
//! Every sample of music and sound effects is computed here. This module must
//! stay pure and deterministic:
//! - Time advances only by emitted frames
//! - Seeded RNG only (one PCG32 per generator instance)
//! - No I/O, no blocking, no allocation on the `fill` path

pub mod clock;
pub mod drums;
pub mod mix;
pub mod osc;
pub mod sfx;
pub mod track;
pub mod voices;

pub use clock::{Clock, Position, Progression};
pub use mix::{Frame, duck, duck_partial};
pub use osc::{Noise, OnePole, PhaseAccumulator};
pub use sfx::{OneShot, SfxConfig, SfxPlayer};
pub use track::{PlayState, Track, TrackConfig, TrackStyle};
