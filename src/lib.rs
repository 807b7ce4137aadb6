//! Procedural realm world generator
//!
//! Turns a seed string and a grid size into a deterministic `World` snapshot:
//! terrain, counties, polities and their vassal hierarchies, cultures, religions,
//! courts and diplomacy.

pub mod biomes;
pub mod climate;
pub mod erosion;
pub mod error;
pub mod expansion;
pub mod gradient_noise;
pub mod heightmap;
pub mod history;
pub mod seeds;
pub mod tilemap;
pub mod worker;
pub mod world;

pub use error::{GenerationError, Result};
pub use worker::{spawn_generation, GenerationEvent, GenerationHandle, GenerationMessage};
pub use world::{generate, generate_with, GenerationRequest, Stage, World, WorldConfig};
