//! Process wiring: infrastructure connections and service assembly.

pub mod resources;

pub use resources::ResourceManager;
