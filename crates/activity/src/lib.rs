//! `packhub-activity` — activities & locations module.
//!
//! A catalog of dog-friendly outdoor spots and a nearby search tuned for
//! safe swimming (calm, clean water).

pub mod features;
pub mod location;
pub mod module;
pub mod store;

pub use features::{AddLocation, LocationView, NearbyLocations};
pub use location::{Location, LocationType, WaterCleanliness, WaveIntensity};
pub use module::ActivityModule;
pub use store::ActivityStore;
