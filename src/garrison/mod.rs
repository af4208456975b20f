pub mod aggregate;
pub mod errors;
pub mod follower;
pub mod ids;
pub mod packets;
mod persist;
pub mod plot;
pub mod roller;
pub mod static_data;

pub use aggregate::{Garrison, GarrisonContext, PlacementPlan, RemovalPlan};
pub use errors::{ErrorKind, GarrisonError, GarrisonResult};
pub use ids::FollowerIdAllocator;
pub use roller::FollowerAbilityRoller;
pub use static_data::GarrisonStaticData;
