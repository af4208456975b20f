pub mod records;
pub mod tables;

use serde::{Deserialize, Serialize};

macro_rules! content_id {
    ($(#[$meta:meta])* $name:ident($inner:ty)) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

content_id!(
    /// Character that owns a garrison.
    OwnerId(u64)
);
content_id!(SiteId(u32));
content_id!(SiteLevelId(u32));
content_id!(
    /// Plot definition (shape and construction visuals), shared by many plot instances.
    PlotId(u32)
);
content_id!(PlotInstanceId(u32));
content_id!(BuildingId(u32));
content_id!(BuildingType(u32));
content_id!(FollowerTemplateId(u32));
content_id!(
    /// Storage id of a recruited follower, minted by `FollowerIdAllocator`.
    FollowerDbId(u64)
);
content_id!(AbilityId(u32));
content_id!(ClassSpecId(u32));
content_id!(GameObjectTemplateId(u32));
content_id!(MapId(u32));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    Horde,
    Alliance,
}

impl Faction {
    pub fn index(self) -> usize {
        match self {
            Faction::Horde => 0,
            Faction::Alliance => 1,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Faction::Horde),
            1 => Some(Faction::Alliance),
            _ => None,
        }
    }
}

/// Pick between a horde and an alliance variant of the same value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerFaction<T> {
    pub horde: T,
    pub alliance: T,
}

impl<T: Copy> PerFaction<T> {
    pub fn get(&self, faction: Faction) -> T {
        match faction {
            Faction::Horde => self.horde,
            Faction::Alliance => self.alliance,
        }
    }
}

pub const GARRISON_TYPE_GARRISON: u8 = 2;
pub const FOLLOWER_TYPE_GARRISON: u8 = 1;
/// Copper per gold coin.
pub const GOLD: u64 = 10_000;
