use thiserror::Error;

/// Failure classes every garrison result falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidState,
    PreconditionFailed,
    AlreadyExists,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GarrisonError {
    #[error("unknown garrison site")]
    InvalidSite,
    #[error("garrison already created")]
    GarrisonExists,
    #[error("plot instance does not belong to this garrison")]
    InvalidPlotInstance,
    #[error("unknown building")]
    InvalidBuilding,
    #[error("building cannot be placed on this plot")]
    InvalidPlotBuilding,
    #[error("building level exceeds garrison level")]
    UpgradeLevelExceedsGarrisonLevel,
    #[error("building requires a blueprint")]
    RequiresBlueprint,
    #[error("building is granted by quest and cannot be placed")]
    NotPlaceable,
    #[error("a building of this type already exists")]
    BuildingExists,
    #[error("not enough currency")]
    NotEnoughCurrency,
    #[error("not enough gold")]
    NotEnoughGold,
    #[error("plot holds a building under construction")]
    UnderConstruction,
    #[error("plot has no building")]
    NoBuilding,
    #[error("construction already complete")]
    ConstructionComplete,
    #[error("construction has not finished")]
    BuildingNotReady,
    #[error("building is already active")]
    BuildingAlreadyActive,
    #[error("blueprint already known")]
    BlueprintExists,
    #[error("follower exists or is unknown")]
    FollowerExists,
    #[error("follower not found")]
    FollowerNotFound,
}

impl GarrisonError {
    pub fn kind(self) -> ErrorKind {
        match self {
            GarrisonError::InvalidSite
            | GarrisonError::InvalidPlotInstance
            | GarrisonError::InvalidBuilding
            | GarrisonError::NoBuilding
            | GarrisonError::FollowerNotFound => ErrorKind::NotFound,
            GarrisonError::UnderConstruction
            | GarrisonError::ConstructionComplete
            | GarrisonError::BuildingNotReady
            | GarrisonError::BuildingAlreadyActive => ErrorKind::InvalidState,
            GarrisonError::InvalidPlotBuilding
            | GarrisonError::UpgradeLevelExceedsGarrisonLevel
            | GarrisonError::RequiresBlueprint
            | GarrisonError::NotPlaceable
            | GarrisonError::BuildingExists
            | GarrisonError::NotEnoughCurrency
            | GarrisonError::NotEnoughGold => ErrorKind::PreconditionFailed,
            GarrisonError::GarrisonExists
            | GarrisonError::BlueprintExists
            | GarrisonError::FollowerExists => ErrorKind::AlreadyExists,
        }
    }
}

pub type GarrisonResult<T = ()> = Result<T, GarrisonError>;
