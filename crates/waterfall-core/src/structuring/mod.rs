pub mod rating;
pub mod store;
pub mod tranche;

pub use rating::{parse_rating, Rating};
pub use store::{InMemoryStructureStore, StructureStore};
pub use tranche::{
    StructureValidation, TrancheDefinition, TrancheStructure, TrancheUpdate, MAX_TRANCHES,
    MIN_TRANCHES,
};
