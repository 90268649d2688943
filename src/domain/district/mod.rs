//! District aggregate
//!
//! Administrative regions with optional boundaries, used to assign
//! stores by containment.

pub mod model;
pub mod repository;

pub use model::{District, DistrictType, DistrictUpdate, NewDistrict, DEFAULT_CITY};
pub use repository::{DistrictFilter, DistrictRepository, DistrictStatistics, DISTRICT_ORDERING};
