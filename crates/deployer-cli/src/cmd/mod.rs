pub mod plan;
pub mod registry;
pub mod stages;
