pub mod filters;
pub mod region;
