pub mod allocation;
pub mod planner;
pub mod scoring;
pub mod selection;
