pub mod attributes;
pub mod ranking;
pub mod recommendations;
pub mod scoring;
pub mod shuffle;
pub mod sources;
