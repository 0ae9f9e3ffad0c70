pub mod composer;
pub mod graph;
pub mod messages;
pub mod status;
