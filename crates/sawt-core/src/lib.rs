pub mod audio;
pub mod control;
pub mod errors;
pub mod events;
pub mod ids;
pub mod stages;
