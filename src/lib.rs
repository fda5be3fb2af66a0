pub mod alert;
pub mod config;
pub mod dev_mode;
pub mod display;
pub mod engine;
pub mod ingest;
pub mod layers;
pub mod logging;
pub mod model;
pub mod orchestrator;
pub mod sample_points;
pub mod verify;
