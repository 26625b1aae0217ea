// Startup wiring
pub mod lifecycle;

// Price model (training + inference)
pub mod ml;

// Request pipeline
pub mod prediction_service;

pub use prediction_service::PredictionService;
