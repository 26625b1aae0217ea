// Domain-specific error types
pub mod errors;

// Input schema and cache-key canonicalization
pub mod features;

// Port interfaces
pub mod ports;

pub mod prediction;
