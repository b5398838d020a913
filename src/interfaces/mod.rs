//! Job stream adapters: JSON Lines in, JSON Lines out.

pub mod jobs;
