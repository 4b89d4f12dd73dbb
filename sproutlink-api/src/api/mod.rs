//! HTTP API handlers for sproutlink-api

pub mod donor;
pub mod health;
pub mod notes;
pub mod student;

pub use donor::donor_routes;
pub use health::health_routes;
pub use notes::notes_routes;
pub use student::student_routes;
