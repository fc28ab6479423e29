pub mod frankfurter;
pub mod reports;
pub mod util;

// Re-export the concrete providers for cleaner imports
pub use frankfurter::FrankfurterProvider;
pub use reports::LocalReports;
