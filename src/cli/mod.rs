pub mod currency;
pub mod limits;
pub mod report;
pub mod setup;
pub mod spend;
pub mod ui;
