pub mod access;
pub mod availability;
pub mod booking;
pub mod fleet;
pub mod identity;
pub mod pricing;
