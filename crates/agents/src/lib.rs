pub mod backends;
pub mod catalog;
pub mod ensemble;
pub mod evolution;
pub mod roster;
