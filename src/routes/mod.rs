pub mod auth;
pub mod employer;
pub mod hiring;
pub mod housekeeper;
pub mod review;
