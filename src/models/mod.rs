pub mod donation;
pub mod food_bank;
pub mod listing;
