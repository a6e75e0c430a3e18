pub mod export;
pub mod grid;
