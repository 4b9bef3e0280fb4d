pub mod constants;
pub mod db;
pub mod error;
pub mod export;
pub mod external;
pub mod models;
pub mod transfer;

pub use error::{FilmlogError, Result};
