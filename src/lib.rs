pub mod cli;
pub mod compare;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod fragment;
pub mod jsonld;
pub mod normalize;
pub mod pack;
pub mod page;
pub mod price_history;
pub mod product;
pub mod score;
pub mod summarize;
pub mod value;

pub use error::{Result, ShoplensError};
