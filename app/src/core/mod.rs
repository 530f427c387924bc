pub mod config;
pub mod item;
pub mod time;
pub mod value;
