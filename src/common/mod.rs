pub mod bars;
pub mod colors;
pub mod compositor;
pub mod config;
pub mod constants;
pub mod font;
