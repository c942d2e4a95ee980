pub mod base;
pub mod yahoo;
pub mod rss;
pub mod fixed;
