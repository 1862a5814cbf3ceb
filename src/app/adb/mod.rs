pub mod actions;
pub mod apps;
pub mod locator;
pub mod parse;
pub mod runner;
pub mod table;
