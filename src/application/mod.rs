pub mod cli;
mod headless;
pub mod ui;
