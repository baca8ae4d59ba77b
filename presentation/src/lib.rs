pub mod cli;
pub mod clipboard;
pub mod interrupt;
pub mod render;
pub mod view;
