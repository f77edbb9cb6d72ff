pub mod command;
pub mod notification;
pub mod render;
pub mod state;
pub mod storage;
