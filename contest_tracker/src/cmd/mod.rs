pub mod server;
pub mod watch;
