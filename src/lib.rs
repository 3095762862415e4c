pub mod aggregate;
pub mod config;
pub mod display;
pub mod extract;
pub mod fetch;
pub mod parser;
pub mod server;
pub mod watch;

pub mod gtfs_rt {
    include!(concat!(env!("OUT_DIR"), "/transit_realtime.rs"));
}
