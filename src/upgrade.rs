//! Computing and applying the transition of a server from one artifact composition to another.

pub mod calculator;
pub mod differential;
pub mod fs_deployer;
pub mod server_upgrader;
pub mod transient_deployer;
