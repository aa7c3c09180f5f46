//! Maven-side value types: artifact coordinates, versions and the file name conventions used
//!  when artifacts are deployed into a server directory.

pub mod coordinates;
pub mod paths;
pub mod version;
