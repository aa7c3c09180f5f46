//! The property-backed model: distros and servers described by flat `.properties` files.

pub mod distro;
pub mod keys;
pub mod placeholders;
pub mod property_set;
pub mod sdk_properties;
pub mod server;
