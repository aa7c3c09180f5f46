pub mod error;
pub mod maven;
pub mod properties;
pub mod upgrade;
pub mod util;

pub use error::{Result, SdkError};
pub use maven::coordinates::Artifact;
pub use maven::version::Version;
pub use properties::distro::{DistroProperties, DistroSource};
pub use properties::property_set::PropertySet;
pub use properties::sdk_properties::SdkProperties;
pub use properties::server::{Server, ServerConfig};
pub use upgrade::calculator::calculate_update_differential;
pub use upgrade::differential::UpgradeDifferential;
