use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Result, SdkError};
use crate::maven::coordinates::*;
use crate::maven::paths::normalize_artifact;
use crate::properties::keys::*;
use crate::properties::property_set::PropertySet;
use crate::properties::sdk_properties::SdkProperties;

pub const DISTRO_FILE_NAME: &str = "openmrs-distro.properties";

const H2_SUPPORTED: &str = "db.h2.supported";
const DB_SQL: &str = "db.sql";
const EXCLUSIONS: &str = "exclusions";
const PROPERTY_PREFIX: &str = "property.";
const PROMPT_SUFFIX: &str = ".prompt";
const DEFAULT_SUFFIX: &str = ".default";

/// distro definitions shipped with the crate, by reference application version
const BUNDLED_DISTROS: [(&str, &str); 2] = [
    ("2.3.1", include_str!("distros/openmrs-distro-2.3.1.properties")),
    ("2.4", include_str!("distros/openmrs-distro-2.4.properties")),
];

/// The three places a distro definition can come from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DistroSource {
    /// a definition compiled into the crate, by version
    Bundled(String),
    File(PathBuf),
    InMemory(PropertySet),
}

/// The desired composition of a server: platform version, modules and further artifacts, plus
///  some metadata about the distro itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DistroProperties {
    properties: PropertySet,
}

impl SdkProperties for DistroProperties {
    fn properties(&self) -> &PropertySet {
        &self.properties
    }

    fn properties_mut(&mut self) -> &mut PropertySet {
        &mut self.properties
    }
}

impl DistroProperties {
    /// A new, empty distro for the given platform version. The distro version starts out as `1.0`.
    pub fn new(name: &str, platform_version: &str) -> DistroProperties {
        let mut result = DistroProperties::from_properties(PropertySet::new());
        result.set_name(name);
        result.set_version("1.0");
        result.set_platform_version(platform_version);
        result
    }

    pub fn from_properties(properties: PropertySet) -> DistroProperties {
        DistroProperties { properties }
    }

    pub fn load(path: &Path) -> Result<DistroProperties> {
        Ok(DistroProperties::from_properties(PropertySet::load(path)?))
    }

    pub fn load_bundled(version: &str) -> Result<DistroProperties> {
        let (_, text) = BUNDLED_DISTROS.iter()
            .find(|(v, _)| *v == version)
            .ok_or_else(|| SdkError::config(format!("no bundled distro for version {}, available: {}", version, bundled_versions().join(", "))))?;
        debug!("loading bundled distro {}", version);
        Ok(DistroProperties::from_properties(PropertySet::parse(text)?))
    }

    pub fn load_from(source: DistroSource) -> Result<DistroProperties> {
        match source {
            DistroSource::Bundled(version) => DistroProperties::load_bundled(&version),
            DistroSource::File(path) => DistroProperties::load(&path),
            DistroSource::InMemory(properties) => Ok(DistroProperties::from_properties(properties)),
        }
    }

    /// Writes the distro as `openmrs-distro.properties` into `dir`, replacing an existing file.
    pub fn save_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(DISTRO_FILE_NAME);
        self.properties.save(&path)?;
        info!("saved distro {} to {}", self.name(), path.display());
        Ok(path)
    }

    pub fn is_h2_supported(&self) -> bool {
        self.get_param(H2_SUPPORTED)
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    pub fn set_h2_support(&mut self, supported: bool) {
        self.properties.set(H2_SUPPORTED, supported.to_string());
    }

    pub fn sql_script_path(&self) -> Option<&str> {
        self.get_param(DB_SQL)
    }

    pub fn property_prompt(&self, property_name: &str) -> Option<&str> {
        self.get_param(&format!("{}{}{}", PROPERTY_PREFIX, property_name, PROMPT_SUFFIX))
    }

    pub fn property_default(&self, property_name: &str) -> Option<&str> {
        self.get_param(&format!("{}{}{}", PROPERTY_PREFIX, property_name, DEFAULT_SUFFIX))
    }

    pub fn property_value(&self, property_name: &str) -> Option<&str> {
        self.get_param(&format!("{}{}", PROPERTY_PREFIX, property_name))
    }

    /// names of all `property.*` entries, with `.prompt` / `.default` qualifiers folded together
    pub fn properties_names(&self) -> BTreeSet<String> {
        self.properties.keys()
            .filter_map(|key| key.strip_prefix(PROPERTY_PREFIX))
            .map(|name| {
                name.strip_suffix(DEFAULT_SUFFIX)
                    .or_else(|| name.strip_suffix(PROMPT_SUFFIX))
                    .unwrap_or(name)
                    .to_string()
            })
            .collect()
    }

    pub fn exclusions(&self) -> Vec<String> {
        match self.get_param(EXCLUSIONS) {
            None => Vec::new(),
            Some(exclusions) => exclusions.split(',').map(|s| s.to_string()).collect(),
        }
    }

    pub fn add_exclusion(&mut self, exclusion: &str) {
        let new_value = match self.get_param(EXCLUSIONS) {
            None => exclusion.to_string(),
            Some(existing) => format!("{},{}", existing, exclusion),
        };
        self.properties.set(EXCLUSIONS, new_value);
    }

    /// Removes a property, returning its value. It is an error to remove something that is not there.
    pub fn remove_property(&mut self, property: &str) -> Result<String> {
        self.properties.remove(property)
            .ok_or_else(|| SdkError::config(format!("the property {} was not found in the distro", property)))
    }

    /// The distro this one builds on, declared either as `distro.<id>=<version>` (with the usual
    ///  overrides) or as a `parent.artifactId` / `parent.groupId` / `parent.version` group.
    pub fn parent_distro_artifact(&self) -> Result<Option<Artifact>> {
        let mut result = None;
        for (key, version) in self.properties.iter() {
            if artifact_kind(key) == Some(ArtifactKind::Distro) {
                if result.is_some() {
                    return Err(SdkError::config("only a single distro property can be added to indicate the parent distribution"));
                }
                result = Some(artifact_for_key(&self.properties, key, ArtifactKind::Distro, version));
            }
        }

        let parent_param = |name: &str| self.get_param(&format!("{}.{}", PREFIX_PARENT, name))
            .filter(|v| !v.trim().is_empty());

        if let Some(artifact_id) = parent_param(ARTIFACT_ID) {
            if result.is_some() {
                return Err(SdkError::config("distro properties cannot define both a distro and a parent property"));
            }
            let (version, group_id) = match (parent_param(VERSION), parent_param(GROUP_ID)) {
                (Some(v), Some(g)) => (v, g),
                _ => return Err(SdkError::config("a parent groupId and version are required if a parent artifactId is specified")),
            };
            let artifact_type = parent_param(TYPE).unwrap_or(TYPE_ZIP);
            result = Some(Artifact::with_type(artifact_id, version, group_id, artifact_type));
        }

        Ok(result.map(normalize_artifact))
    }
}

pub fn bundled_versions() -> Vec<&'static str> {
    BUNDLED_DISTROS.iter().map(|(v, _)| *v).collect()
}
