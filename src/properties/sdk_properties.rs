use std::collections::BTreeMap;

use tracing::debug;

use crate::error::Result;
use crate::maven::coordinates::*;
use crate::properties::keys::*;
use crate::properties::placeholders::{resolve_all, PlaceholderSource};
use crate::properties::property_set::PropertySet;

const DEFAULT_NAME: &str = "openmrs";

/// Behaviour shared by everything that describes an artifact composition through a flat
///  property set, i.e. distros and servers.
///
/// Implementors only provide access to their [PropertySet]; all artifact bookkeeping is done
///  here on top of the key grammar in [crate::properties::keys].
pub trait SdkProperties {
    fn properties(&self) -> &PropertySet;
    fn properties_mut(&mut self) -> &mut PropertySet;

    fn get_param(&self, key: &str) -> Option<&str> {
        self.properties().get(key)
    }

    fn get_param_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get_param(key).unwrap_or(default)
    }

    fn contains(&self, key: &str) -> bool {
        self.properties().contains(key)
    }

    fn add_property(&mut self, key: &str, value: &str) {
        self.properties_mut().set(key, value);
    }

    fn platform_version(&self) -> Option<&str> {
        self.get_param(PLATFORM_VERSION_KEY)
    }

    fn set_platform_version(&mut self, version: &str) {
        self.add_property(PLATFORM_VERSION_KEY, version);
    }

    fn name(&self) -> &str {
        self.get_param_or(NAME, DEFAULT_NAME)
    }

    fn set_name(&mut self, name: &str) {
        self.add_property(NAME, name);
    }

    fn version(&self) -> Option<&str> {
        self.get_param(VERSION)
    }

    fn set_version(&mut self, version: &str) {
        self.add_property(VERSION, version);
    }

    /// all artifacts declared with the prefix of `kind`, in key order
    fn artifacts_of_kind(&self, kind: ArtifactKind) -> Vec<Artifact> {
        let properties = self.properties();
        properties.iter()
            .filter(|(key, _)| artifact_kind(key) == Some(kind))
            .map(|(key, version)| artifact_for_key(properties, key, kind, version))
            .collect()
    }

    /// Modules are published with Maven type `jar` by default but deployed as `.omod` files.
    fn get_module_artifacts(&self) -> Vec<Artifact> {
        self.artifacts_of_kind(ArtifactKind::Omod)
            .into_iter()
            .map(|a| a.with_file_extension(TYPE_OMOD))
            .collect()
    }

    fn get_war_artifacts(&self) -> Vec<Artifact> {
        self.artifacts_of_kind(ArtifactKind::War)
    }

    fn get_owa_artifacts(&self) -> Vec<Artifact> {
        self.artifacts_of_kind(ArtifactKind::Owa)
    }

    fn get_config_artifacts(&self) -> Vec<Artifact> {
        self.artifacts_of_kind(ArtifactKind::Config)
    }

    fn get_content_artifacts(&self) -> Vec<Artifact> {
        self.artifacts_of_kind(ArtifactKind::Content)
    }

    /// Point lookup of a module by artifact id; the id may be given with or without its `-omod`
    ///  suffix. Blank versions count as absent.
    fn get_module_artifact(&self, artifact_id: &str) -> Option<Artifact> {
        let key = artifact_key(ArtifactKind::Omod, strip_artifact_id(artifact_id));
        let version = self.get_param(&key)?;
        if version.trim().is_empty() {
            return None;
        }
        Some(artifact_for_key(self.properties(), &key, ArtifactKind::Omod, version)
            .with_file_extension(TYPE_OMOD))
    }

    /// The key that declares an artifact of `kind` with the same identity as `artifact`, with
    ///  `artifactId` and `groupId` overrides taken into account.
    fn find_artifact_key(&self, kind: ArtifactKind, artifact: &Artifact) -> Option<String> {
        let properties = self.properties();
        properties.iter()
            .filter(|(key, _)| artifact_kind(key) == Some(kind))
            .find(|(key, version)| artifact_for_key(properties, key, kind, version).is_same_artifact(artifact))
            .map(|(key, _)| key.to_string())
    }

    /// Writes the keys for one artifact of `kind`. If an artifact with the same identity is
    ///  declared already, its key is updated in place; otherwise the key is derived from the
    ///  artifact id. Override keys are only written where the artifact deviates from what its
    ///  key implies.
    fn set_artifact_properties(&mut self, kind: ArtifactKind, artifact: &Artifact) {
        let key = self.find_artifact_key(kind, artifact)
            .unwrap_or_else(|| artifact_key(kind, strip_artifact_id(&artifact.artifact_id)));
        debug!("setting properties {} for {}", key, artifact);

        let default_group_id = kind.default_group_id(self.get_param(PROPERTY_DISTRO_GROUP_ID)).to_string();
        let artifact_id_override = (artifact.artifact_id != artifact_id_from_key(&key))
            .then_some(artifact.artifact_id.as_str());
        let group_id_override = (artifact.group_id != default_group_id)
            .then_some(artifact.group_id.as_str());
        let type_override = artifact.artifact_type.as_deref()
            .filter(|t| *t != kind.default_type());

        let properties = self.properties_mut();
        properties.set(key.as_str(), artifact.version.as_str());
        set_override(properties, &key, ARTIFACT_ID, artifact_id_override);
        set_override(properties, &key, GROUP_ID, group_id_override);
        set_override(properties, &key, TYPE, type_override);
    }

    /// Removes the key of an artifact of `kind` together with its overrides. Returns `false` if
    ///  no artifact with that identity was declared.
    fn remove_artifact_properties(&mut self, kind: ArtifactKind, artifact: &Artifact) -> bool {
        let Some(key) = self.find_artifact_key(kind, artifact) else {
            return false;
        };
        debug!("removing properties {} for {}", key, artifact);

        let properties = self.properties_mut();
        for qualifier in [TYPE, GROUP_ID, ARTIFACT_ID] {
            properties.remove(&qualifier_key(&key, qualifier));
        }
        properties.remove(&key);
        true
    }

    fn set_module_properties(&mut self, artifact: &Artifact) {
        self.set_artifact_properties(ArtifactKind::Omod, artifact);
    }

    fn remove_module_properties(&mut self, artifact: &Artifact) -> bool {
        self.remove_artifact_properties(ArtifactKind::Omod, artifact)
    }

    fn resolve_placeholders(&mut self, source: &dyn PlaceholderSource) -> Result<()> {
        resolve_all(self.properties_mut(), source)
    }

    /// Makes the artifact composition (and name / version) of `other` mirror this one, removing
    ///  entries from `other` that are blank or absent here.
    fn synchronize<O: SdkProperties>(&self, other: &mut O) {
        let mine = self.properties();
        let theirs = other.properties_mut();

        for (key, value) in mine.iter() {
            if is_sdk_key(key) {
                theirs.set(key, value);
            }
        }
        theirs.retain(|key, _| {
            !is_sdk_key(key)
                || mine.get(key).map(|v| !v.trim().is_empty()).unwrap_or(false)
        });
    }

    /// modules are written with [SdkProperties::set_module_properties], wars only set the
    ///  platform version
    fn set_artifacts(&mut self, war_artifacts: &[Artifact], module_artifacts: &[Artifact]) {
        for module in module_artifacts {
            self.set_module_properties(module);
        }
        for war in war_artifacts {
            self.set_platform_version(&war.version);
        }
    }

    fn properties_with_prefix_removed(&self, prefix: &str) -> BTreeMap<String, String> {
        self.properties().iter()
            .filter_map(|(key, value)| key.strip_prefix(prefix).map(|k| (k.to_string(), value.to_string())))
            .collect()
    }
}

fn set_override(properties: &mut PropertySet, artifact_key: &str, qualifier: &str, value: Option<&str>) {
    let key = qualifier_key(artifact_key, qualifier);
    match value {
        Some(value) => {
            properties.set(key, value);
        }
        None => {
            properties.remove(&key);
        }
    }
}
