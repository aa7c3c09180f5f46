//! The naming convention that maps flat property keys to artifacts.
//!
//! `omod.appui=1.2` declares module `appui-omod` at version 1.2 in the default module group.
//!  Optional keys `omod.appui.groupId`, `omod.appui.type` and `omod.appui.artifactId` override
//!  the defaults derived from the prefix.

use crate::maven::coordinates::*;
use crate::properties::property_set::PropertySet;

pub const ARTIFACT_ID: &str = "artifactId";
pub const GROUP_ID: &str = "groupId";
pub const TYPE: &str = "type";
pub const VERSION: &str = "version";
pub const NAME: &str = "name";
pub const INCLUDES: &str = "includes";
pub const NAMESPACE: &str = "namespace";
pub const VARS: &str = "vars";

/// trailing key segments that qualify another key rather than declaring an artifact
const SUFFIX_NAMES: [&str; 7] = [ARTIFACT_ID, GROUP_ID, VERSION, TYPE, INCLUDES, NAMESPACE, VARS];

pub const PREFIX_SPA: &str = "spa";
pub const PREFIX_PARENT: &str = "parent";

pub const PROPERTY_DISTRO_ARTIFACT_ID: &str = "distro.artifactId";
pub const PROPERTY_DISTRO_GROUP_ID: &str = "distro.groupId";

/// the platform (core webapp) version of a distro or server
pub const PLATFORM_VERSION_KEY: &str = "war.openmrs";

const REFAPP_ID: &str = "referenceapplication";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    War,
    Omod,
    Owa,
    Config,
    Content,
    Distro,
}

impl ArtifactKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            ArtifactKind::War => "war",
            ArtifactKind::Omod => "omod",
            ArtifactKind::Owa => "owa",
            ArtifactKind::Config => "config",
            ArtifactKind::Content => "content",
            ArtifactKind::Distro => "distro",
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<ArtifactKind> {
        match prefix {
            "war" => Some(ArtifactKind::War),
            "omod" => Some(ArtifactKind::Omod),
            "owa" => Some(ArtifactKind::Owa),
            "config" => Some(ArtifactKind::Config),
            "content" => Some(ArtifactKind::Content),
            "distro" => Some(ArtifactKind::Distro),
            _ => None,
        }
    }

    pub fn default_type(&self) -> &'static str {
        match self {
            ArtifactKind::Omod | ArtifactKind::Distro => TYPE_JAR,
            ArtifactKind::War => TYPE_WAR,
            ArtifactKind::Owa | ArtifactKind::Config | ArtifactKind::Content => TYPE_ZIP,
        }
    }

    /// `distro_group_id` is the value of `distro.groupId` if present; it applies to the distro
    ///  itself and to its configuration packages
    pub fn default_group_id<'a>(&self, distro_group_id: Option<&'a str>) -> &'a str {
        match self {
            ArtifactKind::War => GROUP_WEB,
            ArtifactKind::Omod => GROUP_MODULE,
            ArtifactKind::Owa => GROUP_OWA,
            ArtifactKind::Content => GROUP_CONTENT,
            ArtifactKind::Config | ArtifactKind::Distro => distro_group_id.unwrap_or(GROUP_DISTRO),
        }
    }

    fn artifact_id_suffix(&self) -> Option<&'static str> {
        match self {
            ArtifactKind::Omod => Some("-omod"),
            ArtifactKind::War => Some("-webapp"),
            _ => None,
        }
    }
}

pub fn is_suffix_key(key: &str) -> bool {
    let last_segment = key.rsplit('.').next().unwrap_or(key);
    SUFFIX_NAMES.contains(&last_segment)
}

/// The prefix of a key that declares an artifact version, e.g. `omod` for `omod.appui`. Keys
///  that qualify an artifact (`omod.appui.groupId`) or have no prefix yield `None`.
pub fn key_prefix(key: &str) -> Option<&str> {
    if is_suffix_key(key) {
        return None;
    }
    key.find('.').map(|idx| &key[..idx])
}

pub fn artifact_kind(key: &str) -> Option<ArtifactKind> {
    key_prefix(key).and_then(ArtifactKind::from_prefix)
}

/// The runtime artifact id for an artifact declaring key: the stored id with the suffix of its
///  kind appended, e.g. `omod.appui` -> `appui-omod`, `war.openmrs` -> `openmrs-webapp`.
pub fn artifact_id_from_key(key: &str) -> String {
    let stored_id = match key.find('.') {
        Some(idx) => &key[idx + 1..],
        None => key,
    };
    let mut result = stored_id.to_string();
    match artifact_kind(key).and_then(|k| k.artifact_id_suffix()) {
        Some(suffix) => result.push_str(suffix),
        None => {
            if key == format!("{}.{}", ArtifactKind::Distro.prefix(), REFAPP_ID) {
                result.push_str("-package");
            }
        }
    }
    result
}

/// Removes an `-omod` or `-webapp` suffix. Applying this to an already stripped id is a no-op.
pub fn strip_artifact_id(artifact_id: &str) -> &str {
    if artifact_id.ends_with("-omod") || artifact_id.ends_with("-webapp") {
        match artifact_id.rfind('-') {
            Some(idx) => &artifact_id[..idx],
            None => artifact_id,
        }
    }
    else {
        artifact_id
    }
}

pub fn artifact_key(kind: ArtifactKind, stored_id: &str) -> String {
    format!("{}.{}", kind.prefix(), stored_id)
}

pub fn qualifier_key(artifact_key: &str, qualifier: &str) -> String {
    format!("{}.{}", artifact_key, qualifier)
}

/// The explicit override for one aspect (`artifactId`, `groupId`, `type`) of an artifact key
pub fn explicit_override(properties: &PropertySet, artifact_key: &str, qualifier: &str) -> Option<String> {
    properties.get(&qualifier_key(artifact_key, qualifier))
        .map(|setting| {
            if setting == REFAPP_ID {
                format!("{}-package", setting)
            }
            else {
                setting.to_string()
            }
        })
}

/// Builds the artifact declared by `key`, applying explicit overrides over the defaults of `kind`
pub fn artifact_for_key(properties: &PropertySet, key: &str, kind: ArtifactKind, version: &str) -> Artifact {
    let artifact_id = explicit_override(properties, key, ARTIFACT_ID)
        .unwrap_or_else(|| artifact_id_from_key(key));
    let group_id = explicit_override(properties, key, GROUP_ID)
        .unwrap_or_else(|| kind.default_group_id(properties.get(PROPERTY_DISTRO_GROUP_ID)).to_string());
    let artifact_type = explicit_override(properties, key, TYPE)
        .unwrap_or_else(|| kind.default_type().to_string());

    Artifact::with_type(artifact_id, version, group_id, artifact_type)
}

/// The key kind an artifact of a server composition is stored under: wars as `war.*`,
///  everything else as a module
pub fn deployable_kind(artifact: &Artifact) -> ArtifactKind {
    if artifact.is_type(TYPE_WAR) {
        ArtifactKind::War
    }
    else {
        ArtifactKind::Omod
    }
}

/// Keys that describe the artifact composition of a distro or server, i.e. what gets mirrored
///  between the two
pub fn is_sdk_key(key: &str) -> bool {
    ["war", "omod", "owa", "config", "content", PREFIX_SPA].iter().any(|p| key.starts_with(p))
        || key == NAME
        || key == VERSION
}

#[cfg(test)]
mod test {
    use rstest::*;
    use super::*;

    #[rstest]
    #[case::module("omod.appui", Some(ArtifactKind::Omod))]
    #[case::war("war.openmrs", Some(ArtifactKind::War))]
    #[case::owa("owa.sysadmin", Some(ArtifactKind::Owa))]
    #[case::nested_id("omod.webservices.rest", Some(ArtifactKind::Omod))]
    #[case::group_override("omod.appui.groupId", None)]
    #[case::type_override("omod.appui.type", None)]
    #[case::version_suffix("parent.version", None)]
    #[case::no_prefix("name", None)]
    #[case::unknown_prefix("db.sql", None)]
    fn test_artifact_kind(#[case] key: &str, #[case] expected: Option<ArtifactKind>) {
        assert_eq!(artifact_kind(key), expected);
    }

    #[rstest]
    #[case::module("omod.appui", "appui-omod")]
    #[case::war("war.openmrs", "openmrs-webapp")]
    #[case::owa("owa.sysadmin", "sysadmin")]
    #[case::nested_id("omod.webservices.rest", "webservices.rest-omod")]
    #[case::refapp_distro("distro.referenceapplication", "referenceapplication-package")]
    #[case::other_distro("distro.pihemr", "pihemr")]
    fn test_artifact_id_from_key(#[case] key: &str, #[case] expected: &str) {
        assert_eq!(artifact_id_from_key(key), expected);
    }

    #[rstest]
    #[case::module("appui-omod", "appui")]
    #[case::webapp("openmrs-webapp", "openmrs")]
    #[case::plain("appui", "appui")]
    #[case::inner_dash("data-exchange-omod", "data-exchange")]
    fn test_strip_artifact_id(#[case] artifact_id: &str, #[case] expected: &str) {
        assert_eq!(strip_artifact_id(artifact_id), expected);
        assert_eq!(strip_artifact_id(strip_artifact_id(artifact_id)), expected);
    }

    #[test]
    fn test_artifact_for_key_defaults() {
        let props = PropertySet::new();
        let artifact = artifact_for_key(&props, "omod.appui", ArtifactKind::Omod, "1.2");
        assert_eq!(artifact.artifact_id, "appui-omod");
        assert_eq!(artifact.group_id, GROUP_MODULE);
        assert_eq!(artifact.artifact_type.as_deref(), Some(TYPE_JAR));

        let artifact = artifact_for_key(&props, "war.openmrs", ArtifactKind::War, "2.5.9");
        assert_eq!(artifact.artifact_id, WEBAPP_ARTIFACT_ID);
        assert_eq!(artifact.group_id, GROUP_WEB);
        assert!(artifact.is_platform());
    }

    #[test]
    fn test_artifact_for_key_overrides() {
        let props: PropertySet = vec![
            ("omod.appui", "1.2"),
            ("omod.appui.groupId", "org.example"),
            ("omod.appui.type", "omod"),
            ("omod.appui.artifactId", "appui-api"),
            ("distro.groupId", "org.example.distro"),
            ("distro.pihemr", "2.0"),
            ("distro.pihemr.artifactId", "referenceapplication"),
        ].into_iter().collect();

        let artifact = artifact_for_key(&props, "omod.appui", ArtifactKind::Omod, "1.2");
        assert_eq!(artifact.artifact_id, "appui-api");
        assert_eq!(artifact.group_id, "org.example");
        assert_eq!(artifact.artifact_type.as_deref(), Some(TYPE_OMOD));

        let config = artifact_for_key(&props, "config.pihemr", ArtifactKind::Config, "1.0");
        assert_eq!(config.group_id, "org.example.distro");
        assert_eq!(config.artifact_type.as_deref(), Some(TYPE_ZIP));

        let distro = artifact_for_key(&props, "distro.pihemr", ArtifactKind::Distro, "2.0");
        assert_eq!(distro.artifact_id, "referenceapplication-package");
    }

    #[rstest]
    #[case::module(Artifact::new("appui-omod", "1.2"), ArtifactKind::Omod)]
    #[case::module_jar(Artifact::with_type("appui-omod", "1.2", GROUP_MODULE, TYPE_JAR), ArtifactKind::Omod)]
    #[case::war(Artifact::with_type("reports-webapp", "1.0", GROUP_WEB, TYPE_WAR), ArtifactKind::War)]
    fn test_deployable_kind(#[case] artifact: Artifact, #[case] expected: ArtifactKind) {
        assert_eq!(deployable_kind(&artifact), expected);
    }

    #[rstest]
    #[case::module("omod.appui", true)]
    #[case::module_override("omod.appui.groupId", true)]
    #[case::war("war.openmrs", true)]
    #[case::spa("spa.apiUrl", true)]
    #[case::name("name", true)]
    #[case::version("version", true)]
    #[case::db("connection.url", false)]
    #[case::user_modules("user_modules", false)]
    fn test_is_sdk_key(#[case] key: &str, #[case] expected: bool) {
        assert_eq!(is_sdk_key(key), expected);
    }
}
