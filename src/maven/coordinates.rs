use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

use serde::Serialize;

pub const GROUP_MODULE: &str = "org.openmrs.module";
pub const GROUP_OWA: &str = "org.openmrs.owa";
pub const GROUP_WEB: &str = "org.openmrs.web";
pub const GROUP_OPENMRS: &str = "org.openmrs";
pub const GROUP_DISTRO: &str = "org.openmrs.distro";
pub const GROUP_CONTENT: &str = "org.openmrs.content";

pub const TYPE_OMOD: &str = "omod";
pub const TYPE_WAR: &str = "war";
pub const TYPE_JAR: &str = "jar";
pub const TYPE_ZIP: &str = "zip";

/// artifact id of the OpenMRS core web application, i.e. the 'platform'
pub const WEBAPP_ARTIFACT_ID: &str = "openmrs-webapp";

/// A deployable unit (module, web archive, distro descriptor, ...) identified by group and
///  artifact id, at some version.
///
/// NB: Equality and hashing cover group id, artifact id and version but *not* the type. Use
///  [Artifact::is_same_artifact] to check whether two artifacts are different versions of the
///  same thing.
#[derive(Clone, Debug, Serialize)]
pub struct Artifact {
    pub artifact_id: String,
    pub group_id: String,
    pub version: String,
    /// `None` means 'whatever is the default in the current context'
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub artifact_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classifier: Option<String>,
    #[serde(skip)]
    file_extension: Option<String>,
    #[serde(skip)]
    dest_file_name: Option<String>,
}

impl Artifact {
    pub fn new(artifact_id: impl Into<String>, version: impl Into<String>) -> Artifact {
        Artifact::with_group(artifact_id, version, GROUP_MODULE)
    }

    pub fn with_group(artifact_id: impl Into<String>, version: impl Into<String>, group_id: impl Into<String>) -> Artifact {
        Artifact {
            artifact_id: artifact_id.into(),
            group_id: group_id.into(),
            version: version.into(),
            artifact_type: None,
            classifier: None,
            file_extension: None,
            dest_file_name: None,
        }
    }

    pub fn with_type(artifact_id: impl Into<String>, version: impl Into<String>, group_id: impl Into<String>, artifact_type: impl Into<String>) -> Artifact {
        let mut result = Artifact::with_group(artifact_id, version, group_id);
        result.artifact_type = Some(artifact_type.into());
        result
    }

    /// Sets the extension used for the deployed file independently of the Maven type, e.g. modules
    ///  that are published as `jar` but deployed as `.omod`.
    pub fn with_file_extension(mut self, extension: impl Into<String>) -> Artifact {
        self.file_extension = Some(extension.into());
        self
    }

    /// identity check: same group and artifact id, regardless of version and type
    pub fn is_same_artifact(&self, other: &Artifact) -> bool {
        self.artifact_id == other.artifact_id && self.group_id == other.group_id
    }

    pub fn type_or_default(&self) -> &str {
        self.artifact_type.as_deref().unwrap_or(TYPE_OMOD)
    }

    pub fn is_type(&self, artifact_type: &str) -> bool {
        self.artifact_type.as_deref() == Some(artifact_type)
    }

    /// The file name this artifact is deployed under, e.g. `appui-1.2.omod`. An explicitly set
    ///  file name takes precedence.
    pub fn dest_file_name(&self) -> String {
        match &self.dest_file_name {
            Some(name) => name.clone(),
            None => {
                let extension = self.file_extension.as_deref().unwrap_or(self.type_or_default());
                crate::maven::paths::dest_file_name(&self.artifact_id, &self.version, extension)
            }
        }
    }

    pub fn set_dest_file_name(&mut self, file_name: impl Into<String>) {
        self.dest_file_name = Some(file_name.into());
    }

    pub fn group_id_and_artifact_id(&self) -> String {
        format!("{}:{}", self.group_id, self.artifact_id)
    }

    pub fn is_valid(&self) -> bool {
        !self.group_id.trim().is_empty()
            && !self.artifact_id.trim().is_empty()
            && !self.version.trim().is_empty()
    }

    /// true for the OpenMRS core web application
    pub fn is_platform(&self) -> bool {
        self.is_type(TYPE_WAR) && self.artifact_id == WEBAPP_ARTIFACT_ID
    }
}

impl PartialEq for Artifact {
    fn eq(&self, other: &Self) -> bool {
        self.artifact_id == other.artifact_id
            && self.group_id == other.group_id
            && self.version == other.version
    }
}
impl Eq for Artifact {}

impl Hash for Artifact {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.artifact_id.hash(state);
        self.group_id.hash(state);
        self.version.hash(state);
    }
}

impl Display for Artifact {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}
