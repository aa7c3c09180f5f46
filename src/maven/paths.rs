use std::path::PathBuf;

use crate::error::{Result, SdkError};
use crate::maven::coordinates::*;
use crate::maven::version::Version;

const SNAPSHOT: &str = "SNAPSHOT";

pub const REFAPP_2X_GROUP_ID: &str = "org.openmrs.distro";
pub const REFAPP_2X_ARTIFACT_ID: &str = "referenceapplication-package";
pub const REFAPP_2X_TYPE: &str = "jar";
pub const REFAPP_3X_GROUP_ID: &str = "org.openmrs";
pub const REFAPP_3X_ARTIFACT_ID: &str = "distro-emr-configuration";
pub const REFAPP_3X_TYPE: &str = "zip";
pub const REFAPP_DISTRO: &str = "referenceapplication-distro";

/// `{first dash-separated segment of the artifact id}-{version}.{extension}`
pub fn dest_file_name(artifact_id: &str, version: &str, extension: &str) -> String {
    let base_id = match artifact_id.find('-') {
        Some(idx) => &artifact_id[..idx],
        None => artifact_id,
    };
    format!("{}-{}.{}", base_id, version, extension)
}

/// The location of an artifact's file relative to the root of a Maven repository, e.g.
///  `org/openmrs/module/appui-omod/1.2/appui-omod-1.2.jar`. Artifacts without a type are
///  looked up as `jar`.
pub fn repository_path(artifact: &Artifact) -> PathBuf {
    let mut result: PathBuf = artifact.group_id.split('.').collect();
    result.push(&artifact.artifact_id);
    result.push(&artifact.version);

    let extension = artifact.artifact_type.as_deref().unwrap_or(TYPE_JAR);
    let file_name = match &artifact.classifier {
        Some(classifier) => format!("{}-{}-{}.{}", artifact.artifact_id, artifact.version, classifier, extension),
        None => format!("{}-{}.{}", artifact.artifact_id, artifact.version, extension),
    };
    result.push(file_name);
    result
}

/// Extracts the version from a file name of the form `{name}-{version}.{ext}`. Snapshot file
///  names keep the `-SNAPSHOT` suffix, i.e. the last two dash-separated segments are returned.
pub fn version_from_file_name(file_name: &str) -> Result<String> {
    let without_extension = match file_name.rfind('.') {
        Some(last_dot) => &file_name[..last_dot],
        None => return Err(SdkError::config(format!("not a valid artifact file name, no extension: {:?}", file_name))),
    };

    let parts: Vec<&str> = without_extension.split('-').collect();
    if file_name.contains(SNAPSHOT) {
        if parts.len() < 2 {
            return Err(SdkError::config(format!("not a valid snapshot file name: {:?}", file_name)));
        }
        Ok(format!("{}-{}", parts[parts.len() - 2], parts[parts.len() - 1]))
    }
    else {
        // split always yields at least one element
        Ok(parts[parts.len() - 1].to_string())
    }
}

/// Parses a distro specifier of the form `groupId:artifactId:version` or `artifactId:version`,
///  filling in the distro group and mapping well-known reference application ids.
pub fn parse_distro_artifact(distro: &str) -> Result<Artifact> {
    let split: Vec<&str> = distro.split(':').collect();
    if split.len() < 2 || split.len() > 3 {
        return Err(SdkError::config(format!("invalid distro: {}", distro)));
    }
    let group_id = if split.len() == 3 { split[0] } else { GROUP_DISTRO };
    let artifact_id = split[split.len() - 2];
    let version = split[split.len() - 1];
    Ok(normalize_artifact(Artifact::with_type(artifact_id, version, group_id, TYPE_JAR)))
}

/// Applies the naming conventions of the OpenMRS repositories: reference application ids are
///  mapped to the artifact actually published for that major version, and modules get their
///  `-omod` suffix.
pub fn normalize_artifact(artifact: Artifact) -> Artifact {
    let mut artifact = artifact;

    if artifact.group_id == GROUP_DISTRO || artifact.group_id == GROUP_OPENMRS {
        if artifact.artifact_id == "referenceapplication" || artifact.artifact_id == REFAPP_3X_ARTIFACT_ID {
            let version = Version::parse(&artifact.version);
            let (group_id, artifact_id, artifact_type) = if version.major() <= 2 {
                (REFAPP_2X_GROUP_ID, REFAPP_2X_ARTIFACT_ID, REFAPP_2X_TYPE)
            }
            else if version.major() == 3 && (version.is_alpha() || version.is_beta() || version.is_snapshot()) {
                (REFAPP_2X_GROUP_ID, REFAPP_DISTRO, TYPE_ZIP)
            }
            else {
                (REFAPP_3X_GROUP_ID, REFAPP_3X_ARTIFACT_ID, REFAPP_3X_TYPE)
            };
            artifact.group_id = group_id.to_string();
            artifact.artifact_id = artifact_id.to_string();
            artifact.artifact_type = Some(artifact_type.to_string());
        }
    }

    if artifact.group_id == GROUP_MODULE && !artifact.artifact_id.ends_with("-omod") {
        artifact.artifact_id.push_str("-omod");
        artifact.artifact_type = Some(TYPE_JAR.to_string());
    }

    artifact
}

#[cfg(test)]
mod test {
    use rstest::*;
    use super::*;

    #[rstest]
    #[case::release("appui-1.2.omod", Some("1.2"))]
    #[case::snapshot("appui-1.3-SNAPSHOT.omod", Some("1.3-SNAPSHOT"))]
    #[case::dashed_name("webservices.rest-omod-2.1.0.jar", Some("2.1.0"))]
    #[case::dashed_name_snapshot("webservices.rest-omod-2.1.0-SNAPSHOT.jar", Some("2.1.0-SNAPSHOT"))]
    #[case::war("openmrs-2.0.1.war", Some("2.0.1"))]
    #[case::no_extension("appui-1_2", None)]
    #[case::snapshot_without_name("SNAPSHOT.jar", None)]
    fn test_version_from_file_name(#[case] file_name: &str, #[case] expected: Option<&str>) {
        let actual = version_from_file_name(file_name);
        match expected {
            Some(expected) => assert_eq!(actual.unwrap(), expected),
            None => assert!(actual.is_err()),
        }
    }

    #[rstest]
    #[case::two_parts("referenceapplication:2.3.1", REFAPP_2X_GROUP_ID, REFAPP_2X_ARTIFACT_ID, "2.3.1")]
    #[case::three_parts("org.openmrs.distromock:refapp:2.3", "org.openmrs.distromock", "refapp", "2.3")]
    #[case::refapp_3("referenceapplication:3.0.0", REFAPP_3X_GROUP_ID, REFAPP_3X_ARTIFACT_ID, "3.0.0")]
    #[case::refapp_3_snapshot("referenceapplication:3.0.0-SNAPSHOT", REFAPP_2X_GROUP_ID, REFAPP_DISTRO, "3.0.0-SNAPSHOT")]
    #[case::module("org.openmrs.module:appui:1.2", GROUP_MODULE, "appui-omod", "1.2")]
    fn test_parse_distro_artifact(#[case] distro: &str, #[case] group_id: &str, #[case] artifact_id: &str, #[case] version: &str) {
        let artifact = parse_distro_artifact(distro).unwrap();
        assert_eq!(artifact.group_id, group_id);
        assert_eq!(artifact.artifact_id, artifact_id);
        assert_eq!(artifact.version, version);
    }

    #[rstest]
    #[case::too_many_parts("a:b:c:d")]
    #[case::single_part("referenceapplication")]
    fn test_parse_distro_artifact_invalid(#[case] distro: &str) {
        assert!(matches!(parse_distro_artifact(distro), Err(SdkError::Configuration(_))));
    }

    #[test]
    fn test_repository_path() {
        let artifact = Artifact::with_type("appui-omod", "1.2", GROUP_MODULE, TYPE_JAR);
        assert_eq!(repository_path(&artifact), PathBuf::from("org/openmrs/module/appui-omod/1.2/appui-omod-1.2.jar"));

        let mut artifact = Artifact::with_type(WEBAPP_ARTIFACT_ID, "2.6.0", GROUP_WEB, TYPE_WAR);
        artifact.classifier = Some("h2".to_string());
        assert_eq!(repository_path(&artifact), PathBuf::from("org/openmrs/web/openmrs-webapp/2.6.0/openmrs-webapp-2.6.0-h2.war"));
    }
}
