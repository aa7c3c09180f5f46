use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::{Result, SdkError};
use crate::maven::coordinates::*;
use crate::maven::version::Version;
use crate::properties::distro::DistroProperties;
use crate::properties::keys::{deployable_kind, ArtifactKind};
use crate::properties::sdk_properties::SdkProperties;
use crate::properties::server::{Server, MODULES_DIR};
use crate::upgrade::calculator::calculate_server_differential;
use crate::upgrade::differential::UpgradeDifferential;

pub use crate::properties::server::{encode_user_module, parse_user_modules};

/// Puts artifact files into and removes them from a server's directories. Fetching the files
///  is up to the implementation.
pub trait ModuleDeployer {
    fn install(&mut self, artifact: &Artifact, target_dir: &Path) -> Result<()>;

    /// `Ok(false)` if there was no such file
    fn remove(&mut self, file_name: &str, target_dir: &Path) -> Result<bool>;
}

/// Applies a differential to the artifact bookkeeping of `server`, in memory: the `omod.*` and
///  `war.*` keys, the platform version and `user_modules`. Only modules are user modules.
///  Nothing is saved.
pub fn apply_differential(server: &mut Server, diff: &UpgradeDifferential) -> Result<()> {
    let mut user_modules = server.get_user_modules()?;

    for added in diff.modules_to_add() {
        let kind = deployable_kind(added);
        server.set_artifact_properties(kind, added);
        if kind == ArtifactKind::Omod && !user_modules.iter().any(|m| m.is_same_artifact(added)) {
            user_modules.push(added.clone());
        }
    }

    let replacements = diff.update_old_to_new().iter()
        .map(|(old, new)| (old, new))
        .chain(diff.downgrade_new_to_old().iter().map(|(new, old)| (old, new)));
    for (old, new) in replacements {
        server.set_artifact_properties(deployable_kind(new), new);
        if let Some(entry) = user_modules.iter_mut().find(|m| m.is_same_artifact(old)) {
            entry.version = new.version.clone();
        }
    }

    for deleted in diff.modules_to_delete() {
        if !server.remove_artifact_properties(deployable_kind(deleted), deleted) {
            debug!("artifact {} to delete is not configured", deleted);
        }
        user_modules.retain(|m| !m.is_same_artifact(deleted));
    }

    if let Some(platform) = diff.platform_artifact() {
        server.set_platform_version(&platform.version);
    }

    server.set_user_modules(&user_modules);
    Ok(())
}

/// Moves `server` to the composition of `distro`: deploys the changed artifacts, updates and
///  saves the server properties and stores the distro definition next to them.
///
/// The previous server properties are kept as a backup until the upgrade has completed.
pub fn upgrade_to_distro(server: &mut Server, distro: &DistroProperties, deployer: &mut dyn ModuleDeployer) -> Result<UpgradeDifferential> {
    let diff = calculate_server_differential(server, distro)?;
    let server_dir = server.server_directory()
        .map(|d| d.to_path_buf())
        .ok_or_else(|| SdkError::InvariantViolation("cannot upgrade a server without a directory".to_string()))?;
    let modules_dir = server_dir.join(MODULES_DIR);

    server.save_backup_properties()?;

    if let Some(platform) = diff.platform_artifact() {
        replace_webapp(server, &server_dir, &platform.version, deployer)?;
    }
    for added in diff.modules_to_add() {
        deployer.install(added, target_directory(added, &server_dir, &modules_dir))?;
    }
    for (old, new) in diff.update_old_to_new() {
        deployer.remove(&old.dest_file_name(), target_directory(old, &server_dir, &modules_dir))?;
        deployer.install(new, target_directory(new, &server_dir, &modules_dir))?;
    }
    for (new, old) in diff.downgrade_new_to_old() {
        deployer.remove(&old.dest_file_name(), target_directory(old, &server_dir, &modules_dir))?;
        deployer.install(new, target_directory(new, &server_dir, &modules_dir))?;
    }
    for deleted in diff.modules_to_delete() {
        deployer.remove(&deleted.dest_file_name(), target_directory(deleted, &server_dir, &modules_dir))?;
    }

    apply_differential(server, &diff)?;
    server.set_name(distro.name());
    if let Some(version) = distro.version() {
        server.set_version(version);
    }
    server.save()?;
    distro.save_to(&server_dir)?;
    server.delete_backup_properties()?;

    info!("server {} upgraded to distro {} {}", server.server_id().unwrap_or_default(), distro.name(), distro.version().unwrap_or_default());
    Ok(diff)
}

/// Replaces the platform webapp of `server` with the given version and saves the server.
pub fn upgrade_platform(server: &mut Server, version: &str, deployer: &mut dyn ModuleDeployer) -> Result<()> {
    let server_dir = server.server_directory()
        .map(|d| d.to_path_buf())
        .ok_or_else(|| SdkError::InvariantViolation("cannot upgrade a server without a directory".to_string()))?;

    server.save_backup_properties()?;
    if let Some(current) = server.platform_version() {
        if Version::parse(current).higher(&Version::parse(version)) {
            warn!("downgrading platform from {} to {}; downgrades are generally not supported by OpenMRS", current, version);
        }
    }
    replace_webapp(server, &server_dir, version, deployer)?;
    server.delete_backup_properties()?;

    info!("server {} has been upgraded to platform {}", server.server_id().unwrap_or_default(), version);
    Ok(())
}

/// wars are deployed next to the platform webapp, everything else into the modules directory
fn target_directory<'a>(artifact: &Artifact, server_dir: &'a Path, modules_dir: &'a Path) -> &'a Path {
    match deployable_kind(artifact) {
        ArtifactKind::War => server_dir,
        _ => modules_dir,
    }
}

fn replace_webapp(server: &mut Server, server_dir: &Path, version: &str, deployer: &mut dyn ModuleDeployer) -> Result<()> {
    if let Some(old_war) = server.war_file_name() {
        deployer.remove(&old_war, server_dir)?;
    }
    let webapp = Artifact::with_type(WEBAPP_ARTIFACT_ID, version, GROUP_WEB, TYPE_WAR);
    deployer.install(&webapp, server_dir)?;
    server.set_platform_version(version);
    server.save()
}
