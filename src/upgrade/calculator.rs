use std::cmp::Ordering;

use tracing::{debug, trace};

use crate::error::{Result, SdkError};
use crate::maven::coordinates::Artifact;
use crate::maven::version::Version;
use crate::properties::distro::DistroProperties;
use crate::properties::sdk_properties::SdkProperties;
use crate::properties::server::Server;
use crate::upgrade::differential::UpgradeDifferential;

/// Computes what has to change to go from the artifacts in `old` to those in `new`.
///
/// Artifacts are matched by identity (group and artifact id). If `old` contains an identity
///  more than once, the first occurrence is used. The platform webapp is reported through
///  [UpgradeDifferential::platform_artifact] only, and it is an error for `new` to drop it.
pub fn calculate_update_differential(old: &[Artifact], new: &[Artifact]) -> Result<UpgradeDifferential> {
    let mut result = UpgradeDifferential::new();

    for new_artifact in new {
        let Some(old_artifact) = old.iter().find(|o| o.is_same_artifact(new_artifact)) else {
            if new_artifact.is_platform() {
                trace!("platform {} introduced", new_artifact);
                result.set_platform_artifact(new_artifact.clone(), true);
            }
            else {
                trace!("adding {}", new_artifact);
                result.add_module_to_add(new_artifact.clone());
            }
            continue;
        };

        match compare_versions(old_artifact, new_artifact) {
            Transition::Upgrade => {
                trace!("updating {} to {}", old_artifact, new_artifact.version);
                if new_artifact.is_platform() {
                    result.set_platform_artifact(new_artifact.clone(), true);
                }
                else {
                    result.put_update_entry(old_artifact.clone(), new_artifact.clone());
                }
            }
            Transition::Downgrade => {
                trace!("downgrading {} to {}", old_artifact, new_artifact.version);
                if new_artifact.is_platform() {
                    result.set_platform_artifact(new_artifact.clone(), false);
                }
                else {
                    result.put_downgrade_entry(new_artifact.clone(), old_artifact.clone());
                }
            }
            Transition::Unchanged => {}
        }
    }

    for old_artifact in old {
        if new.iter().any(|n| n.is_same_artifact(old_artifact)) {
            continue;
        }
        if old_artifact.is_platform() {
            return Err(SdkError::InvariantViolation(format!("only modules can be deleted, not the platform {}", old_artifact)));
        }
        trace!("deleting {}", old_artifact);
        result.add_module_to_delete(old_artifact.clone());
    }

    debug!(
        add = result.modules_to_add().len(),
        delete = result.modules_to_delete().len(),
        update = result.update_old_to_new().len(),
        downgrade = result.downgrade_new_to_old().len(),
        platform = ?result.platform_artifact().map(|a| a.version.as_str()),
        "calculated upgrade differential"
    );
    Ok(result)
}

enum Transition {
    Upgrade,
    Downgrade,
    Unchanged,
}

/// Equal snapshot versions count as an upgrade: the snapshot may have been republished.
fn compare_versions(old: &Artifact, new: &Artifact) -> Transition {
    let old_version = Version::parse(&old.version);
    let new_version = Version::parse(&new.version);
    match new_version.cmp(&old_version) {
        Ordering::Greater => Transition::Upgrade,
        Ordering::Less => Transition::Downgrade,
        Ordering::Equal if old_version.is_snapshot() && new_version.is_snapshot() => Transition::Upgrade,
        Ordering::Equal => Transition::Unchanged,
    }
}

/// The differential for moving `server` to the composition declared by `distro`: the server's
///  modules and wars against the distro's wars and modules.
pub fn calculate_server_differential(server: &Server, distro: &DistroProperties) -> Result<UpgradeDifferential> {
    let mut new = distro.get_war_artifacts();
    new.extend(distro.get_module_artifacts());
    calculate_update_differential(&server.get_server_modules(), &new)
}

/// `base` with every artifact of `updates` applied: artifacts not in `base` are appended,
///  artifacts with a different version replace their counterpart (which moves to the end).
pub fn merge_artifact_lists(base: &[Artifact], updates: &[Artifact]) -> Vec<Artifact> {
    let mut result = base.to_vec();
    for update in updates {
        match result.iter().position(|a| a.is_same_artifact(update)) {
            None => result.push(update.clone()),
            Some(idx) => {
                if !Version::parse(&result[idx].version).equal(&Version::parse(&update.version)) {
                    result.remove(idx);
                    result.push(update.clone());
                }
            }
        }
    }
    result
}
