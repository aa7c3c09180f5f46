use serde::Serialize;

use crate::maven::coordinates::Artifact;

/// The transition between two artifact compositions.
///
/// Every artifact identity (group and artifact id) occurs in at most one of the four
///  categories; the insertion methods remove an identity from the other categories before
///  recording it. The platform webapp is never part of the categories but tracked separately.
#[derive(Clone, Debug, Default, Serialize)]
pub struct UpgradeDifferential {
    modules_to_add: Vec<Artifact>,
    modules_to_delete: Vec<Artifact>,
    /// (old, new), unique by the identity of the old artifact
    update_old_to_new: Vec<(Artifact, Artifact)>,
    /// (new, old), unique by the identity of the new artifact
    downgrade_new_to_old: Vec<(Artifact, Artifact)>,
    platform_artifact: Option<Artifact>,
    platform_upgraded: bool,
}

impl UpgradeDifferential {
    pub fn new() -> UpgradeDifferential {
        Default::default()
    }

    pub fn modules_to_add(&self) -> &[Artifact] {
        &self.modules_to_add
    }

    pub fn modules_to_delete(&self) -> &[Artifact] {
        &self.modules_to_delete
    }

    pub fn update_old_to_new(&self) -> &[(Artifact, Artifact)] {
        &self.update_old_to_new
    }

    pub fn downgrade_new_to_old(&self) -> &[(Artifact, Artifact)] {
        &self.downgrade_new_to_old
    }

    pub fn platform_artifact(&self) -> Option<&Artifact> {
        self.platform_artifact.as_ref()
    }

    /// only meaningful if there is a platform artifact: `false` means the platform is downgraded
    pub fn is_platform_upgraded(&self) -> bool {
        self.platform_upgraded
    }

    /// the artifact replacing `old` in an update, if any
    pub fn update_for(&self, old: &Artifact) -> Option<&Artifact> {
        self.update_old_to_new.iter()
            .find(|(o, _)| o.is_same_artifact(old))
            .map(|(_, n)| n)
    }

    /// the artifact that is replaced by the downgrade to `new`, if any
    pub fn downgrade_for(&self, new: &Artifact) -> Option<&Artifact> {
        self.downgrade_new_to_old.iter()
            .find(|(n, _)| n.is_same_artifact(new))
            .map(|(_, o)| o)
    }

    pub fn add_module_to_add(&mut self, artifact: Artifact) {
        self.remove_artifact(&artifact);
        self.modules_to_add.push(artifact);
    }

    pub fn add_module_to_delete(&mut self, artifact: Artifact) {
        self.remove_artifact(&artifact);
        self.modules_to_delete.push(artifact);
    }

    pub fn put_update_entry(&mut self, old: Artifact, new: Artifact) {
        self.remove_artifact(&old);
        self.update_old_to_new.push((old, new));
    }

    pub fn put_downgrade_entry(&mut self, new: Artifact, old: Artifact) {
        self.remove_artifact(&new);
        self.downgrade_new_to_old.push((new, old));
    }

    pub fn set_platform_artifact(&mut self, artifact: Artifact, upgraded: bool) {
        self.platform_artifact = Some(artifact);
        self.platform_upgraded = upgraded;
    }

    /// Removes an identity from all four categories. Returns `true` if it was in one of them.
    pub fn remove_artifact(&mut self, artifact: &Artifact) -> bool {
        let before = self.len();
        self.modules_to_add.retain(|a| !a.is_same_artifact(artifact));
        self.modules_to_delete.retain(|a| !a.is_same_artifact(artifact));
        self.update_old_to_new.retain(|(old, _)| !old.is_same_artifact(artifact));
        self.downgrade_new_to_old.retain(|(new, _)| !new.is_same_artifact(artifact));
        self.len() != before
    }

    fn len(&self) -> usize {
        self.modules_to_add.len()
            + self.modules_to_delete.len()
            + self.update_old_to_new.len()
            + self.downgrade_new_to_old.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0 && self.platform_artifact.is_none()
    }
}
