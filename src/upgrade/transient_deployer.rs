use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::error::Result;
use crate::maven::coordinates::Artifact;
use crate::upgrade::server_upgrader::ModuleDeployer;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeployOperation {
    Installed { artifact: Artifact, target_dir: PathBuf },
    Removed { file_name: String, target_dir: PathBuf },
}

/// Deploys nothing, but records what it was asked to do and which files would be present
///  afterwards. For tests and dry runs.
#[derive(Default)]
pub struct TransientModuleDeployer {
    operations: Vec<DeployOperation>,
    files: BTreeSet<PathBuf>,
}

impl TransientModuleDeployer {
    pub fn new() -> TransientModuleDeployer {
        Default::default()
    }

    /// a deployer that pretends the given files are already present
    pub fn with_files(files: impl IntoIterator<Item = PathBuf>) -> TransientModuleDeployer {
        TransientModuleDeployer {
            operations: Vec::new(),
            files: files.into_iter().collect(),
        }
    }

    pub fn operations(&self) -> &[DeployOperation] {
        &self.operations
    }

    pub fn installed(&self) -> Vec<&Artifact> {
        self.operations.iter()
            .filter_map(|op| match op {
                DeployOperation::Installed { artifact, .. } => Some(artifact),
                DeployOperation::Removed { .. } => None,
            })
            .collect()
    }

    pub fn has_file(&self, path: &Path) -> bool {
        self.files.contains(path)
    }
}

impl ModuleDeployer for TransientModuleDeployer {
    fn install(&mut self, artifact: &Artifact, target_dir: &Path) -> Result<()> {
        trace!("installing {} into {}", artifact, target_dir.display());
        self.files.insert(target_dir.join(artifact.dest_file_name()));
        self.operations.push(DeployOperation::Installed {
            artifact: artifact.clone(),
            target_dir: target_dir.to_path_buf(),
        });
        Ok(())
    }

    fn remove(&mut self, file_name: &str, target_dir: &Path) -> Result<bool> {
        trace!("removing {} from {}", file_name, target_dir.display());
        self.operations.push(DeployOperation::Removed {
            file_name: file_name.to_string(),
            target_dir: target_dir.to_path_buf(),
        });
        Ok(self.files.remove(&target_dir.join(file_name)))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_tracks_files() {
        let modules = PathBuf::from("/srv/server1/modules");
        let mut deployer = TransientModuleDeployer::with_files(vec![modules.join("appui-1.2.omod")]);

        assert!(deployer.remove("appui-1.2.omod", &modules).unwrap());
        assert!(!deployer.remove("appui-1.2.omod", &modules).unwrap());

        deployer.install(&Artifact::new("appui-omod", "1.3"), &modules).unwrap();
        assert!(deployer.has_file(&modules.join("appui-1.3.omod")));
        assert_eq!(deployer.operations().len(), 3);
        assert_eq!(deployer.installed(), vec![&Artifact::new("appui-omod", "1.3")]);
    }
}
