use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::error::{Result, SdkError};
use crate::maven::coordinates::Artifact;
use crate::maven::paths::repository_path;
use crate::upgrade::server_upgrader::ModuleDeployer;
use crate::util::atomic_file::write_atomically;

/// Deploys artifacts by copying them from a local Maven repository (e.g. `~/.m2/repository`)
///  that already contains them.
pub struct LocalRepositoryDeployer {
    repository_root: PathBuf,
}

impl LocalRepositoryDeployer {
    pub fn new(repository_root: impl Into<PathBuf>) -> LocalRepositoryDeployer {
        LocalRepositoryDeployer {
            repository_root: repository_root.into(),
        }
    }

    fn source_path(&self, artifact: &Artifact) -> PathBuf {
        self.repository_root.join(repository_path(artifact))
    }
}

impl ModuleDeployer for LocalRepositoryDeployer {
    fn install(&mut self, artifact: &Artifact, target_dir: &Path) -> Result<()> {
        let source = self.source_path(artifact);
        let target = target_dir.join(artifact.dest_file_name());
        trace!("copying {} to {}", source.display(), target.display());

        let data = fs::read(&source)
            .map_err(|e| SdkError::io(&source, e))?;
        fs::create_dir_all(target_dir)
            .map_err(|e| SdkError::io(target_dir, e))?;
        write_atomically(&target, &data)?;

        debug!("installed {} as {}", artifact, target.display());
        Ok(())
    }

    fn remove(&mut self, file_name: &str, target_dir: &Path) -> Result<bool> {
        let path = target_dir.join(file_name);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("removed {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(SdkError::io(path, e)),
        }
    }
}
