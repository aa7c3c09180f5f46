use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use openmrs_distro::properties::distro::bundled_versions;
use openmrs_distro::upgrade::calculator::calculate_server_differential;
use openmrs_distro::upgrade::fs_deployer::LocalRepositoryDeployer;
use openmrs_distro::upgrade::server_upgrader::{upgrade_platform, upgrade_to_distro};
use openmrs_distro::*;

/// Reconciles OpenMRS servers with distribution definitions
#[derive(Parser, Debug)]
#[command(name = "openmrs-distro")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log filter (trace, debug, info, warn, error), overrides RUST_LOG
    #[arg(short, long, env = "OPENMRS_DISTRO_LOG")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the changes needed to go from one distro to another as JSON
    Diff {
        /// distro properties file, or the version of a bundled distro
        old: String,
        /// distro properties file, or the version of a bundled distro
        new: String,
    },

    /// Move a server to the composition of a distro
    Upgrade {
        /// directory containing openmrs-server.properties
        #[arg(short, long)]
        server_dir: PathBuf,

        /// distro properties file, or the version of a bundled distro
        #[arg(short, long)]
        distro: String,

        /// local Maven repository the artifacts are copied from
        #[arg(short, long, env = "OPENMRS_MAVEN_REPOSITORY")]
        repository: PathBuf,

        /// only print the changes, deploy nothing
        #[arg(long)]
        dry_run: bool,
    },

    /// Replace the platform webapp of a server
    Platform {
        #[arg(short, long)]
        server_dir: PathBuf,

        /// the new platform version
        #[arg(short, long)]
        version: String,

        #[arg(short, long, env = "OPENMRS_MAVEN_REPOSITORY")]
        repository: PathBuf,
    },

    /// List the bundled distro versions
    Bundled,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    match cli.command {
        Commands::Diff { old, new } => {
            let old = DistroProperties::load_from(distro_source(&old))
                .with_context(|| format!("loading distro {}", old))?;
            let new = DistroProperties::load_from(distro_source(&new))
                .with_context(|| format!("loading distro {}", new))?;

            let diff = calculate_update_differential(&distro_artifacts(&old), &distro_artifacts(&new))?;
            println!("{}", serde_json::to_string_pretty(&diff)?);
        }
        Commands::Upgrade { server_dir, distro, repository, dry_run } => {
            let mut server = Server::load(&server_dir)?;
            let distro = DistroProperties::load_from(distro_source(&distro))
                .with_context(|| format!("loading distro {}", distro))?;

            let diff = if dry_run {
                calculate_server_differential(&server, &distro)?
            }
            else {
                let mut deployer = LocalRepositoryDeployer::new(repository);
                upgrade_to_distro(&mut server, &distro, &mut deployer)
                    .with_context(|| format!("upgrading server in {}", server_dir.display()))?
            };
            println!("{}", serde_json::to_string_pretty(&diff)?);
        }
        Commands::Platform { server_dir, version, repository } => {
            let mut server = Server::load(&server_dir)?;
            let mut deployer = LocalRepositoryDeployer::new(repository);
            upgrade_platform(&mut server, &version, &mut deployer)?;
            info!("platform of {} is now {}", server_dir.display(), version);
        }
        Commands::Bundled => {
            for version in bundled_versions() {
                println!("{}", version);
            }
        }
    }
    Ok(())
}

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// An existing file is read as distro properties, anything else names a bundled distro.
fn distro_source(arg: &str) -> DistroSource {
    let path = Path::new(arg);
    if path.is_file() {
        DistroSource::File(path.to_path_buf())
    }
    else {
        DistroSource::Bundled(arg.to_string())
    }
}

fn distro_artifacts(distro: &DistroProperties) -> Vec<Artifact> {
    let mut result = distro.get_war_artifacts();
    result.extend(distro.get_module_artifacts());
    result
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_diff() {
        let cli = Cli::parse_from(["openmrs-distro", "diff", "2.3.1", "2.4"]);
        match cli.command {
            Commands::Diff { old, new } => {
                assert_eq!(old, "2.3.1");
                assert_eq!(new, "2.4");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_upgrade() {
        let cli = Cli::parse_from([
            "openmrs-distro", "upgrade",
            "--server-dir", "/srv/server1",
            "--distro", "2.4",
            "--repository", "/home/me/.m2/repository",
            "--dry-run",
        ]);
        match cli.command {
            Commands::Upgrade { server_dir, distro, repository, dry_run } => {
                assert_eq!(server_dir, PathBuf::from("/srv/server1"));
                assert_eq!(distro, "2.4");
                assert_eq!(repository, PathBuf::from("/home/me/.m2/repository"));
                assert!(dry_run);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_distro_source() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("openmrs-distro.properties");
        std::fs::write(&file, "name=Test\n").unwrap();

        assert_eq!(distro_source(file.to_str().unwrap()), DistroSource::File(file.clone()));
        assert_eq!(distro_source("2.4"), DistroSource::Bundled("2.4".to_string()));
    }

    #[test]
    fn test_diff_of_bundled_distros() {
        let old = DistroProperties::load_bundled("2.3.1").unwrap();
        let new = DistroProperties::load_bundled("2.4").unwrap();

        let diff = calculate_update_differential(&distro_artifacts(&old), &distro_artifacts(&new)).unwrap();

        assert_eq!(diff.platform_artifact().map(|a| a.version.as_str()), Some("1.11.6"));
        assert!(diff.is_platform_upgraded());
    }
}
