use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{Result, SdkError};
use crate::maven::coordinates::*;
use crate::properties::distro::{DistroProperties, DISTRO_FILE_NAME};
use crate::properties::keys::*;
use crate::properties::property_set::PropertySet;
use crate::properties::sdk_properties::SdkProperties;

pub const SERVER_PROPERTIES_FILE: &str = "openmrs-server.properties";
pub const BACKUP_PROPERTIES_FILE: &str = "backup.properties";
pub const MODULES_DIR: &str = "modules";

pub const PROPERTY_SERVER_ID: &str = "server.id";
pub const PROPERTY_DB_DRIVER: &str = "connection.driver_class";
pub const PROPERTY_DB_USER: &str = "connection.username";
pub const PROPERTY_DB_PASS: &str = "connection.password";
pub const PROPERTY_DB_URI: &str = "connection.url";
pub const PROPERTY_DB_NAME: &str = "database_name";
pub const PROPERTY_DOCKER_CONTAINER: &str = "db.docker.container";
pub const PROPERTY_VERSION: &str = "openmrs.version";
pub const PROPERTY_PLATFORM: &str = "openmrs.platform.version";
pub const PROPERTY_JAVA_HOME: &str = "javaHome";
pub const PROPERTY_USER_MODULES: &str = "user_modules";
pub const PROPERTY_DEMO_DATA: &str = "add_demo_data";
pub const PROPERTY_DEBUG_PORT: &str = "debug.port";
pub const PROPERTY_SERVER_PORT: &str = "server.port";

const DB_NAME_PLACEHOLDER: &str = "@DBNAME@";
const CUSTOM_PROPERTY_PREFIX: &str = "property.";

/// Initial settings for a new server. Everything left at `None` is simply not written.
#[derive(Clone, Debug, Default)]
pub struct ServerConfig {
    pub server_id: Option<String>,
    pub java_home: Option<String>,
    pub distro_artifact_id: Option<String>,
    pub distro_group_id: Option<String>,
    pub version: Option<String>,
    pub platform_version: Option<String>,
    pub db_driver: Option<String>,
    pub db_name: Option<String>,
    pub db_uri: Option<String>,
    pub db_user: Option<String>,
    pub db_password: Option<String>,
    pub include_demo_data: Option<bool>,
    pub container_id: Option<String>,
    pub debug_port: Option<String>,
}

impl ServerConfig {
    pub fn server_id(mut self, server_id: impl Into<String>) -> ServerConfig {
        self.server_id = Some(server_id.into());
        self
    }

    pub fn java_home(mut self, java_home: impl Into<String>) -> ServerConfig {
        self.java_home = Some(java_home.into());
        self
    }

    pub fn distro_artifact_id(mut self, artifact_id: impl Into<String>) -> ServerConfig {
        self.distro_artifact_id = Some(artifact_id.into());
        self
    }

    pub fn distro_group_id(mut self, group_id: impl Into<String>) -> ServerConfig {
        self.distro_group_id = Some(group_id.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> ServerConfig {
        self.version = Some(version.into());
        self
    }

    pub fn platform_version(mut self, platform_version: impl Into<String>) -> ServerConfig {
        self.platform_version = Some(platform_version.into());
        self
    }

    pub fn db_driver(mut self, driver: impl Into<String>) -> ServerConfig {
        self.db_driver = Some(driver.into());
        self
    }

    pub fn db_name(mut self, name: impl Into<String>) -> ServerConfig {
        self.db_name = Some(name.into());
        self
    }

    pub fn db_uri(mut self, uri: impl Into<String>) -> ServerConfig {
        self.db_uri = Some(uri.into());
        self
    }

    pub fn db_user(mut self, user: impl Into<String>) -> ServerConfig {
        self.db_user = Some(user.into());
        self
    }

    pub fn db_password(mut self, password: impl Into<String>) -> ServerConfig {
        self.db_password = Some(password.into());
        self
    }

    pub fn include_demo_data(mut self, include: bool) -> ServerConfig {
        self.include_demo_data = Some(include);
        self
    }

    pub fn container_id(mut self, container_id: impl Into<String>) -> ServerConfig {
        self.container_id = Some(container_id.into());
        self
    }

    pub fn debug_port(mut self, port: impl Into<String>) -> ServerConfig {
        self.debug_port = Some(port.into());
        self
    }

    pub fn build(self) -> Server {
        let mut properties = PropertySet::new();
        let entries = [
            (PROPERTY_SERVER_ID, self.server_id),
            (PROPERTY_JAVA_HOME, self.java_home),
            (PROPERTY_DISTRO_ARTIFACT_ID, self.distro_artifact_id),
            (PROPERTY_DISTRO_GROUP_ID, self.distro_group_id),
            (VERSION, self.version),
            (PLATFORM_VERSION_KEY, self.platform_version),
            (PROPERTY_DB_DRIVER, self.db_driver),
            (PROPERTY_DB_NAME, self.db_name),
            (PROPERTY_DB_URI, self.db_uri),
            (PROPERTY_DB_USER, self.db_user),
            (PROPERTY_DB_PASS, self.db_password),
            (PROPERTY_DEMO_DATA, self.include_demo_data.map(|b| b.to_string())),
            (PROPERTY_DOCKER_CONTAINER, self.container_id),
            (PROPERTY_DEBUG_PORT, self.debug_port),
        ];
        for (key, value) in entries {
            if let Some(value) = value {
                properties.set(key, value);
            }
        }
        Server::from_properties(None, properties)
    }
}

/// An installed server: its directory and the contents of its `openmrs-server.properties`.
#[derive(Clone, Debug)]
pub struct Server {
    properties: PropertySet,
    server_directory: Option<PathBuf>,
}

impl SdkProperties for Server {
    fn properties(&self) -> &PropertySet {
        &self.properties
    }

    fn properties_mut(&mut self) -> &mut PropertySet {
        &mut self.properties
    }
}

impl Server {
    pub fn from_properties(server_directory: Option<PathBuf>, properties: PropertySet) -> Server {
        Server { properties, server_directory }
    }

    /// a server without any properties, to be persisted in `dir`
    pub fn create(dir: &Path) -> Server {
        Server::from_properties(Some(dir.to_path_buf()), PropertySet::new())
    }

    pub fn has_server_config(dir: &Path) -> bool {
        dir.join(SERVER_PROPERTIES_FILE).is_file()
    }

    pub fn load(dir: &Path) -> Result<Server> {
        if !Server::has_server_config(dir) {
            return Err(SdkError::config(format!("{} properties file is missing in {}", SERVER_PROPERTIES_FILE, dir.display())));
        }
        let properties = PropertySet::load(&dir.join(SERVER_PROPERTIES_FILE))?;
        Ok(Server::from_properties(Some(dir.to_path_buf()), properties))
    }

    pub fn server_directory(&self) -> Option<&Path> {
        self.server_directory.as_deref()
    }

    pub fn set_server_directory(&mut self, dir: &Path) {
        self.server_directory = Some(dir.to_path_buf());
    }

    pub fn properties_file(&self) -> Option<PathBuf> {
        self.server_directory().map(|d| d.join(SERVER_PROPERTIES_FILE))
    }

    pub fn distro_properties_file(&self) -> Option<PathBuf> {
        self.server_directory().map(|d| d.join(DISTRO_FILE_NAME))
    }

    pub fn modules_directory(&self) -> Option<PathBuf> {
        self.server_directory().map(|d| d.join(MODULES_DIR))
    }

    fn require_directory(&self) -> Result<&Path> {
        self.server_directory()
            .ok_or_else(|| SdkError::InvariantViolation("server has no directory".to_string()))
    }

    pub fn save(&mut self) -> Result<()> {
        let path = self.require_directory()?.join(SERVER_PROPERTIES_FILE);
        self.save_to(&path)
    }

    /// Writes all properties to `path`. `@DBNAME@` in the connection url is replaced with the
    ///  database name first.
    pub fn save_to(&mut self, path: &Path) -> Result<()> {
        self.replace_db_name_in_db_uri();
        self.properties.save(path)?;
        debug!("saved server {:?} to {}", self.server_id(), path.display());
        Ok(())
    }

    /// Keeps a copy of the current properties so the server can be restored if an upgrade fails
    pub fn save_backup_properties(&mut self) -> Result<()> {
        let path = self.require_directory()?.join(BACKUP_PROPERTIES_FILE);
        self.save_to(&path)
    }

    pub fn delete_backup_properties(&self) -> Result<()> {
        let path = self.require_directory()?.join(BACKUP_PROPERTIES_FILE);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SdkError::io(path, e)),
        }
    }

    /// the distro definition stored next to the server properties
    pub fn distro_properties(&self) -> Result<DistroProperties> {
        let path = self.require_directory()?.join(DISTRO_FILE_NAME);
        DistroProperties::load(&path)
    }

    /// Mirrors this server's artifacts into its stored distro definition and saves both.
    pub fn save_and_synchronize_distro(&mut self) -> Result<()> {
        let mut distro = self.distro_properties()?;
        self.synchronize(&mut distro);
        distro.save_to(self.require_directory()?)?;
        self.save()
    }

    fn replace_db_name_in_db_uri(&mut self) {
        let replaced = match (self.db_uri(), self.db_name()) {
            (Some(uri), Some(db_name)) if uri.contains(DB_NAME_PLACEHOLDER) => uri.replace(DB_NAME_PLACEHOLDER, db_name),
            (Some(uri), None) if uri.contains(DB_NAME_PLACEHOLDER) => {
                warn!("connection url {} refers to {} but no database name is set", uri, DB_NAME_PLACEHOLDER);
                return;
            }
            _ => return,
        };
        self.properties.set(PROPERTY_DB_URI, replaced);
    }

    /// Fills in the settings a new server needs, leaving everything that was explicitly
    ///  configured untouched.
    pub fn set_unspecified_to_default(&mut self) {
        if self.db_driver().is_some() {
            self.set_if_unspecified(PROPERTY_DB_URI, "jdbc:h2:@APPLICATIONDATADIR@/database/@DBNAME@;AUTO_RECONNECT=TRUE;DB_CLOSE_DELAY=-1");
            self.set_if_unspecified(PROPERTY_DB_DRIVER, "org.h2.Driver");
            self.set_if_unspecified(PROPERTY_DB_USER, "sa");
            self.set_if_unspecified(PROPERTY_DB_PASS, "sa");
            self.set_if_unspecified(PROPERTY_DB_NAME, "openmrs");
            self.set_if_unspecified("has_current_openmrs_database", "true");
            self.set_if_unspecified("create_database_user", "false");
            self.set_if_unspecified("create_tables", "true");
            self.set_if_unspecified(PROPERTY_DEMO_DATA, "false");
            self.set_if_unspecified("auto_update_database", "false");
        }
        self.set_if_unspecified("module_web_admin", "true");
        self.set_if_unspecified("install_method", "auto");
        self.set_if_unspecified("admin_user_password", "Admin123");
        self.set_if_unspecified(VERSION, "");
    }

    fn set_if_unspecified(&mut self, key: &str, value: &str) {
        if !self.properties.contains(key) {
            self.properties.set(key, value);
        }
    }

    pub fn set_param(&mut self, key: &str, value: &str) {
        self.properties.set(key, value);
    }

    pub fn remove_param(&mut self, key: &str) -> Option<String> {
        self.properties.remove(key)
    }

    /// the modules explicitly installed by the user, from `user_modules`
    pub fn get_user_modules(&self) -> Result<Vec<Artifact>> {
        match self.get_param(PROPERTY_USER_MODULES) {
            None => Ok(Vec::new()),
            Some(value) => parse_user_modules(value),
        }
    }

    pub fn set_user_modules(&mut self, artifacts: &[Artifact]) {
        self.properties.remove(PROPERTY_USER_MODULES);
        for artifact in artifacts {
            self.save_user_module(artifact);
        }
    }

    /// Appends a module to `user_modules`. An entry that is already there verbatim is not
    ///  added twice.
    pub fn save_user_module(&mut self, artifact: &Artifact) {
        self.add_to_value_list(PROPERTY_USER_MODULES, &encode_user_module(artifact));
    }

    /// Removes the user module with the same identity. Returns `false` if there was none.
    pub fn remove_user_module(&mut self, artifact: &Artifact) -> Result<bool> {
        let mut user_modules = self.get_user_modules()?;
        let before = user_modules.len();
        user_modules.retain(|m| !m.is_same_artifact(artifact));
        if user_modules.len() == before {
            return Ok(false);
        }
        self.set_user_modules(&user_modules);
        Ok(true)
    }

    /// Adds `value` to the comma separated list stored under `key` unless it is already there.
    pub fn add_to_value_list(&mut self, key: &str, value: &str) {
        let new_value = match self.get_param(key) {
            Some(existing) if !existing.trim().is_empty() => {
                if existing.split(',').any(|v| v == value) {
                    return;
                }
                format!("{},{}", existing, value)
            }
            _ => value.to_string(),
        };
        self.properties.set(key, new_value);
    }

    /// Removes the first `group/artifact/version` entry with the given artifact id from the list
    ///  stored under `key`. The key is removed altogether when the list becomes empty.
    pub fn remove_from_value_list(&mut self, key: &str, artifact_id: &str) {
        let Some(existing) = self.get_param(key) else {
            return;
        };
        let mut values: Vec<&str> = existing.split(',').collect();
        if let Some(idx) = values.iter().position(|v| v.split('/').nth(1) == Some(artifact_id)) {
            values.remove(idx);
        }

        if values.is_empty() {
            self.properties.remove(key);
        }
        else {
            let new_value = values.join(",");
            self.properties.set(key, new_value);
        }
    }

    /// all artifacts that make up the server: its modules and its web applications
    pub fn get_server_modules(&self) -> Vec<Artifact> {
        let mut result = self.get_module_artifacts();
        result.extend(self.get_war_artifacts());
        result
    }

    /// Takes over the artifact composition, name and version of a distro.
    pub fn set_values_from_distro(&mut self, distro: &DistroProperties) {
        for (key, value) in distro.properties().iter() {
            if is_sdk_key(key) {
                self.properties.set(key, value);
            }
        }
        self.set_name(distro.name());
        if let Some(version) = distro.version() {
            self.set_version(version);
        }
        info!("server {:?} now follows distro {}", self.server_id(), distro.name());
    }

    /// `property.*` entries with the prefix removed
    pub fn custom_properties(&self) -> BTreeMap<String, String> {
        self.properties_with_prefix_removed(CUSTOM_PROPERTY_PREFIX)
    }

    pub fn set_custom_property(&mut self, name: &str, value: &str) {
        self.properties.set(format!("{}{}", CUSTOM_PROPERTY_PREFIX, name), value);
    }

    pub fn server_id(&self) -> Option<&str> {
        self.get_param(PROPERTY_SERVER_ID)
    }

    pub fn set_server_id(&mut self, server_id: &str) {
        self.set_param(PROPERTY_SERVER_ID, server_id);
    }

    /// the platform version as recorded by older versions of the tooling
    pub fn openmrs_core_version(&self) -> Option<&str> {
        self.get_param(PROPERTY_PLATFORM)
    }

    pub fn openmrs_version(&self) -> Option<&str> {
        self.get_param(PROPERTY_VERSION)
    }

    pub fn db_driver(&self) -> Option<&str> {
        self.get_param(PROPERTY_DB_DRIVER)
    }

    pub fn set_db_driver(&mut self, driver: &str) {
        self.set_param(PROPERTY_DB_DRIVER, driver);
    }

    pub fn db_uri(&self) -> Option<&str> {
        self.get_param(PROPERTY_DB_URI)
    }

    pub fn set_db_uri(&mut self, uri: &str) {
        self.set_param(PROPERTY_DB_URI, uri);
    }

    pub fn db_user(&self) -> Option<&str> {
        self.get_param(PROPERTY_DB_USER)
    }

    pub fn set_db_user(&mut self, user: &str) {
        self.set_param(PROPERTY_DB_USER, user);
    }

    pub fn db_password(&self) -> Option<&str> {
        self.get_param(PROPERTY_DB_PASS)
    }

    pub fn set_db_password(&mut self, password: &str) {
        self.set_param(PROPERTY_DB_PASS, password);
    }

    pub fn db_name(&self) -> Option<&str> {
        self.get_param(PROPERTY_DB_NAME)
    }

    pub fn set_db_name(&mut self, name: &str) {
        self.set_param(PROPERTY_DB_NAME, name);
    }

    pub fn is_mysql_db(&self) -> bool {
        self.db_uri().map(|u| u.starts_with("jdbc:mysql")).unwrap_or(false)
            || matches!(self.db_driver(), Some("com.mysql.jdbc.Driver") | Some("com.mysql.cj.jdbc.Driver"))
    }

    pub fn is_postgresql_db(&self) -> bool {
        self.db_uri().map(|u| u.starts_with("jdbc:postgresql")).unwrap_or(false)
            || self.db_driver() == Some("org.postgresql.Driver")
    }

    pub fn java_home(&self) -> Option<&str> {
        self.get_param(PROPERTY_JAVA_HOME)
    }

    pub fn set_java_home(&mut self, java_home: &str) {
        self.set_param(PROPERTY_JAVA_HOME, java_home);
    }

    pub fn debug_port(&self) -> Option<&str> {
        self.get_param(PROPERTY_DEBUG_PORT)
    }

    pub fn set_debug_port(&mut self, port: &str) {
        self.set_param(PROPERTY_DEBUG_PORT, port);
    }

    pub fn port(&self) -> Option<&str> {
        self.get_param(PROPERTY_SERVER_PORT)
    }

    pub fn set_port(&mut self, port: &str) {
        self.set_param(PROPERTY_SERVER_PORT, port);
    }

    pub fn container_id(&self) -> Option<&str> {
        self.get_param(PROPERTY_DOCKER_CONTAINER)
    }

    pub fn is_include_demo_data(&self) -> bool {
        self.get_param(PROPERTY_DEMO_DATA)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    pub fn set_include_demo_data(&mut self, include: bool) {
        self.set_param(PROPERTY_DEMO_DATA, &include.to_string());
    }

    pub fn distro_artifact_id(&self) -> Option<&str> {
        self.get_param(PROPERTY_DISTRO_ARTIFACT_ID)
    }

    pub fn set_distro_artifact_id(&mut self, artifact_id: &str) {
        self.set_param(PROPERTY_DISTRO_ARTIFACT_ID, artifact_id);
    }

    pub fn distro_group_id(&self) -> Option<&str> {
        self.get_param(PROPERTY_DISTRO_GROUP_ID)
    }

    pub fn set_distro_group_id(&mut self, group_id: &str) {
        self.set_param(PROPERTY_DISTRO_GROUP_ID, group_id);
    }

    /// the file name under which the platform webapp is deployed in the server directory
    pub fn war_file_name(&self) -> Option<String> {
        self.platform_version().map(|v| format!("openmrs-{}.war", v))
    }
}

/// Decodes a `user_modules` value: `groupId/artifactId/version` entries separated by commas.
///  Empty entries are skipped, any other entry without exactly three fields fails the whole
///  list. Artifact ids get their `-omod` suffix back.
pub fn parse_user_modules(value: &str) -> Result<Vec<Artifact>> {
    let mut result = Vec::new();
    for entry in value.split(',') {
        if entry.is_empty() {
            continue;
        }
        let fields: Vec<&str> = entry.split('/').collect();
        let [group_id, artifact_id, version] = fields.as_slice() else {
            return Err(SdkError::config(format!("cannot read user modules list, invalid entry {:?}", entry)));
        };

        let mut artifact_id = artifact_id.to_string();
        if !artifact_id.ends_with("-omod") {
            artifact_id.push_str("-omod");
        }
        result.push(Artifact::with_group(artifact_id, *version, *group_id));
    }
    Ok(result)
}

/// `groupId/artifactId/version` with the `-omod` suffix removed from the artifact id
pub fn encode_user_module(artifact: &Artifact) -> String {
    let artifact_id = artifact.artifact_id.strip_suffix("-omod").unwrap_or(&artifact.artifact_id);
    format!("{}/{}/{}", artifact.group_id, artifact_id, artifact.version)
}
