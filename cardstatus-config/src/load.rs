use std::{
    borrow::Cow,
    fmt, io,
    path::{Path, PathBuf},
};

use config::builder::{ConfigBuilder, DefaultState};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::environment::Environment;

/// Optional file of `KEY=value` lines loaded into the process environment.
const DOTENV_FILE: &str = ".env";

/// Directory containing configuration files relative to the working directory.
const CONFIGURATION_DIR: &str = "configuration";

/// Supported extensions for base and environment configuration files.
const CONFIG_FILE_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Prefix for environment variable configuration overrides.
const ENV_PREFIX: &str = "APP";

/// Separator between environment variable prefix and key segments.
const ENV_PREFIX_SEPARATOR: &str = "_";

/// Separator for nested configuration keys in environment variables.
const ENV_SEPARATOR: &str = "__";

/// Separator for list elements in environment variables.
const LIST_SEPARATOR: &str = ",";

/// Trait implemented by top-level configuration structures.
pub trait Config {
    /// Keys whose values should be parsed as lists when loading from `APP_` variables.
    const LIST_PARSE_KEYS: &'static [&'static str];

    /// Conventional, unprefixed environment variables mapped onto configuration keys.
    ///
    /// Each entry is `(ENV_VAR, config.key)`. These take precedence over every other
    /// source, so platform-provided variables such as `DATABASE_URL` or `PORT` work
    /// without renaming.
    const ENV_OVERRIDES: &'static [(&'static str, &'static str)] = &[];
}

/// Identifies which configuration file is currently being loaded.
#[derive(Debug, Clone, Copy)]
enum ConfigFileKind {
    Base,
    Environment(Environment),
}

impl ConfigFileKind {
    fn stem(&self) -> Cow<'static, str> {
        match self {
            ConfigFileKind::Base => Cow::Borrowed("base"),
            ConfigFileKind::Environment(env) => Cow::Owned(env.to_string()),
        }
    }
}

impl fmt::Display for ConfigFileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigFileKind::Base => f.write_str("base configuration"),
            ConfigFileKind::Environment(env) => write!(f, "{env} environment configuration"),
        }
    }
}

/// Errors that can occur while loading configuration files and overrides.
#[derive(Debug, Error)]
pub enum LoadConfigError {
    #[error("failed to determine the current directory: {0}")]
    CurrentDir(#[source] io::Error),

    #[error("configuration directory `{0}` does not exist")]
    MissingConfigurationDirectory(PathBuf),

    #[error("could not locate {kind_description} in `{directory}`; attempted: {attempted}")]
    ConfigurationFileMissing {
        kind_description: String,
        directory: PathBuf,
        attempted: String,
    },

    #[error("failed to load {kind_description} from `{path}`: {source}")]
    ConfigurationFileLoad {
        kind_description: String,
        path: PathBuf,
        source: config::ConfigError,
    },

    #[error("failed to apply override from `{variable}` to `{key}`: {source}")]
    Override {
        variable: &'static str,
        key: &'static str,
        source: config::ConfigError,
    },

    #[error("failed to deserialize configuration: {0}")]
    Deserialization(#[source] config::ConfigError),

    #[error("failed to determine runtime environment: {0}")]
    Environment(#[from] io::Error),

    #[error("failed to initialize configuration builder: {0}")]
    Builder(#[source] config::ConfigError),

    #[error("failed to load environment file `{}`: {source}", .path.display())]
    Dotenv {
        path: PathBuf,
        source: dotenvy::Error,
    },
}

/// Loads `.env` from the current working directory into the process environment.
///
/// Variables that are already set keep their value. Returns the loaded path, or `None`
/// when there is no such file. Call this before anything reads the environment.
pub fn load_dotenv() -> Result<Option<PathBuf>, LoadConfigError> {
    let base_path = std::env::current_dir().map_err(LoadConfigError::CurrentDir)?;
    load_dotenv_from(&base_path.join(DOTENV_FILE))
}

fn load_dotenv_from(path: &Path) -> Result<Option<PathBuf>, LoadConfigError> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(Some(path.to_path_buf())),
        Err(err) if err.not_found() => Ok(None),
        Err(source) => Err(LoadConfigError::Dotenv {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Loads hierarchical configuration from the `configuration` directory of the current
/// working directory.
///
/// See [`load_config_from`] for the layering rules.
pub fn load_config<T>() -> Result<T, LoadConfigError>
where
    T: Config + DeserializeOwned,
{
    let base_path = std::env::current_dir().map_err(LoadConfigError::CurrentDir)?;
    load_config_from(&base_path.join(CONFIGURATION_DIR))
}

/// Loads hierarchical configuration from `configuration_directory`.
///
/// Sources are applied in order, later ones winning:
/// 1. `base.(yaml|yml|json)`
/// 2. `{environment}.(yaml|yml|json)` where the environment comes from `APP_ENVIRONMENT`
/// 3. `APP_`-prefixed environment variables, nested with `__` (`APP_DATABASE__URL`)
/// 4. the unprefixed variables listed in [`Config::ENV_OVERRIDES`]
pub fn load_config_from<T>(configuration_directory: &Path) -> Result<T, LoadConfigError>
where
    T: Config + DeserializeOwned,
{
    load_config_for_environment(configuration_directory, Environment::load()?)
}

fn load_config_for_environment<T>(
    configuration_directory: &Path,
    environment: Environment,
) -> Result<T, LoadConfigError>
where
    T: Config + DeserializeOwned,
{
    if !configuration_directory.is_dir() {
        return Err(LoadConfigError::MissingConfigurationDirectory(
            configuration_directory.to_path_buf(),
        ));
    }

    let base_file = find_configuration_file(configuration_directory, ConfigFileKind::Base)?;
    let environment_file = find_configuration_file(
        configuration_directory,
        ConfigFileKind::Environment(environment),
    )?;

    let mut environment_source = config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator(ENV_PREFIX_SEPARATOR)
        .separator(ENV_SEPARATOR);

    if !T::LIST_PARSE_KEYS.is_empty() {
        environment_source = environment_source
            .try_parsing(true)
            .list_separator(LIST_SEPARATOR);

        for key in T::LIST_PARSE_KEYS {
            environment_source = environment_source.with_list_parse_key(key);
        }
    }

    let builder = config::Config::builder().add_source(config::File::from(base_file.clone()));
    validate_configuration_source(&builder, ConfigFileKind::Base, &base_file)?;

    let builder = builder.add_source(config::File::from(environment_file.clone()));
    validate_configuration_source(
        &builder,
        ConfigFileKind::Environment(environment),
        &environment_file,
    )?;

    let mut builder = builder.add_source(environment_source);

    for &(variable, key) in T::ENV_OVERRIDES {
        let value = std::env::var(variable).ok().filter(|v| !v.is_empty());
        builder = builder
            .set_override_option(key, value)
            .map_err(|source| LoadConfigError::Override {
                variable,
                key,
                source,
            })?;
    }

    let settings = builder.build().map_err(LoadConfigError::Builder)?;

    settings
        .try_deserialize::<T>()
        .map_err(LoadConfigError::Deserialization)
}

/// Finds the configuration file that matches the requested kind and supported extensions.
fn find_configuration_file(
    directory: &Path,
    kind: ConfigFileKind,
) -> Result<PathBuf, LoadConfigError> {
    let stem = kind.stem();
    let mut attempted_paths = Vec::with_capacity(CONFIG_FILE_EXTENSIONS.len());

    for extension in CONFIG_FILE_EXTENSIONS {
        let path = directory.join(format!("{stem}.{extension}"));
        attempted_paths.push(path.clone());

        if path.is_file() {
            return Ok(path);
        }
    }

    let attempted = attempted_paths
        .iter()
        .map(|path| format!("`{}`", path.display()))
        .collect::<Vec<_>>()
        .join(", ");

    Err(LoadConfigError::ConfigurationFileMissing {
        kind_description: kind.to_string(),
        directory: directory.to_path_buf(),
        attempted,
    })
}

fn validate_configuration_source(
    builder: &ConfigBuilder<DefaultState>,
    kind: ConfigFileKind,
    path: &Path,
) -> Result<(), LoadConfigError> {
    builder
        .clone()
        .build()
        .map_err(|source| LoadConfigError::ConfigurationFileLoad {
            kind_description: kind.to_string(),
            path: path.to_path_buf(),
            source,
        })
        .map(|_| ())
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use std::fs;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Settings {
        name: String,
        port: u16,
    }

    impl Config for Settings {
        const LIST_PARSE_KEYS: &'static [&'static str] = &[];
    }

    /// Settings with conventional overrides on variables no other test touches.
    #[derive(Debug, Deserialize)]
    struct OverriddenSettings {
        name: String,
        port: u16,
    }

    impl Config for OverriddenSettings {
        const LIST_PARSE_KEYS: &'static [&'static str] = &[];

        const ENV_OVERRIDES: &'static [(&'static str, &'static str)] = &[
            ("CARDSTATUS_LOAD_TEST_NAME", "name"),
            ("CARDSTATUS_LOAD_TEST_PORT", "port"),
        ];
    }

    fn write_configuration(dir: &Path) {
        fs::write(dir.join("base.yaml"), "name: base\nport: 3000\n").unwrap();
        fs::write(dir.join("dev.yaml"), "port: 4000\n").unwrap();
        fs::write(dir.join("prod.yaml"), "port: 5000\n").unwrap();
    }

    #[test]
    fn missing_directory_is_reported() {
        let err = load_config_from::<Settings>(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(
            err,
            LoadConfigError::MissingConfigurationDirectory(_)
        ));
    }

    #[test]
    fn environment_file_overrides_base_file() {
        let dir = tempfile::tempdir().unwrap();
        write_configuration(dir.path());

        let dev: Settings = load_config_for_environment(dir.path(), Environment::Dev).unwrap();
        assert_eq!(dev.name, "base");
        assert_eq!(dev.port, 4000);

        let prod: Settings = load_config_for_environment(dir.path(), Environment::Prod).unwrap();
        assert_eq!(prod.name, "base");
        assert_eq!(prod.port, 5000);
    }

    #[test]
    fn conventional_variables_override_files_and_empty_values_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write_configuration(dir.path());

        // SAFETY: the variables are unique to this test and nothing else reads them.
        unsafe {
            std::env::set_var("CARDSTATUS_LOAD_TEST_PORT", "8081");
            std::env::set_var("CARDSTATUS_LOAD_TEST_NAME", "");
        }

        let settings: OverriddenSettings =
            load_config_for_environment(dir.path(), Environment::Prod).unwrap();

        assert_eq!(settings.port, 8081);
        assert_eq!(settings.name, "base");

        unsafe {
            std::env::remove_var("CARDSTATUS_LOAD_TEST_PORT");
            std::env::remove_var("CARDSTATUS_LOAD_TEST_NAME");
        }
    }

    #[test]
    fn dotenv_fills_unset_variables_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DOTENV_FILE);
        fs::write(
            &path,
            "CARDSTATUS_DOTENV_TEST_NEW=from-file\nCARDSTATUS_DOTENV_TEST_KEPT=from-file\n",
        )
        .unwrap();

        // SAFETY: the variables are unique to this test and nothing else reads them.
        unsafe {
            std::env::set_var("CARDSTATUS_DOTENV_TEST_KEPT", "from-env");
        }

        let loaded = load_dotenv_from(&path).unwrap();

        assert_eq!(loaded.as_deref(), Some(path.as_path()));
        assert_eq!(
            std::env::var("CARDSTATUS_DOTENV_TEST_NEW").as_deref(),
            Ok("from-file")
        );
        assert_eq!(
            std::env::var("CARDSTATUS_DOTENV_TEST_KEPT").as_deref(),
            Ok("from-env")
        );

        unsafe {
            std::env::remove_var("CARDSTATUS_DOTENV_TEST_NEW");
            std::env::remove_var("CARDSTATUS_DOTENV_TEST_KEPT");
        }
    }

    #[test]
    fn missing_dotenv_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();

        assert!(
            load_dotenv_from(&dir.path().join(DOTENV_FILE))
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn missing_environment_file_lists_attempted_paths() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("base.yaml"), "name: base\nport: 3000\n").unwrap();

        let err = load_config_for_environment::<Settings>(dir.path(), Environment::Dev)
            .unwrap_err();
        match err {
            LoadConfigError::ConfigurationFileMissing { attempted, .. } => {
                assert!(attempted.contains("dev.yaml"));
                assert!(attempted.contains("dev.json"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
