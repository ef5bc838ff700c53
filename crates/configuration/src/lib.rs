use std::path::Path;

// Declare the modules that make up this crate.
#[cfg(feature = "clap")]
pub mod cli;
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
#[cfg(feature = "clap")]
pub use cli::CliOverrides;
pub use error::ConfigError;
pub use settings::{DatabaseSettings, InputSettings, Settings, is_valid_table_name};

/// Prefix for environment overrides, e.g. `LOADER__DATABASE__URL`.
pub const ENV_PREFIX: &str = "LOADER";
/// Separator between nested keys in environment overrides.
pub const ENV_SEPARATOR: &str = "__";
/// Name (without extension) of the config file picked up from the working directory.
pub const DEFAULT_CONFIG_NAME: &str = "loader";

/// Loads the loader configuration.
///
/// Sources, from lowest to highest precedence: built-in defaults (with
/// `DATABASE_URL` as the default database URL), the config file, then
/// `LOADER__*` environment variables. When `path` is `None` a `loader.toml`
/// in the working directory is used if present; an explicit `path` must exist.
///
/// The result is not validated, so callers can layer CLI overrides on top
/// before calling [`Settings::validate`].
pub fn load_config(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let environment = config::Environment::with_prefix(ENV_PREFIX)
        .separator(ENV_SEPARATOR)
        .try_parsing(true);

    build_settings(path, environment, std::env::var("DATABASE_URL").ok())
}

fn build_settings(
    path: Option<&Path>,
    environment: config::Environment,
    fallback_url: Option<String>,
) -> Result<Settings, ConfigError> {
    let file = match path {
        Some(path) => config::File::from(path.to_path_buf()).required(true),
        None => config::File::with_name(DEFAULT_CONFIG_NAME).required(false),
    };

    let builder = config::Config::builder()
        .set_default("database.url", fallback_url.unwrap_or_default())?
        .set_default("database.table", "students")?
        .set_default("database.max_connections", 5_i64)?
        .set_default("database.acquire_timeout_secs", 5_i64)?
        .set_default("input.path", "students.csv")?
        .set_default("input.delimiter", ",")?
        .set_default("input.on_malformed", "skip")?
        .add_source(file)
        .add_source(environment)
        .build()?;

    // Attempt to deserialize the entire configuration into our `Settings` struct
    let settings = builder.try_deserialize::<Settings>()?;
    tracing::debug!(?settings, "Configuration loaded.");

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::MalformedRowPolicy;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    fn environment(vars: &[(&str, &str)]) -> config::Environment {
        let map: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        config::Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
            .source(Some(map))
    }

    fn toml_file(contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("create temp config");
        file.write_all(contents.as_bytes()).expect("write temp config");
        file
    }

    #[test]
    fn defaults_apply_when_nothing_is_configured() {
        let file = toml_file("");
        let settings = build_settings(
            Some(file.path()),
            environment(&[]),
            Some("postgres://localhost/school".to_string()),
        )
        .unwrap();

        assert_eq!(settings.database.url, "postgres://localhost/school");
        assert_eq!(settings.database.table, "students");
        assert_eq!(settings.database.max_connections, 5);
        assert_eq!(settings.database.username, None);
        assert_eq!(settings.input.path, PathBuf::from("students.csv"));
        assert_eq!(settings.input.delimiter, ",");
        assert_eq!(settings.input.on_malformed, MalformedRowPolicy::Skip);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn file_overrides_defaults_and_environment_overrides_file() {
        let file = toml_file(
            r#"
            [database]
            url = "postgres://file-host/school"
            username = "loader"
            password = "from-file"
            table = "school.students"

            [input]
            path = "data/roster.csv"
            delimiter = ";"
            on_malformed = "abort"
            "#,
        );
        let settings = build_settings(
            Some(file.path()),
            environment(&[
                ("LOADER__DATABASE__PASSWORD", "from-env"),
                ("LOADER__DATABASE__MAX_CONNECTIONS", "2"),
            ]),
            Some("postgres://fallback/school".to_string()),
        )
        .unwrap();

        assert_eq!(settings.database.url, "postgres://file-host/school");
        assert_eq!(settings.database.username.as_deref(), Some("loader"));
        assert_eq!(settings.database.password.as_deref(), Some("from-env"));
        assert_eq!(settings.database.max_connections, 2);
        assert_eq!(settings.database.table, "school.students");
        assert_eq!(settings.input.path, PathBuf::from("data/roster.csv"));
        assert_eq!(settings.input.delimiter_byte().unwrap(), b';');
        assert_eq!(settings.input.on_malformed, MalformedRowPolicy::Abort);
    }

    #[test]
    fn missing_database_url_fails_validation() {
        let file = toml_file("");
        let settings = build_settings(Some(file.path()), environment(&[]), None).unwrap();
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn explicit_config_path_must_exist() {
        let result = build_settings(
            Some(Path::new("/definitely/not/here/loader.toml")),
            environment(&[]),
            None,
        );
        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }

    #[test]
    fn unknown_policy_is_a_load_error() {
        let file = toml_file("[input]\non_malformed = \"ignore\"\n");
        let result = build_settings(Some(file.path()), environment(&[]), None);
        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }
}
