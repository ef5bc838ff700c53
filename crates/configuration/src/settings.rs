use crate::error::ConfigError;
use core_types::MalformedRowPolicy;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// The root configuration structure for the loader.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub input: InputSettings,
}

/// Coordinates of the target database and table.
#[derive(Clone, Deserialize)]
pub struct DatabaseSettings {
    /// A `postgres://` connection URL. Credentials may be embedded here or
    /// supplied separately through `username` / `password`.
    pub url: String,
    /// Overrides the user in `url` when set.
    #[serde(default)]
    pub username: Option<String>,
    /// Overrides the password in `url` when set.
    #[serde(default)]
    pub password: Option<String>,
    /// Target table, optionally schema-qualified (e.g. `school.students`).
    pub table: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

/// Where the roster file lives and how to read it.
#[derive(Debug, Clone, Deserialize)]
pub struct InputSettings {
    pub path: PathBuf,
    /// Field delimiter; must be a single ASCII character.
    pub delimiter: String,
    pub on_malformed: MalformedRowPolicy,
}

impl Settings {
    /// Checks every setting that could make the run fail later for a reason
    /// unrelated to the data itself.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.database.validate()?;
        self.input.validate()
    }
}

impl DatabaseSettings {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(ConfigError::ValidationError(
                "database.url must be set (or provide DATABASE_URL)".to_string(),
            ));
        }
        if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) {
            return Err(ConfigError::ValidationError(format!(
                "database.url must use the postgres:// or postgresql:// scheme, got '{}'",
                url.split("://").next().unwrap_or(url)
            )));
        }
        if !is_valid_table_name(&self.table) {
            return Err(ConfigError::ValidationError(format!(
                "database.table '{}' is not a valid table name",
                self.table
            )));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// Hand-written so the password never ends up in logs.
impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("url", &redact_url(&self.url))
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("table", &self.table)
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .finish()
    }
}

impl InputSettings {
    /// The delimiter as the single byte the CSV reader expects.
    pub fn delimiter_byte(&self) -> Result<u8, ConfigError> {
        let mut chars = self.delimiter.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii() && c != '"' && c != '\n' && c != '\r' => Ok(c as u8),
            _ => Err(ConfigError::ValidationError(format!(
                "input.delimiter must be a single ASCII character other than a quote or newline, got {:?}",
                self.delimiter
            ))),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "input.path must not be empty".to_string(),
            ));
        }
        self.delimiter_byte().map(|_| ())
    }
}

/// Accepts `table` or `schema.table`, where each part starts with a letter or
/// underscore and continues with ASCII alphanumerics or underscores.
///
/// The table name is spliced into the INSERT statement, so this is the only
/// thing standing between configuration and SQL text.
pub fn is_valid_table_name(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    if parts.is_empty() || parts.len() > 2 {
        return false;
    }
    parts.iter().all(|part| {
        let mut chars = part.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() || first == '_' => {
                part.len() <= 63 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        }
    })
}

/// Replaces the password portion of a connection URL with `***`.
fn redact_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let Some((userinfo, host)) = rest.rsplit_once('@') else {
        return url.to_string();
    };
    match userinfo.split_once(':') {
        Some((user, _)) => format!("{scheme}://{user}:***@{host}"),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn database(url: &str, table: &str) -> DatabaseSettings {
        DatabaseSettings {
            url: url.to_string(),
            username: None,
            password: Some("hunter2".to_string()),
            table: table.to_string(),
            max_connections: 5,
            acquire_timeout_secs: 5,
        }
    }

    fn input(delimiter: &str) -> InputSettings {
        InputSettings {
            path: PathBuf::from("students.csv"),
            delimiter: delimiter.to_string(),
            on_malformed: MalformedRowPolicy::Skip,
        }
    }

    #[test]
    fn table_names() {
        assert!(is_valid_table_name("students"));
        assert!(is_valid_table_name("school.students_2024"));
        assert!(is_valid_table_name("_staging"));
        assert!(!is_valid_table_name(""));
        assert!(!is_valid_table_name("1students"));
        assert!(!is_valid_table_name("a.b.c"));
        assert!(!is_valid_table_name("students; DROP TABLE students"));
        assert!(!is_valid_table_name("students."));
    }

    #[test]
    fn database_validation() {
        assert!(database("postgres://u:p@localhost/db", "students").validate().is_ok());
        assert!(database("postgresql://localhost/db", "students").validate().is_ok());
        assert!(database("", "students").validate().is_err());
        assert!(database("mysql://localhost/db", "students").validate().is_err());
        assert!(database("postgres://localhost/db", "bad name").validate().is_err());

        let mut no_pool = database("postgres://localhost/db", "students");
        no_pool.max_connections = 0;
        assert!(no_pool.validate().is_err());
    }

    #[test]
    fn delimiter_must_be_one_ascii_char() {
        assert_eq!(input(",").delimiter_byte().unwrap(), b',');
        assert_eq!(input(";").delimiter_byte().unwrap(), b';');
        assert_eq!(input("\t").delimiter_byte().unwrap(), b'\t');
        assert!(input("").delimiter_byte().is_err());
        assert!(input(",,").delimiter_byte().is_err());
        assert!(input("é").delimiter_byte().is_err());
        assert!(input("\"").delimiter_byte().is_err());
    }

    #[test]
    fn debug_output_hides_password() {
        let settings = database("postgres://loader:s3cret@db:5432/school", "students");
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("s3cret"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("postgres://loader:***@db:5432/school"));
    }
}
