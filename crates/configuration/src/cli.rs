use crate::settings::Settings;
use core_types::MalformedRowPolicy;
use std::path::PathBuf;

/// Command-line overrides, highest precedence of all configuration sources.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct CliOverrides {
    /// CSV file to load (overrides `input.path`).
    #[arg(long, short)]
    pub input: Option<PathBuf>,

    /// Field delimiter, a single ASCII character (overrides `input.delimiter`).
    #[arg(long, short)]
    pub delimiter: Option<String>,

    /// Target table, optionally schema-qualified (overrides `database.table`).
    #[arg(long)]
    pub table: Option<String>,

    /// What to do with rows that fail to decode: `skip` or `abort`.
    #[arg(long, value_name = "POLICY")]
    pub on_malformed: Option<MalformedRowPolicy>,

    /// Shorthand for `--on-malformed abort`.
    #[arg(long, conflicts_with = "on_malformed")]
    pub strict: bool,
}

impl CliOverrides {
    /// Writes every override that was given on the command line into `settings`.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(input) = &self.input {
            settings.input.path = input.clone();
        }
        if let Some(delimiter) = &self.delimiter {
            settings.input.delimiter = delimiter.clone();
        }
        if let Some(table) = &self.table {
            settings.database.table = table.clone();
        }
        if let Some(policy) = self.on_malformed {
            settings.input.on_malformed = policy;
        }
        if self.strict {
            settings.input.on_malformed = MalformedRowPolicy::Abort;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{DatabaseSettings, InputSettings};
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        overrides: CliOverrides,
    }

    fn settings() -> Settings {
        Settings {
            database: DatabaseSettings {
                url: "postgres://localhost/school".to_string(),
                username: None,
                password: None,
                table: "students".to_string(),
                max_connections: 5,
                acquire_timeout_secs: 5,
            },
            input: InputSettings {
                path: PathBuf::from("students.csv"),
                delimiter: ",".to_string(),
                on_malformed: MalformedRowPolicy::Skip,
            },
        }
    }

    #[test]
    fn no_flags_leave_settings_untouched() {
        let cli = TestCli::parse_from(["loader"]);
        let mut settings = settings();
        cli.overrides.apply(&mut settings);
        assert_eq!(settings.input.path, PathBuf::from("students.csv"));
        assert_eq!(settings.database.table, "students");
        assert_eq!(settings.input.on_malformed, MalformedRowPolicy::Skip);
    }

    #[test]
    fn flags_override_settings() {
        let cli = TestCli::parse_from([
            "loader",
            "--input",
            "roster.csv",
            "-d",
            ";",
            "--table",
            "staging.students",
            "--on-malformed",
            "abort",
        ]);
        let mut settings = settings();
        cli.overrides.apply(&mut settings);
        assert_eq!(settings.input.path, PathBuf::from("roster.csv"));
        assert_eq!(settings.input.delimiter, ";");
        assert_eq!(settings.database.table, "staging.students");
        assert_eq!(settings.input.on_malformed, MalformedRowPolicy::Abort);
    }

    #[test]
    fn strict_means_abort() {
        let cli = TestCli::parse_from(["loader", "--strict"]);
        let mut settings = settings();
        cli.overrides.apply(&mut settings);
        assert!(settings.input.on_malformed.is_fatal());
    }

    #[test]
    fn rejects_unknown_policy() {
        assert!(TestCli::try_parse_from(["loader", "--on-malformed", "maybe"]).is_err());
    }
}
