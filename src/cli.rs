use std::path::PathBuf;

use clap::{ArgAction, Parser};
use pgarrow_result::{Error, Result};
use pgarrow_table::{DEFAULT_SEGMENT_SIZE, parse_segment_size};

fn segment_size_arg(text: &str) -> std::result::Result<usize, String> {
    parse_segment_size(text).map_err(|e| e.to_string())
}

/// Dump the result of a PostgreSQL query into an Arrow IPC file.
#[derive(Debug, Parser)]
#[command(name = "pg2arrow", version, disable_help_flag = true)]
pub struct Cli {
    /// Database to connect to
    #[arg(short = 'd', long = "dbname", value_name = "DBNAME")]
    pub dbname: Option<String>,

    /// SQL command to run
    #[arg(
        short = 'c',
        long = "command",
        value_name = "COMMAND",
        conflicts_with = "file",
        required_unless_present_any = ["file", "dump"]
    )]
    pub command: Option<String>,

    /// File holding the SQL command to run
    #[arg(short = 'f', long = "file", value_name = "FILENAME")]
    pub file: Option<PathBuf>,

    /// Output file; a temporary file is kept when omitted
    #[arg(short = 'o', long = "output", value_name = "FILENAME")]
    pub output: Option<PathBuf>,

    /// Record batch size threshold, e.g. 256MB
    #[arg(
        short = 's',
        long = "segment-size",
        value_name = "SIZE",
        value_parser = segment_size_arg,
        default_value_t = DEFAULT_SEGMENT_SIZE
    )]
    pub segment_size: usize,

    /// Database server host or socket directory
    #[arg(short = 'h', long = "host", value_name = "HOSTNAME")]
    pub host: Option<String>,

    /// Database server port
    #[arg(short = 'p', long = "port", value_name = "PORT")]
    pub port: Option<u16>,

    /// Database user name
    #[arg(short = 'U', long = "username", value_name = "USERNAME")]
    pub username: Option<String>,

    /// Never prompt for a password
    #[arg(short = 'w', long = "no-password", conflicts_with = "password")]
    pub no_password: bool,

    /// Prompt for a password before connecting
    #[arg(short = 'W', long = "password")]
    pub password: bool,

    /// Print the schema and batch summary of an Arrow file, then exit
    #[arg(long = "dump", value_name = "FILENAME", conflicts_with_all = ["command", "file"])]
    pub dump: Option<PathBuf>,

    /// Print help
    #[arg(long = "help", action = ArgAction::Help)]
    pub help: Option<bool>,

    #[arg(value_name = "DBNAME")]
    pub positional_dbname: Option<String>,

    #[arg(value_name = "USERNAME")]
    pub positional_username: Option<String>,
}

/// Where the connection password comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordSource {
    /// `-W`: ask on the terminal.
    Prompt,
    /// The `PGPASSWORD` environment variable, if set.
    Environment,
    /// `-w`: connect without a password.
    Never,
}

impl Cli {
    pub fn password_source(&self) -> PasswordSource {
        if self.password {
            PasswordSource::Prompt
        } else if self.no_password {
            PasswordSource::Never
        } else {
            PasswordSource::Environment
        }
    }

    /// Resolve the password to send, prompting when `-W` was given.
    pub fn resolve_password(&self) -> Result<Option<String>> {
        match self.password_source() {
            PasswordSource::Prompt => Ok(Some(rpassword::prompt_password("Password: ")?)),
            PasswordSource::Environment => Ok(std::env::var("PGPASSWORD").ok()),
            PasswordSource::Never => Ok(None),
        }
    }

    /// `-d` wins over the positional database name.
    pub fn dbname(&self) -> Option<&str> {
        self.dbname.as_deref().or(self.positional_dbname.as_deref())
    }

    /// `-U` wins over the positional user name.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref().or(self.positional_username.as_deref())
    }

    /// The SQL text from `-c` or from the file named by `-f`.
    pub fn query_text(&self) -> Result<String> {
        match (&self.command, &self.file) {
            (Some(sql), _) => Ok(sql.clone()),
            (None, Some(path)) => Ok(std::fs::read_to_string(path)?),
            (None, None) => Err(Error::InvalidArgumentError(
                "no SQL command given; use -c or -f".into(),
            )),
        }
    }
}
