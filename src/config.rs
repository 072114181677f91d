use thiserror::Error;

use crate::stream::{SortOrder, SCAN_COUNT_DEFAULT};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid command line flag: {0}")]
    InvalidCommandLineFlag(String),
    #[error("Invalid value for command line flag {0}")]
    InvalidCommandLineFlagValue(String),
    #[error("Missing stream key name")]
    MissingKeyName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserConfig {
    pub host: String,
    pub port: u16,
    pub key_name: String,
    pub count: u64,
    /// Window start in milliseconds. `None` means the first entry of the stream.
    pub start: Option<u64>,
    /// Window end in milliseconds. `None` means the last entry of the stream.
    pub end: Option<u64>,
    pub sort_order: SortOrder,
    /// Keep loading pages until the window is covered.
    pub all: bool,
    /// Entry ids to delete before browsing.
    pub delete: Vec<String>,
}

impl BrowserConfig {
    /// Parses the process arguments. The first item is the program name and is skipped.
    pub fn new<I: IntoIterator<Item = String>>(command_line_args: I) -> Result<Self, ConfigError> {
        let mut iter = command_line_args.into_iter().skip(1);

        let mut host: Option<String> = None;
        let mut port: Option<u16> = None;
        let mut key_name: Option<String> = None;
        let mut count: Option<u64> = None;
        let mut start: Option<u64> = None;
        let mut end: Option<u64> = None;
        let mut sort_order = SortOrder::default();
        let mut all = false;
        let mut delete = Vec::new();

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--host" => host = Some(flag_value(&mut iter, &arg)?),
                "--port" => {
                    let value = flag_value(&mut iter, &arg)?;
                    let port_number = value
                        .parse::<u16>()
                        .map_err(|_| ConfigError::InvalidCommandLineFlagValue(arg.clone()))?;

                    if port_number < 1 {
                        return Err(ConfigError::InvalidCommandLineFlagValue(arg));
                    }

                    port = Some(port_number);
                }
                "--count" => {
                    let value = parse_number(&mut iter, &arg)?;
                    if value < 1 {
                        return Err(ConfigError::InvalidCommandLineFlagValue(arg));
                    }
                    count = Some(value);
                }
                "--start" => start = Some(parse_number(&mut iter, &arg)?),
                "--end" => end = Some(parse_number(&mut iter, &arg)?),
                "--sort" => {
                    sort_order = match flag_value(&mut iter, &arg)?.to_lowercase().as_str() {
                        "asc" => SortOrder::Asc,
                        "desc" => SortOrder::Desc,
                        _ => return Err(ConfigError::InvalidCommandLineFlagValue(arg)),
                    };
                }
                "--all" => all = true,
                "--delete" => {
                    delete = flag_value(&mut iter, &arg)?
                        .split(',')
                        .map(str::trim)
                        .filter(|id| !id.is_empty())
                        .map(str::to_string)
                        .collect();

                    if delete.is_empty() {
                        return Err(ConfigError::InvalidCommandLineFlagValue(arg));
                    }
                }
                flag if flag.starts_with("--") => {
                    return Err(ConfigError::InvalidCommandLineFlag(arg));
                }
                _ => {
                    if key_name.is_some() {
                        return Err(ConfigError::InvalidCommandLineFlag(arg));
                    }
                    key_name = Some(arg);
                }
            }
        }

        Ok(BrowserConfig {
            host: host.unwrap_or_else(|| "127.0.0.1".to_string()),
            port: port.unwrap_or(6379),
            key_name: key_name.ok_or(ConfigError::MissingKeyName)?,
            count: count.unwrap_or(SCAN_COUNT_DEFAULT),
            start,
            end,
            sort_order,
            all,
            delete,
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn flag_value<I: Iterator<Item = String>>(iter: &mut I, flag: &str) -> Result<String, ConfigError> {
    iter.next()
        .ok_or_else(|| ConfigError::InvalidCommandLineFlagValue(flag.to_string()))
}

fn parse_number<I: Iterator<Item = String>>(iter: &mut I, flag: &str) -> Result<u64, ConfigError> {
    flag_value(iter, flag)?
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidCommandLineFlagValue(flag.to_string()))
}
