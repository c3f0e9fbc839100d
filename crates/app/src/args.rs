use std::fmt;

use sheba_core::model::{Language, LevelId, ModuleId};

#[derive(Debug)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidLevelId { raw: String },
    InvalidModuleId { raw: String },
    InvalidLanguage { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidLevelId { raw } => write!(f, "invalid --level value: {raw}"),
            ArgsError::InvalidModuleId { raw } => write!(f, "invalid --module value: {raw}"),
            ArgsError::InvalidLanguage { raw } => write!(f, "invalid language: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  app [options] [path]");
    eprintln!("  app [options] complete --level <id> --module <id>");
    eprintln!("  app [options] summary");
    eprintln!("  app [options] register --name <name> --phone <phone> [--profession <p>] [--district <d>]");
    eprintln!("  app [options] language <bn|en>");
    eprintln!("  app [options] reset");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>       default sqlite:sheba.sqlite3");
    eprintln!("  --fixtures <path|url>   default fixtures/learningData.json");
    eprintln!("  --profession <name>     overrides the stored profile's profession");
    eprintln!("  --lang <bn|en>          overrides the stored language");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  SHEBA_DB_URL, SHEBA_FIXTURES, SHEBA_PROFESSION, SHEBA_LANG, RUST_LOG");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Path,
    Complete { level: LevelId, module: ModuleId },
    Summary,
    Register {
        name: String,
        phone: String,
        profession: Option<String>,
        district: Option<String>,
    },
    Language(Language),
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub db_url: String,
    pub fixtures: String,
    pub profession: Option<String>,
    pub lang: Option<Language>,
    pub command: Command,
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_language(raw: String) -> Result<Language, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidLanguage { raw })
}

impl Args {
    /// Parse `argv` (without the program name), with environment fallbacks.
    ///
    /// Returns `Ok(None)` when help was requested.
    pub fn parse(
        argv: impl IntoIterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Option<Self>, ArgsError> {
        let mut db_url = env("SHEBA_DB_URL").unwrap_or_else(|| "sqlite:sheba.sqlite3".into());
        let mut fixtures = env("SHEBA_FIXTURES")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "fixtures/learningData.json".into());
        let mut profession = env("SHEBA_PROFESSION").filter(|v| !v.trim().is_empty());
        let mut lang = env("SHEBA_LANG").and_then(|v| v.parse().ok());

        let mut command_word: Option<String> = None;
        let mut rest: Vec<String> = Vec::new();
        let mut args = argv.into_iter();

        // Global options go before the subcommand; everything after it belongs to the subcommand.
        while let Some(arg) = args.next() {
            if command_word.is_some() {
                rest.push(arg);
                continue;
            }
            match arg.as_str() {
                "--help" | "-h" => return Ok(None),
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--fixtures" => fixtures = require_value(&mut args, "--fixtures")?,
                "--profession" => profession = Some(require_value(&mut args, "--profession")?),
                "--lang" => lang = Some(parse_language(require_value(&mut args, "--lang")?)?),
                _ if !arg.starts_with("--") => command_word = Some(arg),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let command = match command_word.as_deref() {
            None | Some("path") => {
                reject_extra(rest)?;
                Command::Path
            }
            Some("summary") => {
                reject_extra(rest)?;
                Command::Summary
            }
            Some("reset") => {
                reject_extra(rest)?;
                Command::Reset
            }
            Some("complete") => parse_complete(rest)?,
            Some("register") => parse_register(rest)?,
            Some("language") => {
                let mut rest = rest.into_iter();
                let raw = rest.next().ok_or(ArgsError::MissingValue { flag: "language" })?;
                reject_extra(rest.collect())?;
                Command::Language(parse_language(raw)?)
            }
            Some(other) => return Err(ArgsError::UnknownCommand(other.to_owned())),
        };

        Ok(Some(Self {
            db_url: normalize_sqlite_url(db_url),
            fixtures,
            profession,
            lang,
            command,
        }))
    }
}

fn reject_extra(rest: Vec<String>) -> Result<(), ArgsError> {
    match rest.into_iter().next() {
        Some(arg) => Err(ArgsError::UnknownArg(arg)),
        None => Ok(()),
    }
}

fn parse_complete(rest: Vec<String>) -> Result<Command, ArgsError> {
    let mut level = None;
    let mut module = None;
    let mut args = rest.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--level" => {
                let value = require_value(&mut args, "--level")?;
                level = Some(
                    value
                        .parse::<LevelId>()
                        .map_err(|_| ArgsError::InvalidLevelId { raw: value.clone() })?,
                );
            }
            "--module" => {
                let value = require_value(&mut args, "--module")?;
                module = Some(
                    value
                        .parse::<ModuleId>()
                        .map_err(|_| ArgsError::InvalidModuleId { raw: value.clone() })?,
                );
            }
            _ => return Err(ArgsError::UnknownArg(arg)),
        }
    }
    Ok(Command::Complete {
        level: level.ok_or(ArgsError::MissingFlag { flag: "--level" })?,
        module: module.ok_or(ArgsError::MissingFlag { flag: "--module" })?,
    })
}

fn parse_register(rest: Vec<String>) -> Result<Command, ArgsError> {
    let mut name = None;
    let mut phone = None;
    let mut profession = None;
    let mut district = None;
    let mut args = rest.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--name" => name = Some(require_value(&mut args, "--name")?),
            "--phone" => phone = Some(require_value(&mut args, "--phone")?),
            "--profession" => profession = Some(require_value(&mut args, "--profession")?),
            "--district" => district = Some(require_value(&mut args, "--district")?),
            _ => return Err(ArgsError::UnknownArg(arg)),
        }
    }
    Ok(Command::Register {
        name: name.ok_or(ArgsError::MissingFlag { flag: "--name" })?,
        phone: phone.ok_or(ArgsError::MissingFlag { flag: "--phone" })?,
        profession,
        district,
    })
}

/// Turn `sqlite:relative/path` into an absolute `sqlite://` URL.
pub fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim();
    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = std::path::Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}
