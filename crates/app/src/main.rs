mod args;

use sheba_core::model::{Language, ProfileDraft};
use sheba_core::summary::{ProgressSummary, Recommendation};
use sheba_core::{LearningPath, ProfessionKey};
use services::fixtures::source_for;
use services::{AppServices, Clock, LearningProgressService, ProgressServiceError};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use crate::args::{Args, ArgsError, Command, print_usage};

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn print_path(path: &LearningPath, lang: Language) {
    println!("Profession: {}", path.profession().display_name());
    if path.levels().is_empty() {
        println!("No learning data available.");
        return;
    }
    for level in path.levels() {
        let status = if level.is_completed() {
            "done"
        } else if level.is_unlocked() {
            "open"
        } else {
            "locked"
        };
        println!(
            "L{} [{status}] {} ({}/{})",
            level.id(),
            level.name().get(lang),
            level.completed_modules(),
            level.modules().len()
        );
        for module in level.modules() {
            let mark = if module.is_completed() { "x" } else { " " };
            println!(
                "    [{mark}] {} {} (quiz {})",
                module.id(),
                module.title().get(lang),
                module.quiz_ref()
            );
        }
    }
}

fn print_summary(summary: &ProgressSummary, path: &LearningPath, lang: Language) {
    println!(
        "Rank: {} ({}/{} modules, {:.0}%)",
        summary.rank, summary.completed_modules, summary.total_modules, summary.completion_rate
    );
    for rec in &summary.recommendations {
        let label = match rec {
            Recommendation::Continue { percent, .. } => format!("Continue ({percent}% done)"),
            Recommendation::UpNext { .. } => "Up next".to_string(),
            Recommendation::Start { .. } => "Start".to_string(),
        };
        let level = rec.level();
        let name = path.level(level).map_or("", |l| l.name().get(lang));
        println!("  {label}: L{level} {name} (+{}% earnings)", rec.earning_boost());
    }
    match serde_json::to_string_pretty(summary) {
        Ok(json) => debug!(summary = %json, "progress summary"),
        Err(err) => debug!(error = %err, "could not render summary"),
    }
}

async fn profession_for(
    app: &AppServices,
    override_profession: Option<&str>,
) -> Result<ProfessionKey, Box<dyn std::error::Error>> {
    match override_profession {
        Some(raw) => Ok(ProfessionKey::normalize(raw)),
        None => Ok(app.profiles().profession_key().await?),
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let parsed = Args::parse(std::env::args().skip(1), |key| std::env::var(key).ok())
        .map_err(|e| {
            eprintln!("{e}");
            print_usage();
            e
        })?;
    let Some(parsed) = parsed else {
        print_usage();
        return Ok(());
    };

    // SQLite file creation and migration happen here, not in services.
    prepare_sqlite_file(&parsed.db_url)?;
    let app = AppServices::new_sqlite(&parsed.db_url, Clock::system(), source_for(&parsed.fixtures))
        .await?;
    let lang = match parsed.lang {
        Some(lang) => lang,
        None => app.profiles().language().await?,
    };

    match parsed.command {
        Command::Path => {
            let profession = profession_for(&app, parsed.profession.as_deref()).await?;
            let path = app.progress().load_path(&profession).await?;
            print_path(&path, lang);
        }
        Command::Summary => {
            let profession = profession_for(&app, parsed.profession.as_deref()).await?;
            let path = app.progress().load_path(&profession).await?;
            print_summary(&LearningProgressService::summary(&path), &path, lang);
        }
        Command::Complete { level, module } => {
            let profession = profession_for(&app, parsed.profession.as_deref()).await?;
            let progress = app.progress();
            let mut path = progress.load_path(&profession).await?;
            match progress.complete_module(&mut path, level, module).await {
                Ok(true) => {
                    let name = path.level(level).map_or("", |l| l.name().get(lang));
                    println!("Level {level} complete: {name}");
                    if let Some(next) = path.current_level() {
                        println!("Unlocked L{} {}", next.id(), next.name().get(lang));
                    }
                }
                Ok(false) => println!("Module {module} of level {level} complete."),
                Err(ProgressServiceError::Persist { source, .. }) => {
                    error!(error = %source, "progress could not be saved");
                    return Err("progress could not be saved, free up space and try again".into());
                }
                Err(other) => return Err(Box::new(other)),
            }
        }
        Command::Register {
            name,
            phone,
            profession,
            district,
        } => {
            let profiles = app.profiles();
            let mut draft = profiles
                .load()
                .await?
                .map(|p| p.to_draft())
                .unwrap_or_default();
            draft = ProfileDraft {
                name,
                phone,
                profession: profession.or(draft.profession),
                district: district.or(draft.district),
                ..draft
            };
            let profile = profiles.save(draft).await?;
            let place = profile
                .district()
                .map(|d| format!(", {d}"))
                .unwrap_or_default();
            println!(
                "[{}] Registered {} ({}{place})",
                profile.initial(),
                profile.name(),
                profile.profession_key().display_name()
            );
        }
        Command::Language(language) => {
            app.profiles().set_language(language).await?;
            println!("Language set to {language}");
        }
        Command::Reset => {
            let profession = profession_for(&app, parsed.profession.as_deref()).await?;
            app.progress().reset(&profession).await?;
            println!("Progress for {} cleared.", profession.display_name());
        }
    }

    Ok(())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_url_needs_no_file() {
        assert!(prepare_sqlite_file("sqlite::memory:").is_ok());
    }

    #[test]
    fn rejects_non_file_urls() {
        assert!(prepare_sqlite_file("postgres://localhost/db").is_err());
        assert!(prepare_sqlite_file("sqlite://").is_err());
    }
}
