#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm;
use dialoguer::Password;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use yansi::Paint;

use super::headless;
use crate::configuration::cache_dir;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Catalog;
use crate::domain::models::GenerationResult;
use crate::domain::models::ModelDescriptor;
use crate::domain::models::PageName;
use crate::domain::models::RemixPayload;
use crate::domain::services::actions::help_text;
use crate::domain::services::CredentialStore;
use crate::domain::services::HistoryStore;
use crate::domain::services::LocalStorage;
use crate::domain::services::StorageKey;

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
    std::process::exit(0);
}

pub fn format_history_entry(entry: &GenerationResult) -> String {
    return format!(
        "- (ID: {}) {}, Model: {}, Aspect: {}, {}",
        entry.id,
        entry.timestamp,
        entry.model_id,
        entry.aspect_ratio,
        entry.summary(70)
    );
}

pub fn format_model(catalog: &Catalog, model: &ModelDescriptor) -> String {
    let mut res = format!(
        "- {} ({}), Aspect ratios: {}",
        model.id,
        model.name,
        catalog.aspect_ratios_for(&model.id).join(", ")
    );

    if catalog.has_resolution_control(&model.id) {
        res = format!(
            "{res}, Resolutions: {}",
            catalog.resolutions_for(&model.id).join(", ")
        );
    }

    return res;
}

pub fn format_model_inputs(model: &ModelDescriptor) -> String {
    let mut lines = vec![
        format!("{} ({})", model.name, model.id),
        format!("Endpoint: {}", model.endpoint()),
        "Inputs:".to_string(),
    ];

    for (name, spec) in model.inputs.iter() {
        lines.push(format!("  - {name}: {}", spec.describe()));
    }

    return lines.join("\n");
}

fn load_catalog() -> Result<Catalog> {
    return Catalog::load(&Config::get(ConfigKey::CatalogFile));
}

fn print_models(model_id: Option<&String>) -> Result<()> {
    let catalog = load_catalog()?;

    if let Some(model_id) = model_id {
        match catalog.find_by_id(model_id) {
            Some(model) => println!("{}", format_model_inputs(model)),
            None => bail!(format!("No model with id '{model_id}' in the catalog")),
        }
        return Ok(());
    }

    let models = catalog
        .list()
        .iter()
        .map(|model| {
            return format_model(&catalog, model);
        })
        .collect::<Vec<String>>();

    println!("{}", models.join("\n"));
    return Ok(());
}

fn print_history_list() {
    let mut history = HistoryStore::new(LocalStorage::default());
    history.load();

    if history.is_empty() {
        println!("There is no history yet. Generate your first image!");
        return;
    }

    let entries = history
        .entries()
        .iter()
        .map(|entry| {
            return format_history_entry(entry);
        })
        .collect::<Vec<String>>();

    println!("{}", entries.join("\n"));
}

fn clear_history(skip_confirm: bool) -> Result<()> {
    let mut history = HistoryStore::new(LocalStorage::default());
    history.load();

    if history.is_empty() {
        println!("History is already empty.");
        return Ok(());
    }

    if !skip_confirm {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!(
                "Delete all {} generations from history?",
                history.len()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            return Ok(());
        }
    }

    history.clear()?;
    println!("History cleared.");
    return Ok(());
}

/// Queues a past generation for the studio to pick up on its next start.
pub fn queue_remix(storage: &LocalStorage, id: &str) -> Result<()> {
    let mut history = HistoryStore::new(storage.clone());
    history.load();

    let entry = match history.get(id) {
        Some(entry) => entry,
        None => bail!(format!("No history entry with id '{id}'")),
    };

    let payload = serde_json::to_string(&RemixPayload::from_result(entry))?;
    storage.set(StorageKey::Remix, &payload)?;

    return Ok(());
}

fn set_credential(value: Option<&String>) -> Result<()> {
    let credentials = CredentialStore::new(LocalStorage::default());

    let value = match value {
        Some(value) => value.to_string(),
        None => Password::with_theme(&ColorfulTheme::default())
            .with_prompt("API key")
            .interact()?,
    };

    credentials.set(&value)?;
    println!("API key saved.");
    return Ok(());
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(&config_file_path).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_credential() -> Command {
    return Command::new("credential")
        .about("Manage the API key used to authenticate generation requests.")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("set")
                .about("Save an API key. Omit --value to enter it interactively.")
                .arg(
                    clap::Arg::new("value")
                        .long("value")
                        .env("GENSTUDIO_API_KEY")
                        .hide_env_values(true)
                        .help("API key")
                        .num_args(1),
                ),
        )
        .subcommand(Command::new("clear").about("Remove the saved API key."))
        .subcommand(Command::new("status").about("Print whether an API key is saved."));
}

fn subcommand_debug() -> Command {
    let mut cmd = Command::new("debug");
    cmd = cmd.about("Debug helpers for GenStudio")
        .hide(true)
        .subcommand(
            Command::new("log-path").about("Output path to debug log file generated when running GenStudio with environment variable RUST_LOG=genstudio")
        )
        .subcommand(
            Command::new("enum-config").about("List all config keys as strings.")
        );

    return cmd;
}

fn subcommand_generate() -> Command {
    return Command::new("generate")
        .about("Generate a single image without starting the studio, and print its URL.")
        .arg(
            clap::Arg::new("prompt")
                .long("prompt")
                .help("Text description of the image to generate.")
                .num_args(1)
                .required(true),
        )
        .arg(
            clap::Arg::new("resolution")
                .short('r')
                .long("resolution")
                .help("Output resolution, for models that support choosing one.")
                .num_args(1),
        );
}

fn subcommand_history() -> Command {
    return Command::new("history")
        .about("Manage past generations.")
        .arg_required_else_help(true)
        .subcommand(Command::new("dir").about("Print the directory history is stored in."))
        .subcommand(Command::new("list").about("List past generations, newest first."))
        .subcommand(
            Command::new("clear")
                .about("Delete all past generations.")
                .arg(
                    clap::Arg::new("yes")
                        .short('y')
                        .long("yes")
                        .help("Skip the confirmation prompt.")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("remix")
                .about("Open the studio with the prompt, model and aspect ratio of a past generation.")
                .arg(
                    clap::Arg::new("id")
                        .short('i')
                        .long("id")
                        .help("History entry ID")
                        .num_args(1)
                        .required(true),
                ),
        );
}

fn subcommand_models() -> Command {
    return Command::new("models")
        .about("List the models available in the catalog.")
        .arg(
            clap::Arg::new("id")
                .short('i')
                .long("id")
                .help("Show every input a single model accepts.")
                .num_args(1),
        );
}

fn subcommand_studio() -> Command {
    return Command::new("studio").about("Start the image studio. This is the default command.");
}

pub fn build() -> Command {
    let commands_text = help_text()
        .split('\n')
        .map(|line| {
            if line.starts_with('-') {
                return format!("  {line}");
            }
            if line.ends_with(':') {
                return Paint::new(line).underline().bold().to_string();
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
    );

    return Command::new("genstudio")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(commands_text)
        .arg_required_else_help(false)
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_credential())
        .subcommand(subcommand_debug())
        .subcommand(subcommand_generate())
        .subcommand(subcommand_history())
        .subcommand(Command::new("manpages").about("Generates manpages and outputs to stdout."))
        .subcommand(subcommand_models())
        .subcommand(subcommand_studio())
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("GENSTUDIO_CONFIG_FILE")
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)))
                .global(true)
        )
        .arg(
            Arg::new(ConfigKey::ApiURL.to_string())
                .long(ConfigKey::ApiURL.to_string())
                .env("GENSTUDIO_API_URL")
                .num_args(1)
                .help(format!("Base URL of the image generation service. [default: {}]", Config::default(ConfigKey::ApiURL)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::Model.to_string())
                .short('m')
                .long(ConfigKey::Model.to_string())
                .env("GENSTUDIO_MODEL")
                .num_args(1)
                .help("The initial model to generate with. Defaults to the first model in the catalog if not set.")
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::AspectRatio.to_string())
                .short('a')
                .long(ConfigKey::AspectRatio.to_string())
                .env("GENSTUDIO_ASPECT_RATIO")
                .num_args(1)
                .help("The initial aspect ratio. Defaults to the first ratio the model supports if not set.")
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::CatalogFile.to_string())
                .long(ConfigKey::CatalogFile.to_string())
                .env("GENSTUDIO_CATALOG_FILE")
                .num_args(1)
                .help("Absolute path to a JSON model catalog to use instead of the built in one.")
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::DataDir.to_string())
                .long(ConfigKey::DataDir.to_string())
                .env("GENSTUDIO_DATA_DIR")
                .num_args(1)
                .help(format!("Directory the API key and history are stored in. [default: {}]", Config::default(ConfigKey::DataDir)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::DownloadDir.to_string())
                .long(ConfigKey::DownloadDir.to_string())
                .env("GENSTUDIO_DOWNLOAD_DIR")
                .num_args(1)
                .help(format!("Directory downloaded images are saved to. [default: {}]", Config::default(ConfigKey::DownloadDir)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::ErrorRecoveryDelay.to_string())
                .long(ConfigKey::ErrorRecoveryDelay.to_string())
                .env("GENSTUDIO_ERROR_RECOVERY_DELAY")
                .num_args(1)
                .help(format!("Time in milliseconds a failed generation is shown on the generate button. [default: {}]", Config::default(ConfigKey::ErrorRecoveryDelay)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::HealthCheckTimeout.to_string())
                .long(ConfigKey::HealthCheckTimeout.to_string())
                .env("GENSTUDIO_HEALTH_CHECK_TIMEOUT")
                .num_args(1)
                .help(format!("Time to wait in milliseconds before timing out when checking the generation service is reachable. [default: {}]", Config::default(ConfigKey::HealthCheckTimeout)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::NotificationDuration.to_string())
                .long(ConfigKey::NotificationDuration.to_string())
                .env("GENSTUDIO_NOTIFICATION_DURATION")
                .num_args(1)
                .help(format!("Time in milliseconds notifications stay on screen. 0 keeps them until dismissed. [default: {}]", Config::default(ConfigKey::NotificationDuration)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::Page.to_string())
                .short('p')
                .long(ConfigKey::Page.to_string())
                .env("GENSTUDIO_PAGE")
                .num_args(1)
                .help(format!("The page the studio opens on. [default: {}]", Config::default(ConfigKey::Page)))
                .value_parser(PossibleValuesParser::new(PageName::VARIANTS))
                .global(true),
        );
}

/// Parses the command line and runs any one-off command. Returns true when the
/// studio should be started afterwards.
pub async fn parse() -> Result<bool> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("debug", debug_matches)) => {
            match debug_matches.subcommand() {
                Some(("log-path", _)) => {
                    let log_path = cache_dir().join("debug.log");
                    println!("{}", log_path.to_string_lossy());
                }
                Some(("enum-config", _)) => {
                    let res = ConfigKey::VARIANTS.join("\n");
                    println!("{}", res);
                }
                _ => {
                    subcommand_debug().print_long_help()?;
                }
            }

            return Ok(false);
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(false);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(false);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(false);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(false);
            }
        },
        Some(("manpages", _)) => {
            clap_mangen::Man::new(build()).render(&mut io::stdout())?;
            return Ok(false);
        }
        Some(("credential", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            match subcmd_matches.subcommand() {
                Some(("set", set_matches)) => {
                    set_credential(set_matches.get_one::<String>("value"))?;
                }
                Some(("clear", _)) => {
                    CredentialStore::new(LocalStorage::default()).clear()?;
                    println!("API key removed.");
                }
                Some(("status", _)) => {
                    if CredentialStore::new(LocalStorage::default()).is_set() {
                        println!("An API key is saved.");
                    } else {
                        println!("No API key is saved. One will be asked for on your first generation.");
                    }
                }
                _ => {
                    subcommand_credential().print_long_help()?;
                }
            }
            return Ok(false);
        }
        Some(("generate", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            let prompt = subcmd_matches
                .get_one::<String>("prompt")
                .map(|e| return e.to_string())
                .unwrap_or_default();
            let resolution = subcmd_matches.get_one::<String>("resolution");

            headless::generate(&prompt, resolution.map(|e| return e.as_str())).await?;
            return Ok(false);
        }
        Some(("history", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            match subcmd_matches.subcommand() {
                Some(("dir", _)) => {
                    println!("{}", Config::get(ConfigKey::DataDir));
                    return Ok(false);
                }
                Some(("list", _)) => {
                    print_history_list();
                    return Ok(false);
                }
                Some(("clear", clear_matches)) => {
                    clear_history(clear_matches.get_flag("yes"))?;
                    return Ok(false);
                }
                Some(("remix", remix_matches)) => {
                    let id = remix_matches
                        .get_one::<String>("id")
                        .map(|e| return e.to_string())
                        .unwrap_or_default();
                    queue_remix(&LocalStorage::default(), &id)?;
                    Config::set(ConfigKey::Page, &PageName::Image.to_string());
                }
                _ => {
                    subcommand_history().print_long_help()?;
                    return Ok(false);
                }
            }
        }
        Some(("models", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            print_models(subcmd_matches.get_one::<String>("id"))?;
            return Ok(false);
        }
        Some(("studio", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
        }
        _ => {
            Config::load(build(), vec![&matches]).await?;
        }
    }

    return Ok(true);
}
