/// Command-line inspector for native builds.
///
/// Works on a local checkout of the static data directory and keeps unsaved
/// edits in a state directory, the same way the browser editor uses
/// localStorage.
#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::path::PathBuf;

    use clap::{Parser, Subcommand};
    use mapa_tiana::catalog::DirectorySource;
    use mapa_tiana::config::ConfigError;
    use mapa_tiana::persistence::FileStorage;
    use mapa_tiana::viewer::labels;
    use mapa_tiana::{AppConfig, AssociationStore, DataError, LogLevel};

    type CliStore = AssociationStore<FileStorage, DirectorySource>;

    #[derive(Parser)]
    #[command(name = "mapa-tiana")]
    #[command(version = env!("CARGO_PKG_VERSION"))]
    #[command(about = "Inspect and edit the neighborhood association map data", long_about = None)]
    pub struct Cli {
        /// Directory holding index.json or associacions.json
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Directory for unsaved edits
        #[arg(short, long)]
        state_dir: Option<PathBuf>,

        /// Name of the unsaved-edits slot
        #[arg(long)]
        storage_key: Option<String>,

        /// Configuration file (defaults to the user config directory)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Only show published data, ignoring unsaved edits
        #[arg(long)]
        viewer: bool,

        /// Log verbosity (overrides the configuration)
        #[arg(long, value_enum)]
        log_level: Option<LogLevel>,

        #[command(subcommand)]
        command: Command,
    }

    #[derive(Subcommand)]
    enum Command {
        /// List associations in the working copy
        List,
        /// Show whether there are unsaved edits and which associations changed
        Status,
        /// Write one association, or the whole collection, as JSON
        Export {
            /// Association id (whole collection if omitted)
            #[arg(long)]
            id: Option<String>,
            /// Output directory (prints to stdout if omitted)
            #[arg(short, long)]
            out: Option<PathBuf>,
        },
        /// Delete an association from the working copy
        Delete {
            /// Association id
            id: String,
        },
        /// Drop all unsaved edits
        Discard,
        /// Print label positions (polygon centroids)
        Labels,
        /// Show or save the effective configuration
        #[command(subcommand)]
        Config(ConfigCommand),
    }

    #[derive(Subcommand)]
    enum ConfigCommand {
        /// Print the configuration, command-line overrides included
        Show,
        /// Save the configuration, command-line overrides included
        Init {
            /// Replace an existing file
            #[arg(long)]
            force: bool,
        },
    }

    #[derive(Debug, thiserror::Error)]
    pub enum CliError {
        #[error(transparent)]
        Data(#[from] DataError),
        #[error(transparent)]
        Config(#[from] ConfigError),
        #[error("{0}")]
        Usage(String),
    }

    impl Cli {
        fn config_path(&self) -> Option<PathBuf> {
            self.config.clone().or_else(AppConfig::default_path)
        }

        fn config(&self) -> AppConfig {
            let mut config = AppConfig::load_or_default(self.config.as_deref());
            if let Some(level) = self.log_level {
                config.log_level = level;
            }
            if let Some(data_dir) = &self.data_dir {
                config.data_base_url = data_dir.display().to_string();
            }
            if let Some(key) = &self.storage_key {
                config.storage_key = key.clone();
            }
            if self.viewer {
                config.ignore_local_storage = true;
            }
            config
        }

        fn store(&self, config: &AppConfig) -> CliStore {
            let data_dir = PathBuf::from(&config.data_base_url);
            let state_dir = self
                .state_dir
                .clone()
                .or_else(FileStorage::default_dir)
                .unwrap_or_else(|| PathBuf::from("."));

            log::debug!("Data directory {:?}, state directory {:?}", data_dir, state_dir);
            AssociationStore::from_config(
                FileStorage::new(state_dir),
                DirectorySource::new(data_dir),
                config,
            )
        }

        fn run_config(&self, command: &ConfigCommand, config: &AppConfig) -> Result<(), CliError> {
            match command {
                ConfigCommand::Show => println!("{}", config.to_json().map_err(ConfigError::from)?),
                ConfigCommand::Init { force } => {
                    let path = self.config_path().ok_or_else(|| {
                        CliError::Usage("no config directory, pass --config".to_string())
                    })?;
                    if path.exists() && !force {
                        return Err(CliError::Usage(format!(
                            "{} already exists, use --force to replace it",
                            path.display()
                        )));
                    }
                    config.write_to(&path)?;
                    println!("Wrote {}", path.display());
                }
            }
            Ok(())
        }
    }

    pub fn run(cli: Cli) -> Result<(), CliError> {
        let config = cli.config();
        mapa_tiana::init_logging(config.log_level);

        if let Command::Config(command) = &cli.command {
            return cli.run_config(command, &config);
        }

        let mut store = cli.store(&config);
        pollster::block_on(store.load_all());

        match &cli.command {
            Command::List => {
                for a in store.associations() {
                    let marker = if store.is_modified(&a.id) { "*" } else { " " };
                    println!(
                        "{} {:<32} {:<8} {} ({} vertices)",
                        marker,
                        a.id,
                        a.abreviacio,
                        a.nom,
                        a.poligon.len()
                    );
                }
            }
            Command::Status => {
                let changed = store.diff();
                println!(
                    "{} associations, {}",
                    store.associations().len(),
                    if store.is_dirty() {
                        "unsaved edits"
                    } else {
                        "no unsaved edits"
                    }
                );
                for id in changed {
                    println!("  modified: {}", id);
                }
            }
            Command::Export { id, out } => {
                let document = store.export_entity(id.as_deref())?;
                match out {
                    Some(dir) => {
                        let path = dir.join(&document.filename);
                        std::fs::create_dir_all(dir)
                            .and_then(|()| std::fs::write(&path, &document.contents))
                            .map_err(DataError::from)?;
                        println!("Wrote {}", path.display());
                    }
                    None => println!("{}", document.contents),
                }
            }
            Command::Delete { id } => {
                let removed = store.delete(id)?;
                println!("Deleted {} ({})", removed.id, removed.nom);
                if let Some(e) = store.persistence_error() {
                    log::warn!("Deletion is not persisted: {}", e);
                }
            }
            Command::Discard => {
                pollster::block_on(store.discard());
                println!("Discarded unsaved edits");
            }
            Command::Config(_) => {}
            Command::Labels => {
                for label in labels(store.associations()) {
                    println!(
                        "{:<8} {:.6} {:.6}",
                        label.text, label.position.lat, label.position.lng
                    );
                }
            }
        }
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use clap::Parser;

    if let Err(e) = cli::run(cli::Cli::parse()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

// WASM doesn't use main(), it uses wasm_bindgen's start function
#[cfg(target_arch = "wasm32")]
fn main() {}
