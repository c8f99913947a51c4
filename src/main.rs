use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use draft_meta::calculate::{
    self, cards, decklists, length, mulligans, overview, speed,
};
use draft_meta::config::AppConfig;
use draft_meta::models::{ArchId, ArchetypeFilter};
use draft_meta::storage::{FileStore, StatsStore, StorageConfig};

#[derive(Parser)]
#[command(name = "draft-meta")]
#[command(about = "Draft format statistics: win rates, curves, speed, and pick order")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: String,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Pretty-print JSON results
    #[arg(long)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config.toml
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// List active sets from the registry
    Sets {
        /// Only show the most recent set by release date
        #[arg(long)]
        latest: bool,
    },

    /// Full card identity table for a set
    CardInfo {
        /// Set abbreviation
        set: Option<String>,
    },

    /// Card names matching one color letter (W/U/B/R/G/C)
    CardsWithColor {
        color: char,

        set: Option<String>,

        /// Only cards that are exactly this color
        #[arg(long)]
        exact: bool,

        /// Include lands with the colorless cards
        #[arg(long)]
        include_lands: bool,
    },

    /// One archetype's totals and win rate
    ArchRecord {
        /// Archetype label, e.g. "WU" or "BRG2"
        label: String,

        set: Option<String>,
    },

    /// Archetype (id, label) pairs for a set
    ArchLabels {
        set: Option<String>,

        /// Restrict to one base color combination
        #[arg(long)]
        colors: Option<String>,
    },

    /// Mean lands and n-drops per deck for an archetype
    Curve {
        label: String,

        set: Option<String>,
    },

    /// Mean mana value of an archetype's decks
    ManaValue {
        label: String,

        set: Option<String>,

        /// Count lands (at mana value 0)
        #[arg(long)]
        include_lands: bool,
    },

    /// Average win/loss/game length and speed for an archetype
    Speed {
        label: String,

        set: Option<String>,
    },

    /// Record and win rate by game length
    Length {
        label: String,

        set: Option<String>,
    },

    /// Win rates by mulligan count, split by play/draw
    Mulligans {
        label: String,

        set: Option<String>,
    },

    /// Play/draw record per archetype
    PlayDraw {
        set: Option<String>,
    },

    /// Games-played win rates for all cards
    InDeck {
        set: Option<String>,

        /// Archetype label or "ALL"
        #[arg(long, default_value = "ALL")]
        arch: String,

        #[arg(long, default_value = "1")]
        min_copies: u32,

        #[arg(long, default_value = "40")]
        max_copies: u32,
    },

    /// One card's record split by copy count
    Copies {
        /// Card name (case sensitive)
        card: String,

        set: Option<String>,

        #[arg(long, default_value = "ALL")]
        arch: String,
    },

    /// Games-in-hand win rates
    InHand {
        set: Option<String>,

        #[arg(long, default_value = "ALL")]
        arch: String,
    },

    /// Average win shares per appearance
    WinShares {
        set: Option<String>,

        #[arg(long, default_value = "ALL")]
        arch: String,
    },

    /// Mean pick order per card
    MeanPick {
        set: Option<String>,
    },

    /// Average decklist for an archetype or color group
    MeanDecklist {
        /// "ALL", a color group like "WB", or an archetype like "WB2"
        group: String,

        set: Option<String>,

        #[arg(long, default_value = "0")]
        min_wins: u32,

        #[arg(long, default_value = "7")]
        max_wins: u32,

        #[arg(long, default_value = "0")]
        min_rank: u8,

        #[arg(long, default_value = "6")]
        max_rank: u8,
    },

    /// Draft counts and meta share per color group
    Meta {
        set: Option<String>,

        #[arg(long, default_value = "0")]
        min_rank: u8,

        #[arg(long, default_value = "6")]
        max_rank: u8,
    },

    /// The 33-row format overview table
    Overview {
        set: Option<String>,
    },

    /// The composite per-card stats table
    CardTable {
        set: Option<String>,

        #[arg(long, default_value = "ALL")]
        arch: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = PathBuf::from(&cli.config);
    let mut config = if config_path.exists() {
        AppConfig::from_file(&config_path)
            .with_context(|| format!("Failed to load config from {}", cli.config))?
    } else {
        AppConfig::default()
    };

    // CLI flags override file values.
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = PathBuf::from(data_dir);
    }
    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone();
    }
    let pretty = cli.pretty || config.output.pretty;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let store = FileStore::new(StorageConfig::new(config.data_dir.clone()));

    match cli.command {
        Commands::InitConfig { force } => {
            if config_path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", cli.config);
            }
            let toml_str = toml::to_string_pretty(&AppConfig::default())?;
            std::fs::write(&config_path, toml_str)
                .with_context(|| format!("Failed to write {}", cli.config))?;
            println!("Wrote {}", cli.config);
        }
        Commands::Sets { latest } => {
            if latest {
                let set = calculate::most_recent_set(&store)?;
                print_json(&set, pretty)?;
            } else {
                let sets = calculate::active_sets(&store)?;
                print_json(&sets, pretty)?;
            }
        }
        Commands::CardInfo { set } => {
            let set = resolve_set(set, &config)?;
            let cards = store.cards(&set)?;
            print_json(&cards, pretty)?;
        }
        Commands::CardsWithColor {
            color,
            set,
            exact,
            include_lands,
        } => {
            let set = resolve_set(set, &config)?;
            let names = cards::cards_with_color(&store, &set, color, !exact, include_lands)?;
            print_json(&names, pretty)?;
        }
        Commands::ArchRecord { label, set } => {
            let set = resolve_set(set, &config)?;
            let arch_id = ArchId::from_label(&label)?;
            let record = overview::archetype_record(&store, &set, arch_id)?;
            print_json(&record, pretty)?;
        }
        Commands::ArchLabels { set, colors } => {
            let set = resolve_set(set, &config)?;
            let labels = overview::archetype_labels(&store, &set, colors.as_deref())?;
            print_json(&labels, pretty)?;
        }
        Commands::Curve { label, set } => {
            let set = resolve_set(set, &config)?;
            let filter = ArchetypeFilter::from_label(&label)?;
            let curve = speed::average_curve(&store, &set, &filter)?;
            print_json(&curve, pretty)?;
        }
        Commands::ManaValue {
            label,
            set,
            include_lands,
        } => {
            let set = resolve_set(set, &config)?;
            let filter = ArchetypeFilter::from_label(&label)?;
            let mean = speed::average_mana_value(&store, &set, &filter, include_lands)?;
            print_json(&mean, pretty)?;
        }
        Commands::Speed { label, set } => {
            let set = resolve_set(set, &config)?;
            let filter = ArchetypeFilter::from_label(&label)?;
            let record = speed::average_speed(&store, &set, &filter)?;
            print_json(&record, pretty)?;
        }
        Commands::Length { label, set } => {
            let set = resolve_set(set, &config)?;
            let filter = ArchetypeFilter::from_label(&label)?;
            let buckets = length::record_by_length(&store, &set, &filter)?;
            print_json(&buckets, pretty)?;
        }
        Commands::Mulligans { label, set } => {
            let set = resolve_set(set, &config)?;
            let filter = ArchetypeFilter::from_label(&label)?;
            let table = mulligans::win_rates_by_mulligans(&store, &set, &filter)?;
            print_json(&table, pretty)?;
        }
        Commands::PlayDraw { set } => {
            let set = resolve_set(set, &config)?;
            let splits = mulligans::play_draw_splits(&store, &set)?;
            print_json(&splits, pretty)?;
        }
        Commands::InDeck {
            set,
            arch,
            min_copies,
            max_copies,
        } => {
            let set = resolve_set(set, &config)?;
            let filter = ArchetypeFilter::from_label(&arch)?;
            let rates = cards::in_deck_win_rates(&store, &set, &filter, min_copies, max_copies)?;
            print_json(&rates, pretty)?;
        }
        Commands::Copies { card, set, arch } => {
            let set = resolve_set(set, &config)?;
            let filter = ArchetypeFilter::from_label(&arch)?;
            let buckets = cards::record_by_copies(&store, &set, &card, &filter)?;
            print_json(&buckets, pretty)?;
        }
        Commands::InHand { set, arch } => {
            let set = resolve_set(set, &config)?;
            let filter = ArchetypeFilter::from_label(&arch)?;
            let rates = cards::games_in_hand_win_rates(&store, &set, &filter)?;
            print_json(&rates, pretty)?;
        }
        Commands::WinShares { set, arch } => {
            let set = resolve_set(set, &config)?;
            let filter = ArchetypeFilter::from_label(&arch)?;
            let shares = cards::average_win_shares(&store, &set, &filter)?;
            print_json(&shares, pretty)?;
        }
        Commands::MeanPick { set } => {
            let set = resolve_set(set, &config)?;
            let picks = cards::mean_pick_order(&store, &set)?;
            print_json(&picks, pretty)?;
        }
        Commands::MeanDecklist {
            group,
            set,
            min_wins,
            max_wins,
            min_rank,
            max_rank,
        } => {
            let set = resolve_set(set, &config)?;
            let group = decklists::DeckGroup::from_label(&group)?;
            let filters = decklists::DeckFilters {
                min_wins,
                max_wins,
                min_rank,
                max_rank,
            };
            let mean = decklists::mean_decklist(&store, &set, group, filters)?;
            print_json(&mean, pretty)?;
        }
        Commands::Meta {
            set,
            min_rank,
            max_rank,
        } => {
            let set = resolve_set(set, &config)?;
            let meta = decklists::meta_distribution(&store, &set, min_rank, max_rank)?;
            print_json(&meta, pretty)?;
        }
        Commands::Overview { set } => {
            let set = resolve_set(set, &config)?;
            let table = overview::format_overview(&store, &set)?;
            print_json(&table, pretty)?;
        }
        Commands::CardTable { set, arch } => {
            let set = resolve_set(set, &config)?;
            let filter = ArchetypeFilter::from_label(&arch)?;
            let table = cards::card_table(&store, &set, &filter)?;
            print_json(&table, pretty)?;
        }
    }

    Ok(())
}

/// Resolve the set abbreviation from the command line or the configured
/// default.
fn resolve_set(set: Option<String>, config: &AppConfig) -> Result<String> {
    set.or_else(|| config.default_set.clone())
        .map(|s| s.to_lowercase())
        .context("No set given and no default_set configured")
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", json);
    Ok(())
}
