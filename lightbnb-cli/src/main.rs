//! lightbnb CLI - operator access to the LightBnB data layer
//!
//! Runs a single query against the configured PostgreSQL database and
//! prints the result as JSON:
//! - `user` lookups and inserts
//! - `reservations` past stays for a guest
//! - `properties` filtered listings
//! - `property` single lookups and inserts

use std::fmt;
use std::io::Read;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use lightbnb_db::{
    load_dotenv, DatabaseConfig, DbError, NewProperty, NewUser, PgStore, PropertySearch, Store,
    DEFAULT_LIMIT,
};
use serde_json::Value;
use tracing::debug;

mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "lightbnb",
    author,
    version,
    about = "Query and insert LightBnB users, properties and reservations",
    long_about = "Runs one query against the LightBnB PostgreSQL database and prints JSON. \
                  Connection settings come from DATABASE_URL, the PG* variables, \
                  ./lightbnb.toml or ~/.lightbnb/config.toml."
)]
struct Cli {
    /// Enable debug logging, including generated SQL
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Look up or add users
    User(UserArgs),
    /// List a guest's past reservations
    Reservations(ReservationsArgs),
    /// List properties, cheapest first
    Properties(PropertiesArgs),
    /// Show or add a single property
    Property(PropertyArgs),
}

#[derive(Args, Debug)]
struct UserArgs {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand)]
enum UserCommand {
    /// Find a user by exact email
    Email {
        /// Email address to look up
        email: String,
    },
    /// Find a user by id
    Id {
        /// User id
        id: i32,
    },
    /// Add a user
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// Stored as given
        #[arg(long, env = "LIGHTBNB_NEW_USER_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

// Keeps the new user's password out of `--debug` output
impl fmt::Debug for UserCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email { email } => f.debug_struct("Email").field("email", email).finish(),
            Self::Id { id } => f.debug_struct("Id").field("id", id).finish(),
            Self::Add { name, email, .. } => f
                .debug_struct("Add")
                .field("name", name)
                .field("email", email)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

#[derive(Args, Debug)]
struct ReservationsArgs {
    /// Guest user id
    guest_id: i32,

    /// Maximum number of reservations
    #[arg(long, default_value_t = DEFAULT_LIMIT)]
    limit: u32,
}

#[derive(Args, Debug)]
struct PropertiesArgs {
    /// Case-insensitive substring of the city
    #[arg(long)]
    city: Option<String>,

    /// Only properties owned by this user id
    #[arg(long)]
    owner_id: Option<i32>,

    /// Minimum nightly price in dollars
    #[arg(long)]
    min_price: Option<f64>,

    /// Maximum nightly price in dollars
    #[arg(long)]
    max_price: Option<f64>,

    /// Minimum average review rating
    #[arg(long)]
    min_rating: Option<f64>,

    /// Maximum number of properties
    #[arg(long, default_value_t = DEFAULT_LIMIT)]
    limit: u32,
}

impl PropertiesArgs {
    fn search(&self) -> PropertySearch {
        PropertySearch {
            city: self.city.clone(),
            owner_id: self.owner_id,
            minimum_price_per_night: self.min_price,
            maximum_price_per_night: self.max_price,
            minimum_rating: self.min_rating,
        }
    }
}

#[derive(Args, Debug)]
struct PropertyArgs {
    #[command(subcommand)]
    command: PropertyCommand,
}

#[derive(Subcommand, Debug)]
enum PropertyCommand {
    /// Show a property with its average rating
    Show {
        /// Property id
        id: i32,
    },
    /// Add a property from a JSON document
    Add {
        /// JSON file with the property fields (reads stdin when omitted)
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_setup::init(&tracing_setup::TracingConfig { debug: cli.debug }).ok();

    load_dotenv();
    let config = DatabaseConfig::load()?;
    let store = PgStore::connect(&config)
        .await
        .context("Failed to connect to the LightBnB database")?;

    let result = run(&store, cli.command).await;
    store.close().await;

    println!("{}", serde_json::to_string_pretty(&result?)?);
    Ok(())
}

/// Execute one command and return its JSON output
async fn run(store: &dyn Store, command: Commands) -> Result<Value> {
    debug!(?command, "running command");
    let value = match command {
        Commands::User(args) => match args.command {
            UserCommand::Email { email } => {
                let user = store
                    .get_user_with_email(&email)
                    .await?
                    .ok_or_else(|| DbError::not_found("user", &email))?;
                serde_json::to_value(user)?
            }
            UserCommand::Id { id } => {
                let user = store
                    .get_user_with_id(id)
                    .await?
                    .ok_or_else(|| DbError::not_found("user", id))?;
                serde_json::to_value(user)?
            }
            UserCommand::Add {
                name,
                email,
                password,
            } => {
                let user = store
                    .add_user(NewUser::new(name, email.clone(), password))
                    .await
                    .map_err(|e| {
                        if e.is_unique_violation() {
                            anyhow!("A user with email {} already exists", email)
                        } else {
                            e.into()
                        }
                    })?;
                serde_json::to_value(user)?
            }
        },
        Commands::Reservations(args) => {
            let reservations = store.get_all_reservations(args.guest_id, args.limit).await?;
            serde_json::to_value(reservations)?
        }
        Commands::Properties(args) => {
            let properties = store.get_all_properties(&args.search(), args.limit).await?;
            serde_json::to_value(properties)?
        }
        Commands::Property(args) => match args.command {
            PropertyCommand::Show { id } => {
                let property = store
                    .get_property_with_id(id)
                    .await?
                    .ok_or_else(|| DbError::not_found("property", id))?;
                serde_json::to_value(property)?
            }
            PropertyCommand::Add { file } => {
                let property = store.add_property(read_new_property(file)?).await?;
                serde_json::to_value(property)?
            }
        },
    };
    Ok(value)
}

fn read_new_property(file: Option<PathBuf>) -> Result<NewProperty> {
    let contents = match file {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read property JSON from stdin")?;
            buf
        }
    };
    serde_json::from_str(&contents).context("Invalid property JSON")
}
