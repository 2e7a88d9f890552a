//! geocat command-line client.
//!
//! Loads the catalog into the in-memory store (from `storage.fixtures`)
//! and answers one query against it.
//!
//! # Usage
//!
//! ```bash
//! geocat --config geocat.yaml admin-oper --id 10 --user 2 --ip 10.0.0.4
//! geocat --config geocat.yaml user --email admin@example.com
//! geocat --config geocat.yaml owners --metadata 10 11 --profile Editor
//! ```

use std::net::IpAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::{ArgGroup, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use geocat_domain::{AccessManager, Requester, UserLookup, UserSession};
use geocat_server::observability::{init_logging, LoggingConfig};
use geocat_server::{AdminOperParams, CatalogFixture, GetAdminOperHandler, ServerConfig};
use geocat_storage::{MemoryCatalogStore, MetadataId, Profile, User, UserId};

/// geocat - metadata catalog access-control queries
#[derive(Parser, Debug)]
#[command(name = "geocat")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the privilege matrix of a metadata record
    #[command(group(ArgGroup::new("record").required(true).args(["id", "uuid"])))]
    AdminOper {
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        uuid: Option<String>,
        /// Requesting user; anonymous when omitted
        #[arg(long)]
        user: Option<UserId>,
        /// Client address of the requester
        #[arg(long, default_value = "127.0.0.1")]
        ip: IpAddr,
    },
    /// Look a user up by id or email
    #[command(group(ArgGroup::new("key").required(true).args(["id", "email"])))]
    User {
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// List members of the owning groups of metadata records
    Owners {
        #[arg(long, required = true, num_args = 1..)]
        metadata: Vec<MetadataId>,
        #[arg(long)]
        profile: Option<Profile>,
    },
}

#[derive(Serialize)]
struct OwnerRow {
    metadata_id: MetadataId,
    user: User,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = if let Some(config_path) = &args.config {
        ServerConfig::load(config_path)?
    } else {
        ServerConfig::from_env()?
    };

    init_logging(LoggingConfig::from_settings(&config.logging)?)?;
    info!(version = env!("CARGO_PKG_VERSION"), "starting geocat");

    let store = MemoryCatalogStore::new_shared();
    if let Some(path) = &config.storage.fixtures {
        CatalogFixture::from_file(path)?
            .load_into(store.as_ref())
            .await
            .with_context(|| format!("loading catalog fixture {path}"))?;
    }

    let users = UserLookup::new(Arc::clone(&store));

    let output = match args.command {
        Command::AdminOper { id, uuid, user, ip } => {
            let session = match user {
                Some(user_id) => {
                    let user = users
                        .find_by_id(user_id)
                        .await?
                        .with_context(|| format!("unknown user {user_id}"))?;
                    UserSession::authenticated(user.id, user.username, user.profile)
                }
                None => UserSession::anonymous(),
            };
            let access = AccessManager::new(Arc::clone(&store))
                .with_intranet(config.access.intranet()?);
            let handler = GetAdminOperHandler::new(Arc::clone(&store), Arc::new(access));
            let response = handler
                .exec(&AdminOperParams { id, uuid }, &Requester::new(session, ip))
                .await?;
            response.to_json_pretty()?
        }
        Command::User { id, email } => {
            let user = match (id, email) {
                (Some(id), _) => users.find_by_id_str(&id).await?,
                (None, Some(email)) => users.find_by_email(&email).await?,
                (None, None) => None,
            };
            serde_json::to_string_pretty(&user)?
        }
        Command::Owners { metadata, profile } => {
            let rows: Vec<OwnerRow> = users
                .find_owners_of_metadata_ids(&metadata, profile, None)
                .await?
                .into_iter()
                .map(|(metadata_id, user)| OwnerRow { metadata_id, user })
                .collect();
            serde_json::to_string_pretty(&rows)?
        }
    };

    println!("{output}");
    Ok(())
}
