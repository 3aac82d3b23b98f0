use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use server_api::CredentialHasher;
use shared::{domain::AuthCode, protocol::GuestRecord};
use storage::{NewGuestRow, Storage};

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/easywed.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    CreateGuest {
        #[arg(long)]
        user_name: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value_t = 1)]
        invitees: u32,
        #[arg(long, default_value = "")]
        country: String,
        #[arg(long, default_value = "")]
        language: String,
        /// Grant every API permission instead of guest read/update.
        #[arg(long)]
        admin: bool,
    },
    ListGuests,
    /// Invalidate one issued token, or every token of `--user-name`.
    RevokeToken {
        token: Option<String>,
        #[arg(long, conflicts_with = "token")]
        user_name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::CreateGuest {
            user_name,
            password,
            invitees,
            country,
            language,
            admin,
        } => {
            let user_name = user_name.trim();
            if user_name.is_empty() {
                bail!("user name must not be empty");
            }
            let password_hash = CredentialHasher::new().hash_password(&password)?;
            let auth_code = if admin { AuthCode::ADMIN } else { AuthCode::GUEST };
            let record = GuestRecord {
                invitees,
                ..GuestRecord::default()
            };
            let id = storage
                .create_guest(&NewGuestRow {
                    user_name,
                    password_hash: &password_hash,
                    country: &country,
                    language: &language,
                    record: &record,
                    auth_code,
                })
                .await?
                .with_context(|| format!("user name '{user_name}' is already taken"))?;
            println!(
                "created guest id={id} user_name={user_name} auth_code={}",
                auth_code.0
            );
        }
        Command::ListGuests => {
            for guest in storage.list_guests().await? {
                println!(
                    "{}\t{}\tinvitees={}\tconfirmed={}\tauth_code={}",
                    guest.id,
                    guest.user_name,
                    guest.record.invitees,
                    guest.record.confirmed,
                    guest.auth_code.0
                );
            }
        }
        Command::RevokeToken { token, user_name } => match (token, user_name) {
            (Some(token), _) => {
                if !storage.set_token_validity(&token, false).await? {
                    bail!("unknown token");
                }
                println!("token revoked");
            }
            (None, Some(user_name)) => {
                let revoked = storage.revoke_tokens_for_user(&user_name).await?;
                println!("revoked {revoked} token(s) for {user_name}");
            }
            (None, None) => bail!("pass a token or --user-name"),
        },
    }

    Ok(())
}
