//! Admin session commands.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (the session is kept in the data directory until logout)
//! toppers admin login -e admin@toppers.example -p '...'
//!
//! # Who is signed in
//! toppers admin whoami
//!
//! # Dashboard counts
//! toppers admin stats
//!
//! # Hash a password for the admin_users.password_hash column
//! toppers admin hash-password '...'
//! ```

use clap::Subcommand;
use secrecy::SecretString;
use tracing::{info, warn};

use toppers_catalog::auth::{Argon2Verifier, LoginOutcome, hash_password};
use toppers_catalog::showcase::CatalogStats;

use super::{CommandResult, Context};
use crate::output;

#[derive(Subcommand)]
pub enum AdminAction {
    /// Sign in as an admin
    Login {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin password
        #[arg(short, long)]
        password: String,
    },
    /// Sign out
    Logout,
    /// Show the signed-in admin
    Whoami,
    /// Product, category, favorite and featured counts (admin)
    Stats,
    /// Print the Argon2 hash of a password
    HashPassword {
        /// Password to hash
        password: String,
    },
}

pub async fn run(action: AdminAction) -> CommandResult {
    match action {
        AdminAction::Login { email, password } => {
            login(&Context::from_env()?, &email, SecretString::from(password)).await
        }
        AdminAction::Logout => {
            Context::from_env()?.session()?.logout()?;
            info!("Signed out");
            Ok(())
        }
        AdminAction::Whoami => {
            let ctx = Context::from_env()?;
            let session = ctx.session()?;
            match session.user() {
                Some(user) => output::json(user),
                None => Err("Not signed in".into()),
            }
        }
        AdminAction::Stats => stats(&Context::from_env()?).await,
        // Hashing needs no backend
        AdminAction::HashPassword { password } => output::json(&hash_password(&password)?),
    }
}

async fn login(ctx: &Context, email: &str, password: SecretString) -> CommandResult {
    let mut session = ctx.session()?;
    let outcome = session
        .login(&ctx.client, &Argon2Verifier, email, &password)
        .await?;

    match outcome {
        LoginOutcome::Authenticated(user) => {
            info!(email = %user.email, "Signed in");
            output::json(&user)
        }
        LoginOutcome::Rejected(rejection) => {
            warn!(?rejection, "Login rejected");
            Err(rejection.message().into())
        }
    }
}

async fn stats(ctx: &Context) -> CommandResult {
    ctx.require_admin()?;
    let products = ctx.client.products().await?;
    let categories = ctx.client.categories().await?;
    let favorites = ctx.favorites()?;

    output::json(&CatalogStats::compute(
        products.as_slice(),
        categories.len(),
        favorites.ids(),
    ))
}
