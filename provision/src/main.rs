use anyhow::{anyhow, Result};
use clap::Parser;
use common::{AdminSettings, NewAccount};
use serde::Deserialize;

#[derive(Parser)]
#[command(name = "provision", about = "Create the initial administrator account")]
struct Args {
    #[arg(long, default_value = "config")]
    config_file: String,

    /// Overrides `admin_email` from the config.
    #[arg(long)]
    email: Option<String>,

    /// Overrides `admin_password` from the config.
    #[arg(long)]
    password: Option<String>,
}

#[derive(Deserialize)]
struct ProvisionConfig {
    database_url: String,
    #[serde(flatten)]
    admin: AdminSettings,
}

fn load_config(config_file: &str) -> Result<ProvisionConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(config_file).required(false))
        .add_source(config::Environment::default())
        .build()?;
    let cfg: ProvisionConfig = settings.try_deserialize()?;
    Ok(cfg)
}

fn admin_account(mut admin: AdminSettings, args: &Args) -> Result<NewAccount> {
    if let Some(email) = &args.email {
        admin.admin_email = email.clone();
    }
    if let Some(password) = &args.password {
        admin.admin_password = password.clone();
    }
    admin
        .account()
        .ok_or_else(|| anyhow!("No admin password given. Set ADMIN_PASSWORD or pass --password"))
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("provision=info"));

    let args = Args::parse();
    let cfg = load_config(&args.config_file)?;

    let pool = db::init_pool(&cfg.database_url).await?;
    db::create_tables(&pool).await?;

    let account = admin_account(cfg.admin, &args)?;
    let user_id = db::create_account(&pool, &account).await?;
    log::info!("Created admin {} with id {}", account.email, user_id);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Role;

    fn settings(password: &str) -> AdminSettings {
        AdminSettings {
            admin_password: password.to_string(),
            ..Default::default()
        }
    }

    fn args(email: Option<&str>, password: Option<&str>) -> Args {
        Args {
            config_file: "config".to_string(),
            email: email.map(str::to_string),
            password: password.map(str::to_string),
        }
    }

    #[test]
    fn account_from_config_is_unlimited_admin() {
        let account = admin_account(settings("segredo"), &args(None, None)).unwrap();
        assert_eq!(account.email, "contato@webcontato.com.br");
        assert_eq!(account.role, Role::Admin);
        assert_eq!(account.daily_limit, 0);
    }

    #[test]
    fn arguments_override_config() {
        let account = admin_account(
            settings(""),
            &args(Some("chefe@example.com"), Some("outra-senha")),
        )
        .unwrap();
        assert_eq!(account.email, "chefe@example.com");
        assert_eq!(account.password, "outra-senha");
    }

    #[test]
    fn missing_password_is_an_error() {
        assert!(admin_account(settings(""), &args(None, None)).is_err());
    }
}
