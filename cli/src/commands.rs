use std::{path::Path, sync::Arc};

use api::{ApiClient, Config};
use dashboard::{Dashboard, Export};
use secrecy::SecretString;
use session::{LogoutPolicy, SessionStore};
use types::{Priority, Result};

use crate::{Command, LoginArgs};

pub async fn run(config: Config, command: Command) -> Result<()> {
    let client = ApiClient::new(&config)?;
    let store = SessionStore::start(client);
    let session = store.ready().await;

    match command {
        Command::Whoami => {
            match session.identity() {
                Some(identity) => println!(
                    "{} <{}> ({})",
                    identity.full_name(),
                    identity.email,
                    identity.role
                ),
                None => println!("not signed in"),
            }
            Ok(())
        }
        Command::Dashboard(login) => {
            signed_in(&store, &login, |store| async move {
                let dashboard = Dashboard::load(store.client(), &store.snapshot()).await?;
                print_dashboard(&dashboard);
                Ok(())
            })
            .await
        }
        Command::Export { login, out } => {
            signed_in(&store, &login, |store| async move {
                let export = Export::fetch(store.client(), &store.snapshot()).await?;
                let path = match out.as_deref() {
                    Some(path) if !path.is_dir() => {
                        export.save_as(path).await?;
                        path.to_path_buf()
                    }
                    Some(dir) => export.save_in(dir).await?,
                    None => export.save_in(Path::new(".")).await?,
                };
                println!("Exported {} complaints to {}", export.rows, path.display());
                Ok(())
            })
            .await
        }
    }
}

/// Log in, run `action`, and log out again whether or not it succeeded.
async fn signed_in<F, Fut>(store: &Arc<SessionStore>, login: &LoginArgs, action: F) -> Result<()>
where
    F: FnOnce(Arc<SessionStore>) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let password = SecretString::from(login.password.clone());
    store
        .login(&login.email, &password, login.role.into())
        .await?;

    let result = action(Arc::clone(store)).await;
    store.logout(LogoutPolicy::ForceClear).await;
    result
}

fn print_dashboard(dashboard: &Dashboard) {
    let stats = &dashboard.stats;

    println!("Welcome back, {}!", dashboard.admin.first_name);
    println!();
    println!("Total complaints  {}", stats.total_complaints);
    println!("Pending           {}", stats.pending);
    println!("Resolved          {}", stats.resolved);
    println!("Total users       {}", stats.total_users);

    println!();
    println!("Recent complaints");
    if dashboard.recent.is_empty() {
        println!("  No complaints found");
    }
    for complaint in &dashboard.recent {
        println!(
            "  {}  {}  [{}]  {}  {}",
            complaint.created_at.strftime("%Y-%m-%d"),
            complaint.title,
            complaint.category,
            complaint.status,
            complaint
                .priority
                .as_ref()
                .map(Priority::as_str)
                .unwrap_or_default(),
        );
    }

    println!();
    println!("Top categories");
    for category in &dashboard.top_categories {
        println!(
            "  {:<24} {:>4}  {:>5.1}%",
            category.name, category.count, category.percentage
        );
    }
}
