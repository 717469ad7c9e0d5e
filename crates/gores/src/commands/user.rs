//! User management.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use gores_core::db::User;

use super::open_database;
use crate::cli::{UserAction, UserCommand};
use crate::config::Config;

pub fn execute(cmd: UserCommand, config: &Config) -> Result<()> {
    let db = open_database(config)?;
    if !db.has_schema()? {
        bail!("Database has no schema yet, run `gores migrate` first");
    }

    match cmd.action {
        UserAction::Add {
            name,
            password,
            email,
            phone,
        } => {
            let user = User {
                name,
                email,
                phone,
                password,
            };
            db.upsert_user(&user).context("Failed to save user")?;
            println!("{} saved user {}", "✓".green(), user.name.bold());
        }
        UserAction::Show { name } => match db.get_user(&name)? {
            Some(user) => {
                println!("{}", user.name.bold());
                println!("  Email: {}", or_dash(&user.email));
                println!("  Phone: {}", or_dash(&user.phone));
                if config.booking.admin_users.iter().any(|a| a.eq_ignore_ascii_case(&user.name)) {
                    println!("  {}", "admin".yellow());
                }
            }
            None => bail!("No such user: {name}"),
        },
    }
    Ok(())
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}
