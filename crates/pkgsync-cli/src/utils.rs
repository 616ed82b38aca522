use std::{
    fmt::Display,
    sync::{LazyLock, PoisonError, RwLock},
};

use dialoguer::Password;
use nu_ansi_term::Color;
use pkgsync_config::repository::RepositoryConfig;
use pkgsync_core::{PkgsyncError, PkgsyncResult};

pub static COLOR: LazyLock<RwLock<bool>> = LazyLock::new(|| RwLock::new(true));

pub fn set_color(enabled: bool) {
    *COLOR.write().unwrap_or_else(PoisonError::into_inner) = enabled;
}

pub struct Colored<T: Display>(pub Color, pub T);

impl<T: Display> Display for Colored<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let color = COLOR.read().unwrap_or_else(PoisonError::into_inner);
        if *color {
            write!(f, "{}", self.0.prefix())?;
            self.1.fmt(f)?;
            write!(f, "{}", self.0.suffix())
        } else {
            self.1.fmt(f)
        }
    }
}

/// Asks for the password of a repository configured with a username only.
pub fn prompt_password(repo: &mut RepositoryConfig) -> PkgsyncResult<()> {
    if !repo.needs_password() {
        return Ok(());
    }

    let username = repo.username.as_deref().unwrap_or_default();
    let password = Password::new()
        .with_prompt(format!("Enter {username}'s password for {}", repo.url))
        .allow_empty_password(true)
        .interact()
        .map_err(|err| PkgsyncError::Custom(format!("Failed to read password: {err}")))?;

    repo.password = Some(password);
    Ok(())
}
