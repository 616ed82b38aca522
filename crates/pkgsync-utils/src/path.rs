use std::{env, path::PathBuf};

use crate::error::{PathError, PathResult};

/// Returns the user's home directory.
pub fn home_dir() -> PathBuf {
    env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| env::temp_dir())
}

/// Returns `$XDG_CONFIG_HOME`, falling back to `~/.config`.
pub fn xdg_config_home() -> PathBuf {
    env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Resolves a user supplied path.
///
/// A leading `~` expands to the home directory and `$VAR` / `${VAR}` expand to environment
/// variables. Relative results are joined onto the current working directory.
///
/// # Errors
///
/// * [`PathError::Empty`] if the input is blank.
/// * [`PathError::UnsetVariable`] if a referenced variable is not set.
/// * [`PathError::WorkingDirectory`] if the working directory cannot be determined.
pub fn resolve_path(path: &str) -> PathResult<PathBuf> {
    let path = path.trim();

    if path.is_empty() {
        return Err(PathError::Empty);
    }

    let resolved = PathBuf::from(expand_variables(path)?);

    if resolved.is_absolute() {
        Ok(resolved)
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(resolved))
            .map_err(|err| PathError::WorkingDirectory { source: err })
    }
}

fn expand_variables(path: &str) -> PathResult<String> {
    let mut result = String::with_capacity(path.len());
    let mut chars = path.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '$' => {
                let braced = chars.peek() == Some(&'{');
                if braced {
                    chars.next();
                }
                let mut var_name = String::new();
                while let Some(&c) = chars.peek() {
                    if braced && c == '}' {
                        chars.next();
                        break;
                    }
                    if !braced && !(c.is_alphanumeric() || c == '_') {
                        break;
                    }
                    var_name.push(c);
                    chars.next();
                }

                if var_name.is_empty() {
                    result.push('$');
                    continue;
                }

                let value = env::var(&var_name).map_err(|_| {
                    PathError::UnsetVariable {
                        var: var_name.clone(),
                        input: path.to_string(),
                    }
                })?;
                result.push_str(&value);
            }
            '~' if result.is_empty() => result.push_str(&home_dir().to_string_lossy()),
            _ => result.push(c),
        }
    }

    Ok(result)
}
