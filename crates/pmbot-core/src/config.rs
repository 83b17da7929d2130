use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{errors::Error, Result};

/// Typed configuration, loaded once at process start.
#[derive(Clone, Debug)]
pub struct Config {
    /// Telegram bot API token. Required; startup fails without it.
    pub bot_token: String,
    /// Chat ids allowed to run gated commands. Empty means nobody is.
    pub operator_ids: Vec<i64>,
    /// Path to the pm2 binary.
    pub pm2_path: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let bot_token = env_str("BOT_TOKEN").unwrap_or_default();
        if bot_token.trim().is_empty() {
            return Err(Error::Config(
                "BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        // Operators are optional: an empty list simply authorizes no one
        // for the gated commands.
        let operator_ids = parse_csv_i64(env_str("BOT_OPERATORS"));

        let pm2_path = env_path("PM2_PATH")
            .or_else(|| which_in_path("pm2"))
            .unwrap_or_else(|| PathBuf::from("pm2"));

        Ok(Self {
            bot_token,
            operator_ids,
            pm2_path,
        })
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key).map(PathBuf::from)
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn parse_csv_i64(v: Option<String>) -> Vec<i64> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<i64>().ok())
        .collect()
}

fn which_in_path(binary: &str) -> Option<PathBuf> {
    let path = env::var_os("PATH")?;
    for dir in env::split_paths(&path) {
        let candidate = dir.join(binary);
        if is_executable_file(&candidate) {
            return Some(candidate);
        }
    }
    None
}

fn is_executable_file(p: &Path) -> bool {
    if !p.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(md) = fs::metadata(p) {
            return (md.permissions().mode() & 0o111) != 0;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_operator_csv() {
        assert_eq!(
            parse_csv_i64(Some("42, 7,  -100123".to_string())),
            vec![42, 7, -100123]
        );
    }

    #[test]
    fn skips_empty_and_malformed_entries() {
        assert_eq!(parse_csv_i64(Some(",,42,abc, ".to_string())), vec![42]);
        assert!(parse_csv_i64(None).is_empty());
        assert!(parse_csv_i64(Some("".to_string())).is_empty());
    }
}
