use std::path::PathBuf;

/// Data directory for persisted bot state (~/.task_bot)
pub fn data_dir() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
        .join(".task_bot")
}

/// Default location of the cached OAuth token
pub fn default_token_path() -> PathBuf {
    data_dir().join("token.json")
}

/// Default location of the Google client secrets file, relative to the working directory
pub fn default_credentials_path() -> PathBuf {
    PathBuf::from("credentials.json")
}

/// Ensure the data directory exists
pub fn ensure_data_dir() -> std::io::Result<PathBuf> {
    let dir = data_dir();
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_path_lives_in_data_dir() {
        assert!(default_token_path().starts_with(data_dir()));
        assert_eq!(
            default_token_path().file_name().and_then(|n| n.to_str()),
            Some("token.json")
        );
    }
}
