use std::path::PathBuf;

/// Expands a leading `~` in a path to the user's home directory.
/// Also normalizes path separators for the current OS.
pub fn expand_tilde(path: &str) -> String {
    let result = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => match dirs::home_dir() {
            Some(home) => home
                .join(rest.trim_start_matches('/'))
                .to_string_lossy()
                .to_string(),
            None => path.to_string(),
        },
        _ => path.to_string(),
    };
    if cfg!(windows) {
        result.replace('/', "\\")
    } else {
        result
    }
}

/// Root directory for roadmapper files (`~/.roadmapper`).
///
/// `ROADMAPPER_HOME` overrides the location, which keeps tests and
/// portable installs away from the real home directory.
pub fn roadmapper_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("ROADMAPPER_HOME") {
        if !dir.trim().is_empty() {
            return Some(PathBuf::from(expand_tilde(&dir)));
        }
    }
    dirs::home_dir().map(|h| h.join(".roadmapper"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaves_plain_paths_alone() {
        assert_eq!(expand_tilde("relative/state"), "relative/state".replace('/', std::path::MAIN_SEPARATOR_STR));
    }

    #[test]
    fn does_not_expand_user_prefixes() {
        assert_eq!(expand_tilde("~alice/state"), "~alice/state".replace('/', std::path::MAIN_SEPARATOR_STR));
    }

    #[test]
    fn expands_home_prefix() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        let expanded = expand_tilde("~/roadmaps");
        assert_eq!(PathBuf::from(expanded), home.join("roadmaps"));
    }
}
