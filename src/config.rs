use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::fmt;
use std::path::{Path, PathBuf};

/// Interpreter-start configuration: prompt prefix and history placement.
/// Loaded once at startup and passed around explicitly; nothing here is
/// global state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub prompt: String,
    pub history_file: String,
    pub history_max: usize,
}

impl Config {
    /// History file path with a leading `~` expanded against HOME.
    pub fn history_path(&self, home: Option<&str>) -> PathBuf {
        if let Some(rest) = self.history_file.strip_prefix("~/") {
            if let Some(home) = home {
                return Path::new(home).join(rest);
            }
        }
        PathBuf::from(&self.history_file)
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn default_config() -> Config {
        Config {
            prompt: "minish: ".to_string(),
            history_file: "~/.minish_history".to_string(),
            history_max: 500,
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let file = File::open(path).map_err(ConfigError::Io)?;
        let mut src = String::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(ConfigError::Io)?;
            src.push_str(&line);
            src.push('\n');
        }
        Self::load_from_str(&src)
    }

    /// `key=value` lines; `#` starts a comment line; unknown keys are
    /// rejected rather than silently ignored.
    pub fn load_from_str(src: &str) -> Result<Config, ConfigError> {
        let mut config = Self::default_config();

        for (lineno, line) in src.lines().enumerate() {
            let line = line.trim_start();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(ConfigError::Parse(format!(
                    "line {}: no '=' found: {}",
                    lineno + 1,
                    line
                )));
            };
            let key = key.trim();
            // Only leading whitespace is stripped: a prompt may well end in
            // a space, like the default one does.
            let value = value.trim_start();

            match key {
                "prompt" => config.prompt = value.to_string(),
                "history_file" => config.history_file = value.trim_end().to_string(),
                "history_max" => match value.trim_end().parse::<usize>() {
                    Ok(n) => config.history_max = n,
                    Err(_) => {
                        return Err(ConfigError::Parse(format!(
                            "line {}: invalid number: {}",
                            lineno + 1,
                            value
                        )));
                    }
                },
                _ => {
                    return Err(ConfigError::Parse(format!(
                        "line {}: unknown key: {}",
                        lineno + 1,
                        key
                    )));
                }
            }
        }

        Ok(config)
    }

    /// Load `~/.minishrc` when present, defaults otherwise. A malformed file
    /// is reported and the defaults win; a broken rc file must not keep the
    /// shell from starting.
    pub fn load(home: Option<&str>) -> Config {
        let Some(home) = home else {
            return Self::default_config();
        };
        let rc = Path::new(home).join(".minishrc");
        if !rc.exists() {
            return Self::default_config();
        }
        match Self::load_from_file(&rc) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("minish: {}: {}", rc.display(), e);
                Self::default_config()
            }
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(msg) => write!(f, "parse error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
