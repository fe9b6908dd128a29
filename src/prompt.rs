use std::env;

/// Renders the interactive prompt. Purely cosmetic: reads the current
/// working directory and abbreviates the home prefix to `~`.
pub struct ShellPrompt {
    prefix: String,
}

impl ShellPrompt {
    pub fn new(prefix: &str) -> Self {
        ShellPrompt {
            prefix: prefix.to_string(),
        }
    }

    pub fn render(&self) -> String {
        let cwd = env::current_dir()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let home = env::var("HOME").ok();
        format!(
            "{}{} > ",
            self.prefix,
            abbreviate_home(&cwd, home.as_deref())
        )
    }
}

fn abbreviate_home(path: &str, home: Option<&str>) -> String {
    match home {
        Some(home) if !home.is_empty() && path.starts_with(home) => {
            format!("~{}", &path[home.len()..])
        }
        _ => path.to_string(),
    }
}
