use std::collections::HashMap;
use std::path::PathBuf;

use regex::Regex;

use crate::config::RunConfig;

/// Run-scoped context: output locations plus the variables available to
/// `${var}` placeholders in step values and expectations.
pub struct RunContext {
    /// Output directory for reports and failure artifacts.
    pub output_dir: PathBuf,

    /// Run variables (credentials, base URL), checked before the process
    /// environment.
    pub vars: HashMap<String, String>,
}

impl RunContext {
    pub fn new(config: &RunConfig) -> Self {
        let output_dir = config.output_dir.clone();
        // Always ensure output directory exists
        let _ = std::fs::create_dir_all(&output_dir);

        let mut vars = HashMap::new();
        vars.insert("username".to_string(), config.username.clone());
        vars.insert("password".to_string(), config.password.clone());
        vars.insert("base_url".to_string(), config.base_url.clone());

        Self { output_dir, vars }
    }

    /// Get the output path for a file
    pub fn output_path(&self, filename: &str) -> PathBuf {
        self.output_dir.join(filename)
    }

    /// Get a variable from run vars or the process environment
    pub fn get_var(&self, name: &str) -> Option<String> {
        self.vars
            .get(name)
            .cloned()
            .or_else(|| std::env::var(name).ok())
    }

    /// Substitute ${varname} patterns in a string
    pub fn substitute_vars(&self, text: &str) -> String {
        let re = Regex::new(r"\$\{([a-zA-Z0-9_.]+)\}").unwrap();
        re.replace_all(text, |caps: &regex::Captures| {
            let key = &caps[1];

            if let Some(val) = self.get_var(key) {
                return val;
            }

            // Unknown placeholders pass through untouched
            format!("${{{}}}", key)
        })
        .to_string()
    }
}

/// Filename-safe form of a scenario name for artifact files.
pub fn safe_file_stem(name: &str) -> String {
    name.replace(['/', '\\', ':', ' '], "_")
}
