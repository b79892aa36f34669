// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use serde::Deserialize;

fn default_bind_address() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_seed_database() -> bool {
    true
}

/// Server settings, read from environment variables of the same name in
/// upper case (`DATABASE_URL`, `BIND_ADDRESS`, `SEED_DATABASE`).
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Config {
    /// Without a database the server still starts, but every data route
    /// answers 503 so clients switch to demo mode.
    #[serde(default)]
    database_url: Option<String>,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Seed demo users, a project and tasks into an empty database.
    #[serde(default = "default_seed_database")]
    pub seed_database: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env::<Config>()
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, Config>(vars)
    }

    /// The configured database URL; blank values count as unset.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}
