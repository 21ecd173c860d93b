// Copyright 2024 Simo Sorce
// See LICENSE.txt file for terms

use std::env;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

use serde::{Deserialize, Serialize};
use toml;

pub const DEFAULT_CONF_NAME: &str = "client.toml";

/// Largest attribute value accepted from a length query, 1 MiB
pub const DEFAULT_MAX_ATTRIBUTE_LEN: usize = 1 << 20;

/// Number of handles requested per C_FindObjects call
pub const DEFAULT_FIND_BATCH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Reported lengths above this are treated as a protocol violation
    pub max_attribute_len: usize,
    /// Batch size for object searches
    pub find_batch: usize,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            max_attribute_len: DEFAULT_MAX_ATTRIBUTE_LEN,
            find_batch: DEFAULT_FIND_BATCH,
        }
    }
}

impl Config {
    pub fn new() -> Config {
        Config::default()
    }

    /// Finds the configuration file, if there is one
    pub fn find_conf() -> Option<String> {
        /* First check for our own env var,
         * this has the highest precedence */
        if let Ok(var) = env::var("P11CLIENT_CONF") {
            return Some(var);
        }
        let conffile = match env::var("XDG_CONFIG_HOME") {
            Ok(xdg) => format!("{}/p11client/{}", xdg, DEFAULT_CONF_NAME),
            Err(_) => match env::var("HOME") {
                Ok(home) => {
                    format!("{}/.config/p11client/{}", home, DEFAULT_CONF_NAME)
                }
                Err(_) => return None,
            },
        };
        if Path::new(&conffile).is_file() {
            Some(conffile)
        } else {
            None
        }
    }

    /// Loads the configuration found by [Config::find_conf], or the
    /// defaults when there is none
    pub fn load() -> Result<Config> {
        match Self::find_conf() {
            Some(f) => Self::from_file(&f),
            None => Ok(Config::default()),
        }
    }

    pub fn from_file(filename: &str) -> Result<Config> {
        let config_str = fs::read_to_string(filename)?;
        Self::from_toml(&config_str)
    }

    pub fn from_toml(config_str: &str) -> Result<Config> {
        let conf: Config = toml::from_str(config_str)?;
        conf.validate()?;
        Ok(conf)
    }

    pub fn validate(&self) -> Result<()> {
        if self.find_batch == 0 {
            return Err(Error::invalid_parameter(String::from(
                "find_batch must be at least 1",
            )));
        }
        if self.max_attribute_len == 0 {
            return Err(Error::invalid_parameter(String::from(
                "max_attribute_len must be at least 1",
            )));
        }
        Ok(())
    }
}
