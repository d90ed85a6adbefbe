//! Environment-driven configuration

use crate::conversation::TerminalCondition;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_PORT: u16 = 8100;
const DEFAULT_ORCHESTRATOR_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_SEARCH_ENGINE: &str = "tavily";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Workflow tuning parameters sent with every turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowSettings {
    pub number_of_initial_queries: u32,
    pub max_research_loops: u32,
    pub search_engines: Vec<String>,
    pub max_search_results: u32,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            number_of_initial_queries: 3,
            max_research_loops: 3,
            search_engines: vec![DEFAULT_SEARCH_ENGINE.to_string()],
            max_search_results: 3,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub orchestrator_url: String,
    pub connect_timeout: Duration,
    pub terminal: TerminalCondition,
    pub workflow: WorkflowSettings,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys take defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = WorkflowSettings::default();
        let terminal_defaults = TerminalCondition::default();

        let search_engines = lookup("WORKFLOW_SEARCH_ENGINES")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|engine| !engine.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|engines| !engines.is_empty())
            .unwrap_or(defaults.search_engines);

        Ok(Self {
            port: parse_or(&lookup, "WORKFLOW_CHAT_PORT", DEFAULT_PORT)?,
            orchestrator_url: lookup("ORCHESTRATOR_URL")
                .unwrap_or_else(|| DEFAULT_ORCHESTRATOR_URL.to_string()),
            connect_timeout: Duration::from_secs(parse_or(
                &lookup,
                "ORCHESTRATOR_CONNECT_TIMEOUT_SECS",
                DEFAULT_CONNECT_TIMEOUT_SECS,
            )?),
            terminal: TerminalCondition::new(
                lookup("WORKFLOW_TERMINAL_AGENT").unwrap_or(terminal_defaults.agent),
                lookup("WORKFLOW_STOP_REASON").unwrap_or(terminal_defaults.finish_reason),
            ),
            workflow: WorkflowSettings {
                number_of_initial_queries: parse_or(
                    &lookup,
                    "WORKFLOW_INITIAL_QUERIES",
                    defaults.number_of_initial_queries,
                )?,
                max_research_loops: parse_or(
                    &lookup,
                    "WORKFLOW_MAX_RESEARCH_LOOPS",
                    defaults.max_research_loops,
                )?,
                search_engines,
                max_search_results: parse_or(
                    &lookup,
                    "WORKFLOW_MAX_SEARCH_RESULTS",
                    defaults.max_search_results,
                )?,
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
