// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Enable-directive grammar.
//!
//! Used by `berth enable agent ...` and recursively by manifests' `enable[]`
//! lists to materialize dependent agents:
//!
//! ```text
//! NAME [MODE] [REPO] ['as' ALIAS]
//! ```
//!
//! `MODE` is one of `isolated` | `global` | `devel`; `devel` requires a
//! following `REPO` token.

use crate::record::RunMode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A parsed enable directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnableDirective {
    /// Agent name (optionally qualified `repo/name`).
    pub name: String,
    pub mode: Option<RunMode>,
    /// Explicit repository; required when mode is `devel`.
    pub repo: Option<String>,
    /// Record alias (`as ALIAS`).
    pub alias: Option<String>,
}

impl EnableDirective {
    /// Record name this directive materializes as: the alias when given,
    /// otherwise the (unqualified) agent name.
    pub fn record_name(&self) -> &str {
        if let Some(alias) = &self.alias {
            return alias;
        }
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

/// Errors from parsing an enable directive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnableParseError {
    #[error("empty enable directive")]
    Empty,
    #[error("'devel' mode requires a repository token: '{0}'")]
    DevelNeedsRepo(String),
    #[error("'as' must be followed by an alias: '{0}'")]
    DanglingAs(String),
    #[error("unexpected token '{token}' in enable directive '{directive}'")]
    UnexpectedToken { directive: String, token: String },
}

impl std::str::FromStr for EnableDirective {
    type Err = EnableParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tokens = s.split_whitespace().peekable();

        let name = tokens.next().ok_or(EnableParseError::Empty)?.to_string();
        let mut directive = EnableDirective { name, mode: None, repo: None, alias: None };

        if let Some(&tok) = tokens.peek() {
            if let Ok(mode) = tok.parse::<RunMode>() {
                directive.mode = Some(mode);
                tokens.next();
            }
        }

        if let Some(&tok) = tokens.peek() {
            if tok != "as" {
                directive.repo = Some(tok.to_string());
                tokens.next();
            }
        }

        if directive.mode == Some(RunMode::Devel) && directive.repo.is_none() {
            return Err(EnableParseError::DevelNeedsRepo(s.to_string()));
        }

        match tokens.next() {
            None => Ok(directive),
            Some("as") => {
                let alias = tokens
                    .next()
                    .ok_or_else(|| EnableParseError::DanglingAs(s.to_string()))?;
                directive.alias = Some(alias.to_string());
                match tokens.next() {
                    None => Ok(directive),
                    Some(extra) => Err(EnableParseError::UnexpectedToken {
                        directive: s.to_string(),
                        token: extra.to_string(),
                    }),
                }
            }
            Some(extra) => Err(EnableParseError::UnexpectedToken {
                directive: s.to_string(),
                token: extra.to_string(),
            }),
        }
    }
}

#[cfg(test)]
#[path = "enable_tests.rs"]
mod tests;
