//! genie-console: the Genie API from the terminal, directly or through an agent.
//!
//! Two ways in:
//!
//! - [`genie::PollingEngine`] starts a Genie conversation, polls the message
//!   until it settles and fetches the query result.
//! - [`agent::AgentSession`] creates a hosted agent whose `AskGenie` tool is
//!   backed by the same engine, then streams runs through
//!   [`agent::StreamDispatcher`].
//!
//! ```no_run
//! use genie_console::prelude::*;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> genie_console::error::Result<()> {
//! let config = AppConfig::load(None)?;
//! let engine = PollingEngine::from_settings(&config.genie_settings()?)?;
//! let cancel = CancellationToken::new();
//! let result = engine
//!     .run_to_completion("Top 10 customers by revenue", &cancel)
//!     .await?;
//! println!("{result}");
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod genie;
pub mod prelude;
pub mod tools;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
