//! Configuration module for Soong.
//!
//! Settings come from environment variables, optionally seeded from a
//! `.env` file in the working directory.

mod settings;

pub use settings::{
    API_KEY_VAR, POLL_INTERVAL_VAR, READY_TIMEOUT_VAR, Settings, load_dotenv,
};
