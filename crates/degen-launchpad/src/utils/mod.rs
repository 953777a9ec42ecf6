pub mod format;
pub mod validation;

pub use format::{format_quote, format_usd};
pub use validation::{ensure_non_negative, ensure_positive};
