//! Validation of stream parameters that are encoded into stream names.

use std::time::Duration;

use crate::Result;
use crate::endpoint::StreamName;
use crate::error::Error;

/// Accepted partial book depths.
pub const DEPTH_LEVELS: [u8; 3] = [5, 10, 20];

const MARK_PRICE_FAST: Duration = Duration::from_secs(1);
const MARK_PRICE_DEFAULT: Duration = Duration::from_secs(3);

/// Per-symbol stream name, rejecting an empty symbol.
pub(crate) fn symbol_stream<T: Into<String>>(symbol: &str, topic: T) -> Result<StreamName> {
    if symbol.trim().is_empty() {
        return Err(Error::validation("symbol must not be empty"));
    }
    Ok(StreamName::new(symbol, topic))
}

/// Leveraged token stream name. Token names are uppercase on the wire.
pub(crate) fn token_stream<T: Into<String>>(name: &str, topic: T) -> Result<StreamName> {
    if name.trim().is_empty() {
        return Err(Error::validation("token name must not be empty"));
    }
    Ok(StreamName::verbatim(&name.to_uppercase(), topic))
}

/// Topic families of partial book streams, one per accepted level count.
pub(crate) const PARTIAL_DEPTH_TOPICS: &[&str] = &["depth5", "depth10", "depth20"];

pub(crate) fn validate_levels(levels: u8) -> Result<()> {
    if DEPTH_LEVELS.contains(&levels) {
        Ok(())
    } else {
        Err(Error::validation(format!(
            "depth levels must be one of 5, 10 or 20, got {levels}"
        )))
    }
}

/// Suffix for a depth update period.
///
/// `None` and the family's default period need no suffix; other accepted periods are
/// rendered as `@<millis>ms`.
pub(crate) fn depth_rate_suffix(
    rate: Option<Duration>,
    default: Duration,
    accepted: &[Duration],
) -> Result<String> {
    match rate {
        None => Ok(String::new()),
        Some(rate) if rate == default => Ok(String::new()),
        Some(rate) if accepted.contains(&rate) => Ok(format!("@{}ms", rate.as_millis())),
        Some(rate) => Err(Error::validation(format!(
            "unsupported depth update rate {rate:?}"
        ))),
    }
}

/// Suffix for a mark price update period: 3 s (default) or 1 s.
pub(crate) fn mark_price_rate_suffix(rate: Option<Duration>) -> Result<&'static str> {
    match rate {
        None => Ok(""),
        Some(rate) if rate == MARK_PRICE_DEFAULT => Ok(""),
        Some(rate) if rate == MARK_PRICE_FAST => Ok("@1s"),
        Some(rate) => Err(Error::validation(format!(
            "mark price rate must be 1s or 3s, got {rate:?}"
        ))),
    }
}
