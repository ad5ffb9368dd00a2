//! Frame decoders for single-topic and combined streams.

use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::value::RawValue;

use super::error::WsError;
use super::traits::{MessageParser, Symbolic};
use crate::Result;
use crate::endpoint::StreamName;
use crate::serde_helpers::decode_with_warnings;

/// Decodes every frame of a single-topic stream directly as `E`.
pub struct JsonParser<E> {
    skip: &'static [&'static str],
    _event: PhantomData<fn() -> E>,
}

impl<E> JsonParser<E> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            skip: &[],
            _event: PhantomData,
        }
    }

    /// Drop frames whose `"e"` event type is one of `event_types` before decoding them.
    #[must_use]
    pub const fn skipping(event_types: &'static [&'static str]) -> Self {
        Self {
            skip: event_types,
            _event: PhantomData,
        }
    }

    fn skipped(&self, bytes: &[u8]) -> bool {
        #[derive(Deserialize)]
        struct EventType<'a> {
            #[serde(rename = "e", borrow, default)]
            kind: Option<Cow<'a, str>>,
        }

        if self.skip.is_empty() {
            return false;
        }
        serde_json::from_slice::<EventType<'_>>(bytes)
            .ok()
            .and_then(|peek| peek.kind)
            .is_some_and(|kind| self.skip.contains(&kind.as_ref()))
    }
}

impl<E> Default for JsonParser<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for JsonParser<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonParser")
            .field("skip", &self.skip)
            .finish()
    }
}

impl<E> MessageParser<E> for JsonParser<E>
where
    E: DeserializeOwned + Send + 'static,
{
    fn parse(&self, bytes: &[u8]) -> Result<Vec<E>> {
        if self.skipped(bytes) {
            return Ok(Vec::new());
        }
        let event = decode_with_warnings(bytes).map_err(WsError::MessageParse)?;
        Ok(vec![event])
    }
}

#[derive(Deserialize)]
struct Envelope<'a> {
    #[serde(borrow)]
    stream: Cow<'a, str>,
    #[serde(borrow)]
    data: &'a RawValue,
}

/// Unwraps `{"stream": "<symbol>@<topic>", "data": {...}}` envelopes of a combined stream.
///
/// When topic families are set, frames whose topic belongs to none of them are dropped
/// silently. The stream prefix, uppercased, overwrites the event's symbol.
pub struct CombinedParser<E> {
    /// Empty accepts every topic
    families: &'static [&'static str],
    _event: PhantomData<fn() -> E>,
}

impl<E> CombinedParser<E> {
    /// Accept every topic.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            families: &[],
            _event: PhantomData,
        }
    }

    /// Accept only topics of the given families, e.g. `kline` or `depth5`.
    ///
    /// A topic belongs to a family when the part before any `@rate` suffix equals the
    /// family or extends it with `_<interval>`: `depth` matches `depth@100ms` but not
    /// `depth5`, and `kline` matches `kline_1m`.
    #[must_use]
    pub const fn for_topics(families: &'static [&'static str]) -> Self {
        Self {
            families,
            _event: PhantomData,
        }
    }

    fn accepts(&self, topic: &str) -> bool {
        self.families.is_empty()
            || self
                .families
                .iter()
                .any(|family| in_family(topic, family))
    }
}

fn in_family(topic: &str, family: &str) -> bool {
    let base = topic.split_once('@').map_or(topic, |(base, _)| base);
    base.strip_prefix(family)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('_'))
}

impl<E> Default for CombinedParser<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for CombinedParser<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombinedParser")
            .field("families", &self.families)
            .finish()
    }
}

impl<E> MessageParser<E> for CombinedParser<E>
where
    E: DeserializeOwned + Symbolic + Send + 'static,
{
    fn parse(&self, bytes: &[u8]) -> Result<Vec<E>> {
        let envelope: Envelope<'_> = serde_json::from_slice(bytes).map_err(WsError::MessageParse)?;
        let name: StreamName = envelope.stream.parse()?;

        if !self.accepts(name.topic()) {
            #[cfg(feature = "tracing")]
            tracing::trace!(stream = %envelope.stream, "frame filtered by topic");
            return Ok(Vec::new());
        }

        let mut event: E =
            decode_with_warnings(envelope.data.get().as_bytes()).map_err(WsError::MessageParse)?;
        if let Some(symbol) = name.symbol() {
            event.set_symbol(symbol.to_uppercase());
        }
        Ok(vec![event])
    }
}
