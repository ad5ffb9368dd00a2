//! Core traits for generic WebSocket infrastructure.

/// Message parser trait for converting raw frames to events.
///
/// This abstracts the different decoding strategies:
/// - Single-topic streams: the frame is the event
/// - Combined streams: the frame is a `{stream, data}` envelope, filtered by topic family
/// - User data: some event kinds are dropped before decoding
///
/// # Example
///
/// ```ignore
/// pub struct TickerParser;
///
/// impl MessageParser<Ticker> for TickerParser {
///     fn parse(&self, bytes: &[u8]) -> crate::Result<Vec<Ticker>> {
///         let msg: Ticker = serde_json::from_slice(bytes)?;
///         Ok(vec![msg])
///     }
/// }
/// ```
pub trait MessageParser<M>: Send + Sync + 'static {
    /// Parse incoming bytes into messages.
    ///
    /// Returns an empty vec when the frame is filtered out. Errors are reported to the
    /// stream's error handler and the frame is dropped.
    fn parse(&self, bytes: &[u8]) -> crate::Result<Vec<M>>;
}

/// Events that name the symbol they belong to.
///
/// Combined streams tag every frame with `<symbol>@<topic>`; the router writes that symbol
/// back onto the event because multiplexed payloads may omit it.
pub trait Symbolic {
    fn symbol(&self) -> &str;

    fn set_symbol(&mut self, symbol: String);
}
