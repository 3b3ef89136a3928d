/// Frame decoders.
///
/// Provides the [`FrameDecoder`](decode::FrameDecoder) interface the engine
/// drives and the [`Mp3Decoder`](decode::Mp3Decoder) and
/// [`AacDecoder`](decode::AacDecoder) variants, selected through
/// [`Codec`](decode::Codec).
pub mod decode;

/// Buffering and resynchronization state machine.
///
/// Provides the [`SyncEngine`](engine::SyncEngine), which discards data in
/// front of frame markers, dispatches decode calls and recovers from decode
/// errors and stalls.
pub mod engine;

/// Frame marker search.
///
/// Provides the [`SyncFinder`](locate::SyncFinder) interface and the
/// [`FrameLocator`](locate::FrameLocator) view over buffered data.
pub mod locate;

/// Delivery of decoded frames.
///
/// Provides the [`Router`](route::Router) and the session [`Output`](route::Output).
pub mod route;

/// Session lifecycle and the streaming write driver.
///
/// Provides the [`Session`](session::Session) that accepts bytes in
/// arbitrary pieces.
pub mod session;

#[cfg(test)]
pub(crate) mod mock;
