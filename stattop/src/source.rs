//! The collaborator that opens a live stats stream for one container.

use futures::future::BoxFuture;
use futures::stream::BoxStream;

use crate::error::StreamError;
use crate::types::StatsRecord;

/// Decoded frames of one container's stream. The end of the stream means the remote side is done.
pub type StatsStream = BoxStream<'static, Result<StatsRecord, StreamError>>;

pub trait StatsSource: Send + Sync + 'static {
    /// Open the stats stream for `name`. Fails when the container is unknown or unreachable.
    fn open<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<StatsStream, StreamError>>;
}
