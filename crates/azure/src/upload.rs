//! Block upload helpers.

use std::io;

use azure_storage_blobs::prelude::{BlobBlockType, BlockId, BlockList};
use blobgate_core::storage::ByteStream;
use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt, stream};

/// Block id for the block at `index`.
///
/// All ids of a blob must have the same length, so the index is zero-padded.
/// The client base64-encodes it on the wire.
pub(crate) fn block_id(index: usize) -> BlockId {
    BlockId::new(format!("{index:08}"))
}

/// Block list committing the first `count` blocks in index order.
pub(crate) fn block_list(count: usize) -> BlockList {
    BlockList {
        blocks: (0..count)
            .map(|index| BlobBlockType::Latest(block_id(index)))
            .collect(),
    }
}

struct Rechunk {
    source: ByteStream,
    buffer: BytesMut,
    chunk_size: usize,
    done: bool,
}

/// Regroup `source` into chunks of exactly `chunk_size` bytes; the last one
/// may be shorter. An empty source yields nothing.
pub(crate) fn rechunk(
    source: ByteStream,
    chunk_size: usize,
) -> impl Stream<Item = Result<Bytes, io::Error>> + Send {
    let chunk_size = chunk_size.max(1);
    let state = Rechunk {
        source,
        buffer: BytesMut::new(),
        chunk_size,
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if state.buffer.len() >= state.chunk_size {
                let chunk = state.buffer.split_to(state.chunk_size).freeze();
                return Some((Ok(chunk), state));
            }
            if state.done {
                if state.buffer.is_empty() {
                    return None;
                }
                let rest = state.buffer.split().freeze();
                return Some((Ok(rest), state));
            }
            match state.source.next().await {
                Some(Ok(bytes)) => state.buffer.extend_from_slice(&bytes),
                Some(Err(err)) => {
                    state.done = true;
                    state.buffer.clear();
                    return Some((Err(err), state));
                }
                None => state.done = true,
            }
        }
    })
}
