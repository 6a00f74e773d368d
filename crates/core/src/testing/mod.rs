//! Mock implementations and fixtures for tests.

pub mod fixtures;
mod mock_metadata;
mod mock_torrent_index;

pub use mock_metadata::MockMetadataProvider;
pub use mock_torrent_index::MockTorrentIndex;
