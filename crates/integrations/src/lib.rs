//! External integrations: report connectors, the media library and the
//! creative-to-media matcher.

pub mod connector;
pub mod matcher;
pub mod media_library;

pub use connector::{fetch_or_empty, HttpReportSource, InMemoryReportSource, ReportSource};
pub use matcher::{clean_name, find_media, MediaMatcher};
pub use media_library::{build_media_index, HttpMediaLibrary, MediaLibrary, MediaLibrarySource};
