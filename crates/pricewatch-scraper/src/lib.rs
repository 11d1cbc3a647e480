pub mod debug_sink;
pub mod embedded;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod normalize;
pub mod lookup;
pub mod retry;
pub mod sites;

pub use debug_sink::{DebugSink, JsonFileSink, NoopSink};
pub use error::{ExtractionCause, ExtractionError, ExtractionStage, FetchError, ParseError};
pub use extract::{BatchOutcome, Extractor};
pub use fetch::Fetcher;
pub use normalize::normalize_price;
pub use retry::RetryPolicy;
pub use sites::SiteParser;
