//! External capabilities used by the research pipeline
//!
//! # Module Structure
//!
//! - [`search`](crate::tools::search) - Web search backends (Tavily, DuckDuckGo)
//!
//! # Web Search
//!
//! ```ignore
//! let search = search::search_from_config(&config.search)?;
//! for hit in search.search("rust async runtimes", 5).await {
//!     println!("{}: {}", hit.title, hit.url);
//! }
//! ```

/// Web search backends.
pub mod search;

pub use search::{DisabledSearch, DuckDuckGoSearch, TavilySearch, WebSearch, search_from_config};
