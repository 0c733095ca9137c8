pub mod http;
pub mod profile_fetcher;
pub mod runtime;

pub use profile_fetcher::RelayProfileFetcher;
pub use runtime::run_bot;
