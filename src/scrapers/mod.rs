pub mod file;
pub mod remote;
pub mod traits;
pub mod types;

pub use file::FileScraper;
pub use remote::RemoteJobScraper;
pub use traits::ScraperTrait;
pub use types::RawBatch;
