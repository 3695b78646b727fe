pub mod error;
pub mod feed;
pub mod gateway;
pub mod git;
pub mod github;
pub mod http_client;
pub mod throttle;
pub mod traits;
pub mod types;

pub use gateway::GithubGateway;
pub use traits::RemoteSource;
