// Client module organization

pub mod channel;
pub mod options;
pub mod paginated;
pub mod rest;

// Re-export main types
pub use channel::{RestChannel, RestPresence};
pub use options::ClientOptions;
pub use paginated::{Direction, PaginateParams, PaginatedResult};
pub use rest::{RestClient, RestClientBuilder};
