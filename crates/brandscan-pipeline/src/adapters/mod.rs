//! Production implementations of the collaborator traits.

mod apify;
mod openai;
mod postgres;

pub use apify::ApifyProvider;
pub use openai::OpenAiModel;
pub use postgres::PgGateway;
