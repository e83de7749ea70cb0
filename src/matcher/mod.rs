pub mod catalog;
pub mod game_matcher;
pub mod normalize;
pub mod options;
pub mod scorer;

pub use catalog::{CatalogClient, InMemoryCatalog};
pub use game_matcher::GameMatcher;
pub use options::{GameMatchOptions, MatchPolicy, MatcherConfig};
