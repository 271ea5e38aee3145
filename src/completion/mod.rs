// Public API - what other modules can use
pub use handlers::complete_match;
pub use service::MatchCompletionService;
pub use types::{ActorContext, CompleteMatchRequest, PlayerStatLine, ScoringEvent};

// Internal modules
mod handlers;
mod service;
mod types;
