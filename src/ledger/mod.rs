// Public API - what other modules can use
pub use models::{
    InjurySeverity, MatchModel, MatchOutcome, MatchStatus, PlayerInjuryModel,
    PlayerMatchStatsModel, PlayerModel, ScoreModel, TeamModel, TournamentModel,
};
pub use postgres::PostgresLedgerRepository;
pub use repository::{InMemoryLedgerRepository, LedgerRepository, LedgerTransaction};
pub use snapshot::LedgerSnapshot;

// Internal modules
pub mod models;
mod postgres;
pub mod repository;
mod snapshot;
