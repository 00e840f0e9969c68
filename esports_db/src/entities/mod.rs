//! Entity definitions: teams, players, tournaments, maps, map pool history,
//! matches, tournament results and roster entries.

pub mod ids;
pub mod models;

pub use ids::{
    MapId, MapPoolEntryId, MatchId, PlayerId, RosterEntryId, TeamId, TournamentId,
    TournamentResultId,
};
pub use models::{
    Map, MapPoolEntry, MapPoolEntryUpdate, MapPoolStatus, MapUpdate, Match, MatchUpdate, NewMap,
    NewMapPoolEntry, NewPlayer, NewRosterEntry, NewTeam, NewTournament, NewTournamentResult,
    Player, PlayerUpdate, RosterEntry, RosterEntryUpdate, Team, TeamUpdate, Tournament,
    TournamentResult, TournamentResultUpdate, TournamentUpdate, UnknownMapPoolStatus,
};
