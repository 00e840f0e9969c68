//! PostgreSQL schema for the league store.
//!
//! Column constraints live here; cross-row business rules (roster ceiling,
//! score/winner consistency) are enforced in Rust by the roster guard and the
//! match validator.

use sqlx::PgPool;

/// Idempotent DDL for every table
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS teams (
    team_id         BIGSERIAL PRIMARY KEY,
    team_name       TEXT NOT NULL,
    region          TEXT NOT NULL,
    founded_year    INTEGER,
    CONSTRAINT teams_team_name_key UNIQUE (team_name),
    CONSTRAINT team_name_chk CHECK (btrim(team_name) <> ''),
    CONSTRAINT team_region_chk CHECK (btrim(region) <> '')
);

CREATE TABLE IF NOT EXISTS players (
    player_id       BIGSERIAL PRIMARY KEY,
    player_name     TEXT NOT NULL,
    country         TEXT,
    role            TEXT,
    team_id         BIGINT,
    CONSTRAINT players_team_id_fkey FOREIGN KEY (team_id)
        REFERENCES teams (team_id) ON DELETE SET NULL,
    CONSTRAINT player_name_chk CHECK (btrim(player_name) <> '')
);

CREATE TABLE IF NOT EXISTS tournaments (
    tournament_id   BIGSERIAL PRIMARY KEY,
    name            TEXT NOT NULL,
    organizer       TEXT,
    prize_pool      NUMERIC(14, 2) NOT NULL DEFAULT 0,
    start_date      DATE,
    end_date        DATE,
    location        TEXT,
    CONSTRAINT tournament_name_chk CHECK (btrim(name) <> ''),
    CONSTRAINT tournament_prize_pool_chk CHECK (prize_pool >= 0),
    CONSTRAINT tournament_dates_chk CHECK (
        start_date IS NULL OR end_date IS NULL OR start_date <= end_date
    )
);

CREATE TABLE IF NOT EXISTS maps (
    map_id          BIGSERIAL PRIMARY KEY,
    map_name        TEXT NOT NULL,
    CONSTRAINT maps_map_name_key UNIQUE (map_name),
    CONSTRAINT map_name_chk CHECK (btrim(map_name) <> '')
);

CREATE TABLE IF NOT EXISTS map_pool (
    map_pool_id     BIGSERIAL PRIMARY KEY,
    map_id          BIGINT NOT NULL,
    status          TEXT NOT NULL,
    valid_from      DATE NOT NULL,
    valid_to        DATE,
    CONSTRAINT map_pool_map_id_fkey FOREIGN KEY (map_id)
        REFERENCES maps (map_id) ON DELETE CASCADE,
    CONSTRAINT map_pool_status_chk CHECK (status IN ('active', 'reserve', 'retired')),
    CONSTRAINT map_pool_dates_chk CHECK (valid_to IS NULL OR valid_from <= valid_to)
);

CREATE TABLE IF NOT EXISTS matches (
    match_id        BIGSERIAL PRIMARY KEY,
    tournament_id   BIGINT NOT NULL,
    team1_id        BIGINT NOT NULL,
    team2_id        BIGINT NOT NULL,
    winner_team_id  BIGINT,
    map_id          BIGINT,
    match_date      DATE,
    best_of         INTEGER NOT NULL,
    team1_score     INTEGER,
    team2_score     INTEGER,
    CONSTRAINT matches_tournament_id_fkey FOREIGN KEY (tournament_id)
        REFERENCES tournaments (tournament_id) ON DELETE CASCADE,
    CONSTRAINT matches_team1_id_fkey FOREIGN KEY (team1_id)
        REFERENCES teams (team_id) ON DELETE RESTRICT,
    CONSTRAINT matches_team2_id_fkey FOREIGN KEY (team2_id)
        REFERENCES teams (team_id) ON DELETE RESTRICT,
    CONSTRAINT matches_winner_team_id_fkey FOREIGN KEY (winner_team_id)
        REFERENCES teams (team_id) ON DELETE RESTRICT,
    CONSTRAINT matches_map_id_fkey FOREIGN KEY (map_id)
        REFERENCES maps (map_id) ON DELETE CASCADE,
    CONSTRAINT best_of_chk CHECK (best_of > 0),
    CONSTRAINT scores_chk CHECK (
        (team1_score IS NULL OR team1_score >= 0) AND (team2_score IS NULL OR team2_score >= 0)
    ),
    CONSTRAINT different_teams_chk CHECK (team1_id <> team2_id),
    CONSTRAINT winner_valid_chk CHECK (
        winner_team_id IS NULL OR winner_team_id IN (team1_id, team2_id)
    )
);

CREATE TABLE IF NOT EXISTS tournament_results (
    result_id       BIGSERIAL PRIMARY KEY,
    tournament_id   BIGINT NOT NULL,
    team_id         BIGINT NOT NULL,
    placement       INTEGER NOT NULL,
    earnings        NUMERIC(14, 2) NOT NULL DEFAULT 0,
    CONSTRAINT tournament_results_tournament_id_fkey FOREIGN KEY (tournament_id)
        REFERENCES tournaments (tournament_id) ON DELETE CASCADE,
    CONSTRAINT tournament_results_team_id_fkey FOREIGN KEY (team_id)
        REFERENCES teams (team_id) ON DELETE CASCADE,
    CONSTRAINT tournament_results_tournament_id_team_id_key UNIQUE (tournament_id, team_id),
    CONSTRAINT tournament_results_tournament_id_placement_key UNIQUE (tournament_id, placement),
    CONSTRAINT placement_chk CHECK (placement > 0),
    CONSTRAINT earnings_chk CHECK (earnings >= 0)
);

CREATE TABLE IF NOT EXISTS team_roster (
    roster_id       BIGSERIAL PRIMARY KEY,
    team_id         BIGINT NOT NULL,
    player_id       BIGINT NOT NULL,
    is_active       BOOLEAN NOT NULL DEFAULT TRUE,
    start_date      DATE,
    end_date        DATE,
    CONSTRAINT team_roster_team_id_fkey FOREIGN KEY (team_id)
        REFERENCES teams (team_id) ON DELETE CASCADE,
    CONSTRAINT team_roster_player_id_fkey FOREIGN KEY (player_id)
        REFERENCES players (player_id) ON DELETE CASCADE,
    CONSTRAINT team_roster_team_id_player_id_key UNIQUE (team_id, player_id),
    CONSTRAINT roster_dates_chk CHECK (
        start_date IS NULL OR end_date IS NULL OR start_date <= end_date
    )
);

CREATE INDEX IF NOT EXISTS idx_matches_team1 ON matches (team1_id);
CREATE INDEX IF NOT EXISTS idx_matches_team2 ON matches (team2_id);
CREATE INDEX IF NOT EXISTS idx_map_pool_map ON map_pool (map_id, valid_from);
CREATE INDEX IF NOT EXISTS idx_team_roster_active ON team_roster (team_id) WHERE is_active;
"#;

/// Apply [`SCHEMA`] to the connected database
pub async fn apply(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    log::info!("Schema applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::constraints::names;

    #[test]
    fn test_schema_declares_every_shared_constraint() {
        for name in names::ALL {
            assert!(
                SCHEMA.contains(&format!("CONSTRAINT {name} ")),
                "constraint {name} missing from schema"
            );
        }
    }

    #[test]
    fn test_schema_is_idempotent_ddl() {
        assert!(!SCHEMA.contains("CREATE TABLE teams"));
        assert_eq!(
            SCHEMA.matches("CREATE TABLE IF NOT EXISTS").count(),
            8,
            "one statement per entity table"
        );
    }
}
