use std::collections::BTreeSet;

use rand::{SeedableRng, rngs::StdRng};
use rustc_hash::FxHashSet;

use brassage::{
    error::TournamentError,
    partition::PoolLayout,
    phase::PhaseKind,
    ranking,
    store::{Format, MemoryStore, TournamentStore},
    table::Table,
    team::Team,
    tournament::Tournament,
};

/// The stronger level wins, by a margin growing with the level gap.
fn play(teams: &[Team], team1: &str, team2: &str) -> (u32, u32) {
    let level = |id: &str| {
        teams
            .iter()
            .find(|team| team.id == id)
            .map_or(10, |team| u32::from(team.level))
    };
    let (level1, level2) = (level(team1), level(team2));

    match level1.cmp(&level2) {
        std::cmp::Ordering::Less => (25, 25 - 2 * (level2 - level1)),
        std::cmp::Ordering::Greater => (25 - 2 * (level1 - level2), 25),
        std::cmp::Ordering::Equal => (25, 23),
    }
}

fn play_phase(tournament: &mut Tournament, phase_id: &str) -> anyhow::Result<()> {
    let games: Vec<_> = tournament
        .phase(phase_id)?
        .matches()
        .map(|game| (game.id.clone(), game.team1.clone(), game.team2.clone()))
        .collect();

    for (id, team1, team2) in games {
        let (score1, score2) = play(&tournament.teams, &team1, &team2);
        tournament.record_score(phase_id, &id, score1, score2)?;
    }
    Ok(())
}

fn registered(count: u8) -> anyhow::Result<Tournament> {
    let mut tournament = Tournament::new("Autumn Open")?;
    for i in 1..=count {
        tournament.add_team(&format!("Club {i:02}"), (i - 1) % 10 + 1)?;
    }
    Ok(tournament)
}

#[test]
fn full_tournament() -> anyhow::Result<()> {
    let mut store = MemoryStore::new(Format::Postcard);
    let mut tournament = registered(12)?;
    store.save(&tournament)?;

    let initial = tournament.generate_initial(None)?;
    {
        let phase = tournament.phase(&initial)?;
        assert_eq!(phase.pools.len(), 3);
        assert_eq!(phase.matches().count(), 18);
        let placed: FxHashSet<&str> = phase.team_ids().into_iter().collect();
        assert_eq!(placed.len(), 12);
    }
    play_phase(&mut tournament, &initial)?;
    assert!(tournament.phase(&initial)?.generated);
    store.save(&tournament)?;

    let mut tournament = store.load(&tournament.id)?;
    let secondary = tournament.generate_secondary(None)?;
    for report in tournament.repeats_in_phase(&secondary)? {
        assert_eq!(report.previous_phases, vec!["Initial brassage".to_string()]);
    }
    play_phase(&mut tournament, &secondary)?;

    let rankings = tournament.rankings();
    assert_eq!(rankings.len(), 12);
    assert_eq!(rankings, tournament.rankings());
    for pair in rankings.windows(2) {
        assert_ne!(
            ranking::compare(&pair[0], &pair[1]),
            std::cmp::Ordering::Greater
        );
    }
    let played: u32 = rankings.iter().map(|entry| entry.played).sum();
    assert_eq!(played, 2 * 36);

    tournament.prepare_elimination_seeding(2, 4)?;
    let seeding = tournament.commit_seeding()?;
    assert_eq!(
        tournament.phase(&seeding)?.kind,
        PhaseKind::EliminationSeeding
    );
    assert!(tournament.phase(&seeding)?.generated);

    let mut rng = StdRng::seed_from_u64(12);
    tournament.build_bracket(Some(1), &mut rng)?;
    assert_eq!(tournament.elimination.len(), 1);

    let mut round = 1;
    loop {
        let games: Vec<_> = tournament.round(round)?.matches.clone();
        for game in games {
            let Some((team1, team2)) = game.teams() else {
                anyhow::bail!("{} has an empty slot", game.id);
            };
            let (score1, score2) = play(&tournament.teams, team1, team2);
            assert!(
                tournament
                    .record_bracket_score(round, &game.id, score1, score2)?
                    .is_some()
            );
        }
        if tournament.champion().is_some() {
            break;
        }
        round = tournament.advance_bracket()?;
    }

    assert_eq!(round, 3);
    assert_eq!(tournament.eliminated.len(), 7);
    let champion = tournament.champion().map(|team| team.id.clone());
    let standings = tournament.global_standings();
    assert_eq!(Some(standings[0].ranking.team.clone()), champion);
    assert!(standings[4..8].iter().all(|standing| standing.eliminated));
    assert!(standings[8..].iter().all(|standing| standing.furthest_round == 0));

    store.save(&tournament)?;
    assert_eq!(store.load(&tournament.id)?, tournament);
    Ok(())
}

#[test]
fn secondary_uses_every_generated_phase() -> anyhow::Result<()> {
    let mut tournament = registered(8)?;
    let initial = tournament.generate_initial(None)?;
    play_phase(&mut tournament, &initial)?;
    let first = tournament.generate_secondary(None)?;
    play_phase(&mut tournament, &first)?;

    let before = tournament.rankings();
    let phases: BTreeSet<_> = before[0]
        .phases
        .iter()
        .map(|breakdown| breakdown.phase.clone())
        .collect();
    assert_eq!(phases, BTreeSet::from([initial.clone(), first.clone()]));

    let second = tournament.generate_secondary(Some(PoolLayout {
        pools: 2,
        teams_per_pool: 4,
    }))?;
    let phase = tournament.phase(&second)?;
    assert_eq!(phase.name, "Secondary brassage 2");
    // the two best teams of the cumulative ranking head the two pools
    assert_eq!(phase.pools[0].teams[0], before[0].team);
    assert_eq!(phase.pools[1].teams[0], before[1].team);
    Ok(())
}

#[test]
fn repeated_pairs_are_reported_not_avoided() -> anyhow::Result<()> {
    let mut tournament = registered(4)?;
    let initial = tournament.generate_initial(None)?;
    play_phase(&mut tournament, &initial)?;
    let secondary = tournament.generate_secondary(None)?;

    // four teams in one pool always meet again
    let reports = tournament.repeats_in_phase(&secondary)?;
    assert_eq!(reports.len(), 6);
    assert!(tournament.repeats_in_phase(&initial)?.is_empty());

    let occurrences = tournament.occurrences();
    for game in tournament.phase(&secondary)?.matches() {
        assert!(!occurrences.is_repeated(&game.team1, &game.team2, &initial));
    }
    Ok(())
}

#[test]
fn import_then_export() -> anyhow::Result<()> {
    let mut tournament = registered(4)?;
    let initial = tournament.generate_initial(None)?;

    let mut sheet = tournament.export_scores(&initial)?;
    assert_eq!(sheet.rows.len(), 7);
    assert!(sheet.rows[1..].iter().all(|row| row[2].is_empty() && row[3].is_empty()));

    // fill in reversed order of teams for the first row, as a scorer might
    let first = sheet.rows[1].clone();
    sheet.rows[1] = vec![
        first[1].to_uppercase(),
        first[0].clone(),
        "12".to_string(),
        "25".to_string(),
    ];
    for row in &mut sheet.rows[2..] {
        row[2] = "25".to_string();
        row[3] = "20".to_string();
    }
    sheet.rows.push(vec![
        "Nobody".to_string(),
        first[0].clone(),
        "25".to_string(),
        "0".to_string(),
    ]);

    let mut buffer = Vec::new();
    sheet.write_csv(&mut buffer)?;
    let report = tournament.import_scores(&initial, &Table::from_csv(buffer.as_slice())?)?;

    assert_eq!(report.imported, 6);
    assert_eq!(report.errors.len(), 1);
    assert!(tournament.phase(&initial)?.generated);

    let exported = tournament.export_scores(&initial)?;
    assert_eq!(exported.rows[1][0], first[0]);
    assert_eq!(exported.rows[1][2], "25");
    assert_eq!(exported.rows[1][3], "12");

    assert!(matches!(
        tournament.import_scores(&initial, &exported),
        Err(TournamentError::Precondition(_))
    ));
    Ok(())
}

#[test]
fn failed_operations_change_nothing() -> anyhow::Result<()> {
    let mut tournament = registered(6)?;
    let before = tournament.clone();

    assert!(
        tournament
            .generate_initial(Some(PoolLayout {
                pools: 4,
                teams_per_pool: 2,
            }))
            .is_err()
    );
    assert!(tournament.add_team("CLUB 01", 3).is_err());
    assert!(tournament.add_team("Club 99", 0).is_err());
    assert!(tournament.prepare_elimination_seeding(1, 4).is_err());
    assert!(
        tournament
            .build_bracket(None, &mut StdRng::seed_from_u64(0))
            .is_err()
    );
    assert!(tournament.advance_bracket().is_err());
    assert_eq!(tournament, before);
    Ok(())
}
