use waypoint_defence_core::{
    Command, Difficulty, EnemyKind, Event, PathId, PathKind, PathSpec, Playfield, RandomSource,
    ScriptedRandom, StatTables, Vec2, WaveMode,
};
use waypoint_defence_system_waves::{tank_schedule, WaveConfig, WaveManager, WavePhase};
use waypoint_defence_world::{self as world, query, World, WorldConfig};

fn manager(level: u32, mode: WaveMode, entrances: &[PathId]) -> WaveManager {
    WaveManager::new(WaveConfig::new(level, mode, 1.0, 1.0), entrances, entrances)
}

fn run_wave(
    manager: &mut WaveManager,
    random: &mut dyn RandomSource,
) -> (Vec<Event>, Vec<Command>) {
    let mut events = Vec::new();
    let mut commands = Vec::new();
    manager.start_next_wave(&mut events);
    while manager.is_active() {
        manager.update(0.8, random, &mut commands);
    }
    (events, commands)
}

fn spawned(commands: &[Command]) -> Vec<(EnemyKind, PathId, f32, f32, u32)> {
    commands
        .iter()
        .map(|command| match command {
            Command::SpawnEnemy {
                kind,
                path,
                max_hp,
                speed,
                reward,
            } => (*kind, *path, *max_hp, *speed, *reward),
            other => panic!("unexpected command: {other:?}"),
        })
        .collect()
}

#[test]
fn first_spawn_is_due_immediately_and_the_rest_follow_the_gap() {
    let mut manager = manager(2, WaveMode::Standard, &[PathId::new(0)]);
    let mut random = ScriptedRandom::new(vec![0.9]);
    let mut events = Vec::new();
    let mut commands = Vec::new();

    manager.start_next_wave(&mut events);
    assert_eq!(
        events,
        vec![Event::WaveStarted {
            wave: 1,
            boss: false
        }]
    );

    manager.update(0.01, &mut random, &mut commands);
    assert_eq!(commands.len(), 1);
    manager.update(0.5, &mut random, &mut commands);
    assert_eq!(commands.len(), 1);
    manager.update(0.4, &mut random, &mut commands);
    assert_eq!(commands.len(), 2);
    assert_eq!(manager.enemies_left(), 0);
    assert!(manager.is_active());

    manager.update(0.1, &mut random, &mut commands);
    assert!(!manager.is_active());
    assert_eq!(manager.phase(), WavePhase::Draining);

    manager.update(1.0, &mut random, &mut commands);
    manager.update(5.0, &mut random, &mut commands);
    assert_eq!(manager.cooldown(), 0.0);
    assert_eq!(commands.len(), 2);
}

#[test]
fn waves_grow_by_one_enemy() {
    let mut manager = manager(4, WaveMode::Standard, &[PathId::new(0)]);
    let mut random = ScriptedRandom::new(vec![0.9]);
    let sizes: Vec<usize> = (0..4)
        .map(|_| run_wave(&mut manager, &mut random).1.len())
        .collect();
    assert_eq!(sizes, vec![2, 3, 4, 5]);
    assert_eq!(manager.max_waves(), Some(4));
}

#[test]
fn boss_wave_spawns_the_fixed_group_in_order() {
    let mut manager = manager(5, WaveMode::Standard, &[PathId::new(0)]);
    let mut random = ScriptedRandom::new(vec![0.0]);
    for _ in 0..4 {
        let (events, _) = run_wave(&mut manager, &mut random);
        assert!(matches!(
            events.as_slice(),
            [Event::WaveStarted { boss: false, .. }]
        ));
    }

    let (events, commands) = run_wave(&mut manager, &mut random);
    assert_eq!(
        events,
        vec![Event::WaveStarted {
            wave: 5,
            boss: true
        }]
    );
    assert!(manager.is_boss_wave());

    let spawns = spawned(&commands);
    let kinds: Vec<EnemyKind> = spawns.iter().map(|spawn| spawn.0).collect();
    assert_eq!(
        kinds,
        vec![EnemyKind::Boss, EnemyKind::Normal, EnemyKind::Fast]
    );

    let (_, _, boss_hp, _, boss_reward) = spawns[0];
    assert!((boss_hp - 600.0 * 4.0 * 1.8).abs() < 1e-2, "boss hp {boss_hp}");
    assert_eq!(boss_reward, 240);

    let (_, _, escort_hp, _, escort_reward) = spawns[1];
    assert!((escort_hp - 180.0).abs() < 1e-3, "escort hp {escort_hp}");
    assert_eq!(escort_reward, 22);
}

#[test]
fn level_three_boss_wave_has_one_escort() {
    let mut manager = manager(3, WaveMode::Standard, &[PathId::new(0)]);
    let mut random = ScriptedRandom::new(vec![0.9]);
    let _ = run_wave(&mut manager, &mut random);
    let _ = run_wave(&mut manager, &mut random);
    let (_, commands) = run_wave(&mut manager, &mut random);

    let kinds: Vec<EnemyKind> = spawned(&commands).iter().map(|spawn| spawn.0).collect();
    assert_eq!(kinds, vec![EnemyKind::Boss, EnemyKind::Normal]);
}

#[test]
fn scheduled_tank_waves_open_with_a_tank() {
    let mut manager = manager(8, WaveMode::Standard, &[PathId::new(0)]);
    let mut random = ScriptedRandom::new(vec![0.9]);

    let (_, first) = run_wave(&mut manager, &mut random);
    assert_eq!(manager.tank_waves(), tank_schedule(8).as_slice());
    assert_eq!(manager.tank_waves().len(), 6);
    assert!(!manager.is_tank_wave());
    assert!(spawned(&first)
        .iter()
        .all(|spawn| spawn.0 == EnemyKind::Normal));

    let (_, second) = run_wave(&mut manager, &mut random);
    assert!(manager.is_tank_wave());
    let kinds: Vec<EnemyKind> = spawned(&second).iter().map(|spawn| spawn.0).collect();
    assert_eq!(
        kinds,
        vec![EnemyKind::Tank, EnemyKind::Normal, EnemyKind::Normal]
    );
}

#[test]
fn fast_enemies_appear_from_wave_four() {
    let mut manager = manager(6, WaveMode::Standard, &[PathId::new(0)]);
    let mut random = ScriptedRandom::new(vec![0.44]);
    for _ in 0..3 {
        let (_, commands) = run_wave(&mut manager, &mut random);
        assert!(spawned(&commands)
            .iter()
            .all(|spawn| spawn.0 != EnemyKind::Fast));
    }

    let (_, commands) = run_wave(&mut manager, &mut random);
    let kinds: Vec<EnemyKind> = spawned(&commands).iter().map(|spawn| spawn.0).collect();
    assert_eq!(
        kinds,
        vec![
            EnemyKind::Fast,
            EnemyKind::Fast,
            EnemyKind::Fast,
            EnemyKind::Fast,
            EnemyKind::Fast
        ]
    );
}

#[test]
fn fast_roll_boundary_is_exclusive() {
    let mut manager = manager(6, WaveMode::Standard, &[PathId::new(0)]);
    let mut random = ScriptedRandom::new(vec![0.45]);
    for _ in 0..4 {
        let _ = run_wave(&mut manager, &mut random);
    }
    let (_, commands) = run_wave(&mut manager, &mut random);
    let kinds: Vec<EnemyKind> = spawned(&commands).iter().map(|spawn| spawn.0).collect();
    assert_eq!(kinds[0], EnemyKind::Tank);
    assert!(kinds[1..].iter().all(|kind| *kind == EnemyKind::Normal));
}

#[test]
fn entrances_are_used_round_robin_across_waves() {
    let entrances = [PathId::new(0), PathId::new(1)];
    let mut manager = manager(4, WaveMode::Standard, &entrances);
    let mut random = ScriptedRandom::new(vec![0.9]);

    let (_, first) = run_wave(&mut manager, &mut random);
    let (_, second) = run_wave(&mut manager, &mut random);
    let paths: Vec<u32> = spawned(&first)
        .iter()
        .chain(spawned(&second).iter())
        .map(|spawn| spawn.1.get())
        .collect();
    assert_eq!(paths, vec![0, 1, 0, 1, 0]);
}

#[test]
fn missing_entrances_fall_back_to_a_random_path() {
    let mut manager = WaveManager::new(
        WaveConfig::new(1, WaveMode::Standard, 1.0, 1.0),
        &[],
        &[PathId::new(3), PathId::new(4)],
    );
    let mut random = ScriptedRandom::new(vec![0.9, 0.7, 0.9, 0.2]);
    let (_, commands) = run_wave(&mut manager, &mut random);
    let paths: Vec<PathId> = spawned(&commands).iter().map(|spawn| spawn.1).collect();
    assert_eq!(paths, vec![PathId::new(4), PathId::new(3)]);
}

#[test]
fn scales_grow_per_wave_and_carry_the_difficulty() {
    let hard = Difficulty::Hard.params();
    let mut manager = WaveManager::new(
        WaveConfig::new(4, WaveMode::Standard, hard.hp_multiplier, hard.speed_multiplier),
        &[PathId::new(0)],
        &[PathId::new(0)],
    );
    let mut random = ScriptedRandom::new(vec![0.9]);
    let _ = run_wave(&mut manager, &mut random);
    assert!((manager.hp_scale() - 1.3).abs() < 1e-5);
    assert!((manager.speed_scale() - 1.15).abs() < 1e-5);

    let _ = run_wave(&mut manager, &mut random);
    let _ = run_wave(&mut manager, &mut random);
    assert!((manager.hp_scale() - 1.4 * 1.3).abs() < 1e-5);
    assert!((manager.speed_scale() - 1.1 * 1.15).abs() < 1e-5);
}

#[test]
fn permanent_mode_bosses_every_fifth_wave_and_ramps_speed_late() {
    let mut manager = manager(999, WaveMode::Permanent, &[PathId::new(0)]);
    let mut random = ScriptedRandom::new(vec![0.9]);
    assert_eq!(manager.max_waves(), None);

    let mut bosses = Vec::new();
    for _ in 0..10 {
        let (events, _) = run_wave(&mut manager, &mut random);
        if let [Event::WaveStarted { wave, boss: true }] = events.as_slice() {
            bosses.push(*wave);
        }
        if manager.wave() == 4 {
            assert_eq!(manager.speed_scale(), 1.0);
        }
    }
    assert_eq!(bosses, vec![5, 10]);
    assert!((manager.speed_scale() - (1.0 + 0.12 * 6.0)).abs() < 1e-5);
}

#[test]
fn spawn_commands_place_enemies_at_the_entrance() {
    let mut world = World::new(
        WorldConfig {
            tables: StatTables::standard(),
            mode: Difficulty::Normal.params(),
            paths: vec![PathSpec::new(
                PathKind::Entrance,
                vec![Vec2::new(-20.0, 96.0), Vec2::new(900.0, 96.0)],
            )],
            blocked: Vec::new(),
            playfield: Playfield::default(),
        },
        Box::new(ScriptedRandom::new(vec![0.9])),
    );
    let entrances = query::paths(&world).entrances().to_vec();
    let all = query::paths(&world).ids().collect::<Vec<_>>();
    let mut manager = WaveManager::new(WaveConfig::default(), &entrances, &all);
    let mut random = ScriptedRandom::new(vec![0.9]);

    let (_, commands) = run_wave(&mut manager, &mut random);
    let mut events = Vec::new();
    for command in commands {
        world::apply(&mut world, command, &mut events);
    }

    assert_eq!(query::enemy_count(&world), 2);
    assert!(events.iter().all(|event| matches!(
        event,
        Event::EnemySpawned {
            kind: EnemyKind::Normal,
            position,
            ..
        } if *position == Vec2::new(-20.0, 96.0)
    )));
}
