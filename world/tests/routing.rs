use std::time::Duration;

use glam::Vec2;
use waypoint_defence_core::{
    Command, Difficulty, EnemyId, EnemyKind, Event, PathId, PathKind, PathSpec, Playfield,
    ScriptedRandom, StatTables,
};
use waypoint_defence_world::{self as world, query, World, WorldConfig};

fn junction_world(draws: Vec<f32>) -> World {
    World::new(
        WorldConfig {
            tables: StatTables::standard(),
            mode: Difficulty::Normal.params(),
            paths: vec![
                PathSpec::new(
                    PathKind::Entrance,
                    vec![
                        Vec2::new(0.0, 0.0),
                        Vec2::new(100.0, 0.0),
                        Vec2::new(200.0, 0.0),
                    ],
                ),
                PathSpec::new(
                    PathKind::Junction,
                    vec![
                        Vec2::new(150.0, 50.0),
                        Vec2::new(150.0, 200.0),
                        Vec2::new(150.0, 400.0),
                    ],
                ),
            ],
            blocked: Vec::new(),
            playfield: Playfield::default(),
        },
        Box::new(ScriptedRandom::new(draws)),
    )
}

fn spawn(world: &mut World, kind: EnemyKind, speed: f32) {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::SpawnEnemy {
            kind,
            path: PathId::new(0),
            max_hp: 300.0,
            speed,
            reward: 45,
        },
        &mut events,
    );
    assert_eq!(
        events,
        vec![Event::EnemySpawned {
            enemy: EnemyId::new(0),
            kind,
            position: Vec2::new(0.0, 0.0),
        }]
    );
}

fn advance(world: &mut World, seconds: f32) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::Tick {
            dt: Duration::from_secs_f32(seconds),
        },
        &mut events,
    );
    events
}

#[test]
fn tank_switches_when_the_draw_is_below_its_chance() {
    let mut world = junction_world(vec![0.79]);
    spawn(&mut world, EnemyKind::Tank, 40.0);

    let events = advance(&mut world, 3.0);

    assert!(events.contains(&Event::EnemyRerouted {
        enemy: EnemyId::new(0),
        path: PathId::new(1),
        waypoint: 1,
    }));
    let tank = &query::enemy_view(&world)[0];
    assert_eq!(tank.path, PathId::new(1));
    assert_eq!(tank.waypoint, 1);
    assert_eq!(tank.switch_count, 1);
    assert_eq!(tank.position, Vec2::new(100.0, 0.0));
}

#[test]
fn tank_stays_when_the_draw_meets_its_chance() {
    let mut world = junction_world(vec![0.81]);
    spawn(&mut world, EnemyKind::Tank, 40.0);

    let events = advance(&mut world, 3.0);

    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::EnemyRerouted { .. })));
    let tank = &query::enemy_view(&world)[0];
    assert_eq!(tank.path, PathId::new(0));
    assert_eq!(tank.waypoint, 2);
    assert_eq!(tank.switch_count, 0);
}

#[test]
fn normal_enemies_need_a_lower_draw_than_tanks() {
    let mut world = junction_world(vec![0.6]);
    spawn(&mut world, EnemyKind::Normal, 40.0);

    let _ = advance(&mut world, 3.0);

    assert_eq!(query::enemy_view(&world)[0].path, PathId::new(0));
}

#[test]
fn rerouted_enemy_follows_the_junction_to_its_end() {
    let mut world = junction_world(vec![0.0]);
    spawn(&mut world, EnemyKind::Fast, 150.0);

    let mut escaped = false;
    for _ in 0..60 {
        let events = advance(&mut world, 0.1);
        if events
            .iter()
            .any(|event| matches!(event, Event::EnemyEscaped { .. }))
        {
            escaped = true;
            break;
        }
        if let Some(enemy) = query::enemy_view(&world).first() {
            assert!(enemy.position.x <= 150.0 + 1e-3);
        }
    }

    assert!(escaped);
    assert_eq!(query::lives(&world), 4);
}
