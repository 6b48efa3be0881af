//! Drives whole sessions through the token pipeline the console and server use.

use cryptcrawl::config::LOG_CAPACITY;
use cryptcrawl::{
    render_text, Command, Direction, GameConfig, GameSession, InputContext, InputHandler,
    Monster, MonsterTemplate, NamedKey, PlayerClass, Position, SessionPhase, TileType, Token,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const KEYS: [Token; 14] = [
    Token::Char('w'),
    Token::Char('a'),
    Token::Char('s'),
    Token::Char('d'),
    Token::Char('o'),
    Token::Char('h'),
    Token::Char('1'),
    Token::Char('2'),
    Token::Char('3'),
    Token::Char('4'),
    Token::Char('y'),
    Token::Char('n'),
    Token::Enter,
    Token::Key(NamedKey::Esc),
];

/// Feeds `steps` random keys, skipping `Quit`, and returns every snapshot.
fn play(seed: u64, class: PlayerClass, steps: usize) -> (GameSession, Vec<String>) {
    let mut config = GameConfig::new(seed);
    config.animation_blinks = 2;
    let mut session = GameSession::new(config, class, "Runner").unwrap();
    let input = InputHandler::new();
    let mut keys = StdRng::seed_from_u64(seed ^ 0xC0FFEE);
    let mut frames = Vec::new();

    for _ in 0..steps {
        let token = KEYS[keys.gen_range(0..KEYS.len())];
        let Some(command) = input.command_for(token, session.input_context()) else {
            continue;
        };
        if command == Command::Quit {
            continue;
        }
        session.execute(command).unwrap();
        session.drain_animations().unwrap();
        frames.push(render_text(&session));
    }
    (session, frames)
}

#[test]
fn test_random_play_keeps_invariants() {
    for (seed, class) in [(1, PlayerClass::Warrior), (2, PlayerClass::Mage), (3, PlayerClass::Rogue)] {
        let mut config = GameConfig::new(seed);
        config.animation_blinks = 2;
        let mut session = GameSession::new(config, class, "Runner").unwrap();
        let input = InputHandler::new();
        let mut keys = StdRng::seed_from_u64(seed);

        for _ in 0..600 {
            let token = KEYS[keys.gen_range(0..KEYS.len())];
            let context = session.input_context();
            let Some(command) = input.command_for(token, context) else {
                continue;
            };
            if command == Command::Quit {
                continue;
            }
            session.execute(command).unwrap();
            session.drain_animations().unwrap();

            let player = &session.player;
            assert!(player.hp <= player.max_hp());
            assert!(player.mp >= 0 && player.mp <= player.max_mp());
            assert!(session.dungeon.grid.is_passable(player.position));
            assert!(session.log.len() <= LOG_CAPACITY);
            assert!(!session.is_animating());
            assert_eq!(session.battle.is_some(), session.phase == SessionPhase::InBattle);
        }
    }
}

#[test]
fn test_same_seed_same_run() {
    let (first, first_frames) = play(77, PlayerClass::Rogue, 300);
    let (second, second_frames) = play(77, PlayerClass::Rogue, 300);
    assert_eq!(first_frames, second_frames);
    assert_eq!(first.player.position, second.player.position);
    assert_eq!(first.turn_number, second.turn_number);
}

#[test]
fn test_ticks_play_out_an_attack() {
    let mut config = GameConfig::new(5);
    config.animation_blinks = 3;
    let mut session = GameSession::new(config, PlayerClass::Warrior, "Ticker").unwrap();

    let spawn = session.player.position;
    let east = Position::new(spawn.x + 1, spawn.y);
    session.dungeon.monsters.retain(|m| m.position != east);
    session.dungeon.grid.set(east, TileType::Floor).unwrap();
    session.dungeon.monsters.push(Monster::new(
        MonsterTemplate::new("Dummy", 'd', 500, 1, 0, 10),
        east,
        false,
    ));

    session.execute(Command::Move(Direction::East)).unwrap();
    assert_eq!(session.phase, SessionPhase::InBattle);
    assert_eq!(session.player.position, spawn);

    session.execute(Command::Attack).unwrap();
    assert_eq!(session.input_context(), InputContext::Animating);
    let mut ticks = 0;
    while session.is_animating() {
        session.tick().unwrap();
        ticks += 1;
        assert!(ticks < 100);
    }
    assert!(ticks >= 3);
    assert_eq!(session.ticks, ticks);
    assert_eq!(session.input_context(), InputContext::BattleMenu);
}
