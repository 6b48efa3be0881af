//! # User Interface Elements
//!
//! Text panels for the status line, the battle screen, reward prompts and the message log.

use crate::{
    AnimationTarget, Battle, BattleState, ConsumableKind, DamageDisplay, MessageLog, Player,
    Rarity, RewardPrompt, StatusKind,
};

/// `Name the Class  Lv N  HP a/b  MP c/d  EXP e/f  Stage s`
pub fn status_line(player: &Player, stage: u32) -> String {
    format!(
        "{} the {}  Lv {}  HP {}/{}  MP {}/{}  EXP {}/{}  Stage {}",
        player.name,
        player.class,
        player.level,
        player.hp.max(0),
        player.max_hp(),
        player.mp,
        player.max_mp(),
        player.experience,
        player.experience_to_next(),
        stage
    )
}

fn display_text(display: DamageDisplay) -> String {
    match display {
        DamageDisplay::Damage(n) => format!("-{}", n),
        DamageDisplay::Critical(n) => format!("-{}!", n),
        DamageDisplay::Miss => "MISS".to_string(),
        DamageDisplay::Heal(n) => format!("+{}", n),
        DamageDisplay::Stunned => "STUN".to_string(),
    }
}

/// Monster header, effects, the blinking number and the active menu.
pub fn battle_panel(battle: &Battle, player: &Player) -> Vec<String> {
    let monster = &battle.monster;
    let mut lines = vec![format!(
        "{} {}  HP {}/{}",
        monster.icon(),
        monster.name(),
        monster.hp.max(0),
        monster.stats.max_hp
    )];

    let effects: Vec<String> = [StatusKind::Stun, StatusKind::Poison, StatusKind::Bleed]
        .iter()
        .filter(|&&kind| monster.status.is_active(kind))
        .map(|&kind| format!("{:?}({})", kind, monster.status.remaining(kind)))
        .collect();
    if !effects.is_empty() {
        lines.push(format!("Effects: {}", effects.join(" ")));
    }

    match battle.state {
        BattleState::Menu => {
            let flee = if battle.flee_allowed { "4) Flee" } else { "4) --" };
            lines.push(format!("1) Attack  2) Skills  3) Items  {}", flee));
        }
        BattleState::SkillSelect => {
            for (i, skill) in player.skills().iter().enumerate() {
                lines.push(format!("{}) {}", i + 1, skill));
            }
            lines.push("ESC) Back".to_string());
        }
        BattleState::ItemMenu => {
            lines.push(format!(
                "1) Health Potion x{}  2) Mana Potion x{}  ESC) Back",
                player.inventory.count_kind(ConsumableKind::HealthPotion),
                player.inventory.count_kind(ConsumableKind::ManaPotion)
            ));
        }
        BattleState::ItemSubMenu(kind) => {
            for (i, rarity) in Rarity::ALL.iter().enumerate() {
                lines.push(format!(
                    "{}) {} {} x{}",
                    i + 1,
                    rarity,
                    kind,
                    player.inventory.count(kind, *rarity)
                ));
            }
            lines.push("ESC) Back".to_string());
        }
        BattleState::Animating(animation) => {
            let who = match animation.target {
                AnimationTarget::Monster => monster.name().to_string(),
                AnimationTarget::Player => player.name.clone(),
            };
            if animation.visible() {
                lines.push(format!("[{}] {}", who, display_text(animation.display)));
            } else {
                lines.push(format!("[{}]", who));
            }
        }
        BattleState::Won => lines.push("Victory!".to_string()),
        BattleState::GameOver => lines.push("Defeat...".to_string()),
    }
    lines
}

pub fn reward_panel(prompt: &RewardPrompt) -> String {
    match prompt {
        RewardPrompt::EquipmentDecision(_) => prompt.describe(),
        _ => format!("{} (ENTER)", prompt.describe()),
    }
}

/// The newest `count` log entries, oldest first.
pub fn log_lines(log: &MessageLog, count: usize) -> Vec<String> {
    log.recent(count).into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EncounterSource, Monster, MonsterTemplate, PlayerClass, Position};

    #[test]
    fn test_status_line() {
        let player = Player::new("Ayla".to_string(), PlayerClass::Mage, Position::new(0, 0));
        let line = status_line(&player, 2);
        assert_eq!(line, "Ayla the Mage  Lv 1  HP 80/80  MP 80/80  EXP 0/75  Stage 2");
    }

    #[test]
    fn test_battle_menu_hides_flee_for_ambush() {
        let player = Player::new("Ayla".to_string(), PlayerClass::Mage, Position::new(0, 0));
        let monster = Monster::new(MonsterTemplate::new("Bat", 'b', 16, 6, 0, 9), Position::new(1, 0), false);
        let battle = Battle::new(monster, EncounterSource::Ambush, 1);
        let lines = battle_panel(&battle, &player);
        assert_eq!(lines[0], "b Bat  HP 16/16");
        assert!(lines[1].ends_with("4) --"));
    }
}
