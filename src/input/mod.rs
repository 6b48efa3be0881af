//! # Input Module
//!
//! Input handling and command parsing for player interactions.
//!
//! Raw input arrives as [`Token`]s (one per protocol line or console line). The
//! [`InputHandler`] maps a token to a [`Command`] according to the current
//! [`InputContext`], which the session derives from its phase and battle state.

pub mod commands;

pub use commands::*;

use crate::{ConsumableKind, CrawlError, CrawlResult, Direction, Rarity};
use serde::{Deserialize, Serialize};

/// Named keys that have no printable character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NamedKey {
    Up,
    Down,
    Left,
    Right,
    Esc,
}

/// One unit of raw input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Token {
    Char(char),
    Key(NamedKey),
    Enter,
    Backspace,
    Spacebar,
}

/// Parses one input line into a token.
///
/// A single character is a [`Token::Char`]; `UP`, `DOWN`, `LEFT`, `RIGHT`, `ESC`, `ENTER`,
/// `BACKSPACE` and `SPACEBAR` are named keys. Anything else is a protocol error.
///
/// # Examples
///
/// ```
/// use cryptcrawl::{parse_token, NamedKey, Token};
///
/// assert_eq!(parse_token("w").unwrap(), Token::Char('w'));
/// assert_eq!(parse_token("LEFT\r").unwrap(), Token::Key(NamedKey::Left));
/// assert_eq!(parse_token("ENTER").unwrap(), Token::Enter);
/// assert!(parse_token("JUMP").is_err());
/// ```
pub fn parse_token(line: &str) -> CrawlResult<Token> {
    let trimmed = line.trim_end_matches(['\r', '\n']);
    let mut chars = trimmed.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Ok(Token::Char(c));
    }
    match trimmed.to_ascii_uppercase().as_str() {
        "UP" => Ok(Token::Key(NamedKey::Up)),
        "DOWN" => Ok(Token::Key(NamedKey::Down)),
        "LEFT" => Ok(Token::Key(NamedKey::Left)),
        "RIGHT" => Ok(Token::Key(NamedKey::Right)),
        "ESC" => Ok(Token::Key(NamedKey::Esc)),
        "ENTER" | "" => Ok(Token::Enter),
        "BACKSPACE" => Ok(Token::Backspace),
        "SPACEBAR" => Ok(Token::Spacebar),
        other => Err(CrawlError::Protocol(format!("Unknown input token: {}", other))),
    }
}

/// What the session is waiting for; decides how tokens are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputContext {
    Exploring,
    BattleMenu,
    SkillSelect,
    ItemMenu,
    ItemSubMenu(ConsumableKind),
    /// An animation is playing; input is read but ignored
    Animating,
    /// Equip-or-discard decision
    EquipmentPrompt,
    /// Level-up notice or potion summary
    NoticePrompt,
    /// Victory or game over
    Finished,
}

/// Input handler for processing player commands.
///
/// Converts tokens into commands for the current context.
#[derive(Debug, Clone)]
pub struct InputHandler {
    /// Whether to accept Vi-style movement keys (hjkl)
    pub vi_keys_enabled: bool,
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl InputHandler {
    /// Creates a new input handler.
    ///
    /// # Examples
    ///
    /// ```
    /// use cryptcrawl::{Command, Direction, InputContext, InputHandler, Token};
    ///
    /// let input = InputHandler::new();
    /// let command = input.command_for(Token::Char('w'), InputContext::Exploring);
    /// assert_eq!(command, Some(Command::Move(Direction::North)));
    /// ```
    pub fn new() -> Self {
        Self {
            vi_keys_enabled: false,
        }
    }

    /// Maps a token to a command, or `None` when it means nothing in this context.
    pub fn command_for(&self, token: Token, context: InputContext) -> Option<Command> {
        if token == Token::Key(NamedKey::Esc) && context == InputContext::Exploring {
            return Some(Command::Quit);
        }

        match context {
            InputContext::Exploring => self.exploring(token),
            InputContext::BattleMenu => match token {
                Token::Char('1') | Token::Char('a') => Some(Command::Attack),
                Token::Char('2') | Token::Char('s') => Some(Command::OpenSkills),
                Token::Char('3') | Token::Char('i') => Some(Command::OpenItems),
                Token::Char('4') | Token::Char('f') => Some(Command::Flee),
                _ => None,
            },
            InputContext::SkillSelect => match token {
                Token::Char(c @ '1'..='4') => Some(Command::UseSkill(digit_index(c))),
                token if is_back(token) => Some(Command::Back),
                _ => None,
            },
            InputContext::ItemMenu => match token {
                Token::Char('1') => Some(Command::ChooseItemKind(ConsumableKind::HealthPotion)),
                Token::Char('2') => Some(Command::ChooseItemKind(ConsumableKind::ManaPotion)),
                token if is_back(token) => Some(Command::Back),
                _ => None,
            },
            InputContext::ItemSubMenu(kind) => match token {
                Token::Char(c @ '1'..='4') => {
                    Some(Command::UseItem(kind, Rarity::ALL[digit_index(c)]))
                }
                token if is_back(token) => Some(Command::Back),
                _ => None,
            },
            InputContext::Animating => None,
            InputContext::EquipmentPrompt => match token {
                Token::Char('y') | Token::Char('Y') => Some(Command::Equip),
                Token::Char('n') | Token::Char('N') => Some(Command::Discard),
                _ => None,
            },
            InputContext::NoticePrompt => match token {
                Token::Enter | Token::Spacebar => Some(Command::Acknowledge),
                _ => None,
            },
            InputContext::Finished => match token {
                Token::Enter | Token::Char('r') => Some(Command::Restart),
                Token::Key(NamedKey::Esc) | Token::Char('q') => Some(Command::Quit),
                _ => None,
            },
        }
    }

    fn exploring(&self, token: Token) -> Option<Command> {
        let direction = match token {
            Token::Char('w') | Token::Key(NamedKey::Up) => Some(Direction::North),
            Token::Char('s') | Token::Key(NamedKey::Down) => Some(Direction::South),
            Token::Char('a') | Token::Key(NamedKey::Left) => Some(Direction::West),
            Token::Char('d') | Token::Key(NamedKey::Right) => Some(Direction::East),
            Token::Char('k') if self.vi_keys_enabled => Some(Direction::North),
            Token::Char('j') if self.vi_keys_enabled => Some(Direction::South),
            Token::Char('h') if self.vi_keys_enabled => Some(Direction::West),
            Token::Char('l') if self.vi_keys_enabled => Some(Direction::East),
            _ => None,
        };
        if let Some(direction) = direction {
            return Some(Command::Move(direction));
        }

        match token {
            Token::Char('o') | Token::Spacebar => Some(Command::OpenChest),
            Token::Char('h') => Some(Command::QuickUse(ConsumableKind::HealthPotion)),
            Token::Char('m') => Some(Command::QuickUse(ConsumableKind::ManaPotion)),
            _ => None,
        }
    }
}

fn digit_index(c: char) -> usize {
    c.to_digit(10).map(|d| d as usize).unwrap_or(1).saturating_sub(1)
}

fn is_back(token: Token) -> bool {
    matches!(token, Token::Key(NamedKey::Esc) | Token::Backspace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_named_tokens() {
        assert_eq!(parse_token("UP").unwrap(), Token::Key(NamedKey::Up));
        assert_eq!(parse_token("esc").unwrap(), Token::Key(NamedKey::Esc));
        assert_eq!(parse_token("BACKSPACE\n").unwrap(), Token::Backspace);
        assert_eq!(parse_token("SPACEBAR").unwrap(), Token::Spacebar);
        assert_eq!(parse_token("\r\n").unwrap(), Token::Enter);
        assert_eq!(parse_token("1").unwrap(), Token::Char('1'));
        assert!(matches!(parse_token("xyzzy"), Err(CrawlError::Protocol(_))));
    }

    #[test]
    fn test_movement_keys() {
        let input = InputHandler::new();
        let ctx = InputContext::Exploring;
        assert_eq!(input.command_for(Token::Char('a'), ctx), Some(Command::Move(Direction::West)));
        assert_eq!(
            input.command_for(Token::Key(NamedKey::Down), ctx),
            Some(Command::Move(Direction::South))
        );
        assert_eq!(input.command_for(Token::Char('k'), ctx), None);
        assert_eq!(
            input.command_for(Token::Char('h'), ctx),
            Some(Command::QuickUse(ConsumableKind::HealthPotion))
        );

        let vi = InputHandler {
            vi_keys_enabled: true,
        };
        assert_eq!(vi.command_for(Token::Char('k'), ctx), Some(Command::Move(Direction::North)));
    }

    #[test]
    fn test_battle_menus() {
        let input = InputHandler::new();
        assert_eq!(
            input.command_for(Token::Char('1'), InputContext::BattleMenu),
            Some(Command::Attack)
        );
        assert_eq!(
            input.command_for(Token::Char('3'), InputContext::SkillSelect),
            Some(Command::UseSkill(2))
        );
        assert_eq!(
            input.command_for(Token::Char('2'), InputContext::ItemSubMenu(ConsumableKind::ManaPotion)),
            Some(Command::UseItem(ConsumableKind::ManaPotion, Rarity::Rare))
        );
        assert_eq!(
            input.command_for(Token::Backspace, InputContext::ItemMenu),
            Some(Command::Back)
        );
        assert_eq!(input.command_for(Token::Char('1'), InputContext::Animating), None);
        assert!(Command::Back.is_navigation());
        assert!(!Command::Attack.is_navigation());
    }

    #[test]
    fn test_prompts() {
        let input = InputHandler::new();
        assert_eq!(
            input.command_for(Token::Char('y'), InputContext::EquipmentPrompt),
            Some(Command::Equip)
        );
        assert_eq!(
            input.command_for(Token::Enter, InputContext::EquipmentPrompt),
            None
        );
        assert_eq!(
            input.command_for(Token::Enter, InputContext::NoticePrompt),
            Some(Command::Acknowledge)
        );
        assert_eq!(
            input.command_for(Token::Enter, InputContext::Finished),
            Some(Command::Restart)
        );
    }
}
