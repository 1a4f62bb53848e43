use regex::Regex;
use std::sync::OnceLock;

fn game_path() -> &'static Regex {
    static GAME_PATH: OnceLock<Regex> = OnceLock::new();
    GAME_PATH.get_or_init(|| {
        Regex::new(r"/(game|challenge)/([A-Za-z0-9_-]+)").expect("valid game path regex")
    })
}

const COMPETITIVE_SEGMENTS: &[&str] = &[
    "/duels",
    "/team-duels",
    "/battle-royale",
    "/competitive",
];

/// Page that can be resolved against the upstream game API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameRef {
    Game(String),
    Challenge(String),
}

impl GameRef {
    #[must_use]
    pub fn from_url(url: &str) -> Option<Self> {
        let caps = game_path().captures(url)?;
        let token = caps.get(2)?.as_str().to_string();
        match caps.get(1)?.as_str() {
            "game" => Some(Self::Game(token)),
            "challenge" => Some(Self::Challenge(token)),
            _ => None,
        }
    }

    /// Path of the game record on the upstream API.
    #[must_use]
    pub fn api_path(&self) -> String {
        match self {
            Self::Game(token) => format!("/api/v3/games/{token}"),
            Self::Challenge(token) => format!("/api/v3/challenges/{token}/game"),
        }
    }

    #[must_use]
    pub fn token(&self) -> &str {
        match self {
            Self::Game(token) | Self::Challenge(token) => token,
        }
    }
}

/// Ranked and head-to-head pages where hints must stay hidden.
#[must_use]
pub fn is_competitive_url(url: &str) -> bool {
    COMPETITIVE_SEGMENTS.iter().any(|seg| url.contains(seg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_game_and_challenge_pages() {
        let game = GameRef::from_url("https://www.geoguessr.com/game/AbC123xyz").unwrap();
        assert_eq!(game, GameRef::Game("AbC123xyz".into()));
        assert_eq!(game.api_path(), "/api/v3/games/AbC123xyz");

        let challenge =
            GameRef::from_url("https://www.geoguessr.com/challenge/Qw-E_9?x=1").unwrap();
        assert_eq!(challenge.api_path(), "/api/v3/challenges/Qw-E_9/game");
        assert_eq!(challenge.token(), "Qw-E_9");

        assert_eq!(GameRef::from_url("https://www.geoguessr.com/maps/world"), None);
    }

    #[test]
    fn flags_competitive_modes() {
        assert!(is_competitive_url("https://www.geoguessr.com/duels/abc"));
        assert!(is_competitive_url("https://www.geoguessr.com/battle-royale/abc"));
        assert!(!is_competitive_url("https://www.geoguessr.com/game/abc"));
    }
}
