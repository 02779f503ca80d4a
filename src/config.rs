use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::{info, warn};

use crate::room::GameMode;

/// Runtime tuning for rooms, scoring and the background sweep
#[derive(Debug, Clone)]
pub struct QuizConfig {
    /// Questions drawn for a solo practice session
    pub solo_question_count: usize,
    /// Questions drawn for a two-player session
    pub multiplayer_question_count: usize,
    /// Options shown per question, including the correct one
    pub options_per_question: usize,
    /// Points for a correct answer given within the grace window
    pub base_points: u32,
    /// Answers faster than this earn the full base points
    pub speed_grace: Duration,
    /// Points lost per whole second past the grace window
    pub decay_per_second: u32,
    /// Lowest amount a correct answer can earn
    pub min_points: u32,
    /// Digits in a shareable room code
    pub room_code_width: u32,
    /// Attempts at finding a free room code before giving up
    pub max_code_attempts: usize,
    /// Upper bound on waiting for a room's lock
    pub lock_timeout: Duration,
    /// How often the stale-room sweep runs
    pub cleanup_interval: Duration,
    /// Rooms idle for longer than this are reaped
    pub inactivity_threshold: Duration,
    /// Force-advance a question nobody finished answering; disabled when `None`
    pub question_timeout: Option<Duration>,
    /// JSON dictionary backing the question bank
    pub dictionary_path: Option<PathBuf>,
    pub bind_addr: String,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            solo_question_count: 3,
            multiplayer_question_count: 5,
            options_per_question: 4,
            base_points: 100,
            speed_grace: Duration::from_secs(2),
            decay_per_second: 5,
            min_points: 10,
            room_code_width: 4,
            max_code_attempts: 32,
            lock_timeout: Duration::from_secs(5),
            cleanup_interval: Duration::from_secs(60),
            inactivity_threshold: Duration::from_secs(30 * 60), // 30 minutes
            question_timeout: None,
            dictionary_path: None,
            bind_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl QuizConfig {
    /// Loads configuration from `SIGNQUIZ_*` environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            solo_question_count: env_or("SIGNQUIZ_SOLO_QUESTIONS", defaults.solo_question_count),
            multiplayer_question_count: env_or(
                "SIGNQUIZ_MULTIPLAYER_QUESTIONS",
                defaults.multiplayer_question_count,
            ),
            options_per_question: env_or("SIGNQUIZ_OPTIONS", defaults.options_per_question),
            base_points: env_or("SIGNQUIZ_BASE_POINTS", defaults.base_points),
            speed_grace: env_secs("SIGNQUIZ_SPEED_GRACE_SECS", defaults.speed_grace),
            decay_per_second: env_or("SIGNQUIZ_DECAY_PER_SECOND", defaults.decay_per_second),
            min_points: env_or("SIGNQUIZ_MIN_POINTS", defaults.min_points),
            room_code_width: env_or("SIGNQUIZ_ROOM_CODE_WIDTH", defaults.room_code_width)
                .clamp(1, 9),
            max_code_attempts: env_or("SIGNQUIZ_MAX_CODE_ATTEMPTS", defaults.max_code_attempts),
            lock_timeout: env_secs("SIGNQUIZ_LOCK_TIMEOUT_SECS", defaults.lock_timeout),
            cleanup_interval: env_secs("SIGNQUIZ_CLEANUP_INTERVAL_SECS", defaults.cleanup_interval),
            inactivity_threshold: env_secs(
                "SIGNQUIZ_INACTIVITY_SECS",
                defaults.inactivity_threshold,
            ),
            question_timeout: env::var("SIGNQUIZ_QUESTION_TIMEOUT_SECS")
                .ok()
                .and_then(|raw| parse_or_warn::<u64>("SIGNQUIZ_QUESTION_TIMEOUT_SECS", &raw))
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            dictionary_path: env::var("SIGNQUIZ_DICTIONARY_PATH").ok().map(PathBuf::from),
            bind_addr: env::var("SIGNQUIZ_BIND_ADDR").unwrap_or(defaults.bind_addr),
        };

        info!(
            solo_questions = config.solo_question_count,
            multiplayer_questions = config.multiplayer_question_count,
            base_points = config.base_points,
            question_timeout_secs = ?config.question_timeout.map(|t| t.as_secs()),
            "Loaded quiz configuration"
        );

        config
    }

    /// Number of questions sampled when a room of the given mode starts
    pub fn questions_for(&self, mode: GameMode) -> usize {
        match mode {
            GameMode::Solo => self.solo_question_count,
            GameMode::Multiplayer => self.multiplayer_question_count,
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|raw| parse_or_warn(key, &raw))
        .unwrap_or(default)
}

fn env_secs(key: &str, default: Duration) -> Duration {
    env::var(key)
        .ok()
        .and_then(|raw| parse_or_warn::<u64>(key, &raw))
        .map(Duration::from_secs)
        .unwrap_or(default)
}

fn parse_or_warn<T: FromStr>(key: &str, raw: &str) -> Option<T> {
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key = %key, value = %raw, "Ignoring unparsable configuration value");
            None
        }
    }
}
