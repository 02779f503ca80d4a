use std::sync::Arc;

use signquiz::{
    AppState, GameMode, InMemoryRoomRepository, InMemoryUserRepository, ParticipantId,
    QuizConfig, RoomModel,
};

use super::mocks::FixedQuestionBank;

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub state: AppState,
    pub bank: Arc<FixedQuestionBank>,
}

impl TestSetup {
    /// Creates a room hosted by `host` and seats the given guests
    pub async fn room_with(
        &self,
        mode: GameMode,
        host: ParticipantId,
        guests: &[ParticipantId],
    ) -> RoomModel {
        let room = self
            .state
            .room_service
            .create_room(host, Some(format!("player-{host}")), mode)
            .await
            .unwrap();
        for guest in guests {
            self.state
                .room_service
                .join_by_code(&room.code, *guest, Some(format!("player-{guest}")))
                .await
                .unwrap();
        }
        self.state.room_service.get_room(&room.id).await.unwrap()
    }

    /// A started solo room for `participant_id`
    pub async fn started_solo(&self, participant_id: ParticipantId) -> String {
        let room = self.room_with(GameMode::Solo, participant_id, &[]).await;
        self.state
            .session_service
            .start_session(&room.id, participant_id)
            .await
            .unwrap();
        room.id
    }

    /// A started two-player room; `host` starts it
    pub async fn started_duel(&self, host: ParticipantId, guest: ParticipantId) -> String {
        let room = self.room_with(GameMode::Multiplayer, host, &[guest]).await;
        self.state
            .session_service
            .start_session(&room.id, host)
            .await
            .unwrap();
        room.id
    }
}

pub struct TestSetupBuilder {
    config: QuizConfig,
    bank_size: usize,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            config: QuizConfig::default(),
            bank_size: 10,
        }
    }

    pub fn with_config(mut self, config: QuizConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_bank_size(mut self, bank_size: usize) -> Self {
        self.bank_size = bank_size;
        self
    }

    pub fn build(self) -> TestSetup {
        let bank = Arc::new(FixedQuestionBank::new(self.bank_size));
        let rooms = Arc::new(InMemoryRoomRepository::new(self.config.lock_timeout));
        let users = Arc::new(InMemoryUserRepository::new());

        let state = AppState::new(self.config, rooms, users, bank.clone());
        TestSetup { state, bank }
    }
}
