use rand::Rng;

/// Trait for generating shareable room codes
pub trait RoomCodeGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Zero-padded random numeric codes of a fixed width
pub struct RandomRoomCodeGenerator {
    width: u32,
}

impl RandomRoomCodeGenerator {
    pub fn new(width: u32) -> Self {
        Self {
            width: width.clamp(1, 9),
        }
    }
}

impl Default for RandomRoomCodeGenerator {
    fn default() -> Self {
        Self::new(4)
    }
}

impl RoomCodeGenerator for RandomRoomCodeGenerator {
    fn generate(&self) -> String {
        let upper = 10u32.pow(self.width);
        let value = rand::rng().random_range(0..upper);
        format!("{:0width$}", value, width = self.width as usize)
    }
}

/// Trait for generating display names for participants who did not give one
pub trait DisplayNameGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Pet name-based display name generator
pub struct PetNameGenerator;

impl PetNameGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PetNameGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayNameGenerator for PetNameGenerator {
    fn generate(&self) -> String {
        petname::Petnames::default().generate_one(2, "-")
    }
}
