use uuid::Uuid;

/// Participant of a game session, either human or autopilot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Unique identifier generated on creation.
    pub id: Uuid,
    /// Display name chosen by the player.
    pub name: String,
    /// Origin of the player (peer address for humans, a synthetic tag for autopilots).
    pub connection: String,
}

impl Player {
    /// Build a player with a freshly generated identifier.
    pub fn new(name: impl Into<String>, connection: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            connection: connection.into(),
        }
    }

    /// Synthetic player driven by the autopilot of a session.
    pub fn autopilot(index: usize) -> Self {
        Self::new(format!("Autopilot {index}"), format!("Connection {index}"))
    }
}
