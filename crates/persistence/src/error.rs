use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("character not found: {0}")]
    CharacterNotFound(i32),

    #[error("character name already taken: {0}")]
    CharacterNameTaken(String),

    #[error("item not found: {0}")]
    ItemNotFound(i32),
}
