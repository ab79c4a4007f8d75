use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("parse {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },

    #[error("{table}: duplicate id {id}")]
    DuplicateId { table: &'static str, id: i32 },

    #[error("{table}: {reference} references unknown id {id}")]
    DanglingReference {
        table: &'static str,
        reference: &'static str,
        id: i32,
    },
}
