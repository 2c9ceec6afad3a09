use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("symbol map lock poisoned")]
    SymbolMapPoisoned,

    #[error("window lock poisoned for symbol {0}")]
    WindowPoisoned(String),
}
