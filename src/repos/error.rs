/*
 * Responsibility
 * - What a store reports upward, independent of the backend
 */
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("conflict: {0}")]
    Conflict(&'static str),
}
