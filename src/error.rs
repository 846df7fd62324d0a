// SleepCam - Error Types
//
// One variant per failure category the power-cycle loop distinguishes.
// Decode failures never leave `CycleStore::load`, and write failures are
// logged by the controller; only hardware errors end a process instance.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Input the statistic cannot be computed from (e.g. an empty frame).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The persistent region holds something that is not a valid record.
    #[error("persisted record could not be decoded: {0}")]
    PersistenceDecode(String),

    /// The record could not be encoded or written back.
    #[error("persisted record could not be written: {0}")]
    PersistenceWrite(String),

    /// Camera, GPIO or sleep primitive failure.
    #[error("hardware I/O error: {0}")]
    HardwareIo(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}
