//! Game engine: board, pieces, spawning, collision and the session state machine.
//!
//! Nothing in here knows about the terminal, the wall clock or the filesystem. The session
//! takes [`Command`]s and elapsed time, and exposes a [`Snapshot`] for drawing.

pub mod collision;
pub mod grid;
pub mod piece;
pub mod session;
pub mod spawner;

pub use piece::{ActivePiece, PieceKind};
pub use session::{Command, DropOutcome, GameSession, LockReport, SessionConfig, Snapshot};
pub use spawner::Spawner;
