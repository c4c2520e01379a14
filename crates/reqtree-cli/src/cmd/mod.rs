pub mod init;
pub mod open;
pub mod requirement;
pub mod sync;
pub mod worktree;
