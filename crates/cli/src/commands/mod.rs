//! Subcommand implementations.

pub mod cancel;
pub mod doctor;
pub mod end;
pub mod enter;
pub mod exit;
pub mod init;
pub mod ls;
pub mod new;
pub mod propose;
pub mod publish;
pub mod respond;
pub mod say;
pub mod show;
pub mod summary;

mod context;
