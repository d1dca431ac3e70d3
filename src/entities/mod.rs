//! Row types for the tables the service reads and writes, plus the
//! payloads used to create or change them.

pub mod category;
pub mod collaborator;
pub mod playlist;
pub mod playlist_video;
pub mod profile;
pub mod progress;
pub mod social_account;
pub mod video;
