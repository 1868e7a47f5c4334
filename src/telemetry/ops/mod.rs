pub mod poll;
pub mod init;
pub mod feed;
pub mod stats;
