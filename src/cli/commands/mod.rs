pub mod init;
pub mod wrap;
