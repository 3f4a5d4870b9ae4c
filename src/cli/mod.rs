pub mod example;
pub mod init;
pub mod serve;
