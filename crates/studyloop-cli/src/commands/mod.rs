pub mod analytics;
pub mod init;
pub mod quiz;
pub mod remediate;
pub mod submit;
