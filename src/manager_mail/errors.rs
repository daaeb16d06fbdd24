use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("MailError::Build: {0}")]
    Build(String),
    #[error("MailError::Transport: {0}")]
    Transport(String),
}
impl From<lettre::error::Error> for MailError {
    fn from(e: lettre::error::Error) -> Self { MailError::Build(e.to_string()) }
}
impl From<lettre::transport::smtp::Error> for MailError {
    fn from(e: lettre::transport::smtp::Error) -> Self { MailError::Transport(e.to_string()) }
}
