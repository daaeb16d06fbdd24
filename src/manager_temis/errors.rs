use thiserror::Error;

#[derive(Error, Debug)]
#[error("error fetching forecast page: {0}")]
pub struct FetchError(pub String);
impl From<ureq::Error> for FetchError {
    fn from(e: ureq::Error) -> FetchError {
        FetchError(format!("http request error: {}", e))
    }
}
