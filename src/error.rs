use std::error::Error;
use std::fmt::{Debug, Display, Error as FmtError, Formatter};

pub struct AppErr(String, Option<Box<dyn Error + Send + Sync>>);

impl AppErr {
    fn from_err<E>(kind: &str, error: E) -> AppErr
    where
        E: Error + Send + Sync + 'static,
    {
        AppErr(format!("[{}] {}", kind, error), Some(Box::new(error)))
    }

    pub fn new(kind: &str, message: &str) -> AppErr {
        AppErr(format!("[{}] {}", kind, message), None)
    }
}

impl Display for AppErr {
    fn fmt(&self, f: &mut Formatter) -> Result<(), FmtError> {
        write!(f, "{}", self.0)
    }
}

impl Debug for AppErr {
    fn fmt(&self, f: &mut Formatter) -> Result<(), FmtError> {
        Display::fmt(self, f)
    }
}

impl Error for AppErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self.1 {
            Some(ref err) => Some(&**err as &(dyn Error + 'static)),
            None => None,
        }
    }
}

macro_rules! impl_from_error {
    ($type:ty) => {
        impl From<$type> for AppErr {
            fn from(err: $type) -> Self {
                AppErr::from_err(stringify!($type), err)
            }
        }
    };
}

// Error conversions
impl_from_error!(std::io::Error);
impl_from_error!(reqwest::Error);
impl_from_error!(image::ImageError);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_carries_the_kind() {
        let err = AppErr::new("http", "request failed with status 404");
        assert_eq!(format!("{}", err), "[http] request failed with status 404");
        assert!(err.source().is_none());
    }

    #[test]
    fn wrapped_errors_keep_their_source() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = AppErr::from(io);
        assert!(format!("{}", err).starts_with("[std::io::Error]"));
        assert!(err.source().is_some());
    }
}
