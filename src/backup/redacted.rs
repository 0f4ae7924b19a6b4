//! Credentials that must stay out of logs and errors.
//!
//! The MongoDB password and the object store keys are read from YAML into a
//! `RedactedString`. Formatting or re-serializing the config prints a
//! placeholder, and the buffer is wiped when the config is dropped. The raw
//! value is only read where it is handed to `mongodump`/`mongorestore` or the
//! S3 client.

use bon::Builder;
use derive_more::From;
use getset::Getters;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Debug, Display, Formatter};
use std::result;
use validator::Validate;
use zeroize::Zeroize;

pub static REDACTED_SECRET: &str = "###REDACTED_SECRET###";

#[derive(Validate, Clone, Zeroize, From, Builder, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct RedactedString {
    #[validate(length(min = 1))]
    #[builder(into)]
    inner: String,
}

impl Debug for RedactedString {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(REDACTED_SECRET)
    }
}

impl Display for RedactedString {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(REDACTED_SECRET)
    }
}

impl Serialize for RedactedString {
    fn serialize<S: Serializer>(&self, serializer: S) -> result::Result<S::Ok, S::Error> {
        serializer.serialize_str(REDACTED_SECRET)
    }
}

impl<'de> Deserialize<'de> for RedactedString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> result::Result<Self, D::Error> {
        String::deserialize(deserializer).map(RedactedString::from)
    }
}

impl Drop for RedactedString {
    fn drop(&mut self) {
        self.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn password() -> RedactedString {
        RedactedString::builder().inner("hunter22").build()
    }

    #[test]
    fn test_formatting_hides_secret() {
        assert_eq!(format!("{:?}", password()), REDACTED_SECRET);
        assert_eq!(password().to_string(), REDACTED_SECRET);
        assert!(!format!("{:#?}", Some(password())).contains("hunter22"));
    }

    #[test]
    fn test_yaml_round_trip_drops_secret() {
        let parsed: RedactedString = serde_yml::from_str("\"hunter22\"").unwrap();
        assert_eq!(parsed.inner(), "hunter22");

        let written = serde_yml::to_string(&parsed).unwrap();
        assert!(written.contains(REDACTED_SECRET));
        assert!(!written.contains("hunter22"));
    }

    #[test]
    fn test_rejects_non_string() {
        assert!(serde_yml::from_str::<RedactedString>("[1, 2]").is_err());
    }

    #[test]
    fn test_empty_secret_is_invalid() {
        assert!(password().validate().is_ok());
        assert!(RedactedString::builder().inner("").build().validate().is_err());
    }

    #[test]
    fn test_zeroize_clears_value() {
        let mut secret = password();
        secret.zeroize();
        assert!(secret.inner().is_empty());
    }
}
