//! Core domain types: the service identity and the service record.
//!
//! A service is addressed by its `(name, version)` pair. The pair is kept as a
//! structured key; the `name:version` text form only exists for display, which
//! is why neither part may contain [`IDENTITY_SEPARATOR`].

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::errors::{Error, Result};

/// Character joining name and version in the textual identity form.
pub const IDENTITY_SEPARATOR: char = ':';

/// Validated `(name, version)` pair identifying a registered service.
///
/// Versions are opaque: `"1.2.3"` and `"1.2.03"` are different identities.
///
/// # Example
/// ```
/// use registry_common::ServiceIdentity;
///
/// let identity = ServiceIdentity::new("my_super_model", "1.2.3").unwrap();
/// assert_eq!(identity.to_string(), "my_super_model:1.2.3");
///
/// assert!(ServiceIdentity::new("a:b", "1").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ServiceIdentity {
    name: String,
    version: String,
}

impl ServiceIdentity {
    /// Builds an identity, rejecting empty parts and parts containing the
    /// separator so that two distinct pairs never share a text form.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let version = version.into();

        validate_part("name", &name)?;
        validate_part("version", &version)?;

        Ok(Self { name, version })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

fn validate_part(field: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::invalid_identity(field, "must not be empty"));
    }
    if value.contains(IDENTITY_SEPARATOR) {
        return Err(Error::invalid_identity(
            field,
            format!("must not contain '{}' (got {:?})", IDENTITY_SEPARATOR, value),
        ));
    }
    Ok(())
}

impl fmt::Display for ServiceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.name, IDENTITY_SEPARATOR, self.version)
    }
}

impl FromStr for ServiceIdentity {
    type Err = Error;

    /// Parses the `name:version` form.
    fn from_str(s: &str) -> Result<Self> {
        let (name, version) = s.split_once(IDENTITY_SEPARATOR).ok_or_else(|| {
            Error::invalid_identity(
                "version",
                format!("missing '{}' separator in {:?}", IDENTITY_SEPARATOR, s),
            )
        })?;
        Self::new(name, version)
    }
}

/// Converts a wire-level port number into a listening port.
///
/// Port 0 is not a reachable endpoint and is rejected along with anything
/// outside the `u16` range.
pub fn checked_port<P>(port: P) -> Result<u16>
where
    P: TryInto<u16> + fmt::Display + Copy,
{
    match port.try_into() {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(Error::invalid_location(format!(
            "port {} is out of range 1-65535",
            port
        ))),
    }
}

/// Where one registered service instance can be reached.
///
/// Records are immutable: re-registering replaces the whole record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceRecord {
    #[serde(flatten)]
    identity: ServiceIdentity,
    host: String,
    port: u16,
}

impl ServiceRecord {
    /// Creates a record for `identity` listening on `host:port`.
    pub fn new(identity: ServiceIdentity, host: impl Into<String>, port: u16) -> Result<Self> {
        let host = host.into();

        if host.is_empty() {
            return Err(Error::invalid_location("host must not be empty"));
        }
        if port == 0 {
            return Err(Error::invalid_location("port 0 is out of range 1-65535"));
        }

        Ok(Self {
            identity,
            host,
            port,
        })
    }

    pub fn identity(&self) -> &ServiceIdentity {
        &self.identity
    }

    pub fn name(&self) -> &str {
        self.identity.name()
    }

    pub fn version(&self) -> &str {
        self.identity.version()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port`, suitable for dialing.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_creation() {
        let identity = ServiceIdentity::new("my_super_model", "1.2.3").unwrap();

        assert_eq!(identity.name(), "my_super_model");
        assert_eq!(identity.version(), "1.2.3");
        assert_eq!(identity.to_string(), "my_super_model:1.2.3");
    }

    #[test]
    fn test_identity_rejects_empty_parts() {
        let err = ServiceIdentity::new("", "1").unwrap_err();
        assert!(matches!(err, Error::InvalidIdentity { field: "name", .. }));

        let err = ServiceIdentity::new("model", "").unwrap_err();
        assert!(matches!(err, Error::InvalidIdentity { field: "version", .. }));
    }

    #[test]
    fn test_identity_rejects_separator() {
        // Without validation ("a:b", "c") and ("a", "b:c") would share a key.
        assert!(ServiceIdentity::new("a:b", "c").is_err());
        assert!(ServiceIdentity::new("a", "b:c").is_err());
    }

    #[test]
    fn test_identity_equality_is_exact() {
        let a = ServiceIdentity::new("m", "1.0").unwrap();
        let b = ServiceIdentity::new("m", "1.0.0").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_identity_from_str() {
        let identity: ServiceIdentity = "m:2".parse().unwrap();
        assert_eq!(identity, ServiceIdentity::new("m", "2").unwrap());

        assert!("no-separator".parse::<ServiceIdentity>().is_err());
        assert!("a:b:c".parse::<ServiceIdentity>().is_err());
        assert!(":1".parse::<ServiceIdentity>().is_err());
    }

    #[test]
    fn test_checked_port() {
        assert_eq!(checked_port(12345i32).unwrap(), 12345);
        assert_eq!(checked_port(65535i64).unwrap(), 65535);
        assert!(checked_port(0i32).is_err());
        assert!(checked_port(-1i32).is_err());
        assert!(checked_port(65536i32).is_err());
    }

    #[test]
    fn test_record_creation() {
        let identity = ServiceIdentity::new("m", "1").unwrap();
        let record = ServiceRecord::new(identity.clone(), "h1", 1000).unwrap();

        assert_eq!(record.identity(), &identity);
        assert_eq!(record.host(), "h1");
        assert_eq!(record.port(), 1000);
        assert_eq!(record.address(), "h1:1000");
    }

    #[test]
    fn test_record_rejects_bad_location() {
        let identity = ServiceIdentity::new("m", "1").unwrap();

        let err = ServiceRecord::new(identity.clone(), "", 1000).unwrap_err();
        assert!(matches!(err, Error::InvalidLocation { .. }));

        let err = ServiceRecord::new(identity, "h1", 0).unwrap_err();
        assert!(matches!(err, Error::InvalidLocation { .. }));
    }

    #[test]
    fn test_record_json_shape() {
        let identity = ServiceIdentity::new("my_super_model", "1.2.3").unwrap();
        let record = ServiceRecord::new(identity, "my_server", 12345).unwrap();

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "my_super_model",
                "version": "1.2.3",
                "host": "my_server",
                "port": 12345,
            })
        );
    }
}
