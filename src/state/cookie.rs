//! # CookieStorage - values kept as cookies.
//!
//! A cookie jar suitable for a server that round-trips state through the client:
//! load it from the request's `Cookie` header, commit state, then emit one
//! `Set-Cookie` header per stored name.
//!
//! ## Encoding
//! - Names are trimmed and stripped of whitespace, `=`, `;` and `,`. Blank names are refused.
//! - Values are JSON, percent-encoded with `urlencoding` (everything but ASCII
//!   alphanumerics and `-_.~`), which is always a valid cookie value.
//! - `name=value` longer than [`CookieConfig::max_len`] is refused, and any
//!   previous cookie of that name is dropped.
//!
//! ## Example
//! ```rust
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! use statevisor::state::{CookieConfig, CookieStorage, StoragePersistence};
//!
//! let jar = CookieStorage::from_header("theme=%22dark%22; lang=%22en%22", CookieConfig::default());
//! assert_eq!(jar.retrieve::<String>("theme").await.as_deref(), Some("dark"));
//!
//! jar.store("theme", &"light").await;
//! assert_eq!(jar.set_cookie_header("theme").as_deref(), Some("theme=%22light%22; Path=/"));
//! # }
//! ```

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StorageError;
use crate::state::persistence::{decode, encode, report, StoragePersistence};

/// `SameSite` cookie attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SameSite {
    /// Only sent for same-site requests.
    Strict,
    /// Sent for same-site requests and top-level navigations.
    Lax,
    /// Always sent (requires `Secure`).
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        })
    }
}

/// Cookie attributes and limits.
///
/// ## Field semantics
/// - `path`: `Path` attribute (`None` = omitted)
/// - `domain`: `Domain` attribute (`None` = omitted)
/// - `max_age`: `Max-Age` attribute (`None` = session cookie)
/// - `secure`: emit `Secure`
/// - `http_only`: emit `HttpOnly`
/// - `same_site`: `SameSite` attribute (`None` = omitted)
/// - `max_len`: maximum `name=value` length in bytes
#[derive(Clone, Debug)]
pub struct CookieConfig {
    /// `Path` attribute.
    pub path: Option<String>,
    /// `Domain` attribute.
    pub domain: Option<String>,
    /// `Max-Age` attribute.
    pub max_age: Option<Duration>,
    /// `Secure` flag.
    pub secure: bool,
    /// `HttpOnly` flag.
    pub http_only: bool,
    /// `SameSite` attribute.
    pub same_site: Option<SameSite>,
    /// Maximum `name=value` length.
    ///
    /// A store over the limit removes the existing cookie of that name, so a later
    /// read comes back empty rather than returning the value it replaced.
    pub max_len: usize,
}

impl Default for CookieConfig {
    /// Default configuration:
    ///
    /// - `path = "/"`, no domain, session lifetime
    /// - no `Secure` / `HttpOnly` / `SameSite`
    /// - `max_len = 4096` (the common browser limit)
    fn default() -> Self {
        Self {
            path: Some("/".to_string()),
            domain: None,
            max_age: None,
            secure: false,
            http_only: false,
            same_site: None,
            max_len: 4096,
        }
    }
}

/// Cookie-jar storage.
#[derive(Debug, Default)]
pub struct CookieStorage {
    cfg: CookieConfig,
    jar: Mutex<Vec<(String, String)>>,
}

impl CookieStorage {
    /// Creates an empty jar.
    pub fn new(cfg: CookieConfig) -> Self {
        Self {
            cfg,
            jar: Mutex::new(Vec::new()),
        }
    }

    /// Creates a jar from a `Cookie` request header (`a=1; b=2`).
    ///
    /// Malformed pairs (no `=`, blank name) are skipped.
    pub fn from_header(header: &str, cfg: CookieConfig) -> Self {
        let mut jar: Vec<(String, String)> = Vec::new();
        for pair in header.split(';') {
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            upsert(&mut jar, name.to_string(), value.trim().to_string());
        }
        Self {
            cfg,
            jar: Mutex::new(jar),
        }
    }

    /// Jar configuration.
    pub fn config(&self) -> &CookieConfig {
        &self.cfg
    }

    /// Cookie names in insertion order.
    pub fn names(&self) -> Vec<String> {
        self.jar.lock().iter().map(|(n, _)| n.clone()).collect()
    }

    /// Renders the jar as a `Cookie` request header.
    pub fn cookie_header(&self) -> String {
        self.jar
            .lock()
            .iter()
            .map(|(n, v)| format!("{n}={v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Renders the `Set-Cookie` header value for `name`, with the configured attributes.
    pub fn set_cookie_header(&self, name: &str) -> Option<String> {
        let name = sanitize_name(name);
        let value = self
            .jar
            .lock()
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.clone())?;

        let mut out = format!("{name}={value}");
        if let Some(path) = &self.cfg.path {
            out.push_str(&format!("; Path={path}"));
        }
        if let Some(domain) = &self.cfg.domain {
            out.push_str(&format!("; Domain={domain}"));
        }
        if let Some(max_age) = self.cfg.max_age {
            out.push_str(&format!("; Max-Age={}", max_age.as_secs()));
        }
        if self.cfg.secure {
            out.push_str("; Secure");
        }
        if self.cfg.http_only {
            out.push_str("; HttpOnly");
        }
        if let Some(same_site) = self.cfg.same_site {
            out.push_str(&format!("; SameSite={same_site}"));
        }
        Some(out)
    }

    fn put(&self, key: &str, data: &str) -> Result<(), StorageError> {
        let name = sanitize_name(key);
        if name.is_empty() {
            return Err(StorageError::InvalidKey {
                key: key.to_string(),
            });
        }

        let value = urlencoding::encode(data).into_owned();
        let len = name.len() + 1 + value.len();
        if len > self.cfg.max_len {
            self.jar.lock().retain(|(n, _)| *n != name);
            return Err(StorageError::TooLarge {
                key: key.to_string(),
                len,
                max: self.cfg.max_len,
            });
        }

        upsert(&mut self.jar.lock(), name, value);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let name = sanitize_name(key);
        let raw = self
            .jar
            .lock()
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.clone());

        match raw {
            None => Ok(None),
            Some(raw) if raw.is_empty() => Ok(None),
            Some(raw) => urlencoding::decode(&raw)
                .map(|data| Some(data.into_owned()))
                .map_err(|err| StorageError::InvalidValue {
                    key: key.to_string(),
                    reason: err.to_string(),
                }),
        }
    }
}

#[async_trait]
impl StoragePersistence for CookieStorage {
    async fn store<T>(&self, key: &str, value: &T)
    where
        T: Serialize + Sync,
    {
        let res = encode(value).and_then(|data| self.put(key, &data));
        if let Err(err) = res {
            report(self.name(), "store", key, &err);
        }
    }

    async fn retrieve<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned + Send,
    {
        let res = match self.get(key) {
            Ok(Some(data)) => decode(&data).map(Some),
            Ok(None) => Ok(None),
            Err(err) => Err(err),
        };
        res.unwrap_or_else(|err| {
            report(self.name(), "retrieve", key, &err);
            None
        })
    }

    fn name(&self) -> &'static str {
        "cookie"
    }
}

fn upsert(jar: &mut Vec<(String, String)>, name: String, value: String) {
    match jar.iter_mut().find(|(n, _)| *n == name) {
        Some(slot) => slot.1 = value,
        None => jar.push((name, value)),
    }
}

fn sanitize_name(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '=' | ';' | ','))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Session {
        user: String,
        roles: Vec<String>,
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("  my cookie=1;x,y\t"), "mycookie1xy");
        assert_eq!(sanitize_name(" \t "), "");
    }

    #[tokio::test]
    async fn test_values_are_cookie_safe() {
        let jar = CookieStorage::new(CookieConfig::default());
        let raw = "b c;d,é\"q\"";
        jar.store("v", &raw).await;

        let header = jar.cookie_header();
        let value = header.strip_prefix("v=").unwrap();
        assert!(!value.contains([' ', ';', ',', '"', '\\']));
        assert_eq!(jar.retrieve::<String>("v").await.as_deref(), Some(raw));
    }

    #[tokio::test]
    async fn test_undecodable_value_is_none() {
        // %C3%28 is not valid UTF-8.
        let jar = CookieStorage::from_header("v=%C3%28", CookieConfig::default());
        assert_eq!(jar.retrieve::<String>("v").await, None);
        assert!(matches!(
            jar.get("v"),
            Err(StorageError::InvalidValue { .. })
        ));
    }

    #[tokio::test]
    async fn test_refused_store_drops_previous_value() {
        let jar = CookieStorage::new(CookieConfig {
            max_len: 32,
            ..CookieConfig::default()
        });
        jar.store("cart", &"small").await;
        assert_eq!(jar.retrieve::<String>("cart").await.as_deref(), Some("small"));

        jar.store("cart", &"x".repeat(64)).await;
        assert_eq!(jar.retrieve::<String>("cart").await, None);
        assert!(jar.names().is_empty());
    }

    #[tokio::test]
    async fn test_store_and_retrieve_struct() {
        let jar = CookieStorage::new(CookieConfig::default());
        let session = Session {
            user: "ann".into(),
            roles: vec!["admin".into(), "ops team".into()],
        };
        jar.store("session", &session).await;

        assert_eq!(jar.retrieve::<Session>("session").await, Some(session));
        assert_eq!(jar.names(), vec!["session".to_string()]);
    }

    #[tokio::test]
    async fn test_blank_name_and_oversized_value_are_refused() {
        let cfg = CookieConfig {
            max_len: 16,
            ..CookieConfig::default()
        };
        let jar = CookieStorage::new(cfg);

        jar.store(" = ", &1u8).await;
        jar.store("big", &"x".repeat(64)).await;
        assert!(jar.names().is_empty());
        assert_eq!(jar.retrieve::<String>("big").await, None);
    }

    #[tokio::test]
    async fn test_header_round_trip_and_attributes() {
        let jar = CookieStorage::from_header(
            "junk; a=1 ; =skip; b=%22two%22",
            CookieConfig {
                path: None,
                domain: Some("example.org".into()),
                max_age: Some(Duration::from_secs(3600)),
                secure: true,
                http_only: true,
                same_site: Some(SameSite::Strict),
                max_len: 4096,
            },
        );
        assert_eq!(jar.cookie_header(), "a=1; b=%22two%22");
        assert_eq!(jar.retrieve::<u32>("a").await, Some(1));
        assert_eq!(jar.retrieve::<String>("b").await.as_deref(), Some("two"));

        jar.store("a", &2u32).await;
        assert_eq!(
            jar.set_cookie_header("a").as_deref(),
            Some("a=2; Domain=example.org; Max-Age=3600; Secure; HttpOnly; SameSite=Strict")
        );
        assert_eq!(jar.set_cookie_header("missing"), None);
    }
}
