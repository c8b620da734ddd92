use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// Position of an account in the registry.
///
/// Account ids are 0-based and match the `{index}` segment of every HTTP
/// route. Variable and file names use the 1-based [`number`](Self::number).
///
/// # Examples
///
/// ```
/// use core_auth::AccountId;
///
/// let id = AccountId::new(0);
/// assert_eq!(id.index(), 0);
/// assert_eq!(id.number(), 1);
/// assert_eq!(id.to_string(), "account1");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId(usize);

impl AccountId {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// 0-based index
    pub const fn index(&self) -> usize {
        self.0
    }

    /// 1-based number
    pub const fn number(&self) -> usize {
        self.0 + 1
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "account{}", self.number())
    }
}

/// Immutable descriptor of one provider account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    /// Where the provider sends the user back after consent.
    pub redirect_uri: String,
    /// Key of this account's record in the credential store.
    pub credential_key: String,
}

/// OAuth 2.0 token set for one account.
///
/// Cloning is cheap enough that readers take a full copy under a read lock
/// and never observe a half-replaced set. The refresh token is optional
/// because providers only return it on the first consent.
///
/// # Security
///
/// The `Debug` implementation redacts both tokens.
///
/// # Examples
///
/// ```
/// use core_auth::OAuthTokens;
///
/// let tokens = OAuthTokens::new(
///     "access_token_value".to_string(),
///     Some("refresh_token_value".to_string()),
///     3600,
/// );
///
/// assert!(!tokens.is_expired());
/// assert!(tokens.can_refresh());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// `None` when the provider did not report a lifetime.
    pub expires_at: Option<DateTime<Utc>>,
    pub scope: Option<String>,
    pub token_type: Option<String>,
}

impl OAuthTokens {
    /// Create a token set that expires `expires_in_secs` from now.
    pub fn new(access_token: String, refresh_token: Option<String>, expires_in_secs: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at: Some(Utc::now() + Duration::seconds(expires_in_secs)),
            scope: None,
            token_type: None,
        }
    }

    pub fn with_scope(mut self, scope: Option<String>) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_token_type(mut self, token_type: Option<String>) -> Self {
        self.token_type = token_type;
        self
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// True once the expiry time has passed. Tokens without a known expiry
    /// are never considered expired.
    pub fn is_expired(&self) -> bool {
        self.is_expired_with_buffer(0)
    }

    /// True if the token expires within `buffer_secs`.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_auth::OAuthTokens;
    ///
    /// let tokens = OAuthTokens::new("a".to_string(), None, 30);
    /// assert!(!tokens.is_expired());
    /// assert!(tokens.is_expired_with_buffer(60));
    /// ```
    pub fn is_expired_with_buffer(&self, buffer_secs: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() + Duration::seconds(buffer_secs) >= expires_at,
            None => false,
        }
    }

    /// Time until expiration, or `None` if already expired or unknown.
    pub fn time_until_expiry(&self) -> Option<Duration> {
        let remaining = self.expires_at? - Utc::now();
        (remaining > Duration::zero()).then_some(remaining)
    }

    /// Fill fields a renewal response left out from the set it replaces.
    ///
    /// Refresh responses usually omit the refresh token and sometimes the
    /// scope; the previous values stay valid.
    pub fn inherit_from(mut self, previous: &OAuthTokens) -> Self {
        if !self.can_refresh() {
            self.refresh_token = previous.refresh_token.clone();
        }
        if self.scope.is_none() {
            self.scope = previous.scope.clone();
        }
        if self.token_type.is_none() {
            self.token_type = previous.token_type.clone();
        }
        self
    }
}

impl fmt::Debug for OAuthTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthTokens")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_at", &self.expires_at)
            .field("scope", &self.scope)
            .field("token_type", &self.token_type)
            .finish()
    }
}
