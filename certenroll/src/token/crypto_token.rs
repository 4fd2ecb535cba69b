//! The crypto_token module defines the [`CryptoToken`] interface and [`SerializedToken`], the
//! wrapper through which an [`EnrollmentEnvironment`](../../environment/enrollment_environment/struct.EnrollmentEnvironment.html)
//! accesses tokens. Tokens may not be safe to use from multiple threads at once, so every
//! operation on a token held by the environment takes the token's lock.

use std::sync::Mutex;

use spki::SubjectPublicKeyInfoOwned;
use zeroize::Zeroizing;

use crate::util::error::*;

/// The [`CryptoToken`] trait provides key wrapping and unwrapping using a key pair held by a token.
pub trait CryptoToken {
    /// Name of the token
    fn name(&self) -> &str;

    /// Public key of the token's key pair
    fn public_key(&self) -> Result<SubjectPublicKeyInfoOwned>;

    /// Encrypts a symmetric key for the token's public key
    fn wrap_key(&self, key: &[u8]) -> Result<Vec<u8>>;

    /// Decrypts a symmetric key using the token's private key
    fn unwrap_key(&self, wrapped_key: &[u8]) -> Result<Zeroizing<Vec<u8>>>;
}

/// [`SerializedToken`] serializes access to a token.
pub struct SerializedToken(Mutex<Box<dyn CryptoToken + Send>>);

impl SerializedToken {
    /// Takes ownership of a token
    pub fn new(token: Box<dyn CryptoToken + Send>) -> Self {
        SerializedToken(Mutex::new(token))
    }

    /// Runs `f` while holding the token's lock
    pub fn with_token<T>(&self, f: impl FnOnce(&dyn CryptoToken) -> Result<T>) -> Result<T> {
        let guard = self
            .0
            .lock()
            .map_err(|_| Error::InternalError("token lock poisoned".to_string()))?;
        f(guard.as_ref())
    }
}
