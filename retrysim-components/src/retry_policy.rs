//! Retry policies deciding whether a failed call is attempted again
//!
//! Every policy answers the same three questions: record a success, record a
//! failure, and say whether the call that just failed should retry. They differ
//! in what their state covers:
//!
//! - [`FixedRetryPolicy`] counts the failures of a single call.
//! - [`CircuitBreakerState`] counts failures across every call of a client and
//!   closes the retry gate once the observed failure ratio gets too high.
//! - [`TokenBucketPolicy`] holds a retry budget shared by every call of a
//!   client, drained by failures and refilled by successes.
//!
//! A call owns a [`Retrier`], which combines a per-call part with a handle on
//! the client-wide part. [`RetrierFactory`] implementations hand out retriers;
//! the client-wide state is allocated by the factory on first use and every
//! later retrier shares it.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::RetryConfig;
use crate::error::ComponentError;
use crate::Shared;

/// Allows up to `max_attempts` retries of a single call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedRetryPolicy {
    failures: u32,
    max_attempts: u32,
}

impl FixedRetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            failures: 0,
            max_attempts,
        }
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn record_success(&mut self) {}

    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    /// With `max_attempts = n` a call that keeps failing is tried `n + 1` times.
    pub fn should_retry(&self) -> bool {
        self.failures <= self.max_attempts
    }

    pub fn reset(&mut self) {
        self.failures = 0;
    }
}

/// Failure ratio gate accumulated over a client's whole call history.
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitBreakerState {
    failures: u64,
    calls: u64,
    max_rate: f64,
}

impl CircuitBreakerState {
    pub fn new(max_rate: f64) -> Self {
        Self {
            failures: 0,
            calls: 0,
            max_rate,
        }
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    pub fn calls(&self) -> u64 {
        self.calls
    }

    pub fn max_rate(&self) -> f64 {
        self.max_rate
    }

    /// Observed `failures / calls`, `None` before any outcome was recorded.
    pub fn failure_ratio(&self) -> Option<f64> {
        (self.calls > 0).then(|| self.failures as f64 / self.calls as f64)
    }

    pub fn record_success(&mut self) {
        self.calls += 1;
    }

    pub fn record_failure(&mut self) {
        self.failures += 1;
        self.calls += 1;
    }

    /// With no recorded outcomes there is no evidence of failure, so retries
    /// are allowed.
    pub fn allows_retry(&self) -> bool {
        self.failure_ratio()
            .map_or(true, |ratio| ratio < self.max_rate)
    }
}

/// Bounded retry budget: successes deposit a token, failures withdraw one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBucketPolicy {
    tokens: u32,
    capacity: u32,
}

impl TokenBucketPolicy {
    /// A bucket that starts full.
    pub fn new(capacity: u32) -> Self {
        Self {
            tokens: capacity,
            capacity,
        }
    }

    pub fn tokens(&self) -> u32 {
        self.tokens
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn record_success(&mut self) {
        self.tokens = self.tokens.saturating_add(1).min(self.capacity);
    }

    pub fn record_failure(&mut self) {
        self.tokens = self.tokens.saturating_sub(1);
    }

    pub fn should_retry(&self) -> bool {
        self.tokens > 0
    }
}

/// The retry policy owned by one call.
///
/// Variants holding a [`Shared`] handle see the same client-wide state as
/// every other call from the same factory. The `attempts` field is always
/// private to the call.
#[derive(Debug, Clone)]
pub enum Retrier {
    Fixed(FixedRetryPolicy),
    CircuitBreaker {
        breaker: Shared<CircuitBreakerState>,
        attempts: FixedRetryPolicy,
    },
    TokenBucket(Shared<TokenBucketPolicy>),
    TokenBucketFixed {
        bucket: Shared<TokenBucketPolicy>,
        attempts: FixedRetryPolicy,
    },
}

impl Retrier {
    pub fn kind(&self) -> RetryPolicyKind {
        match self {
            Retrier::Fixed(_) => RetryPolicyKind::Fixed,
            Retrier::CircuitBreaker { .. } => RetryPolicyKind::CircuitBreaker,
            Retrier::TokenBucket(_) => RetryPolicyKind::TokenBucket,
            Retrier::TokenBucketFixed { .. } => RetryPolicyKind::TokenBucketFixed,
        }
    }

    /// Prepares the retrier for a new call. Only per-call state is reset;
    /// client-wide state keeps accumulating.
    pub fn init_call(&mut self) {
        match self {
            Retrier::Fixed(attempts)
            | Retrier::CircuitBreaker { attempts, .. }
            | Retrier::TokenBucketFixed { attempts, .. } => attempts.reset(),
            Retrier::TokenBucket(_) => {}
        }
    }

    pub fn record_success(&mut self) {
        match self {
            Retrier::Fixed(attempts) => attempts.record_success(),
            Retrier::CircuitBreaker { breaker, attempts } => {
                breaker.borrow_mut().record_success();
                attempts.record_success();
            }
            Retrier::TokenBucket(bucket) => bucket.borrow_mut().record_success(),
            Retrier::TokenBucketFixed { bucket, attempts } => {
                bucket.borrow_mut().record_success();
                attempts.record_success();
            }
        }
    }

    pub fn record_failure(&mut self) {
        match self {
            Retrier::Fixed(attempts) => attempts.record_failure(),
            Retrier::CircuitBreaker { breaker, attempts } => {
                breaker.borrow_mut().record_failure();
                attempts.record_failure();
            }
            Retrier::TokenBucket(bucket) => bucket.borrow_mut().record_failure(),
            Retrier::TokenBucketFixed { bucket, attempts } => {
                bucket.borrow_mut().record_failure();
                attempts.record_failure();
            }
        }
    }

    /// Whether the call whose failure was just recorded should try again.
    pub fn should_retry(&self) -> bool {
        match self {
            Retrier::Fixed(attempts) => attempts.should_retry(),
            Retrier::CircuitBreaker { breaker, attempts } => {
                breaker.borrow().allows_retry() && attempts.should_retry()
            }
            Retrier::TokenBucket(bucket) => bucket.borrow().should_retry(),
            Retrier::TokenBucketFixed { bucket, attempts } => {
                bucket.borrow().should_retry() && attempts.should_retry()
            }
        }
    }
}

/// Supplies a retrier for each new call.
pub trait RetrierFactory {
    fn kind(&self) -> RetryPolicyKind;

    /// Returns a retrier ready for a new call.
    fn get(&mut self) -> Retrier;
}

/// Fresh, independent [`FixedRetryPolicy`] for every call.
#[derive(Debug, Clone)]
pub struct FixedRetrierFactory {
    max_attempts: u32,
}

impl FixedRetrierFactory {
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }
}

impl RetrierFactory for FixedRetrierFactory {
    fn kind(&self) -> RetryPolicyKind {
        RetryPolicyKind::Fixed
    }

    fn get(&mut self) -> Retrier {
        Retrier::Fixed(FixedRetryPolicy::new(self.max_attempts))
    }
}

/// Owns one [`CircuitBreakerState`] for the lifetime of the client and hands
/// it out by shared reference to every call, each with its own attempt limit.
#[derive(Debug, Clone)]
pub struct CircuitBreakerRetrierFactory {
    max_attempts: u32,
    max_rate: f64,
    breaker: Option<Shared<CircuitBreakerState>>,
}

impl CircuitBreakerRetrierFactory {
    pub fn new(max_attempts: u32, max_rate: f64) -> Self {
        Self {
            max_attempts,
            max_rate,
            breaker: None,
        }
    }

    /// The shared breaker, once the first retrier was handed out.
    pub fn breaker(&self) -> Option<Shared<CircuitBreakerState>> {
        self.breaker.clone()
    }
}

impl RetrierFactory for CircuitBreakerRetrierFactory {
    fn kind(&self) -> RetryPolicyKind {
        RetryPolicyKind::CircuitBreaker
    }

    fn get(&mut self) -> Retrier {
        let max_rate = self.max_rate;
        let breaker = self
            .breaker
            .get_or_insert_with(|| Rc::new(RefCell::new(CircuitBreakerState::new(max_rate))));

        let mut retrier = Retrier::CircuitBreaker {
            breaker: Rc::clone(breaker),
            attempts: FixedRetryPolicy::new(self.max_attempts),
        };
        retrier.init_call();
        retrier
    }
}

/// Owns one [`TokenBucketPolicy`] for the lifetime of the client. With
/// `per_call_attempts` set, each call is additionally capped by its own
/// [`FixedRetryPolicy`].
#[derive(Debug, Clone)]
pub struct TokenBucketRetrierFactory {
    capacity: u32,
    per_call_attempts: Option<u32>,
    bucket: Option<Shared<TokenBucketPolicy>>,
}

impl TokenBucketRetrierFactory {
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            per_call_attempts: None,
            bucket: None,
        }
    }

    pub fn with_fixed_attempts(capacity: u32, max_attempts: u32) -> Self {
        Self {
            capacity,
            per_call_attempts: Some(max_attempts),
            bucket: None,
        }
    }

    /// The shared bucket, once the first retrier was handed out.
    pub fn bucket(&self) -> Option<Shared<TokenBucketPolicy>> {
        self.bucket.clone()
    }
}

impl RetrierFactory for TokenBucketRetrierFactory {
    fn kind(&self) -> RetryPolicyKind {
        match self.per_call_attempts {
            Some(_) => RetryPolicyKind::TokenBucketFixed,
            None => RetryPolicyKind::TokenBucket,
        }
    }

    fn get(&mut self) -> Retrier {
        let capacity = self.capacity;
        let bucket = Rc::clone(
            self.bucket
                .get_or_insert_with(|| Rc::new(RefCell::new(TokenBucketPolicy::new(capacity)))),
        );

        match self.per_call_attempts {
            Some(max_attempts) => Retrier::TokenBucketFixed {
                bucket,
                attempts: FixedRetryPolicy::new(max_attempts),
            },
            None => Retrier::TokenBucket(bucket),
        }
    }
}

/// Name of a retry policy, as used in configuration and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RetryPolicyKind {
    Fixed,
    CircuitBreaker,
    TokenBucket,
    TokenBucketFixed,
}

impl RetryPolicyKind {
    pub const ALL: [RetryPolicyKind; 4] = [
        RetryPolicyKind::Fixed,
        RetryPolicyKind::CircuitBreaker,
        RetryPolicyKind::TokenBucket,
        RetryPolicyKind::TokenBucketFixed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RetryPolicyKind::Fixed => "fixed",
            RetryPolicyKind::CircuitBreaker => "circuit-breaker",
            RetryPolicyKind::TokenBucket => "token-bucket",
            RetryPolicyKind::TokenBucketFixed => "token-bucket-fixed",
        }
    }

    /// Builds the factory for this policy with the limits in `config`.
    pub fn factory(&self, config: &RetryConfig) -> Box<dyn RetrierFactory> {
        match self {
            RetryPolicyKind::Fixed => Box::new(FixedRetrierFactory::new(config.max_attempts)),
            RetryPolicyKind::CircuitBreaker => Box::new(CircuitBreakerRetrierFactory::new(
                config.max_attempts,
                config.circuit_breaker_max_rate,
            )),
            RetryPolicyKind::TokenBucket => {
                Box::new(TokenBucketRetrierFactory::new(config.token_bucket_capacity))
            }
            RetryPolicyKind::TokenBucketFixed => {
                Box::new(TokenBucketRetrierFactory::with_fixed_attempts(
                    config.token_bucket_capacity,
                    config.max_attempts,
                ))
            }
        }
    }
}

impl fmt::Display for RetryPolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RetryPolicyKind {
    type Err = ComponentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RetryPolicyKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ComponentError::UnknownRetryPolicy(s.to_string()))
    }
}

/// Looks up a policy by name and builds its factory.
///
/// # Errors
///
/// Returns [`ComponentError::UnknownRetryPolicy`] for an unrecognized name.
pub fn factory_by_name(
    name: &str,
    config: &RetryConfig,
) -> Result<Box<dyn RetrierFactory>, ComponentError> {
    Ok(name.parse::<RetryPolicyKind>()?.factory(config))
}
