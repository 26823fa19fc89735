//! # External Collaborator Seams
//!
//! Trait interfaces for every capability the pipeline consumes but does not
//! implement: durable storage, directory lookups, authorization, the boolean
//! send-condition endpoint, and the clock/id providers injected for
//! determinism in tests. Implementations live outside the core.

pub mod authorization;
pub mod clock;
pub mod condition;
pub mod profile;
pub mod repository;

pub use authorization::{AuthorizationClient, AuthorizationError};
pub use clock::{Clock, IdGenerator, SystemClock, UuidGenerator};
pub use condition::{ConditionClient, ConditionError};
pub use profile::{OrganizationContactPoints, ProfileClient, ProfileError, UserContactPoints};
pub use repository::{
    EmailNotificationRepository, OrderRepository, RegisteredEmailRecipient,
    RegisteredSmsRecipient, RepositoryError, SmsNotificationRepository,
};
