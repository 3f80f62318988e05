//! Domain services for the multisite FAQ backend.
//!
//! Services hold the business logic; storage and transport are reached
//! through the traits they declare.

pub mod auth;
pub mod notification;
pub mod opensearch;
pub mod provisioning;
pub mod seo;
pub mod share_links;

pub use auth::{AuthDriver, AuthDriverKind, AuthError, CredentialStore, DatabaseAuth, HttpAuth};

pub use notification::{
    question_answered_message, DeliveryError, MailMessage, MailTransport, Mailbox,
    MockMailTransport, Notifier,
};

pub use provisioning::{
    Artifact, ConfigStoreError, DirectoryOutcome, InstanceOrchestrator, ProvisionError,
    ProvisionFailure, ProvisionIoError, ProvisionResult, ProvisionStep, RegistryError,
    SchemaCloneError, SchemaCloner, SchemaStatement, TenantConfigWriter, TenantFilesystem,
    TenantRegistry,
};

pub use share_links::{share_links, ShareLinks, SharedRecord};
