//! Client code for spfed.
//!
//! This crate provides the SharePoint Online federated token chain (STS,
//! sign-in, form digest), the per-operation session, and the list-post
//! handler used by the CLI.

pub mod auth;
pub mod post;
pub mod session;
pub mod site;
pub mod xml;

pub use auth::{AuthClient, AuthConfig, AuthData, SessionCache};
pub use post::{
    FormContext, HandlerConfig, ListPostHandler, PayloadHook, PostOutcome, PostResponse, RemotePoster, ReqwestPoster,
    Submission, SubmissionState,
};
pub use session::SharepointSession;
pub use site::{SiteError, TargetSite};
pub use xml::extract_node;
