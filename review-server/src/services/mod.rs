//! Service layer
//!
//! The engine proper. Each service owns one slice of the domain:
//!
//! - [`RatingService`] - per-target rating aggregates (transactional)
//! - [`ReviewService`] - guide reviews and read-time statistics
//! - [`CompletionService`] - the booking completion state machine
//! - [`QueryFacade`] - the read-only surface handed to UI collaborators
//! - [`ReviewInviteNotifier`] - injected notification collaborator

pub mod completion_service;
pub mod notify;
pub mod query_facade;
pub mod rating_service;
pub mod review_service;

pub use completion_service::CompletionService;
pub use notify::{LogNotifier, ReviewInviteNotifier};
pub use query_facade::QueryFacade;
pub use rating_service::RatingService;
pub use review_service::{CreateReviewRequest, ReviewService};
