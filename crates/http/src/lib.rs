//! HTTP client for the Cutline backend

pub mod client;
pub mod types;

pub use client::resources::{ListQuery, Resource};
pub use client::{ApiClient, ApiClientBuilder, ApiRequest, ClientError};
pub use types::{Credentials, LoginResponse, Page, UserProfile};
