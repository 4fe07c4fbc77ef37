//! Typed client for the hosted blog content API, plus the credential checks
//! and error translation around it.

pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use client::{CmsClient, HttpTransport, ListQuery, ReqwestTransport};
pub use config::{check_environment, CmsConfig, EnvCheck};
pub use error::{CmsError, Result};
pub use types::{BlogPost, Category, Eyecatch, PaginationInfo, PostList, Tag};
