/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `pages`: Landing, auth and protected pages
/// - `auth`: Credentials sign-up / sign-in, sign-out, session
/// - `oauth`: OAuth providers, sign-in redirect and callback

pub mod auth;
pub mod health;
pub mod oauth;
pub mod pages;
